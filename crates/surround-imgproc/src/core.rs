// reference: https://www.strchr.com/standard_deviation_in_one_pass
use surround_image::{Image, ImageDtype};

/// Compute the mean and standard deviation of an image.
///
/// The mean and standard deviation are computed for each channel
/// of the image in one pass.
///
/// # Arguments
///
/// * `image` - The input image to compute the mean and standard deviation.
///
/// # Returns
///
/// A tuple containing the standard deviation and the mean of each channel,
/// in that order. An empty image yields zeros.
///
/// # Example
///
/// ```
/// use surround_image::{Image, ImageSize};
/// use surround_imgproc::core::std_mean;
///
/// let image = Image::<u8, 3>::new(
///    ImageSize {
///      width: 2,
///      height: 2,
///  },
/// vec![0, 1, 2, 253, 254, 255, 128, 129, 130, 64, 65, 66],
/// ).unwrap();
///
/// let (std, mean) = std_mean(&image);
///
/// assert_eq!(mean, [111.25, 112.25, 113.25]);
/// assert!((std[0] - 93.5183805462862).abs() < 1e-9);
/// ```
pub fn std_mean<T: ImageDtype, const C: usize>(image: &Image<T, C>) -> ([f64; C], [f64; C]) {
    if image.is_empty() {
        return ([0.0; C], [0.0; C]);
    }

    let (sum, sq_sum) = image.as_slice().chunks_exact(C).fold(
        ([0f64; C], [0f64; C]),
        |(mut sum, mut sq_sum), pixel| {
            for (c, &val) in pixel.iter().enumerate() {
                let val = Into::<f32>::into(val) as f64;
                sum[c] += val;
                sq_sum[c] += val * val;
            }
            (sum, sq_sum)
        },
    );

    let n = image.size().area() as f64;

    let mut mean = [0f64; C];
    let mut std = [0f64; C];
    for c in 0..C {
        mean[c] = sum[c] / n;
        std[c] = (sq_sum[c] / n - mean[c].powi(2)).max(0.0).sqrt();
    }

    (std, mean)
}

/// Compute the mean intensity of an image over all pixels and channels.
///
/// Used as a cheap check to detect blank or nearly black frames.
pub fn mean_intensity<T: ImageDtype, const C: usize>(image: &Image<T, C>) -> f64 {
    let (_, mean) = std_mean(image);
    if C == 0 {
        return 0.0;
    }
    mean.iter().sum::<f64>() / C as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use surround_image::{ImageError, ImageSize};

    #[test]
    fn test_std_mean() -> Result<(), ImageError> {
        let image = Image::<u8, 3>::new(
            ImageSize {
                width: 2,
                height: 2,
            },
            vec![0, 1, 2, 253, 254, 255, 128, 129, 130, 64, 65, 66],
        )?;

        let (std, mean) = std_mean(&image);

        assert_eq!(mean, [111.25, 112.25, 113.25]);
        for s in std {
            assert_relative_eq!(s, 93.5183805462862, epsilon = 1e-9);
        }
        Ok(())
    }

    #[test]
    fn test_mean_intensity() -> Result<(), ImageError> {
        let image = Image::<u8, 3>::from_size_pixel([4, 4].into(), [0, 3, 6])?;
        assert_relative_eq!(mean_intensity(&image), 3.0);

        let empty = Image::<u8, 3>::empty();
        assert_eq!(mean_intensity(&empty), 0.0);
        Ok(())
    }
}
