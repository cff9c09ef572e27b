use crate::parallel;

use super::interpolate::interpolate_pixel;
use super::InterpolationMode;
use surround_image::{Image, ImageDtype, ImageError};

/// Apply generic geometric transformation to an image.
///
/// Destination pixels whose sampling coordinate falls outside the source
/// image are left untouched, so callers control the border value through the
/// initial content of `dst`.
///
/// # Arguments
///
/// * `src` - The input image container with shape (height, width, C).
/// * `dst` - The output image container with shape (height, width, C).
/// * `map_x` - The x coordinates of the pixels to interpolate.
/// * `map_y` - The y coordinates of the pixels to interpolate.
/// * `interpolation` - The interpolation mode to use.
///
/// # Errors
///
/// * The mapx and mapy must have the same size.
/// * The output image must have the same size as the mapx and mapy.
pub fn remap<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    map_x: &Image<f32, 1>,
    map_y: &Image<f32, 1>,
    interpolation: InterpolationMode,
) -> Result<(), ImageError> {
    if map_x.size() != map_y.size() {
        return Err(ImageError::InvalidImageSize(
            map_x.cols(),
            map_x.rows(),
            map_y.cols(),
            map_y.rows(),
        ));
    }

    if dst.size() != map_x.size() {
        return Err(ImageError::InvalidImageSize(
            map_x.cols(),
            map_x.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    if src.is_empty() {
        return Err(ImageError::EmptyImage);
    }

    let (src_cols, src_rows) = (src.cols() as f32, src.rows() as f32);

    // parallelize the remap operation by rows
    parallel::par_iter_rows_resample(dst, map_x, map_y, |x, y, dst_pixel| {
        if x >= 0.0 && x < src_cols && y >= 0.0 && y < src_rows {
            let values = interpolate_pixel(src, x, y, interpolation);
            for (pixel, value) in dst_pixel.iter_mut().zip(values) {
                *pixel = T::from_f32(value);
            }
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::interpolation::grid::meshgrid_from_fn;
    use surround_image::{Image, ImageError, ImageSize};

    #[test]
    fn remap_smoke() -> Result<(), ImageError> {
        let image = Image::<_, 1>::new(
            ImageSize {
                width: 3,
                height: 3,
            },
            vec![0f32, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
        )?;

        let map_x = Image::<f32, 1>::new([2, 2].into(), vec![0.0, 2.0, 0.0, 2.0])?;
        let map_y = Image::<f32, 1>::new([2, 2].into(), vec![0.0, 0.0, 2.0, 2.0])?;

        let expected = [0.0, 2.0, 6.0, 8.0];

        let mut image_transformed = Image::<_, 1>::from_size_val([2, 2].into(), 0.0)?;

        super::remap(
            &image,
            &mut image_transformed,
            &map_x,
            &map_y,
            super::InterpolationMode::Bilinear,
        )?;

        assert_eq!(image_transformed.num_channels(), 1);
        assert_eq!(image_transformed.size().width, 2);
        assert_eq!(image_transformed.size().height, 2);

        for (a, b) in image_transformed.as_slice().iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-6);
        }

        Ok(())
    }

    #[test]
    fn remap_outside_keeps_border() -> Result<(), ImageError> {
        let image = Image::<u8, 3>::from_size_val([2, 2].into(), 200)?;
        let (map_x, map_y) = meshgrid_from_fn(2, 1, |x, _| Ok((x as f32 * 10.0, 0.0)))?;
        let mut dst = Image::<u8, 3>::from_size_val([2, 1].into(), 7)?;

        super::remap(
            &image,
            &mut dst,
            &map_x,
            &map_y,
            super::InterpolationMode::Nearest,
        )?;

        assert_eq!(dst.as_slice(), &[200, 200, 200, 7, 7, 7]);
        Ok(())
    }

    #[test]
    fn remap_size_mismatch() -> Result<(), ImageError> {
        let image = Image::<u8, 1>::from_size_val([2, 2].into(), 0)?;
        let map = Image::<f32, 1>::from_size_val([2, 2].into(), 0.0)?;
        let mut dst = Image::<u8, 1>::from_size_val([3, 2].into(), 0)?;
        let res = super::remap(
            &image,
            &mut dst,
            &map,
            &map,
            super::InterpolationMode::Nearest,
        );
        assert!(res.is_err());
        Ok(())
    }
}
