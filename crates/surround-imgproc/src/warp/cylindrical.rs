use crate::interpolation::{grid::meshgrid_from_fn, remap, InterpolationMode};
use surround_image::{Image, ImageDtype, ImageError};

fn check_focal(focal: f32) -> Result<(), ImageError> {
    if !(focal.is_finite() && focal > 0.0) {
        return Err(ImageError::InvalidParameter(format!(
            "focal length must be positive, got {focal}"
        )));
    }
    Ok(())
}

fn resample_nearest<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    map: impl Fn(f32, f32) -> (f32, f32) + Send + Sync,
) -> Result<Image<T, C>, ImageError> {
    let (cols, rows) = (src.cols(), src.rows());
    let (max_x, max_y) = ((cols - 1) as f32, (rows - 1) as f32);

    let (map_x, map_y) = meshgrid_from_fn(cols, rows, |x, y| {
        let (u, v) = map(x as f32, y as f32);
        Ok((u.clamp(0.0, max_x), v.clamp(0.0, max_y)))
    })?;

    let mut dst = Image::from_size_val(src.size(), T::default())?;
    remap(src, &mut dst, &map_x, &map_y, InterpolationMode::Nearest)?;

    Ok(dst)
}

/// Dewarp an image with a cylindrical projection.
///
/// For every destination pixel `(x, y)`, with the optical centre `(cx, cy)`
/// at the image centre:
///
/// ```text
/// theta = atan2(x - cx, f)
/// h     = (y - cy) * f / sqrt((x - cx)^2 + f^2)
/// src   = (f * theta + cx, h + cy)
/// ```
///
/// The source coordinate is clamped to the image and sampled with the
/// nearest neighbour, so the horizontal axis of the output is proportional to
/// the view angle.
///
/// # Arguments
///
/// * `src` - The input image.
/// * `focal` - The focal length in pixels.
///
/// # Returns
///
/// A new image with the same size as `src`.
///
/// # Errors
///
/// The image must not be empty and the focal length must be positive.
pub fn warp_cylindrical<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    focal: f32,
) -> Result<Image<T, C>, ImageError> {
    check_focal(focal)?;
    if src.is_empty() {
        return Err(ImageError::EmptyImage);
    }

    let cx = src.cols() as f32 / 2.0;
    let cy = src.rows() as f32 / 2.0;

    resample_nearest(src, |x, y| {
        let dx = x - cx;
        let theta = dx.atan2(focal);
        let h = (y - cy) * focal / (dx * dx + focal * focal).sqrt();
        (focal * theta + cx, h + cy)
    })
}

/// Dewarp an image with a spherical projection.
///
/// Same family as [`warp_cylindrical`], the vertical axis is also mapped to
/// an angle:
///
/// ```text
/// theta = atan2(x - cx, f)
/// phi   = atan2(y - cy, sqrt((x - cx)^2 + f^2))
/// src   = (f * theta + cx, f * phi + cy)
/// ```
///
/// # Errors
///
/// The image must not be empty and the focal length must be positive.
pub fn warp_spherical<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    focal: f32,
) -> Result<Image<T, C>, ImageError> {
    check_focal(focal)?;
    if src.is_empty() {
        return Err(ImageError::EmptyImage);
    }

    let cx = src.cols() as f32 / 2.0;
    let cy = src.rows() as f32 / 2.0;

    resample_nearest(src, |x, y| {
        let dx = x - cx;
        let theta = dx.atan2(focal);
        let phi = (y - cy).atan2((dx * dx + focal * focal).sqrt());
        (focal * theta + cx, focal * phi + cy)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient() -> Result<Image<u8, 1>, ImageError> {
        let data = (0..64u8).collect();
        Image::new([8, 8].into(), data)
    }

    #[test]
    fn cylindrical_keeps_size_and_centre() -> Result<(), ImageError> {
        let image = gradient()?;
        let warped = warp_cylindrical(&image, 4.0)?;
        assert_eq!(warped.size(), image.size());
        // the optical centre maps onto itself
        assert_eq!(warped.pixel(4, 4), image.pixel(4, 4));
        Ok(())
    }

    #[test]
    fn cylindrical_large_focal_is_identity() -> Result<(), ImageError> {
        let image = gradient()?;
        let warped = warp_cylindrical(&image, 1e6)?;
        assert_eq!(warped.as_slice(), image.as_slice());
        Ok(())
    }

    #[test]
    fn spherical_keeps_uniform_image() -> Result<(), ImageError> {
        let image = Image::<u8, 3>::from_size_pixel([10, 6].into(), [1, 2, 3])?;
        let warped = warp_spherical(&image, 3.0)?;
        assert_eq!(warped, image);
        Ok(())
    }

    #[test]
    fn invalid_focal() -> Result<(), ImageError> {
        let image = gradient()?;
        assert!(warp_cylindrical(&image, 0.0).is_err());
        assert!(warp_spherical(&image, -1.0).is_err());
        Ok(())
    }
}
