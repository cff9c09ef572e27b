use crate::interpolation::{grid::meshgrid_from_fn, remap, InterpolationMode};
use surround_image::{Image, ImageDtype, ImageError, ImageSize};

/// Resize an image to the size of the destination image.
///
/// The corners of the source are aligned with the corners of the destination,
/// the same sampling grid as a `linspace` over each axis.
///
/// # Arguments
///
/// * `src` - The input image container.
/// * `dst` - The output image container, its size defines the new size.
/// * `interpolation` - The interpolation mode to use.
///
/// # Example
///
/// ```
/// use surround_image::{Image, ImageSize};
/// use surround_imgproc::resize::resize_native;
/// use surround_imgproc::interpolation::InterpolationMode;
///
/// let image = Image::<_, 3>::new(
///     ImageSize {
///         width: 4,
///         height: 5,
///     },
///     vec![0f32; 4 * 5 * 3],
/// )
/// .unwrap();
///
/// let new_size = ImageSize {
///     width: 2,
///     height: 3,
/// };
///
/// let mut image_resized = Image::<_, 3>::from_size_val(new_size, 0.0).unwrap();
///
/// resize_native(
///     &image,
///     &mut image_resized,
///     InterpolationMode::Nearest,
/// )
/// .unwrap();
///
/// assert_eq!(image_resized.num_channels(), 3);
/// assert_eq!(image_resized.size().width, 2);
/// assert_eq!(image_resized.size().height, 3);
/// ```
pub fn resize_native<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    interpolation: InterpolationMode,
) -> Result<(), ImageError> {
    if src.is_empty() {
        return Err(ImageError::EmptyImage);
    }

    let step = |src_len: usize, dst_len: usize| {
        if dst_len > 1 {
            (src_len - 1) as f32 / (dst_len - 1) as f32
        } else {
            0.0
        }
    };

    let step_x = step(src.cols(), dst.cols());
    let step_y = step(src.rows(), dst.rows());

    let (map_x, map_y) = meshgrid_from_fn(dst.cols(), dst.rows(), |x, y| {
        Ok((x as f32 * step_x, y as f32 * step_y))
    })?;

    remap(src, dst, &map_x, &map_y, interpolation)
}

/// Resize an image and return the result as a new image.
///
/// Convenience wrapper over [`resize_native`].
pub fn resize<T: ImageDtype, const C: usize>(
    src: &Image<T, C>,
    new_size: ImageSize,
    interpolation: InterpolationMode,
) -> Result<Image<T, C>, ImageError> {
    let mut dst = Image::from_size_val(new_size, T::default())?;
    resize_native(src, &mut dst, interpolation)?;
    Ok(dst)
}
