use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};
use surround_image::{Image, ImageError};

/// Crop an image to a specified region.
///
/// The size of the region is the size of `dst`.
///
/// # Arguments
///
/// * `src` - The source image to crop.
/// * `dst` - The destination image to store the cropped image.
/// * `x` - The x-coordinate of the top-left corner of the region to crop.
/// * `y` - The y-coordinate of the top-left corner of the region to crop.
///
/// # Errors
///
/// If the region does not fit inside the source image, an error is returned.
///
/// # Examples
///
/// ```rust
/// use surround_image::{Image, ImageSize};
/// use surround_imgproc::crop::crop_image;
///
/// let image = Image::<_, 1>::new(ImageSize { width: 4, height: 4 }, vec![
///     0u8, 1, 2, 3,
///     4u8, 5, 6, 7,
///     8u8, 9, 10, 11,
///     12u8, 13, 14, 15
/// ]).unwrap();
///
/// let mut cropped = Image::<_, 1>::from_size_val(ImageSize { width: 2, height: 2 }, 0u8).unwrap();
///
/// crop_image(&image, &mut cropped, 1, 1).unwrap();
///
/// assert_eq!(cropped.as_slice(), &[5u8, 6, 9, 10]);
/// ```
pub fn crop_image<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    x: usize,
    y: usize,
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync,
{
    let dst_cols = dst.cols();

    if x + dst_cols > src.cols() || y + dst.rows() > src.rows() {
        return Err(ImageError::InvalidImageSize(
            x + dst_cols,
            y + dst.rows(),
            src.cols(),
            src.rows(),
        ));
    }

    if dst.is_empty() {
        return Ok(());
    }

    let src_cols = src.cols();
    let src_data = src.as_slice();

    dst.as_slice_mut()
        .par_chunks_exact_mut(dst_cols * C)
        .enumerate()
        .for_each(|(i, dst_row)| {
            let offset = (y + i) * src_cols * C + x * C;
            let src_slice = &src_data[offset..offset + dst_cols * C];
            dst_row.copy_from_slice(src_slice);
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_keeps_the_pixels_of_the_region() -> Result<(), ImageError> {
        let data = (0..4 * 3).flat_map(|i| [i as u8, 0, 100]).collect();
        let image = Image::<u8, 3>::new([4, 3].into(), data)?;

        let mut region = Image::<u8, 3>::from_size_val([2, 2].into(), 0)?;
        crop_image(&image, &mut region, 2, 1)?;
        assert_eq!(region.as_slice(), &[6, 0, 100, 7, 0, 100, 10, 0, 100, 11, 0, 100]);

        let mut empty = Image::<u8, 3>::from_size_val([0, 2].into(), 0)?;
        crop_image(&image, &mut empty, 4, 0)?;
        Ok(())
    }

    #[test]
    fn crop_out_of_bounds() -> Result<(), ImageError> {
        let image = Image::<u8, 1>::from_size_val([2, 2].into(), 0)?;
        let mut cropped = Image::<u8, 1>::from_size_val([2, 2].into(), 0)?;
        assert!(crop_image(&image, &mut cropped, 1, 0).is_err());
        assert!(crop_image(&image, &mut cropped, 0, 1).is_err());
        Ok(())
    }
}
