use rayon::prelude::*;

use surround_image::Image;

/// Apply a function to each pixel in the image in parallel.
///
/// The source and destination images must have the same size. Rows are
/// processed in parallel, pixels of a row sequentially.
pub fn par_iter_rows<T1, const C1: usize, T2, const C2: usize>(
    src: &Image<T1, C1>,
    dst: &mut Image<T2, C2>,
    f: impl Fn(&[T1], &mut [T2]) + Send + Sync,
) where
    T1: Send + Sync,
    T2: Send + Sync,
{
    let cols = src.cols();
    if cols == 0 {
        return;
    }

    src.as_slice()
        .par_chunks_exact(C1 * cols)
        .zip(dst.as_slice_mut().par_chunks_exact_mut(C2 * cols))
        .for_each(|(src_chunk, dst_chunk)| {
            src_chunk
                .chunks_exact(C1)
                .zip(dst_chunk.chunks_exact_mut(C2))
                .for_each(|(src_pixel, dst_pixel)| {
                    f(src_pixel, dst_pixel);
                });
        });
}

/// Apply a function to each pixel of the destination image in parallel,
/// passing the pixel coordinates `(x, y)`.
pub fn par_iter_rows_indexed<T, const C: usize>(
    dst: &mut Image<T, C>,
    f: impl Fn(usize, usize, &mut [T]) + Send + Sync,
) where
    T: Send + Sync,
{
    let cols = dst.cols();
    if cols == 0 {
        return;
    }

    dst.as_slice_mut()
        .par_chunks_exact_mut(C * cols)
        .enumerate()
        .for_each(|(y, dst_chunk)| {
            dst_chunk
                .chunks_exact_mut(C)
                .enumerate()
                .for_each(|(x, dst_pixel)| f(x, y, dst_pixel));
        });
}

/// Apply a function to each pixel for grid sampling in parallel.
///
/// The coordinate maps must have the same size as the destination image.
pub fn par_iter_rows_resample<T, const C: usize>(
    dst: &mut Image<T, C>,
    map_x: &Image<f32, 1>,
    map_y: &Image<f32, 1>,
    f: impl Fn(f32, f32, &mut [T]) + Send + Sync,
) where
    T: Send + Sync,
{
    let cols = dst.cols();
    if cols == 0 {
        return;
    }

    dst.as_slice_mut()
        .par_chunks_exact_mut(C * cols)
        .zip(map_x.as_slice().par_chunks_exact(cols))
        .zip(map_y.as_slice().par_chunks_exact(cols))
        .for_each(|((dst_chunk, map_x_chunk), map_y_chunk)| {
            dst_chunk
                .chunks_exact_mut(C)
                .zip(map_x_chunk.iter().zip(map_y_chunk.iter()))
                .for_each(|(dst_pixel, (&x, &y))| {
                    f(x, y, dst_pixel);
                });
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use surround_image::{ImageError, ImageSize};

    #[test]
    fn test_par_iter_rows() -> Result<(), ImageError> {
        let src = Image::<u8, 3>::new([2, 1].into(), vec![1, 2, 3, 4, 5, 6])?;
        let mut dst = Image::<u8, 1>::from_size_val(src.size(), 0)?;
        par_iter_rows(&src, &mut dst, |s, d| d[0] = s[2]);
        assert_eq!(dst.as_slice(), &[3, 6]);
        Ok(())
    }

    #[test]
    fn test_par_iter_rows_indexed() -> Result<(), ImageError> {
        let mut dst = Image::<usize, 1>::from_size_val(
            ImageSize {
                width: 3,
                height: 2,
            },
            0,
        )?;
        par_iter_rows_indexed(&mut dst, |x, y, d| d[0] = y * 10 + x);
        assert_eq!(dst.as_slice(), &[0, 1, 2, 10, 11, 12]);
        Ok(())
    }

    #[test]
    fn test_par_iter_rows_empty() {
        let mut dst = Image::<u8, 1>::empty();
        par_iter_rows_indexed(&mut dst, |_, _, d| d[0] = 1);
        assert!(dst.is_empty());
    }
}
