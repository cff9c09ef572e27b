use std::cmp::{max, min};
use surround_image::Image;

#[inline]
fn set_pixel<const C: usize>(img: &mut Image<u8, C>, x: i64, y: i64, color: [u8; C]) {
    if x >= 0 && x < img.cols() as i64 && y >= 0 && y < img.rows() as i64 {
        let start = (y as usize * img.cols() + x as usize) * C;
        img.as_slice_mut()[start..start + C].copy_from_slice(&color);
    }
}

/// Draws a line on an image inplace using Bresenham's line algorithm.
///
/// Pixels falling outside the image are skipped.
///
/// # Arguments
///
/// * `img` - The image to draw on.
/// * `p0` - The start point of the line as a tuple of (x, y).
/// * `p1` - The end point of the line as a tuple of (x, y).
/// * `color` - The color of the line as an array of `C` elements.
/// * `thickness` - The thickness of the line, approximated with a square brush.
pub fn draw_line<const C: usize>(
    img: &mut Image<u8, C>,
    p0: (i64, i64),
    p1: (i64, i64),
    color: [u8; C],
    thickness: usize,
) {
    let (mut x0, mut y0) = p0;
    let (x1, y1) = p1;

    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };

    let mut err = dx - dy;
    let half = if thickness > 1 {
        thickness as i64 / 2
    } else {
        0
    };

    loop {
        for i in -half..=half {
            for j in -half..=half {
                set_pixel(img, x0 + i, y0 + j, color);
            }
        }

        if x0 == x1 && y0 == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x0 += sx;
        }
        if e2 < dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Draws a rectangle outline on an image inplace.
///
/// # Arguments
///
/// * `img` - The image to draw on.
/// * `top_left` - The top-left corner coordinates (x, y).
/// * `bottom_right` - The bottom-right corner coordinates (x, y), inclusive.
/// * `color` - The color of the rectangle outline.
/// * `thickness` - The thickness of the lines.
pub fn draw_rect<const C: usize>(
    img: &mut Image<u8, C>,
    top_left: (i64, i64),
    bottom_right: (i64, i64),
    color: [u8; C],
    thickness: usize,
) {
    let (x0, y0) = top_left;
    let (x1, y1) = bottom_right;
    let (lx0, lx1) = (min(x0, x1), max(x0, x1));
    let (ly0, ly1) = (min(y0, y1), max(y0, y1));

    draw_line(img, (lx0, ly0), (lx1, ly0), color, thickness);
    draw_line(img, (lx0, ly1), (lx1, ly1), color, thickness);
    draw_line(img, (lx0, ly0), (lx0, ly1), color, thickness);
    draw_line(img, (lx1, ly0), (lx1, ly1), color, thickness);
}

/// Draws a filled rectangle on an image inplace.
///
/// The rectangle is clipped against the image bounds.
///
/// # Arguments
///
/// * `img` - The image to draw on.
/// * `top_left` - The top-left corner coordinates (x, y).
/// * `bottom_right` - The bottom-right corner coordinates (x, y), inclusive.
/// * `color` - The fill color of the rectangle.
pub fn draw_filled_rect<const C: usize>(
    img: &mut Image<u8, C>,
    top_left: (i64, i64),
    bottom_right: (i64, i64),
    color: [u8; C],
) {
    let (x_start, y_start) = top_left;
    let (x_end, y_end) = bottom_right;

    let x_min = max(min(x_start, x_end), 0);
    let y_min = max(min(y_start, y_end), 0);
    let x_max = min(max(x_start, x_end), img.cols() as i64 - 1);
    let y_max = min(max(y_start, y_end), img.rows() as i64 - 1);

    if x_min > x_max || y_min > y_max {
        return;
    }

    let cols = img.cols();
    let (x_min, x_max) = (x_min as usize, x_max as usize);
    for y in y_min as usize..=y_max as usize {
        let row = &mut img.as_slice_mut()[(y * cols + x_min) * C..(y * cols + x_max + 1) * C];
        row.chunks_exact_mut(C)
            .for_each(|pixel| pixel.copy_from_slice(&color));
    }
}

/// Draws an arrow from `p0` to the tip `p1`.
///
/// The head is made of two strokes of length `head_len` pointing back from
/// the tip at +/- 30 degrees.
pub fn draw_arrow<const C: usize>(
    img: &mut Image<u8, C>,
    p0: (i64, i64),
    p1: (i64, i64),
    color: [u8; C],
    thickness: usize,
    head_len: f64,
) {
    draw_line(img, p0, p1, color, thickness);

    let angle = ((p0.1 - p1.1) as f64).atan2((p0.0 - p1.0) as f64);
    for side in [-1.0, 1.0] {
        let a = angle + side * std::f64::consts::FRAC_PI_6;
        let head = (
            p1.0 + (head_len * a.cos()).round() as i64,
            p1.1 + (head_len * a.sin()).round() as i64,
        );
        draw_line(img, p1, head, color, thickness);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surround_image::{ImageError, ImageSize};

    #[test]
    fn test_draw_line() -> Result<(), ImageError> {
        let mut img = Image::<u8, 1>::new(
            ImageSize {
                width: 5,
                height: 5,
            },
            vec![0; 25],
        )?;
        draw_line(&mut img, (0, 0), (4, 4), [255], 1);
        #[rustfmt::skip]
        assert_eq!(
            img.as_slice(),
            vec![
                255, 0, 0, 0, 0,
                0, 255, 0, 0, 0,
                0, 0, 255, 0, 0,
                0, 0, 0, 255, 0,
                0, 0, 0, 0, 255,
            ]
        );
        Ok(())
    }

    #[test]
    fn test_draw_filled_rect_clipped() -> Result<(), ImageError> {
        let mut img = Image::<u8, 3>::from_size_val([4, 3].into(), 0)?;
        draw_filled_rect(&mut img, (2, -5), (10, 1), [1, 2, 3]);
        assert_eq!(img.pixel(2, 0), Some(&[1u8, 2, 3][..]));
        assert_eq!(img.pixel(3, 1), Some(&[1u8, 2, 3][..]));
        assert_eq!(img.pixel(1, 0), Some(&[0u8, 0, 0][..]));
        assert_eq!(img.pixel(2, 2), Some(&[0u8, 0, 0][..]));
        Ok(())
    }

    #[test]
    fn test_draw_rect_outline() -> Result<(), ImageError> {
        let mut img = Image::<u8, 1>::from_size_val([5, 5].into(), 0)?;
        draw_rect(&mut img, (0, 0), (4, 4), [9], 1);
        assert_eq!(img.pixel(0, 2), Some(&[9u8][..]));
        assert_eq!(img.pixel(4, 4), Some(&[9u8][..]));
        assert_eq!(img.pixel(2, 2), Some(&[0u8][..]));
        Ok(())
    }

    #[test]
    fn test_draw_arrow_tip() -> Result<(), ImageError> {
        let mut img = Image::<u8, 1>::from_size_val([21, 21].into(), 0)?;
        draw_arrow(&mut img, (10, 20), (10, 2), [255], 1, 5.0);
        assert_eq!(img.pixel(10, 2), Some(&[255u8][..]));
        assert_eq!(img.pixel(10, 15), Some(&[255u8][..]));
        // head strokes point back down from the tip
        assert_eq!(img.pixel(7, 6), Some(&[255u8][..]));
        assert_eq!(img.pixel(13, 6), Some(&[255u8][..]));
        Ok(())
    }
}
