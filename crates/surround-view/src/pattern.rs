use crate::frame::Frame;
use surround_image::{ImageError, ImageSize};
use surround_imgproc::draw::{draw_filled_rect, draw_line};

const GRID_STEP: usize = 50;
const MINOR_LINE: [u8; 3] = [100, 100, 100];
const MAJOR_LINE: [u8; 3] = [255, 255, 255];
const CROSS: [u8; 3] = [0, 255, 0];

/// A frame filled with a single BGR colour.
pub fn solid(size: ImageSize, color: [u8; 3]) -> Result<Frame, ImageError> {
    Frame::from_size_pixel(size, color)
}

/// A reference grid to check the geometry of a projection.
///
/// Black background with a line every 50 pixels, every fourth line white and
/// the others gray, a green cross at the centre and four 51 pixel squares
/// centred at the quarter points: red top-left, blue top-right, yellow
/// bottom-left and magenta bottom-right.
pub fn test_grid(size: ImageSize) -> Result<Frame, ImageError> {
    let mut grid = Frame::from_size_val(size, 0)?;
    let (w, h) = (size.width as i64, size.height as i64);

    let line_color = |i: usize| {
        if i % (GRID_STEP * 4) == 0 {
            MAJOR_LINE
        } else {
            MINOR_LINE
        }
    };
    for x in (0..size.width).step_by(GRID_STEP) {
        draw_line(&mut grid, (x as i64, 0), (x as i64, h - 1), line_color(x), 1);
    }
    for y in (0..size.height).step_by(GRID_STEP) {
        draw_line(&mut grid, (0, y as i64), (w - 1, y as i64), line_color(y), 1);
    }

    let (cx, cy) = (w / 2, h / 2);
    draw_line(&mut grid, (cx - 20, cy), (cx + 20, cy), CROSS, 3);
    draw_line(&mut grid, (cx, cy - 20), (cx, cy + 20), CROSS, 3);

    let squares = [
        (w / 4, h / 4, [0, 0, 255]),
        (3 * w / 4, h / 4, [255, 0, 0]),
        (w / 4, 3 * h / 4, [0, 255, 255]),
        (3 * w / 4, 3 * h / 4, [255, 0, 255]),
    ];
    for (x, y, color) in squares {
        draw_filled_rect(&mut grid, (x - 25, y - 25), (x + 25, y + 25), color);
    }

    Ok(grid)
}

/// A black and white checkerboard, white in the top-left square.
pub fn checkerboard(size: ImageSize, square: usize) -> Result<Frame, ImageError> {
    if square == 0 {
        return Err(ImageError::InvalidParameter(
            "checkerboard square size must be positive".to_string(),
        ));
    }

    let mut board = Frame::from_size_val(size, 0)?;
    surround_imgproc::parallel::par_iter_rows_indexed(&mut board, |x, y, pixel| {
        if (x / square + y / square) % 2 == 0 {
            pixel.fill(255);
        }
    });

    Ok(board)
}
