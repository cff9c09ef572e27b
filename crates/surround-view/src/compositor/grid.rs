use serde::{Deserialize, Serialize};

use crate::camera::{CameraId, PerCamera};
use crate::frame::Frame;
use surround_image::{ImageError, ImageSize};
use surround_imgproc::{
    draw::{draw_arrow, draw_filled_rect, draw_rect},
    interpolation::InterpolationMode,
    resize::resize,
};

/// Fixed tiling of the four cameras around a vehicle placeholder.
///
/// ```text
/// +-----------------------------+
/// |            front            |
/// +------+--------------+-------+
/// | left |   vehicle    | right |
/// +------+--------------+-------+
/// |            back             |
/// +-----------------------------+
/// ```
///
/// The front and back bands span the whole canvas width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    /// section of the front and back cameras, the width is the vehicle area
    pub longitudinal: ImageSize,
    /// section of the left and right cameras
    pub lateral: ImageSize,
    /// fill of the vehicle area
    pub car_color: [u8; 3],
    /// fill of the car marker
    pub marker_color: [u8; 3],
    /// colour of the heading arrow
    pub arrow_color: [u8; 3],
    /// colour of the separators between sections, none if `None`
    pub border: Option<[u8; 3]>,
    /// thickness of the separators
    pub border_thickness: usize,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            longitudinal: ImageSize {
                width: 840,
                height: 720,
            },
            lateral: ImageSize {
                width: 720,
                height: 800,
            },
            car_color: [40, 40, 40],
            marker_color: [200, 200, 200],
            arrow_color: [255, 255, 255],
            border: None,
            border_thickness: 2,
        }
    }
}

/// A rectangle of the grid canvas, `(x, y, size)`.
pub type Section = (usize, usize, ImageSize);

impl GridLayout {
    /// Size of the whole canvas.
    pub fn canvas_size(&self) -> ImageSize {
        ImageSize {
            width: 2 * self.lateral.width + self.longitudinal.width,
            height: 2 * self.longitudinal.height + self.lateral.height,
        }
    }

    /// The section a camera is drawn into.
    pub fn section(&self, camera: CameraId) -> Section {
        let canvas = self.canvas_size();
        let band = ImageSize {
            width: canvas.width,
            height: self.longitudinal.height,
        };
        match camera {
            CameraId::Front => (0, 0, band),
            CameraId::Back => (0, self.longitudinal.height + self.lateral.height, band),
            CameraId::Left => (0, self.longitudinal.height, self.lateral),
            CameraId::Right => (
                self.lateral.width + self.longitudinal.width,
                self.longitudinal.height,
                self.lateral,
            ),
        }
    }

    /// The vehicle area in the centre of the canvas.
    pub fn vehicle_area(&self) -> Section {
        (
            self.lateral.width,
            self.longitudinal.height,
            ImageSize {
                width: self.longitudinal.width,
                height: self.lateral.height,
            },
        )
    }
}

fn paste(canvas: &mut Frame, tile: &Frame, x: usize, y: usize) {
    let cols = canvas.cols();
    let width = tile.cols().min(cols.saturating_sub(x));
    let height = tile.rows().min(canvas.rows().saturating_sub(y));
    if width == 0 {
        return;
    }

    let dst = canvas.as_slice_mut();
    for (r, src_row) in tile
        .as_slice()
        .chunks_exact(tile.cols() * 3)
        .take(height)
        .enumerate()
    {
        let start = ((y + r) * cols + x) * 3;
        dst[start..start + width * 3].copy_from_slice(&src_row[..width * 3]);
    }
}

fn draw_vehicle(canvas: &mut Frame, layout: &GridLayout) {
    let (x, y, size) = layout.vehicle_area();
    let (x, y) = (x as i64, y as i64);
    let (w, h) = (size.width as i64, size.height as i64);
    draw_filled_rect(canvas, (x, y), (x + w - 1, y + h - 1), layout.car_color);

    let (cx, cy) = (x + w / 2, y + h / 2);
    let (car_w, car_h) = (
        layout.longitudinal.width as i64 / 4,
        layout.lateral.height as i64 / 6,
    );
    draw_filled_rect(
        canvas,
        (cx - car_w / 2, cy - car_h / 2),
        (cx + car_w / 2, cy + car_h / 2),
        layout.marker_color,
    );

    // heading, pointing to the front camera
    draw_arrow(
        canvas,
        (cx, cy - car_h / 4),
        (cx, cy - car_h / 2 - 20),
        layout.arrow_color,
        3,
        12.0,
    );
}

/// Tile the camera frames around a vehicle placeholder.
///
/// Frames are expected in canvas orientation and are resized to fill their
/// section. The section of a camera without a frame stays black.
pub fn compose_grid(
    frames: &PerCamera<Option<Frame>>,
    layout: &GridLayout,
) -> Result<Frame, ImageError> {
    let mut canvas = Frame::from_size_val(layout.canvas_size(), 0)?;

    for (camera, frame) in frames.iter() {
        let Some(frame) = frame.as_ref().filter(|f| !f.is_empty()) else {
            continue;
        };
        let (x, y, size) = layout.section(camera);
        let tile = resize(frame, size, InterpolationMode::Bilinear)?;
        paste(&mut canvas, &tile, x, y);
    }

    draw_vehicle(&mut canvas, layout);

    if let Some(color) = layout.border {
        for camera in CameraId::ALL {
            let (x, y, size) = layout.section(camera);
            let (x, y) = (x as i64, y as i64);
            draw_rect(
                &mut canvas,
                (x, y),
                (x + size.width as i64 - 1, y + size.height as i64 - 1),
                color,
                layout.border_thickness,
            );
        }
    }

    Ok(canvas)
}
