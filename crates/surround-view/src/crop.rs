use serde::{Deserialize, Serialize};

use crate::camera::{CameraId, PerCamera};
use crate::frame::Frame;
use surround_image::{ImageError, ImageSize};
use surround_imgproc::crop::crop_image;

/// Fractions of the frame removed on each side.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CropFractions {
    /// fraction of the height removed at the top
    pub top: f64,
    /// fraction of the height removed at the bottom
    pub bottom: f64,
    /// fraction of the width removed on the left
    pub left: f64,
    /// fraction of the width removed on the right
    pub right: f64,
}

impl CropFractions {
    const fn new(top: f64, bottom: f64, left: f64, right: f64) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }
}

/// Crop fractions of every camera.
///
/// The defaults remove the hood, the trunk and the mirror housings. The side
/// cameras are cropped asymmetrically so the vehicle body ends up centred
/// once the frames are rotated for composition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CropTable(pub PerCamera<CropFractions>);

impl Default for CropTable {
    fn default() -> Self {
        Self(PerCamera {
            front: CropFractions::new(0.15, 0.40, 0.15, 0.15),
            back: CropFractions::new(0.15, 0.35, 0.15, 0.15),
            left: CropFractions::new(0.15, 0.35, 0.25, 0.35),
            right: CropFractions::new(0.15, 0.35, 0.35, 0.25),
        })
    }
}

impl CropTable {
    /// The fractions of a camera.
    pub fn get(&self, camera: CameraId) -> &CropFractions {
        &self.0[camera]
    }
}

/// An axis aligned rectangle in pixels, possibly empty or negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    /// left column
    pub x: i64,
    /// top row
    pub y: i64,
    /// width in pixels
    pub width: i64,
    /// height in pixels
    pub height: i64,
}

impl Rect {
    /// Whether the rectangle covers at least one pixel.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Compute the crop rectangle of a frame, clamped to its bounds.
///
/// Each margin is truncated to whole pixels.
pub fn crop_rect(size: ImageSize, fractions: &CropFractions) -> Rect {
    let (w, h) = (size.width as i64, size.height as i64);

    let top = (size.height as f64 * fractions.top) as i64;
    let bottom = (size.height as f64 * fractions.bottom) as i64;
    let left = (size.width as f64 * fractions.left) as i64;
    let right = (size.width as f64 * fractions.right) as i64;

    let x = left.max(0);
    let y = top.max(0);

    Rect {
        x,
        y,
        width: (w - left - right).min(w - x),
        height: (h - top - bottom).min(h - y),
    }
}

fn crop_to(frame: &Frame, rect: &Rect) -> Result<Frame, ImageError> {
    let mut dst = Frame::from_size_val(
        ImageSize {
            width: rect.width as usize,
            height: rect.height as usize,
        },
        0,
    )?;
    crop_image(frame, &mut dst, rect.x as usize, rect.y as usize)?;
    Ok(dst)
}

/// Remove the vehicle body from a frame.
///
/// A degenerate rectangle leaves the frame uncropped.
///
/// # Example
///
/// ```
/// use surround_view::{crop::{crop, CropTable}, CameraId, Frame};
///
/// let frame = Frame::from_size_val([200, 100].into(), 0).unwrap();
/// let cropped = crop(&frame, CameraId::Front, &CropTable::default());
///
/// assert_eq!(cropped.size(), [140, 45].into());
/// ```
pub fn crop(frame: &Frame, camera: CameraId, table: &CropTable) -> Frame {
    let rect = crop_rect(frame.size(), table.get(camera));

    if !rect.is_valid() {
        log::warn!("invalid crop rectangle {rect:?} for the {camera} camera, keeping the frame");
        return frame.clone();
    }

    match crop_to(frame, &rect) {
        Ok(cropped) => {
            log::debug!(
                "cropped {camera} from {} to {}",
                frame.size(),
                cropped.size()
            );
            cropped
        }
        Err(e) => {
            log::warn!("failed to crop the {camera} frame: {e}");
            frame.clone()
        }
    }
}
