use serde::{Deserialize, Serialize};

use super::{build_mask, compose, CompositorConfig, Layer};
use crate::camera::{CameraId, PerCamera};
use crate::frame::Frame;
use surround_image::{ImageError, ImageSize};
use surround_imgproc::{interpolation::InterpolationMode, resize::resize};

/// Placement of the camera tiles around the vehicle.
///
/// Each tile is centred on an anchor at `anchor_radius` from the canvas
/// centre, in the direction the camera faces: front up, right, back down,
/// left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadialLayout {
    /// size of the output
    pub canvas: ImageSize,
    /// distance of the tile centres from the canvas centre
    pub anchor_radius: f32,
    /// tile size of the front and back cameras
    pub longitudinal: ImageSize,
    /// tile size of the left and right cameras
    pub lateral: ImageSize,
}

impl Default for RadialLayout {
    fn default() -> Self {
        Self {
            canvas: ImageSize {
                width: 1200,
                height: 1200,
            },
            anchor_radius: 400.0,
            longitudinal: ImageSize {
                width: 800,
                height: 400,
            },
            lateral: ImageSize {
                width: 400,
                height: 800,
            },
        }
    }
}

impl RadialLayout {
    /// The tile size of a camera.
    pub fn tile_size(&self, camera: CameraId) -> ImageSize {
        if camera.is_side() {
            self.lateral
        } else {
            self.longitudinal
        }
    }

    /// The anchor of a camera on the canvas.
    pub fn anchor(&self, camera: CameraId) -> (f32, f32) {
        let (cx, cy) = (
            self.canvas.width as f32 / 2.0,
            self.canvas.height as f32 / 2.0,
        );
        let angle = camera.heading_deg().to_radians();
        (
            cx + self.anchor_radius * angle.sin(),
            cy - self.anchor_radius * angle.cos(),
        )
    }

    /// Top-left corner of the tile of a camera.
    pub fn offset(&self, camera: CameraId) -> (i64, i64) {
        let (ax, ay) = self.anchor(camera);
        let size = self.tile_size(camera);
        (
            (ax - size.width as f32 / 2.0).round() as i64,
            (ay - size.height as f32 / 2.0).round() as i64,
        )
    }
}

/// Blend the camera frames around the vehicle with feathered seams.
///
/// The frames are expected in canvas orientation. Each is resized to its
/// tile; cameras without a frame contribute nothing.
pub fn compose_radial(
    frames: &PerCamera<Option<Frame>>,
    layout: &RadialLayout,
    config: &CompositorConfig,
) -> Result<Frame, ImageError> {
    let mut layers = Vec::with_capacity(4);

    for (camera, frame) in frames.iter() {
        let Some(frame) = frame else {
            continue;
        };
        let size = layout.tile_size(camera);
        layers.push(Layer {
            frame: resize(frame, size, InterpolationMode::Bilinear)?,
            mask: build_mask(size, camera, config)?,
            offset: layout.offset(camera),
        });
    }

    compose(&layers, layout.canvas, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchors_surround_the_centre() {
        let layout = RadialLayout::default();
        assert_eq!(layout.offset(CameraId::Front), (200, 0));
        assert_eq!(layout.offset(CameraId::Back), (200, 800));
        assert_eq!(layout.offset(CameraId::Left), (0, 200));
        assert_eq!(layout.offset(CameraId::Right), (800, 200));
    }

    #[test]
    fn colours_land_on_their_side() -> Result<(), ImageError> {
        let layout = RadialLayout {
            canvas: [120, 120].into(),
            anchor_radius: 40.0,
            longitudinal: [80, 40].into(),
            lateral: [40, 80].into(),
        };
        let colors = PerCamera {
            front: [0, 0, 255],
            left: [0, 255, 0],
            right: [255, 0, 0],
            back: [255, 255, 255],
        };
        let frames = colors.map(|_, c| Frame::from_size_pixel([64, 48].into(), c).ok());
        let config = CompositorConfig {
            feather_width: 8,
            ..Default::default()
        };

        let out = compose_radial(&frames, &layout, &config)?;
        assert_eq!(out.size(), layout.canvas);
        assert_eq!(out.pixel(60, 2), Some(&colors.front[..]));
        assert_eq!(out.pixel(60, 117), Some(&colors.back[..]));
        assert_eq!(out.pixel(2, 60), Some(&colors.left[..]));
        assert_eq!(out.pixel(117, 60), Some(&colors.right[..]));
        Ok(())
    }

    #[test]
    fn missing_camera_contributes_nothing() -> Result<(), ImageError> {
        let layout = RadialLayout {
            canvas: [120, 120].into(),
            anchor_radius: 40.0,
            longitudinal: [80, 40].into(),
            lateral: [40, 80].into(),
        };
        let mut frames = PerCamera::from_fn(|_| Frame::from_size_pixel([32, 32].into(), [9, 9, 9]).ok());
        frames.back = None;
        let config = CompositorConfig {
            gap_fill_radius: 0,
            ..Default::default()
        };

        let out = compose_radial(&frames, &layout, &config)?;
        assert_eq!(out.pixel(60, 117), Some(&config.gap_color[..]));
        Ok(())
    }
}
