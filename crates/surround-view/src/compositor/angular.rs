use serde::{Deserialize, Serialize};

use super::{smoothstep, Accumulator, CompositorConfig};
use crate::camera::{CameraId, PerCamera};
use crate::frame::Frame;
use surround_image::{ImageError, ImageSize};
use surround_imgproc::interpolation::{interpolate_pixel, InterpolationMode};

/// Geometry of the panoramic ring.
///
/// Canvas pixels are addressed by their angle, clockwise from up, and their
/// distance to the canvas centre. Each camera owns the sector centred on its
/// heading, 90 degrees wide plus the overlap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanoramaLayout {
    /// size of the output
    pub canvas: ImageSize,
    /// radius below which nothing is drawn
    pub inner_radius: f32,
    /// radius above which nothing is drawn
    pub outer_radius: f32,
    /// extra degrees added to each 90 degree sector
    pub overlap_deg: f32,
    /// width of the taper at the sector edges, in degrees
    pub angle_band_deg: f32,
    /// width of the taper at the inner and outer radii, in pixels
    pub radius_band: f32,
}

impl Default for PanoramaLayout {
    fn default() -> Self {
        Self {
            canvas: ImageSize {
                width: 1200,
                height: 1200,
            },
            inner_radius: 120.0,
            outer_radius: 580.0,
            overlap_deg: 20.0,
            angle_band_deg: 10.0,
            radius_band: 20.0,
        }
    }
}

impl PanoramaLayout {
    fn half_sector(&self) -> f32 {
        (90.0 + self.overlap_deg) / 2.0
    }

    /// Where a canvas pixel samples the frame of a camera.
    ///
    /// Returns the normalized offsets `(u, v)` in `[0, 1]` and the blending
    /// weight, or `None` outside the sector or the ring.
    pub fn sample(&self, camera: CameraId, x: f32, y: f32) -> Option<(f32, f32, f32)> {
        let dx = x - self.canvas.width as f32 / 2.0;
        let dy = y - self.canvas.height as f32 / 2.0;
        let r = (dx * dx + dy * dy).sqrt();
        if r < self.inner_radius || r > self.outer_radius {
            return None;
        }

        let angle = dx.atan2(-dy).to_degrees();
        let delta = (angle - camera.heading_deg() + 540.0).rem_euclid(360.0) - 180.0;
        let half = self.half_sector();
        if delta.abs() > half {
            return None;
        }

        let u = (delta + half) / (2.0 * half);
        let v = 1.0 - (r - self.inner_radius) / (self.outer_radius - self.inner_radius);

        let taper = |d: f32, band: f32| {
            if band > 0.0 {
                smoothstep(d / band)
            } else {
                1.0
            }
        };
        let weight = taper(half - delta.abs(), self.angle_band_deg)
            * taper(
                (r - self.inner_radius).min(self.outer_radius - r),
                self.radius_band,
            );

        Some((u, v, weight))
    }
}

/// Blend the camera frames into a ring around the vehicle.
///
/// Each frame is sampled with bilinear interpolation, its columns spread over
/// the camera sector and its rows over the radius, the bottom row nearest to
/// the vehicle. Cameras without a frame contribute nothing.
pub fn compose_panorama(
    frames: &PerCamera<Option<Frame>>,
    layout: &PanoramaLayout,
    config: &CompositorConfig,
) -> Result<Frame, ImageError> {
    if layout.outer_radius.is_nan() || layout.outer_radius <= layout.inner_radius {
        return Err(ImageError::InvalidParameter(format!(
            "outer radius {} must exceed inner radius {}",
            layout.outer_radius, layout.inner_radius
        )));
    }

    let mut acc = Accumulator::new(layout.canvas)?;

    for (camera, frame) in frames.iter() {
        let Some(frame) = frame.as_ref().filter(|f| !f.is_empty()) else {
            continue;
        };
        let (max_u, max_v) = ((frame.cols() - 1) as f32, (frame.rows() - 1) as f32);

        acc.accumulate_with(|x, y| {
            let (u, v, weight) = layout.sample(camera, x as f32, y as f32)?;
            if weight <= 0.0 {
                return None;
            }
            let color = interpolate_pixel(frame, u * max_u, v * max_v, InterpolationMode::Bilinear);
            Some((color, weight))
        });
    }

    acc.resolve(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn layout() -> PanoramaLayout {
        PanoramaLayout {
            canvas: [200, 200].into(),
            inner_radius: 20.0,
            outer_radius: 95.0,
            overlap_deg: 20.0,
            angle_band_deg: 10.0,
            radius_band: 5.0,
        }
    }

    #[test]
    fn sectors_follow_the_heading() {
        let layout = layout();
        // straight up, halfway through the ring
        let (u, v, w) = layout.sample(CameraId::Front, 100.0, 42.5).unwrap_or_default();
        assert_relative_eq!(u, 0.5);
        assert_relative_eq!(v, 0.5, epsilon = 1e-4);
        assert_relative_eq!(w, 1.0);
        assert!(layout.sample(CameraId::Back, 100.0, 42.5).is_none());

        // straight right belongs to the right camera
        assert!(layout.sample(CameraId::Right, 157.5, 100.0).is_some());
        assert!(layout.sample(CameraId::Left, 157.5, 100.0).is_none());

        // inside the inner radius
        assert!(layout.sample(CameraId::Front, 100.0, 95.0).is_none());
    }

    #[test]
    fn sector_edges_taper() {
        let layout = PanoramaLayout {
            angle_band_deg: 20.0,
            ..layout()
        };
        // 45 degrees is the middle of the overlap of front and right
        let (x, y) = (100.0 + 40.0, 100.0 - 40.0);
        let (uf, _, wf) = layout.sample(CameraId::Front, x, y).unwrap_or_default();
        let (ur, _, wr) = layout.sample(CameraId::Right, x, y).unwrap_or_default();
        assert_relative_eq!(wf, 0.5, epsilon = 1e-4);
        assert_relative_eq!(wf, wr, epsilon = 1e-4);
        assert!(uf > 0.5 && ur < 0.5);
    }

    #[test]
    fn ring_is_painted_with_the_sector_colour() -> Result<(), ImageError> {
        let colors = PerCamera {
            front: [0, 0, 255],
            left: [0, 255, 0],
            right: [255, 0, 0],
            back: [255, 255, 255],
        };
        let frames = colors.map(|_, c| Frame::from_size_pixel([40, 30].into(), c).ok());
        let config = CompositorConfig::default();

        let out = compose_panorama(&frames, &layout(), &config)?;
        assert_eq!(out.pixel(100, 40), Some(&colors.front[..]));
        assert_eq!(out.pixel(160, 100), Some(&colors.right[..]));
        assert_eq!(out.pixel(100, 160), Some(&colors.back[..]));
        assert_eq!(out.pixel(40, 100), Some(&colors.left[..]));
        // the vehicle in the middle is out of reach of the gap fill
        assert_eq!(out.pixel(100, 100), Some(&config.gap_color[..]));
        Ok(())
    }

    #[test]
    fn invalid_radii() {
        let frames = PerCamera::default();
        let layout = PanoramaLayout {
            inner_radius: 10.0,
            outer_radius: 10.0,
            ..layout()
        };
        assert!(compose_panorama(&frames, &layout, &CompositorConfig::default()).is_err());
    }
}
