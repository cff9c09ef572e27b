//! Geometric projections of a single camera frame.
//!
//! Every projection is a pure function returning a new frame. The quads and
//! coefficients are hand tuned defaults expressed as fractions of the frame
//! size; none of them is derived from the extrinsic calibration.

use serde::{Deserialize, Serialize};

use crate::camera::{CameraId, PerCamera};
use crate::frame::Frame;
use surround_image::{ImageError, ImageSize};
use surround_imgproc::{
    interpolation::InterpolationMode,
    warp::{get_perspective_transform, warp_cylindrical, warp_perspective, warp_spherical},
};

/// Four point correspondences, as fractions of the frame width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    /// source points `[x, y]`
    pub src: [[f32; 2]; 4],
    /// destination points `[x, y]`
    pub dst: [[f32; 2]; 4],
}

impl Quad {
    /// Homography of the quad for a frame of size `src_size` warped into `dst_size`.
    pub fn homography(&self, src_size: ImageSize, dst_size: ImageSize) -> Result<[f32; 9], ImageError> {
        let scale = |points: &[[f32; 2]; 4], size: ImageSize| {
            points.map(|[x, y]| [x * size.width as f32, y * size.height as f32])
        };
        get_perspective_transform(&scale(&self.src, src_size), &scale(&self.dst, dst_size))
    }
}

/// Coefficients of the approximate ground plane warp.
///
/// The warp is anchored at the bottom centre of the frame, see [`ground_plane`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundPlaneCoefficients {
    /// horizontal compression
    pub sx: f32,
    /// vertical scale
    pub sy: f32,
    /// perspective coefficient, must stay below 1
    pub perspective: f32,
}

/// Ground plane coefficients for the two kinds of camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundPlaneParams {
    /// front and back cameras
    pub longitudinal: GroundPlaneCoefficients,
    /// left and right cameras
    pub lateral: GroundPlaneCoefficients,
}

impl Default for GroundPlaneParams {
    fn default() -> Self {
        Self {
            longitudinal: GroundPlaneCoefficients {
                sx: 0.9,
                sy: 0.8,
                perspective: 0.2,
            },
            lateral: GroundPlaneCoefficients {
                sx: 0.95,
                sy: 0.85,
                perspective: 0.15,
            },
        }
    }
}

impl GroundPlaneParams {
    /// The coefficients used for a camera.
    pub fn for_camera(&self, camera: CameraId) -> &GroundPlaneCoefficients {
        if camera.is_side() {
            &self.lateral
        } else {
            &self.longitudinal
        }
    }
}

/// Tunable constants of the projections.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// quad of the bird's eye preview
    pub bird_eye: Quad,
    /// quad of the front camera road homography
    pub front_homography: Quad,
    /// quads straightening the side cameras, `None` leaves the camera as is
    pub side_correction: PerCamera<Option<Quad>>,
    /// destination trapezoids of [`perspective_for_composition`], the source
    /// being the full frame
    pub composition: PerCamera<[[f32; 2]; 4]>,
    /// focal length of the cylindrical and spherical warps, as a fraction of the width
    pub focal_fraction: f32,
    /// ground plane coefficients
    pub ground_plane: GroundPlaneParams,
    /// interpolation of the perspective warps
    #[serde(skip)]
    pub interpolation: InterpolationMode,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        let forward = [[0.15, 0.0], [0.85, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let sideways = [[0.05, 0.1], [0.95, 0.1], [1.0, 1.0], [0.0, 1.0]];

        Self {
            bird_eye: Quad {
                src: [[0.0, 1.0], [1.0, 1.0], [0.15, 0.3], [0.85, 0.3]],
                dst: [[0.25, 1.0], [0.75, 1.0], [0.75, 0.2], [0.25, 0.2]],
            },
            front_homography: Quad {
                src: [[0.05, 0.75], [0.95, 0.75], [0.35, 0.45], [0.65, 0.45]],
                dst: [[0.3, 0.85], [0.7, 0.85], [0.3, 0.4], [0.7, 0.4]],
            },
            side_correction: PerCamera {
                front: None,
                back: None,
                left: Some(Quad {
                    src: [[0.1, 0.2], [0.9, 0.1], [0.1, 0.8], [0.9, 0.9]],
                    dst: [[0.1, 0.2], [0.8, 0.1], [0.1, 0.8], [0.8, 0.9]],
                }),
                right: Some(Quad {
                    src: [[0.1, 0.1], [0.9, 0.2], [0.1, 0.9], [0.9, 0.8]],
                    dst: [[0.2, 0.1], [0.9, 0.2], [0.2, 0.9], [0.9, 0.8]],
                }),
            },
            composition: PerCamera {
                front: forward,
                back: forward,
                left: sideways,
                right: sideways,
            },
            focal_fraction: 0.5,
            ground_plane: GroundPlaneParams::default(),
            interpolation: InterpolationMode::Bilinear,
        }
    }
}

impl ProjectionConfig {
    /// Focal length in pixels for a frame.
    pub fn focal_for(&self, frame: &Frame) -> f32 {
        self.focal_fraction * frame.cols() as f32
    }
}

/// A projection applied by a camera pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    /// leave the frame as is
    Identity,
    /// [`bird_eye_view`]
    BirdEye,
    /// [`front_camera_homography`]
    FrontHomography,
    /// [`cylindrical`]
    Cylindrical,
    /// [`spherical`]
    Spherical,
    /// [`ground_plane`]
    GroundPlane,
    /// [`side_perspective_correction`]
    SideCorrection,
    /// [`perspective_for_composition`] into the given size
    Composition(ImageSize),
}

fn warp_quad(
    frame: &Frame,
    quad: &Quad,
    dst_size: ImageSize,
    interpolation: InterpolationMode,
) -> Result<Frame, ImageError> {
    let m = quad.homography(frame.size(), dst_size)?;
    warp_with(frame, &m, dst_size, interpolation)
}

fn warp_with(
    frame: &Frame,
    m: &[f32; 9],
    dst_size: ImageSize,
    interpolation: InterpolationMode,
) -> Result<Frame, ImageError> {
    let mut dst = Frame::from_size_val(dst_size, 0)?;
    warp_perspective(frame, &mut dst, m, interpolation)?;
    Ok(dst)
}

/// Warp a frame into a bird's eye preview of the road in front of the camera.
///
/// # Example
///
/// ```
/// use surround_view::{projection::{bird_eye_view, ProjectionConfig}, Frame};
///
/// let frame = Frame::from_size_val([64, 48].into(), 100).unwrap();
/// let top_down = bird_eye_view(&frame, &ProjectionConfig::default()).unwrap();
///
/// assert_eq!(top_down.size(), frame.size());
/// ```
pub fn bird_eye_view(frame: &Frame, config: &ProjectionConfig) -> Result<Frame, ImageError> {
    warp_quad(frame, &config.bird_eye, frame.size(), config.interpolation)
}

/// Warp a front camera frame with the road homography.
pub fn front_camera_homography(
    frame: &Frame,
    config: &ProjectionConfig,
) -> Result<Frame, ImageError> {
    warp_quad(frame, &config.front_homography, frame.size(), config.interpolation)
}

/// Dewarp a frame onto a cylinder of the given focal length.
pub fn cylindrical(frame: &Frame, focal: f32) -> Result<Frame, ImageError> {
    warp_cylindrical(frame, focal)
}

/// Dewarp a frame onto a sphere of the given focal length.
pub fn spherical(frame: &Frame, focal: f32) -> Result<Frame, ImageError> {
    warp_spherical(frame, focal)
}

/// The homography of the ground plane approximation for a frame size.
///
/// `H = T(cx, h) * [[sx, 0, 0], [0, sy, 0], [0, p / h, 1]] * T(-cx, -h)`,
/// so the bottom centre of the frame is a fixed point.
pub fn ground_plane_homography(
    size: ImageSize,
    coefficients: &GroundPlaneCoefficients,
) -> Result<[f32; 9], ImageError> {
    let GroundPlaneCoefficients {
        sx,
        sy,
        perspective: p,
    } = *coefficients;

    if p.is_nan() || p >= 1.0 {
        return Err(ImageError::InvalidParameter(format!(
            "ground plane perspective must be below 1, got {p}"
        )));
    }
    if size.is_empty() {
        return Err(ImageError::EmptyImage);
    }

    let cx = size.width as f32 / 2.0;
    let h = size.height as f32;

    Ok([
        sx,
        cx * p / h,
        cx * (1.0 - sx - p),
        0.0,
        sy + p,
        h * (1.0 - sy - p),
        0.0,
        p / h,
        1.0 - p,
    ])
}

/// Warp a frame onto an approximate ground plane.
///
/// A fixed per camera transform, not a calibrated projection: front and back
/// cameras share one set of coefficients, left and right another.
pub fn ground_plane(
    frame: &Frame,
    camera: CameraId,
    params: &GroundPlaneParams,
) -> Result<Frame, ImageError> {
    let m = ground_plane_homography(frame.size(), params.for_camera(camera))?;
    warp_with(frame, &m, frame.size(), InterpolationMode::Bilinear)
}

/// Warp the full frame into a per camera trapezoid of `target_size`.
///
/// Standalone placement helper for callers that build their own canvas. The
/// composition modes of [`crate::SurroundView`] do not schedule it; the
/// radial compositor resizes each frame to its tile instead.
pub fn perspective_for_composition(
    frame: &Frame,
    camera: CameraId,
    target_size: ImageSize,
    config: &ProjectionConfig,
) -> Result<Frame, ImageError> {
    let quad = Quad {
        src: [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        dst: config.composition[camera],
    };
    warp_quad(frame, &quad, target_size, config.interpolation)
}

/// Straighten the U shaped vehicle body seen by the side cameras.
///
/// Front and back frames are returned unchanged.
pub fn side_perspective_correction(
    frame: &Frame,
    camera: CameraId,
    config: &ProjectionConfig,
) -> Result<Frame, ImageError> {
    match &config.side_correction[camera] {
        Some(quad) => warp_quad(frame, quad, frame.size(), config.interpolation),
        None => Ok(frame.clone()),
    }
}

/// Apply a projection to the frame of a camera.
pub fn project(
    frame: &Frame,
    camera: CameraId,
    projection: Projection,
    config: &ProjectionConfig,
) -> Result<Frame, ImageError> {
    match projection {
        Projection::Identity => Ok(frame.clone()),
        Projection::BirdEye => bird_eye_view(frame, config),
        Projection::FrontHomography => front_camera_homography(frame, config),
        Projection::Cylindrical => cylindrical(frame, config.focal_for(frame)),
        Projection::Spherical => spherical(frame, config.focal_for(frame)),
        Projection::GroundPlane => ground_plane(frame, camera, &config.ground_plane),
        Projection::SideCorrection => side_perspective_correction(frame, camera, config),
        Projection::Composition(size) => perspective_for_composition(frame, camera, size, config),
    }
}
