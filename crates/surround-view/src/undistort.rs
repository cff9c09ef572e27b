use serde::{Deserialize, Serialize};

use crate::calibration::{CalibrationStore, Intrinsics};
use crate::camera::CameraId;
use crate::frame::Frame;
use surround_image::ImageError;
use surround_imgproc::{
    calibration::{
        distortion::{generate_correction_map_polynomial, PolynomialDistortion},
        fisheye::{generate_correction_map_fisheye, KannalaBrandtDistortion},
        CameraIntrinsic,
    },
    core::mean_intensity,
    interpolation::{remap, InterpolationMode},
};

/// Thresholds of the distortion removal policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UndistortConfig {
    /// lenses with `xi` above this value use the fisheye model
    pub xi_threshold: f64,
    /// focal scale of the rectified output for the fisheye model
    pub fisheye_focal_scale: f64,
    /// focal scale of the rectified output for the standard model
    pub standard_focal_scale: f64,
    /// results with a lower mean intensity are discarded
    pub min_mean_intensity: f64,
}

impl Default for UndistortConfig {
    fn default() -> Self {
        Self {
            xi_threshold: 0.5,
            fisheye_focal_scale: 0.45,
            standard_focal_scale: 0.6,
            min_mean_intensity: 5.0,
        }
    }
}

/// Distortion model used to correct a lens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LensModel {
    /// Kannala-Brandt equidistant model, for strongly omnidirectional lenses.
    Fisheye,
    /// radial-tangential model with `D = [k1, k2, p1, p2]`.
    Standard,
}

/// What [`undistort_detailed`] did with a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UndistortOutcome {
    /// The frame was corrected with the given model.
    Corrected(LensModel),
    /// The camera has no intrinsics, the input was returned.
    MissingCalibration,
    /// The corrected frame was nearly black, the input was returned.
    Degenerate {
        /// mean intensity of the discarded result
        mean: f64,
    },
    /// The correction failed, the input was returned.
    Failed,
}

/// Choose the lens model and the focal scale of the rectified output.
pub fn select_model(intrinsics: &Intrinsics, config: &UndistortConfig) -> (LensModel, f64) {
    if intrinsics.xi > config.xi_threshold {
        (LensModel::Fisheye, config.fisheye_focal_scale)
    } else {
        (LensModel::Standard, config.standard_focal_scale)
    }
}

fn correct(
    frame: &Frame,
    intrinsics: &Intrinsics,
    config: &UndistortConfig,
) -> Result<(Frame, LensModel), ImageError> {
    let (model, scale) = select_model(intrinsics, config);

    let camera = CameraIntrinsic::from_matrix(&intrinsics.k);
    let new_camera = camera.scaled_focal(scale);
    let size = frame.size();

    let (map_x, map_y) = match model {
        LensModel::Fisheye => generate_correction_map_fisheye(
            &camera,
            &new_camera,
            &KannalaBrandtDistortion::from(intrinsics.d),
            &size,
        )?,
        LensModel::Standard => generate_correction_map_polynomial(
            &camera,
            &new_camera,
            &PolynomialDistortion::from_opencv_coefficients(&intrinsics.d),
            &size,
        )?,
    };

    let mut dst = Frame::from_size_val(size, 0)?;
    remap(frame, &mut dst, &map_x, &map_y, InterpolationMode::Bilinear)?;

    Ok((dst, model))
}

/// Remove the lens distortion of a frame and report what happened.
///
/// The input is returned unchanged when the camera is not calibrated, when
/// the correction fails, or when the corrected frame is degenerate.
///
/// # Arguments
///
/// * `frame` - The raw frame of the camera.
/// * `camera` - The camera that captured the frame.
/// * `store` - The calibration of the cameras.
/// * `config` - The thresholds of the policy.
pub fn undistort_detailed(
    frame: &Frame,
    camera: CameraId,
    store: &CalibrationStore,
    config: &UndistortConfig,
) -> (Frame, UndistortOutcome) {
    let Some(intrinsics) = store.intrinsics(camera) else {
        log::warn!("no intrinsics for the {camera} camera, skipping undistortion");
        return (frame.clone(), UndistortOutcome::MissingCalibration);
    };

    match correct(frame, intrinsics, config) {
        Ok((corrected, model)) => {
            let mean = mean_intensity(&corrected);
            if mean < config.min_mean_intensity {
                log::warn!(
                    "undistorted {camera} frame is degenerate (mean intensity {mean:.2}), using the input"
                );
                return (frame.clone(), UndistortOutcome::Degenerate { mean });
            }
            log::debug!("undistorted {camera} frame with the {model:?} model");
            (corrected, UndistortOutcome::Corrected(model))
        }
        Err(e) => {
            log::warn!("failed to undistort the {camera} frame: {e}");
            (frame.clone(), UndistortOutcome::Failed)
        }
    }
}

/// Remove the lens distortion of a frame.
///
/// See [`undistort_detailed`].
pub fn undistort(
    frame: &Frame,
    camera: CameraId,
    store: &CalibrationStore,
    config: &UndistortConfig,
) -> Frame {
    undistort_detailed(frame, camera, store, config).0
}
