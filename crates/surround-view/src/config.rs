use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::camera::CameraId;
use crate::compositor::{CompositorConfig, GridLayout, PanoramaLayout, RadialLayout};
use crate::crop::CropTable;
use crate::error::SurroundError;
use crate::projection::ProjectionConfig;
use crate::undistort::UndistortConfig;

/// Every tunable constant of the surround view pipeline.
///
/// Missing fields in a configuration document take their default value, so
/// an empty document yields [`SurroundConfig::default`].
///
/// # Example
///
/// ```
/// use surround_view::SurroundConfig;
///
/// let config = SurroundConfig::from_json_str(r#"{"compositor": {"feather_width": 16}}"#).unwrap();
///
/// assert_eq!(config.compositor.feather_width, 16);
/// assert_eq!(config.undistort.xi_threshold, 0.5);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurroundConfig {
    /// distortion removal policy
    pub undistort: UndistortConfig,
    /// per camera crop fractions
    pub crop: CropTable,
    /// projection constants
    pub projection: ProjectionConfig,
    /// blending parameters
    pub compositor: CompositorConfig,
    /// layout of the grid mode
    pub grid: GridLayout,
    /// layout of the radial modes
    pub radial: RadialLayout,
    /// layout of the panoramic mode
    pub panorama: PanoramaLayout,
}

impl SurroundConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, SurroundError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SurroundError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SurroundError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SurroundError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        log::info!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Serialize the configuration as pretty printed JSON.
    pub fn to_json_string(&self) -> Result<String, SurroundError> {
        serde_json::to_string_pretty(self).map_err(|e| SurroundError::Config(e.to_string()))
    }

    /// Check the values that would make a stage fail on every frame.
    pub fn validate(&self) -> Result<(), SurroundError> {
        let fail = |msg: String| Err(SurroundError::Config(msg));

        for camera in CameraId::ALL {
            let f = self.crop.get(camera);
            let fractions = [f.top, f.bottom, f.left, f.right];
            if fractions.iter().any(|v| !(0.0..1.0).contains(v)) {
                return fail(format!("crop fractions of the {camera} camera must be in [0, 1)"));
            }
        }

        if !(self.compositor.epsilon > 0.0) {
            return fail("compositor epsilon must be positive".to_string());
        }

        if !(self.projection.focal_fraction > 0.0) {
            return fail("focal fraction must be positive".to_string());
        }

        let ground = &self.projection.ground_plane;
        for c in [&ground.longitudinal, &ground.lateral] {
            if !(c.perspective < 1.0) {
                return fail(format!(
                    "ground plane perspective must be below 1, got {}",
                    c.perspective
                ));
            }
        }

        let canvases = [
            ("grid", self.grid.canvas_size()),
            ("radial", self.radial.canvas),
            ("panorama", self.panorama.canvas),
        ];
        for (name, size) in canvases {
            if size.width == 0 || size.height == 0 {
                return fail(format!("the {name} canvas is empty"));
            }
        }

        if !(self.panorama.outer_radius > self.panorama.inner_radius) {
            return fail("panorama outer radius must exceed the inner radius".to_string());
        }

        Ok(())
    }
}
