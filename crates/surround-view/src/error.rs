use std::path::PathBuf;

use crate::camera::CameraId;
use surround_image::ImageError;

/// An error type for the surround view pipeline.
#[derive(thiserror::Error, Debug)]
pub enum SurroundError {
    /// Error from an image operation.
    #[error("Image operation failed. {0}")]
    Image(#[from] ImageError),

    /// Error to read a file.
    #[error("Failed to read {path}. {source}")]
    Io {
        /// the path of the file
        path: PathBuf,
        /// the underlying error
        #[source]
        source: std::io::Error,
    },

    /// The intrinsics document is not valid JSON or has the wrong shape.
    #[error("Failed to parse the intrinsics. {0}")]
    IntrinsicsParse(#[from] serde_json::Error),

    /// The intrinsics document is not valid YAML or has the wrong shape.
    #[error("Failed to parse the intrinsics. {0}")]
    IntrinsicsYaml(#[from] serde_yaml::Error),

    /// The intrinsics parsed but the values are unusable.
    #[error("Invalid intrinsics: {0}")]
    InvalidIntrinsics(String),

    /// A row of the extrinsics table is malformed.
    #[error("Failed to parse the extrinsics at line {line}: {reason}")]
    ExtrinsicsParse {
        /// one based line number in the file
        line: usize,
        /// what went wrong
        reason: String,
    },

    /// No candidate location holds the calibration file.
    #[error("Calibration file {0} not found")]
    CalibrationNotFound(String),

    /// Error to build the worker pool.
    #[error("Failed to build the worker pool. {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A per camera task panicked.
    #[error("Pipeline of the {0} camera panicked: {1}")]
    TaskPanicked(CameraId, String),

    /// The configuration is not valid.
    #[error("Invalid configuration: {0}")]
    Config(String),
}
