//! Per camera calibration, loaded once at start-up and then shared read-only.
//!
//! Intrinsics come from an OpenCV `FileStorage` document (`camera_intrinsics.yml`)
//! or a JSON document (`camera_intrinsics.json`), extrinsics from a CSV table
//! (`camera_extrinsics.csv`). Both are searched in a short ordered list of
//! directories, the first file that can be read wins.

mod extrinsics;
mod intrinsics;

use std::path::{Path, PathBuf};

pub use extrinsics::{parse_extrinsics, Extrinsics};
pub use intrinsics::{parse_intrinsics, parse_intrinsics_yaml, Intrinsics};

use crate::camera::{CameraId, PerCamera};
use crate::error::SurroundError;

/// File name of the intrinsics document in OpenCV YAML.
pub const INTRINSICS_YAML_FILE: &str = "camera_intrinsics.yml";

/// File name of the intrinsics document in JSON.
pub const INTRINSICS_FILE: &str = "camera_intrinsics.json";

/// File name of the extrinsics table.
pub const EXTRINSICS_FILE: &str = "camera_extrinsics.csv";

/// Calibration of the four cameras.
///
/// Lookups never fail: a camera without extrinsics reports the identity pose
/// and callers that need to tell the difference use [`CalibrationStore::has_extrinsics`].
///
/// # Example
///
/// ```
/// use surround_view::{CalibrationStore, CameraId, Intrinsics};
///
/// let mut store = CalibrationStore::default();
/// assert!(!store.has_intrinsics(CameraId::Front));
///
/// store.set_intrinsics(CameraId::Front, Intrinsics::pinhole(400.0, 400.0, 320.0, 240.0));
/// assert!(store.has_intrinsics(CameraId::Front));
/// assert_eq!(store.camera_position(CameraId::Front), [0.0, 0.0, 0.0]);
/// ```
#[derive(Debug, Clone)]
pub struct CalibrationStore {
    search_dirs: Vec<PathBuf>,
    intrinsics: PerCamera<Option<Intrinsics>>,
    extrinsics: PerCamera<Option<Extrinsics>>,
}

impl Default for CalibrationStore {
    fn default() -> Self {
        Self::with_search_dirs([".", "..", "../.."])
    }
}

impl CalibrationStore {
    /// Create an empty store that looks for calibration files in `dirs`, in order.
    pub fn with_search_dirs<P: AsRef<Path>>(dirs: impl IntoIterator<Item = P>) -> Self {
        Self {
            search_dirs: dirs.into_iter().map(|d| d.as_ref().to_path_buf()).collect(),
            intrinsics: PerCamera::default(),
            extrinsics: PerCamera::default(),
        }
    }

    /// The directories searched for calibration files.
    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// Read the first file found, trying every name in each directory in turn.
    fn read_first(&self, file_names: &[&str]) -> Result<(PathBuf, String), SurroundError> {
        for dir in &self.search_dirs {
            for file_name in file_names {
                let path = dir.join(file_name);
                match std::fs::read_to_string(&path) {
                    Ok(text) => return Ok((path, text)),
                    Err(e) => log::debug!("cannot read {}: {}", path.display(), e),
                }
            }
        }
        Err(SurroundError::CalibrationNotFound(file_names.join(" or ")))
    }

    /// Load the intrinsics of `camera`, reporting why it failed.
    ///
    /// Nothing is stored on failure.
    pub fn try_load_intrinsics(&mut self, camera: CameraId) -> Result<(), SurroundError> {
        let (path, text) = self.read_first(&[INTRINSICS_YAML_FILE, INTRINSICS_FILE])?;
        let intrinsics = match path.extension().and_then(|e| e.to_str()) {
            Some("yml") => parse_intrinsics_yaml(&text, camera)?,
            _ => parse_intrinsics(&text, camera)?,
        };
        log::info!(
            "loaded intrinsics of the {} camera from {} (xi = {})",
            camera,
            path.display(),
            intrinsics.xi
        );
        self.intrinsics[camera] = Some(intrinsics);
        Ok(())
    }

    /// Load the intrinsics of `camera`.
    ///
    /// Returns `false` if no file could be read or parsed, in which case the
    /// camera stays uncalibrated.
    pub fn load_intrinsics(&mut self, camera: CameraId) -> bool {
        match self.try_load_intrinsics(camera) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("no intrinsics for the {camera} camera: {e}");
                false
            }
        }
    }

    /// Load the intrinsics of every camera, returning how many succeeded.
    pub fn load_all_intrinsics(&mut self) -> usize {
        CameraId::ALL
            .into_iter()
            .filter(|&camera| self.load_intrinsics(camera))
            .count()
    }

    /// Load the extrinsics table, reporting why it failed.
    ///
    /// The table is parsed completely before anything is stored.
    pub fn try_load_extrinsics(&mut self) -> Result<usize, SurroundError> {
        let (path, text) = self.read_first(&[EXTRINSICS_FILE])?;
        let rows = parse_extrinsics(&text)?;
        for (camera, extrinsics) in &rows {
            self.extrinsics[*camera] = Some(*extrinsics);
        }
        log::info!("loaded {} extrinsics rows from {}", rows.len(), path.display());
        Ok(rows.len())
    }

    /// Load the extrinsics table.
    ///
    /// Returns `false` if no file could be read or any row is malformed.
    pub fn load_extrinsics(&mut self) -> bool {
        match self.try_load_extrinsics() {
            Ok(_) => true,
            Err(e) => {
                log::warn!("no extrinsics loaded: {e}");
                false
            }
        }
    }

    /// Set the intrinsics of a camera.
    pub fn set_intrinsics(&mut self, camera: CameraId, intrinsics: Intrinsics) {
        self.intrinsics[camera] = Some(intrinsics);
    }

    /// Set the extrinsics of a camera.
    pub fn set_extrinsics(&mut self, camera: CameraId, extrinsics: Extrinsics) {
        self.extrinsics[camera] = Some(extrinsics);
    }

    /// The intrinsics of a camera, if calibrated.
    pub fn intrinsics(&self, camera: CameraId) -> Option<&Intrinsics> {
        self.intrinsics[camera].as_ref()
    }

    /// The extrinsics of a camera, the identity pose if absent.
    pub fn extrinsics(&self, camera: CameraId) -> Extrinsics {
        self.extrinsics[camera].unwrap_or_default()
    }

    /// The 4x4 transform of a camera, the identity if absent.
    pub fn extrinsic_matrix(&self, camera: CameraId) -> [[f64; 4]; 4] {
        self.extrinsics(camera).matrix()
    }

    /// The position of a camera, the origin if absent.
    pub fn camera_position(&self, camera: CameraId) -> [f64; 3] {
        self.extrinsics(camera).position
    }

    /// The `(pitch, yaw, roll)` of a camera in degrees, zero if absent.
    pub fn camera_rotation(&self, camera: CameraId) -> [f64; 3] {
        self.extrinsics(camera).rotation
    }

    /// Whether intrinsics are set for a camera.
    pub fn has_intrinsics(&self, camera: CameraId) -> bool {
        self.intrinsics[camera].is_some()
    }

    /// Whether extrinsics are set for a camera.
    pub fn has_extrinsics(&self, camera: CameraId) -> bool {
        self.extrinsics[camera].is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SHARED: &str = r#"{"K": [[300, 0, 320], [0, 300, 240], [0, 0, 1]], "D": [0.01, 0, 0, 0], "xi": 1.1}"#;

    #[test]
    fn load_from_second_directory() -> Result<(), Box<dyn std::error::Error>> {
        let first = tempfile::tempdir()?;
        let second = tempfile::tempdir()?;
        fs::write(second.path().join(INTRINSICS_FILE), SHARED)?;

        let mut store = CalibrationStore::with_search_dirs([first.path(), second.path()]);
        assert!(store.load_intrinsics(CameraId::Left));
        assert!(store.has_intrinsics(CameraId::Left));
        assert!(!store.has_intrinsics(CameraId::Right));
        assert_eq!(store.intrinsics(CameraId::Left).map(|i| i.xi), Some(1.1));

        assert_eq!(store.load_all_intrinsics(), 4);
        Ok(())
    }

    #[test]
    fn first_readable_file_wins() -> Result<(), Box<dyn std::error::Error>> {
        let first = tempfile::tempdir()?;
        let second = tempfile::tempdir()?;
        fs::write(first.path().join(INTRINSICS_FILE), "{ broken")?;
        fs::write(second.path().join(INTRINSICS_FILE), SHARED)?;

        let mut store = CalibrationStore::with_search_dirs([first.path(), second.path()]);
        assert!(!store.load_intrinsics(CameraId::Front));
        assert!(store.intrinsics(CameraId::Front).is_none());
        Ok(())
    }

    #[test]
    fn load_opencv_yaml() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let yaml = "%YAML:1.0\n---\nK: !!opencv-matrix\n   rows: 3\n   cols: 3\n   dt: d\n   data: [ 250., 0., 320., 0., 250., 240., 0., 0., 1. ]\nD: !!opencv-matrix\n   rows: 4\n   cols: 1\n   dt: d\n   data: [ 0.02, 0., 0., 0. ]\n";
        fs::write(dir.path().join(INTRINSICS_YAML_FILE), yaml)?;

        let mut store = CalibrationStore::with_search_dirs([dir.path()]);
        assert!(store.load_intrinsics(CameraId::Front));
        let front = store.intrinsics(CameraId::Front).copied();
        assert_eq!(front.map(|i| i.focal()), Some((250.0, 250.0)));
        assert_eq!(front.map(|i| i.xi), Some(0.0));

        // the yml document takes precedence over the json one in the same directory
        fs::write(dir.path().join(INTRINSICS_FILE), SHARED)?;
        fs::write(
            dir.path().join(INTRINSICS_YAML_FILE),
            format!("{yaml}xi: 0.9\n"),
        )?;
        assert!(store.load_intrinsics(CameraId::Back));
        assert_eq!(store.intrinsics(CameraId::Back).map(|i| i.xi), Some(0.9));
        Ok(())
    }

    #[test]
    fn missing_files() {
        let mut store = CalibrationStore::with_search_dirs(["/nonexistent/surround"]);
        assert!(!store.load_intrinsics(CameraId::Front));
        assert!(!store.load_extrinsics());
        assert!(matches!(
            store.try_load_extrinsics(),
            Err(SurroundError::CalibrationNotFound(_))
        ));
        assert_eq!(store.camera_rotation(CameraId::Back), [0.0; 3]);
        assert_eq!(store.extrinsic_matrix(CameraId::Back)[3], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn extrinsics_all_or_nothing() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(EXTRINSICS_FILE);

        fs::write(
            &path,
            "camera,x,y,z,pitch,yaw,roll\nfront,1,0,0,0,0,0\nback,x,0,0,0,0,0\n",
        )?;
        let mut store = CalibrationStore::with_search_dirs([dir.path()]);
        assert!(!store.load_extrinsics());
        assert!(!store.has_extrinsics(CameraId::Front));

        fs::write(
            &path,
            "camera,x,y,z,pitch,yaw,roll\nfront,1,0,0,0,0,0\nback,-1,0,0,0,180,0\n",
        )?;
        assert!(store.load_extrinsics());
        assert_eq!(store.camera_position(CameraId::Front), [1.0, 0.0, 0.0]);
        assert_eq!(store.camera_rotation(CameraId::Back), [0.0, 180.0, 0.0]);
        assert!(!store.has_extrinsics(CameraId::Left));
        Ok(())
    }
}
