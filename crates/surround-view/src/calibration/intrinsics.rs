use std::collections::HashMap;

use serde::Deserialize;

use crate::camera::CameraId;
use crate::error::SurroundError;

/// Intrinsic calibration of a fisheye camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intrinsics {
    /// row-major 3x3 camera matrix
    pub k: [[f64; 3]; 3],
    /// four distortion coefficients
    pub d: [f64; 4],
    /// omnidirectional strength, 0.0 for a rectilinear lens
    pub xi: f64,
}

impl Intrinsics {
    /// Build the intrinsics of an ideal pinhole camera with no distortion.
    pub fn pinhole(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self {
            k: [[fx, 0.0, cx], [0.0, fy, cy], [0.0, 0.0, 1.0]],
            d: [0.0; 4],
            xi: 0.0,
        }
    }

    /// Focal lengths `(fx, fy)`.
    pub fn focal(&self) -> (f64, f64) {
        (self.k[0][0], self.k[1][1])
    }

    /// Principal point `(cx, cy)`.
    pub fn principal_point(&self) -> (f64, f64) {
        (self.k[0][2], self.k[1][2])
    }

    fn validate(self) -> Result<Self, SurroundError> {
        let (fx, fy) = self.focal();
        if !(fx.is_finite() && fy.is_finite() && fx > 0.0 && fy > 0.0) {
            return Err(SurroundError::InvalidIntrinsics(format!(
                "focal lengths must be positive, got fx={fx} fy={fy}"
            )));
        }
        if !self.k.iter().flatten().chain(&self.d).all(|v| v.is_finite()) || !self.xi.is_finite()
        {
            return Err(SurroundError::InvalidIntrinsics(
                "non finite calibration value".to_string(),
            ));
        }
        Ok(self)
    }
}

/// A matrix as written by OpenCV `FileStorage`.
#[derive(Deserialize)]
struct OpenCvMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MatrixRepr {
    OpenCv(OpenCvMatrix),
    Nested(Vec<Vec<f64>>),
    Flat(Vec<f64>),
}

impl MatrixRepr {
    fn into_values(self, name: &str) -> Result<Vec<f64>, SurroundError> {
        match self {
            MatrixRepr::OpenCv(m) => {
                if m.rows * m.cols != m.data.len() {
                    return Err(SurroundError::InvalidIntrinsics(format!(
                        "{name} is declared {}x{} but holds {} values",
                        m.rows,
                        m.cols,
                        m.data.len()
                    )));
                }
                Ok(m.data)
            }
            MatrixRepr::Nested(rows) => Ok(rows.into_iter().flatten().collect()),
            MatrixRepr::Flat(values) => Ok(values),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum XiRepr {
    Scalar(f64),
    Matrix(MatrixRepr),
}

#[derive(Deserialize)]
struct IntrinsicsEntry {
    #[serde(rename = "K")]
    k: MatrixRepr,
    #[serde(rename = "D")]
    d: MatrixRepr,
    xi: Option<XiRepr>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntrinsicsDocument {
    Shared(IntrinsicsEntry),
    PerCamera(HashMap<String, IntrinsicsEntry>),
}

impl IntrinsicsDocument {
    fn into_intrinsics(self, camera: CameraId) -> Result<Intrinsics, SurroundError> {
        match self {
            IntrinsicsDocument::Shared(entry) => entry.try_into(),
            IntrinsicsDocument::PerCamera(mut entries) => entries
                .remove(camera.name())
                .ok_or_else(|| {
                    SurroundError::InvalidIntrinsics(format!("no entry for the {camera} camera"))
                })?
                .try_into(),
        }
    }
}

impl TryFrom<IntrinsicsEntry> for Intrinsics {
    type Error = SurroundError;

    fn try_from(entry: IntrinsicsEntry) -> Result<Self, Self::Error> {
        let flat = entry.k.into_values("K")?;
        if flat.len() != 9 {
            return Err(SurroundError::InvalidIntrinsics(format!(
                "K must have 9 values, got {}",
                flat.len()
            )));
        }

        let d = entry.d.into_values("D")?;
        let d: [f64; 4] = d.as_slice().try_into().map_err(|_| {
            SurroundError::InvalidIntrinsics(format!(
                "D must have 4 coefficients, got {}",
                d.len()
            ))
        })?;

        let xi = match entry.xi {
            None => 0.0,
            Some(XiRepr::Scalar(xi)) => xi,
            Some(XiRepr::Matrix(m)) => m.into_values("xi")?.first().copied().unwrap_or(0.0),
        };

        let mut k = [[0.0; 3]; 3];
        for (i, v) in flat.into_iter().enumerate() {
            k[i / 3][i % 3] = v;
        }

        Intrinsics { k, d, xi }.validate()
    }
}

/// Parse the intrinsics of `camera` from a JSON document.
///
/// The document holds either one block shared by every camera:
///
/// ```json
/// { "K": [[fx, 0, cx], [0, fy, cy], [0, 0, 1]], "D": [k1, k2, k3, k4], "xi": 0.8 }
/// ```
///
/// or one such block per camera name (`"front"`, `"left"`, `"right"`, `"back"`).
/// `K` may also be given as nine flat values and `xi` as a one element array.
/// A missing `xi` defaults to `0.0`.
pub fn parse_intrinsics(json: &str, camera: CameraId) -> Result<Intrinsics, SurroundError> {
    serde_json::from_str::<IntrinsicsDocument>(json)?.into_intrinsics(camera)
}

/// Parse the intrinsics of `camera` from an OpenCV `FileStorage` YAML document.
///
/// Matrices are `!!opencv-matrix` blocks with `rows`, `cols`, `dt` and `data`:
///
/// ```yaml
/// %YAML:1.0
/// ---
/// K: !!opencv-matrix
///    rows: 3
///    cols: 3
///    dt: d
///    data: [ 300., 0., 320., 0., 300., 240., 0., 0., 1. ]
/// D: !!opencv-matrix
///    rows: 4
///    cols: 1
///    dt: d
///    data: [ 0.1, 0.01, 0., 0. ]
/// xi: 1.2
/// ```
///
/// The same shapes as [`parse_intrinsics`] are accepted otherwise, including
/// one block per camera name. A missing `xi` defaults to `0.0`.
pub fn parse_intrinsics_yaml(yaml: &str, camera: CameraId) -> Result<Intrinsics, SurroundError> {
    // the directive is YAML 1.0 syntax and the matrix tag is OpenCV specific
    let text: String = yaml
        .lines()
        .filter(|line| !line.trim_start().starts_with('%'))
        .map(|line| line.replace("!!opencv-matrix", ""))
        .collect::<Vec<_>>()
        .join("\n");
    serde_yaml::from_str::<IntrinsicsDocument>(&text)?.into_intrinsics(camera)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_document() -> Result<(), SurroundError> {
        let json = r#"{"K": [[300, 0, 320], [0, 310, 240], [0, 0, 1]], "D": [0.1, 0.2, 0.3, 0.4], "xi": [1.2]}"#;
        for camera in CameraId::ALL {
            let intrinsics = parse_intrinsics(json, camera)?;
            assert_eq!(intrinsics.focal(), (300.0, 310.0));
            assert_eq!(intrinsics.principal_point(), (320.0, 240.0));
            assert_eq!(intrinsics.d, [0.1, 0.2, 0.3, 0.4]);
            assert_eq!(intrinsics.xi, 1.2);
        }
        Ok(())
    }

    #[test]
    fn per_camera_document() -> Result<(), SurroundError> {
        let json = r#"{
            "front": {"K": [100, 0, 50, 0, 100, 50, 0, 0, 1], "D": [0, 0, 0, 0], "xi": 0.9},
            "back": {"K": [200, 0, 50, 0, 200, 50, 0, 0, 1], "D": [0, 0, 0, 0]}
        }"#;
        assert_eq!(parse_intrinsics(json, CameraId::Front)?.xi, 0.9);
        let back = parse_intrinsics(json, CameraId::Back)?;
        assert_eq!(back.focal(), (200.0, 200.0));
        assert_eq!(back.xi, 0.0);
        assert!(matches!(
            parse_intrinsics(json, CameraId::Left),
            Err(SurroundError::InvalidIntrinsics(_))
        ));
        Ok(())
    }

    #[test]
    fn missing_xi_defaults_to_zero() -> Result<(), SurroundError> {
        let json = r#"{"K": [[1, 0, 0], [0, 1, 0], [0, 0, 1]], "D": [0, 0, 0, 0]}"#;
        assert_eq!(parse_intrinsics(json, CameraId::Right)?.xi, 0.0);
        Ok(())
    }

    #[test]
    fn rejects_malformed_documents() {
        let wrong_d = r#"{"K": [[1, 0, 0], [0, 1, 0], [0, 0, 1]], "D": [0, 0, 0]}"#;
        assert!(matches!(
            parse_intrinsics(wrong_d, CameraId::Front),
            Err(SurroundError::InvalidIntrinsics(_))
        ));

        let wrong_k = r#"{"K": [[1, 0], [0, 1]], "D": [0, 0, 0, 0]}"#;
        assert!(parse_intrinsics(wrong_k, CameraId::Front).is_err());

        let zero_focal = r#"{"K": [[0, 0, 0], [0, 1, 0], [0, 0, 1]], "D": [0, 0, 0, 0]}"#;
        assert!(parse_intrinsics(zero_focal, CameraId::Front).is_err());

        assert!(matches!(
            parse_intrinsics("not json", CameraId::Front),
            Err(SurroundError::IntrinsicsParse(_))
        ));
    }

    const OPENCV_YAML: &str = "%YAML:1.0
---
K: !!opencv-matrix
   rows: 3
   cols: 3
   dt: d
   data: [ 300., 0., 320., 0., 310., 240., 0., 0., 1. ]
D: !!opencv-matrix
   rows: 1
   cols: 4
   dt: d
   data: [ 1.0e-01, -2.0e-02, 0., 5.0e-04 ]
";

    #[test]
    fn opencv_yaml_document() -> Result<(), SurroundError> {
        let intrinsics = parse_intrinsics_yaml(OPENCV_YAML, CameraId::Left)?;
        assert_eq!(intrinsics.focal(), (300.0, 310.0));
        assert_eq!(intrinsics.principal_point(), (320.0, 240.0));
        assert_eq!(intrinsics.d, [0.1, -0.02, 0.0, 0.0005]);
        assert_eq!(intrinsics.xi, 0.0);

        let with_xi = format!("{OPENCV_YAML}xi: 1.25\n");
        assert_eq!(parse_intrinsics_yaml(&with_xi, CameraId::Left)?.xi, 1.25);

        let xi_matrix = format!(
            "{OPENCV_YAML}xi: !!opencv-matrix\n   rows: 1\n   cols: 1\n   dt: d\n   data: [ 0.8 ]\n"
        );
        assert_eq!(parse_intrinsics_yaml(&xi_matrix, CameraId::Back)?.xi, 0.8);
        Ok(())
    }

    #[test]
    fn opencv_yaml_rejects_bad_matrices() {
        let short = OPENCV_YAML.replace("rows: 3", "rows: 2");
        assert!(matches!(
            parse_intrinsics_yaml(&short, CameraId::Front),
            Err(SurroundError::InvalidIntrinsics(_))
        ));

        assert!(matches!(
            parse_intrinsics_yaml("K: [1, 2\n", CameraId::Front),
            Err(SurroundError::IntrinsicsYaml(_))
        ));
    }
}
