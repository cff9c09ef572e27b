use crate::camera::CameraId;
use crate::error::SurroundError;

/// Pose of a camera relative to the vehicle reference point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Extrinsics {
    /// position `(x, y, z)`
    pub position: [f64; 3],
    /// rotation `(pitch, yaw, roll)` in degrees
    pub rotation: [f64; 3],
}

impl Extrinsics {
    /// The 3x3 rotation `Rz(roll) * Ry(yaw) * Rx(pitch)`.
    pub fn rotation_matrix(&self) -> [[f64; 3]; 3] {
        let [pitch, yaw, roll] = self.rotation.map(f64::to_radians);

        let (sp, cp) = pitch.sin_cos();
        let (sy, cy) = yaw.sin_cos();
        let (sr, cr) = roll.sin_cos();

        let rx = [[1.0, 0.0, 0.0], [0.0, cp, -sp], [0.0, sp, cp]];
        let ry = [[cy, 0.0, sy], [0.0, 1.0, 0.0], [-sy, 0.0, cy]];
        let rz = [[cr, -sr, 0.0], [sr, cr, 0.0], [0.0, 0.0, 1.0]];

        matmul3(&matmul3(&rz, &ry), &rx)
    }

    /// The 4x4 rigid transform with the rotation block and the position in
    /// the last column.
    pub fn matrix(&self) -> [[f64; 4]; 4] {
        let r = self.rotation_matrix();
        let mut m = [[0.0; 4]; 4];
        for i in 0..3 {
            m[i][..3].copy_from_slice(&r[i]);
            m[i][3] = self.position[i];
        }
        m[3][3] = 1.0;
        m
    }
}

fn matmul3(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut c = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            c[i][j] = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    c
}

/// Parse an extrinsics table.
///
/// The first line is a header and is skipped. Each row reads
/// `name,x,y,z,pitch,yaw,roll`. Rows with fewer than seven fields or an
/// unknown camera name are ignored; a field that is not a number fails the
/// whole table.
pub fn parse_extrinsics(text: &str) -> Result<Vec<(CameraId, Extrinsics)>, SurroundError> {
    let mut rows = Vec::new();

    for (i, line) in text.lines().enumerate().skip(1) {
        let line_no = i + 1;
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();

        if fields.len() < 7 {
            if !line.trim().is_empty() {
                log::debug!("skipping extrinsics line {line_no}: expected 7 fields");
            }
            continue;
        }

        let camera = match fields[0].parse::<CameraId>() {
            Ok(camera) => camera,
            Err(e) => {
                log::debug!("skipping extrinsics line {line_no}: {e}");
                continue;
            }
        };

        let mut values = [0.0f64; 6];
        for (value, field) in values.iter_mut().zip(&fields[1..7]) {
            *value = field
                .parse::<f64>()
                .map_err(|e| SurroundError::ExtrinsicsParse {
                    line: line_no,
                    reason: format!("{field:?}: {e}"),
                })?;
        }

        rows.push((
            camera,
            Extrinsics {
                position: [values[0], values[1], values[2]],
                rotation: [values[3], values[4], values[5]],
            },
        ));
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identity_by_default() {
        let m = Extrinsics::default().matrix();
        for (i, row) in m.iter().enumerate() {
            for (j, v) in row.iter().enumerate() {
                assert_eq!(*v, if i == j { 1.0 } else { 0.0 });
            }
        }
    }

    #[test]
    fn yaw_rotation_and_translation() {
        let e = Extrinsics {
            position: [1.0, 2.0, 3.0],
            rotation: [0.0, 90.0, 0.0],
        };
        let m = e.matrix();
        assert_relative_eq!(m[0][0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(m[0][2], 1.0, epsilon = 1e-12);
        assert_relative_eq!(m[2][0], -1.0, epsilon = 1e-12);
        assert_eq!([m[0][3], m[1][3], m[2][3]], [1.0, 2.0, 3.0]);
        assert_eq!(m[3], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn composition_order() {
        // Rz(90) * Rx(90) maps the y axis onto the z axis
        let e = Extrinsics {
            position: [0.0; 3],
            rotation: [90.0, 0.0, 90.0],
        };
        let r = e.rotation_matrix();
        let y_axis = [r[0][1], r[1][1], r[2][1]];
        assert_relative_eq!(y_axis[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(y_axis[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(y_axis[2], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn parse_table() -> Result<(), SurroundError> {
        let text = "camera,x,y,z,pitch,yaw,roll\n\
                    front,2.0,0.0,0.5,-20,0,0\n\
                    roof,0,0,0,0,0,0\n\
                    left,0.5\n\
                    \n\
                    back,-2.0,0.0,0.6,-25,180,0\n";
        let rows = parse_extrinsics(text)?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, CameraId::Front);
        assert_eq!(rows[0].1.position, [2.0, 0.0, 0.5]);
        assert_eq!(rows[1].0, CameraId::Back);
        assert_eq!(rows[1].1.rotation, [-25.0, 180.0, 0.0]);
        Ok(())
    }

    #[test]
    fn malformed_number_fails() {
        let text = "camera,x,y,z,pitch,yaw,roll\nfront,2.0,abc,0.5,0,0,0\n";
        assert!(matches!(
            parse_extrinsics(text),
            Err(SurroundError::ExtrinsicsParse { line: 2, .. })
        ));
    }
}
