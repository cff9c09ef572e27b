use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the four cameras mounted around the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraId {
    /// looking ahead
    Front,
    /// mounted on the left mirror
    Left,
    /// mounted on the right mirror
    Right,
    /// looking behind
    Back,
}

impl CameraId {
    /// All cameras in processing order.
    pub const ALL: [CameraId; 4] = [
        CameraId::Front,
        CameraId::Left,
        CameraId::Right,
        CameraId::Back,
    ];

    /// Lowercase name, as used in the calibration files.
    pub fn name(&self) -> &'static str {
        match self {
            CameraId::Front => "front",
            CameraId::Left => "left",
            CameraId::Right => "right",
            CameraId::Back => "back",
        }
    }

    /// Position of the camera in [`CameraId::ALL`].
    pub fn index(&self) -> usize {
        match self {
            CameraId::Front => 0,
            CameraId::Left => 1,
            CameraId::Right => 2,
            CameraId::Back => 3,
        }
    }

    /// Whether the camera looks sideways.
    pub fn is_side(&self) -> bool {
        matches!(self, CameraId::Left | CameraId::Right)
    }

    /// Direction the camera faces, in degrees clockwise from the vehicle heading.
    pub fn heading_deg(&self) -> f32 {
        match self {
            CameraId::Front => 0.0,
            CameraId::Right => 90.0,
            CameraId::Back => 180.0,
            CameraId::Left => 270.0,
        }
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown camera name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown camera name: {0}")]
pub struct UnknownCamera(pub String);

impl FromStr for CameraId {
    type Err = UnknownCamera;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "front" => Ok(CameraId::Front),
            "left" => Ok(CameraId::Left),
            "right" => Ok(CameraId::Right),
            "back" => Ok(CameraId::Back),
            other => Err(UnknownCamera(other.to_string())),
        }
    }
}

/// A fixed table holding one value per camera.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerCamera<T> {
    /// value for the front camera
    pub front: T,
    /// value for the left camera
    pub left: T,
    /// value for the right camera
    pub right: T,
    /// value for the back camera
    pub back: T,
}

impl<T> PerCamera<T> {
    /// Build a table by evaluating `f` for each camera, in [`CameraId::ALL`] order.
    pub fn from_fn(mut f: impl FnMut(CameraId) -> T) -> Self {
        Self {
            front: f(CameraId::Front),
            left: f(CameraId::Left),
            right: f(CameraId::Right),
            back: f(CameraId::Back),
        }
    }

    /// Iterate over `(camera, value)` pairs in [`CameraId::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (CameraId, &T)> {
        CameraId::ALL.into_iter().map(move |id| (id, &self[id]))
    }

    /// Apply `f` to every value.
    pub fn map<U>(self, mut f: impl FnMut(CameraId, T) -> U) -> PerCamera<U> {
        PerCamera {
            front: f(CameraId::Front, self.front),
            left: f(CameraId::Left, self.left),
            right: f(CameraId::Right, self.right),
            back: f(CameraId::Back, self.back),
        }
    }

    /// Borrow every value.
    pub fn as_ref(&self) -> PerCamera<&T> {
        PerCamera {
            front: &self.front,
            left: &self.left,
            right: &self.right,
            back: &self.back,
        }
    }
}

impl<T> Index<CameraId> for PerCamera<T> {
    type Output = T;

    fn index(&self, id: CameraId) -> &T {
        match id {
            CameraId::Front => &self.front,
            CameraId::Left => &self.left,
            CameraId::Right => &self.right,
            CameraId::Back => &self.back,
        }
    }
}

impl<T> IndexMut<CameraId> for PerCamera<T> {
    fn index_mut(&mut self, id: CameraId) -> &mut T {
        match id {
            CameraId::Front => &mut self.front,
            CameraId::Left => &mut self.left,
            CameraId::Right => &mut self.right,
            CameraId::Back => &mut self.back,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_print() -> Result<(), UnknownCamera> {
        for id in CameraId::ALL {
            assert_eq!(id.name().parse::<CameraId>()?, id);
            assert_eq!(id.to_string(), id.name());
        }
        assert!("rear".parse::<CameraId>().is_err());
        Ok(())
    }

    #[test]
    fn index_matches_order() {
        for (i, id) in CameraId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn per_camera_table() {
        let mut table = PerCamera::from_fn(|id| id.index() * 10);
        table[CameraId::Back] += 1;
        assert_eq!(table[CameraId::Left], 10);
        assert_eq!(table[CameraId::Back], 31);

        let names: Vec<_> = table.iter().map(|(id, _)| id.name()).collect();
        assert_eq!(names, ["front", "left", "right", "back"]);

        let doubled = table.map(|_, v| v * 2);
        assert_eq!(doubled.right, 40);
    }
}
