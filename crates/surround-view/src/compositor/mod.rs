//! Blending of the corrected camera frames into one view.
//!
//! Every camera contributes `pixel * weight` to a shared accumulator, where
//! the weight comes from a feathered mask. The accumulated colour is divided
//! by the accumulated weight and the pixels nobody covers take the first
//! covered pixel on the nearest Chebyshev ring around them.

mod angular;
mod canvas;
mod grid;
mod mask;
mod radial;

pub use angular::{compose_panorama, PanoramaLayout};
pub use canvas::{compose, Accumulator, Layer};
pub use grid::{compose_grid, GridLayout};
pub use mask::{build_mask, fade_edges, Edges};
pub use radial::{compose_radial, RadialLayout};

use serde::{Deserialize, Serialize};

/// Shape of the weight falloff inside the feather band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Falloff {
    /// weight grows linearly with the distance to the edge
    #[default]
    Linear,
    /// weight follows `t² (3 - 2t)`
    Smoothstep,
}

impl Falloff {
    /// Weight for a normalized distance `t`, clamped to `[0, 1]`.
    pub fn weight(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Falloff::Linear => t,
            Falloff::Smoothstep => smoothstep(t),
        }
    }
}

pub(crate) fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Blending parameters shared by the compositing modes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorConfig {
    /// width of the feather band in pixels
    pub feather_width: usize,
    /// shape of the falloff
    pub falloff: Falloff,
    /// pixels with a lower accumulated weight are gaps
    pub epsilon: f32,
    /// largest Chebyshev distance searched when filling a gap
    pub gap_fill_radius: usize,
    /// colour of gaps with no covered neighbour, BGR
    pub gap_color: [u8; 3],
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            feather_width: 40,
            falloff: Falloff::Linear,
            epsilon: 0.001,
            gap_fill_radius: 8,
            gap_color: [20, 20, 20],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falloff_shapes() {
        assert_eq!(Falloff::Linear.weight(0.25), 0.25);
        assert_eq!(Falloff::Linear.weight(2.0), 1.0);
        assert_eq!(Falloff::Smoothstep.weight(0.5), 0.5);
        assert!(Falloff::Smoothstep.weight(0.25) < 0.25);
        assert_eq!(Falloff::Smoothstep.weight(-1.0), 0.0);
    }
}
