use super::CompositorConfig;
use crate::camera::CameraId;
use crate::frame::WeightMask;
use surround_image::{ImageError, ImageSize};
use surround_imgproc::parallel::par_iter_rows_indexed;

/// Which edges of a mask fade out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Edges {
    /// top edge
    pub top: bool,
    /// bottom edge
    pub bottom: bool,
    /// left edge
    pub left: bool,
    /// right edge
    pub right: bool,
}

/// The edges of a camera tile that face a neighbouring camera, in canvas
/// orientation.
///
/// The outward edge of each tile keeps full weight.
pub fn fade_edges(camera: CameraId) -> Edges {
    match camera {
        CameraId::Front => Edges {
            top: false,
            bottom: true,
            left: true,
            right: true,
        },
        CameraId::Back => Edges {
            top: true,
            bottom: false,
            left: true,
            right: true,
        },
        CameraId::Left => Edges {
            top: true,
            bottom: true,
            left: false,
            right: true,
        },
        CameraId::Right => Edges {
            top: true,
            bottom: true,
            left: true,
            right: false,
        },
    }
}

/// Build the feathered weight mask of a camera tile.
///
/// The weight is 1.0 in the interior and falls to 0.0 on the edges returned
/// by [`fade_edges`], over a band of `config.feather_width` pixels.
///
/// # Example
///
/// ```
/// use surround_view::compositor::{build_mask, CompositorConfig};
/// use surround_view::CameraId;
///
/// let config = CompositorConfig { feather_width: 4, ..Default::default() };
/// let mask = build_mask([10, 10].into(), CameraId::Front, &config).unwrap();
///
/// // the top edge of the front camera keeps full weight
/// assert_eq!(mask.as_slice()[5], 1.0);
/// // the bottom edge fades out
/// assert_eq!(mask.as_slice()[9 * 10 + 5], 0.0);
/// ```
pub fn build_mask(
    size: ImageSize,
    camera: CameraId,
    config: &CompositorConfig,
) -> Result<WeightMask, ImageError> {
    let mut mask = WeightMask::from_size_val(size, 1.0)?;
    let feather = config.feather_width as f32;
    if feather <= 0.0 {
        return Ok(mask);
    }

    let edges = fade_edges(camera);
    let (w, h) = (size.width, size.height);

    par_iter_rows_indexed(&mut mask, |x, y, pixel| {
        let distances = [
            (edges.top, y),
            (edges.bottom, h - 1 - y),
            (edges.left, x),
            (edges.right, w - 1 - x),
        ];

        let d = distances
            .iter()
            .filter(|(faded, _)| *faded)
            .map(|(_, d)| *d)
            .min();

        if let Some(d) = d {
            pixel[0] = config.falloff.weight(d as f32 / feather);
        }
    });

    Ok(mask)
}
