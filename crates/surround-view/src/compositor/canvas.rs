use rayon::prelude::*;

use super::CompositorConfig;
use crate::frame::{Frame, WeightMask};
use surround_image::{Image, ImageDtype, ImageError, ImageSize};
use surround_imgproc::parallel::par_iter_rows_indexed;

/// A frame placed on the canvas with its blending mask.
#[derive(Debug, Clone)]
pub struct Layer {
    /// the pixels
    pub frame: Frame,
    /// the per pixel weight, same size as the frame
    pub mask: WeightMask,
    /// position of the top-left corner on the canvas, may be negative
    pub offset: (i64, i64),
}

/// Running sums of `colour * weight` and of `weight` over a canvas.
#[derive(Debug, Clone)]
pub struct Accumulator {
    color: Image<f32, 3>,
    weight: Image<f32, 1>,
}

/// Span of `len` pixels starting at `offset`, clipped to `[0, limit)`.
///
/// Returns `(canvas_start, source_start, len)`.
fn clip_span(offset: i64, len: usize, limit: usize) -> Option<(usize, usize, usize)> {
    let start = offset.max(0);
    let end = (offset + len as i64).min(limit as i64);
    if start >= end {
        return None;
    }
    Some((start as usize, (start - offset) as usize, (end - start) as usize))
}

impl Accumulator {
    /// Create an empty accumulator.
    pub fn new(size: ImageSize) -> Result<Self, ImageError> {
        Ok(Self {
            color: Image::from_size_val(size, 0.0)?,
            weight: Image::from_size_val(size, 0.0)?,
        })
    }

    /// Size of the canvas.
    pub fn size(&self) -> ImageSize {
        self.weight.size()
    }

    /// The accumulated weight of every pixel.
    pub fn weight(&self) -> &Image<f32, 1> {
        &self.weight
    }

    /// Add a layer, clipped to the canvas.
    ///
    /// Returns `false` if the layer lies completely outside the canvas.
    pub fn add_layer(&mut self, layer: &Layer) -> Result<bool, ImageError> {
        let (frame, mask) = (&layer.frame, &layer.mask);
        if frame.size() != mask.size() {
            return Err(ImageError::InvalidImageSize(
                frame.cols(),
                frame.rows(),
                mask.cols(),
                mask.rows(),
            ));
        }

        let size = self.size();
        let (Some((cx, sx, w)), Some((cy, sy, h))) = (
            clip_span(layer.offset.0, frame.cols(), size.width),
            clip_span(layer.offset.1, frame.rows(), size.height),
        ) else {
            log::debug!("layer at {:?} is outside the canvas", layer.offset);
            return Ok(false);
        };

        let src = frame.cast_and_scale::<f32>(1.0)?;
        let (src_cols, canvas_cols) = (frame.cols(), size.width);
        let (src_data, mask_data) = (src.as_slice(), mask.as_slice());

        self.color
            .as_slice_mut()
            .par_chunks_exact_mut(canvas_cols * 3)
            .zip(self.weight.as_slice_mut().par_chunks_exact_mut(canvas_cols))
            .skip(cy)
            .take(h)
            .enumerate()
            .for_each(|(i, (color_row, weight_row))| {
                let src_row = (sy + i) * src_cols + sx;
                for j in 0..w {
                    let wgt = mask_data[src_row + j];
                    if wgt <= 0.0 {
                        continue;
                    }
                    let pixel = &src_data[(src_row + j) * 3..(src_row + j) * 3 + 3];
                    let acc = &mut color_row[(cx + j) * 3..(cx + j) * 3 + 3];
                    for (a, p) in acc.iter_mut().zip(pixel) {
                        *a += p * wgt;
                    }
                    weight_row[cx + j] += wgt;
                }
            });

        Ok(true)
    }

    /// Accumulate a contribution computed independently for every canvas pixel.
    ///
    /// `f(x, y)` returns the colour and the weight of the contribution at
    /// that pixel, if any.
    pub fn accumulate_with(
        &mut self,
        f: impl Fn(usize, usize) -> Option<([f32; 3], f32)> + Send + Sync,
    ) {
        let cols = self.size().width;
        if cols == 0 {
            return;
        }

        self.color
            .as_slice_mut()
            .par_chunks_exact_mut(cols * 3)
            .zip(self.weight.as_slice_mut().par_chunks_exact_mut(cols))
            .enumerate()
            .for_each(|(y, (color_row, weight_row))| {
                for x in 0..cols {
                    if let Some((color, wgt)) = f(x, y) {
                        for (a, c) in color_row[x * 3..x * 3 + 3].iter_mut().zip(color) {
                            *a += c * wgt;
                        }
                        weight_row[x] += wgt;
                    }
                }
            });
    }

    /// Normalize the accumulated colour and fill the gaps.
    ///
    /// Pixels with a weight above `config.epsilon` are divided by their
    /// weight. Every other pixel takes the value of the first covered pixel,
    /// in row-major order, on the nearest Chebyshev ring around it that holds
    /// one, up to `config.gap_fill_radius`. That pixel is not always the
    /// euclidean nearest. Only covered pixels are used as
    /// sources, so the result does not depend on the scan order of the gaps.
    /// Gaps with no covered neighbour get `config.gap_color`.
    pub fn resolve(&self, config: &CompositorConfig) -> Result<Frame, ImageError> {
        let size = self.size();
        let eps = config.epsilon;
        let (color, weight) = (self.color.as_slice(), self.weight.as_slice());
        let covered = |x: usize, y: usize| weight[y * size.width + x] > eps;

        let mut normalized = Frame::from_size_val(size, 0)?;
        par_iter_rows_indexed(&mut normalized, |x, y, pixel| {
            let idx = y * size.width + x;
            if covered(x, y) {
                for (c, p) in pixel.iter_mut().enumerate() {
                    *p = u8::from_f32(color[idx * 3 + c] / weight[idx]);
                }
            }
        });

        let radius = config.gap_fill_radius as i64;
        let (w, h) = (size.width as i64, size.height as i64);
        let source = normalized.as_slice();

        let mut filled = normalized.clone();
        par_iter_rows_indexed(&mut filled, |x, y, pixel| {
            if covered(x, y) {
                return;
            }
            let (x, y) = (x as i64, y as i64);
            for r in 1..=radius {
                for dy in -r..=r {
                    for dx in -r..=r {
                        if dx.abs() != r && dy.abs() != r {
                            continue;
                        }
                        let (nx, ny) = (x + dx, y + dy);
                        if nx < 0 || ny < 0 || nx >= w || ny >= h {
                            continue;
                        }
                        if covered(nx as usize, ny as usize) {
                            let idx = (ny * w + nx) as usize * 3;
                            pixel.copy_from_slice(&source[idx..idx + 3]);
                            return;
                        }
                    }
                }
            }
            pixel.copy_from_slice(&config.gap_color);
        });

        Ok(filled)
    }
}

/// Blend layers onto a canvas of the given size.
///
/// Layers are accumulated in order; each is clipped to the canvas and a
/// layer completely outside of it is skipped.
pub fn compose(
    layers: &[Layer],
    canvas_size: ImageSize,
    config: &CompositorConfig,
) -> Result<Frame, ImageError> {
    let mut acc = Accumulator::new(canvas_size)?;
    for layer in layers {
        acc.add_layer(layer)?;
    }
    acc.resolve(config)
}
