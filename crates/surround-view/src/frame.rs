use surround_image::{Image, ImageError, ImageSize};
use surround_imgproc::{
    interpolation::InterpolationMode, parallel::par_iter_rows, resize::resize,
};

/// A camera frame, 8 bit with three channels in BGR order.
pub type Frame = Image<u8, 3>;

/// A per pixel blending weight in `[0, 1]`.
pub type WeightMask = Image<f32, 1>;

/// Largest frame size processed without downscaling.
pub const MAX_FRAME_SIZE: ImageSize = ImageSize {
    width: 1920,
    height: 1080,
};

fn map_pixels<const C: usize>(
    src: &Image<u8, C>,
    f: impl Fn(&[u8], &mut [u8]) + Send + Sync,
) -> Result<Frame, ImageError> {
    let mut dst = Frame::from_size_val(src.size(), 0)?;
    par_iter_rows(src, &mut dst, f);
    Ok(dst)
}

/// Swap the blue and red channels, BGR to RGB.
///
/// The same operation also converts RGB back to BGR.
///
/// # Example
///
/// ```
/// use surround_view::frame::{to_rgb, Frame};
///
/// let bgr = Frame::from_size_pixel([2, 1].into(), [255, 0, 10]).unwrap();
/// let rgb = to_rgb(&bgr).unwrap();
///
/// assert_eq!(rgb.as_slice(), &[10, 0, 255, 10, 0, 255]);
/// ```
pub fn to_rgb(frame: &Frame) -> Result<Frame, ImageError> {
    map_pixels(frame, |src, dst| {
        dst[0] = src[2];
        dst[1] = src[1];
        dst[2] = src[0];
    })
}

/// Expand a single channel image to a three channel frame.
pub fn from_gray(gray: &Image<u8, 1>) -> Result<Frame, ImageError> {
    map_pixels(gray, |src, dst| dst.fill(src[0]))
}

/// Drop the alpha channel of a BGRA image.
pub fn from_bgra(bgra: &Image<u8, 4>) -> Result<Frame, ImageError> {
    map_pixels(bgra, |src, dst| dst.copy_from_slice(&src[..3]))
}

/// Size of a frame once fitted inside `max_size`, keeping the aspect ratio.
///
/// Returns `None` when the frame already fits.
pub fn fitted_size(size: ImageSize, max_size: ImageSize) -> Option<ImageSize> {
    if size.width <= max_size.width && size.height <= max_size.height {
        return None;
    }

    let scale = f64::min(
        max_size.width as f64 / size.width as f64,
        max_size.height as f64 / size.height as f64,
    );

    Some(ImageSize {
        width: ((size.width as f64 * scale).round() as usize).max(1),
        height: ((size.height as f64 * scale).round() as usize).max(1),
    })
}

/// Prepare a raw frame for processing.
///
/// Frames larger than [`MAX_FRAME_SIZE`] are downscaled with bilinear
/// interpolation, keeping the aspect ratio. Other frames are returned as a copy.
pub fn preprocess(frame: &Frame) -> Result<Frame, ImageError> {
    match fitted_size(frame.size(), MAX_FRAME_SIZE) {
        Some(new_size) => {
            log::debug!("downscaling frame from {} to {}", frame.size(), new_size);
            resize(frame, new_size, InterpolationMode::Bilinear)
        }
        None => Ok(frame.clone()),
    }
}
