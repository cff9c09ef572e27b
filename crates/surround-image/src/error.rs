/// An error type for the image module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// Error when channel and shape are not valid.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when the image size is not valid.
    #[error("Invalid image size ({0}, {1}) does not match ({2}, {3})")]
    InvalidImageSize(usize, usize, usize, usize),

    /// Error when the pixel coordinates are out of bounds.
    #[error("Pixel coordinates ({0}, {1}) are out of bounds ({2}, {3})")]
    PixelIndexOutOfBounds(usize, usize, usize, usize),

    /// Error when the channel index is out of bounds.
    #[error("Channel index ({0}) is out of bounds ({1})")]
    ChannelIndexOutOfBounds(usize, usize),

    /// Error when a pixel value cannot be cast to the target type.
    #[error("Failed to cast image data")]
    CastError,

    /// Error when the transformation matrix cannot be inverted.
    #[error("Cannot compute the determinant of the transformation matrix")]
    CannotComputeDeterminant,

    /// Error when a linear system has no unique solution.
    #[error("The linear system is singular")]
    SingularSystem,

    /// Error when a parameter of an operation is out of its valid range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error when an operation requires a non-empty image.
    #[error("The image is empty")]
    EmptyImage,
}
