#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use surround_image as image;

#[doc(inline)]
pub use surround_imgproc as imgproc;

#[doc(inline)]
pub use surround_view as view;
