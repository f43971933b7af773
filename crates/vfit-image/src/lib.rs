//! Image representation conversion.
//!
//! Callers hand images around as file paths, raw byte buffers, base64
//! strings, or decoded `image::DynamicImage` values. This crate converts
//! between those representations and canonicalizes everything to PNG bytes
//! for the wire.

pub mod convert;
pub mod error;

pub use convert::{flatten_alpha, image_from_bytes, image_to_png_bytes, ImageSource};
pub use error::{ConvertError, ConvertResult};
