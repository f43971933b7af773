//! Conversions between image representations.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::{DynamicImage, ImageFormat, RgbImage};

use crate::error::{ConvertError, ConvertResult};

/// An image in one of the representations callers supply.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Path to an image file on disk.
    Path(PathBuf),
    /// Already-encoded image bytes (passed through untouched).
    Bytes(Vec<u8>),
    /// Base64-encoded image bytes.
    Base64(String),
    /// A decoded image.
    Image(DynamicImage),
}

impl ImageSource {
    /// Interpret a string as a file path if one exists at that location,
    /// otherwise as base64-encoded image data.
    pub fn from_string(s: impl Into<String>) -> Self {
        let s = s.into();
        if Path::new(&s).is_file() {
            Self::Path(PathBuf::from(s))
        } else {
            Self::Base64(s)
        }
    }

    /// Convert this source to canonical PNG bytes.
    ///
    /// Raw bytes pass through untouched; paths are loaded and re-encoded;
    /// base64 strings are decoded to the bytes they carry.
    pub fn to_png_bytes(&self) -> ConvertResult<Vec<u8>> {
        match self {
            Self::Bytes(bytes) => Ok(bytes.clone()),
            Self::Base64(data) => Ok(BASE64.decode(data.trim())?),
            Self::Path(path) => {
                if !path.is_file() {
                    return Err(ConvertError::FileNotFound(path.clone()));
                }
                let img = image::open(path)?;
                image_to_png_bytes(&img)
            }
            Self::Image(img) => image_to_png_bytes(img),
        }
    }

    /// Decode this source into an image.
    pub fn to_image(&self) -> ConvertResult<DynamicImage> {
        match self {
            Self::Path(path) => {
                if !path.is_file() {
                    return Err(ConvertError::FileNotFound(path.clone()));
                }
                Ok(image::open(path)?)
            }
            Self::Image(img) => Ok(img.clone()),
            _ => image_from_bytes(&self.to_png_bytes()?),
        }
    }
}

impl From<DynamicImage> for ImageSource {
    fn from(img: DynamicImage) -> Self {
        Self::Image(img)
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

/// Decode image bytes into a `DynamicImage`.
pub fn image_from_bytes(bytes: &[u8]) -> ConvertResult<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

/// Encode an image as PNG bytes.
pub fn image_to_png_bytes(img: &DynamicImage) -> ConvertResult<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

/// Composite an image with an alpha channel over a white background.
///
/// Images without alpha pass through unchanged.
pub fn flatten_alpha(img: &DynamicImage) -> DynamicImage {
    if !img.color().has_alpha() {
        return img.clone();
    }

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut rgb = RgbImage::new(width, height);

    for (x, y, px) in rgba.enumerate_pixels() {
        let alpha = px[3] as u32;
        let blend = |c: u8| (((c as u32) * alpha + 255 * (255 - alpha)) / 255) as u8;
        rgb.put_pixel(x, y, image::Rgb([blend(px[0]), blend(px[1]), blend(px[2])]));
    }

    DynamicImage::ImageRgb8(rgb)
}
