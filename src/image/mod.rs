//! Image representations and the converters between them
//!
//! Every backend speaks [`GenericImage`]; backends with their own in-memory
//! image type also hand out that type on request. Converters normalize the
//! generic side to 8-bit RGB or RGBA.

pub mod dib;
pub mod pasteboard;
pub mod pixbuf;
pub mod qimage;

use ::image::{DynamicImage, ImageFormat as CodecFormat};
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use crate::error::{ClipboardError, Result};

pub use dib::{Dib, DibConverter};
pub use pasteboard::{PasteboardConverter, PasteboardItem, PasteboardType};
pub use pixbuf::{Pixbuf, PixbufConverter};
pub use qimage::{QImage, QImageConverter, QImageFormat};

/// Library-neutral decoded image, usable with every backend
pub type GenericImage = DynamicImage;

/// Identifies an image representation a caller can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// [`GenericImage`]
    Generic,
    /// [`Pixbuf`], GTK's pixel buffer
    Pixbuf,
    /// [`QImage`], Qt's bitmap
    QImage,
    /// [`PasteboardItem`], an AppKit pasteboard entry
    Pasteboard,
}

impl ImageFormat {
    pub fn name(self) -> &'static str {
        match self {
            ImageFormat::Generic => "generic",
            ImageFormat::Pixbuf => "gdk-pixbuf",
            ImageFormat::QImage => "qimage",
            ImageFormat::Pasteboard => "ns-pasteboard",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ImageFormat {
    type Err = ClipboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "generic" => Ok(ImageFormat::Generic),
            "gdk-pixbuf" => Ok(ImageFormat::Pixbuf),
            "qimage" => Ok(ImageFormat::QImage),
            "ns-pasteboard" => Ok(ImageFormat::Pasteboard),
            other => Err(ClipboardError::UnsupportedImageFormat(other.to_string())),
        }
    }
}

/// Color modes images are normalized to at conversion boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Rgb,
    Rgba,
}

impl ColorMode {
    /// Mode a generic image ends up in after normalization
    pub fn of(image: &GenericImage) -> Self {
        if image.color().has_alpha() {
            ColorMode::Rgba
        } else {
            ColorMode::Rgb
        }
    }

    pub fn channels(self) -> usize {
        match self {
            ColorMode::Rgb => 3,
            ColorMode::Rgba => 4,
        }
    }

    pub fn has_alpha(self) -> bool {
        self == ColorMode::Rgba
    }
}

/// An image as handed to or returned by a backend
#[derive(Debug, Clone, PartialEq)]
pub enum Image {
    Generic(GenericImage),
    Pixbuf(Pixbuf),
    QImage(QImage),
    Pasteboard(PasteboardItem),
}

impl Image {
    pub fn format(&self) -> ImageFormat {
        match self {
            Image::Generic(_) => ImageFormat::Generic,
            Image::Pixbuf(_) => ImageFormat::Pixbuf,
            Image::QImage(_) => ImageFormat::QImage,
            Image::Pasteboard(_) => ImageFormat::Pasteboard,
        }
    }

    pub fn as_generic(&self) -> Option<&GenericImage> {
        match self {
            Image::Generic(image) => Some(image),
            _ => None,
        }
    }

    pub fn into_generic(self) -> Option<GenericImage> {
        match self {
            Image::Generic(image) => Some(image),
            _ => None,
        }
    }
}

impl From<GenericImage> for Image {
    fn from(image: GenericImage) -> Self {
        Image::Generic(image)
    }
}

/// Bidirectional mapping between [`GenericImage`] and a native representation
///
/// Implementations are pure: no clipboard access, no shared state.
pub trait ImageConverter {
    /// The backend's own image representation
    type Native;

    /// Name of the toolkit type behind [`ImageConverter::Native`]
    fn native_type(&self) -> &'static str;

    fn to_generic(&self, native: &Self::Native) -> Result<GenericImage>;

    fn from_generic(&self, generic: &GenericImage) -> Result<Self::Native>;
}

/// Bring a generic image to 8-bit RGB or RGBA
/// Images already in one of those modes are returned unchanged
pub fn normalize(image: &GenericImage) -> GenericImage {
    match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => image.clone(),
        other => match ColorMode::of(other) {
            ColorMode::Rgba => DynamicImage::ImageRgba8(other.to_rgba8()),
            ColorMode::Rgb => DynamicImage::ImageRgb8(other.to_rgb8()),
        },
    }
}

/// Encode an image into an in-memory container
pub fn encode(image: &GenericImage, format: CodecFormat) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), format)?;
    Ok(buf)
}

/// Decode an in-memory container, normalizing the result
pub fn decode(data: &[u8], format: CodecFormat) -> Result<GenericImage> {
    let image = ::image::load_from_memory_with_format(data, format)?;
    Ok(normalize(&image))
}

#[cfg(test)]
pub(crate) mod test_images {
    use ::image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

    /// Deterministic RGB test pattern
    pub fn rgb(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            let seed = x.wrapping_mul(2_654_435_761).wrapping_add(y.wrapping_mul(40_503));
            Rgb([
                (seed >> 3) as u8,
                (seed >> 11) as u8 ^ x as u8,
                (seed >> 19) as u8 ^ y as u8,
            ])
        }))
    }

    /// Same pattern with a varying alpha channel
    pub fn rgba(width: u32, height: u32) -> DynamicImage {
        let base = rgb(width, height).to_rgb8();
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            let [r, g, b] = base.get_pixel(x, y).0;
            Rgba([r, g, b, ((x + y) % 200) as u8 + 20])
        }))
    }
}
