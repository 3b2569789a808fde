//! Qt bitmaps
//!
//! Qt images are opaque to the rest of the crate: pixels only leave or enter
//! a `QImage` through an encoded PNG buffer, the same way `QImage::save` and
//! `QImage::loadFromData` are used with a `QBuffer`.

use ::image::codecs::png::PngEncoder;
use ::image::{ExtendedColorType, ImageEncoder, ImageFormat as CodecFormat};

use super::{ColorMode, GenericImage, ImageConverter, decode, encode};
use crate::error::{ClipboardError, Result};

/// Subset of `QImage::Format` the clipboard produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QImageFormat {
    /// 24-bit RGB, three bytes per pixel
    Rgb888,
    /// Byte-ordered RGBA
    Rgba8888,
    /// 32-bit `0xAARRGGBB` words in native byte order
    Argb32,
}

impl QImageFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            QImageFormat::Rgb888 => 3,
            QImageFormat::Rgba8888 | QImageFormat::Argb32 => 4,
        }
    }

    pub fn has_alpha(self) -> bool {
        !matches!(self, QImageFormat::Rgb888)
    }
}

/// In-memory stand-in for a `QImage`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QImage {
    width: u32,
    height: u32,
    format: QImageFormat,
    bytes_per_line: usize,
    bits: Vec<u8>,
}

impl QImage {
    /// Scanlines in Qt are always aligned to 32 bits
    pub fn aligned_bytes_per_line(width: u32, format: QImageFormat) -> usize {
        (width as usize * format.bytes_per_pixel() + 3) & !3
    }

    /// Wrap raw scanlines, checking they cover the whole image
    pub fn from_bits(
        width: u32,
        height: u32,
        format: QImageFormat,
        bytes_per_line: usize,
        bits: Vec<u8>,
    ) -> Result<Self> {
        let row_len = width as usize * format.bytes_per_pixel();
        if bytes_per_line < row_len || bits.len() < bytes_per_line * height as usize {
            return Err(ClipboardError::InvalidImageData(format!(
                "{}x{} {:?} image needs {} bytes per line and {} bytes, got {} and {}",
                width,
                height,
                format,
                row_len,
                row_len * height as usize,
                bytes_per_line,
                bits.len()
            )));
        }
        Ok(QImage {
            width,
            height,
            format,
            bytes_per_line,
            bits,
        })
    }

    /// Tightly packed RGBA, as handed out by the desktop selection
    /// Fully opaque data collapses to `Rgb888`, the same rule `load_from_data` applies
    pub fn from_rgba8888(width: u32, height: u32, bits: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if bits.len() != expected {
            return Err(ClipboardError::InvalidImageData(format!(
                "{}x{} RGBA image needs {} bytes, got {}",
                width,
                height,
                expected,
                bits.len()
            )));
        }

        if bits.chunks_exact(4).all(|px| px[3] == 0xFF) {
            let rgb = bits
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect();
            QImage::from_packed(width, height, QImageFormat::Rgb888, rgb)
        } else {
            QImage::from_bits(width, height, QImageFormat::Rgba8888, width as usize * 4, bits)
        }
    }

    /// Like [`QImage::from_rgba8888`], with dimensions as the selection reports them
    pub fn from_rgba_buffer(width: usize, height: usize, bits: Vec<u8>) -> Result<Self> {
        let dim = |value: usize| {
            u32::try_from(value).map_err(|_| {
                ClipboardError::InvalidImageData(format!("image dimension {} too large", value))
            })
        };
        QImage::from_rgba8888(dim(width)?, dim(height)?, bits)
    }

    /// Lay packed pixels out on 32-bit aligned scanlines
    fn from_packed(width: u32, height: u32, format: QImageFormat, packed: Vec<u8>) -> Result<Self> {
        let row_len = width as usize * format.bytes_per_pixel();
        let bytes_per_line = QImage::aligned_bytes_per_line(width, format);
        let mut bits = vec![0u8; bytes_per_line * height as usize];
        if row_len > 0 {
            for (line, src) in bits
                .chunks_exact_mut(bytes_per_line)
                .zip(packed.chunks_exact(row_len))
            {
                line[..row_len].copy_from_slice(src);
            }
        }

        QImage::from_bits(width, height, format, bytes_per_line, bits)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> QImageFormat {
        self.format
    }

    pub fn bytes_per_line(&self) -> usize {
        self.bytes_per_line
    }

    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    fn scanlines(&self) -> impl Iterator<Item = &[u8]> {
        let row_len = self.width as usize * self.format.bytes_per_pixel();
        self.bits
            .chunks(self.bytes_per_line.max(1))
            .take(self.height as usize)
            .map(move |line| &line[..row_len])
    }

    /// Pixels as packed RGB or RGBA bytes, in whichever mode the format carries
    fn packed(&self) -> (ColorMode, Vec<u8>) {
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for line in self.scanlines() {
            match self.format {
                QImageFormat::Rgb888 | QImageFormat::Rgba8888 => out.extend_from_slice(line),
                QImageFormat::Argb32 => {
                    for px in line.chunks_exact(4) {
                        let argb = u32::from_ne_bytes([px[0], px[1], px[2], px[3]]);
                        out.extend_from_slice(&[
                            (argb >> 16) as u8,
                            (argb >> 8) as u8,
                            argb as u8,
                            (argb >> 24) as u8,
                        ]);
                    }
                }
            }
        }
        let mode = if self.format.has_alpha() {
            ColorMode::Rgba
        } else {
            ColorMode::Rgb
        };
        (mode, out)
    }

    /// Tightly packed RGBA, whatever the internal format
    pub fn to_rgba8888(&self) -> Vec<u8> {
        match self.packed() {
            (ColorMode::Rgba, bytes) => bytes,
            (ColorMode::Rgb, bytes) => bytes
                .chunks_exact(3)
                .flat_map(|px| [px[0], px[1], px[2], 0xFF])
                .collect(),
        }
    }

    /// Encode into a PNG buffer (`QImage::save(&buffer, "PNG")`)
    pub fn save_png(&self) -> Result<Vec<u8>> {
        let (mode, bytes) = self.packed();
        let color = match mode {
            ColorMode::Rgb => ExtendedColorType::Rgb8,
            ColorMode::Rgba => ExtendedColorType::Rgba8,
        };
        let mut buf = Vec::new();
        PngEncoder::new(&mut buf).write_image(&bytes, self.width, self.height, color)?;
        Ok(buf)
    }

    /// Load from an encoded buffer (`QImage::loadFromData`)
    /// Images with alpha load as `Argb32`, opaque ones as `Rgb888`
    pub fn load_from_data(data: &[u8]) -> Result<Self> {
        let image = ::image::load_from_memory(data)?;
        let (width, height) = (image.width(), image.height());

        let (format, packed) = match ColorMode::of(&image) {
            ColorMode::Rgb => (QImageFormat::Rgb888, image.to_rgb8().into_raw()),
            ColorMode::Rgba => {
                let argb: Vec<u8> = image
                    .to_rgba8()
                    .pixels()
                    .flat_map(|p| {
                        let [r, g, b, a] = p.0;
                        let word = (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32;
                        word.to_ne_bytes()
                    })
                    .collect();
                (QImageFormat::Argb32, argb)
            }
        };

        QImage::from_packed(width, height, format, packed)
    }
}

/// Converts between Qt images and generic images through PNG
#[derive(Debug, Default, Clone, Copy)]
pub struct QImageConverter;

impl ImageConverter for QImageConverter {
    type Native = QImage;

    fn native_type(&self) -> &'static str {
        "QImage"
    }

    fn to_generic(&self, native: &QImage) -> Result<GenericImage> {
        let png = native.save_png()?;
        decode(&png, CodecFormat::Png)
    }

    fn from_generic(&self, generic: &GenericImage) -> Result<QImage> {
        let png = encode(&super::normalize(generic), CodecFormat::Png)?;
        QImage::load_from_data(&png)
    }
}
