//! GTK pixel buffers
//!
//! A pixbuf stores 8-bit RGB or RGBA samples row by row, but rows are padded
//! to `rowstride` bytes and the last row may be shorter than the stride.

use ::image::{DynamicImage, RgbImage, RgbaImage};

use super::{ColorMode, GenericImage, ImageConverter, normalize};
use crate::error::{ClipboardError, Result};

/// In-memory copy of a `GdkPixbuf.Pixbuf`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pixbuf {
    pub width: u32,
    pub height: u32,
    /// Bytes between the starts of two consecutive rows
    pub rowstride: usize,
    pub has_alpha: bool,
    pub bits_per_sample: u8,
    pub pixels: Vec<u8>,
}

impl Pixbuf {
    pub fn n_channels(&self) -> usize {
        self.color_mode().channels()
    }

    pub fn color_mode(&self) -> ColorMode {
        if self.has_alpha {
            ColorMode::Rgba
        } else {
            ColorMode::Rgb
        }
    }

    /// Smallest buffer that holds every row (the last row is not padded)
    pub fn min_len(&self) -> usize {
        if self.width == 0 || self.height == 0 {
            return 0;
        }
        (self.height as usize - 1) * self.rowstride + self.width as usize * self.n_channels()
    }

    /// Rowstride GdkPixbuf picks for new buffers: rows aligned to 4 bytes
    pub fn default_rowstride(width: u32, mode: ColorMode) -> usize {
        (width as usize * mode.channels() + 3) & !3
    }

    /// Iterate over the pixel bytes of each row, without padding
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        let row_len = self.width as usize * self.n_channels();
        (0..self.height as usize).map(move |y| {
            if row_len == 0 {
                return &[][..];
            }
            let start = y * self.rowstride;
            &self.pixels[start..start + row_len]
        })
    }

    /// Check the buffer layout before rows are walked or handed to GDK
    pub(crate) fn validate(&self) -> Result<()> {
        if self.bits_per_sample != 8 {
            return Err(ClipboardError::InvalidImageData(format!(
                "pixbuf has {} bits per sample, only 8 is supported",
                self.bits_per_sample
            )));
        }
        let row_len = self.width as usize * self.n_channels();
        if self.height > 1 && self.rowstride < row_len {
            return Err(ClipboardError::InvalidImageData(format!(
                "pixbuf rowstride {} is shorter than a row of {} bytes",
                self.rowstride, row_len
            )));
        }
        if self.pixels.len() < self.min_len() {
            return Err(ClipboardError::InvalidImageData(format!(
                "pixbuf buffer holds {} bytes, {}x{} needs {}",
                self.pixels.len(),
                self.width,
                self.height,
                self.min_len()
            )));
        }
        Ok(())
    }
}

/// Converts between pixbufs and generic images
#[derive(Debug, Default, Clone, Copy)]
pub struct PixbufConverter;

impl ImageConverter for PixbufConverter {
    type Native = Pixbuf;

    fn native_type(&self) -> &'static str {
        "GdkPixbuf.Pixbuf"
    }

    fn to_generic(&self, pixbuf: &Pixbuf) -> Result<GenericImage> {
        pixbuf.validate()?;

        let packed: Vec<u8> = pixbuf.rows().flatten().copied().collect();
        let (w, h) = (pixbuf.width, pixbuf.height);
        let image = match pixbuf.color_mode() {
            ColorMode::Rgb => RgbImage::from_raw(w, h, packed).map(DynamicImage::ImageRgb8),
            ColorMode::Rgba => RgbaImage::from_raw(w, h, packed).map(DynamicImage::ImageRgba8),
        };

        image.ok_or_else(|| {
            ClipboardError::InvalidImageData(format!("pixbuf rows do not fill {}x{}", w, h))
        })
    }

    fn from_generic(&self, generic: &GenericImage) -> Result<Pixbuf> {
        let image = normalize(generic);
        let mode = ColorMode::of(&image);
        let (width, height) = (image.width(), image.height());
        let rowstride = Pixbuf::default_rowstride(width, mode);
        let row_len = width as usize * mode.channels();

        let mut pixels = vec![0u8; rowstride * height as usize];
        for (row, src) in pixels
            .chunks_exact_mut(rowstride.max(1))
            .zip(image.as_bytes().chunks_exact(row_len.max(1)))
        {
            row[..row_len].copy_from_slice(src);
        }

        Ok(Pixbuf {
            width,
            height,
            rowstride,
            has_alpha: mode.has_alpha(),
            bits_per_sample: 8,
            pixels,
        })
    }
}
