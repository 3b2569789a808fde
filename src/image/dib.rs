//! Device independent bitmaps, the `CF_DIB` clipboard format
//!
//! A DIB is a BMP file without its 14-byte `BITMAPFILEHEADER`. Writing strips
//! the header from an encoded BMP; reading synthesizes it again so the BMP
//! decoder can take over.

use ::image::ImageFormat as CodecFormat;

use super::{ColorMode, GenericImage, ImageConverter, decode, encode};
use crate::error::{ClipboardError, Result};

/// Size of `BITMAPFILEHEADER`
pub const FILE_HEADER_LEN: usize = 14;

const BITMAPCOREHEADER_LEN: u32 = 12;
const BITMAPINFOHEADER_LEN: u32 = 40;
const BI_BITFIELDS: u32 = 3;
const BI_ALPHABITFIELDS: u32 = 6;

/// Raw `CF_DIB` payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dib(Vec<u8>);

impl Dib {
    pub fn new(bytes: Vec<u8>) -> Self {
        Dib(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Strip the file header from a complete BMP file
    pub fn from_bitmap_file(bmp: &[u8]) -> Result<Self> {
        if bmp.len() <= FILE_HEADER_LEN || &bmp[..2] != b"BM" {
            return Err(ClipboardError::InvalidImageData(
                "not a BMP file".to_string(),
            ));
        }
        Ok(Dib(bmp[FILE_HEADER_LEN..].to_vec()))
    }

    /// Rebuild the complete BMP file the DIB came from
    pub fn to_bitmap_file(&self) -> Result<Vec<u8>> {
        let offset = self.pixel_offset()?;
        let file_len = u32::try_from(FILE_HEADER_LEN + self.0.len()).map_err(|_| {
            ClipboardError::InvalidImageData("DIB larger than 4 GiB".to_string())
        })?;

        let mut bmp = Vec::with_capacity(FILE_HEADER_LEN + self.0.len());
        bmp.extend_from_slice(b"BM");
        bmp.extend_from_slice(&file_len.to_le_bytes());
        bmp.extend_from_slice(&[0; 4]);
        bmp.extend_from_slice(&offset.to_le_bytes());
        bmp.extend_from_slice(&self.0);
        Ok(bmp)
    }

    /// Offset of the pixel array from the start of the file: file header,
    /// info header, optional color masks and the color table
    fn pixel_offset(&self) -> Result<u32> {
        let header_len = self.read_u32(0)?;
        let (bit_count, compression, colors_used) = if header_len == BITMAPCOREHEADER_LEN {
            (self.read_u16(10)?, 0, 0)
        } else if header_len >= BITMAPINFOHEADER_LEN {
            (self.read_u16(14)?, self.read_u32(16)?, self.read_u32(32)?)
        } else {
            return Err(ClipboardError::InvalidImageData(format!(
                "unknown DIB header size {}",
                header_len
            )));
        };

        // Masks follow a plain BITMAPINFOHEADER; later headers embed them
        let masks = match compression {
            BI_BITFIELDS if header_len == BITMAPINFOHEADER_LEN => 12,
            BI_ALPHABITFIELDS if header_len == BITMAPINFOHEADER_LEN => 16,
            _ => 0,
        };

        let palette_entries = if colors_used != 0 {
            colors_used
        } else if (1..=8).contains(&bit_count) {
            1u32 << bit_count
        } else {
            0
        };
        let entry_len = if header_len == BITMAPCOREHEADER_LEN { 3 } else { 4 };

        // Everything before the pixels must lie inside the DIB itself
        let prefix = palette_entries
            .checked_mul(entry_len)
            .and_then(|palette| palette.checked_add(masks))
            .and_then(|tables| tables.checked_add(header_len))
            .filter(|&prefix| prefix as usize <= self.0.len())
            .ok_or_else(|| {
                ClipboardError::InvalidImageData(format!(
                    "DIB header declares {} color table entries, buffer holds {} bytes",
                    palette_entries,
                    self.0.len()
                ))
            })?;

        prefix.checked_add(FILE_HEADER_LEN as u32).ok_or_else(truncated)
    }

    fn read_u16(&self, at: usize) -> Result<u16> {
        self.0
            .get(at..at + 2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
            .ok_or_else(truncated)
    }

    fn read_u32(&self, at: usize) -> Result<u32> {
        self.0
            .get(at..at + 4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .ok_or_else(truncated)
    }
}

fn truncated() -> ClipboardError {
    ClipboardError::InvalidImageData("truncated DIB header".to_string())
}

/// Converts between `CF_DIB` payloads and generic images
///
/// Lossy: the clipboard bitmap is written as 24-bit RGB, so alpha is dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct DibConverter;

impl ImageConverter for DibConverter {
    type Native = Dib;

    fn native_type(&self) -> &'static str {
        "CF_DIB"
    }

    fn to_generic(&self, dib: &Dib) -> Result<GenericImage> {
        decode(&dib.to_bitmap_file()?, CodecFormat::Bmp)
    }

    fn from_generic(&self, generic: &GenericImage) -> Result<Dib> {
        if ColorMode::of(generic).has_alpha() {
            log::warn!("Win32 clipboard bitmaps carry no alpha channel, dropping it");
        }
        let rgb = GenericImage::ImageRgb8(generic.to_rgb8());
        let bmp = encode(&rgb, CodecFormat::Bmp)?;
        Dib::from_bitmap_file(&bmp)
    }
}
