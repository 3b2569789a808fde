use ::image::ImageFormat as CodecFormat;

use super::{GenericImage, ImageConverter, decode, encode, normalize};
use crate::error::Result;

/// Pasteboard types that carry images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteboardType {
    /// `public.png`
    Png,
    /// `public.tiff`, what most Cocoa apps put on the pasteboard
    Tiff,
}

impl PasteboardType {
    /// Uniform type identifier of the pasteboard type
    pub fn uti(self) -> &'static str {
        match self {
            PasteboardType::Png => "public.png",
            PasteboardType::Tiff => "public.tiff",
        }
    }

    fn codec(self) -> CodecFormat {
        match self {
            PasteboardType::Png => CodecFormat::Png,
            PasteboardType::Tiff => CodecFormat::Tiff,
        }
    }
}

/// Image data as stored on an `NSPasteboard`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteboardItem {
    pub kind: PasteboardType,
    pub data: Vec<u8>,
}

/// Converts between pasteboard items and generic images
/// Writes always produce PNG, reads accept PNG and TIFF
#[derive(Debug, Default, Clone, Copy)]
pub struct PasteboardConverter;

impl ImageConverter for PasteboardConverter {
    type Native = PasteboardItem;

    fn native_type(&self) -> &'static str {
        "NSPasteboardItem"
    }

    fn to_generic(&self, item: &PasteboardItem) -> Result<GenericImage> {
        decode(&item.data, item.kind.codec())
    }

    fn from_generic(&self, generic: &GenericImage) -> Result<PasteboardItem> {
        Ok(PasteboardItem {
            kind: PasteboardType::Png,
            data: encode(&normalize(generic), CodecFormat::Png)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::test_images;

    #[test]
    fn test_png_round_trip() {
        for image in [test_images::rgb(100, 100), test_images::rgba(100, 100)] {
            let item = PasteboardConverter.from_generic(&image).unwrap();
            assert_eq!(item.kind, PasteboardType::Png);
            assert_eq!(PasteboardConverter.to_generic(&item).unwrap(), image);
        }
    }

    #[test]
    fn test_reads_tiff() {
        let image = test_images::rgb(16, 9);
        let item = PasteboardItem {
            kind: PasteboardType::Tiff,
            data: encode(&image, CodecFormat::Tiff).unwrap(),
        };
        assert_eq!(PasteboardConverter.to_generic(&item).unwrap(), image);
    }

    #[test]
    fn test_garbage_data_is_an_error() {
        let item = PasteboardItem {
            kind: PasteboardType::Png,
            data: b"not a png".to_vec(),
        };
        assert!(PasteboardConverter.to_generic(&item).is_err());
    }
}
