use super::backend::{ClipboardBackend, NativeClipboard, check_requested_format, invalid_image};
use crate::error::Result;
use crate::image::{Image, ImageConverter, ImageFormat, PasteboardConverter, PasteboardItem};
use crate::platform::BackendKind;

#[cfg(target_os = "macos")]
pub use general::GeneralPasteboard;

/// AppKit pasteboard backend
pub struct AppKitBackend<C> {
    pasteboard: C,
    converter: PasteboardConverter,
}

impl<C> AppKitBackend<C>
where
    C: NativeClipboard<Image = PasteboardItem>,
{
    pub fn new(pasteboard: C) -> Self {
        log::debug!("AppKitBackend initialized");
        AppKitBackend {
            pasteboard,
            converter: PasteboardConverter,
        }
    }
}

impl<C> ClipboardBackend for AppKitBackend<C>
where
    C: NativeClipboard<Image = PasteboardItem>,
{
    fn kind(&self) -> BackendKind {
        BackendKind::AppKit
    }

    fn native_format(&self) -> ImageFormat {
        ImageFormat::Pasteboard
    }

    fn native_type(&self) -> &'static str {
        self.converter.native_type()
    }

    fn supports_alpha(&self) -> bool {
        true
    }

    fn get_text(&mut self) -> Result<Option<String>> {
        self.pasteboard.read_text()
    }

    fn set_text(&mut self, text: &str) -> Result<()> {
        self.pasteboard.write_text(text)
    }

    fn get_image(&mut self, format: ImageFormat) -> Result<Option<Image>> {
        check_requested_format(format, ImageFormat::Pasteboard)?;

        match self.pasteboard.read_image()? {
            None => Ok(None),
            Some(item) if format == ImageFormat::Pasteboard => Ok(Some(Image::Pasteboard(item))),
            Some(item) => Ok(Some(Image::Generic(self.converter.to_generic(&item)?))),
        }
    }

    fn set_image(&mut self, image: Image) -> Result<()> {
        let item = match image {
            Image::Pasteboard(item) => item,
            Image::Generic(generic) => self.converter.from_generic(&generic)?,
            other => return Err(invalid_image(ImageFormat::Pasteboard, &other)),
        };
        log::debug!(
            "Writing {} bytes of {} to the pasteboard",
            item.data.len(),
            item.kind.uti()
        );
        self.pasteboard.write_image(item)
    }
}

#[cfg(target_os = "macos")]
mod general {
    use objc2::rc::Retained;
    use objc2_app_kit::{
        NSPasteboard, NSPasteboardType, NSPasteboardTypePNG, NSPasteboardTypeString,
        NSPasteboardTypeTIFF,
    };
    use objc2_foundation::{NSData, NSString};

    use crate::clipboard::backend::NativeClipboard;
    use crate::error::{ClipboardError, Result};
    use crate::image::{PasteboardItem, PasteboardType};
    use crate::platform::BackendKind;

    fn pasteboard_type(kind: PasteboardType) -> &'static NSPasteboardType {
        // SAFETY: AppKit's pasteboard type constants are immutable statics
        unsafe {
            match kind {
                PasteboardType::Png => NSPasteboardTypePNG,
                PasteboardType::Tiff => NSPasteboardTypeTIFF,
            }
        }
    }

    /// The system-wide general pasteboard
    pub struct GeneralPasteboard {
        pasteboard: Retained<NSPasteboard>,
    }

    impl GeneralPasteboard {
        pub fn open() -> Result<Self> {
            let pasteboard = NSPasteboard::generalPasteboard();
            log::debug!("Opened general pasteboard (change count {})", pasteboard.changeCount());
            Ok(GeneralPasteboard { pasteboard })
        }
    }

    impl NativeClipboard for GeneralPasteboard {
        type Image = PasteboardItem;

        fn read_text(&mut self) -> Result<Option<String>> {
            // SAFETY: see pasteboard_type
            let string_type = unsafe { NSPasteboardTypeString };
            Ok(self
                .pasteboard
                .stringForType(string_type)
                .map(|text| text.to_string()))
        }

        fn write_text(&mut self, text: &str) -> Result<()> {
            // SAFETY: see pasteboard_type
            let string_type = unsafe { NSPasteboardTypeString };
            self.pasteboard.clearContents();
            if self
                .pasteboard
                .setString_forType(&NSString::from_str(text), string_type)
            {
                Ok(())
            } else {
                Err(ClipboardError::native(
                    BackendKind::AppKit,
                    "pasteboard refused the string",
                ))
            }
        }

        fn read_image(&mut self) -> Result<Option<PasteboardItem>> {
            for kind in [PasteboardType::Png, PasteboardType::Tiff] {
                if let Some(data) = self.pasteboard.dataForType(pasteboard_type(kind)) {
                    return Ok(Some(PasteboardItem {
                        kind,
                        data: data.to_vec(),
                    }));
                }
            }
            Ok(None)
        }

        fn write_image(&mut self, item: PasteboardItem) -> Result<()> {
            let data = NSData::with_bytes(&item.data);
            self.pasteboard.clearContents();
            if self
                .pasteboard
                .setData_forType(Some(&data), pasteboard_type(item.kind))
            {
                Ok(())
            } else {
                Err(ClipboardError::native(
                    BackendKind::AppKit,
                    format!("pasteboard refused {} data", item.kind.uti()),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::error::ClipboardError;
    use crate::image::{PasteboardType, QImageConverter, test_images};

    fn backend() -> AppKitBackend<MemoryClipboard<PasteboardItem>> {
        AppKitBackend::new(MemoryClipboard::new())
    }

    #[test]
    fn test_text_round_trip() {
        let mut appkit = backend();
        appkit.set_text("naïve café ✓").unwrap();
        assert_eq!(appkit.get_text().unwrap().as_deref(), Some("naïve café ✓"));
    }

    #[test]
    fn test_image_written_as_png() {
        let mut appkit = backend();
        let image = test_images::rgb(100, 100);
        appkit.set_image(Image::Generic(image.clone())).unwrap();

        match appkit.get_image(ImageFormat::Pasteboard).unwrap() {
            Some(Image::Pasteboard(item)) => assert_eq!(item.kind, PasteboardType::Png),
            other => panic!("expected a pasteboard item, got {:?}", other.map(|i| i.format())),
        }
        let back = appkit.get_image(ImageFormat::Generic).unwrap().unwrap();
        assert_eq!(back.into_generic(), Some(image));
    }

    #[test]
    fn test_rejects_qimage() {
        let mut appkit = backend();
        let qimage = QImageConverter.from_generic(&test_images::rgb(2, 2)).unwrap();
        assert!(matches!(
            appkit.set_image(Image::QImage(qimage)),
            Err(ClipboardError::InvalidImageType { .. })
        ));
    }
}
