use super::backend::{ClipboardBackend, NativeClipboard, check_requested_format, invalid_image};
use crate::error::Result;
use crate::image::{Image, ImageConverter, ImageFormat, QImage, QImageConverter};
use crate::platform::BackendKind;

#[cfg(all(feature = "qt", target_os = "linux"))]
pub use selection::SelectionClipboard;

/// Qt clipboard backend
/// Images travel through a PNG buffer between `QImage` and generic images
///
/// `QImage` is this crate's own model of Qt's bitmap; the live handle reaches
/// the desktop `CLIPBOARD` selection through arboard, not through Qt itself.
pub struct QtBackend<C> {
    clipboard: C,
    converter: QImageConverter,
}

impl<C> QtBackend<C>
where
    C: NativeClipboard<Image = QImage>,
{
    pub fn new(clipboard: C) -> Self {
        log::debug!("QtBackend initialized");
        QtBackend {
            clipboard,
            converter: QImageConverter,
        }
    }
}

impl<C> ClipboardBackend for QtBackend<C>
where
    C: NativeClipboard<Image = QImage>,
{
    fn kind(&self) -> BackendKind {
        BackendKind::Qt
    }

    fn native_format(&self) -> ImageFormat {
        ImageFormat::QImage
    }

    fn native_type(&self) -> &'static str {
        self.converter.native_type()
    }

    fn supports_alpha(&self) -> bool {
        true
    }

    fn get_text(&mut self) -> Result<Option<String>> {
        self.clipboard.read_text()
    }

    fn set_text(&mut self, text: &str) -> Result<()> {
        self.clipboard.write_text(text)?;
        log::debug!("Wrote {} bytes text to Qt clipboard", text.len());
        Ok(())
    }

    fn get_image(&mut self, format: ImageFormat) -> Result<Option<Image>> {
        check_requested_format(format, ImageFormat::QImage)?;

        let Some(qimage) = self.clipboard.read_image()? else {
            return Ok(None);
        };

        if format == ImageFormat::QImage {
            return Ok(Some(Image::QImage(qimage)));
        }
        Ok(Some(Image::Generic(self.converter.to_generic(&qimage)?)))
    }

    fn set_image(&mut self, image: Image) -> Result<()> {
        let qimage = match image {
            Image::QImage(qimage) => qimage,
            Image::Generic(generic) => self.converter.from_generic(&generic)?,
            other => return Err(invalid_image(ImageFormat::QImage, &other)),
        };
        log::debug!(
            "Writing {}x{} {:?} image to Qt clipboard",
            qimage.width(),
            qimage.height(),
            qimage.format()
        );
        self.clipboard.write_image(qimage)
    }
}

#[cfg(all(feature = "qt", target_os = "linux"))]
mod selection {
    use std::borrow::Cow;

    use crate::clipboard::backend::NativeClipboard;
    use crate::error::{ClipboardError, Result};
    use crate::image::QImage;
    use crate::platform::BackendKind;

    /// Clipboard owned by the Qt desktop session, reached through the
    /// X11/Wayland `CLIPBOARD` selection that `QClipboard` publishes to
    pub struct SelectionClipboard {
        clipboard: arboard::Clipboard,
    }

    impl SelectionClipboard {
        /// Connect to the session's clipboard
        pub fn open() -> Result<Self> {
            let clipboard = arboard::Clipboard::new()
                .map_err(|e| ClipboardError::missing(BackendKind::Qt, e.to_string()))?;
            Ok(SelectionClipboard { clipboard })
        }
    }

    impl NativeClipboard for SelectionClipboard {
        type Image = QImage;

        fn read_text(&mut self) -> Result<Option<String>> {
            match self.clipboard.get_text() {
                Ok(text) => Ok(Some(text)),
                Err(arboard::Error::ContentNotAvailable) => Ok(None),
                Err(e) => Err(ClipboardError::native(BackendKind::Qt, e)),
            }
        }

        fn write_text(&mut self, text: &str) -> Result<()> {
            self.clipboard
                .set_text(text)
                .map_err(|e| ClipboardError::native(BackendKind::Qt, e))
        }

        fn read_image(&mut self) -> Result<Option<QImage>> {
            let image = match self.clipboard.get_image() {
                Ok(image) => image,
                Err(arboard::Error::ContentNotAvailable) => return Ok(None),
                Err(e) => return Err(ClipboardError::native(BackendKind::Qt, e)),
            };

            let qimage =
                QImage::from_rgba_buffer(image.width, image.height, image.bytes.into_owned())?;
            Ok(Some(qimage))
        }

        fn write_image(&mut self, image: QImage) -> Result<()> {
            let data = arboard::ImageData {
                width: image.width() as usize,
                height: image.height() as usize,
                bytes: Cow::Owned(image.to_rgba8888()),
            };
            self.clipboard
                .set_image(data)
                .map_err(|e| ClipboardError::native(BackendKind::Qt, e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::error::ClipboardError;
    use crate::image::{Pixbuf, test_images};

    fn backend() -> QtBackend<MemoryClipboard<QImage>> {
        QtBackend::new(MemoryClipboard::new())
    }

    #[test]
    fn test_text_round_trip() {
        let mut qt = backend();
        qt.set_text("Hello World").unwrap();
        assert_eq!(qt.get_text().unwrap().as_deref(), Some("Hello World"));
    }

    #[test]
    fn test_image_round_trip() {
        let mut qt = backend();
        let image = test_images::rgb(100, 100);
        qt.set_image(Image::Generic(image.clone())).unwrap();

        let native = qt.get_image(ImageFormat::QImage).unwrap().unwrap();
        assert_eq!(native.format(), ImageFormat::QImage);

        let generic = qt.get_image(ImageFormat::Generic).unwrap().unwrap();
        assert_eq!(generic.into_generic(), Some(image));
    }

    #[test]
    fn test_rgba_is_preserved() {
        let mut qt = backend();
        let image = test_images::rgba(100, 100);
        qt.set_image(Image::Generic(image.clone())).unwrap();
        let back = qt.get_image(ImageFormat::Generic).unwrap().unwrap();
        assert_eq!(back.into_generic(), Some(image));
    }

    #[test]
    fn test_introspection() {
        let qt = backend();
        assert_eq!(qt.kind(), BackendKind::Qt);
        assert_eq!(qt.native_format(), ImageFormat::QImage);
        assert_eq!(qt.native_type(), "QImage");
    }

    #[test]
    fn test_rejects_pixbuf() {
        let mut qt = backend();
        let pixbuf = Pixbuf {
            width: 0,
            height: 0,
            rowstride: 0,
            has_alpha: false,
            bits_per_sample: 8,
            pixels: Vec::new(),
        };
        assert!(matches!(
            qt.set_image(Image::Pixbuf(pixbuf)),
            Err(ClipboardError::InvalidImageType { .. })
        ));
        assert!(matches!(
            qt.get_image(ImageFormat::Pixbuf),
            Err(ClipboardError::UnsupportedImageFormat(_))
        ));
    }
}
