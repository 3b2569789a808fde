use super::backend::ClipboardBackend;
use crate::error::{ClipboardError, Result};
use crate::image::{Image, ImageFormat};
use crate::platform::{self, BackendKind, PlatformIdentity};

/// Cross-platform clipboard
///
/// Wraps exactly one backend for its lifetime. Images can be exchanged either
/// as generic images, which every backend accepts, or as the backend's native
/// image type (see [`Clipboard::native_format`]).
pub struct Clipboard {
    backend: Box<dyn ClipboardBackend>,
    native_format: ImageFormat,
    native_type: &'static str,
}

impl Clipboard {
    /// Detect the platform and connect to its clipboard
    pub fn new() -> Result<Self> {
        let kind = platform::select_backend(&PlatformIdentity::detect())?;
        Self::with_kind(kind)
    }

    /// Connect through a specific backend, bypassing detection
    pub fn with_kind(kind: BackendKind) -> Result<Self> {
        Self::from_backend(super::create_backend(kind)?)
    }

    /// Wrap an already constructed backend
    pub fn from_backend(backend: Box<dyn ClipboardBackend>) -> Result<Self> {
        let kind = backend.kind();
        let native_format = backend.native_format();
        if native_format != kind.native_format() {
            return Err(ClipboardError::InvalidBackend(format!(
                "{} backend reports native format {}, expected {}",
                kind,
                native_format,
                kind.native_format()
            )));
        }

        let native_type = backend.native_type();
        Ok(Clipboard {
            backend,
            native_format,
            native_type,
        })
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Image format returned by `get_image(true)`
    pub fn native_format(&self) -> ImageFormat {
        self.native_format
    }

    /// Toolkit type name behind [`Clipboard::native_format`]
    pub fn native_type(&self) -> &'static str {
        self.native_type
    }

    pub fn supports_alpha(&self) -> bool {
        self.backend.supports_alpha()
    }

    /// Current clipboard text, `None` when the clipboard holds none
    pub fn get_text(&mut self) -> Result<Option<String>> {
        self.backend.get_text()
    }

    pub fn set_text(&mut self, text: &str) -> Result<()> {
        self.backend.set_text(text)
    }

    /// Current clipboard image, `None` when the clipboard holds none
    /// With `native` set the backend's own image type is returned
    pub fn get_image(&mut self, native: bool) -> Result<Option<Image>> {
        let format = self.format_for(native);
        self.backend.get_image(format)
    }

    /// Like [`Clipboard::get_image`], with the format given by name
    /// (`generic`, `gdk-pixbuf`, `qimage` or `ns-pasteboard`)
    pub fn get_image_as(&mut self, format: &str) -> Result<Option<Image>> {
        let format: ImageFormat = format.parse()?;
        self.backend.get_image(format)
    }

    /// Put an image on the clipboard
    /// `native` states which representation `image` is in; a mismatch fails
    /// with `InvalidImageType` without touching the clipboard
    pub fn set_image(&mut self, image: Image, native: bool) -> Result<()> {
        let expected = self.format_for(native);
        if image.format() != expected {
            return Err(ClipboardError::InvalidImageType {
                expected,
                found: image.format(),
            });
        }
        self.backend.set_image(image)
    }

    fn format_for(&self, native: bool) -> ImageFormat {
        if native {
            self.native_format
        } else {
            ImageFormat::Generic
        }
    }
}

impl std::fmt::Debug for Clipboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clipboard")
            .field("backend", &self.backend.name())
            .field("native_format", &self.native_format)
            .field("native_type", &self.native_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::{GtkBackend, MemoryClipboard, create_memory_backend};
    use crate::image::{Pixbuf, test_images};

    fn clipboard(kind: BackendKind) -> Clipboard {
        Clipboard::from_backend(create_memory_backend(kind)).unwrap()
    }

    /// Claims to be GTK but reports the Qt native format
    struct Impostor(GtkBackend<MemoryClipboard<Pixbuf>>);

    impl ClipboardBackend for Impostor {
        fn kind(&self) -> BackendKind {
            BackendKind::Gtk
        }
        fn native_format(&self) -> ImageFormat {
            ImageFormat::QImage
        }
        fn native_type(&self) -> &'static str {
            "QImage"
        }
        fn supports_alpha(&self) -> bool {
            true
        }
        fn get_text(&mut self) -> Result<Option<String>> {
            self.0.get_text()
        }
        fn set_text(&mut self, text: &str) -> Result<()> {
            self.0.set_text(text)
        }
        fn get_image(&mut self, format: ImageFormat) -> Result<Option<Image>> {
            self.0.get_image(format)
        }
        fn set_image(&mut self, image: Image) -> Result<()> {
            self.0.set_image(image)
        }
    }

    #[test]
    fn test_introspection() {
        let cb = clipboard(BackendKind::Gtk);
        assert_eq!(cb.kind(), BackendKind::Gtk);
        assert_eq!(cb.native_format(), ImageFormat::Pixbuf);
        assert_eq!(cb.native_type(), "GdkPixbuf.Pixbuf");

        let cb = clipboard(BackendKind::Win32);
        assert_eq!(cb.native_format(), ImageFormat::Generic);
        assert!(!cb.supports_alpha());
    }

    #[test]
    fn test_text_round_trip_every_backend() {
        for kind in BackendKind::ALL {
            let mut cb = clipboard(kind);
            cb.set_text("Hello World").unwrap();
            assert_eq!(cb.get_text().unwrap().as_deref(), Some("Hello World"), "{}", kind);
        }
    }

    #[test]
    fn test_rgb_image_round_trip_every_backend() {
        let image = test_images::rgb(100, 100);
        for kind in BackendKind::ALL {
            let mut cb = clipboard(kind);
            cb.set_image(Image::Generic(image.clone()), false).unwrap();
            let back = cb.get_image(false).unwrap().and_then(Image::into_generic);
            assert_eq!(back.as_ref(), Some(&image), "{}", kind);
        }
    }

    #[test]
    fn test_native_image_round_trip() {
        for kind in [BackendKind::Gtk, BackendKind::Qt, BackendKind::AppKit] {
            let mut cb = clipboard(kind);
            cb.set_image(test_images::rgba(20, 10).into(), false).unwrap();

            let native = cb.get_image(true).unwrap().unwrap();
            assert_eq!(native.format(), kind.native_format());

            cb.set_text("overwritten").unwrap();
            cb.set_image(native, true).unwrap();
            let back = cb.get_image(false).unwrap().and_then(Image::into_generic);
            assert_eq!(back, Some(test_images::rgba(20, 10)), "{}", kind);
        }
    }

    #[test]
    fn test_set_image_checks_representation() {
        let mut cb = clipboard(BackendKind::Qt);
        let generic = Image::Generic(test_images::rgb(4, 4));
        assert!(matches!(
            cb.set_image(generic, true),
            Err(ClipboardError::InvalidImageType {
                expected: ImageFormat::QImage,
                found: ImageFormat::Generic,
            })
        ));
        assert_eq!(cb.get_image(false).unwrap(), None);
    }

    #[test]
    fn test_get_image_as() {
        let mut cb = clipboard(BackendKind::AppKit);
        cb.set_image(test_images::rgb(8, 8).into(), false).unwrap();

        let item = cb.get_image_as("ns-pasteboard").unwrap().unwrap();
        assert_eq!(item.format(), ImageFormat::Pasteboard);
        let generic = cb.get_image_as("generic").unwrap().unwrap();
        assert_eq!(generic.format(), ImageFormat::Generic);

        assert!(matches!(
            cb.get_image_as("bogus"),
            Err(ClipboardError::UnsupportedImageFormat(ref f)) if f == "bogus"
        ));
        assert!(matches!(
            cb.get_image_as("qimage"),
            Err(ClipboardError::UnsupportedImageFormat(_))
        ));
    }

    #[test]
    fn test_empty_clipboard() {
        let mut cb = clipboard(BackendKind::Gtk);
        assert_eq!(cb.get_text().unwrap(), None);
        assert_eq!(cb.get_image(true).unwrap(), None);
    }

    #[test]
    fn test_rejects_inconsistent_backend() {
        let impostor = Impostor(GtkBackend::new(MemoryClipboard::new()));
        let err = Clipboard::from_backend(Box::new(impostor)).unwrap_err();
        assert!(matches!(err, ClipboardError::InvalidBackend(_)));
    }
}
