use super::backend::{ClipboardBackend, NativeClipboard, check_requested_format, invalid_image};
use crate::error::Result;
use crate::image::{Dib, DibConverter, Image, ImageConverter, ImageFormat};
use crate::platform::BackendKind;

#[cfg(windows)]
pub use session::Win32Session;

/// Win32 clipboard backend
///
/// There is no distinct native image type: callers always get generic images.
/// Bitmaps are stored as 24-bit `CF_DIB`, so alpha is lost on write.
pub struct Win32Backend<C> {
    clipboard: C,
    converter: DibConverter,
}

impl<C> Win32Backend<C>
where
    C: NativeClipboard<Image = Dib>,
{
    pub fn new(clipboard: C) -> Self {
        log::debug!("Win32Backend initialized");
        Win32Backend {
            clipboard,
            converter: DibConverter,
        }
    }
}

impl<C> ClipboardBackend for Win32Backend<C>
where
    C: NativeClipboard<Image = Dib>,
{
    fn kind(&self) -> BackendKind {
        BackendKind::Win32
    }

    fn native_format(&self) -> ImageFormat {
        ImageFormat::Generic
    }

    fn native_type(&self) -> &'static str {
        "DynamicImage"
    }

    fn supports_alpha(&self) -> bool {
        false
    }

    fn get_text(&mut self) -> Result<Option<String>> {
        self.clipboard.read_text()
    }

    fn set_text(&mut self, text: &str) -> Result<()> {
        self.clipboard.write_text(text)
    }

    fn get_image(&mut self, format: ImageFormat) -> Result<Option<Image>> {
        check_requested_format(format, ImageFormat::Generic)?;

        match self.clipboard.read_image()? {
            Some(dib) => Ok(Some(Image::Generic(self.converter.to_generic(&dib)?))),
            None => Ok(None),
        }
    }

    fn set_image(&mut self, image: Image) -> Result<()> {
        let generic = match image {
            Image::Generic(generic) => generic,
            other => return Err(invalid_image(ImageFormat::Generic, &other)),
        };
        let dib = self.converter.from_generic(&generic)?;
        log::debug!("Writing {} bytes CF_DIB to Win32 clipboard", dib.as_bytes().len());
        self.clipboard.write_image(dib)
    }
}

#[cfg(windows)]
mod session {
    use clipboard_win::{Clipboard, Getter, Setter, formats, raw};

    use crate::clipboard::backend::NativeClipboard;
    use crate::error::{ClipboardError, Result};
    use crate::image::Dib;
    use crate::platform::BackendKind;

    /// Attempts made to open the clipboard while another process holds it
    const OPEN_ATTEMPTS: usize = 10;

    fn native(err: impl std::fmt::Display) -> ClipboardError {
        ClipboardError::native(BackendKind::Win32, err)
    }

    /// Clipboard session, opened on construction and closed on drop
    pub struct Win32Session {
        _clipboard: Clipboard,
    }

    impl Win32Session {
        pub fn open() -> Result<Self> {
            let clipboard = Clipboard::new_attempts(OPEN_ATTEMPTS).map_err(native)?;
            Ok(Win32Session {
                _clipboard: clipboard,
            })
        }
    }

    impl NativeClipboard for Win32Session {
        type Image = Dib;

        fn read_text(&mut self) -> Result<Option<String>> {
            if !raw::is_format_avail(formats::CF_UNICODETEXT) {
                return Ok(None);
            }
            let mut text = String::new();
            formats::Unicode
                .read_clipboard(&mut text)
                .map_err(native)?;
            Ok(Some(text))
        }

        fn write_text(&mut self, text: &str) -> Result<()> {
            raw::empty().map_err(native)?;
            formats::Unicode.write_clipboard(&text).map_err(native)
        }

        fn read_image(&mut self) -> Result<Option<Dib>> {
            if !raw::is_format_avail(formats::CF_DIB) {
                return Ok(None);
            }
            let mut bytes = Vec::new();
            raw::get_vec(formats::CF_DIB, &mut bytes).map_err(native)?;
            Ok(Some(Dib::new(bytes)))
        }

        fn write_image(&mut self, dib: Dib) -> Result<()> {
            raw::empty().map_err(native)?;
            raw::set(formats::CF_DIB, dib.as_bytes()).map_err(native)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::MemoryClipboard;
    use crate::error::ClipboardError;
    use crate::image::{GenericImage, test_images};

    fn backend() -> Win32Backend<MemoryClipboard<Dib>> {
        Win32Backend::new(MemoryClipboard::new())
    }

    #[test]
    fn test_text_round_trip() {
        let mut win = backend();
        win.set_text("Hello World").unwrap();
        assert_eq!(win.get_text().unwrap().as_deref(), Some("Hello World"));
    }

    #[test]
    fn test_rgb_image_round_trip() {
        let mut win = backend();
        let image = test_images::rgb(100, 100);
        win.set_image(Image::Generic(image.clone())).unwrap();
        let back = win.get_image(ImageFormat::Generic).unwrap().unwrap();
        assert_eq!(back.into_generic(), Some(image));
    }

    #[test]
    fn test_rgba_image_loses_alpha() {
        let mut win = backend();
        assert!(!win.supports_alpha());

        let image = test_images::rgba(100, 100);
        win.set_image(Image::Generic(image.clone())).unwrap();
        let back = win
            .get_image(ImageFormat::Generic)
            .unwrap()
            .and_then(Image::into_generic)
            .unwrap();

        // Only comparable after widening back to RGBA, and then it differs
        let widened = GenericImage::ImageRgba8(back.to_rgba8());
        assert_ne!(widened, image);
    }

    #[test]
    fn test_generic_is_the_native_format() {
        let mut win = backend();
        assert_eq!(win.native_format(), ImageFormat::Generic);
        assert!(matches!(
            win.get_image(ImageFormat::Pasteboard),
            Err(ClipboardError::UnsupportedImageFormat(_))
        ));
        assert_eq!(win.get_image(ImageFormat::Generic).unwrap(), None);
    }
}
