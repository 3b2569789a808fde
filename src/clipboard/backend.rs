use crate::error::{ClipboardError, Result};
use crate::image::{Image, ImageFormat};
use crate::platform::BackendKind;

/// Trait for clipboard backend abstraction
/// One implementation per platform toolkit (GTK, Qt, AppKit, Win32)
/// Every call is a blocking round trip to the live clipboard; nothing is cached
pub trait ClipboardBackend {
    /// Which backend this is
    fn kind(&self) -> BackendKind;

    /// Image format handed out when native images are requested
    fn native_format(&self) -> ImageFormat;

    /// Name of the toolkit type behind the native format
    fn native_type(&self) -> &'static str;

    /// False when images lose their alpha channel on the way through
    fn supports_alpha(&self) -> bool;

    /// Read text from the clipboard, `None` if it holds no text
    fn get_text(&mut self) -> Result<Option<String>>;

    /// Replace the clipboard content with text
    fn set_text(&mut self, text: &str) -> Result<()>;

    /// Read an image as `format` (generic or this backend's native format)
    /// Returns `None` if the clipboard holds no image
    fn get_image(&mut self, format: ImageFormat) -> Result<Option<Image>>;

    /// Replace the clipboard content with an image
    /// Accepts generic images and this backend's native images
    fn set_image(&mut self, image: Image) -> Result<()>;

    /// Get the backend name (for logging/debugging)
    fn name(&self) -> &'static str {
        self.kind().name()
    }
}

/// Thin boundary to a toolkit's clipboard object
///
/// Backends own one handle each; it is acquired when the backend is built and
/// released when it is dropped.
pub trait NativeClipboard {
    /// Image representation the toolkit reads and writes
    type Image;

    fn read_text(&mut self) -> Result<Option<String>>;

    fn write_text(&mut self, text: &str) -> Result<()>;

    fn read_image(&mut self) -> Result<Option<Self::Image>>;

    fn write_image(&mut self, image: Self::Image) -> Result<()>;
}

/// Reject formats other than generic and `native` before touching the clipboard
pub(crate) fn check_requested_format(requested: ImageFormat, native: ImageFormat) -> Result<()> {
    if requested == ImageFormat::Generic || requested == native {
        Ok(())
    } else {
        Err(ClipboardError::UnsupportedImageFormat(requested.to_string()))
    }
}

/// Error for an image that is neither generic nor the backend's native type
pub(crate) fn invalid_image(native: ImageFormat, image: &Image) -> ClipboardError {
    ClipboardError::InvalidImageType {
        expected: native,
        found: image.format(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_requested_format() {
        assert!(check_requested_format(ImageFormat::Generic, ImageFormat::Pixbuf).is_ok());
        assert!(check_requested_format(ImageFormat::Pixbuf, ImageFormat::Pixbuf).is_ok());
        assert!(matches!(
            check_requested_format(ImageFormat::QImage, ImageFormat::Pixbuf),
            Err(ClipboardError::UnsupportedImageFormat(ref f)) if f == "qimage"
        ));
    }
}
