use super::backend::{ClipboardBackend, NativeClipboard, check_requested_format, invalid_image};
use crate::error::Result;
use crate::image::{Image, ImageConverter, ImageFormat, Pixbuf, PixbufConverter};
use crate::platform::BackendKind;

#[cfg(feature = "gtk")]
pub use gdk_display::GdkClipboard;

/// GTK clipboard backend
/// Native images are pixbufs; generic images are converted honouring rowstride
pub struct GtkBackend<C> {
    clipboard: C,
    converter: PixbufConverter,
}

impl<C> GtkBackend<C>
where
    C: NativeClipboard<Image = Pixbuf>,
{
    pub fn new(clipboard: C) -> Self {
        log::debug!("GtkBackend initialized");
        GtkBackend {
            clipboard,
            converter: PixbufConverter,
        }
    }

    /// Access the underlying clipboard handle
    pub fn handle(&self) -> &C {
        &self.clipboard
    }
}

impl<C> ClipboardBackend for GtkBackend<C>
where
    C: NativeClipboard<Image = Pixbuf>,
{
    fn kind(&self) -> BackendKind {
        BackendKind::Gtk
    }

    fn native_format(&self) -> ImageFormat {
        ImageFormat::Pixbuf
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
        log::debug!("Wrote {} bytes text to GTK clipboard", text.len());
        Ok(())
    }

    fn get_image(&mut self, format: ImageFormat) -> Result<Option<Image>> {
        check_requested_format(format, ImageFormat::Pixbuf)?;

        let Some(pixbuf) = self.clipboard.read_image()? else {
            return Ok(None);
        };
        log::debug!(
            "Read {}x{} pixbuf (rowstride {}, alpha {})",
            pixbuf.width,
            pixbuf.height,
            pixbuf.rowstride,
            pixbuf.has_alpha
        );

        match format {
            ImageFormat::Pixbuf => Ok(Some(Image::Pixbuf(pixbuf))),
            _ => Ok(Some(Image::Generic(self.converter.to_generic(&pixbuf)?))),
        }
    }

    fn set_image(&mut self, image: Image) -> Result<()> {
        let pixbuf = match image {
            Image::Pixbuf(pixbuf) => {
                pixbuf.validate()?;
                pixbuf
            }
            Image::Generic(generic) => self.converter.from_generic(&generic)?,
            other => return Err(invalid_image(ImageFormat::Pixbuf, &other)),
        };
        log::debug!("Writing {}x{} pixbuf to GTK clipboard", pixbuf.width, pixbuf.height);
        self.clipboard.write_image(pixbuf)
    }
}

#[cfg(feature = "gtk")]
mod gdk_display {
    use gtk::gdk_pixbuf::{self, Colorspace};
    use gtk::glib;

    use crate::clipboard::backend::NativeClipboard;
    use crate::error::{ClipboardError, Result};
    use crate::image::Pixbuf;
    use crate::platform::BackendKind;

    /// Clipboard of a GDK display
    /// Reference counted by GTK, so there is nothing to release explicitly
    pub struct GdkClipboard {
        clipboard: gtk::Clipboard,
    }

    impl GdkClipboard {
        /// Initialize GTK and take the clipboard of the default display
        pub fn from_default_display() -> Result<Self> {
            gtk::init().map_err(|e| ClipboardError::missing(BackendKind::Gtk, e.to_string()))?;
            let display = gtk::gdk::Display::default().ok_or_else(|| {
                ClipboardError::missing(BackendKind::Gtk, "no default GDK display")
            })?;
            Self::for_display(&display)
        }

        pub fn for_display(display: &gtk::gdk::Display) -> Result<Self> {
            let clipboard = gtk::Clipboard::default(display).ok_or_else(|| {
                ClipboardError::missing(BackendKind::Gtk, "display has no default clipboard")
            })?;
            Ok(GdkClipboard { clipboard })
        }
    }

    impl NativeClipboard for GdkClipboard {
        type Image = Pixbuf;

        fn read_text(&mut self) -> Result<Option<String>> {
            Ok(self.clipboard.wait_for_text().map(|text| text.to_string()))
        }

        fn write_text(&mut self, text: &str) -> Result<()> {
            self.clipboard.set_text(text);
            // Hand the content to the clipboard manager so it outlives us
            self.clipboard.store();
            Ok(())
        }

        fn read_image(&mut self) -> Result<Option<Pixbuf>> {
            Ok(self.clipboard.wait_for_image().map(|p| from_gdk(&p)))
        }

        fn write_image(&mut self, image: Pixbuf) -> Result<()> {
            let pixbuf = to_gdk(image)?;
            self.clipboard.set_image(&pixbuf);
            self.clipboard.store();
            Ok(())
        }
    }

    fn from_gdk(pixbuf: &gdk_pixbuf::Pixbuf) -> Pixbuf {
        Pixbuf {
            width: pixbuf.width().max(0) as u32,
            height: pixbuf.height().max(0) as u32,
            rowstride: pixbuf.rowstride().max(0) as usize,
            has_alpha: pixbuf.has_alpha(),
            bits_per_sample: pixbuf.bits_per_sample().clamp(0, 255) as u8,
            pixels: pixbuf.read_pixel_bytes().to_vec(),
        }
    }

    fn to_gdk(image: Pixbuf) -> Result<gdk_pixbuf::Pixbuf> {
        image.validate()?;
        if image.width == 0 || image.height == 0 {
            return Err(ClipboardError::InvalidImageData(
                "GDK cannot hold an empty pixbuf".to_string(),
            ));
        }
        let dim = |value: usize, what: &str| {
            i32::try_from(value).map_err(|_| {
                ClipboardError::InvalidImageData(format!("pixbuf {} {} out of range", what, value))
            })
        };
        let width = dim(image.width as usize, "width")?;
        let height = dim(image.height as usize, "height")?;
        let rowstride = dim(image.rowstride, "rowstride")?;

        Ok(gdk_pixbuf::Pixbuf::from_bytes(
            &glib::Bytes::from_owned(image.pixels),
            Colorspace::Rgb,
            image.has_alpha,
            i32::from(image.bits_per_sample),
            width,
            height,
            rowstride,
        ))
    }
}
