//! crossclip - cross-platform clipboard access
//!
//! One API over the native clipboards of GTK and Qt desktops, macOS and
//! Windows. Text and images are supported; images can be exchanged as generic
//! images or as the toolkit's own image type.

pub mod clipboard;
pub mod error;
pub mod image;
pub mod logging;
pub mod platform;
pub mod storage;

pub use clipboard::{Clipboard, ClipboardBackend, ClipboardEvent, ClipboardWatcher};
pub use error::{ClipboardError, Result};
pub use image::{GenericImage, Image, ImageFormat};
pub use platform::{BackendKind, PlatformIdentity};
