pub mod appkit;
pub mod backend;
pub mod frontend;
pub mod gtk;
pub mod memory;
pub mod qt;
pub mod watch;
pub mod win32;

use crate::error::{ClipboardError, Result};
use crate::platform::BackendKind;

pub use appkit::AppKitBackend;
pub use backend::{ClipboardBackend, NativeClipboard};
pub use frontend::Clipboard;
pub use gtk::GtkBackend;
pub use memory::MemoryClipboard;
pub use qt::QtBackend;
pub use watch::{ClipboardEvent, ClipboardWatcher};
pub use win32::Win32Backend;

/// Create the backend for `kind` on top of the live system clipboard
/// Returns `MissingPlatformDependency` when this build lacks the binding
/// or the toolkit refuses to initialize
pub fn create_backend(kind: BackendKind) -> Result<Box<dyn ClipboardBackend>> {
    crate::platform::ensure_available(kind)?;

    let backend = match kind {
        BackendKind::Gtk => gtk_backend()?,
        BackendKind::Qt => qt_backend()?,
        BackendKind::AppKit => appkit_backend()?,
        BackendKind::Win32 => win32_backend()?,
    };
    log::info!(
        "Created {} backend (native type {})",
        backend.name(),
        backend.native_type()
    );
    Ok(backend)
}

/// Create an in-memory backend of the given kind, usable without a display
pub fn create_memory_backend(kind: BackendKind) -> Box<dyn ClipboardBackend> {
    match kind {
        BackendKind::Gtk => Box::new(GtkBackend::new(MemoryClipboard::new())),
        BackendKind::Qt => Box::new(QtBackend::new(MemoryClipboard::new())),
        BackendKind::AppKit => Box::new(AppKitBackend::new(MemoryClipboard::new())),
        BackendKind::Win32 => Box::new(Win32Backend::new(MemoryClipboard::new())),
    }
}

fn not_compiled_in(kind: BackendKind) -> ClipboardError {
    ClipboardError::missing(kind, "binding not compiled into this build")
}

#[cfg(feature = "gtk")]
fn gtk_backend() -> Result<Box<dyn ClipboardBackend>> {
    let clipboard = gtk::GdkClipboard::from_default_display()?;
    Ok(Box::new(GtkBackend::new(clipboard)))
}

#[cfg(not(feature = "gtk"))]
fn gtk_backend() -> Result<Box<dyn ClipboardBackend>> {
    Err(not_compiled_in(BackendKind::Gtk))
}

#[cfg(all(feature = "qt", target_os = "linux"))]
fn qt_backend() -> Result<Box<dyn ClipboardBackend>> {
    let clipboard = qt::SelectionClipboard::open()?;
    Ok(Box::new(QtBackend::new(clipboard)))
}

#[cfg(not(all(feature = "qt", target_os = "linux")))]
fn qt_backend() -> Result<Box<dyn ClipboardBackend>> {
    Err(not_compiled_in(BackendKind::Qt))
}

#[cfg(target_os = "macos")]
fn appkit_backend() -> Result<Box<dyn ClipboardBackend>> {
    let pasteboard = appkit::GeneralPasteboard::open()?;
    Ok(Box::new(AppKitBackend::new(pasteboard)))
}

#[cfg(not(target_os = "macos"))]
fn appkit_backend() -> Result<Box<dyn ClipboardBackend>> {
    Err(not_compiled_in(BackendKind::AppKit))
}

#[cfg(windows)]
fn win32_backend() -> Result<Box<dyn ClipboardBackend>> {
    let session = win32::Win32Session::open()?;
    Ok(Box::new(Win32Backend::new(session)))
}

#[cfg(not(windows))]
fn win32_backend() -> Result<Box<dyn ClipboardBackend>> {
    Err(not_compiled_in(BackendKind::Win32))
}
