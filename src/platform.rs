//! Backend selection from the runtime environment
//!
//! The operating system decides the backend, except on Linux where the
//! desktop environment (`XDG_CURRENT_DESKTOP`) picks between GTK and Qt
//! through a fixed allow-list. There is no fallback chain.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

use crate::error::{ClipboardError, Result};
use crate::image::ImageFormat;

/// Desktops whose clipboard is served through GTK
const GTK_DESKTOPS: &[&str] = &["MATE", "GNOME", "X-Cinnamon", "LXDE", "XFCE", "Unity"];

/// Desktops whose clipboard is served through Qt
const QT_DESKTOPS: &[&str] = &["LXQt", "KDE"];

/// The clipboard backends this crate knows how to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Gtk,
    Qt,
    #[serde(rename = "appkit")]
    AppKit,
    Win32,
}

impl BackendKind {
    pub const ALL: [BackendKind; 4] = [
        BackendKind::Gtk,
        BackendKind::Qt,
        BackendKind::AppKit,
        BackendKind::Win32,
    ];

    /// Short identifier used in config files and on the command line
    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Gtk => "gtk",
            BackendKind::Qt => "qt",
            BackendKind::AppKit => "appkit",
            BackendKind::Win32 => "win32",
        }
    }

    /// Image representation this backend hands out when asked for native images
    pub fn native_format(self) -> ImageFormat {
        match self {
            BackendKind::Gtk => ImageFormat::Pixbuf,
            BackendKind::Qt => ImageFormat::QImage,
            BackendKind::AppKit => ImageFormat::Pasteboard,
            // Win32 has no distinct native type
            BackendKind::Win32 => ImageFormat::Generic,
        }
    }

    /// Whether this build carries the native binding for the backend
    pub fn is_compiled_in(self) -> bool {
        match self {
            BackendKind::Gtk => cfg!(feature = "gtk"),
            BackendKind::Qt => cfg!(all(feature = "qt", target_os = "linux")),
            BackendKind::AppKit => cfg!(target_os = "macos"),
            BackendKind::Win32 => cfg!(windows),
        }
    }

    fn unavailable_reason(self) -> &'static str {
        match self {
            BackendKind::Gtk => "crossclip was built without the `gtk` feature",
            BackendKind::Qt => "crossclip was built without the `qt` feature",
            BackendKind::AppKit => "the AppKit pasteboard is only available on macOS",
            BackendKind::Win32 => "the Win32 clipboard is only available on Windows",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        BackendKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("unknown backend '{}' (expected gtk, qt, appkit or win32)", s)
            })
    }
}

/// Operating system families the selector distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Linux,
    MacOs,
    Windows,
    Other,
}

impl OsFamily {
    /// Map an identifier as reported by `std::env::consts::OS`
    pub fn from_identifier(os: &str) -> Self {
        match os {
            "linux" => OsFamily::Linux,
            "macos" => OsFamily::MacOs,
            "windows" => OsFamily::Windows,
            _ => OsFamily::Other,
        }
    }
}

/// What the process knows about where it runs, captured once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformIdentity {
    os: String,
    desktop: Option<String>,
}

impl PlatformIdentity {
    pub fn new(os: impl Into<String>, desktop: Option<String>) -> Self {
        PlatformIdentity {
            os: os.into(),
            desktop,
        }
    }

    /// Read the identity of the current process
    /// The desktop variable is only consulted on Linux
    pub fn detect() -> Self {
        let os = env::consts::OS;
        let desktop = match OsFamily::from_identifier(os) {
            OsFamily::Linux => env::var("XDG_CURRENT_DESKTOP").ok(),
            _ => None,
        };
        log::debug!("Platform identity: os={}, desktop={:?}", os, desktop);
        PlatformIdentity::new(os, desktop)
    }

    pub fn os(&self) -> &str {
        &self.os
    }

    pub fn os_family(&self) -> OsFamily {
        OsFamily::from_identifier(&self.os)
    }

    pub fn desktop(&self) -> Option<&str> {
        self.desktop.as_deref()
    }
}

/// Map a desktop environment value onto GTK or Qt
///
/// `XDG_CURRENT_DESKTOP` is a colon separated list (e.g. `ubuntu:GNOME`);
/// the first entry on either allow-list wins.
pub fn desktop_backend(desktop: Option<&str>) -> Result<BackendKind> {
    let entries = desktop.into_iter().flat_map(|value| value.split(':'));

    for entry in entries {
        let entry = entry.trim();
        if GTK_DESKTOPS.contains(&entry) {
            return Ok(BackendKind::Gtk);
        }
        if QT_DESKTOPS.contains(&entry) {
            return Ok(BackendKind::Qt);
        }
    }

    Err(ClipboardError::UnsupportedDesktopEnvironment(
        desktop.map(str::to_string),
    ))
}

/// Decide which backend the identity calls for, ignoring what this build carries
pub fn backend_for(identity: &PlatformIdentity) -> Result<BackendKind> {
    match identity.os_family() {
        OsFamily::Linux => desktop_backend(identity.desktop()),
        OsFamily::MacOs => Ok(BackendKind::AppKit),
        OsFamily::Windows => Ok(BackendKind::Win32),
        OsFamily::Other => Err(ClipboardError::UnsupportedPlatform(identity.os.clone())),
    }
}

/// Select the backend for this process
/// Fails if the identity is unsupported or the binding is not part of this build
pub fn select_backend(identity: &PlatformIdentity) -> Result<BackendKind> {
    let kind = backend_for(identity)?;
    ensure_available(kind)?;
    log::info!("Selected {} clipboard backend", kind);
    Ok(kind)
}

/// Fail with `MissingPlatformDependency` if `kind` is not compiled in
pub fn ensure_available(kind: BackendKind) -> Result<()> {
    if kind.is_compiled_in() {
        Ok(())
    } else {
        Err(ClipboardError::missing(kind, kind.unavailable_reason()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linux(desktop: Option<&str>) -> PlatformIdentity {
        PlatformIdentity::new("linux", desktop.map(str::to_string))
    }

    #[test]
    fn test_gtk_desktops() {
        for desktop in ["MATE", "GNOME", "X-Cinnamon", "LXDE", "XFCE", "Unity"] {
            assert_eq!(
                backend_for(&linux(Some(desktop))).unwrap(),
                BackendKind::Gtk,
                "{}",
                desktop
            );
        }
    }

    #[test]
    fn test_qt_desktops() {
        assert_eq!(backend_for(&linux(Some("KDE"))).unwrap(), BackendKind::Qt);
        assert_eq!(backend_for(&linux(Some("LXQt"))).unwrap(), BackendKind::Qt);
    }

    #[test]
    fn test_colon_separated_desktop() {
        assert_eq!(
            backend_for(&linux(Some("ubuntu:GNOME"))).unwrap(),
            BackendKind::Gtk
        );
        assert_eq!(
            backend_for(&linux(Some("Budgie:KDE:GNOME"))).unwrap(),
            BackendKind::Qt
        );
    }

    #[test]
    fn test_unsupported_desktop() {
        let err = select_backend(&linux(Some("sway"))).unwrap_err();
        assert!(matches!(
            err,
            ClipboardError::UnsupportedDesktopEnvironment(Some(ref d)) if d == "sway"
        ));

        // Matching is exact: lowercase names are not on the allow-list
        assert!(matches!(
            backend_for(&linux(Some("gnome"))),
            Err(ClipboardError::UnsupportedDesktopEnvironment(_))
        ));

        assert!(matches!(
            backend_for(&linux(None)),
            Err(ClipboardError::UnsupportedDesktopEnvironment(None))
        ));
    }

    #[test]
    fn test_os_mapping() {
        let mac = PlatformIdentity::new("macos", None);
        assert_eq!(backend_for(&mac).unwrap(), BackendKind::AppKit);

        let windows = PlatformIdentity::new("windows", Some("ignored".to_string()));
        assert_eq!(backend_for(&windows).unwrap(), BackendKind::Win32);

        let other = PlatformIdentity::new("freebsd", Some("KDE".to_string()));
        assert!(matches!(
            backend_for(&other),
            Err(ClipboardError::UnsupportedPlatform(ref os)) if os == "freebsd"
        ));
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_missing_appkit_binding() {
        let mac = PlatformIdentity::new("macos", None);
        assert!(matches!(
            select_backend(&mac),
            Err(ClipboardError::MissingPlatformDependency {
                backend: BackendKind::AppKit,
                ..
            })
        ));
    }

    #[cfg(not(feature = "gtk"))]
    #[test]
    fn test_missing_gtk_binding() {
        assert!(matches!(
            select_backend(&linux(Some("GNOME"))),
            Err(ClipboardError::MissingPlatformDependency {
                backend: BackendKind::Gtk,
                ..
            })
        ));
    }

    #[test]
    fn test_backend_kind_names() {
        for kind in BackendKind::ALL {
            assert_eq!(kind.name().parse::<BackendKind>().unwrap(), kind);
        }
        assert_eq!("AppKit".parse::<BackendKind>().unwrap(), BackendKind::AppKit);
        assert!("wayland".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_native_formats() {
        assert_eq!(BackendKind::Gtk.native_format(), ImageFormat::Pixbuf);
        assert_eq!(BackendKind::Qt.native_format(), ImageFormat::QImage);
        assert_eq!(BackendKind::AppKit.native_format(), ImageFormat::Pasteboard);
        assert_eq!(BackendKind::Win32.native_format(), ImageFormat::Generic);
    }
}
