//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// X11 protocol constants
pub mod x11 {
    /// Override redirect flag for unmanaged windows
    pub const OVERRIDE_REDIRECT: u32 = 1;

    /// `_NET_WM_STATE` client message action: remove the property
    pub const NET_WM_STATE_REMOVE: u32 = 0;

    /// `_NET_WM_STATE` client message action: add the property
    pub const NET_WM_STATE_ADD: u32 = 1;

    /// Source indication for EWMH client messages (1 = normal application)
    pub const SOURCE_APPLICATION: u32 = 1;

    /// `_NET_WM_WINDOW_OPACITY` value for a fully opaque window
    pub const OPAQUE: u32 = u32::MAX;

    /// WM_CLASS set on the border overlay windows
    pub const OVERLAY_CLASS: &[u8] = b"focus-veil-border\0focus-veil\0";
}

/// Built-in settings defaults
pub mod defaults {
    use crate::types::Bounds;

    pub const ENABLE_OPACITY_CHANGE: bool = true;
    pub const FOCUS_OPACITY: f64 = 1.0;
    pub const BLUR_OPACITY: f64 = 0.5;

    pub const ENABLE_WINDOW_RESIZE: bool = false;
    pub const FOCUS_BOUNDS: Bounds = Bounds::new(100, 100, 800, 600);
    pub const BLUR_BOUNDS: Bounds = Bounds::new(150, 150, 700, 500);

    pub const ENABLE_BORDER: bool = true;
    pub const BORDER_COLOR: &str = "#FF5733";
    pub const BORDER_WIDTH: u32 = 2;

    /// Geometry restored on deactivation, independent of user settings
    pub const RESET_BOUNDS: Bounds = FOCUS_BOUNDS;

    /// Opacity restored on deactivation
    pub const RESET_OPACITY: f64 = 1.0;
}

/// Settings storage locations
pub mod storage {
    /// Directory under the platform config dir
    pub const APP_DIR: &str = "focus-veil";

    /// Identity of the settings blob within the app dir
    pub const PLUGIN_ID: &str = "always-on-top";

    /// Settings document filename
    pub const FILENAME: &str = "data.json";
}

/// Control socket (daemon <-> settings window)
pub mod ipc {
    /// Socket directory name under the runtime dir
    pub const SOCKET_DIR: &str = "focus-veil";

    /// Socket filename
    pub const SOCKET_NAME: &str = "control.sock";

    /// Maximum message size (1 MB); the largest payload is one settings document
    pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

    /// Per-connection read/write timeout in milliseconds
    pub const IO_TIMEOUT_MS: u64 = 1000;
}

/// Daemon event loop
pub mod daemon {
    /// poll() timeout so the shutdown flag is observed promptly
    pub const POLL_TIMEOUT_MS: u16 = 200;
}
