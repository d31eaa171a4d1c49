//! GUI-specific constants for layout, status colors and intervals

/// Settings window dimensions
pub const WINDOW_WIDTH: f32 = 460.0;
pub const WINDOW_HEIGHT: f32 = 640.0;
pub const WINDOW_MIN_WIDTH: f32 = 380.0;
pub const WINDOW_MIN_HEIGHT: f32 = 420.0;

/// Layout spacing
pub const PADDING: f32 = 10.0;
pub const SECTION_SPACING: f32 = 15.0;
pub const ITEM_SPACING: f32 = 8.0;
pub const FIELD_WIDTH: f32 = 120.0;

/// Status colors
pub const STATUS_OK: egui::Color32 = egui::Color32::from_rgb(0, 200, 0);
pub const STATUS_ERROR: egui::Color32 = egui::Color32::from_rgb(200, 0, 0);
pub const STATUS_INFO: egui::Color32 = egui::Color32::from_rgb(200, 200, 0);

/// Daemon monitoring
pub const DAEMON_CHECK_INTERVAL_MS: u64 = 1000;
