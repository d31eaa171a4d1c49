//! Core value types shared across modules

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position and size of a window in absolute root coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// A window can't be configured to zero width or height
    pub fn has_area(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Fits ConfigureWindow as sent: INT16 position, non-zero CARD16 size
    pub fn is_configurable(&self) -> bool {
        self.has_area()
            && i16::try_from(self.x).is_ok()
            && i16::try_from(self.y).is_ok()
            && u16::try_from(self.width).is_ok()
            && u16::try_from(self.height).is_ok()
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Whether the target window currently holds input focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusState {
    Focused,
    Blurred,
}

impl FocusState {
    pub fn is_focused(self) -> bool {
        matches!(self, FocusState::Focused)
    }
}

impl From<bool> for FocusState {
    fn from(focused: bool) -> Self {
        if focused {
            FocusState::Focused
        } else {
            FocusState::Blurred
        }
    }
}

/// Border drawn inside the target window while it is blurred
///
/// `Display` renders the CSS shorthand (`none` or `2px solid #FF5733`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BorderStyle {
    None,
    Solid { width: u32, color: String },
}

impl fmt::Display for BorderStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BorderStyle::None => f.write_str("none"),
            BorderStyle::Solid { width, color } => write!(f, "{width}px solid {color}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_border_style_css() {
        assert_eq!(BorderStyle::None.to_string(), "none");
        let solid = BorderStyle::Solid { width: 0, color: "rebeccapurple".to_string() };
        assert_eq!(solid.to_string(), "0px solid rebeccapurple");
    }

    #[test]
    fn test_focus_state_from_bool() {
        assert_eq!(FocusState::from(true), FocusState::Focused);
        assert_eq!(FocusState::from(false), FocusState::Blurred);
        assert!(FocusState::Focused.is_focused());
    }

    #[test]
    fn test_bounds_area() {
        assert!(Bounds::new(0, 0, 1, 1).has_area());
        assert!(!Bounds::new(10, 10, 0, 600).has_area());
        assert_eq!(Bounds::new(-5, 20, 800, 600).to_string(), "800x600+-5+20");
    }

    #[test]
    fn test_bounds_configurable_range() {
        assert!(Bounds::new(-32768, 32767, 65535, 1).is_configurable());
        assert!(!Bounds::new(40000, 100, 800, 600).is_configurable());
        assert!(!Bounds::new(0, -40000, 800, 600).is_configurable());
        assert!(!Bounds::new(0, 0, 70000, 600).is_configurable());
        assert!(!Bounds::new(0, 0, 800, 0).is_configurable());
    }
}
