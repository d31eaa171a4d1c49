//! Settings document
//!
//! One flat JSON object with camelCase keys. Loading overlays whatever was
//! saved onto the built-in defaults key by key, so documents written by an
//! older build (fewer keys) keep working.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::constants::defaults;
use crate::types::{Bounds, BorderStyle, FocusState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub enable_opacity_change: bool,
    pub focus_opacity: f64,
    pub blur_opacity: f64,

    pub enable_window_resize: bool,
    pub focus_bounds: Bounds,
    pub blur_bounds: Bounds,

    pub enable_border: bool,
    pub border_color: String,
    pub border_width: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_opacity_change: defaults::ENABLE_OPACITY_CHANGE,
            focus_opacity: defaults::FOCUS_OPACITY,
            blur_opacity: defaults::BLUR_OPACITY,
            enable_window_resize: defaults::ENABLE_WINDOW_RESIZE,
            focus_bounds: defaults::FOCUS_BOUNDS,
            blur_bounds: defaults::BLUR_BOUNDS,
            enable_border: defaults::ENABLE_BORDER,
            border_color: defaults::BORDER_COLOR.to_string(),
            border_width: defaults::BORDER_WIDTH,
        }
    }
}

impl Settings {
    /// Build settings from a persisted document.
    ///
    /// Each saved top-level key replaces the default wholesale (a saved
    /// `focusBounds` replaces all four default coordinates). Values that do
    /// not fit their field are dropped in favour of the default; unknown
    /// keys are ignored.
    pub fn from_document(saved: &Value) -> Result<Self> {
        let saved = saved
            .as_object()
            .ok_or_else(|| anyhow!("Settings document is not a JSON object"))?;

        let defaults = serde_json::to_value(Settings::default())
            .context("Failed to serialize default settings")?;
        let Value::Object(mut merged) = defaults else {
            anyhow::bail!("Default settings did not serialize to a JSON object");
        };

        for (key, value) in saved {
            if !merged.contains_key(key) {
                debug!(key = %key, "Ignoring unknown settings key");
                continue;
            }

            let mut candidate: Map<String, Value> = merged.clone();
            candidate.insert(key.clone(), value.clone());
            match serde_json::from_value::<Settings>(Value::Object(candidate.clone())) {
                Ok(_) => merged = candidate,
                Err(e) => {
                    warn!(key = %key, value = %value, error = %e, "Persisted value does not fit, keeping default");
                }
            }
        }

        let mut settings: Settings = serde_json::from_value(Value::Object(merged))
            .context("Failed to build settings from merged document")?;
        settings.validate_and_clamp();
        Ok(settings)
    }

    /// Serialize to the persisted document shape
    pub fn to_document(&self) -> Result<Value> {
        serde_json::to_value(self).context("Failed to serialize settings")
    }

    /// Clamp values a hand-edited document may carry out of range
    fn validate_and_clamp(&mut self) {
        for (name, opacity) in [
            ("focusOpacity", &mut self.focus_opacity),
            ("blurOpacity", &mut self.blur_opacity),
        ] {
            if !(0.0..=1.0).contains(&*opacity) {
                let clamped = opacity.clamp(0.0, 1.0);
                warn!(field = name, value = *opacity, clamped, "Opacity out of range, clamping");
                *opacity = clamped;
            }
        }

        for (name, bounds, fallback) in [
            ("focusBounds", &mut self.focus_bounds, defaults::FOCUS_BOUNDS),
            ("blurBounds", &mut self.blur_bounds, defaults::BLUR_BOUNDS),
        ] {
            if !bounds.is_configurable() {
                warn!(field = name, bounds = %bounds, using = %fallback, "Bounds can't be configured, using default");
                *bounds = fallback;
            }
        }
    }

    pub fn opacity_for(&self, focus: FocusState) -> f64 {
        match focus {
            FocusState::Focused => self.focus_opacity,
            FocusState::Blurred => self.blur_opacity,
        }
    }

    pub fn bounds_for(&self, focus: FocusState) -> Bounds {
        match focus {
            FocusState::Focused => self.focus_bounds,
            FocusState::Blurred => self.blur_bounds,
        }
    }

    pub fn border_for(&self, focus: FocusState) -> BorderStyle {
        if self.enable_border && !focus.is_focused() {
            BorderStyle::Solid {
                width: self.border_width,
                color: self.border_color.clone(),
            }
        } else {
            BorderStyle::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_document_yields_defaults() {
        let settings = Settings::from_document(&json!({})).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_border_color_override_only() {
        let settings = Settings::from_document(&json!({ "borderColor": "teal" })).unwrap();
        let expected = Settings {
            border_color: "teal".to_string(),
            ..Settings::default()
        };
        assert_eq!(settings, expected);
    }

    #[test]
    fn test_saved_bounds_replace_default_wholesale() {
        let doc = json!({ "blurBounds": { "x": 0, "y": 0, "width": 320, "height": 240 } });
        let settings = Settings::from_document(&doc).unwrap();
        assert_eq!(settings.blur_bounds, Bounds::new(0, 0, 320, 240));
        assert_eq!(settings.focus_bounds, defaults::FOCUS_BOUNDS);
    }

    #[test]
    fn test_partial_bounds_keep_default() {
        let doc = json!({ "focusBounds": { "x": 5 }, "borderWidth": 7 });
        let settings = Settings::from_document(&doc).unwrap();
        assert_eq!(settings.focus_bounds, defaults::FOCUS_BOUNDS);
        assert_eq!(settings.border_width, 7);
    }

    #[test]
    fn test_mistyped_and_unknown_keys_ignored() {
        let doc = json!({
            "borderWidth": -3,
            "focusOpacity": "high",
            "legacyFlag": true,
            "enableWindowResize": true,
        });
        let settings = Settings::from_document(&doc).unwrap();
        assert_eq!(settings.border_width, defaults::BORDER_WIDTH);
        assert_eq!(settings.focus_opacity, defaults::FOCUS_OPACITY);
        assert!(settings.enable_window_resize);
    }

    #[test]
    fn test_out_of_range_values_clamped() {
        let doc = json!({
            "focusOpacity": 1.7,
            "blurOpacity": -0.2,
            "blurBounds": { "x": 1, "y": 2, "width": 0, "height": 50 },
        });
        let settings = Settings::from_document(&doc).unwrap();
        assert_eq!(settings.focus_opacity, 1.0);
        assert_eq!(settings.blur_opacity, 0.0);
        assert_eq!(settings.blur_bounds, defaults::BLUR_BOUNDS);
    }

    #[test]
    fn test_bounds_past_protocol_limits_use_default() {
        let doc = json!({
            "focusBounds": { "x": 40000, "y": 100, "width": 800, "height": 600 },
            "blurBounds": { "x": 0, "y": 0, "width": 70000, "height": 600 },
        });
        let settings = Settings::from_document(&doc).unwrap();
        assert_eq!(settings.focus_bounds, defaults::FOCUS_BOUNDS);
        assert_eq!(settings.blur_bounds, defaults::BLUR_BOUNDS);

        let doc = json!({ "focusBounds": { "x": -32768, "y": 32767, "width": 65535, "height": 1 } });
        let settings = Settings::from_document(&doc).unwrap();
        assert_eq!(settings.focus_bounds, Bounds::new(-32768, 32767, 65535, 1));
    }

    #[test]
    fn test_non_object_document_rejected() {
        assert!(Settings::from_document(&json!([1, 2, 3])).is_err());
        assert!(Settings::from_document(&json!(null)).is_err());
    }

    #[test]
    fn test_document_uses_camel_case_keys() {
        let doc = Settings::default().to_document().unwrap();
        let obj = doc.as_object().unwrap();
        for key in [
            "enableOpacityChange",
            "focusOpacity",
            "blurOpacity",
            "enableWindowResize",
            "focusBounds",
            "blurBounds",
            "enableBorder",
            "borderColor",
            "borderWidth",
        ] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
        assert_eq!(obj.len(), 9);
    }
}
