//! Focus-dependent window state
//!
//! `plan` decides, `apply` issues. Opacity and bounds are only touched when
//! their feature is enabled; the border is recomputed on every call.

use tracing::{debug, warn};

use crate::config::Settings;
use crate::types::{BorderStyle, Bounds, FocusState};
use crate::window::WindowController;

/// Mutations for one focus state. `None` leaves the property alone.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowPlan {
    pub opacity: Option<f64>,
    pub bounds: Option<Bounds>,
    pub border: BorderStyle,
}

pub fn plan(settings: &Settings, focus: FocusState) -> WindowPlan {
    WindowPlan {
        opacity: settings
            .enable_opacity_change
            .then(|| settings.opacity_for(focus)),
        bounds: settings
            .enable_window_resize
            .then(|| settings.bounds_for(focus)),
        border: settings.border_for(focus),
    }
}

/// Apply the plan for `focus`. Controller failures are logged and skipped.
pub fn apply(controller: &mut dyn WindowController, settings: &Settings, focus: FocusState) {
    let plan = plan(settings, focus);
    debug!(?focus, ?plan, "Applying window state");

    if let Some(opacity) = plan.opacity {
        let _ = controller
            .set_opacity(opacity)
            .inspect_err(|e| warn!(opacity, error = %e, "Failed to set window opacity"));
    }

    if let Some(bounds) = plan.bounds {
        let _ = controller
            .set_bounds(bounds)
            .inspect_err(|e| warn!(bounds = %bounds, error = %e, "Failed to set window bounds"));
    }

    let _ = controller
        .set_border(&plan.border)
        .inspect_err(|e| warn!(border = %plan.border, error = %e, "Failed to set window border"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::testing::{Call, RecordingWindow};

    fn opacity_calls(window: &RecordingWindow) -> Vec<f64> {
        window
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Opacity(v) => Some(*v),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_opacity_disabled_never_touches_opacity() {
        let settings = Settings {
            enable_opacity_change: false,
            focus_opacity: 0.3,
            blur_opacity: 0.1,
            ..Settings::default()
        };
        let mut window = RecordingWindow::default();

        apply(&mut window, &settings, FocusState::Focused);
        apply(&mut window, &settings, FocusState::Blurred);

        assert!(opacity_calls(&window).is_empty());
    }

    #[test]
    fn test_opacity_follows_focus() {
        for (f, b) in [(1.0, 0.5), (0.0, 1.0), (0.42, 0.42), (0.75, 0.0)] {
            let settings = Settings {
                focus_opacity: f,
                blur_opacity: b,
                ..Settings::default()
            };
            let mut window = RecordingWindow::default();

            apply(&mut window, &settings, FocusState::Blurred);
            apply(&mut window, &settings, FocusState::Focused);
            apply(&mut window, &settings, FocusState::Blurred);

            assert_eq!(opacity_calls(&window), vec![b, f, b]);
        }
    }

    #[test]
    fn test_border_decision_table() {
        for enable_border in [true, false] {
            for width in [0, 2, 15] {
                for color in ["#FF5733", "red", "rgb(1, 2, 3)"] {
                    let settings = Settings {
                        enable_border,
                        border_width: width,
                        border_color: color.to_string(),
                        ..Settings::default()
                    };

                    let focused = plan(&settings, FocusState::Focused);
                    assert_eq!(focused.border.to_string(), "none");

                    let blurred = plan(&settings, FocusState::Blurred);
                    let expected = if enable_border {
                        format!("{width}px solid {color}")
                    } else {
                        "none".to_string()
                    };
                    assert_eq!(blurred.border.to_string(), expected);
                }
            }
        }
    }

    #[test]
    fn test_border_applied_on_every_call() {
        let settings = Settings {
            enable_border: false,
            ..Settings::default()
        };
        let mut window = RecordingWindow::default();

        apply(&mut window, &settings, FocusState::Blurred);
        apply(&mut window, &settings, FocusState::Focused);

        assert_eq!(window.count(&Call::Border("none".to_string())), 2);
    }

    #[test]
    fn test_resize_scenario() {
        let settings = Settings {
            enable_window_resize: true,
            focus_bounds: Bounds::new(100, 100, 800, 600),
            blur_bounds: Bounds::new(150, 150, 700, 500),
            ..Settings::default()
        };
        let mut window = RecordingWindow::default();

        apply(&mut window, &settings, FocusState::Focused);
        assert!(window.calls.contains(&Call::Bounds(Bounds::new(100, 100, 800, 600))));

        window.take_calls();
        apply(&mut window, &settings, FocusState::Blurred);
        assert!(window.calls.contains(&Call::Bounds(Bounds::new(150, 150, 700, 500))));
    }

    #[test]
    fn test_resize_disabled_leaves_bounds() {
        let mut window = RecordingWindow::default();
        apply(&mut window, &Settings::default(), FocusState::Blurred);

        assert!(!window.calls.iter().any(|c| matches!(c, Call::Bounds(_))));
    }

    #[test]
    fn test_controller_failure_does_not_stop_border() {
        let mut window = RecordingWindow {
            fail_opacity: true,
            ..RecordingWindow::default()
        };
        apply(&mut window, &Settings::default(), FocusState::Blurred);

        assert_eq!(window.calls, vec![Call::Border("2px solid #FF5733".to_string())]);
    }
}
