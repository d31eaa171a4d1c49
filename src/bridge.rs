//! Focus/blur state machine
//!
//! Subscribed on activation, fed `HostEvent`s by the daemon loop, torn down
//! with a fixed reset on deactivation.

use tracing::{info, warn};

use crate::applier;
use crate::config::Settings;
use crate::constants::defaults;
use crate::types::{BorderStyle, FocusState};
use crate::window::{HostEvent, WindowController};

#[derive(Debug, Default)]
pub struct FocusBridge {
    /// `None` while not subscribed
    state: Option<FocusState>,
}

impl FocusBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Option<FocusState> {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    /// Pin the window, start listening, then apply the state for the focus
    /// seen at subscription. A second call while active does nothing.
    pub fn activate(&mut self, controller: &mut dyn WindowController, settings: &Settings) {
        if self.is_active() {
            warn!("Focus bridge already active, ignoring activation");
            return;
        }

        let _ = controller
            .set_always_on_top(true)
            .inspect_err(|e| warn!(error = %e, "Failed to set window always-on-top"));

        let focused = match controller.subscribe_focus() {
            Ok(focused) => focused,
            Err(e) => {
                warn!(error = %e, "Failed to subscribe to focus changes");
                controller.has_focus().unwrap_or_else(|e| {
                    warn!(error = %e, "Failed to query focus, assuming blurred");
                    false
                })
            }
        };
        let state = FocusState::from(focused);
        applier::apply(controller, settings, state);

        self.state = Some(state);
        info!(?state, "Focus bridge active");
    }

    /// Returns true if the event was a focus transition that got applied
    pub fn on_event(
        &mut self,
        event: HostEvent,
        controller: &mut dyn WindowController,
        settings: &Settings,
    ) -> bool {
        if !self.is_active() {
            return false;
        }

        let next = match event {
            HostEvent::Focus => FocusState::Focused,
            HostEvent::Blur => FocusState::Blurred,
            HostEvent::Closed => return false,
        };

        self.state = Some(next);
        applier::apply(controller, settings, next);
        true
    }

    /// Unsubscribe and restore a neutral window: not on top, opaque, default
    /// geometry, no border. Does nothing if not active.
    pub fn deactivate(&mut self, controller: &mut dyn WindowController) {
        if self.state.take().is_none() {
            return;
        }

        let _ = controller
            .unsubscribe_focus()
            .inspect_err(|e| warn!(error = %e, "Failed to unsubscribe from focus changes"));
        let _ = controller
            .set_always_on_top(false)
            .inspect_err(|e| warn!(error = %e, "Failed to clear always-on-top"));
        let _ = controller
            .set_opacity(defaults::RESET_OPACITY)
            .inspect_err(|e| warn!(error = %e, "Failed to reset opacity"));
        let _ = controller
            .set_bounds(defaults::RESET_BOUNDS)
            .inspect_err(|e| warn!(error = %e, "Failed to reset bounds"));
        let _ = controller
            .set_border(&BorderStyle::None)
            .inspect_err(|e| warn!(error = %e, "Failed to clear border"));

        info!("Focus bridge deactivated");
    }
}
