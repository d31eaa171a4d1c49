//! Settings window state, kept separate from drawing
//!
//! Text buffers mirror the daemon's settings. Each reply from the daemon
//! refills them, so a rejected edit snaps back to the stored value.

use std::collections::HashMap;

use crate::config::Settings;
use crate::editor::{Field, Toggle, dependents_visible};
use crate::ipc::{ControlRequest, ControlResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Ok,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
}

impl StatusMessage {
    fn new(kind: StatusKind, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

#[derive(Debug, Default)]
pub struct SettingsForm {
    /// `None` until the daemon answered once
    settings: Option<Settings>,
    buffers: HashMap<Field, String>,
    pub status: Option<StatusMessage>,
}

impl SettingsForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> Option<&Settings> {
        self.settings.as_ref()
    }

    pub fn buffer_mut(&mut self, field: Field) -> &mut String {
        self.buffers.entry(field).or_default()
    }

    /// Fields to draw under `toggle`; empty while the toggle is off
    pub fn visible_fields(&self, toggle: Toggle) -> Vec<Field> {
        match &self.settings {
            Some(settings) if dependents_visible(toggle, settings) => toggle.fields(),
            _ => Vec::new(),
        }
    }

    /// Edit request if the buffer no longer matches the stored value
    pub fn pending_edit(&self, field: Field) -> Option<ControlRequest> {
        let settings = self.settings.as_ref()?;
        let input = self.buffers.get(&field)?;
        if *input == field.current_text(settings) {
            return None;
        }
        Some(ControlRequest::Edit {
            field,
            input: input.clone(),
        })
    }

    pub fn apply_response(&mut self, response: ControlResponse) {
        match response {
            ControlResponse::Settings(settings) => {
                self.load(settings);
                self.status = Some(StatusMessage::new(StatusKind::Ok, "Saved"));
            }
            ControlResponse::Captured { bounds, settings } => {
                self.load(settings);
                self.status = Some(StatusMessage::new(StatusKind::Ok, format!("Captured {bounds}")));
            }
            ControlResponse::Rejected { reason, settings } => {
                self.load(settings);
                self.status = Some(StatusMessage::new(StatusKind::Error, reason));
            }
            ControlResponse::Error(message) => {
                self.status = Some(StatusMessage::new(StatusKind::Error, message));
            }
            ControlResponse::Pong | ControlResponse::Ready => {}
        }
    }

    /// First settings fetch; doesn't claim anything was saved
    pub fn connected(&mut self, settings: Settings) {
        self.load(settings);
        self.status = Some(StatusMessage::new(StatusKind::Info, "Connected to daemon"));
    }

    pub fn disconnected(&mut self, err: &anyhow::Error) {
        self.settings = None;
        self.status = Some(StatusMessage::new(StatusKind::Error, format!("{err:#}")));
    }

    fn load(&mut self, settings: Settings) {
        self.buffers = Toggle::ALL
            .into_iter()
            .flat_map(Toggle::fields)
            .map(|field| (field, field.current_text(&settings)))
            .collect();
        self.settings = Some(settings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{BoundsSlot, Coord};
    use crate::types::Bounds;

    fn connected_form() -> SettingsForm {
        let mut form = SettingsForm::new();
        form.connected(Settings::default());
        form
    }

    #[test]
    fn test_buffers_start_from_settings() {
        let mut form = connected_form();
        assert_eq!(form.buffer_mut(Field::BorderColor), "#FF5733");
        assert_eq!(form.buffer_mut(Field::Bounds(BoundsSlot::Blur, Coord::Width)), "700");
        assert_eq!(form.pending_edit(Field::BorderColor), None);
    }

    #[test]
    fn test_typed_value_becomes_edit() {
        let mut form = connected_form();
        *form.buffer_mut(Field::BorderWidth) = "4".to_string();
        assert_eq!(
            form.pending_edit(Field::BorderWidth),
            Some(ControlRequest::Edit {
                field: Field::BorderWidth,
                input: "4".to_string(),
            })
        );
    }

    #[test]
    fn test_rejection_restores_stored_value() {
        let mut form = connected_form();
        *form.buffer_mut(Field::FocusOpacity) = "abc".to_string();

        form.apply_response(ControlResponse::Rejected {
            reason: "Focused opacity: 'abc' is not a number".to_string(),
            settings: Settings::default(),
        });

        assert_eq!(form.buffer_mut(Field::FocusOpacity), "1");
        assert_eq!(form.status.as_ref().map(|s| s.kind), Some(StatusKind::Error));
    }

    #[test]
    fn test_hidden_fields_follow_toggles() {
        let mut form = SettingsForm::new();
        assert!(form.visible_fields(Toggle::Border).is_empty());

        form.connected(Settings {
            enable_window_resize: false,
            ..Settings::default()
        });
        assert!(form.visible_fields(Toggle::Resize).is_empty());
        assert_eq!(form.visible_fields(Toggle::Border), vec![Field::BorderColor, Field::BorderWidth]);
        assert_eq!(form.visible_fields(Toggle::Opacity).len(), 2);
    }

    #[test]
    fn test_capture_updates_buffers() {
        let mut form = connected_form();
        let bounds = Bounds::new(1, 2, 300, 400);
        form.apply_response(ControlResponse::Captured {
            bounds,
            settings: Settings {
                focus_bounds: bounds,
                ..Settings::default()
            },
        });
        assert_eq!(form.buffer_mut(Field::Bounds(BoundsSlot::Focus, Coord::Height)), "400");
        assert_eq!(form.status.as_ref().unwrap().text, "Captured 300x400+1+2");
    }

    #[test]
    fn test_disconnect_hides_everything() {
        let mut form = connected_form();
        form.disconnected(&anyhow::anyhow!("connection refused"));
        assert!(form.settings().is_none());
        assert!(form.visible_fields(Toggle::Opacity).is_empty());
    }
}
