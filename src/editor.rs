//! Settings editing behind the settings window
//!
//! Every edit is parse -> validate -> mutate -> persist; border edits then
//! re-apply the window state for the current focus. Rejected input leaves
//! the settings untouched and writes nothing.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

use crate::applier;
use crate::config::{Settings, SettingsStore};
use crate::types::{Bounds, FocusState};
use crate::window::WindowController;

/// Feature switches, each governing a group of dependent fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Toggle {
    Opacity,
    Resize,
    Border,
}

impl Toggle {
    pub const ALL: [Toggle; 3] = [Toggle::Opacity, Toggle::Resize, Toggle::Border];

    pub fn get(self, settings: &Settings) -> bool {
        match self {
            Toggle::Opacity => settings.enable_opacity_change,
            Toggle::Resize => settings.enable_window_resize,
            Toggle::Border => settings.enable_border,
        }
    }

    fn set(self, settings: &mut Settings, enabled: bool) {
        match self {
            Toggle::Opacity => settings.enable_opacity_change = enabled,
            Toggle::Resize => settings.enable_window_resize = enabled,
            Toggle::Border => settings.enable_border = enabled,
        }
    }

    /// Fields shown under this toggle
    pub fn fields(self) -> Vec<Field> {
        match self {
            Toggle::Opacity => vec![Field::FocusOpacity, Field::BlurOpacity],
            Toggle::Resize => [BoundsSlot::Focus, BoundsSlot::Blur]
                .into_iter()
                .flat_map(|slot| Coord::ALL.map(|coord| Field::Bounds(slot, coord)))
                .collect(),
            Toggle::Border => vec![Field::BorderColor, Field::BorderWidth],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundsSlot {
    Focus,
    Blur,
}

impl BoundsSlot {
    pub fn label(self) -> &'static str {
        match self {
            BoundsSlot::Focus => "Focused",
            BoundsSlot::Blur => "Unfocused",
        }
    }

    fn get(self, settings: &Settings) -> Bounds {
        match self {
            BoundsSlot::Focus => settings.focus_bounds,
            BoundsSlot::Blur => settings.blur_bounds,
        }
    }

    fn get_mut(self, settings: &mut Settings) -> &mut Bounds {
        match self {
            BoundsSlot::Focus => &mut settings.focus_bounds,
            BoundsSlot::Blur => &mut settings.blur_bounds,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Coord {
    X,
    Y,
    Width,
    Height,
}

impl Coord {
    pub const ALL: [Coord; 4] = [Coord::X, Coord::Y, Coord::Width, Coord::Height];

    fn label(self) -> &'static str {
        match self {
            Coord::X => "X position",
            Coord::Y => "Y position",
            Coord::Width => "width",
            Coord::Height => "height",
        }
    }
}

// ConfigureWindow carries INT16 positions and CARD16 sizes
const POSITION_RANGE: &str = "between -32768 and 32767";
const SIZE_RANGE: &str = "between 1 and 65535";

/// Every text-editable setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    FocusOpacity,
    BlurOpacity,
    Bounds(BoundsSlot, Coord),
    BorderColor,
    BorderWidth,
}

impl Field {
    pub fn toggle(self) -> Toggle {
        match self {
            Field::FocusOpacity | Field::BlurOpacity => Toggle::Opacity,
            Field::Bounds(..) => Toggle::Resize,
            Field::BorderColor | Field::BorderWidth => Toggle::Border,
        }
    }

    /// Text shown in the field's input box
    pub fn current_text(self, settings: &Settings) -> String {
        match self {
            Field::FocusOpacity => settings.focus_opacity.to_string(),
            Field::BlurOpacity => settings.blur_opacity.to_string(),
            Field::Bounds(slot, coord) => {
                let bounds = slot.get(settings);
                match coord {
                    Coord::X => bounds.x.to_string(),
                    Coord::Y => bounds.y.to_string(),
                    Coord::Width => bounds.width.to_string(),
                    Coord::Height => bounds.height.to_string(),
                }
            }
            Field::BorderColor => settings.border_color.clone(),
            Field::BorderWidth => settings.border_width.to_string(),
        }
    }

    /// Parse and validate `input`, then store it. Nothing changes on error.
    fn assign(self, settings: &mut Settings, input: &str) -> Result<(), EditError> {
        match self {
            Field::FocusOpacity => settings.focus_opacity = parse_opacity(self, input)?,
            Field::BlurOpacity => settings.blur_opacity = parse_opacity(self, input)?,
            Field::Bounds(slot, coord) => {
                let value = parse_integer(self, input)?;
                let bounds = slot.get_mut(settings);
                match coord {
                    Coord::X => bounds.x = i32::from(fit::<i16>(self, value, POSITION_RANGE)?),
                    Coord::Y => bounds.y = i32::from(fit::<i16>(self, value, POSITION_RANGE)?),
                    Coord::Width | Coord::Height => {
                        let size: u16 = fit(self, value, SIZE_RANGE)?;
                        if size == 0 {
                            return Err(EditError::OutOfRange {
                                field: self,
                                value: input.trim().to_string(),
                                range: SIZE_RANGE,
                            });
                        }
                        if coord == Coord::Width {
                            bounds.width = u32::from(size);
                        } else {
                            bounds.height = u32::from(size);
                        }
                    }
                }
            }
            Field::BorderColor => settings.border_color = input.to_string(),
            Field::BorderWidth => {
                settings.border_width = fit(self, parse_integer(self, input)?, "0 or more")?
            }
        }
        Ok(())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::FocusOpacity => f.write_str("Focused opacity"),
            Field::BlurOpacity => f.write_str("Blurred opacity"),
            Field::Bounds(slot, coord) => write!(f, "{} window {}", slot.label(), coord.label()),
            Field::BorderColor => f.write_str("Border color"),
            Field::BorderWidth => f.write_str("Border width"),
        }
    }
}

#[derive(Debug, Error)]
pub enum EditError {
    #[error("{field}: '{input}' is not a number")]
    NotANumber { field: Field, input: String },

    #[error("{field}: {value} must be {range}")]
    OutOfRange {
        field: Field,
        value: String,
        range: &'static str,
    },

    #[error(transparent)]
    Persist(#[from] anyhow::Error),

    /// The window couldn't report usable geometry
    #[error("Failed to read window bounds: {0:#}")]
    Controller(anyhow::Error),
}

impl EditError {
    /// Input was refused; settings and storage untouched
    pub fn is_rejection(&self) -> bool {
        matches!(self, EditError::NotANumber { .. } | EditError::OutOfRange { .. })
    }
}

fn parse_opacity(field: Field, input: &str) -> Result<f64, EditError> {
    let trimmed = input.trim();
    let value: f64 = trimmed.parse().map_err(|_| EditError::NotANumber {
        field,
        input: input.to_string(),
    })?;
    if !(0.0..=1.0).contains(&value) {
        return Err(EditError::OutOfRange {
            field,
            value: trimmed.to_string(),
            range: "between 0.0 and 1.0",
        });
    }
    Ok(value)
}

fn parse_integer(field: Field, input: &str) -> Result<i64, EditError> {
    input.trim().parse().map_err(|_| EditError::NotANumber {
        field,
        input: input.to_string(),
    })
}

fn fit<T: TryFrom<i64>>(field: Field, value: i64, range: &'static str) -> Result<T, EditError> {
    T::try_from(value).map_err(|_| EditError::OutOfRange {
        field,
        value: value.to_string(),
        range,
    })
}

/// Whether fields under `toggle` are shown. Hidden whenever the toggle is off.
pub fn dependents_visible(toggle: Toggle, settings: &Settings) -> bool {
    toggle.get(settings)
}

/// Edits one in-memory settings document, persisting each accepted change
pub struct SettingsEditor<'a> {
    settings: &'a mut Settings,
    store: &'a SettingsStore,
    controller: &'a mut dyn WindowController,
    /// Focus used for re-applying border edits; `None` when not active
    focus: Option<FocusState>,
}

impl<'a> SettingsEditor<'a> {
    pub fn new(
        settings: &'a mut Settings,
        store: &'a SettingsStore,
        controller: &'a mut dyn WindowController,
        focus: Option<FocusState>,
    ) -> Self {
        Self {
            settings,
            store,
            controller,
            focus,
        }
    }

    pub fn set_toggle(&mut self, toggle: Toggle, enabled: bool) -> Result<(), EditError> {
        toggle.set(self.settings, enabled);
        self.store.save(self.settings)?;
        info!(?toggle, enabled, "Toggle changed");

        if toggle == Toggle::Border {
            self.reapply();
        }
        Ok(())
    }

    pub fn submit(&mut self, field: Field, input: &str) -> Result<(), EditError> {
        let mut edited = self.settings.clone();
        field
            .assign(&mut edited, input)
            .inspect_err(|e| debug!(error = %e, "Rejected settings input"))?;

        *self.settings = edited;
        self.store.save(self.settings)?;
        info!(field = %field, value = %field.current_text(self.settings), "Setting changed");

        if field.toggle() == Toggle::Border {
            self.reapply();
        }
        Ok(())
    }

    /// Replace the slot's bounds with the window's current geometry
    pub fn capture_bounds(&mut self, slot: BoundsSlot) -> Result<Bounds, EditError> {
        let bounds = self.controller.bounds().map_err(EditError::Controller)?;
        if !bounds.is_configurable() {
            return Err(EditError::Controller(anyhow::anyhow!(
                "{bounds} can't be sent back to the window"
            )));
        }
        *slot.get_mut(self.settings) = bounds;
        self.store.save(self.settings)?;
        info!(slot = slot.label(), bounds = %bounds, "Captured current window bounds");
        Ok(bounds)
    }

    fn reapply(&mut self) {
        if let Some(focus) = self.focus {
            applier::apply(self.controller, self.settings, focus);
        }
    }
}
