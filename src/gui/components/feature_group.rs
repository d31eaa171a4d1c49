//! One feature group: a toggle, its dependent fields, and for window
//! resizing the capture buttons

use eframe::egui;

use crate::editor::{BoundsSlot, Toggle};
use crate::gui::constants::{FIELD_WIDTH, ITEM_SPACING};
use crate::gui::form::SettingsForm;
use crate::ipc::ControlRequest;

fn title(toggle: Toggle) -> &'static str {
    match toggle {
        Toggle::Opacity => "Opacity",
        Toggle::Resize => "Window resize",
        Toggle::Border => "Border",
    }
}

fn toggle_label(toggle: Toggle) -> &'static str {
    match toggle {
        Toggle::Opacity => "Change opacity on focus change",
        Toggle::Resize => "Resize window on focus change",
        Toggle::Border => "Show border while unfocused",
    }
}

/// Renders the group and returns the requests the user triggered
pub fn ui(ui: &mut egui::Ui, form: &mut SettingsForm, toggle: Toggle) -> Vec<ControlRequest> {
    let mut requests = Vec::new();
    let Some(mut enabled) = form.settings().map(|settings| toggle.get(settings)) else {
        return requests;
    };

    ui.group(|ui| {
        ui.set_width(ui.available_width());
        ui.label(egui::RichText::new(title(toggle)).strong());
        ui.add_space(ITEM_SPACING);

        if ui.checkbox(&mut enabled, toggle_label(toggle)).changed() {
            requests.push(ControlRequest::SetToggle { toggle, enabled });
        }

        let fields = form.visible_fields(toggle);
        if fields.is_empty() {
            return;
        }

        ui.add_space(ITEM_SPACING);
        ui.indent(title(toggle), |ui| {
            egui::Grid::new(title(toggle))
                .num_columns(2)
                .spacing([ITEM_SPACING, ITEM_SPACING])
                .show(ui, |ui| {
                    for field in fields {
                        ui.label(format!("{field}:"));
                        let response = ui.add(
                            egui::TextEdit::singleline(form.buffer_mut(field)).desired_width(FIELD_WIDTH),
                        );
                        // Submit on Enter or when focus leaves the box
                        if response.lost_focus() {
                            requests.extend(form.pending_edit(field));
                        }
                        ui.end_row();
                    }
                });

            if toggle == Toggle::Resize {
                ui.add_space(ITEM_SPACING);
                ui.horizontal(|ui| {
                    for slot in [BoundsSlot::Focus, BoundsSlot::Blur] {
                        let label = format!("Capture current bounds ({})", slot.label().to_lowercase());
                        if ui.button(label).clicked() {
                            requests.push(ControlRequest::CaptureBounds { slot });
                        }
                    }
                });
            }
        });
    });

    requests
}
