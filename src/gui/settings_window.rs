//! Settings window implemented with egui/eframe
//!
//! Talks to the running daemon over the control socket. It never writes
//! settings itself; every change is a request and the daemon's reply is
//! what gets shown.

use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use eframe::{CreationContext, NativeOptions, egui};
use tracing::{debug, info, warn};

use super::components::feature_group;
use super::constants::*;
use super::form::{SettingsForm, StatusKind};
use crate::editor::Toggle;
use crate::ipc::{ControlClient, ControlRequest, ControlResponse};

fn status_color(kind: StatusKind) -> egui::Color32 {
    match kind {
        StatusKind::Ok => STATUS_OK,
        StatusKind::Info => STATUS_INFO,
        StatusKind::Error => STATUS_ERROR,
    }
}

struct SettingsApp {
    client: ControlClient,
    form: SettingsForm,
    last_health_check: Instant,
}

impl SettingsApp {
    fn new(_cc: &CreationContext<'_>, client: ControlClient) -> Self {
        info!(socket = %client.path().display(), "Initializing settings window");
        let mut app = Self {
            client,
            form: SettingsForm::new(),
            last_health_check: Instant::now(),
        };
        app.refresh();
        app
    }

    /// Fetch settings from the daemon, marking the form disconnected on failure
    fn refresh(&mut self) {
        match self.client.request(&ControlRequest::GetSettings) {
            Ok(ControlResponse::Settings(settings)) => self.form.connected(settings),
            Ok(other) => {
                self.form
                    .disconnected(&anyhow!("Unexpected reply to settings query: {other:?}"));
            }
            Err(err) => {
                warn!(error = ?err, "Daemon unreachable");
                self.form.disconnected(&err);
            }
        }
    }

    fn send(&mut self, request: ControlRequest) {
        debug!(?request, "Sending control request");
        match self.client.request(&request) {
            Ok(response) => self.form.apply_response(response),
            Err(err) => {
                warn!(error = ?err, "Control request failed");
                self.form.disconnected(&err);
            }
        }
    }

    /// Reconnect once the daemon comes back
    fn poll_daemon(&mut self) {
        if self.last_health_check.elapsed() < Duration::from_millis(DAEMON_CHECK_INTERVAL_MS) {
            return;
        }
        self.last_health_check = Instant::now();

        if self.form.settings().is_none() {
            self.refresh();
        }
    }
}

impl eframe::App for SettingsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_daemon();

        let mut requests = Vec::new();
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(PADDING);
                ui.heading("Focus Veil");
                ui.add_space(SECTION_SPACING);

                if self.form.settings().is_none() {
                    ui.label("Waiting for `focus-veil run`...");
                }

                for toggle in Toggle::ALL {
                    requests.extend(feature_group::ui(ui, &mut self.form, toggle));
                    ui.add_space(SECTION_SPACING);
                }

                ui.separator();
                if let Some(status) = &self.form.status {
                    ui.colored_label(status_color(status.kind), &status.text);
                }
            });
        });

        for request in requests {
            self.send(request);
        }

        ctx.request_repaint_after(Duration::from_millis(DAEMON_CHECK_INTERVAL_MS));
    }
}

pub fn run_gui() -> Result<()> {
    let client = ControlClient::new()?;
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([WINDOW_WIDTH, WINDOW_HEIGHT])
            .with_min_inner_size([WINDOW_MIN_WIDTH, WINDOW_MIN_HEIGHT])
            .with_title("Focus Veil Settings"),
        ..Default::default()
    };

    eframe::run_native(
        "Focus Veil Settings",
        options,
        Box::new(|cc| Ok(Box::new(SettingsApp::new(cc, client)))),
    )
    .map_err(|err| anyhow!("Failed to launch settings window: {err}"))
}
