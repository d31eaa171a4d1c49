//! Daemon: owns the target window, the settings, and the control socket
//!
//! Single-threaded. Each turn drains queued X11 events, waits on the X11
//! connection and the control socket, then answers pending requests.

use anyhow::{Context, Result};
use nix::errno::Errno;
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use std::os::fd::{AsFd, BorrowedFd};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};
use x11rb::connection::Connection;

use crate::bridge::FocusBridge;
use crate::config::{Settings, SettingsStore};
use crate::constants::daemon;
use crate::editor::{EditError, SettingsEditor};
use crate::ipc::{ControlRequest, ControlResponse, ControlServer};
use crate::types::Bounds;
use crate::window::x11::{Target, X11Window};
use crate::window::{HostEvent, WindowController};

/// What the loop should do after handling something
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Settings, storage and bridge bound to one controlled window
pub struct Session<C: WindowController> {
    settings: Settings,
    store: SettingsStore,
    controller: C,
    bridge: FocusBridge,
    window_closed: bool,
}

impl<C: WindowController> Session<C> {
    pub fn new(store: SettingsStore, controller: C) -> Result<Self> {
        let settings = store.load().context("Failed to load settings")?;
        Ok(Self {
            settings,
            store,
            controller,
            bridge: FocusBridge::new(),
            window_closed: false,
        })
    }

    pub fn start(&mut self) {
        self.bridge.activate(&mut self.controller, &self.settings);
    }

    pub fn handle_event(&mut self, event: HostEvent) -> Flow {
        if event == HostEvent::Closed {
            self.window_closed = true;
            return Flow::Stop;
        }
        if self.bridge.on_event(event, &mut self.controller, &self.settings) {
            debug!(?event, "Applied focus transition");
        }
        Flow::Continue
    }

    pub fn handle_request(&mut self, request: ControlRequest) -> (ControlResponse, Flow) {
        debug!(?request, "Control request");
        let response = match request {
            ControlRequest::GetSettings => ControlResponse::Settings(self.settings.clone()),
            ControlRequest::SetToggle { toggle, enabled } => {
                let result = self.editor().set_toggle(toggle, enabled);
                self.outcome(result.map(|()| None))
            }
            ControlRequest::Edit { field, input } => {
                let result = self.editor().submit(field, &input);
                self.outcome(result.map(|()| None))
            }
            ControlRequest::CaptureBounds { slot } => {
                let result = self.editor().capture_bounds(slot);
                self.outcome(result.map(Some))
            }
            ControlRequest::Ping => ControlResponse::Pong,
            ControlRequest::Shutdown => {
                info!("Shutdown requested over control socket");
                return (ControlResponse::Ready, Flow::Stop);
            }
        };
        (response, Flow::Continue)
    }

    fn editor(&mut self) -> SettingsEditor<'_> {
        let focus = self.bridge.state();
        SettingsEditor::new(&mut self.settings, &self.store, &mut self.controller, focus)
    }

    fn outcome(&self, result: Result<Option<Bounds>, EditError>) -> ControlResponse {
        let settings = self.settings.clone();
        match result {
            Ok(None) => ControlResponse::Settings(settings),
            Ok(Some(bounds)) => ControlResponse::Captured { bounds, settings },
            Err(e) if e.is_rejection() => ControlResponse::Rejected {
                reason: e.to_string(),
                settings,
            },
            Err(e @ EditError::Controller(_)) => {
                warn!("{e}");
                ControlResponse::Error(e.to_string())
            }
            Err(e) => {
                error!("Failed to apply settings change: {e:#}");
                ControlResponse::Error(format!("{e:#}"))
            }
        }
    }

    /// Restore the window unless it is already gone
    pub fn stop(&mut self) {
        if self.window_closed {
            info!("Target window closed, nothing to restore");
            return;
        }
        self.bridge.deactivate(&mut self.controller);
    }
}

/// Block until either fd is readable, the timeout passes, or a signal lands
fn wait_readable(fds: &[BorrowedFd<'_>]) -> Result<()> {
    let mut poll_fds: Vec<PollFd<'_>> = fds
        .iter()
        .map(|fd| PollFd::new(*fd, PollFlags::POLLIN))
        .collect();
    match poll(&mut poll_fds, PollTimeout::from(daemon::POLL_TIMEOUT_MS)) {
        Ok(_) | Err(Errno::EINTR) => Ok(()),
        Err(e) => Err(e).context("poll() on X11 connection and control socket failed"),
    }
}

pub fn run(target: Target, store: SettingsStore) -> Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&shutdown))
        .context("Failed to register SIGINT handler")?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&shutdown))
        .context("Failed to register SIGTERM handler")?;

    let window = X11Window::connect(&target)?;
    let server = ControlServer::bind()?;
    info!(path = %server.path().display(), "Control socket listening");

    let mut session = Session::new(store, window)?;
    session.start();

    let result = event_loop(&mut session, &server, &shutdown);
    session.stop();
    result
}

fn event_loop(session: &mut Session<X11Window>, server: &ControlServer, shutdown: &AtomicBool) -> Result<()> {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            info!("Received termination signal, shutting down");
            return Ok(());
        }

        // Replies to our own requests can leave events queued without the fd being readable
        while let Some(event) = session.controller.poll_event()? {
            let Some(host_event) = session.controller.translate(&event) else {
                continue;
            };
            if session.handle_event(host_event) == Flow::Stop {
                return Ok(());
            }
        }

        {
            let conn = session.controller.connection();
            conn.flush().context("Failed to flush X11 connection")?;
            wait_readable(&[conn.stream().as_fd(), server.listener().as_fd()])?;
        }

        for mut connection in server.accept_pending() {
            let request = match connection.recv_request() {
                Ok(request) => request,
                Err(e) => {
                    warn!("Dropping malformed control request: {e:#}");
                    continue;
                }
            };
            let (response, flow) = session.handle_request(request);
            if let Err(e) = connection.respond(&response) {
                warn!("Failed to send control response: {e:#}");
            }
            if flow == Flow::Stop {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::store::testing::MemoryStore;
    use crate::editor::{BoundsSlot, Coord, Field, Toggle};
    use crate::window::testing::{Call, RecordingWindow};
    use serde_json::json;

    fn session(window: RecordingWindow, memory: &MemoryStore) -> Session<RecordingWindow> {
        let mut session = Session::new(SettingsStore::new(memory.clone()), window).unwrap();
        session.start();
        session
    }

    #[test]
    fn test_start_uses_saved_settings() {
        let memory = MemoryStore::with_data(json!({ "blurOpacity": 0.3 }));
        let s = session(RecordingWindow::default(), &memory);
        assert!(s.controller.calls.contains(&Call::Opacity(0.3)));
        assert!(s.controller.calls.contains(&Call::Subscribe));
    }

    #[test]
    fn test_rejected_edit_reports_unchanged_settings() {
        let memory = MemoryStore::default();
        let mut s = session(RecordingWindow::default(), &memory);

        let (response, flow) = s.handle_request(ControlRequest::Edit {
            field: Field::FocusOpacity,
            input: "2".to_string(),
        });

        assert_eq!(flow, Flow::Continue);
        match response {
            ControlResponse::Rejected { reason, settings } => {
                assert!(reason.contains("Focused opacity"), "{reason}");
                assert_eq!(settings, Settings::default());
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert_eq!(memory.saves.get(), 0);
    }

    #[test]
    fn test_accepted_edit_returns_new_settings() {
        let memory = MemoryStore::default();
        let mut s = session(RecordingWindow::default(), &memory);

        let (response, _) = s.handle_request(ControlRequest::Edit {
            field: Field::Bounds(BoundsSlot::Blur, Coord::Width),
            input: "640".to_string(),
        });

        let ControlResponse::Settings(settings) = response else {
            panic!("expected settings, got {response:?}");
        };
        assert_eq!(settings.blur_bounds.width, 640);
        assert_eq!(s.settings.blur_bounds.width, 640);
        assert_eq!(memory.saves.get(), 1);
    }

    #[test]
    fn test_border_toggle_reapplies_for_current_focus() {
        let memory = MemoryStore::default();
        let mut s = session(RecordingWindow::default(), &memory);
        s.controller.take_calls();

        s.handle_request(ControlRequest::SetToggle {
            toggle: Toggle::Border,
            enabled: false,
        });

        assert!(s.controller.calls.contains(&Call::Border("none".to_string())));
    }

    #[test]
    fn test_capture_bounds() {
        let memory = MemoryStore::default();
        let window = RecordingWindow {
            current_bounds: Some(Bounds::new(5, 6, 700, 400)),
            ..RecordingWindow::default()
        };
        let mut s = session(window, &memory);

        let (response, _) = s.handle_request(ControlRequest::CaptureBounds { slot: BoundsSlot::Blur });
        match response {
            ControlResponse::Captured { bounds, settings } => {
                assert_eq!(bounds, Bounds::new(5, 6, 700, 400));
                assert_eq!(settings.blur_bounds, bounds);
            }
            other => panic!("expected capture, got {other:?}"),
        }
    }

    #[test]
    fn test_capture_bounds_without_geometry_is_an_error() {
        let memory = MemoryStore::default();
        let mut s = session(RecordingWindow::default(), &memory);

        let (response, flow) = s.handle_request(ControlRequest::CaptureBounds { slot: BoundsSlot::Focus });
        assert_eq!(flow, Flow::Continue);
        match response {
            ControlResponse::Error(message) => {
                assert!(message.starts_with("Failed to read window bounds"), "{message}");
            }
            other => panic!("expected error, got {other:?}"),
        }
        assert_eq!(s.settings, Settings::default());
        assert_eq!(memory.saves.get(), 0);
    }

    #[test]
    fn test_focus_events_drive_bridge() {
        let memory = MemoryStore::default();
        let mut s = session(RecordingWindow::focused(), &memory);
        s.controller.take_calls();

        assert_eq!(s.handle_event(HostEvent::Blur), Flow::Continue);
        assert!(s.controller.calls.contains(&Call::Opacity(0.5)));
    }

    #[test]
    fn test_shutdown_request_restores_window() {
        let memory = MemoryStore::default();
        let mut s = session(RecordingWindow::default(), &memory);

        let (response, flow) = s.handle_request(ControlRequest::Shutdown);
        assert_eq!(response, ControlResponse::Ready);
        assert_eq!(flow, Flow::Stop);

        s.controller.take_calls();
        s.stop();
        assert!(s.controller.calls.contains(&Call::AlwaysOnTop(false)));
        assert!(s.controller.calls.contains(&Call::Border("none".to_string())));
    }

    #[test]
    fn test_closed_window_skips_restore() {
        let memory = MemoryStore::default();
        let mut s = session(RecordingWindow::default(), &memory);
        s.controller.take_calls();

        assert_eq!(s.handle_event(HostEvent::Closed), Flow::Stop);
        s.stop();
        assert!(s.controller.calls.is_empty());
    }
}
