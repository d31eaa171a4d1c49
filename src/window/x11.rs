//! X11 implementation of `WindowController`
//!
//! Focus tracking is chosen once when attaching: window managers that
//! advertise `_NET_ACTIVE_WINDOW` are followed through the root property,
//! anything else through core FocusIn/FocusOut events on the target.

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as WrapperExt;

use super::border::BorderOverlay;
use super::{HostEvent, WindowController};
use crate::constants::x11;
use crate::types::{BorderStyle, Bounds};
use crate::x11_utils::{
    CachedAtoms, active_window, find_window_by_class, set_net_wm_state, toplevel_frame, wm_supports,
};

/// Which window to attach to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Id(Window),
    Class(String),
    /// Whatever is focused at startup
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTracking {
    /// EWMH: PropertyNotify for `_NET_ACTIVE_WINDOW` on the root window
    ActiveWindow,
    /// Core protocol: FocusIn/FocusOut selected on the target
    FocusEvents,
}

/// Convert `0.0..=1.0` to the `_NET_WM_WINDOW_OPACITY` cardinal
pub fn opacity_to_cardinal(opacity: f64) -> u32 {
    (opacity.clamp(0.0, 1.0) * f64::from(x11::OPAQUE)).round() as u32
}

/// Bounds in the terms ConfigureWindow on the client uses.
///
/// With NorthWest gravity a reparenting window manager places the frame's
/// outer corner at the requested position while the size stays the
/// client's. `frame_origin` is the frame's inside corner in root
/// coordinates; without a frame pass the client's own origin and border.
fn configure_bounds(frame_origin: (i16, i16), frame_border: u16, client_size: (u16, u16)) -> Bounds {
    let border = i32::from(frame_border);
    Bounds::new(
        i32::from(frame_origin.0) - border,
        i32::from(frame_origin.1) - border,
        u32::from(client_size.0),
        u32::from(client_size.1),
    )
}

/// Signal for a FocusIn (`focus_in`) or FocusOut on the target, or `None`
/// when it doesn't change what was last reported
fn focus_event_signal(
    focus_in: bool,
    mode: NotifyMode,
    detail: NotifyDetail,
    last_focus: Option<bool>,
) -> Option<HostEvent> {
    // Keyboard grabs (alt-tab, menus) and pointer-only focus don't move focus
    if mode == NotifyMode::GRAB
        || mode == NotifyMode::UNGRAB
        || detail == NotifyDetail::POINTER
        || detail == NotifyDetail::INFERIOR
    {
        return None;
    }
    focus_signal(focus_in, last_focus)
}

fn focus_signal(focused: bool, last_focus: Option<bool>) -> Option<HostEvent> {
    if last_focus == Some(focused) {
        return None;
    }
    Some(if focused { HostEvent::Focus } else { HostEvent::Blur })
}

pub struct X11Window {
    conn: RustConnection,
    screen_num: usize,
    atoms: CachedAtoms,
    window: Window,
    /// Top-level ancestor (WM frame) of `window`
    frame: Window,
    tracking: FocusTracking,
    subscribed: bool,
    last_focus: Option<bool>,
    border: BorderOverlay,
    closed: bool,
}

impl X11Window {
    pub fn connect(target: &Target) -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to X11 display")?;
        let root = conn.setup().roots[screen_num].root;
        info!("successfully connected to x11: screen={screen_num}");

        // Pre-cache atoms once at startup
        let atoms = CachedAtoms::new(&conn)?;

        let window = match target {
            Target::Id(id) => {
                conn.get_geometry(*id)
                    .context("Failed to send geometry query for target window")?
                    .reply()
                    .context(format!("Window {:#x} does not exist", id))?;
                *id
            }
            Target::Class(class) => find_window_by_class(&conn, root, &atoms, class)?
                .ok_or_else(|| anyhow!("No managed window with WM_CLASS '{}'", class))?,
            Target::Active => active_window(&conn, root, &atoms)?
                .ok_or_else(|| anyhow!("No active window; pass --window or --class"))?,
        };

        let frame = toplevel_frame(&conn, window)?;
        let tracking = if wm_supports(&conn, root, &atoms, atoms.net_active_window)? {
            FocusTracking::ActiveWindow
        } else {
            FocusTracking::FocusEvents
        };
        info!(
            window = format_args!("{window:#x}"),
            frame = format_args!("{frame:#x}"),
            ?tracking,
            "Attached to target window"
        );

        let this = Self {
            conn,
            screen_num,
            atoms,
            window,
            frame,
            tracking,
            subscribed: false,
            last_focus: None,
            border: BorderOverlay::new(),
            closed: false,
        };
        this.select_events()?;
        Ok(this)
    }

    pub fn connection(&self) -> &RustConnection {
        &self.conn
    }

    fn root(&self) -> Window {
        self.conn.setup().roots[self.screen_num].root
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            anyhow::bail!("Target window {:#x} is gone", self.window);
        }
        Ok(())
    }

    /// Our event selection: geometry/destroy on the target and its frame,
    /// plus whichever focus source is in use while subscribed
    fn select_events(&self) -> Result<()> {
        let focus_events = self.subscribed && self.tracking == FocusTracking::FocusEvents;
        let target_mask = if focus_events {
            EventMask::STRUCTURE_NOTIFY | EventMask::FOCUS_CHANGE
        } else {
            EventMask::STRUCTURE_NOTIFY
        };
        self.conn
            .change_window_attributes(self.window, &ChangeWindowAttributesAux::new().event_mask(target_mask))
            .context(format!("Failed to select events on window {}", self.window))?;

        if self.frame != self.window {
            self.conn
                .change_window_attributes(
                    self.frame,
                    &ChangeWindowAttributesAux::new().event_mask(EventMask::STRUCTURE_NOTIFY),
                )
                .context(format!("Failed to select events on frame {}", self.frame))?;
        }

        let root_mask = if self.subscribed && self.tracking == FocusTracking::ActiveWindow {
            EventMask::PROPERTY_CHANGE
        } else {
            EventMask::NO_EVENT
        };
        self.conn
            .change_window_attributes(self.root(), &ChangeWindowAttributesAux::new().event_mask(root_mask))
            .context("Failed to select events on root window")?;

        self.conn.flush().context("Failed to flush X11 connection after selecting events")?;
        Ok(())
    }

    /// Next queued event without blocking
    pub fn poll_event(&self) -> Result<Option<Event>> {
        self.conn.poll_for_event().context("X11 connection error")
    }

    /// Map a raw X11 event onto a host signal. Emits focus signals only on
    /// actual transitions.
    pub fn translate(&mut self, event: &Event) -> Option<HostEvent> {
        match event {
            Event::DestroyNotify(e) if e.window == self.window => {
                info!(window = self.window, "Target window destroyed");
                self.closed = true;
                let _ = self
                    .border
                    .clear(&self.conn)
                    .inspect_err(|e| warn!(error = %e, "Failed to clear border after target closed"));
                Some(HostEvent::Closed)
            }
            Event::ConfigureNotify(e) if e.window == self.window || e.window == self.frame => {
                if self.border.is_visible() {
                    let relayout = self.client_area().and_then(|bounds| {
                        let screen = &self.conn.setup().roots[self.screen_num];
                        self.border.relayout(&self.conn, screen, bounds)
                    });
                    if let Err(e) = relayout {
                        warn!(error = %e, "Failed to move border with target window");
                    }
                }
                None
            }
            Event::PropertyNotify(e)
                if self.subscribed
                    && self.tracking == FocusTracking::ActiveWindow
                    && e.atom == self.atoms.net_active_window =>
            {
                match self.has_focus() {
                    Ok(focused) => self.report(focus_signal(focused, self.last_focus)),
                    Err(e) => {
                        warn!(error = %e, "Failed to read active window");
                        None
                    }
                }
            }
            Event::FocusIn(e) | Event::FocusOut(e)
                if self.subscribed && self.tracking == FocusTracking::FocusEvents && e.event == self.window =>
            {
                let focus_in = matches!(event, Event::FocusIn(_));
                self.report(focus_event_signal(focus_in, e.mode, e.detail, self.last_focus))
            }
            Event::Error(e) => {
                debug!(error = ?e, "X11 error event");
                None
            }
            _ => None,
        }
    }

    fn report(&mut self, signal: Option<HostEvent>) -> Option<HostEvent> {
        if let Some(event) = signal {
            self.last_focus = Some(event == HostEvent::Focus);
        }
        signal
    }

    fn geometry(&self, window: Window) -> Result<GetGeometryReply> {
        self.conn
            .get_geometry(window)
            .context("Failed to send geometry query")?
            .reply()
            .context(format!("Failed to get geometry for window {}", window))
    }

    fn root_origin(&self, window: Window) -> Result<(i16, i16)> {
        let reply = self
            .conn
            .translate_coordinates(window, self.root(), 0, 0)
            .context("Failed to send coordinate translation")?
            .reply()
            .context(format!("Failed to translate coordinates for window {}", window))?;
        Ok((reply.dst_x, reply.dst_y))
    }

    /// Client area in root coordinates, where the border overlay is drawn
    fn client_area(&self) -> Result<Bounds> {
        self.ensure_open()?;
        let geom = self.geometry(self.window)?;
        let (x, y) = self.root_origin(self.window)?;
        Ok(Bounds::new(
            i32::from(x),
            i32::from(y),
            u32::from(geom.width),
            u32::from(geom.height),
        ))
    }

    /// Whether `candidate` is the target, its frame, or inside either
    fn is_target(&self, candidate: Window) -> Result<bool> {
        if candidate == self.window || candidate == self.frame {
            return Ok(true);
        }
        Ok(toplevel_frame(&self.conn, candidate)? == self.frame)
    }
}

impl WindowController for X11Window {
    fn set_always_on_top(&mut self, on_top: bool) -> Result<()> {
        self.ensure_open()?;
        set_net_wm_state(
            &self.conn,
            self.root(),
            &self.atoms,
            self.window,
            self.atoms.net_wm_state_above,
            on_top,
        )?;
        debug!(on_top, "Set always-on-top");
        Ok(())
    }

    fn set_opacity(&mut self, opacity: f64) -> Result<()> {
        self.ensure_open()?;
        let value = opacity_to_cardinal(opacity);

        // Compositors read the property from the frame, some from the client
        let mut windows = vec![self.window];
        if self.frame != self.window {
            windows.push(self.frame);
        }
        for window in windows {
            self.conn
                .change_property32(
                    PropMode::REPLACE,
                    window,
                    self.atoms.net_wm_window_opacity,
                    AtomEnum::CARDINAL,
                    &[value],
                )
                .context(format!("Failed to set window opacity on {}", window))?;
        }
        self.conn.flush().context("Failed to flush X11 connection after opacity change")?;
        debug!(opacity, value, "Set opacity");
        Ok(())
    }

    fn set_bounds(&mut self, bounds: Bounds) -> Result<()> {
        self.ensure_open()?;
        self.conn
            .configure_window(
                self.window,
                &ConfigureWindowAux::new()
                    .x(bounds.x)
                    .y(bounds.y)
                    .width(bounds.width)
                    .height(bounds.height),
            )
            .context(format!("Failed to configure window {} to {}", self.window, bounds))?;
        self.conn.flush().context("Failed to flush X11 connection after resize")?;
        debug!(bounds = %bounds, "Set bounds");
        Ok(())
    }

    fn bounds(&self) -> Result<Bounds> {
        self.ensure_open()?;
        let client = self.geometry(self.window)?;
        let frame_border = if self.frame == self.window {
            client.border_width
        } else {
            self.geometry(self.frame)?.border_width
        };
        let origin = self.root_origin(self.frame)?;
        Ok(configure_bounds(origin, frame_border, (client.width, client.height)))
    }

    fn set_border(&mut self, border: &BorderStyle) -> Result<()> {
        if *border == BorderStyle::None {
            return self.border.clear(&self.conn);
        }
        let target = self.client_area()?;
        let screen = &self.conn.setup().roots[self.screen_num];
        self.border.set(&self.conn, screen, border, target)
    }

    fn has_focus(&self) -> Result<bool> {
        self.ensure_open()?;
        match self.tracking {
            FocusTracking::ActiveWindow => match active_window(&self.conn, self.root(), &self.atoms)? {
                Some(active) => self.is_target(active),
                None => Ok(false),
            },
            FocusTracking::FocusEvents => {
                let focus = self
                    .conn
                    .get_input_focus()
                    .context("Failed to send input focus query")?
                    .reply()
                    .context("Failed to get input focus")?
                    .focus;
                // 0 = None, 1 = PointerRoot
                if focus <= 1 {
                    return Ok(false);
                }
                self.is_target(focus)
            }
        }
    }

    fn subscribe_focus(&mut self) -> Result<bool> {
        self.ensure_open()?;
        self.subscribed = true;
        // Listen before querying so a change in between still arrives as an event
        self.select_events()?;
        let focused = self.has_focus()?;
        self.last_focus = Some(focused);
        info!(tracking = ?self.tracking, focused, "Subscribed to focus changes");
        Ok(focused)
    }

    fn unsubscribe_focus(&mut self) -> Result<()> {
        self.subscribed = false;
        self.last_focus = None;
        self.ensure_open()?;
        self.select_events()?;
        info!("Unsubscribed from focus changes");
        Ok(())
    }
}
