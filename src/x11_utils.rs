use anyhow::{Context, Result};
use tracing::debug;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

use crate::constants::x11;

/// Pre-cached X11 atoms to avoid repeated roundtrips
#[derive(Debug, Clone, Copy)]
pub struct CachedAtoms {
    pub wm_class: Atom,
    pub net_supported: Atom,
    pub net_client_list: Atom,
    pub net_active_window: Atom,
    pub net_wm_state: Atom,
    pub net_wm_state_above: Atom,
    pub net_wm_window_opacity: Atom,
}

fn intern(conn: &RustConnection, name: &str) -> Result<Atom> {
    Ok(conn
        .intern_atom(false, name.as_bytes())
        .with_context(|| format!("Failed to intern {name} atom"))?
        .reply()
        .with_context(|| format!("Failed to get reply for {name} atom"))?
        .atom)
}

impl CachedAtoms {
    pub fn new(conn: &RustConnection) -> Result<Self> {
        // Do all intern_atom roundtrips once at startup
        Ok(Self {
            wm_class: intern(conn, "WM_CLASS")?,
            net_supported: intern(conn, "_NET_SUPPORTED")?,
            net_client_list: intern(conn, "_NET_CLIENT_LIST")?,
            net_active_window: intern(conn, "_NET_ACTIVE_WINDOW")?,
            net_wm_state: intern(conn, "_NET_WM_STATE")?,
            net_wm_state_above: intern(conn, "_NET_WM_STATE_ABOVE")?,
            net_wm_window_opacity: intern(conn, "_NET_WM_WINDOW_OPACITY")?,
        })
    }
}

/// Parse a window id given as decimal or `0x`-prefixed hex
pub fn parse_window_id(s: &str) -> Result<Window> {
    let s = s.trim();
    let id = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    }
    .with_context(|| format!("Invalid window id '{s}' (expected decimal or 0x-hex)"))?;

    if id == 0 {
        anyhow::bail!("Window id 0 is not a window");
    }
    Ok(id)
}

/// Read a 32-bit-format property as a list of values (empty if unset)
pub fn get_property32(
    conn: &RustConnection,
    window: Window,
    property: Atom,
    type_: impl Into<Atom>,
) -> Result<Vec<u32>> {
    let reply = conn
        .get_property(false, window, property, type_, 0, u32::MAX)
        .context(format!("Failed to query property {} on window {}", property, window))?
        .reply()
        .context(format!("Failed to get property {} reply for window {}", property, window))?;
    Ok(reply.value32().map(|values| values.collect()).unwrap_or_default())
}

/// Currently active window according to the window manager
pub fn active_window(conn: &RustConnection, root: Window, atoms: &CachedAtoms) -> Result<Option<Window>> {
    let values = get_property32(conn, root, atoms.net_active_window, AtomEnum::WINDOW)
        .context("Failed to query _NET_ACTIVE_WINDOW property")?;
    Ok(values.first().copied().filter(|&w| w != 0))
}

/// Whether the window manager advertises `atom` in `_NET_SUPPORTED`
pub fn wm_supports(conn: &RustConnection, root: Window, atoms: &CachedAtoms, atom: Atom) -> Result<bool> {
    let supported = get_property32(conn, root, atoms.net_supported, AtomEnum::ATOM)
        .context("Failed to query _NET_SUPPORTED property")?;
    Ok(supported.contains(&atom))
}

/// Split a WM_CLASS value (`instance\0class\0`) into its parts
pub fn split_wm_class(raw: &[u8]) -> Vec<String> {
    raw.split(|&b| b == 0)
        .filter(|part| !part.is_empty())
        .map(|part| String::from_utf8_lossy(part).into_owned())
        .collect()
}

/// First managed client whose WM_CLASS instance or class matches (case-insensitive)
pub fn find_window_by_class(
    conn: &RustConnection,
    root: Window,
    atoms: &CachedAtoms,
    class: &str,
) -> Result<Option<Window>> {
    let clients = get_property32(conn, root, atoms.net_client_list, AtomEnum::WINDOW)
        .context("Failed to query _NET_CLIENT_LIST property")?;

    for window in clients {
        let reply = conn
            .get_property(false, window, atoms.wm_class, AtomEnum::STRING, 0, 1024)
            .context(format!("Failed to query WM_CLASS property for window {}", window))?
            .reply();
        // Clients can vanish between listing and querying
        let Ok(reply) = reply else { continue };

        let parts = split_wm_class(&reply.value);
        debug!(window, class = ?parts, "Checking client WM_CLASS");
        if parts.iter().any(|p| p.eq_ignore_ascii_case(class)) {
            return Ok(Some(window));
        }
    }
    Ok(None)
}

/// Walk up to the child of root that contains `window` (the WM frame, or the
/// window itself when not reparented)
pub fn toplevel_frame(conn: &RustConnection, window: Window) -> Result<Window> {
    let mut current = window;
    loop {
        let tree = conn
            .query_tree(current)
            .context(format!("Failed to query tree for window {}", current))?
            .reply()
            .context(format!("Failed to get tree reply for window {}", current))?;
        if tree.parent == tree.root || tree.parent == x11rb::NONE {
            return Ok(current);
        }
        current = tree.parent;
    }
}

/// Add or remove a `_NET_WM_STATE` entry via client message to the root window
pub fn set_net_wm_state(
    conn: &RustConnection,
    root: Window,
    atoms: &CachedAtoms,
    window: Window,
    state: Atom,
    enabled: bool,
) -> Result<()> {
    let action = if enabled {
        x11::NET_WM_STATE_ADD
    } else {
        x11::NET_WM_STATE_REMOVE
    };

    let event = ClientMessageEvent {
        response_type: CLIENT_MESSAGE_EVENT,
        format: 32,
        sequence: 0,
        window,
        type_: atoms.net_wm_state,
        data: ClientMessageData::from([action, state, 0, x11::SOURCE_APPLICATION, 0]),
    };

    conn.send_event(
        false,
        root,
        EventMask::SUBSTRUCTURE_NOTIFY | EventMask::SUBSTRUCTURE_REDIRECT,
        &event,
    )
    .context(format!("Failed to send _NET_WM_STATE event for window {}", window))?;

    conn.flush()
        .context("Failed to flush X11 connection after _NET_WM_STATE change")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_window_id() {
        assert_eq!(parse_window_id("12345").unwrap(), 12345);
        assert_eq!(parse_window_id("0x3c00007").unwrap(), 0x3c00007);
        assert_eq!(parse_window_id(" 0XFF ").unwrap(), 255);
        assert!(parse_window_id("0").is_err());
        assert!(parse_window_id("window").is_err());
        assert!(parse_window_id("0xZZ").is_err());
    }

    #[test]
    fn test_split_wm_class() {
        assert_eq!(split_wm_class(b"obsidian\0Obsidian\0"), vec!["obsidian", "Obsidian"]);
        assert_eq!(split_wm_class(b"xterm"), vec!["xterm"]);
        assert!(split_wm_class(b"").is_empty());
    }
}
