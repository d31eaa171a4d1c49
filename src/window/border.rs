//! Inner border drawn around the target window
//!
//! X11 has no way to style a foreign client's contents, so the border is
//! four thin override-redirect windows laid over the inside edges of the
//! target. They are recreated whenever the style or the target geometry
//! changes.

use anyhow::{Context, Result};
use tracing::{debug, warn};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as WrapperExt;

use crate::color::CssColor;
use crate::constants::x11;
use crate::types::{BorderStyle, Bounds};

/// Rectangles covering the inner `width`-pixel frame of `bounds`
pub fn edge_rects(bounds: Bounds, width: u32) -> Vec<Bounds> {
    let bw = width.min(bounds.width).min(bounds.height);
    if bw == 0 {
        return Vec::new();
    }

    let Bounds { x, y, width: w, height: h } = bounds;
    let side_height = h.saturating_sub(bw.saturating_mul(2));
    let inner = bw as i32;

    [
        Bounds::new(x, y, w, bw),
        Bounds::new(x, y + (h - bw) as i32, w, bw),
        Bounds::new(x, y + inner, bw, side_height),
        Bounds::new(x + (w - bw) as i32, y + inner, bw, side_height),
    ]
    .into_iter()
    .filter(Bounds::has_area)
    .collect()
}

fn clamp_i16(v: i32) -> i16 {
    v.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

fn clamp_u16(v: u32) -> u16 {
    v.min(u16::MAX as u32) as u16
}

/// Owns the edge windows for one target
#[derive(Debug, Default)]
pub struct BorderOverlay {
    edges: Vec<Window>,
    /// Resolved pixel and width of the visible border
    active: Option<(u32, u32)>,
}

impl BorderOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.active.is_some()
    }

    /// Show `style` around `target`; `BorderStyle::None` clears
    pub fn set(
        &mut self,
        conn: &RustConnection,
        screen: &Screen,
        style: &BorderStyle,
        target: Bounds,
    ) -> Result<()> {
        self.clear(conn)?;

        let BorderStyle::Solid { width, color } = style else {
            return Ok(());
        };
        if *width == 0 {
            return Ok(());
        }

        let Some(pixel) = resolve_pixel(conn, screen.default_colormap, color)? else {
            warn!(color = %color, "Unrecognized border color, not drawing border");
            return Ok(());
        };

        self.active = Some((pixel, *width));
        self.build(conn, screen, target)
    }

    /// Follow the target after it moved or resized
    pub fn relayout(&mut self, conn: &RustConnection, screen: &Screen, target: Bounds) -> Result<()> {
        if !self.is_visible() {
            return Ok(());
        }
        self.destroy_edges(conn)?;
        self.build(conn, screen, target)
    }

    pub fn clear(&mut self, conn: &RustConnection) -> Result<()> {
        self.active = None;
        self.destroy_edges(conn)
    }

    fn build(&mut self, conn: &RustConnection, screen: &Screen, target: Bounds) -> Result<()> {
        let Some((pixel, width)) = self.active else {
            return Ok(());
        };

        for rect in edge_rects(target, width) {
            let edge = conn.generate_id().context("Failed to generate X11 window ID for border edge")?;
            conn.create_window(
                x11rb::COPY_DEPTH_FROM_PARENT,
                edge,
                screen.root,
                clamp_i16(rect.x),
                clamp_i16(rect.y),
                clamp_u16(rect.width),
                clamp_u16(rect.height),
                0,
                WindowClass::INPUT_OUTPUT,
                x11rb::COPY_FROM_PARENT,
                &CreateWindowAux::new()
                    .override_redirect(x11::OVERRIDE_REDIRECT)
                    .background_pixel(pixel),
            )
            .context(format!("Failed to create border edge at {}", rect))?;
            self.edges.push(edge);

            conn.change_property8(
                PropMode::REPLACE,
                edge,
                AtomEnum::WM_CLASS,
                AtomEnum::STRING,
                x11::OVERLAY_CLASS,
            )
            .context("Failed to set WM_CLASS on border edge")?;
            conn.map_window(edge)
                .context(format!("Failed to map border edge {}", edge))?;
            conn.configure_window(edge, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))
                .context(format!("Failed to raise border edge {}", edge))?;
        }

        conn.flush().context("Failed to flush X11 connection after drawing border")?;
        debug!(bounds = %target, width, edges = self.edges.len(), "Border drawn");
        Ok(())
    }

    fn destroy_edges(&mut self, conn: &RustConnection) -> Result<()> {
        if self.edges.is_empty() {
            return Ok(());
        }
        for edge in self.edges.drain(..) {
            conn.destroy_window(edge)
                .context(format!("Failed to destroy border edge {}", edge))?;
        }
        conn.flush().context("Failed to flush X11 connection after clearing border")?;
        Ok(())
    }
}

/// Allocate a pixel for a CSS color; `None` if it names nothing the server knows
fn resolve_pixel(conn: &RustConnection, colormap: Colormap, color: &str) -> Result<Option<u32>> {
    let Some(css) = CssColor::parse(color) else {
        return Ok(None);
    };

    if let Some((red, green, blue)) = css.to_x11_channels() {
        let reply = conn
            .alloc_color(colormap, red, green, blue)
            .context("Failed to send AllocColor request")?
            .reply()
            .context(format!("Failed to allocate color '{}'", color))?;
        return Ok(Some(reply.pixel));
    }

    let CssColor::Named(name) = css else {
        return Ok(None);
    };
    // An unknown name comes back as a protocol error, which just means "no color"
    Ok(conn
        .alloc_named_color(colormap, name.as_bytes())
        .context("Failed to send AllocNamedColor request")?
        .reply()
        .ok()
        .map(|reply| reply.pixel))
}
