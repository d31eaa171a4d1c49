//! Window control seam
//!
//! Everything the daemon does to the target window goes through
//! `WindowController`. The X11 adapter lives in `x11`; tests use the
//! recording double in `testing`.

pub mod border;
pub mod x11;

use anyhow::Result;

use crate::types::{BorderStyle, Bounds};

/// Host signals the daemon reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    Focus,
    Blur,
    /// Target window was destroyed
    Closed,
}

pub trait WindowController {
    fn set_always_on_top(&mut self, on_top: bool) -> Result<()>;

    /// `opacity` is in `0.0..=1.0`
    fn set_opacity(&mut self, opacity: f64) -> Result<()>;

    fn set_bounds(&mut self, bounds: Bounds) -> Result<()>;

    fn bounds(&self) -> Result<Bounds>;

    fn set_border(&mut self, border: &BorderStyle) -> Result<()>;

    /// Queried synchronously; never assumed
    fn has_focus(&self) -> Result<bool>;

    /// Start delivering focus/blur signals and return the focus observed
    /// once listening; later signals are transitions from that value
    fn subscribe_focus(&mut self) -> Result<bool>;

    fn unsubscribe_focus(&mut self) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        AlwaysOnTop(bool),
        Opacity(f64),
        Bounds(Bounds),
        Border(String),
        Subscribe,
        Unsubscribe,
    }

    /// Records every mutation; `bounds()` and `has_focus()` answer from fields
    #[derive(Debug, Default)]
    pub struct RecordingWindow {
        pub calls: Vec<Call>,
        pub focused: bool,
        pub current_bounds: Option<Bounds>,
        pub fail_opacity: bool,
        pub fail_subscribe: bool,
        pub focus_queries: Cell<usize>,
    }

    impl RecordingWindow {
        pub fn focused() -> Self {
            Self { focused: true, ..Self::default() }
        }

        pub fn take_calls(&mut self) -> Vec<Call> {
            std::mem::take(&mut self.calls)
        }

        pub fn count(&self, call: &Call) -> usize {
            self.calls.iter().filter(|c| *c == call).count()
        }
    }

    impl WindowController for RecordingWindow {
        fn set_always_on_top(&mut self, on_top: bool) -> Result<()> {
            self.calls.push(Call::AlwaysOnTop(on_top));
            Ok(())
        }

        fn set_opacity(&mut self, opacity: f64) -> Result<()> {
            if self.fail_opacity {
                anyhow::bail!("compositor unavailable");
            }
            self.calls.push(Call::Opacity(opacity));
            Ok(())
        }

        fn set_bounds(&mut self, bounds: Bounds) -> Result<()> {
            self.current_bounds = Some(bounds);
            self.calls.push(Call::Bounds(bounds));
            Ok(())
        }

        fn bounds(&self) -> Result<Bounds> {
            self.current_bounds
                .ok_or_else(|| anyhow::anyhow!("window has no geometry"))
        }

        fn set_border(&mut self, border: &BorderStyle) -> Result<()> {
            self.calls.push(Call::Border(border.to_string()));
            Ok(())
        }

        fn has_focus(&self) -> Result<bool> {
            self.focus_queries.set(self.focus_queries.get() + 1);
            Ok(self.focused)
        }

        fn subscribe_focus(&mut self) -> Result<bool> {
            if self.fail_subscribe {
                anyhow::bail!("focus events unavailable");
            }
            self.calls.push(Call::Subscribe);
            self.has_focus()
        }

        fn unsubscribe_focus(&mut self) -> Result<()> {
            self.calls.push(Call::Unsubscribe);
            Ok(())
        }
    }
}
