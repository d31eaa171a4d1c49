//! Control message types for settings window ↔ daemon communication

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::editor::{BoundsSlot, Field, Toggle};
use crate::types::Bounds;

/// Requests sent from the settings window to the daemon
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ControlRequest {
    /// Current settings document
    GetSettings,

    /// Flip one feature switch
    SetToggle { toggle: Toggle, enabled: bool },

    /// Raw text typed into a field; parsed and validated by the daemon
    Edit { field: Field, input: String },

    /// Store the target window's current geometry in a bounds slot
    CaptureBounds { slot: BoundsSlot },

    /// Health check
    Ping,

    /// Request graceful shutdown (restores the window)
    Shutdown,
}

/// Responses sent from the daemon to the settings window
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ControlResponse {
    /// Settings after the request was handled
    Settings(Settings),

    /// Bounds captured from the target window, with the updated settings
    Captured { bounds: Bounds, settings: Settings },

    /// Input refused; `settings` is unchanged
    Rejected { reason: String, settings: Settings },

    /// Health check response
    Pong,

    /// Acknowledgment that request was processed
    Ready,

    /// Error occurred
    Error(String),
}
