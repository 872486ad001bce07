//! Error types for the input pipeline.

use thiserror::Error;

/// Errors raised by the platform input service and the layout pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// The OS refused to install the global key hook.
    #[error("failed to install keyboard hook: {0}")]
    HookInstall(String),
    /// Another process already owns the hotkey combination.
    #[error("hotkey {0} is already registered by another application")]
    HotkeyConflict(String),
    /// The handle was never issued or has already been removed.
    #[error("invalid or already released handle #{0}")]
    InvalidHandle(u64),
    /// The foreground layout could not be resolved this cycle.
    #[error("failed to query foreground layout: {0}")]
    ForegroundQueryFailed(String),
    /// Key injection was rejected by the OS.
    #[error("failed to synthesize key event for vk {vk:#04X}: {reason}")]
    Synthesis { vk: u16, reason: String },
}

impl InputError {
    /// Whether the application cannot continue after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::HookInstall(_) | Self::HotkeyConflict(_))
    }
}
