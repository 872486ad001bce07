//! Cross-thread handoff into the UI thread.
//!
//! Hook and hotkey threads post immutable [`UiEvent`] values and return
//! immediately; the UI loop drains them in posting order.

use crate::platform::LayoutId;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// Events consumed by the UI thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    /// Layout observed at startup; no popup.
    LayoutSeeded(LayoutId),
    LayoutChanged(LayoutId),
    HotkeyPressed(i32),
    ExitRequested,
}

/// Sending side, cloned into foreign threads.
#[derive(Clone)]
pub struct UiPoster {
    tx: Sender<UiEvent>,
}

impl UiPoster {
    /// Queues an event. Never blocks.
    pub fn post(&self, event: UiEvent) -> bool {
        match self.tx.send(event) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to post UI event: {}", e);
                false
            }
        }
    }
}

/// Receiving side, owned by the UI thread.
pub struct UiQueue {
    rx: Receiver<UiEvent>,
}

impl UiQueue {
    /// Takes the next pending event, if any.
    ///
    /// `Err` means every poster is gone and nothing more can arrive.
    pub fn try_next(&self) -> Result<Option<UiEvent>, Disconnected> {
        match self.rx.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(Disconnected),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disconnected;

pub fn channel() -> (UiPoster, UiQueue) {
    let (tx, rx) = mpsc::channel();
    (UiPoster { tx }, UiQueue { rx })
}
