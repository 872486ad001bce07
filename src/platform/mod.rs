//! Platform input service.
//!
//! Capability surface over the OS input subsystem:
//! - global low-level key hook (key-up notifications on a hook thread)
//! - foreground keyboard layout queries
//! - global hotkey registration
//! - synthetic key injection
//!
//! The Windows backend lives in [`windows`]; tests use [`fake`].

#[cfg(test)]
pub mod fake;
#[cfg(windows)]
pub mod windows;

use crate::error::InputError;
use crate::keys::KeyCombination;
use std::collections::HashMap;
use std::fmt;

/// Opaque keyboard layout identifier (an HKL value on Windows).
///
/// Compared by equality only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayoutId(u64);

impl LayoutId {
    /// Sentinel for "no focused window".
    pub const UNKNOWN: Self = Self(0);

    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn is_unknown(self) -> bool {
        self == Self::UNKNOWN
    }

    /// Language identifier carried in the low word.
    pub fn language_id(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }
}

impl fmt::Display for LayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    KeyHook,
    Hotkey,
}

/// Token for an installed hook or hotkey registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookHandle {
    id: u64,
    kind: HandleKind,
}

impl HookHandle {
    pub fn kind(&self) -> HandleKind {
        self.kind
    }
}

/// A global hotkey bound to a process-unique id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyBinding {
    pub combination: KeyCombination,
    pub id: i32,
}

/// What made the hook thread look at the layout again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyNotification {
    /// A layout-switch key was released.
    KeyUp { vk: u16 },
    /// Another window came to the foreground.
    ForegroundChanged,
}

/// Callback invoked on the hook thread. Must return quickly.
pub type KeyHookCallback = Box<dyn FnMut(KeyNotification) + Send>;

/// Callback invoked on the hotkey thread with the binding id.
pub type HotkeyCallback = Box<dyn FnMut(i32) + Send>;

/// Resolves the layout of the foreground window.
///
/// Separate from [`PlatformInputService`] so it can be moved onto the hook
/// thread.
pub trait LayoutQuery: Send {
    fn foreground_layout(&self) -> Result<LayoutId, InputError>;
}

/// OS input capabilities used by the layout pipeline.
pub trait PlatformInputService {
    type Query: LayoutQuery + 'static;

    /// Installs the global key-up hook.
    fn install_key_hook(&self, callback: KeyHookCallback) -> Result<HookHandle, InputError>;

    /// Removes a key hook or hotkey registration.
    fn uninstall_hook(&self, handle: HookHandle) -> Result<(), InputError>;

    /// Returns a layout query that can be moved to another thread.
    fn layout_query(&self) -> Self::Query;

    fn query_foreground_layout(&self) -> Result<LayoutId, InputError> {
        self.layout_query().foreground_layout()
    }

    /// Installed layouts in system order.
    fn available_layouts(&self) -> Vec<LayoutId>;

    fn register_hotkey(
        &self,
        binding: HotkeyBinding,
        callback: HotkeyCallback,
    ) -> Result<HookHandle, InputError>;

    /// Injects a single key event into the system input stream.
    fn synthesize_key_event(&self, vk: u16, key_down: bool) -> Result<(), InputError>;
}

/// Owner table for live OS resources keyed by handle.
///
/// Removing a handle yields its resource exactly once.
pub struct HandleTable<T> {
    next_id: u64,
    live: HashMap<u64, (HandleKind, T)>,
}

impl<T> HandleTable<T> {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            live: HashMap::new(),
        }
    }

    pub fn insert(&mut self, kind: HandleKind, resource: T) -> HookHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id, (kind, resource));
        HookHandle { id, kind }
    }

    pub fn remove(&mut self, handle: HookHandle) -> Result<T, InputError> {
        match self.live.get(&handle.id) {
            Some((kind, _)) if *kind == handle.kind => {}
            _ => return Err(InputError::InvalidHandle(handle.id)),
        }
        self.live
            .remove(&handle.id)
            .map(|(_, resource)| resource)
            .ok_or(InputError::InvalidHandle(handle.id))
    }

    pub fn contains_kind(&self, kind: HandleKind) -> bool {
        self.live.values().any(|(k, _)| *k == kind)
    }

    /// Removes every remaining resource.
    pub fn drain(&mut self) -> Vec<(HookHandle, T)> {
        self.live
            .drain()
            .map(|(id, (kind, resource))| (HookHandle { id, kind }, resource))
            .collect()
    }
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
