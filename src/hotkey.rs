//! Hotkey bridge.
//!
//! Registering Alt+Shift as a global hotkey swallows the keystroke, so the OS
//! never sees it as a layout switch. On each trigger the bridge pops up the
//! current label and replays the combination as synthesized input, which the
//! OS then turns into a real layout change for the tracker to pick up.

use crate::error::InputError;
use crate::keys::{parse_combination, KeyCombination};
use crate::platform::{HotkeyBinding, PlatformInputService};
use crate::popup::{Anchor, PopupContent, PopupController, PopupView};
use std::time::Instant;

/// Registration id of the layout hotkey.
pub const LAYOUT_HOTKEY_ID: i32 = 9000;

pub struct HotkeyBridge {
    binding: HotkeyBinding,
}

impl HotkeyBridge {
    pub fn new(binding: HotkeyBinding) -> Self {
        Self { binding }
    }

    /// Builds a bridge from a combination string such as "shift+alt".
    pub fn from_config(combination: &str) -> Option<Self> {
        let combination = parse_combination(combination)?;
        Some(Self::new(HotkeyBinding {
            combination,
            id: LAYOUT_HOTKEY_ID,
        }))
    }

    pub fn binding(&self) -> HotkeyBinding {
        self.binding
    }

    /// Handles a hotkey trigger. Returns false for foreign ids.
    pub fn trigger<P, V>(
        &self,
        id: i32,
        current: PopupContent,
        popup: &mut PopupController<V>,
        platform: &P,
        now: Instant,
    ) -> bool
    where
        P: PlatformInputService,
        V: PopupView,
    {
        if id != self.binding.id {
            log::warn!("Ignoring unknown hotkey id {}", id);
            return false;
        }

        popup.show(current, Anchor::PointerOffset, now);

        if let Err(e) = replay(platform, self.binding.combination) {
            log::warn!("{}", e);
        }
        true
    }
}

/// Key-down for every key of the combination, then key-up in the same order.
pub fn press_sequence(combination: KeyCombination) -> Vec<(u16, bool)> {
    let mut keys = combination.modifiers.virtual_keys();
    if !keys.contains(&combination.virtual_key) {
        keys.push(combination.virtual_key);
    }
    keys.iter()
        .map(|vk| (*vk, true))
        .chain(keys.iter().map(|vk| (*vk, false)))
        .collect()
}

fn replay<P: PlatformInputService>(
    platform: &P,
    combination: KeyCombination,
) -> Result<(), InputError> {
    let sequence = press_sequence(combination);
    let mut failure = None;
    for (vk, down) in sequence {
        // Key-ups still go out after a failed key-down so nothing stays held.
        if let Err(e) = platform.synthesize_key_event(vk, down) {
            failure.get_or_insert(e);
        }
    }
    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
