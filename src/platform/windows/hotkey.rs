//! Global hotkey thread.

use super::message_thread::ThreadHandler;
use crate::error::InputError;
use crate::platform::{HotkeyBinding, HotkeyCallback};
use windows::Win32::{
    Foundation::HWND,
    UI::Input::KeyboardAndMouse::{RegisterHotKey, UnregisterHotKey, HOT_KEY_MODIFIERS, MOD_NOREPEAT},
    UI::WindowsAndMessaging::{MSG, WM_HOTKEY},
};

pub(super) struct HotkeyHandler {
    binding: HotkeyBinding,
    callback: HotkeyCallback,
}

impl HotkeyHandler {
    /// Registers the hotkey for the calling thread.
    pub fn register(binding: HotkeyBinding, callback: HotkeyCallback) -> Result<Self, InputError> {
        let modifiers = HOT_KEY_MODIFIERS(binding.combination.modifiers.0) | MOD_NOREPEAT;
        let vk = binding.combination.virtual_key as u32;

        if let Err(e) = unsafe { RegisterHotKey(HWND::default(), binding.id, modifiers, vk) } {
            log::error!("RegisterHotKey({}) failed: {}", binding.combination, e);
            return Err(InputError::HotkeyConflict(binding.combination.to_string()));
        }

        Ok(Self { binding, callback })
    }
}

impl ThreadHandler for HotkeyHandler {
    fn on_message(&mut self, msg: &MSG) -> bool {
        if msg.message != WM_HOTKEY || msg.wParam.0 as i32 != self.binding.id {
            return false;
        }
        (self.callback)(self.binding.id);
        true
    }

    fn teardown(&mut self) {
        unsafe {
            if let Err(e) = UnregisterHotKey(HWND::default(), self.binding.id) {
                log::warn!("UnregisterHotKey({}) failed: {}", self.binding.id, e);
            }
        }
    }
}
