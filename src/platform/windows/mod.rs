//! Windows input service.
//!
//! Each installed resource (keyboard hook, hotkey) runs on its own message
//! thread; the service owns those threads through a handle table.

mod hotkey;
mod key_hook;
mod message_thread;

use super::{
    HandleKind, HandleTable, HookHandle, HotkeyBinding, HotkeyCallback, KeyHookCallback,
    LayoutId, LayoutQuery, PlatformInputService,
};
use crate::error::InputError;
use hotkey::HotkeyHandler;
use key_hook::KeyHookHandler;
use message_thread::MessageThread;
use parking_lot::Mutex;
use std::mem;
use windows::Win32::{
    Globalization::GetLocaleInfoW,
    UI::{
        Input::KeyboardAndMouse::{
            GetKeyboardLayout, GetKeyboardLayoutList, MapVirtualKeyW, SendInput, HKL, INPUT,
            INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS, KEYEVENTF_KEYUP,
            MAPVK_VK_TO_VSC, VIRTUAL_KEY,
        },
        WindowsAndMessaging::{GetForegroundWindow, GetWindowThreadProcessId},
    },
};

const LOCALE_SISO639LANGNAME: u32 = 0x59;

/// Keyboard layout of the foreground window's thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForegroundLayout;

impl LayoutQuery for ForegroundLayout {
    fn foreground_layout(&self) -> Result<LayoutId, InputError> {
        unsafe {
            let hwnd = GetForegroundWindow();
            if hwnd.0.is_null() {
                return Ok(LayoutId::UNKNOWN);
            }
            let thread_id = GetWindowThreadProcessId(hwnd, None);
            if thread_id == 0 {
                return Err(InputError::ForegroundQueryFailed(
                    "foreground window has no owning thread".into(),
                ));
            }
            let hkl = GetKeyboardLayout(thread_id);
            Ok(hkl_to_layout(hkl))
        }
    }
}

fn hkl_to_layout(hkl: HKL) -> LayoutId {
    LayoutId::new(hkl.0 as usize as u64)
}

/// Two-letter ISO 639 name for a LANGID, if the OS knows one.
pub fn iso_language_name(lang_id: u16) -> Option<String> {
    let mut buf = [0u16; 9];
    let len = unsafe { GetLocaleInfoW(lang_id as u32, LOCALE_SISO639LANGNAME, Some(&mut buf)) };
    // Length includes the terminating null
    if len != 3 {
        return None;
    }
    Some(String::from_utf16_lossy(&buf[..2]).to_uppercase())
}

pub struct WindowsInputService {
    settle_delay_ms: u32,
    watch_foreground: bool,
    handles: Mutex<HandleTable<MessageThread>>,
}

impl WindowsInputService {
    pub fn new(settle_delay_ms: u32, watch_foreground: bool) -> Self {
        Self {
            settle_delay_ms,
            watch_foreground,
            handles: Mutex::new(HandleTable::new()),
        }
    }
}

impl PlatformInputService for WindowsInputService {
    type Query = ForegroundLayout;

    fn install_key_hook(&self, callback: KeyHookCallback) -> Result<HookHandle, InputError> {
        let mut handles = self.handles.lock();
        if handles.contains_kind(HandleKind::KeyHook) {
            return Err(InputError::HookInstall(
                "a keyboard hook is already installed".into(),
            ));
        }

        let settle_ms = self.settle_delay_ms;
        let watch_foreground = self.watch_foreground;
        let thread = MessageThread::spawn("keyboard-hook", InputError::HookInstall, move || {
            KeyHookHandler::install(callback, settle_ms, watch_foreground)
        })?;

        Ok(handles.insert(HandleKind::KeyHook, thread))
    }

    fn uninstall_hook(&self, handle: HookHandle) -> Result<(), InputError> {
        let thread = self.handles.lock().remove(handle)?;
        thread.stop();
        Ok(())
    }

    fn layout_query(&self) -> ForegroundLayout {
        ForegroundLayout
    }

    fn available_layouts(&self) -> Vec<LayoutId> {
        unsafe {
            let count = GetKeyboardLayoutList(None);
            if count <= 0 {
                return Vec::new();
            }
            let mut list = vec![HKL::default(); count as usize];
            let written = GetKeyboardLayoutList(Some(&mut list));
            list.truncate(written.max(0) as usize);
            list.into_iter().map(hkl_to_layout).collect()
        }
    }

    fn register_hotkey(
        &self,
        binding: HotkeyBinding,
        callback: HotkeyCallback,
    ) -> Result<HookHandle, InputError> {
        let thread = MessageThread::spawn("hotkey", InputError::HotkeyConflict, move || {
            HotkeyHandler::register(binding, callback)
        })?;
        Ok(self.handles.lock().insert(HandleKind::Hotkey, thread))
    }

    fn synthesize_key_event(&self, vk: u16, key_down: bool) -> Result<(), InputError> {
        let scan = unsafe { MapVirtualKeyW(vk as u32, MAPVK_VK_TO_VSC) } as u16;
        let flags = if key_down {
            KEYBD_EVENT_FLAGS(0)
        } else {
            KEYEVENTF_KEYUP
        };
        let input = INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(vk),
                    wScan: scan,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        };

        let sent = unsafe { SendInput(&[input], mem::size_of::<INPUT>() as i32) };
        if sent == 1 {
            Ok(())
        } else {
            Err(InputError::Synthesis {
                vk,
                reason: windows::core::Error::from_win32().to_string(),
            })
        }
    }
}

impl Drop for WindowsInputService {
    fn drop(&mut self) {
        for (handle, thread) in self.handles.lock().drain() {
            log::warn!("Releasing {:?} left installed at shutdown", handle.kind());
            thread.stop();
        }
    }
}
