//! Keyboard hook thread.
//!
//! Watches for layout-switch key releases with `WH_KEYBOARD_LL` and, when
//! enabled, for foreground changes with `SetWinEventHook`. The layout is
//! applied by the OS after the key-up passes through the hook, so each
//! trigger (re)arms a short thread timer and the callback runs when it fires.

use super::message_thread::ThreadHandler;
use crate::error::InputError;
use crate::keys::is_layout_switch_key;
use crate::platform::{KeyHookCallback, KeyNotification};
use std::cell::Cell;
use windows::Win32::{
    Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, WPARAM},
    UI::{
        Accessibility::{SetWinEventHook, UnhookWinEvent, HWINEVENTHOOK},
        WindowsAndMessaging::{
            CallNextHookEx, KillTimer, SetTimer, SetWindowsHookExW, UnhookWindowsHookEx, HHOOK,
            KBDLLHOOKSTRUCT, MSG, WH_KEYBOARD_LL, WM_KEYUP, WM_SYSKEYUP, WM_TIMER,
        },
    },
};

// WinEvent constants
const WINEVENT_OUTOFCONTEXT: u32 = 0x0000;
const WINEVENT_SKIPOWNPROCESS: u32 = 0x0002;
const EVENT_SYSTEM_FOREGROUND: u32 = 0x0003;

/// State the hook procedures reach. Only ever touched on the hook thread.
struct HookThreadState {
    keyboard_hook: Cell<HHOOK>,
    settle_timer: Cell<usize>,
    settle_ms: Cell<u32>,
    pending: Cell<Option<KeyNotification>>,
}

thread_local! {
    static HOOK_THREAD: HookThreadState = HookThreadState {
        keyboard_hook: Cell::new(HHOOK::default()),
        settle_timer: Cell::new(0),
        settle_ms: Cell::new(50),
        pending: Cell::new(None),
    };
}

/// Starts or restarts the settle timer.
fn arm_settle_timer(note: KeyNotification) {
    HOOK_THREAD.with(|state| {
        state.pending.set(Some(note));
        // Passing the live id replaces that timer instead of adding one
        let id = unsafe {
            SetTimer(
                HWND::default(),
                state.settle_timer.get(),
                state.settle_ms.get(),
                None,
            )
        };
        if id == 0 {
            log::warn!("SetTimer failed, dropping {:?}", note);
        } else {
            state.settle_timer.set(id);
        }
    });
}

/// Low-level keyboard hook callback.
unsafe extern "system" fn keyboard_hook_proc(
    n_code: i32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    if n_code >= 0 {
        let kb = &*(l_param.0 as *const KBDLLHOOKSTRUCT);
        let vk = kb.vkCode as u16;
        let is_key_up = w_param.0 == WM_KEYUP as usize || w_param.0 == WM_SYSKEYUP as usize;

        if is_key_up && is_layout_switch_key(vk) {
            arm_settle_timer(KeyNotification::KeyUp { vk });
        }
    }

    let hook = HOOK_THREAD.with(|state| state.keyboard_hook.get());
    CallNextHookEx(hook, n_code, w_param, l_param)
}

/// WinEvent hook callback for foreground window changes.
unsafe extern "system" fn win_event_proc(
    _h_win_event_hook: HWINEVENTHOOK,
    _event: u32,
    _hwnd: HWND,
    _id_object: i32,
    _id_child: i32,
    _id_event_thread: u32,
    _dwms_event_time: u32,
) {
    arm_settle_timer(KeyNotification::ForegroundChanged);
}

pub(super) struct KeyHookHandler {
    callback: KeyHookCallback,
    keyboard_hook: HHOOK,
    foreground_hook: Option<HWINEVENTHOOK>,
}

impl KeyHookHandler {
    /// Installs the hooks on the calling thread.
    pub fn install(
        callback: KeyHookCallback,
        settle_ms: u32,
        watch_foreground: bool,
    ) -> Result<Self, InputError> {
        let keyboard_hook = unsafe {
            SetWindowsHookExW(
                WH_KEYBOARD_LL,
                Some(keyboard_hook_proc),
                HINSTANCE::default(),
                0,
            )
        }
        .map_err(|e| InputError::HookInstall(e.to_string()))?;

        HOOK_THREAD.with(|state| {
            state.keyboard_hook.set(keyboard_hook);
            state.settle_ms.set(settle_ms);
        });

        let foreground_hook = if watch_foreground {
            let hook = unsafe {
                SetWinEventHook(
                    EVENT_SYSTEM_FOREGROUND,
                    EVENT_SYSTEM_FOREGROUND,
                    None,
                    Some(win_event_proc),
                    0,
                    0,
                    WINEVENT_OUTOFCONTEXT | WINEVENT_SKIPOWNPROCESS,
                )
            };
            if hook.is_invalid() {
                // Key releases still work without it
                log::warn!("Foreground WinEvent hook unavailable");
                None
            } else {
                Some(hook)
            }
        } else {
            None
        };

        Ok(Self {
            callback,
            keyboard_hook,
            foreground_hook,
        })
    }
}

impl ThreadHandler for KeyHookHandler {
    fn on_message(&mut self, msg: &MSG) -> bool {
        if msg.message != WM_TIMER || !msg.hwnd.0.is_null() {
            return false;
        }

        let fired = HOOK_THREAD.with(|state| {
            let timer = state.settle_timer.get();
            if timer == 0 || msg.wParam.0 != timer {
                return None;
            }
            unsafe {
                let _ = KillTimer(HWND::default(), timer);
            }
            state.settle_timer.set(0);
            state.pending.take()
        });

        match fired {
            Some(note) => {
                (self.callback)(note);
                true
            }
            None => false,
        }
    }

    fn teardown(&mut self) {
        HOOK_THREAD.with(|state| {
            let timer = state.settle_timer.replace(0);
            if timer != 0 {
                unsafe {
                    let _ = KillTimer(HWND::default(), timer);
                }
            }
            state.pending.set(None);
            state.keyboard_hook.set(HHOOK::default());
        });

        unsafe {
            if let Err(e) = UnhookWindowsHookEx(self.keyboard_hook) {
                log::warn!("UnhookWindowsHookEx failed: {}", e);
            }
            if let Some(hook) = self.foreground_hook.take() {
                let _ = UnhookWinEvent(hook);
            }
        }
        log::debug!("Keyboard hooks removed");
    }
}
