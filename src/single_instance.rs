//! Single instance module.
//!
//! Ensures only one instance of the application is running using a named
//! Windows mutex; a second copy would fail to register the same hotkey.

use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{CloseHandle, GetLastError, ERROR_ALREADY_EXISTS, HANDLE},
        System::Threading::CreateMutexW,
        UI::WindowsAndMessaging::{MessageBoxW, MB_ICONERROR, MB_ICONINFORMATION, MB_OK},
    },
};

const APP_TITLE: &str = "Layout Popup";

/// Holds the instance mutex until dropped.
pub struct InstanceGuard {
    handle: HANDLE,
}

impl InstanceGuard {
    /// Claims the instance mutex.
    ///
    /// Returns `None` if another instance already holds it.
    pub fn acquire() -> Option<Self> {
        unsafe {
            match CreateMutexW(None, true, w!("Global\\LangpopMutex_UniqueInstance")) {
                Ok(handle) => {
                    if GetLastError() == ERROR_ALREADY_EXISTS {
                        let _ = CloseHandle(handle);
                        None
                    } else {
                        Some(Self { handle })
                    }
                }
                // Failed to create mutex - assume another instance is running
                Err(_) => None,
            }
        }
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.handle);
        }
    }
}

fn message_box(text: &str, error: bool) {
    let title: Vec<u16> = APP_TITLE.encode_utf16().chain(std::iter::once(0)).collect();
    let message: Vec<u16> = text.encode_utf16().chain(std::iter::once(0)).collect();
    let icon = if error { MB_ICONERROR } else { MB_ICONINFORMATION };

    unsafe {
        let _ = MessageBoxW(
            None,
            PCWSTR(message.as_ptr()),
            PCWSTR(title.as_ptr()),
            MB_OK | icon,
        );
    }
}

/// Tells the user that the application is already running.
pub fn show_already_running_message() {
    message_box(
        "Layout Popup is already running.\n\nLook for the icon in the system tray.",
        false,
    );
}

/// Reports a startup failure the user has to resolve.
pub fn show_startup_error(reason: &str) {
    message_box(&format!("Layout Popup cannot start:\n\n{}", reason), true);
}
