//! Dedicated thread with its own Win32 message loop.
//!
//! Low-level hooks, WinEvent hooks, thread timers and `RegisterHotKey` with a
//! null window all deliver to the thread that set them up, so each resource
//! gets a thread that installs it, pumps messages and tears it down again.

use crate::error::InputError;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use windows::Win32::{
    Foundation::{HWND, LPARAM, WPARAM},
    System::Threading::GetCurrentThreadId,
    UI::WindowsAndMessaging::{
        DispatchMessageW, GetMessageW, PeekMessageW, PostThreadMessageW, TranslateMessage, MSG,
        PM_NOREMOVE, WM_QUIT, WM_USER,
    },
};

/// Resource living on a message thread.
pub(super) trait ThreadHandler {
    /// Returns true if the message was consumed.
    fn on_message(&mut self, msg: &MSG) -> bool;

    /// Runs on the thread after the loop exits.
    fn teardown(&mut self);
}

pub(super) struct MessageThread {
    name: String,
    thread_id: u32,
    thread: Option<JoinHandle<()>>,
}

impl MessageThread {
    /// Spawns the thread and runs `setup` on it.
    ///
    /// Returns once setup has finished; a setup error is returned as is and
    /// the thread is gone. `spawn_error` wraps failures to start the thread.
    pub fn spawn<F, H>(
        name: &str,
        spawn_error: fn(String) -> InputError,
        setup: F,
    ) -> Result<Self, InputError>
    where
        F: FnOnce() -> Result<H, InputError> + Send + 'static,
        H: ThreadHandler,
    {
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<u32, InputError>>(1);

        let thread = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut msg = MSG::default();
                // Create this thread's message queue before anyone posts to it
                unsafe {
                    let _ = PeekMessageW(&mut msg, HWND::default(), WM_USER, WM_USER, PM_NOREMOVE);
                }

                let mut handler = match setup() {
                    Ok(handler) => handler,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                let _ = ready_tx.send(Ok(unsafe { GetCurrentThreadId() }));
                message_loop(&mut handler);
                handler.teardown();
            })
            .map_err(|e| spawn_error(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(thread_id)) => {
                log::debug!("{} thread {} running", name, thread_id);
                Ok(Self {
                    name: name.to_string(),
                    thread_id,
                    thread: Some(thread),
                })
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(spawn_error(format!("{} thread exited during setup", name)))
            }
        }
    }

    /// Quits the loop and waits for teardown.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };

        unsafe {
            if let Err(e) = PostThreadMessageW(self.thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) {
                log::warn!("Failed to post WM_QUIT to {} thread: {}", self.name, e);
            }
        }

        if thread.join().is_err() {
            log::error!("{} thread panicked", self.name);
        } else {
            log::debug!("{} thread stopped", self.name);
        }
    }
}

impl Drop for MessageThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn message_loop<H: ThreadHandler>(handler: &mut H) {
    let mut msg = MSG::default();
    loop {
        let result = unsafe { GetMessageW(&mut msg, HWND::default(), 0, 0) };
        if result.0 == 0 || result.0 == -1 {
            break;
        }
        if !handler.on_message(&msg) {
            unsafe {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
    }
}
