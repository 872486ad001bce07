//! Layout service.
//!
//! Single owner of the key hook and hotkey registration. Constructed once at
//! startup, `start()`ed, and `stop()`ped once at shutdown.

use crate::dispatch::{UiEvent, UiPoster};
use crate::error::InputError;
use crate::platform::{HookHandle, HotkeyBinding, PlatformInputService};
use crate::tracker::LayoutTracker;

pub struct LayoutService<P: PlatformInputService> {
    platform: P,
    hotkey: Option<HotkeyBinding>,
    key_hook: Option<HookHandle>,
    hotkey_handle: Option<HookHandle>,
}

impl<P: PlatformInputService> LayoutService<P> {
    /// Creates the service. `hotkey` is registered on start when set.
    pub fn new(platform: P, hotkey: Option<HotkeyBinding>) -> Self {
        Self {
            platform,
            hotkey,
            key_hook: None,
            hotkey_handle: None,
        }
    }

    /// Seeds the tracker, installs the key hook and registers the hotkey.
    ///
    /// On failure nothing stays installed.
    pub fn start(&mut self, poster: &UiPoster) -> Result<(), InputError> {
        if self.key_hook.is_some() {
            log::warn!("Layout service already started");
            return Ok(());
        }

        // Seed before the hook exists so startup never looks like a change
        let mut tracker = LayoutTracker::new(self.platform.layout_query());
        if let Some(initial) = tracker.seed() {
            log::info!("Initial layout: {}", initial);
            poster.post(UiEvent::LayoutSeeded(initial));
        }

        let layout_poster = poster.clone();
        let hook = self.platform.install_key_hook(Box::new(move |note| {
            if let Some(id) = tracker.observe(note) {
                layout_poster.post(UiEvent::LayoutChanged(id));
            }
        }))?;
        self.key_hook = Some(hook);
        log::info!("Keyboard hook installed");

        if let Some(binding) = self.hotkey {
            let hotkey_poster = poster.clone();
            let registered = self.platform.register_hotkey(
                binding,
                Box::new(move |id| {
                    hotkey_poster.post(UiEvent::HotkeyPressed(id));
                }),
            );
            match registered {
                Ok(handle) => {
                    self.hotkey_handle = Some(handle);
                    log::info!("Hotkey {} registered", binding.combination);
                }
                Err(e) => {
                    self.stop();
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// Removes the key hook, then the hotkey registration.
    pub fn stop(&mut self) {
        for handle in [self.key_hook.take(), self.hotkey_handle.take()]
            .into_iter()
            .flatten()
        {
            match self.platform.uninstall_hook(handle) {
                Ok(()) => log::debug!("Released {:?}", handle.kind()),
                Err(e) => log::warn!("{}", e),
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.key_hook.is_some()
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }
}

impl<P: PlatformInputService> Drop for LayoutService<P> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{self, UiQueue};
    use crate::hotkey::HotkeyBridge;
    use crate::platform::fake::{FakePlatform, Op};
    use crate::platform::{HandleKind, KeyNotification, LayoutId};

    const KEY_UP: KeyNotification = KeyNotification::KeyUp { vk: 0xA0 };

    fn drain(queue: &UiQueue) -> Vec<UiEvent> {
        let mut events = Vec::new();
        while let Ok(Some(event)) = queue.try_next() {
            events.push(event);
        }
        events
    }

    fn binding() -> Option<HotkeyBinding> {
        HotkeyBridge::from_config("shift+alt").map(|b| b.binding())
    }

    #[test]
    fn start_seeds_then_reports_changes() {
        let platform = FakePlatform::new();
        platform.layouts.push_ids(&[0x409, 0x409, 0x419]);
        let mut service = LayoutService::new(platform, binding());
        let (poster, queue) = dispatch::channel();

        service.start(&poster).unwrap();
        service.platform().fire_key(KEY_UP);
        service.platform().fire_key(KEY_UP);
        service.platform().fire_hotkey(9000);

        assert_eq!(
            drain(&queue),
            vec![
                UiEvent::LayoutSeeded(LayoutId::new(0x409)),
                UiEvent::LayoutChanged(LayoutId::new(0x419)),
                UiEvent::HotkeyPressed(9000),
            ]
        );
    }

    #[test]
    fn stop_releases_hook_before_hotkey_once() {
        let mut service = LayoutService::new(FakePlatform::new(), binding());
        let (poster, _queue) = dispatch::channel();
        service.start(&poster).unwrap();

        service.stop();
        service.stop();

        assert!(!service.is_running());
        assert_eq!(
            service.platform().ops(),
            vec![
                Op::InstallKeyHook,
                Op::RegisterHotkey(9000),
                Op::Uninstall(HandleKind::KeyHook),
                Op::Uninstall(HandleKind::Hotkey),
            ]
        );
    }

    #[test]
    fn hotkey_conflict_rolls_back_hook() {
        let mut platform = FakePlatform::new();
        platform.conflict = true;
        let mut service = LayoutService::new(platform, binding());
        let (poster, _queue) = dispatch::channel();

        let err = service.start(&poster).unwrap_err();
        assert!(matches!(err, InputError::HotkeyConflict(_)));
        assert!(err.is_fatal());
        assert!(!service.is_running());
        assert!(!service.platform().hook_installed());
    }

    #[test]
    fn hook_refusal_is_reported() {
        let mut platform = FakePlatform::new();
        platform.refuse_hook = true;
        let mut service = LayoutService::new(platform, binding());
        let (poster, _queue) = dispatch::channel();

        assert!(matches!(
            service.start(&poster),
            Err(InputError::HookInstall(_))
        ));
        assert!(service.platform().ops().is_empty());
    }

    #[test]
    fn runs_without_hotkey() {
        let mut service = LayoutService::new(FakePlatform::new(), None);
        let (poster, _queue) = dispatch::channel();
        service.start(&poster).unwrap();
        assert_eq!(service.platform().ops(), vec![Op::InstallKeyHook]);
    }
}
