//! Recording platform used by tests.

use super::{
    HandleKind, HandleTable, HookHandle, HotkeyBinding, HotkeyCallback, KeyHookCallback,
    KeyNotification, LayoutId, LayoutQuery, PlatformInputService,
};
use crate::error::InputError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    InstallKeyHook,
    RegisterHotkey(i32),
    Uninstall(HandleKind),
    Key { vk: u16, down: bool },
}

/// Scripted foreground layouts. The last answer repeats once the script runs out.
#[derive(Clone, Default)]
pub struct ScriptedLayouts {
    inner: Arc<Mutex<(VecDeque<Result<LayoutId, InputError>>, Option<LayoutId>)>>,
}

impl ScriptedLayouts {
    pub fn push(&self, answer: Result<LayoutId, InputError>) {
        self.inner.lock().0.push_back(answer);
    }

    pub fn push_ids(&self, ids: &[u64]) {
        for id in ids {
            self.push(Ok(LayoutId::new(*id)));
        }
    }
}

impl LayoutQuery for ScriptedLayouts {
    fn foreground_layout(&self) -> Result<LayoutId, InputError> {
        let mut inner = self.inner.lock();
        match inner.0.pop_front() {
            Some(Ok(id)) => {
                inner.1 = Some(id);
                Ok(id)
            }
            Some(Err(e)) => Err(e),
            None => Ok(inner.1.unwrap_or(LayoutId::UNKNOWN)),
        }
    }
}

enum Resource {
    KeyHook,
    Hotkey,
}

#[derive(Default)]
pub struct FakePlatform {
    pub layouts: ScriptedLayouts,
    pub installed: Vec<LayoutId>,
    pub refuse_hook: bool,
    pub conflict: bool,
    pub reject_synthesis: bool,
    ops: Mutex<Vec<Op>>,
    handles: Mutex<HandleTable<Resource>>,
    key_callback: Mutex<Option<KeyHookCallback>>,
    hotkey_callback: Mutex<Option<HotkeyCallback>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> Vec<Op> {
        self.ops.lock().clone()
    }

    pub fn synthesized(&self) -> Vec<(u16, bool)> {
        self.ops
            .lock()
            .iter()
            .filter_map(|op| match op {
                Op::Key { vk, down } => Some((*vk, *down)),
                _ => None,
            })
            .collect()
    }

    /// Delivers a notification as the hook thread would.
    pub fn fire_key(&self, note: KeyNotification) {
        if let Some(cb) = self.key_callback.lock().as_mut() {
            cb(note);
        }
    }

    pub fn fire_hotkey(&self, id: i32) {
        if let Some(cb) = self.hotkey_callback.lock().as_mut() {
            cb(id);
        }
    }

    pub fn hook_installed(&self) -> bool {
        self.key_callback.lock().is_some()
    }
}

impl PlatformInputService for FakePlatform {
    type Query = ScriptedLayouts;

    fn install_key_hook(&self, callback: KeyHookCallback) -> Result<HookHandle, InputError> {
        let mut handles = self.handles.lock();
        if self.refuse_hook || handles.contains_kind(HandleKind::KeyHook) {
            return Err(InputError::HookInstall("refused".into()));
        }
        self.ops.lock().push(Op::InstallKeyHook);
        *self.key_callback.lock() = Some(callback);
        Ok(handles.insert(HandleKind::KeyHook, Resource::KeyHook))
    }

    fn uninstall_hook(&self, handle: HookHandle) -> Result<(), InputError> {
        match self.handles.lock().remove(handle)? {
            Resource::KeyHook => *self.key_callback.lock() = None,
            Resource::Hotkey => *self.hotkey_callback.lock() = None,
        }
        self.ops.lock().push(Op::Uninstall(handle.kind()));
        Ok(())
    }

    fn layout_query(&self) -> ScriptedLayouts {
        self.layouts.clone()
    }

    fn available_layouts(&self) -> Vec<LayoutId> {
        self.installed.clone()
    }

    fn register_hotkey(
        &self,
        binding: HotkeyBinding,
        callback: HotkeyCallback,
    ) -> Result<HookHandle, InputError> {
        if self.conflict {
            return Err(InputError::HotkeyConflict(binding.combination.to_string()));
        }
        self.ops.lock().push(Op::RegisterHotkey(binding.id));
        *self.hotkey_callback.lock() = Some(callback);
        Ok(self.handles.lock().insert(HandleKind::Hotkey, Resource::Hotkey))
    }

    fn synthesize_key_event(&self, vk: u16, key_down: bool) -> Result<(), InputError> {
        if self.reject_synthesis {
            return Err(InputError::Synthesis {
                vk,
                reason: "blocked".into(),
            });
        }
        self.ops.lock().push(Op::Key { vk, down: key_down });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uninstalling_twice_reports_invalid_handle() {
        let platform = FakePlatform::new();
        let handle = platform.install_key_hook(Box::new(|_| {})).unwrap();

        assert!(platform.uninstall_hook(handle).is_ok());
        assert!(matches!(
            platform.uninstall_hook(handle),
            Err(InputError::InvalidHandle(_))
        ));
        assert_eq!(
            platform.ops(),
            vec![Op::InstallKeyHook, Op::Uninstall(HandleKind::KeyHook)]
        );
    }

    #[test]
    fn only_one_key_hook_at_a_time() {
        let platform = FakePlatform::new();
        let _first = platform.install_key_hook(Box::new(|_| {})).unwrap();
        assert!(matches!(
            platform.install_key_hook(Box::new(|_| {})),
            Err(InputError::HookInstall(_))
        ));
    }
}
