//! UI-thread coordinator.
//!
//! Consumes [`UiEvent`]s in posting order and drives the popup. Everything
//! here runs on the UI thread.

use crate::dispatch::UiEvent;
use crate::hotkey::HotkeyBridge;
use crate::labels::LanguageLabelMap;
use crate::platform::{LayoutId, PlatformInputService};
use crate::popup::{Anchor, PopupContent, PopupController, PopupView};
use crate::service::LayoutService;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct App<P: PlatformInputService, V: PopupView> {
    service: LayoutService<P>,
    popup: PopupController<V>,
    bridge: Option<HotkeyBridge>,
    labels: LanguageLabelMap,
    show_all_layouts: bool,
    /// Last layout learned through the queue.
    current: Option<LayoutId>,
}

impl<P: PlatformInputService, V: PopupView> App<P, V> {
    pub fn new(
        service: LayoutService<P>,
        popup: PopupController<V>,
        bridge: Option<HotkeyBridge>,
        show_all_layouts: bool,
    ) -> Self {
        Self {
            service,
            popup,
            bridge,
            labels: LanguageLabelMap::new(),
            show_all_layouts,
            current: None,
        }
    }

    pub fn handle(&mut self, event: UiEvent, now: Instant) -> Flow {
        match event {
            UiEvent::LayoutSeeded(id) => {
                self.current = Some(id);
            }
            UiEvent::LayoutChanged(id) => {
                let previous = self.current.replace(id);
                let content = self.content_for(id);
                log::info!(
                    "Layout: {} -> {}",
                    previous
                        .map(|p| self.labels.label(p))
                        .unwrap_or_else(|| "?".to_string()),
                    content.text()
                );
                self.popup.show(content, Anchor::BelowPointer, now);
            }
            UiEvent::HotkeyPressed(id) => {
                let content = match self.current {
                    Some(current) => self.content_for(current),
                    None => self.content_for(LayoutId::UNKNOWN),
                };
                if let Some(bridge) = &self.bridge {
                    log::debug!("Hotkey {}: cycling layout", id);
                    bridge.trigger(id, content, &mut self.popup, self.service.platform(), now);
                }
            }
            UiEvent::ExitRequested => return Flow::Exit,
        }
        Flow::Continue
    }

    pub fn tick(&mut self, now: Instant) {
        self.popup.tick(now);
    }

    /// Closes the popup and releases the hook, then the hotkey.
    pub fn shutdown(&mut self) {
        self.popup.close();
        self.service.stop();
    }

    fn content_for(&mut self, id: LayoutId) -> PopupContent {
        let label = self.labels.label(id);
        if !self.show_all_layouts {
            return PopupContent::single(&label);
        }

        let installed = self.service.platform().available_layouts();
        if installed.is_empty() {
            return PopupContent::single(&label);
        }
        let active = installed.iter().position(|l| *l == id);
        let cells = installed.into_iter().map(|l| self.labels.label(l)).collect();
        PopupContent { cells, active }
    }

    pub fn current_layout(&self) -> Option<LayoutId> {
        self.current
    }

    #[cfg(test)]
    pub fn popup(&self) -> &PopupController<V> {
        &self.popup
    }

    #[cfg(test)]
    pub fn service(&self) -> &LayoutService<P> {
        &self.service
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{self, UiQueue};
    use crate::hotkey::LAYOUT_HOTKEY_ID;
    use crate::keys::{VK_MENU, VK_SHIFT};
    use crate::platform::fake::{FakePlatform, Op};
    use crate::platform::{HandleKind, KeyNotification};
    use crate::popup::testing::RecordingView;
    use crate::popup::PopupSettings;
    use std::time::Duration;

    const EN: u64 = 0x0409_0409;
    const RU: u64 = 0x0419_0419;

    fn app(platform: FakePlatform, show_all: bool) -> (App<FakePlatform, RecordingView>, UiQueue) {
        let bridge = HotkeyBridge::from_config("shift+alt");
        let mut service = LayoutService::new(platform, bridge.as_ref().map(|b| b.binding()));
        let (poster, queue) = dispatch::channel();
        service.start(&poster).unwrap();
        let popup = PopupController::new(RecordingView::new(), PopupSettings::default());
        (App::new(service, popup, bridge, show_all), queue)
    }

    fn pump(app: &mut App<FakePlatform, RecordingView>, queue: &UiQueue, now: Instant) -> Flow {
        while let Ok(Some(event)) = queue.try_next() {
            if app.handle(event, now) == Flow::Exit {
                return Flow::Exit;
            }
        }
        Flow::Continue
    }

    #[test]
    fn startup_does_not_show_popup() {
        let platform = FakePlatform::new();
        platform.layouts.push_ids(&[EN]);
        let (mut app, queue) = app(platform, false);

        pump(&mut app, &queue, Instant::now());
        assert_eq!(app.current_layout(), Some(LayoutId::new(EN)));
        assert!(app.popup().view().presented.is_empty());
    }

    #[test]
    fn layout_change_shows_new_label_under_pointer() {
        let platform = FakePlatform::new();
        platform.layouts.push_ids(&[EN, RU]);
        let (mut app, queue) = app(platform, false);

        app.service()
            .platform()
            .fire_key(KeyNotification::KeyUp { vk: VK_SHIFT });
        pump(&mut app, &queue, Instant::now());

        let shown = &app.popup().view().presented[0];
        assert_eq!(shown.content.text(), "RU");
        assert_eq!(shown.position.x, 500 - 12);
    }

    #[test]
    fn hotkey_shows_current_label_and_cycles() {
        let platform = FakePlatform::new();
        platform.layouts.push_ids(&[EN]);
        let (mut app, queue) = app(platform, false);
        pump(&mut app, &queue, Instant::now());

        app.service().platform().fire_hotkey(LAYOUT_HOTKEY_ID);
        pump(&mut app, &queue, Instant::now());

        assert_eq!(app.popup().view().presented[0].content.text(), "EN");
        assert_eq!(
            app.service().platform().synthesized(),
            vec![
                (VK_MENU, true),
                (VK_SHIFT, true),
                (VK_MENU, false),
                (VK_SHIFT, false)
            ]
        );
    }

    #[test]
    fn all_layouts_shown_with_active_cell() {
        let mut platform = FakePlatform::new();
        platform.installed = vec![LayoutId::new(EN), LayoutId::new(RU)];
        platform.layouts.push_ids(&[EN, RU]);
        let (mut app, queue) = app(platform, true);

        app.service()
            .platform()
            .fire_key(KeyNotification::KeyUp { vk: VK_SHIFT });
        pump(&mut app, &queue, Instant::now());

        let shown = &app.popup().view().presented[0];
        assert_eq!(shown.content.cells, vec!["EN".to_string(), "RU".to_string()]);
        assert_eq!(shown.content.active, Some(1));
        assert_eq!(shown.width, 48);
    }

    #[test]
    fn shutdown_closes_popup_and_releases_in_order() {
        let platform = FakePlatform::new();
        platform.layouts.push_ids(&[EN, RU]);
        let (mut app, queue) = app(platform, false);
        let t0 = Instant::now();

        app.service()
            .platform()
            .fire_key(KeyNotification::KeyUp { vk: VK_SHIFT });
        pump(&mut app, &queue, t0);
        app.shutdown();
        app.tick(t0 + Duration::from_secs(3));

        assert!(!app.popup().is_visible());
        assert_eq!(app.popup().view().hides, 1);
        assert_eq!(app.popup().view().presented.len(), 1);
        let ops = app.service().platform().ops();
        assert_eq!(
            &ops[ops.len() - 2..],
            &[
                Op::Uninstall(HandleKind::KeyHook),
                Op::Uninstall(HandleKind::Hotkey)
            ]
        );
    }

    #[test]
    fn exit_event_stops_loop() {
        let (mut app, _queue) = app(FakePlatform::new(), false);
        assert_eq!(app.handle(UiEvent::ExitRequested, Instant::now()), Flow::Exit);
    }
}
