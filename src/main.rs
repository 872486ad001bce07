//! langpop - keyboard layout change popup for Windows.

// Hide console window in release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
// The OS glue only exists on Windows; the core still builds and tests elsewhere
#![cfg_attr(not(windows), allow(dead_code))]

mod app;
mod config;
mod dispatch;
mod error;
mod hotkey;
mod keys;
mod labels;
mod platform;
mod popup;
mod service;
mod tracker;

#[cfg(windows)]
mod indicator;
#[cfg(windows)]
mod single_instance;
#[cfg(windows)]
mod tray;

#[cfg(windows)]
fn main() {
    use app::{App, Flow};
    use config::ConfigManager;
    use dispatch::UiEvent;
    use hotkey::HotkeyBridge;
    use indicator::IndicatorWindow;
    use platform::windows::WindowsInputService;
    use popup::PopupController;
    use service::LayoutService;
    use single_instance::{show_already_running_message, show_startup_error, InstanceGuard};
    use std::time::{Duration, Instant};
    use tray::TrayIconManager;
    use windows::Win32::{
        Foundation::HWND,
        UI::WindowsAndMessaging::{
            DispatchMessageW, PeekMessageW, TranslateMessage, MSG, PM_REMOVE, WM_QUIT,
        },
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("langpop starting...");

    let Some(instance) = InstanceGuard::acquire() else {
        log::warn!("Another instance is already running");
        show_already_running_message();
        return;
    };

    let config_manager = ConfigManager::new();
    let config = config_manager.load();
    log::info!("Configuration loaded from {}", config_manager.path().display());

    let Some(window) = IndicatorWindow::new(&config.popup) else {
        show_startup_error("the popup window could not be created");
        return;
    };
    let popup = PopupController::new(window, config.popup_settings());

    let bridge = if config.hotkey.enabled {
        let bridge = HotkeyBridge::from_config(&config.hotkey.combination);
        if bridge.is_none() {
            log::warn!(
                "Ignoring invalid hotkey combination {:?}",
                config.hotkey.combination
            );
        }
        bridge
    } else {
        None
    };

    let platform = WindowsInputService::new(config.settle_delay_ms, config.watch_foreground);
    let mut service = LayoutService::new(platform, bridge.as_ref().map(|b| b.binding()));
    let (poster, queue) = dispatch::channel();

    if let Err(e) = service.start(&poster) {
        log::error!("Failed to start layout service: {}", e);
        if e.is_fatal() {
            show_startup_error(&e.to_string());
            return;
        }
    }

    let mut app = App::new(service, popup, bridge, config.popup.show_all_layouts);

    let mut tray = TrayIconManager::new();
    if let Err(e) = tray.start() {
        log::error!("Failed to start tray icon: {}", e);
    }

    log::info!("langpop running");

    let mut msg = MSG::default();
    'running: loop {
        if tray.exit_requested() {
            poster.post(UiEvent::ExitRequested);
        }

        loop {
            match queue.try_next() {
                Ok(Some(event)) => {
                    if app.handle(event, Instant::now()) == Flow::Exit {
                        break 'running;
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    log::error!("UI event channel disconnected");
                    break 'running;
                }
            }
        }

        app.tick(Instant::now());

        unsafe {
            if PeekMessageW(&mut msg, HWND::default(), 0, 0, PM_REMOVE).as_bool() {
                if msg.message == WM_QUIT {
                    break;
                }
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            } else {
                std::thread::sleep(Duration::from_millis(16));
            }
        }
    }

    log::info!("langpop shutting down...");

    app.shutdown();
    tray.stop();
    drop(instance);

    log::info!("langpop stopped");
}

#[cfg(not(windows))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::error!("langpop only runs on Windows");
    std::process::exit(1);
}
