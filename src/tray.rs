//! System tray module.
//!
//! Tray icon with a single "Exit" item. Lives on the UI thread.

use tray_icon::{
    menu::{Menu, MenuEvent, MenuId, MenuItem},
    Icon, TrayIcon, TrayIconBuilder,
};

/// Tray icon manager.
#[derive(Default)]
pub struct TrayIconManager {
    tray_icon: Option<TrayIcon>,
    menu_exit_id: Option<MenuId>,
}

impl TrayIconManager {
    /// Creates a new tray icon manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the tray icon image: a filled circle in the highlight color.
    fn create_icon() -> Result<Icon, tray_icon::BadIcon> {
        let size = 32u32;
        let mut rgba = vec![0u8; (size * size * 4) as usize];
        let center = size as f32 / 2.0;
        let radius = center - 2.0;

        for y in 0..size {
            for x in 0..size {
                let dx = x as f32 - center;
                let dy = y as f32 - center;
                if (dx * dx + dy * dy).sqrt() <= radius {
                    let idx = ((y * size + x) * 4) as usize;
                    rgba[idx..idx + 4].copy_from_slice(&[0x01, 0x7A, 0xFF, 0xFF]);
                }
            }
        }

        Icon::from_rgba(rgba, size, size)
    }

    /// Starts the tray icon.
    pub fn start(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let menu_exit = MenuItem::new("Exit", true, None);
        self.menu_exit_id = Some(menu_exit.id().clone());

        let menu = Menu::new();
        menu.append(&menu_exit)?;

        let tray = TrayIconBuilder::new()
            .with_icon(Self::create_icon()?)
            .with_tooltip("Layout popup")
            .with_menu(Box::new(menu))
            .build()?;

        self.tray_icon = Some(tray);
        Ok(())
    }

    /// Drains menu events. Returns true if "Exit" was chosen.
    pub fn exit_requested(&self) -> bool {
        let mut exit = false;
        while let Ok(event) = MenuEvent::receiver().try_recv() {
            if Some(&event.id) == self.menu_exit_id.as_ref() {
                log::info!("Tray: exit requested");
                exit = true;
            }
        }
        exit
    }

    /// Removes the tray icon.
    pub fn stop(&mut self) {
        if self.tray_icon.take().is_some() {
            log::debug!("Tray icon removed");
        }
    }
}
