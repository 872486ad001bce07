//! Popup controller.
//!
//! Owns the indicator's visibility, content, position and auto-hide deadline.
//! Runs on the UI thread only. The deadline is recomputed on every `show`, so
//! a repeated trigger restarts the countdown instead of stacking timers.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Screen rectangle, right/bottom exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    /// Moves a `width` x `height` box at `origin` fully inside this rectangle.
    ///
    /// A box larger than the rectangle is pinned to its top-left corner.
    pub fn clamp_origin(&self, origin: Point, width: i32, height: i32) -> Point {
        let clamp = |v: i32, lo: i32, hi: i32| if v > hi { hi.max(lo) } else { v.max(lo) };
        Point {
            x: clamp(origin.x, self.left, self.right - width),
            y: clamp(origin.y, self.top, self.bottom - height),
        }
    }
}

/// Where the popup goes relative to the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Top-left corner at pointer + offset (hotkey trigger).
    PointerOffset,
    /// Horizontally centered under the pointer (layout change).
    BelowPointer,
}

/// Fixed popup geometry and timing.
#[derive(Debug, Clone, Copy)]
pub struct PopupSettings {
    pub hide_delay: Duration,
    pub cell_width: i32,
    pub cell_height: i32,
    pub pointer_offset: i32,
}

impl Default for PopupSettings {
    fn default() -> Self {
        Self {
            hide_delay: Duration::from_millis(2000),
            cell_width: 24,
            cell_height: 18,
            pointer_offset: 10,
        }
    }
}

/// What the popup displays: one cell per layout, one of them active.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PopupContent {
    pub cells: Vec<String>,
    pub active: Option<usize>,
}

impl PopupContent {
    pub fn single(label: &str) -> Self {
        Self {
            cells: vec![label.to_string()],
            active: Some(0),
        }
    }

    /// Text of the active cell.
    pub fn text(&self) -> &str {
        self.active
            .and_then(|i| self.cells.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PopupState {
    pub visible: bool,
    pub content: PopupContent,
    pub position: Point,
    pub width: i32,
    pub height: i32,
    pub expires_at: Option<Instant>,
}

/// The on-screen indicator the controller drives.
pub trait PopupView {
    fn pointer_position(&self) -> Point;
    /// Area the popup must stay inside.
    fn visible_bounds(&self) -> Rect;
    /// Draws the state and makes the window visible.
    fn present(&mut self, state: &PopupState);
    fn hide(&mut self);
}

pub struct PopupController<V: PopupView> {
    view: V,
    settings: PopupSettings,
    state: PopupState,
}

impl<V: PopupView> PopupController<V> {
    pub fn new(view: V, settings: PopupSettings) -> Self {
        Self {
            view,
            settings,
            state: PopupState::default(),
        }
    }

    /// Shows `content` and restarts the countdown from `now`.
    pub fn show(&mut self, content: PopupContent, anchor: Anchor, now: Instant) {
        let width = self.settings.cell_width * content.cells.len().max(1) as i32;
        let height = self.settings.cell_height;
        let position = self.place(anchor, width, height);

        if self.state.visible {
            log::debug!("Popup already shown, restarting countdown");
        }
        self.state = PopupState {
            visible: true,
            content,
            position,
            width,
            height,
            expires_at: Some(now + self.settings.hide_delay),
        };
        log::debug!(
            "Popup '{}' at ({}, {})",
            self.state.content.text(),
            position.x,
            position.y
        );
        self.view.present(&self.state);
    }

    /// Hides the popup once its deadline has passed.
    ///
    /// Returns true if this call hid it.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.state.expires_at {
            Some(deadline) if self.state.visible && now >= deadline => {
                log::debug!("Auto-hide");
                self.hide_now();
                true
            }
            _ => false,
        }
    }

    /// Hides immediately and drops the deadline.
    pub fn close(&mut self) {
        if self.state.visible {
            self.hide_now();
        }
        self.state.expires_at = None;
    }

    fn hide_now(&mut self) {
        self.state.visible = false;
        self.state.expires_at = None;
        self.view.hide();
    }

    fn place(&self, anchor: Anchor, width: i32, height: i32) -> Point {
        let pointer = self.view.pointer_position();
        let offset = self.settings.pointer_offset;
        let origin = match anchor {
            Anchor::PointerOffset => Point {
                x: pointer.x + offset,
                y: pointer.y + offset,
            },
            Anchor::BelowPointer => Point {
                x: pointer.x - width / 2,
                y: pointer.y + offset,
            },
        };
        self.view.visible_bounds().clamp_origin(origin, width, height)
    }

    pub fn state(&self) -> &PopupState {
        &self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state.visible
    }

    #[cfg(test)]
    pub fn view(&self) -> &V {
        &self.view
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingView;
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn controller() -> PopupController<RecordingView> {
        PopupController::new(RecordingView::new(), PopupSettings::default())
    }

    #[test]
    fn reshow_resets_rather_than_extends() {
        let t0 = Instant::now();
        let mut popup = controller();

        popup.show(PopupContent::single("EN"), Anchor::BelowPointer, t0);
        popup.show(PopupContent::single("RU"), Anchor::BelowPointer, t0 + ms(1500));

        assert!(!popup.tick(t0 + ms(2000)));
        assert!(!popup.tick(t0 + ms(3499)));
        assert!(popup.tick(t0 + ms(3500)));
        assert!(!popup.is_visible());
        assert_eq!(popup.view().hides, 1);
        assert_eq!(popup.view().presented.len(), 2);
    }

    #[test]
    fn expired_popup_hides_exactly_once() {
        let t0 = Instant::now();
        let mut popup = controller();
        popup.show(PopupContent::single("EN"), Anchor::PointerOffset, t0);

        assert!(popup.tick(t0 + ms(2000)));
        assert!(!popup.tick(t0 + ms(2100)));
        assert!(!popup.tick(t0 + ms(9000)));
        assert_eq!(popup.view().hides, 1);
        assert_eq!(popup.state().expires_at, None);
    }

    #[test]
    fn visible_implies_deadline() {
        let t0 = Instant::now();
        let mut popup = controller();
        assert_eq!(popup.state().expires_at, None);

        popup.show(PopupContent::single("EN"), Anchor::PointerOffset, t0);
        assert!(popup.is_visible());
        assert_eq!(popup.state().expires_at, Some(t0 + ms(2000)));
    }

    #[test]
    fn close_cancels_pending_hide() {
        let t0 = Instant::now();
        let mut popup = controller();
        popup.show(PopupContent::single("EN"), Anchor::PointerOffset, t0);
        popup.close();

        assert!(!popup.is_visible());
        assert_eq!(popup.view().hides, 1);
        assert!(!popup.tick(t0 + ms(3000)));
        assert_eq!(popup.view().hides, 1);
        assert_eq!(popup.view().presented.len(), 1);

        popup.close();
        assert_eq!(popup.view().hides, 1);
    }

    #[test]
    fn pointer_offset_anchor() {
        let mut popup = controller();
        popup.show(PopupContent::single("EN"), Anchor::PointerOffset, Instant::now());
        let state = popup.state();
        assert_eq!(state.position, Point { x: 510, y: 410 });
        assert_eq!((state.width, state.height), (24, 18));
    }

    #[test]
    fn below_pointer_anchor_centers_on_cells() {
        let mut popup = controller();
        let content = PopupContent {
            cells: vec!["EN".into(), "RU".into(), "UK".into(), "DE".into()],
            active: Some(1),
        };
        popup.show(content, Anchor::BelowPointer, Instant::now());
        let state = popup.state();
        assert_eq!(state.width, 96);
        assert_eq!(state.position, Point { x: 452, y: 410 });
        assert_eq!(state.content.text(), "RU");
    }

    #[test]
    fn placement_is_clamped_to_screen() {
        let mut view = RecordingView::new();
        view.pointer = Point { x: 1915, y: 1075 };
        let mut popup = PopupController::new(view, PopupSettings::default());
        popup.show(PopupContent::single("EN"), Anchor::PointerOffset, Instant::now());
        assert_eq!(popup.state().position, Point { x: 1896, y: 1062 });

        popup.view.pointer = Point { x: 3, y: -40 };
        popup.show(
            PopupContent {
                cells: vec!["EN".into(), "RU".into()],
                active: Some(0),
            },
            Anchor::BelowPointer,
            Instant::now(),
        );
        assert_eq!(popup.state().position, Point { x: 0, y: 0 });
    }

    #[test]
    fn oversized_popup_pins_to_top_left() {
        let bounds = Rect {
            left: 0,
            top: 0,
            right: 40,
            bottom: 10,
        };
        assert_eq!(
            bounds.clamp_origin(Point { x: 30, y: 5 }, 100, 18),
            Point { x: 0, y: 0 }
        );
    }
}
