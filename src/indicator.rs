//! Indicator window module.
//!
//! Layered, click-through popup that draws one cell per layout with the
//! active layout highlighted. Created and driven on the UI thread.

use crate::config::{parse_hex_color, PopupConfig};
use crate::popup::{Point, PopupState, PopupView, Rect};
use std::sync::atomic::{AtomicBool, Ordering};
use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{COLORREF, HWND, LPARAM, LRESULT, POINT, RECT, WPARAM},
        Graphics::Gdi::{
            BeginPaint, CreateFontW, CreateSolidBrush, DeleteObject, DrawTextW, EndPaint,
            FillRect, InvalidateRect, SelectObject, SetBkMode, SetTextColor, DT_CENTER,
            DT_SINGLELINE, DT_VCENTER, HFONT, PAINTSTRUCT, TRANSPARENT,
        },
        System::LibraryLoader::GetModuleHandleW,
        UI::WindowsAndMessaging::{
            CreateWindowExW, DefWindowProcW, DestroyWindow, GetClientRect, GetCursorPos,
            GetSystemMetrics, GetWindowLongPtrW, IsWindow, RegisterClassW,
            SetLayeredWindowAttributes, SetWindowLongPtrW, SetWindowPos, ShowWindow, CS_HREDRAW,
            CS_VREDRAW, GWLP_USERDATA, HWND_TOPMOST, LWA_ALPHA, SM_CXVIRTUALSCREEN,
            SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN, SM_YVIRTUALSCREEN, SWP_NOACTIVATE,
            SWP_SHOWWINDOW, SW_HIDE, WM_DESTROY, WM_PAINT, WNDCLASSW, WS_EX_LAYERED,
            WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_EX_TRANSPARENT, WS_POPUP,
        },
    },
};

fn class_name() -> PCWSTR {
    w!("LangpopIndicator")
}

static CLASS_REGISTERED: AtomicBool = AtomicBool::new(false);

type Rgb = (u8, u8, u8);

/// Window state stored in GWLP_USERDATA.
struct WindowState {
    cells: Vec<String>,
    active: Option<usize>,
    cell_width: i32,
    active_colors: (Rgb, Rgb),
    idle_colors: (Rgb, Rgb),
    font: HFONT,
}

fn colorref((r, g, b): Rgb) -> COLORREF {
    COLORREF(r as u32 | ((g as u32) << 8) | ((b as u32) << 16))
}

/// Registers the window class.
fn register_class() -> bool {
    if CLASS_REGISTERED.load(Ordering::SeqCst) {
        return true;
    }

    unsafe {
        let hinstance = GetModuleHandleW(None).unwrap_or_default();

        let wc = WNDCLASSW {
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(window_proc),
            hInstance: hinstance.into(),
            lpszClassName: class_name(),
            ..Default::default()
        };

        if RegisterClassW(&wc) != 0 {
            CLASS_REGISTERED.store(true, Ordering::SeqCst);
            true
        } else {
            log::error!("RegisterClassW failed");
            false
        }
    }
}

/// Window procedure for the indicator.
unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_PAINT => {
            let mut ps = PAINTSTRUCT::default();
            let hdc = BeginPaint(hwnd, &mut ps);

            let ptr = GetWindowLongPtrW(hwnd, GWLP_USERDATA);
            if ptr != 0 {
                let state = &*(ptr as *const WindowState);

                let mut client = RECT::default();
                let _ = GetClientRect(hwnd, &mut client);

                let _ = SetBkMode(hdc, TRANSPARENT);
                let old_font = SelectObject(hdc, state.font);

                for (i, cell) in state.cells.iter().enumerate() {
                    let (bg, fg) = if state.active == Some(i) {
                        state.active_colors
                    } else {
                        state.idle_colors
                    };
                    let mut rect = RECT {
                        left: i as i32 * state.cell_width,
                        top: client.top,
                        right: (i as i32 + 1) * state.cell_width,
                        bottom: client.bottom,
                    };

                    let brush = CreateSolidBrush(colorref(bg));
                    FillRect(hdc, &rect, brush);
                    let _ = DeleteObject(brush);

                    SetTextColor(hdc, colorref(fg));
                    let mut text: Vec<u16> = cell.encode_utf16().collect();
                    DrawTextW(
                        hdc,
                        &mut text,
                        &mut rect,
                        DT_CENTER | DT_VCENTER | DT_SINGLELINE,
                    );
                }

                SelectObject(hdc, old_font);
            }

            let _ = EndPaint(hwnd, &ps);
            LRESULT(0)
        }
        WM_DESTROY => {
            // Cleanup: get state pointer, delete font, free memory
            let ptr = GetWindowLongPtrW(hwnd, GWLP_USERDATA);
            if ptr != 0 {
                SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
                let state = Box::from_raw(ptr as *mut WindowState);
                let _ = DeleteObject(state.font);
            }
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

/// The popup window.
pub struct IndicatorWindow {
    hwnd: HWND,
}

impl IndicatorWindow {
    /// Creates the (hidden) indicator window.
    pub fn new(config: &PopupConfig) -> Option<Self> {
        if !register_class() {
            return None;
        }

        // Convert opacity percent (0–100) to alpha byte (0–255)
        let alpha = ((config.opacity.min(100) as f32 / 100.0) * 255.0) as u8;

        unsafe {
            let hinstance = GetModuleHandleW(None).unwrap_or_default();

            // WS_EX_TRANSPARENT makes window click-through
            let hwnd = match CreateWindowExW(
                WS_EX_LAYERED
                    | WS_EX_TOPMOST
                    | WS_EX_TOOLWINDOW
                    | WS_EX_TRANSPARENT
                    | WS_EX_NOACTIVATE,
                class_name(),
                PCWSTR::null(),
                WS_POPUP,
                0,
                0,
                config.cell_width,
                config.cell_height,
                HWND::default(),
                None,
                hinstance,
                None,
            ) {
                Ok(h) if !h.0.is_null() => h,
                _ => {
                    log::error!("Failed to create indicator window");
                    return None;
                }
            };

            let _ = SetLayeredWindowAttributes(hwnd, COLORREF(0), alpha, LWA_ALPHA);

            let font_name: Vec<u16> = config
                .font_family
                .encode_utf16()
                .chain(std::iter::once(0))
                .collect();
            let font = CreateFontW(
                config.font_size as i32,
                0,
                0,
                0,
                700, // FW_BOLD
                0,
                0,
                0,
                0,
                0,
                0,
                0,
                0,
                PCWSTR(font_name.as_ptr()),
            );

            let colors = &config.colors;
            let state = Box::new(WindowState {
                cells: Vec::new(),
                active: None,
                cell_width: config.cell_width.max(1),
                active_colors: (
                    parse_hex_color(&colors.active_bg),
                    parse_hex_color(&colors.active_fg),
                ),
                idle_colors: (
                    parse_hex_color(&colors.idle_bg),
                    parse_hex_color(&colors.idle_fg),
                ),
                font,
            });
            SetWindowLongPtrW(hwnd, GWLP_USERDATA, Box::into_raw(state) as isize);

            log::debug!("Created indicator window {:?}", hwnd.0);
            Some(Self { hwnd })
        }
    }
}

impl PopupView for IndicatorWindow {
    fn pointer_position(&self) -> Point {
        let mut pt = POINT::default();
        unsafe {
            if GetCursorPos(&mut pt).is_err() {
                log::debug!("GetCursorPos failed");
            }
        }
        Point { x: pt.x, y: pt.y }
    }

    fn visible_bounds(&self) -> Rect {
        unsafe {
            let left = GetSystemMetrics(SM_XVIRTUALSCREEN);
            let top = GetSystemMetrics(SM_YVIRTUALSCREEN);
            Rect {
                left,
                top,
                right: left + GetSystemMetrics(SM_CXVIRTUALSCREEN),
                bottom: top + GetSystemMetrics(SM_CYVIRTUALSCREEN),
            }
        }
    }

    fn present(&mut self, popup: &PopupState) {
        unsafe {
            let ptr = GetWindowLongPtrW(self.hwnd, GWLP_USERDATA);
            if ptr != 0 {
                let state = &mut *(ptr as *mut WindowState);
                state.cells = popup.content.cells.clone();
                state.active = popup.content.active;
            }

            let _ = SetWindowPos(
                self.hwnd,
                HWND_TOPMOST,
                popup.position.x,
                popup.position.y,
                popup.width,
                popup.height,
                SWP_NOACTIVATE | SWP_SHOWWINDOW,
            );
            let _ = InvalidateRect(self.hwnd, None, true);
        }
    }

    fn hide(&mut self) {
        unsafe {
            let _ = ShowWindow(self.hwnd, SW_HIDE);
        }
    }
}

impl Drop for IndicatorWindow {
    fn drop(&mut self) {
        unsafe {
            if IsWindow(self.hwnd).as_bool() {
                let _ = DestroyWindow(self.hwnd);
            }
        }
    }
}
