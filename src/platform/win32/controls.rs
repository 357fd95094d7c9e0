// ── Template slot controls ────────────────────────────────────────────────────
//
// Win32 implementations of the `ui` slot traits other than the text view:
//   • `FrameTitle`   – the frame's caption is the header bar
//   • `OpenButton`   – a BUTTON child; WndProc asks it which action to run
//   • `StatusLabel`  – a right-aligned STATIC child

#![allow(unsafe_code)]

use std::{cell::Cell, rc::Rc};

use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{HINSTANCE, HWND, LPARAM, WPARAM},
        Graphics::Gdi::{GetStockObject, DEFAULT_GUI_FONT},
        UI::WindowsAndMessaging::{
            CreateWindowExW, SendMessageW, SetWindowTextW, HMENU, WINDOW_EX_STYLE, WINDOW_STYLE,
            WM_SETFONT, WS_CHILD, WS_TABSTOP, WS_VISIBLE,
        },
    },
};

use crate::{
    app::Action,
    error::{Result, ViewerError},
    ui::{HeaderBar, OpenTrigger, PositionLabel},
};

const BS_PUSHBUTTON: u32 = 0x0000;
const SS_RIGHT: u32 = 0x0002;

/// Encode `s` as null-terminated UTF-16.
fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Create a child control of a system class with control id `id`.
fn create_child(
    parent: HWND,
    hinstance: HINSTANCE,
    class: PCWSTR,
    text: PCWSTR,
    style: WINDOW_STYLE,
    id: usize,
) -> Result<HWND> {
    // SAFETY: `class` names a system control class; parent and hinstance are
    // valid handles from window creation.  The control id travels in the
    // HMENU parameter for child windows.
    let hwnd = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            class,
            text,
            WS_CHILD | WS_VISIBLE | style,
            0, 0, 0, 0,
            parent,
            HMENU(id as *mut core::ffi::c_void),
            hinstance,
            None,
        )
    }
    .map_err(ViewerError::from)?;

    // SAFETY: hwnd was just created; DEFAULT_GUI_FONT is a stock object that
    // never needs freeing.  LPARAM(1) redraws with the new font.
    unsafe {
        let font = GetStockObject(DEFAULT_GUI_FONT);
        let _ = SendMessageW(hwnd, WM_SETFONT, WPARAM(font.0 as usize), LPARAM(1));
    }

    Ok(hwnd)
}

// ── Header bar ────────────────────────────────────────────────────────────────

pub(crate) struct FrameTitle(pub(crate) HWND);

impl HeaderBar for FrameTitle {
    fn set_title(&mut self, title: &str) {
        let title = wide(title);
        // SAFETY: self.0 is the main frame; `title` is null-terminated UTF-16
        // that outlives the call.
        unsafe {
            let _ = SetWindowTextW(self.0, PCWSTR(title.as_ptr()));
        }
    }
}

// ── Open button ───────────────────────────────────────────────────────────────

pub(crate) struct OpenButton {
    hwnd: HWND,
    action: Rc<Cell<Option<Action>>>,
}

impl OpenButton {
    pub(crate) fn create(parent: HWND, hinstance: HINSTANCE, id: usize) -> Result<Self> {
        let hwnd = create_child(
            parent,
            hinstance,
            w!("BUTTON"),
            w!("&Open"),
            WS_TABSTOP | WINDOW_STYLE(BS_PUSHBUTTON),
            id,
        )?;
        Ok(Self { hwnd, action: Rc::new(Cell::new(None)) })
    }

    pub(crate) fn hwnd(&self) -> HWND {
        self.hwnd
    }

    /// Shared view of the bound action, read by WndProc on `BN_CLICKED`.
    pub(crate) fn binding(&self) -> Rc<Cell<Option<Action>>> {
        Rc::clone(&self.action)
    }
}

impl OpenTrigger for OpenButton {
    fn bind_action(&mut self, action: Action) {
        self.action.set(Some(action));
    }
}

// ── Position label ────────────────────────────────────────────────────────────

pub(crate) struct StatusLabel(HWND);

impl StatusLabel {
    pub(crate) fn create(parent: HWND, hinstance: HINSTANCE, id: usize) -> Result<Self> {
        let hwnd =
            create_child(parent, hinstance, w!("STATIC"), w!(""), WINDOW_STYLE(SS_RIGHT), id)?;
        Ok(Self(hwnd))
    }

    pub(crate) fn hwnd(&self) -> HWND {
        self.0
    }
}

impl PositionLabel for StatusLabel {
    fn set_text(&mut self, text: &str) {
        let text = wide(text);
        // SAFETY: self.0 is the STATIC child; `text` is null-terminated
        // UTF-16 that outlives the call.
        unsafe {
            let _ = SetWindowTextW(self.0, PCWSTR(text.as_ptr()));
        }
    }
}
