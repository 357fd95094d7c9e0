// ── RichEdit text view hosting ────────────────────────────────────────────────
//
// `RichEditDll` owns the single `LoadLibraryW` call for `Msftedit.dll`,
// which registers the `RICHEDIT50W` class.  It is stored in `WindowState`
// after the controller, so it is freed only once the child window is gone.
//
// `RichEditView` is the `TextSurface` the controller writes to.  RichEdit
// counts positions in UTF-16 units and stores paragraph breaks as a lone
// `\r`; both are translated here so the controller sees characters.

#![allow(unsafe_code)]

mod messages;

pub(crate) use messages::EN_SELCHANGE;

use messages::{
    CharRange, GetTextEx, GetTextLengthEx, CP_UNICODE, EM_EXGETSEL, EM_EXLIMITTEXT,
    EM_GETTEXTEX, EM_GETTEXTLENGTHEX, EM_SCROLLCARET, EM_SETEVENTMASK, EM_SETSEL,
    EM_SETTEXTMODE, ENM_SELCHANGE, ES_AUTOHSCROLL, ES_AUTOVSCROLL, ES_MULTILINE, ES_NOHIDESEL,
    ES_READONLY, GTL_NUMCHARS, GTL_PRECISE, GT_DEFAULT, MSFTEDIT_CLASS, TM_MULTICODEPAGE,
    TM_MULTILEVELUNDO, TM_PLAINTEXT,
};

use std::cell::Cell;

use windows::{
    core::{w, PCSTR, PCWSTR},
    Win32::{
        Foundation::{FreeLibrary, HINSTANCE, HMODULE, HWND, LPARAM, WPARAM},
        System::LibraryLoader::LoadLibraryW,
        UI::WindowsAndMessaging::{
            CreateWindowExW, SendMessageW, SetWindowTextW, HMENU, WINDOW_STYLE, WS_CHILD,
            WS_EX_CLIENTEDGE, WS_HSCROLL, WS_TABSTOP, WS_VISIBLE, WS_VSCROLL,
        },
    },
};

use crate::{
    editor::{char_offset_from_utf16, utf16_offset_from_char, CaretTracker, TextSurface},
    error::{Result, ViewerError},
};

// ── RichEditDll ───────────────────────────────────────────────────────────────

/// RAII handle to the loaded `Msftedit.dll`.
pub(crate) struct RichEditDll(HMODULE);

impl RichEditDll {
    pub(crate) fn load() -> Result<Self> {
        // SAFETY: the literal is a valid null-terminated UTF-16 string.
        // Msftedit.dll is a system DLL resolved from System32.
        let dll = unsafe { LoadLibraryW(w!("Msftedit.dll")) }.map_err(ViewerError::from)?;
        Ok(Self(dll))
    }
}

impl Drop for RichEditDll {
    fn drop(&mut self) {
        // SAFETY: self.0 came from a successful LoadLibraryW and has not been
        // freed.  The RichEdit child is destroyed with its parent before
        // WindowState (and so this handle) is dropped in WM_NCDESTROY.
        unsafe {
            let _ = FreeLibrary(self.0);
        }
    }
}

// ── RichEditView ──────────────────────────────────────────────────────────────

pub(crate) struct RichEditView {
    hwnd: HWND,
    /// In UTF-16 units, like the control's selection.
    caret: Cell<CaretTracker>,
}

impl RichEditView {
    /// Create the text view as a child of `parent` with control id `id`.
    ///
    /// `_dll` proves the `RICHEDIT50W` class is registered.
    pub(crate) fn create(
        parent: HWND,
        hinstance: HINSTANCE,
        id: usize,
        _dll: &RichEditDll,
    ) -> Result<Self> {
        let style = WS_CHILD
            | WS_VISIBLE
            | WS_VSCROLL
            | WS_HSCROLL
            | WS_TABSTOP
            | WINDOW_STYLE(
                ES_MULTILINE | ES_AUTOVSCROLL | ES_AUTOHSCROLL | ES_NOHIDESEL | ES_READONLY,
            );

        // SAFETY: MSFTEDIT_CLASS is registered (_dll is alive); parent and
        // hinstance are valid handles from window creation.  The control id
        // travels in the HMENU parameter for child windows.
        let hwnd = unsafe {
            CreateWindowExW(
                WS_EX_CLIENTEDGE,
                MSFTEDIT_CLASS,
                PCWSTR::null(),
                style,
                0, 0, 0, 0,
                parent,
                HMENU(id as *mut core::ffi::c_void),
                hinstance,
                None,
            )
        }
        .map_err(ViewerError::from)?;

        // SAFETY: hwnd is the RichEdit control just created.  All three
        // messages are documented initialisation calls with scalar parameters.
        unsafe {
            // Must precede any content.  Without it, text starting with
            // `{\rtf` is rendered as a formatted document.
            let mode = TM_PLAINTEXT | TM_MULTILEVELUNDO | TM_MULTICODEPAGE;
            let _ = SendMessageW(hwnd, EM_SETTEXTMODE, WPARAM(mode as usize), LPARAM(0));
            // Lift the 32K default so large files are not cut off.
            let _ = SendMessageW(hwnd, EM_EXLIMITTEXT, WPARAM(0), LPARAM(0x7FFF_FFFE));
            let _ = SendMessageW(hwnd, EM_SETEVENTMASK, WPARAM(0), LPARAM(ENM_SELCHANGE as isize));
        }

        Ok(Self { hwnd, caret: Cell::default() })
    }

    pub(crate) fn hwnd(&self) -> HWND {
        self.hwnd
    }

    /// The selection as `(min, max)` UTF-16 positions.
    fn selection(&self) -> (usize, usize) {
        let mut range = CharRange::default();
        // SAFETY: hwnd valid; `range` is a live CHARRANGE the control writes.
        unsafe {
            let _ = SendMessageW(
                self.hwnd,
                EM_EXGETSEL,
                WPARAM(0),
                LPARAM(&mut range as *mut CharRange as isize),
            );
        }
        (range.cp_min.max(0) as usize, range.cp_max.max(0) as usize)
    }

    /// The caret in UTF-16 units.  RichEdit has no caret query of its own,
    /// so the end of the selection that moved is taken as the caret.
    fn caret_units(&self) -> usize {
        let (min, max) = self.selection();
        let mut caret = self.caret.get();
        let units = caret.observe(min, max);
        self.caret.set(caret);
        units
    }
}

impl TextSurface for RichEditView {
    fn set_text(&mut self, text: &str) {
        // WM_SETTEXT stops at the first NUL; show NULs as U+2400 so every
        // character keeps its offset.
        let wide: Vec<u16> = text
            .chars()
            .map(|c| if c == '\0' { '\u{2400}' } else { c })
            .collect::<String>()
            .encode_utf16()
            .chain(std::iter::once(0))
            .collect();
        // SAFETY: hwnd valid; `wide` is null-terminated UTF-16 that outlives
        // the call.
        unsafe {
            let _ = SetWindowTextW(self.hwnd, PCWSTR(wide.as_ptr()));
        }
    }

    fn text(&self) -> String {
        let length = GetTextLengthEx { flags: GTL_PRECISE | GTL_NUMCHARS, codepage: CP_UNICODE };
        // SAFETY: hwnd valid; `length` is a live GETTEXTLENGTHEX.
        let units = unsafe {
            SendMessageW(
                self.hwnd,
                EM_GETTEXTLENGTHEX,
                WPARAM(&length as *const GetTextLengthEx as usize),
                LPARAM(0),
            )
            .0
        }
        .max(0) as usize;

        let mut buf = vec![0u16; units + 1];
        let request = GetTextEx {
            cb: (buf.len() * std::mem::size_of::<u16>()) as u32,
            flags: GT_DEFAULT,
            codepage: CP_UNICODE,
            default_char: PCSTR::null(),
            used_default_char: std::ptr::null_mut(),
        };
        // SAFETY: hwnd valid; `request.cb` is the byte size of `buf`, so the
        // control writes at most `units` characters plus the terminator.
        let copied = unsafe {
            SendMessageW(
                self.hwnd,
                EM_GETTEXTEX,
                WPARAM(&request as *const GetTextEx as usize),
                LPARAM(buf.as_mut_ptr() as isize),
            )
            .0
        }
        .clamp(0, units as isize) as usize;

        String::from_utf16_lossy(&buf[..copied])
    }

    fn cursor_offset(&self) -> usize {
        self.snapshot().1
    }

    fn snapshot(&self) -> (String, usize) {
        let text = self.text();
        let offset = char_offset_from_utf16(&text, self.caret_units());
        (text, offset)
    }

    fn place_cursor(&mut self, offset: usize) {
        let units = utf16_offset_from_char(&self.text(), offset);
        self.caret.get_mut().collapse(units);
        // SAFETY: hwnd valid; equal start/end collapses the selection to a
        // caret, which EM_SETSEL clamps to the document length.
        unsafe {
            let _ = SendMessageW(self.hwnd, EM_SETSEL, WPARAM(units), LPARAM(units as isize));
            let _ = SendMessageW(self.hwnd, EM_SCROLLCARET, WPARAM(0), LPARAM(0));
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
