// ── RichEdit / edit-control message constants ─────────────────────────────────
//
// Source of truth: Richedit.h and WinUser.h.  Only the subset the text view
// needs is listed here.  All EM_* values are sent via
// SendMessageW(hwnd_edit, EM_*, wparam, lparam).

use windows::core::{PCSTR, PCWSTR, w};

/// Window class registered by `Msftedit.dll` (RichEdit 4.1+).
pub(super) const MSFTEDIT_CLASS: PCWSTR = w!("RICHEDIT50W");

const WM_USER: u32 = 0x0400;

// ── Styles ────────────────────────────────────────────────────────────────────

pub(super) const ES_MULTILINE: u32 = 0x0004;
pub(super) const ES_AUTOVSCROLL: u32 = 0x0040;
pub(super) const ES_AUTOHSCROLL: u32 = 0x0080;
/// Keep the selection visible while the control is unfocused.
pub(super) const ES_NOHIDESEL: u32 = 0x0100;
/// No typing or pasting; caret movement and selection still work.
pub(super) const ES_READONLY: u32 = 0x0800;

// ── Selection ─────────────────────────────────────────────────────────────────

/// Select `[WPARAM, LPARAM)` in UTF-16 units.  Equal values place the caret.
pub(super) const EM_SETSEL: u32 = 0x00B1;
/// Scroll the caret into view.
pub(super) const EM_SCROLLCARET: u32 = 0x00B7;
/// Read the selection into a `CharRange` at LPARAM.
pub(super) const EM_EXGETSEL: u32 = WM_USER + 52;

// ── Content ───────────────────────────────────────────────────────────────────

/// Raise the text limit (LPARAM = maximum characters).
pub(super) const EM_EXLIMITTEXT: u32 = WM_USER + 53;
/// Copy text.  WPARAM = `*const GetTextEx`; LPARAM = buffer.
pub(super) const EM_GETTEXTEX: u32 = WM_USER + 94;
/// Text length.  WPARAM = `*const GetTextLengthEx`.
pub(super) const EM_GETTEXTLENGTHEX: u32 = WM_USER + 95;

/// Switch between rich and plain text.  Only honoured while the control is
/// empty.  WPARAM = `TM_*` flags.
pub(super) const EM_SETTEXTMODE: u32 = WM_USER + 89;
/// Plain text: WM_SETTEXT no longer parses `{\rtf` content as RTF.
pub(super) const TM_PLAINTEXT: u32 = 0x01;
pub(super) const TM_MULTILEVELUNDO: u32 = 0x08;
pub(super) const TM_MULTICODEPAGE: u32 = 0x20;

pub(super) const GT_DEFAULT: u32 = 0;
pub(super) const GTL_PRECISE: u32 = 0x0002;
pub(super) const GTL_NUMCHARS: u32 = 0x0008;
/// UTF-16 LE "code page" for the *TEXTEX messages.
pub(super) const CP_UNICODE: u32 = 1200;

// ── Notifications ─────────────────────────────────────────────────────────────

/// Choose which notifications reach the parent.  LPARAM = `ENM_*` mask.
pub(super) const EM_SETEVENTMASK: u32 = WM_USER + 69;
pub(super) const ENM_SELCHANGE: u32 = 0x0008_0000;
/// `WM_NOTIFY` code sent when the selection (and so the caret) moves.
pub(crate) const EN_SELCHANGE: u32 = 0x0702;

// ── Structures ────────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Default)]
pub(super) struct CharRange {
    pub(super) cp_min: i32,
    pub(super) cp_max: i32,
}

#[repr(C)]
pub(super) struct GetTextEx {
    pub(super) cb: u32,
    pub(super) flags: u32,
    pub(super) codepage: u32,
    pub(super) default_char: PCSTR,
    pub(super) used_default_char: *mut i32,
}

#[repr(C)]
pub(super) struct GetTextLengthEx {
    pub(super) flags: u32,
    pub(super) codepage: u32,
}
