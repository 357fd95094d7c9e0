// ── Common dialogs ─────────────────────────────────────────────────────────────
//
// The "Open File" common dialog, and the `FilePicker` that drives it.
//
// The dialog runs its own modal message loop, and WndProc must not hold the
// controller borrowed while it does.  So `DialogPicker::request` only parks
// the reply and posts `WM_APP_OPEN_DIALOG`; WndProc shows the dialog when it
// gets that message, with no borrow held, and answers the parked reply.
//
// This is inside `platform::win32` so `unsafe` is permitted per crate policy.

#![allow(unsafe_code)]

use std::{cell::RefCell, ffi::OsString, os::windows::ffi::OsStringExt, path::PathBuf, rc::Rc};

use windows::{
    core::{w, PCWSTR, PWSTR},
    Win32::{
        Foundation::{HWND, LPARAM, WPARAM},
        UI::{
            Controls::Dialogs::{
                GetOpenFileNameW, OFN_EXPLORER, OFN_FILEMUSTEXIST, OFN_HIDEREADONLY,
                OFN_PATHMUSTEXIST, OPENFILENAMEW,
            },
            WindowsAndMessaging::PostMessageW,
        },
    },
};

use crate::{
    events::Reply,
    loader::{FileHandle, FilePicker},
};

use super::window::WM_APP_OPEN_DIALOG;

// ── Buffer size ───────────────────────────────────────────────────────────────

/// Maximum path length in `WCHAR`s, including the null terminator.
/// `MAX_PATH` (260) is too short for modern Windows paths; use 32 768 which
/// is the documented maximum for `\\?\` extended paths.
const PATH_BUF_LEN: usize = 32_768;

// ── Open dialog ───────────────────────────────────────────────────────────────

/// Show the standard "Open File" dialog, modal to `hwnd_owner`.
///
/// Returns the chosen path, or `None` if the user cancelled.
pub(crate) fn show_open_dialog(hwnd_owner: HWND) -> Option<PathBuf> {
    let mut buf = vec![0u16; PATH_BUF_LEN];

    // The filter string is null-separated pairs ending with a double null:
    // "Display\0*.ext\0Display2\0*.ext2\0\0"
    let filter: Vec<u16> = "Text Files (*.txt)\0*.txt\0All Files (*.*)\0*.*\0\0"
        .encode_utf16()
        .collect();

    let mut ofn = OPENFILENAMEW {
        lStructSize: std::mem::size_of::<OPENFILENAMEW>() as u32,
        hwndOwner: hwnd_owner,
        lpstrFilter: PCWSTR(filter.as_ptr()),
        // Start on "All Files": any file may hold UTF-8 text.
        nFilterIndex: 2,
        lpstrFile: PWSTR(buf.as_mut_ptr()),
        nMaxFile: PATH_BUF_LEN as u32,
        lpstrTitle: w!("Open File"),
        Flags: OFN_EXPLORER | OFN_FILEMUSTEXIST | OFN_PATHMUSTEXIST | OFN_HIDEREADONLY,
        ..Default::default()
    };

    // SAFETY: `ofn` is fully initialised; `buf` and `filter` outlive this
    // call.  GetOpenFileNameW reads and writes only within the buffers we
    // provided.  The function is called on the UI thread (required for modal
    // dialogs).
    let ok = unsafe { GetOpenFileNameW(&mut ofn) };

    if ok.as_bool() {
        Some(path_from_buf(&buf))
    } else {
        None
    }
}

// ── Picker ────────────────────────────────────────────────────────────────────

/// Parked reply shared between the picker and WndProc.
pub(crate) type PendingPick = Rc<RefCell<Option<Reply<Option<FileHandle>>>>>;

pub(crate) struct DialogPicker {
    hwnd: HWND,
    pending: PendingPick,
}

impl DialogPicker {
    pub(crate) fn new(hwnd: HWND, pending: PendingPick) -> Self {
        Self { hwnd, pending }
    }
}

impl FilePicker for DialogPicker {
    fn request(&mut self, reply: Reply<Option<FileHandle>>) {
        // A prompt that is already parked stays in charge; the newer reply
        // is dropped and reported as abandoned.
        let mut slot = self.pending.borrow_mut();
        if slot.is_some() {
            tracing::debug!("open dialog already pending");
            return;
        }
        *slot = Some(reply);
        drop(slot);

        // SAFETY: hwnd is the main frame, alive for as long as the controller
        // that owns this picker.
        let posted =
            unsafe { PostMessageW(self.hwnd, WM_APP_OPEN_DIALOG, WPARAM(0), LPARAM(0)) };
        if let Err(err) = posted {
            tracing::error!(%err, "could not queue the open dialog");
            // Dropping the parked reply reports the prompt as abandoned.
            drop(self.pending.borrow_mut().take());
        }
    }
}

/// Show the dialog for a parked reply, if any, and answer it.
///
/// Called from WndProc with no window state borrowed.
pub(crate) fn run_pending(hwnd_owner: HWND, pending: &PendingPick) {
    let Some(reply) = pending.borrow_mut().take() else {
        return;
    };
    let choice = show_open_dialog(hwnd_owner).map(FileHandle::new);
    reply.send(choice);
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Convert a null-terminated UTF-16 buffer to a `PathBuf`, keeping
/// unpaired surrogates intact.
fn path_from_buf(buf: &[u16]) -> PathBuf {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    PathBuf::from(OsString::from_wide(&buf[..len]))
}
