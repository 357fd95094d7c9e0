// ── Main window ───────────────────────────────────────────────────────────────
//
// Responsibilities in this file (unsafe confined here):
//   • Register the main window class and create the frame + child controls.
//   • Bind the controls to the controller's template slots.
//   • Run the Win32 message loop (with the Ctrl+O accelerator).
//   • Dispatch WM_COMMAND, WM_NOTIFY, WM_SIZE/WM_DPICHANGED, and the private
//     WM_APP_* messages that carry work back onto the UI thread.
//
// ── State ownership ───────────────────────────────────────────────────────────
//
// `WindowState` is boxed inside a `RefCell` and stored in GWLP_USERDATA.
// WndProc borrows it only for the duration of one handler.  Messages that
// controls send back synchronously while a handler runs (EN_SELCHANGE during
// SetWindowTextW, for example) are re-posted instead of handled in place, so
// the state is never borrowed twice.  The box is reclaimed in WM_NCDESTROY.

#![allow(unsafe_code)]

use std::{cell::{Cell, RefCell}, rc::Rc, sync::Arc};

use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{GetLastError, HINSTANCE, HWND, LPARAM, LRESULT, RECT, TRUE, WPARAM},
        Graphics::Gdi::{UpdateWindow, COLOR_BTNFACE, HBRUSH},
        System::LibraryLoader::GetModuleHandleW,
        UI::{
            Controls::NMHDR,
            WindowsAndMessaging::{
                AppendMenuW, CreateAcceleratorTableW, CreateMenu, CreateWindowExW,
                DefWindowProcW, DestroyAcceleratorTable, DestroyWindow, DispatchMessageW,
                GetClientRect, GetMessageW, GetWindowLongPtrW, LoadCursorW, LoadIconW,
                MessageBoxW, MoveWindow, PostMessageW, PostQuitMessage, RegisterClassExW,
                SetMenu, SetWindowLongPtrW, SetWindowPos, ShowWindow, TranslateAcceleratorW,
                TranslateMessage, ACCEL, CS_HREDRAW, CS_VREDRAW, CW_USEDEFAULT, FCONTROL,
                FVIRTKEY, GWLP_USERDATA, HACCEL, HMENU, IDC_ARROW, IDI_APPLICATION,
                MB_ICONERROR, MB_OK, MF_GRAYED, MF_POPUP, MF_SEPARATOR, MF_STRING, MSG,
                SWP_NOACTIVATE, SWP_NOZORDER, SW_SHOW, WINDOW_EX_STYLE, WM_APP, WM_CLOSE,
                WM_COMMAND, WM_DESTROY, WM_DPICHANGED, WM_NCDESTROY, WM_NOTIFY, WM_SIZE,
                WNDCLASSEXW, WS_CLIPCHILDREN, WS_OVERLAPPEDWINDOW,
            },
        },
    },
};

use super::{
    controls::{FrameTitle, OpenButton, StatusLabel},
    dialogs::{self, DialogPicker, PendingPick},
    dpi,
    richedit::{RichEditDll, RichEditView, EN_SELCHANGE},
};
use crate::{
    app::{Action, ViewerWindow},
    config::ViewerConfig,
    diagnostics::TracingDiagnostics,
    error::{Result, ViewerError},
    loader::ThreadedLoader,
    ui::{
        layout::{self, Layout, Rect},
        SlotBindings,
    },
};

// ── Window identity ───────────────────────────────────────────────────────────

/// Atom name used to register (and later find) the main window class.
const CLASS_NAME: PCWSTR = w!("TextViewerMainWindow");

/// Caption shown until a file is opened.
const APP_TITLE: PCWSTR = w!("Text Viewer");

// ── Command and control IDs ───────────────────────────────────────────────────

const IDM_FILE_OPEN: usize = 1001;
const IDM_FILE_SAVE_AS: usize = 1002;
const IDM_FILE_EXIT: usize = 1003;
const IDM_HELP_SHORTCUTS: usize = 9001;

const IDC_OPEN_BUTTON: usize = 2001;
const IDC_TEXT_VIEW: usize = 2002;
const IDC_CURSOR_POS: usize = 2003;

const BN_CLICKED: u32 = 0;

// ── Private messages ──────────────────────────────────────────────────────────

/// Show the file dialog for a reply parked by `DialogPicker`.
pub(crate) const WM_APP_OPEN_DIALOG: u32 = WM_APP + 1;
/// The controller's event queue has work (posted from any thread).
const WM_APP_WAKE: u32 = WM_APP + 2;
/// The text view's caret moved.
const WM_APP_CURSOR_MOVED: u32 = WM_APP + 3;

// ── Window state ──────────────────────────────────────────────────────────────

/// Everything WndProc needs.  Field order is drop order: the controller (and
/// the views it owns) before the DLL that registered the text view's class.
struct WindowState {
    viewer: ViewerWindow,
    pending_pick: PendingPick,
    open_action: Rc<Cell<Option<Action>>>,
    children: Children,
    _richedit: RichEditDll,
}

/// Child control handles, for layout.
#[derive(Clone, Copy)]
struct Children {
    open_button: HWND,
    text_view: HWND,
    cursor_pos: HWND,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Register the main window class, create the window, and drive the message
/// loop until the user closes the application.
pub(crate) fn run(config: &ViewerConfig) -> Result<()> {
    let t0 = std::time::Instant::now();

    dpi::init();

    // SAFETY: GetModuleHandleW(None) returns the .exe's own HMODULE, which is
    // always valid for the process lifetime and never fails in practice.
    let hmodule = unsafe { GetModuleHandleW(None) }.map_err(ViewerError::from)?;

    // HINSTANCE and HMODULE represent the same underlying value on Windows
    // (guaranteed by the Win32 ABI).
    let hinstance = HINSTANCE(hmodule.0);

    register_class(hinstance)?;
    let richedit = RichEditDll::load()?;
    let hwnd = create_window(hinstance, config)?;

    let state = build_state(hwnd, hinstance, richedit)?;
    // SAFETY: hwnd is our frame; the pointer comes from Box::into_raw and is
    // reclaimed exactly once, in WM_NCDESTROY.
    unsafe {
        SetWindowLongPtrW(hwnd, GWLP_USERDATA, Box::into_raw(state) as isize);
    }
    apply_layout(hwnd);

    // SAFETY: hwnd was just returned by CreateWindowExW and is valid.
    // ShowWindow returns the previous visibility state; UpdateWindow returns
    // a success BOOL; both are intentionally ignored here.
    unsafe {
        let _ = ShowWindow(hwnd, SW_SHOW);
        let _ = UpdateWindow(hwnd);
    }

    tracing::debug!(elapsed_ms = t0.elapsed().as_secs_f64() * 1000.0, "window visible");

    message_loop(hwnd)
}

/// Show a modal error dialog with the given message.
///
/// Safe to call from any context; performs the UTF-16 conversion internally.
/// Used by `main()` when `run()` returns an error.
pub(crate) fn show_error_dialog(message: &str) {
    let msg_wide: Vec<u16> = message.encode_utf16().chain(std::iter::once(0)).collect();

    // SAFETY: msg_wide is a valid null-terminated UTF-16 string that remains
    // allocated for the duration of the MessageBoxW call.
    // HWND::default() (null) means the dialog has no owner window.
    unsafe {
        let _ = MessageBoxW(
            HWND::default(),
            PCWSTR(msg_wide.as_ptr()),
            w!("Text Viewer \u{2014} Fatal Error"),
            MB_OK | MB_ICONERROR,
        );
    }
}

// ── Window class registration ─────────────────────────────────────────────────

fn register_class(hinstance: HINSTANCE) -> Result<()> {
    // SAFETY: LoadIconW with IDI_APPLICATION always succeeds; it loads the
    // built-in application icon resource, which exists on all Windows versions.
    let icon = unsafe { LoadIconW(None, IDI_APPLICATION) }.map_err(ViewerError::from)?;

    // SAFETY: LoadCursorW with IDC_ARROW always succeeds; the arrow cursor is
    // a built-in resource guaranteed to exist on all Windows versions.
    let cursor = unsafe { LoadCursorW(None, IDC_ARROW) }.map_err(ViewerError::from)?;

    let wndclass = WNDCLASSEXW {
        // WNDCLASSEXW is ~72 bytes; the cast to u32 is always lossless.
        cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
        style: CS_HREDRAW | CS_VREDRAW,
        lpfnWndProc: Some(wnd_proc),
        cbClsExtra: 0,
        cbWndExtra: 0,
        hInstance: hinstance,
        hIcon: icon,
        hCursor: cursor,
        // System colour brushes are passed as (COLOR_* + 1).
        hbrBackground: HBRUSH((COLOR_BTNFACE.0 + 1) as usize as *mut core::ffi::c_void),
        lpszMenuName: PCWSTR::null(),
        lpszClassName: CLASS_NAME,
        hIconSm: icon,
    };

    // SAFETY: wndclass is fully initialised with valid handles;
    // CLASS_NAME is a valid null-terminated UTF-16 string literal.
    let atom = unsafe { RegisterClassExW(&wndclass) };
    if atom == 0 {
        return Err(last_error("RegisterClassExW"));
    }

    Ok(())
}

// ── Window creation ───────────────────────────────────────────────────────────

fn create_window(hinstance: HINSTANCE, config: &ViewerConfig) -> Result<HWND> {
    let dpi = dpi::get_system_dpi();
    let width = layout::scale(config.window.width, dpi);
    let height = layout::scale(config.window.height, dpi);

    // SAFETY: CLASS_NAME was just registered; hinstance is the exe's module.
    // HWND::default() (null parent) creates a top-level window.
    // HMENU::default() (null menu); we attach the menu separately below.
    let hwnd = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            CLASS_NAME,
            APP_TITLE,
            WS_OVERLAPPEDWINDOW | WS_CLIPCHILDREN,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            width,
            height,
            HWND::default(),
            HMENU::default(),
            hinstance,
            None,
        )
    }
    .map_err(ViewerError::from)?;

    let menu = build_menu()?;
    // SAFETY: hwnd and menu are valid handles.
    unsafe { SetMenu(hwnd, menu) }.map_err(ViewerError::from)?;

    Ok(hwnd)
}

/// Create the child controls and the controller that drives them.
fn build_state(
    hwnd: HWND,
    hinstance: HINSTANCE,
    richedit: RichEditDll,
) -> Result<Box<RefCell<WindowState>>> {
    let open_button = OpenButton::create(hwnd, hinstance, IDC_OPEN_BUTTON)?;
    let text_view = RichEditView::create(hwnd, hinstance, IDC_TEXT_VIEW, &richedit)?;
    let cursor_pos = StatusLabel::create(hwnd, hinstance, IDC_CURSOR_POS)?;

    let children = Children {
        open_button: open_button.hwnd(),
        text_view: text_view.hwnd(),
        cursor_pos: cursor_pos.hwnd(),
    };
    let open_action = open_button.binding();

    let slots = SlotBindings::new()
        .header_bar(FrameTitle(hwnd))
        .main_text_view(text_view)
        .open_button(open_button)
        .cursor_pos(cursor_pos)
        .build()?;

    let pending_pick: PendingPick = Rc::default();
    let picker = DialogPicker::new(hwnd, Rc::clone(&pending_pick));

    // HWND is not Send; the raw value is, and stays valid until the frame is
    // destroyed (a post after that fails harmlessly).
    let raw = hwnd.0 as isize;
    let waker = Arc::new(move || {
        // SAFETY: PostMessageW may be called from any thread; a stale handle
        // makes it fail, which is ignored.
        unsafe {
            let _ = PostMessageW(
                HWND(raw as *mut core::ffi::c_void),
                WM_APP_WAKE,
                WPARAM(0),
                LPARAM(0),
            );
        }
    });

    let viewer = ViewerWindow::new(
        slots,
        Box::new(picker),
        Box::new(ThreadedLoader),
        Box::new(TracingDiagnostics),
        waker,
    );

    Ok(Box::new(RefCell::new(WindowState {
        viewer,
        pending_pick,
        open_action,
        children,
        _richedit: richedit,
    })))
}

// ── Menu construction ─────────────────────────────────────────────────────────

fn build_menu() -> Result<HMENU> {
    // SAFETY: CreateMenu has no preconditions; it always succeeds unless the
    // system is critically low on resources, in which case ? propagates the error.
    unsafe {
        let bar = CreateMenu().map_err(ViewerError::from)?;

        // ── File ──────────────────────────────────────────────────────────────
        let file = CreateMenu().map_err(ViewerError::from)?;
        AppendMenuW(file, MF_STRING, IDM_FILE_OPEN, w!("&Open\u{2026}\tCtrl+O"))
            .map_err(ViewerError::from)?;
        // No handler behind `save-as` yet; keep it visible but disabled.
        AppendMenuW(file, MF_STRING | MF_GRAYED, IDM_FILE_SAVE_AS, w!("Save &As\u{2026}"))
            .map_err(ViewerError::from)?;
        AppendMenuW(file, MF_SEPARATOR, 0, PCWSTR::null()).map_err(ViewerError::from)?;
        AppendMenuW(file, MF_STRING, IDM_FILE_EXIT, w!("E&xit\tAlt+F4"))
            .map_err(ViewerError::from)?;

        // ── Help ──────────────────────────────────────────────────────────────
        let help = CreateMenu().map_err(ViewerError::from)?;
        AppendMenuW(help, MF_STRING | MF_GRAYED, IDM_HELP_SHORTCUTS, w!("&Keyboard Shortcuts"))
            .map_err(ViewerError::from)?;

        // The uIDNewItem parameter for MF_POPUP is the child HMENU cast to usize.
        AppendMenuW(bar, MF_POPUP, file.0 as usize, w!("&File")).map_err(ViewerError::from)?;
        AppendMenuW(bar, MF_POPUP, help.0 as usize, w!("&Help")).map_err(ViewerError::from)?;

        Ok(bar)
    }
}

fn build_accelerators() -> Result<HACCEL> {
    let table = [ACCEL {
        fVirt: FCONTROL | FVIRTKEY,
        key: u16::from(b'O'),
        cmd: IDM_FILE_OPEN as u16,
    }];
    // SAFETY: `table` is a valid ACCEL slice for the duration of the call;
    // the system copies it.
    unsafe { CreateAcceleratorTableW(&table) }.map_err(ViewerError::from)
}

// ── Message loop ──────────────────────────────────────────────────────────────

fn message_loop(hwnd: HWND) -> Result<()> {
    // Without the table the app still works from the menu and button.
    let accel = build_accelerators()
        .map_err(|e| tracing::warn!(%e, "accelerators unavailable"))
        .ok();
    let mut msg = MSG::default();

    let result = loop {
        // SAFETY: &mut msg is a valid MSG pointer; HWND::default() retrieves
        // messages for all windows on this thread; 0,0 filter accepts all.
        let ret = unsafe { GetMessageW(&mut msg, HWND::default(), 0, 0) };

        match ret.0 {
            // GetMessageW returns -1 on error.
            -1 => break Err(last_error("GetMessageW")),
            // Returns 0 when WM_QUIT is retrieved; exit the loop cleanly.
            0 => break Ok(()),
            // Any other value: a normal message to dispatch.
            _ => unsafe {
                // SAFETY: msg was populated by a successful GetMessageW call;
                // accel (if any) is a live table owned by this loop.
                if let Some(accel) = accel {
                    if TranslateAcceleratorW(hwnd, accel, &msg) != 0 {
                        continue;
                    }
                }
                let _ = TranslateMessage(&msg);
                let _ = DispatchMessageW(&msg);
            },
        }
    };

    if let Some(accel) = accel {
        // SAFETY: accel came from CreateAcceleratorTableW and is no longer used.
        unsafe {
            let _ = DestroyAcceleratorTable(accel);
        }
    }
    result
}

// ── State access ──────────────────────────────────────────────────────────────

/// Run `f` with exclusive access to the window state.
///
/// Returns `None` before the state is installed, after it is torn down, or
/// when a handler further up the stack already holds it.
fn with_state<R>(hwnd: HWND, f: impl FnOnce(&mut WindowState) -> R) -> Option<R> {
    // SAFETY: GWLP_USERDATA is either 0 or the pointer stored by run(), which
    // stays valid until WM_NCDESTROY resets it to 0.
    let ptr = unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) } as *const RefCell<WindowState>;
    if ptr.is_null() {
        return None;
    }
    // SAFETY: see above; only shared references to the RefCell are formed,
    // so nested WndProc calls cannot alias a `&mut`.
    let cell = unsafe { &*ptr };
    match cell.try_borrow_mut() {
        Ok(mut state) => Some(f(&mut state)),
        Err(_) => {
            tracing::trace!("window state busy");
            None
        }
    }
}

fn activate(hwnd: HWND, action: Action) {
    if with_state(hwnd, |s| s.viewer.activate(action)) == Some(false) {
        tracing::debug!(%action, "action ignored");
    }
}

// ── Layout ────────────────────────────────────────────────────────────────────

fn apply_layout(hwnd: HWND) {
    let Some(children) = with_state(hwnd, |s| s.children) else {
        return;
    };
    let mut client = RECT::default();
    // SAFETY: hwnd valid; `client` is a live RECT.
    if unsafe { GetClientRect(hwnd, &mut client) }.is_err() {
        return;
    }
    let layout = Layout::compute(client.right - client.left, client.bottom - client.top, dpi::get_for_window(hwnd));

    place(children.open_button, layout.open_button);
    place(children.text_view, layout.text_view);
    place(children.cursor_pos, layout.cursor_pos);
}

fn place(child: HWND, r: Rect) {
    // SAFETY: child is one of our live child controls.
    unsafe {
        let _ = MoveWindow(child, r.x, r.y, r.width, r.height, TRUE);
    }
}

// ── Window procedure ──────────────────────────────────────────────────────────

// SAFETY: wnd_proc is registered as lpfnWndProc in WNDCLASSEXW.
// Windows guarantees that hwnd, msg, wparam, and lparam are valid for the
// lifetime of this call; we must not store hwnd beyond the message handler.
unsafe extern "system" fn wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        // ── Lifecycle ─────────────────────────────────────────────────────────
        WM_CLOSE => {
            // SAFETY: hwnd is the window being closed; DestroyWindow triggers
            // WM_DESTROY, which posts WM_QUIT via PostQuitMessage.
            let _ = DestroyWindow(hwnd);
            LRESULT(0)
        }

        WM_DESTROY => {
            PostQuitMessage(0);
            LRESULT(0)
        }

        WM_NCDESTROY => {
            let ptr = SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0) as *mut RefCell<WindowState>;
            if !ptr.is_null() {
                // SAFETY: ptr came from Box::into_raw in run() and was just
                // unlinked from the window, so this is its only owner.
                drop(Box::from_raw(ptr));
            }
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }

        // ── Layout ────────────────────────────────────────────────────────────
        WM_SIZE => {
            apply_layout(hwnd);
            LRESULT(0)
        }

        WM_DPICHANGED => {
            // SAFETY: for WM_DPICHANGED, lparam points at the suggested new
            // window rectangle in screen coordinates, valid for this call.
            let r = &*(lparam.0 as *const RECT);
            let _ = SetWindowPos(
                hwnd,
                HWND::default(),
                r.left,
                r.top,
                r.right - r.left,
                r.bottom - r.top,
                SWP_NOACTIVATE | SWP_NOZORDER,
            );
            // The resize above re-runs the layout at the new DPI.
            LRESULT(0)
        }

        // ── Commands ──────────────────────────────────────────────────────────
        WM_COMMAND => {
            // Low word of WPARAM is the command / control id, high word the
            // notification code (0 for menus and BN_CLICKED).
            let id = wparam.0 & 0xFFFF;
            let code = ((wparam.0 >> 16) & 0xFFFF) as u32;

            match id {
                IDM_FILE_OPEN => activate(hwnd, Action::Open),
                IDM_FILE_SAVE_AS => activate(hwnd, Action::SaveAs),
                IDM_HELP_SHORTCUTS => activate(hwnd, Action::ShowHelpOverlay),
                IDC_OPEN_BUTTON if code == BN_CLICKED => {
                    if let Some(action) = with_state(hwnd, |s| s.open_action.get()).flatten() {
                        activate(hwnd, action);
                    }
                }
                IDM_FILE_EXIT => {
                    // SAFETY: same as WM_CLOSE handler.
                    let _ = DestroyWindow(hwnd);
                }
                _ => return DefWindowProcW(hwnd, msg, wparam, lparam),
            }
            LRESULT(0)
        }

        WM_NOTIFY => {
            // SAFETY: for WM_NOTIFY, lparam points at an NMHDR (or a struct
            // that begins with one) valid for this call.
            let header = &*(lparam.0 as *const NMHDR);
            if header.idFrom == IDC_TEXT_VIEW && header.code == EN_SELCHANGE {
                // Often sent while the controller is mid-update; handle it on
                // the next loop turn instead.
                let _ = PostMessageW(hwnd, WM_APP_CURSOR_MOVED, WPARAM(0), LPARAM(0));
            }
            LRESULT(0)
        }

        // ── Work posted back onto the UI thread ───────────────────────────────
        WM_APP_OPEN_DIALOG => {
            // Clone the shared slot out so no state borrow is held while the
            // dialog's modal loop runs.
            if let Some(pending) = with_state(hwnd, |s| Rc::clone(&s.pending_pick)) {
                dialogs::run_pending(hwnd, &pending);
            }
            LRESULT(0)
        }

        WM_APP_WAKE => {
            if with_state(hwnd, |s| s.viewer.dispatch_pending()).is_none() {
                // Busy: try again on the next turn rather than lose the wake.
                let _ = PostMessageW(hwnd, WM_APP_WAKE, WPARAM(0), LPARAM(0));
            }
            LRESULT(0)
        }

        WM_APP_CURSOR_MOVED => {
            let _ = with_state(hwnd, |s| s.viewer.update_cursor_position());
            LRESULT(0)
        }

        // Default processing for all unhandled messages.
        // SAFETY: hwnd and message parameters are valid; provided by Windows.
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

// ── Error helpers ─────────────────────────────────────────────────────────────

/// Capture the current Win32 last-error code and wrap it in a `ViewerError`.
///
/// Call immediately after a Win32 function that signals failure; `GetLastError`
/// reads thread-local state that can be overwritten by any subsequent API call.
fn last_error(function: &'static str) -> ViewerError {
    // SAFETY: GetLastError reads thread-local state set by the last Win32 call.
    // It is always safe to call and never fails.
    let code = unsafe { GetLastError() };
    ViewerError::Win32 {
        function,
        code: code.0,
    }
}
