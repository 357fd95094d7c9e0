// ── Platform abstraction layer ────────────────────────────────────────────────
//
// The controller only sees the traits in `ui`, `editor`, and `loader`.  The
// implementations over real OS widgets live below; all Win32 FFI is confined
// to the `win32` sub-module and never leaks outward.

#[cfg(windows)]
pub mod win32;
