// ── Safety policy ────────────────────────────────────────────────────────────
// Unsafe code is forbidden everywhere except `platform::win32` (Win32 FFI and
// RichEdit hosting).  Each unsafe block there MUST carry a `// SAFETY:` comment.
#![deny(unsafe_code)]

// Release builds run as a GUI application (no console window).
// Debug builds keep the console so that log output on stderr is visible.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
// Only the Win32 front end drives the controller outside of tests.
#![cfg_attr(not(windows), allow(dead_code))]

mod app;
mod config;
mod diagnostics;
mod editor;
mod error;
mod events;
mod loader;
mod platform;
mod ui;

fn main() {
    let (config, config_error) = config::load();
    diagnostics::init(&config.log_filter);
    if let Some(err) = config_error {
        tracing::warn!(%err, "using default configuration");
    }

    run(&config);
}

#[cfg(windows)]
fn run(config: &config::ViewerConfig) {
    if let Err(e) = platform::win32::window::run(config) {
        // Startup failed before or during the message loop.
        tracing::error!(%e, "text viewer stopped");
        platform::win32::window::show_error_dialog(&e.to_string());
        std::process::exit(1);
    }
}

#[cfg(not(windows))]
fn run(_config: &config::ViewerConfig) {
    tracing::error!("no front end is available for this platform; the viewer needs Windows");
    std::process::exit(1);
}
