// ── Central error type ────────────────────────────────────────────────────────
//
// All fallible operations return `error::Result<T>`.  Load and encoding
// failures never leave the controller: they are handed to the diagnostic
// channel and the open operation ends there.  Only start-up failures reach
// `main()`, which shows them in a modal dialog.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Every error that the viewer can produce.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Reading the selected file failed (permission, not found, device error…).
    #[error("Unable to open “{}”: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but its bytes are not well-formed UTF-8.
    #[error(
        "Unable to load the contents of “{}”: the file is not encoded with UTF-8",
        path.display()
    )]
    Encoding {
        path: PathBuf,
        #[source]
        source: std::str::Utf8Error,
    },

    /// A layout slot was never bound by the front end.
    #[error("template slot `{0}` is not bound")]
    MissingSlot(&'static str),

    /// An action name that the window does not export.
    #[error("unknown action `{0}`")]
    UnknownAction(String),

    /// The configuration file exists but could not be used.
    #[error("invalid configuration in {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    /// A Win32 API call returned a failure code.
    #[error("{function} failed (error {code:#010x})")]
    Win32 {
        /// The name of the failing function, for display purposes.
        function: &'static str,
        /// The raw Win32 error code (`GetLastError()` value) or HRESULT.
        code: u32,
    },
}

impl ViewerError {
    /// The file path this error refers to, if any.
    pub(crate) fn path(&self) -> Option<&Path> {
        match self {
            Self::Load { path, .. } | Self::Encoding { path, .. } | Self::Config { path, .. } => {
                Some(path)
            }
            _ => None,
        }
    }
}

// Convert a windows-crate error (HRESULT) directly into a ViewerError so that
// `?` can be used on `windows::core::Result<T>` throughout the platform module.
#[cfg(windows)]
impl From<windows::core::Error> for ViewerError {
    fn from(e: windows::core::Error) -> Self {
        // HRESULT.0 is i32; reinterpret bits as u32 for display purposes.
        // Win32 errors appear as 0x8007xxxx HRESULTs.
        Self::Win32 {
            function: "windows",
            code: e.code().0 as u32,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ViewerError>;

// ── Tests ─────────────────────────────────────────────────────────────────────
