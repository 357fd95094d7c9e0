// ── Start-up configuration ────────────────────────────────────────────────────
//
// Reads `%APPDATA%\TextViewer\config.json` (Windows) or
// `$XDG_CONFIG_HOME/text-viewer/config.json` elsewhere.  The viewer never
// writes this file.  No `unsafe`; pure safe Rust + serde_json.

use std::{fs, io, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewerError};

// ── On-disk types ─────────────────────────────────────────────────────────────

/// Root of the JSON configuration file.  Every field is optional on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct ViewerConfig {
    pub(crate) version: u32,
    pub(crate) window: WindowConfig,
    /// `tracing` filter directive, e.g. `"info"` or `"text_viewer=debug"`.
    pub(crate) log_filter: String,
}

/// Initial window size in 96-DPI pixels; scaled for the monitor at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct WindowConfig {
    pub(crate) width: i32,
    pub(crate) height: i32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            window: WindowConfig::default(),
            log_filter: "info".to_owned(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { width: 800, height: 600 }
    }
}

// ── Format version ────────────────────────────────────────────────────────────

const CONFIG_VERSION: u32 = 1;

// ── Path ──────────────────────────────────────────────────────────────────────

/// Return the path to the configuration file, or `None` when no base
/// directory is known.
pub(crate) fn config_path() -> Option<PathBuf> {
    let mut p = if cfg!(windows) {
        let mut p = PathBuf::from(std::env::var_os("APPDATA")?);
        p.push("TextViewer");
        p
    } else {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        base.join("text-viewer")
    };
    p.push("config.json");
    Some(p)
}

// ── Load ──────────────────────────────────────────────────────────────────────

impl ViewerConfig {
    /// Parse a configuration document.
    pub(crate) fn from_json(path: PathBuf, data: &[u8]) -> Result<Self> {
        let cfg: Self = serde_json::from_slice(data).map_err(|e| ViewerError::Config {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        if cfg.version != CONFIG_VERSION {
            return Err(ViewerError::Config {
                path,
                reason: format!("unsupported version {}", cfg.version),
            });
        }
        Ok(cfg)
    }
}

/// Read the configuration file at `path`.
///
/// A missing file is not an error and yields `Ok(None)`.
pub(crate) fn load_from(path: PathBuf) -> Result<Option<ViewerConfig>> {
    match fs::read(&path) {
        Ok(data) => ViewerConfig::from_json(path, &data).map(Some),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ViewerError::Config { path, reason: e.to_string() }),
    }
}

/// Read the configuration, falling back to defaults.
///
/// Runs before logging is initialised, so a rejected file is returned as the
/// second element for the caller to log once the subscriber exists.
pub(crate) fn load() -> (ViewerConfig, Option<ViewerError>) {
    let Some(path) = config_path() else {
        return (ViewerConfig::default(), None);
    };
    match load_from(path) {
        Ok(cfg) => (cfg.unwrap_or_default(), None),
        Err(e) => (ViewerConfig::default(), Some(e)),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<ViewerConfig> {
        ViewerConfig::from_json(PathBuf::from("config.json"), json.as_bytes())
    }

    #[test]
    fn empty_object_is_all_defaults() {
        assert_eq!(parse("{}").expect("parse"), ViewerConfig::default());
    }

    #[test]
    fn partial_window_keeps_other_defaults() {
        let cfg = parse(r#"{"window":{"width":1024}}"#).expect("parse");
        assert_eq!(cfg.window, WindowConfig { width: 1024, height: 600 });
        assert_eq!(cfg.log_filter, "info");
    }

    #[test]
    fn log_filter_is_read() {
        let cfg = parse(r#"{"version":1,"log_filter":"text_viewer=debug"}"#).expect("parse");
        assert_eq!(cfg.log_filter, "text_viewer=debug");
    }

    #[test]
    fn wrong_version_is_rejected() {
        let err = parse(r#"{"version":99}"#).expect_err("version 99");
        assert!(matches!(err, ViewerError::Config { .. }));
        assert!(err.to_string().contains("unsupported version 99"));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(parse("{not json"), Err(ViewerError::Config { .. })));
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loaded = load_from(dir.path().join("config.json")).expect("load");
        assert!(loaded.is_none());
    }

    #[test]
    fn file_on_disk_is_loaded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"window":{"width":640,"height":480}}"#).expect("write");
        let cfg = load_from(path).expect("load").expect("present");
        assert_eq!(cfg.window, WindowConfig { width: 640, height: 480 });
    }
}
