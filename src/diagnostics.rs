// ── Diagnostic channel & logging set-up ───────────────────────────────────────
//
// Load failures are reported here and nowhere else: never to the user, never
// up to the application shell.  The production sink turns each report into a
// single `tracing` warning on stderr.

use tracing_subscriber::EnvFilter;

use crate::error::ViewerError;

/// Environment variable that overrides the configured log filter.
pub(crate) const LOG_ENV: &str = "TEXT_VIEWER_LOG";

/// Developer-facing sink for failures that end an open operation.
pub(crate) trait Diagnostics {
    fn report(&self, error: &ViewerError);
}

/// Emits one `WARN` event per report, with the file path as a field.
#[derive(Debug, Default)]
pub(crate) struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, error: &ViewerError) {
        match error.path() {
            Some(path) => tracing::warn!(path = %path.display(), "{error}"),
            None => tracing::warn!("{error}"),
        }
    }
}

/// Install the global `fmt` subscriber.
///
/// `TEXT_VIEWER_LOG` wins over `default_filter` (from the config file); an
/// unparsable filter falls back to `info`.
pub(crate) fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

// ── Test doubles ──────────────────────────────────────────────────────────────
