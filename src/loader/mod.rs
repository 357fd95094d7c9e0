// ── File selection and loading ────────────────────────────────────────────────
//
// Both services complete through a one-shot `Reply` (see `events`).  The
// picker is owned by the platform layer; the loader reads off the UI thread.
// No `unsafe` here.

use std::{
    fs, io,
    path::{Path, PathBuf},
    thread,
};

use crate::events::Reply;

// ── File handle ───────────────────────────────────────────────────────────────

/// A selected file, valid for one open operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FileHandle {
    path: PathBuf,
}

impl FileHandle {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// The last path component, lossily decoded.  Falls back to the whole
    /// path when there is no file-name component (e.g. `/` or `..`).
    pub(crate) fn base_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// The name to show in the title bar.
    ///
    /// Queries the file system for the entry; succeeds when the entry exists
    /// and its name is valid Unicode.  Any failure falls back to
    /// [`base_name`](Self::base_name), so this never fails.
    pub(crate) fn display_name(&self) -> String {
        query_display_name(&self.path).unwrap_or_else(|err| {
            tracing::debug!(path = %self.path.display(), %err, "display name lookup failed");
            self.base_name()
        })
    }
}

fn query_display_name(path: &Path) -> io::Result<String> {
    fs::symlink_metadata(path)?;
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_owned)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "file name is not valid Unicode"))
}

// ── Completion ────────────────────────────────────────────────────────────────

/// Identifies one open request, for tracing only.
pub(crate) type RequestId = u64;

/// Result of one file read, delivered exactly once per request.
#[derive(Debug)]
pub(crate) struct LoadCompletion {
    pub(crate) request: RequestId,
    pub(crate) file: FileHandle,
    pub(crate) display_name: String,
    pub(crate) result: io::Result<Vec<u8>>,
}

impl LoadCompletion {
    /// Read `file` to completion on the calling thread.
    pub(crate) fn read(request: RequestId, file: FileHandle) -> Self {
        let result = fs::read(file.path());
        let display_name = file.display_name();
        Self { request, file, display_name, result }
    }
}

// ── Service contracts ─────────────────────────────────────────────────────────

/// Presents a file-open prompt, modal to the window.
pub(crate) trait FilePicker {
    /// Start the prompt.  `reply` receives the choice (or `None` on cancel).
    fn request(&mut self, reply: Reply<Option<FileHandle>>);
}

/// Reads a whole file away from the UI thread.
pub(crate) trait FileLoader {
    fn load(&mut self, request: RequestId, file: FileHandle, reply: Reply<LoadCompletion>);
}

// ── Threaded loader ───────────────────────────────────────────────────────────

/// Runs each read on its own short-lived thread.
#[derive(Debug, Default)]
pub(crate) struct ThreadedLoader;

impl FileLoader for ThreadedLoader {
    fn load(&mut self, request: RequestId, file: FileHandle, reply: Reply<LoadCompletion>) {
        let spawned = thread::Builder::new()
            .name(format!("load-{request}"))
            .spawn(move || reply.send(LoadCompletion::read(request, file)));

        // If no thread could be started the reply was dropped with the
        // closure, which reports the request as abandoned.
        if let Err(err) = spawned {
            tracing::error!(request, %err, "could not start loader thread");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::{io::Write, sync::Arc, time::Duration};

    use super::*;
    use crate::events::{Event, EventQueue, Service};

    #[test]
    fn base_name_is_last_component() {
        assert_eq!(FileHandle::new("/home/user/notes.txt").base_name(), "notes.txt");
        assert_eq!(FileHandle::new("notes.txt").base_name(), "notes.txt");
    }

    #[test]
    fn base_name_without_file_component_uses_path() {
        assert_eq!(FileHandle::new("..").base_name(), "..");
    }

    #[test]
    fn display_name_of_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        fs::write(&path, "x").expect("write");
        assert_eq!(FileHandle::new(&path).display_name(), "notes.txt");
    }

    #[test]
    fn display_name_falls_back_to_base_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gone.txt");
        assert_eq!(FileHandle::new(&path).display_name(), "gone.txt");
    }

    #[test]
    fn read_returns_full_contents() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(b"hello\0world").expect("write");

        let completion = LoadCompletion::read(7, FileHandle::new(file.path()));
        assert_eq!(completion.request, 7);
        // An embedded NUL must not truncate the content.
        assert_eq!(completion.result.expect("read"), b"hello\0world");
    }

    #[test]
    fn read_reports_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let completion = LoadCompletion::read(1, FileHandle::new(dir.path().join("nope")));
        let err = completion.result.expect_err("missing file");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(completion.display_name, "nope");
    }

    #[test]
    fn threaded_loader_completes_once() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(b"abc").expect("write");

        let queue = EventQueue::new(Arc::new(|| {}));
        ThreadedLoader.load(3, FileHandle::new(file.path()), queue.reply(Service::Loader, Event::Loaded));

        match queue.next_timeout(Duration::from_secs(5)) {
            Some(Event::Loaded(done)) => {
                assert_eq!(done.request, 3);
                assert_eq!(done.result.expect("read"), b"abc");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(queue.next_timeout(Duration::from_millis(50)).is_none());
    }
}
