// ── Viewer window controller ──────────────────────────────────────────────────
//
// A single `ViewerWindow` is created on startup and owned by the platform
// window for its whole lifetime.  All mutations happen on the UI thread; the
// only work done elsewhere is the file read, whose result comes back through
// the event queue and is applied in `dispatch_pending`.

use std::{fmt, str::FromStr, sync::Arc};

use crate::{
    diagnostics::Diagnostics,
    editor::CursorPosition,
    error::{Result, ViewerError},
    events::{Event, EventQueue, Service, Waker},
    loader::{FileHandle, FileLoader, FilePicker, LoadCompletion, RequestId},
    ui::TemplateSlots,
};

// ── Actions ───────────────────────────────────────────────────────────────────

/// Named actions the window exports to menus, buttons, and accelerators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    Open,
    SaveAs,
    ShowHelpOverlay,
}

impl Action {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::SaveAs => "save-as",
            Self::ShowHelpOverlay => "show-help-overlay",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = ViewerError;

    /// Accepts bare names and the window-scoped `win.` form.
    fn from_str(s: &str) -> Result<Self> {
        match s.strip_prefix("win.").unwrap_or(s) {
            "open" => Ok(Self::Open),
            "save-as" => Ok(Self::SaveAs),
            "show-help-overlay" => Ok(Self::ShowHelpOverlay),
            _ => Err(ViewerError::UnknownAction(s.to_owned())),
        }
    }
}

// ── Phase ─────────────────────────────────────────────────────────────────────

/// Where the open flow currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle,
    AwaitingSelection,
    AwaitingLoad,
}

// ── ViewerWindow ──────────────────────────────────────────────────────────────

/// Wires the file picker and loader to the text view, title, and label.
pub(crate) struct ViewerWindow {
    slots: TemplateSlots,
    picker: Box<dyn FilePicker>,
    loader: Box<dyn FileLoader>,
    diagnostics: Box<dyn Diagnostics>,
    queue: EventQueue,
    selections_in_flight: usize,
    loads_in_flight: usize,
    next_request: RequestId,
}

impl ViewerWindow {
    /// Bind the controller to its widgets and services.
    ///
    /// `waker` is called (from any thread) whenever an event is queued; the
    /// front end must respond by calling [`dispatch_pending`](Self::dispatch_pending)
    /// on the UI thread.
    pub(crate) fn new(
        mut slots: TemplateSlots,
        picker: Box<dyn FilePicker>,
        loader: Box<dyn FileLoader>,
        diagnostics: Box<dyn Diagnostics>,
        waker: Arc<dyn Waker>,
    ) -> Self {
        slots.open_button.bind_action(Action::Open);
        let mut window = Self {
            slots,
            picker,
            loader,
            diagnostics,
            queue: EventQueue::new(waker),
            selections_in_flight: 0,
            loads_in_flight: 0,
            next_request: 1,
        };
        window.update_cursor_position();
        window
    }

    pub(crate) fn phase(&self) -> Phase {
        if self.selections_in_flight > 0 {
            Phase::AwaitingSelection
        } else if self.loads_in_flight > 0 {
            Phase::AwaitingLoad
        } else {
            Phase::Idle
        }
    }

    // ── Actions ───────────────────────────────────────────────────────────────

    /// Run an action.  Returns `false` for actions this window declares but
    /// has no handler for.
    pub(crate) fn activate(&mut self, action: Action) -> bool {
        match action {
            Action::Open => {
                self.open_file_dialog();
                true
            }
            Action::SaveAs | Action::ShowHelpOverlay => {
                tracing::debug!(%action, "action has no handler");
                false
            }
        }
    }

    /// Run an action by name (`"open"` or `"win.open"`).
    pub(crate) fn activate_named(&mut self, name: &str) -> Result<bool> {
        let action = name.parse()?;
        Ok(self.activate(action))
    }

    // ── File open ─────────────────────────────────────────────────────────────

    /// Show the file-open prompt.  The choice arrives as an event.
    pub(crate) fn open_file_dialog(&mut self) {
        self.selections_in_flight += 1;
        self.picker.request(self.queue.reply(Service::Picker, Event::Selected));
    }

    /// Start reading `file`.  Earlier reads still in flight are not
    /// cancelled; whichever completes last decides what is shown.
    pub(crate) fn open_file(&mut self, file: FileHandle) {
        let request = self.next_request;
        self.next_request += 1;
        self.loads_in_flight += 1;
        tracing::debug!(request, path = %file.path().display(), "loading");
        self.loader.load(request, file, self.queue.reply(Service::Loader, Event::Loaded));
    }

    /// Drain every queued event.  Call on the UI thread after a wake-up.
    /// Returns the number of events handled.
    pub(crate) fn dispatch_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.queue.try_next() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::Selected(choice) => {
                self.selections_in_flight = self.selections_in_flight.saturating_sub(1);
                match choice {
                    Some(file) => self.open_file(file),
                    None => tracing::debug!("open cancelled"),
                }
            }
            Event::Loaded(completion) => {
                self.loads_in_flight = self.loads_in_flight.saturating_sub(1);
                self.finish_load(completion);
            }
            Event::Abandoned(Service::Picker) => {
                self.selections_in_flight = self.selections_in_flight.saturating_sub(1);
                if self.selections_in_flight > 0 {
                    // A picker that is already prompting turns away the
                    // newer request.
                    tracing::debug!("duplicate file prompt dropped");
                } else {
                    tracing::warn!("file picker closed without an answer");
                }
            }
            Event::Abandoned(Service::Loader) => {
                self.loads_in_flight = self.loads_in_flight.saturating_sub(1);
                tracing::warn!("file load ended without a result");
            }
        }
    }

    /// Validate a finished read and, if it is UTF-8 text, show it.
    ///
    /// On failure the diagnostic channel gets exactly one record and the
    /// displayed text, caret, and title are left as they were.
    fn finish_load(&mut self, completion: LoadCompletion) {
        let LoadCompletion { request, file, display_name, result } = completion;

        let text = result
            .map_err(|source| ViewerError::Load { path: file.path().to_owned(), source })
            .and_then(|bytes| {
                String::from_utf8(bytes).map_err(|e| ViewerError::Encoding {
                    path: file.path().to_owned(),
                    source: e.utf8_error(),
                })
            });

        match text {
            Ok(text) => {
                tracing::debug!(request, bytes = text.len(), "loaded");
                self.install(&text, &display_name);
            }
            Err(err) => self.diagnostics.report(&err),
        }
    }

    /// Replace the displayed document: content, caret at the start, title.
    fn install(&mut self, text: &str, title: &str) {
        self.slots.main_text_view.set_text(text);
        self.slots.main_text_view.place_cursor(0);
        self.slots.header_bar.set_title(title);
        self.update_cursor_position();
    }

    // ── Cursor ────────────────────────────────────────────────────────────────

    /// Refresh the position label from the text view's caret.
    ///
    /// Call on every caret change, including programmatic moves.
    pub(crate) fn update_cursor_position(&mut self) {
        let (text, offset) = self.slots.main_text_view.snapshot();
        let position = CursorPosition::at(&text, offset);
        self.slots.cursor_pos.set_text(&position.to_string());
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::VecDeque, fs, io, rc::Rc, time::Duration};

    use super::*;
    use crate::{
        diagnostics::fakes::RecordingDiagnostics,
        events::Reply,
        loader::ThreadedLoader,
        ui::fakes::FakeWidgets,
    };

    // ── Fakes ─────────────────────────────────────────────────────────────────

    /// Answers each prompt with the next scripted choice, immediately.
    #[derive(Clone, Default)]
    struct ScriptedPicker(Rc<RefCell<VecDeque<Option<FileHandle>>>>);

    impl ScriptedPicker {
        fn choose(&self, choice: Option<&str>) {
            self.0.borrow_mut().push_back(choice.map(FileHandle::new));
        }
    }

    impl FilePicker for ScriptedPicker {
        fn request(&mut self, reply: Reply<Option<FileHandle>>) {
            let choice = self.0.borrow_mut().pop_front().flatten();
            reply.send(choice);
        }
    }

    /// Holds replies until the test completes them, in any order.
    #[derive(Clone, Default)]
    struct ManualLoader(Rc<RefCell<Vec<(RequestId, FileHandle, Reply<LoadCompletion>)>>>);

    impl ManualLoader {
        fn pending(&self) -> usize {
            self.0.borrow().len()
        }

        /// Complete the `index`-th outstanding request with `result`.
        fn complete(&self, index: usize, result: io::Result<Vec<u8>>) {
            let (request, file, reply) = self.0.borrow_mut().remove(index);
            let display_name = file.base_name();
            reply.send(LoadCompletion { request, file, display_name, result });
        }
    }

    impl FileLoader for ManualLoader {
        fn load(&mut self, request: RequestId, file: FileHandle, reply: Reply<LoadCompletion>) {
            self.0.borrow_mut().push((request, file, reply));
        }
    }

    struct Harness {
        window: ViewerWindow,
        widgets: FakeWidgets,
        picker: ScriptedPicker,
        loader: ManualLoader,
        diagnostics: RecordingDiagnostics,
    }

    fn harness() -> Harness {
        let widgets = FakeWidgets::default();
        let picker = ScriptedPicker::default();
        let loader = ManualLoader::default();
        let diagnostics = RecordingDiagnostics::default();
        let window = ViewerWindow::new(
            widgets.bindings().build().expect("all slots bound"),
            Box::new(picker.clone()),
            Box::new(loader.clone()),
            Box::new(diagnostics.clone()),
            Arc::new(|| {}),
        );
        Harness { window, widgets, picker, loader, diagnostics }
    }

    impl Harness {
        /// Pick `path` and complete its load with `result`.
        fn open(&mut self, path: &str, result: io::Result<Vec<u8>>) {
            self.picker.choose(Some(path));
            assert!(self.window.activate(Action::Open));
            self.window.dispatch_pending();
            self.loader.complete(0, result);
            self.window.dispatch_pending();
        }

        fn move_cursor(&mut self, offset: usize) {
            self.widgets.0.borrow_mut().cursor = offset;
            self.window.update_cursor_position();
        }
    }

    // ── Construction & actions ────────────────────────────────────────────────

    #[test]
    fn new_binds_open_button_and_shows_origin() {
        let h = harness();
        let w = h.widgets.state();
        assert_eq!(w.bound_action, Some(Action::Open));
        assert_eq!(w.label, "Ln 1, Col 1");
        assert_eq!(h.window.phase(), Phase::Idle);
    }

    #[test]
    fn action_names_parse() {
        assert_eq!("open".parse::<Action>().expect("open"), Action::Open);
        assert_eq!("win.save-as".parse::<Action>().expect("save-as"), Action::SaveAs);
        assert_eq!(
            "show-help-overlay".parse::<Action>().expect("help"),
            Action::ShowHelpOverlay
        );
        assert!(matches!("close".parse::<Action>(), Err(ViewerError::UnknownAction(_))));
    }

    #[test]
    fn unimplemented_actions_are_not_handled() {
        let mut h = harness();
        assert!(!h.window.activate_named("save-as").expect("known"));
        assert!(!h.window.activate_named("win.show-help-overlay").expect("known"));
        assert!(h.window.activate_named("win.quit").is_err());
        assert_eq!(h.window.phase(), Phase::Idle);
    }

    // ── Open flow ─────────────────────────────────────────────────────────────

    #[test]
    fn opening_notes_shows_content_title_and_origin() {
        let mut h = harness();
        h.open("/docs/notes.txt", Ok(b"hello\nworld".to_vec()));

        {
            let w = h.widgets.state();
            assert_eq!(w.title, "notes.txt");
            assert_eq!(w.text, "hello\nworld");
            assert_eq!(w.cursor, 0);
            assert_eq!(w.label, "Ln 1, Col 1");
        }

        h.move_cursor(6);
        assert_eq!(h.widgets.state().label, "Ln 2, Col 1");
        assert!(h.diagnostics.records().is_empty());
        assert_eq!(h.window.phase(), Phase::Idle);
    }

    #[test]
    fn cursor_after_kth_newline_is_next_line() {
        let mut h = harness();
        let text = "alpha\nbeta\ngamma\n\ndelta";
        h.open("/t.txt", Ok(text.as_bytes().to_vec()));

        let offsets: Vec<usize> = text
            .char_indices()
            .filter(|&(_, c)| c == '\n')
            .map(|(i, _)| i + 1)
            .collect();
        for (k, offset) in offsets.into_iter().enumerate() {
            h.move_cursor(offset);
            assert_eq!(h.widgets.state().label, format!("Ln {}, Col 1", k + 2));
        }
    }

    #[test]
    fn cursor_update_reads_the_content_once() {
        let mut h = harness();
        h.open("/t.txt", Ok(b"one\ntwo".to_vec()));
        let before = h.widgets.state().text_reads;
        h.move_cursor(5);
        assert_eq!(h.widgets.state().text_reads, before + 1);
        assert_eq!(h.widgets.state().label, "Ln 2, Col 2");
    }

    #[test]
    fn label_is_refreshed_on_every_cursor_change() {
        let mut h = harness();
        h.open("/t.txt", Ok(b"abc".to_vec()));
        let before = h.widgets.state().label_writes;
        h.move_cursor(1);
        h.move_cursor(2);
        assert_eq!(h.widgets.state().label_writes, before + 2);
        assert_eq!(h.widgets.state().label, "Ln 1, Col 3");
    }

    #[test]
    fn phases_follow_the_open_flow() {
        let mut h = harness();
        h.picker.choose(Some("/a.txt"));
        h.window.open_file_dialog();
        assert_eq!(h.window.phase(), Phase::AwaitingSelection);

        h.window.dispatch_pending();
        assert_eq!(h.window.phase(), Phase::AwaitingLoad);
        assert_eq!(h.loader.pending(), 1);

        h.loader.complete(0, Ok(b"x".to_vec()));
        assert_eq!(h.window.dispatch_pending(), 1);
        assert_eq!(h.window.phase(), Phase::Idle);
    }

    #[test]
    fn cancel_leaves_everything_unchanged() {
        let mut h = harness();
        h.open("/keep.txt", Ok(b"keep me".to_vec()));
        h.move_cursor(4);
        let writes = h.widgets.state().label_writes;

        h.picker.choose(None);
        h.window.activate(Action::Open);
        assert_eq!(h.window.dispatch_pending(), 1);

        let w = h.widgets.state();
        assert_eq!(w.title, "keep.txt");
        assert_eq!(w.text, "keep me");
        assert_eq!(w.cursor, 4);
        assert_eq!(w.label_writes, writes);
        assert_eq!(h.loader.pending(), 0);
        assert!(h.diagnostics.records().is_empty());
        assert_eq!(h.window.phase(), Phase::Idle);
    }

    #[test]
    fn picker_that_never_answers_returns_to_idle() {
        struct SilentPicker;
        impl FilePicker for SilentPicker {
            fn request(&mut self, reply: Reply<Option<FileHandle>>) {
                drop(reply);
            }
        }

        let widgets = FakeWidgets::default();
        let diagnostics = RecordingDiagnostics::default();
        let mut window = ViewerWindow::new(
            widgets.bindings().build().expect("all slots bound"),
            Box::new(SilentPicker),
            Box::new(ManualLoader::default()),
            Box::new(diagnostics.clone()),
            Arc::new(|| {}),
        );

        window.open_file_dialog();
        assert_eq!(window.dispatch_pending(), 1);
        assert_eq!(window.phase(), Phase::Idle);
        assert!(diagnostics.records().is_empty());
    }

    #[test]
    fn duplicate_prompt_keeps_awaiting_the_first() {
        /// Holds the first prompt open; turns away any that arrive meanwhile.
        #[derive(Clone, Default)]
        struct ParkingPicker(Rc<RefCell<Option<Reply<Option<FileHandle>>>>>);

        impl FilePicker for ParkingPicker {
            fn request(&mut self, reply: Reply<Option<FileHandle>>) {
                let mut parked = self.0.borrow_mut();
                if parked.is_none() {
                    *parked = Some(reply);
                }
            }
        }

        let widgets = FakeWidgets::default();
        let picker = ParkingPicker::default();
        let loader = ManualLoader::default();
        let mut window = ViewerWindow::new(
            widgets.bindings().build().expect("all slots bound"),
            Box::new(picker.clone()),
            Box::new(loader.clone()),
            Box::new(RecordingDiagnostics::default()),
            Arc::new(|| {}),
        );

        window.open_file_dialog();
        window.open_file_dialog();
        // The turned-away prompt reports itself abandoned.
        assert_eq!(window.dispatch_pending(), 1);
        assert!(picker.0.borrow().is_some());
        assert_eq!(window.phase(), Phase::AwaitingSelection);

        let reply = picker.0.borrow_mut().take().expect("first prompt parked");
        reply.send(Some(FileHandle::new("/a.txt")));
        assert_eq!(window.dispatch_pending(), 1);
        assert_eq!(window.phase(), Phase::AwaitingLoad);
        assert_eq!(loader.pending(), 1);
    }

    // ── Failures ──────────────────────────────────────────────────────────────

    #[test]
    fn invalid_utf8_is_reported_once_and_not_shown() {
        let mut h = harness();
        h.open("/keep.txt", Ok(b"previous".to_vec()));
        h.move_cursor(3);

        h.open("/data/blob.bin", Ok(vec![0xFF, 0xFE]));

        let w = h.widgets.state();
        assert_eq!(w.title, "keep.txt");
        assert_eq!(w.text, "previous");
        assert_eq!(w.cursor, 3);
        let records = h.diagnostics.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].contains("/data/blob.bin"), "{}", records[0]);
        assert!(records[0].contains("not encoded with UTF-8"));
    }

    #[test]
    fn invalid_byte_after_nul_is_still_rejected() {
        // Validation covers the full length, not a NUL-terminated prefix.
        let mut h = harness();
        h.open("/x.bin", Ok(b"ok\0\xC3".to_vec()));
        assert_eq!(h.widgets.state().text, "");
        assert_eq!(h.diagnostics.records().len(), 1);
    }

    #[test]
    fn embedded_nul_is_valid_text() {
        let mut h = harness();
        h.open("/x.txt", Ok(b"a\0b".to_vec()));
        assert_eq!(h.widgets.state().text, "a\0b");
        assert!(h.diagnostics.records().is_empty());
    }

    #[test]
    fn read_error_is_reported_with_path_and_message() {
        let mut h = harness();
        h.open("/keep.txt", Ok(b"previous".to_vec()));

        h.open(
            "/root/secret.txt",
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied")),
        );

        assert_eq!(h.widgets.state().text, "previous");
        assert_eq!(h.widgets.state().title, "keep.txt");
        assert_eq!(
            h.diagnostics.records(),
            vec!["Unable to open “/root/secret.txt”: Permission denied".to_owned()]
        );
    }

    // ── Concurrent opens ──────────────────────────────────────────────────────

    #[test]
    fn last_completion_wins() {
        let mut h = harness();
        h.window.open_file(FileHandle::new("/first.txt"));
        h.window.open_file(FileHandle::new("/second.txt"));
        assert_eq!(h.loader.pending(), 2);
        assert_eq!(h.window.phase(), Phase::AwaitingLoad);

        // The second request finishes first; the first one lands afterwards.
        h.loader.complete(1, Ok(b"two".to_vec()));
        h.window.dispatch_pending();
        assert_eq!(h.widgets.state().title, "second.txt");
        assert_eq!(h.window.phase(), Phase::AwaitingLoad);

        h.loader.complete(0, Ok(b"one".to_vec()));
        h.window.dispatch_pending();
        assert_eq!(h.widgets.state().title, "first.txt");
        assert_eq!(h.widgets.state().text, "one");
        assert_eq!(h.window.phase(), Phase::Idle);
    }

    // ── Real files ────────────────────────────────────────────────────────────

    fn threaded(picker: ScriptedPicker) -> (ViewerWindow, FakeWidgets, RecordingDiagnostics) {
        let widgets = FakeWidgets::default();
        let diagnostics = RecordingDiagnostics::default();
        let window = ViewerWindow::new(
            widgets.bindings().build().expect("all slots bound"),
            Box::new(picker),
            Box::new(ThreadedLoader),
            Box::new(diagnostics.clone()),
            Arc::new(|| {}),
        );
        (window, widgets, diagnostics)
    }

    /// Wait for the loader thread, then apply its completion.
    fn settle(window: &mut ViewerWindow) {
        while window.phase() != Phase::Idle {
            if let Some(event) = window.queue.next_timeout(Duration::from_secs(5)) {
                window.handle(event);
            } else {
                panic!("load did not complete");
            }
        }
    }

    #[test]
    fn opens_real_file_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        fs::write(&path, "hello\nworld").expect("write");

        let picker = ScriptedPicker::default();
        picker.0.borrow_mut().push_back(Some(FileHandle::new(&path)));
        let (mut window, widgets, diagnostics) = threaded(picker);

        window.activate(Action::Open);
        window.dispatch_pending();
        settle(&mut window);

        let w = widgets.state();
        assert_eq!(w.title, "notes.txt");
        assert_eq!(w.text, "hello\nworld");
        assert_eq!(w.label, "Ln 1, Col 1");
        assert!(diagnostics.records().is_empty());
    }

    #[test]
    fn real_invalid_file_yields_one_diagnostic() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bom.bin");
        fs::write(&path, [0xFF_u8, 0xFE]).expect("write");

        let picker = ScriptedPicker::default();
        picker.0.borrow_mut().push_back(Some(FileHandle::new(&path)));
        let (mut window, widgets, diagnostics) = threaded(picker);

        window.activate(Action::Open);
        window.dispatch_pending();
        settle(&mut window);

        assert_eq!(widgets.state().text, "");
        assert_eq!(widgets.state().title, "");
        let records = diagnostics.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].contains(&path.display().to_string()));
    }

    #[test]
    fn real_missing_file_yields_one_diagnostic() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing.txt");
        let (mut window, widgets, diagnostics) = threaded(ScriptedPicker::default());

        window.open_file(FileHandle::new(&path));
        settle(&mut window);

        assert_eq!(widgets.state().title, "");
        let records = diagnostics.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].starts_with("Unable to open"));
        assert!(records[0].contains(&path.display().to_string()));
    }
}
