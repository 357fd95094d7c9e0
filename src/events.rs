// ── UI-thread event queue ─────────────────────────────────────────────────────
//
// Picker and loader results travel back to the UI thread as messages.  Any
// thread may send; only the UI thread drains.  After every send the `Waker`
// nudges the UI loop (on Win32: a posted `WM_APP` message) so the queue is
// drained on its next turn.

use std::sync::Arc;

use crossbeam::channel::{Receiver, Sender, TryRecvError};

use crate::loader::{FileHandle, LoadCompletion};

/// Wakes the UI execution context so it drains the queue.
pub(crate) trait Waker: Send + Sync {
    fn wake(&self);
}

impl<F: Fn() + Send + Sync> Waker for F {
    fn wake(&self) {
        self()
    }
}

/// Everything that can arrive on the UI thread from an external service.
#[derive(Debug)]
pub(crate) enum Event {
    /// The file picker closed; `None` means the user cancelled.
    Selected(Option<FileHandle>),
    /// A file read finished, successfully or not.
    Loaded(LoadCompletion),
    /// A service dropped its reply without answering.
    Abandoned(Service),
}

/// Which service a reply belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Service {
    Picker,
    Loader,
}

/// Receiving half, owned by the controller.
pub(crate) struct EventQueue {
    tx: Sender<Event>,
    rx: Receiver<Event>,
    waker: Arc<dyn Waker>,
}

impl EventQueue {
    pub(crate) fn new(waker: Arc<dyn Waker>) -> Self {
        let (tx, rx) = crossbeam::channel::unbounded();
        Self { tx, rx, waker }
    }

    /// A reply slot that delivers exactly one event: `wrap(value)` when sent,
    /// or `Event::Abandoned(service)` if the reply is dropped unsent.
    pub(crate) fn reply<T>(&self, service: Service, wrap: fn(T) -> Event) -> Reply<T> {
        Reply {
            tx: self.tx.clone(),
            waker: Arc::clone(&self.waker),
            wrap,
            abandoned: Some(Event::Abandoned(service)),
        }
    }

    /// Next queued event without blocking.
    pub(crate) fn try_next(&self) -> Option<Event> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            // The queue holds its own sender, so it is never disconnected.
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Block until an event arrives or `timeout` elapses.
    #[cfg(test)]
    pub(crate) fn next_timeout(&self, timeout: std::time::Duration) -> Option<Event> {
        self.rx.recv_timeout(timeout).ok()
    }
}

/// Single-shot completion handle.
///
/// `send` consumes the reply, so a service cannot complete the same request
/// twice; dropping it unsent still produces exactly one event.
pub(crate) struct Reply<T> {
    tx: Sender<Event>,
    waker: Arc<dyn Waker>,
    wrap: fn(T) -> Event,
    abandoned: Option<Event>,
}

impl<T> Reply<T> {
    pub(crate) fn send(mut self, value: T) {
        self.abandoned = None;
        self.deliver((self.wrap)(value));
    }

    fn deliver(&self, event: Event) {
        // The receiver lives as long as the window; a send after teardown is
        // simply dropped.
        if self.tx.send(event).is_ok() {
            self.waker.wake();
        }
    }
}

impl<T> Drop for Reply<T> {
    fn drop(&mut self) {
        if let Some(event) = self.abandoned.take() {
            self.deliver(event);
        }
    }
}

impl<T> std::fmt::Debug for Reply<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reply").finish_non_exhaustive()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting_queue() -> (EventQueue, Arc<AtomicUsize>) {
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        let queue = EventQueue::new(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        (queue, wakes)
    }

    #[test]
    fn empty_queue_yields_nothing() {
        let (queue, wakes) = counting_queue();
        assert!(queue.try_next().is_none());
        assert_eq!(wakes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn send_wraps_value_and_wakes_once() {
        let (queue, wakes) = counting_queue();
        queue.reply(Service::Picker, Event::Selected).send(None);

        assert!(matches!(queue.try_next(), Some(Event::Selected(None))));
        assert!(queue.try_next().is_none());
        assert_eq!(wakes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn replies_can_complete_from_another_thread() {
        let (queue, wakes) = counting_queue();
        let reply = queue.reply(Service::Picker, Event::Selected);
        std::thread::spawn(move || reply.send(Some(FileHandle::new("a.txt"))))
            .join()
            .expect("sender thread");

        match queue.next_timeout(std::time::Duration::from_secs(5)) {
            Some(Event::Selected(Some(file))) => assert_eq!(file.base_name(), "a.txt"),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(wakes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropped_reply_is_reported_as_abandoned() {
        let (queue, wakes) = counting_queue();
        drop(queue.reply(Service::Loader, Event::Loaded));

        assert!(matches!(queue.try_next(), Some(Event::Abandoned(Service::Loader))));
        assert!(queue.try_next().is_none());
        assert_eq!(wakes.load(Ordering::SeqCst), 1);
    }
}
