//! Error types for the event core

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use thiserror::Error;

/// Result type alias for rill operations
pub type Result<T> = std::result::Result<T, RillError>;

/// Errors surfaced by the event core.
///
/// Nothing is recovered internally: an error raised while handling an
/// interaction is returned to whoever invoked the callback.
#[derive(Debug, Error)]
pub enum RillError {
    /// A keyed mapper or update was handed an event type it has no entry for
    #[error("Unknown event type: {name}")]
    UnknownEventType { name: String },

    /// The registry was asked to create the same event type twice
    #[error("Duplicate event type: {name}")]
    DuplicateEventType { name: String },

    /// A bridged callback fired on an element whose events nobody maps
    #[error("No onEvent handler attached for event type: {event_type}")]
    MissingEventSink { event_type: String },

    /// A typed vocabulary could not decode or encode a payload
    #[error("Invalid payload for event type {event_type}: {source}")]
    Payload {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },

    /// Re-entrant dispatch nested deeper than the configured limit
    #[error("Dispatch nested deeper than {limit} levels")]
    DispatchDepthExceeded { limit: usize },

    /// The host has no element with that key/handler pair mounted
    #[error("No handler '{handler}' on element '{key}'")]
    HandlerNotFound { key: String, handler: String },

    /// The receiving side of an inbox is gone
    #[error("Inbox closed")]
    InboxClosed,

    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// IO errors (reading configuration files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared error trap for failures raised inside stream observers.
///
/// Observers cannot return errors, so whoever triggers a synchronous
/// emission takes a [`Failures::mark`] first and collects everything pushed
/// after it with [`Failures::since`]. Nested triggers drain their own range
/// before the outer one looks. [`Failures::trap`] does both and marks the
/// trap as watched while it runs.
#[derive(Debug, Clone, Default)]
pub struct Failures {
    inner: Rc<RefCell<Vec<RillError>>>,
    watchers: Rc<Cell<usize>>,
}

impl Failures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, error: RillError) {
        self.inner.borrow_mut().push(error);
    }

    pub fn mark(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    /// Whether a [`Failures::trap`] is running on the current stack.
    pub fn is_watched(&self) -> bool {
        self.watchers.get() > 0
    }

    /// Runs `f` and returns its error, or else the first failure pushed while it ran.
    pub fn trap(&self, f: impl FnOnce() -> Result<()>) -> Result<()> {
        let mark = self.mark();
        self.watchers.set(self.watchers.get() + 1);
        let result = f();
        self.watchers.set(self.watchers.get().saturating_sub(1));
        let trapped = self.since(mark);
        result.and(trapped)
    }

    /// Removes everything recorded since `mark` and returns the first failure.
    pub fn since(&self, mark: usize) -> Result<()> {
        let drained: Vec<RillError> = {
            let mut inner = self.inner.borrow_mut();
            let start = mark.min(inner.len());
            inner.drain(start..).collect()
        };

        let mut drained = drained.into_iter();
        match drained.next() {
            None => Ok(()),
            Some(first) => {
                for extra in drained {
                    tracing::warn!(error = %extra, "additional failure during dispatch");
                }
                Err(first)
            }
        }
    }
}
