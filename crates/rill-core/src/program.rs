//! Root driver.
//!
//! A [`Program`] folds every dispatched record into the model with `update`
//! and re-renders `view` into its root container after each fold, starting
//! with the initial model. Everything runs synchronously on the dispatching
//! call stack, so a dispatch made while rendering is fully reduced and
//! rendered before the outer dispatch returns.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use rill_stream::{Stream, Subject, Subscription};

use crate::config::RillConfig;
use crate::error::{Failures, Result, RillError};
use crate::event::{EventRecord, EventType, Payload};
use crate::host::RootContainer;
use crate::inbox::Inbox;
use crate::kind::EventKind;
use crate::node::{EventHandler, Node};
use crate::update::Update;

/// Initial model, update function and view.
pub struct ProgramSpec<M, U, V> {
    pub model: M,
    pub update: U,
    pub view: V,
}

/// Starts a program with default configuration.
pub fn beginner_program<M, U, V, R>(spec: ProgramSpec<M, U, V>, root: R) -> Result<Program<M>>
where
    M: Clone + 'static,
    U: Update<M> + 'static,
    V: Fn(&M, &Dispatcher) -> Node + 'static,
    R: RootContainer + 'static,
{
    Program::start(spec, root, &RillConfig::default())
}

/// Entry point for records into a program.
#[derive(Clone)]
pub struct Dispatcher {
    events: Subject<EventRecord>,
    failures: Failures,
    depth: Rc<Cell<usize>>,
    max_depth: usize,
    trace_events: bool,
}

impl Dispatcher {
    /// Reduces and renders `record` before returning.
    ///
    /// Fails with whatever `update` or the root container raised, or with
    /// `DispatchDepthExceeded` when nested dispatches run away.
    pub fn dispatch(&self, record: EventRecord) -> Result<()> {
        let depth = self.depth.get();
        if depth >= self.max_depth {
            tracing::warn!(
                limit = self.max_depth,
                event_type = %record.event_type(),
                "dispatch depth exceeded"
            );
            return Err(RillError::DispatchDepthExceeded {
                limit: self.max_depth,
            });
        }
        if self.trace_events {
            tracing::trace!(depth, event_type = %record.event_type(), "dispatch");
        }

        self.depth.set(depth + 1);
        let result = self.failures.trap(|| {
            self.events.emit(record);
            Ok(())
        });
        self.depth.set(depth);
        result
    }

    pub fn send(
        &self,
        event_type: impl Into<EventType>,
        payload: impl Into<Payload>,
    ) -> Result<()> {
        self.dispatch(EventRecord::new(event_type, payload))
    }

    pub fn send_kind<K: EventKind>(&self, kind: K) -> Result<()> {
        self.dispatch(kind.into_record()?)
    }

    /// [`Dispatcher::dispatch`] as an `onEvent` handler for views.
    pub fn handler(&self) -> EventHandler {
        let dispatcher = self.clone();
        EventHandler::new(move |record| dispatcher.dispatch(record))
    }

    pub fn depth(&self) -> usize {
        self.depth.get()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("depth", &self.depth.get())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

/// A running program. Dropping it stops reductions and renders.
pub struct Program<M> {
    latest: Rc<RefCell<M>>,
    renders: Rc<Cell<usize>>,
    dispatcher: Dispatcher,
    _store: Subscription,
}

impl<M: Clone + 'static> Program<M> {
    pub fn start<U, V, R>(spec: ProgramSpec<M, U, V>, root: R, config: &RillConfig) -> Result<Self>
    where
        U: Update<M> + 'static,
        V: Fn(&M, &Dispatcher) -> Node + 'static,
        R: RootContainer + 'static,
    {
        let ProgramSpec { model, update, view } = spec;
        let failures = Failures::new();
        let dispatcher = Dispatcher {
            events: Subject::new(),
            failures: failures.clone(),
            depth: Rc::new(Cell::new(0)),
            max_depth: config.dispatch.max_depth,
            trace_events: config.dispatch.trace_events,
        };

        // A failed update leaves the model untouched and emits nothing.
        let reductions = {
            let failures = failures.clone();
            dispatcher
                .events
                .stream()
                .scan((model.clone(), false), move |(current, _), event: EventRecord| {
                    match update.update(&event, current) {
                        Ok(next) => (next, true),
                        Err(err) => {
                            tracing::debug!(
                                event_type = %event.event_type(),
                                error = %err,
                                "update failed"
                            );
                            failures.push(err);
                            (current.clone(), false)
                        }
                    }
                })
                .filter_map(|(model, applied)| applied.then_some(model))
        };

        // Reductions are subscribed before the seed is emitted, so dispatches
        // made while rendering the seed are not lost.
        let store = reductions.merge(&Stream::just(model.clone()));

        let latest = Rc::new(RefCell::new(model));
        let renders = Rc::new(Cell::new(0usize));

        let render = {
            let latest = Rc::clone(&latest);
            let renders = Rc::clone(&renders);
            let dispatcher = dispatcher.clone();
            move |model: M| {
                *latest.borrow_mut() = model.clone();
                let count = renders.get() + 1;
                renders.set(count);
                tracing::debug!(render = count, depth = dispatcher.depth(), "rendering view");

                let node = view(&model, &dispatcher);
                if let Err(err) = root.mount(node) {
                    dispatcher.failures.push(err);
                }
            }
        };

        let mark = failures.mark();
        let store = store.subscribe(render);
        failures.since(mark)?;

        tracing::info!(max_depth = config.dispatch.max_depth, "program started");
        Ok(Self {
            latest,
            renders,
            dispatcher,
            _store: store,
        })
    }

    /// The most recently rendered model.
    pub fn model(&self) -> M {
        self.latest.borrow().clone()
    }

    pub fn render_count(&self) -> usize {
        self.renders.get()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn dispatch(&self, record: EventRecord) -> Result<()> {
        self.dispatcher.dispatch(record)
    }

    /// Dispatches everything queued in `inbox`, in send order.
    ///
    /// Stops at the first failing record; later records stay queued.
    pub fn drain_inbox(&self, inbox: &mut Inbox) -> Result<usize> {
        let mut drained = 0;
        while let Some(record) = inbox.try_next() {
            self.dispatcher.dispatch(record)?;
            drained += 1;
        }
        if drained > 0 {
            tracing::debug!(drained, "inbox drained");
        }
        Ok(drained)
    }
}

impl<M: fmt::Debug> fmt::Debug for Program<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("model", &self.latest.borrow())
            .field("renders", &self.renders.get())
            .finish()
    }
}
