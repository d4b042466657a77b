//! Per-component event multiplexer.
//!
//! Every component instance owns one [`EventMux`]. It lazily wires named
//! interaction sources into a single component-local stream of
//! [`EventRecord`]s and remaps child events into that stream. All records,
//! wherever they come from, are delivered in the order their sources fired.
//!
//! Errors raised downstream of an injection (a failing mapper, a parent that
//! rejects the event) are handed back to whoever fired the callback.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use rill_stream::{Stream, Subject, SubscriptionSet};

use crate::bridge::bridge;
use crate::config::DispatchConfig;
use crate::error::{Failures, Result, RillError};
use crate::event::{EventRecord, EventType, Payload};
use crate::interaction::InteractionSource;
use crate::kind::EventKind;
use crate::node::{Callback, ElementNode, EventHandler, Node};

/// Injection point into a component-local stream.
#[derive(Clone)]
struct Sink {
    component: Rc<str>,
    events: Subject<EventRecord>,
    failures: Failures,
    trace_events: bool,
}

impl Sink {
    /// Emits without collecting failures. Used by forwarders, which cannot return errors.
    fn push(&self, record: EventRecord) {
        if self.trace_events {
            tracing::trace!(
                component = %self.component,
                event_type = %record.event_type(),
                payload = %record.payload(),
                "event"
            );
        }
        self.events.emit(record);
    }

    fn send(&self, record: EventRecord) -> Result<()> {
        self.failures.trap(|| {
            self.push(record);
            Ok(())
        })
    }

    /// Observer for a named payload source. Failures go to a watching caller
    /// if there is one and are logged otherwise.
    fn forward(&self, event_type: EventType) -> impl Fn(Payload) + 'static {
        let sink = self.clone();
        move |payload| {
            let record = event_type.record(payload);
            if sink.failures.is_watched() {
                sink.push(record);
            } else if let Err(error) = sink.send(record) {
                tracing::warn!(
                    component = %sink.component,
                    event_type = %event_type,
                    error = %error,
                    "event rejected with no caller to report to"
                );
            }
        }
    }
}

struct MuxState {
    sink: Sink,
    registered: RefCell<Vec<EventType>>,
    interactions: Rc<dyn InteractionSource>,
    subscriptions: RefCell<SubscriptionSet>,
    disposed: Cell<bool>,
}

/// Registered event types plus the component-local event stream of one instance.
#[derive(Clone)]
pub struct EventMux {
    state: Rc<MuxState>,
}

impl EventMux {
    pub fn new(
        component: impl Into<String>,
        interactions: Rc<dyn InteractionSource>,
        config: &DispatchConfig,
    ) -> Self {
        let component: String = component.into();
        Self {
            state: Rc::new(MuxState {
                sink: Sink {
                    component: Rc::from(component),
                    events: Subject::new(),
                    failures: Failures::new(),
                    trace_events: config.trace_events,
                },
                registered: RefCell::new(Vec::new()),
                interactions,
                subscriptions: RefCell::new(SubscriptionSet::new()),
                disposed: Cell::new(false),
            }),
        }
    }

    pub fn component(&self) -> &str {
        &self.state.sink.component
    }

    /// Wires `event_type`'s interaction source into the local stream, once.
    ///
    /// Calling again with the same name subscribes nothing new. Returns the
    /// source's listener either way.
    pub fn register(&self, event_type: impl Into<EventType>) -> Callback {
        let event_type = event_type.into();

        let first = {
            let mut registered = self.state.registered.borrow_mut();
            if registered.contains(&event_type) {
                false
            } else {
                registered.push(event_type.clone());
                true
            }
        };

        if !first {
            tracing::trace!(
                component = %self.component(),
                event_type = %event_type,
                "event type already registered"
            );
        } else if self.state.disposed.get() {
            tracing::warn!(
                component = %self.component(),
                event_type = %event_type,
                "register on disposed multiplexer, not subscribing"
            );
        } else {
            tracing::debug!(
                component = %self.component(),
                event_type = %event_type,
                "event type registered"
            );
            let subscription = self
                .state
                .interactions
                .get(&event_type)
                .subscribe(self.state.sink.forward(event_type.clone()));
            self.state.subscriptions.borrow_mut().add(subscription);
        }

        self.listener(event_type)
    }

    /// Raw payload source for `event_type`, straight from the interaction provider.
    pub fn get(&self, event_type: impl Into<EventType>) -> Stream<Payload> {
        self.state.interactions.get(&event_type.into())
    }

    /// The interaction provider's listener, reporting downstream failures to its caller.
    pub fn listener(&self, event_type: impl Into<EventType>) -> Callback {
        let raw = self.state.interactions.listener(&event_type.into());
        let failures = self.state.sink.failures.clone();
        Callback::new(move |payload| failures.trap(|| raw.call(payload)))
    }

    /// Injects a record into the local stream.
    pub fn send(&self, record: EventRecord) -> Result<()> {
        self.state.sink.send(record)
    }

    /// [`EventMux::send`] as an `onEvent` handler.
    pub fn sender(&self) -> EventHandler {
        let sink = self.state.sink.clone();
        EventHandler::new(move |record| sink.send(record))
    }

    /// The component-local event stream.
    pub fn events(&self) -> Stream<EventRecord> {
        self.state.sink.events.stream()
    }

    /// Forwards an additional named stream into the local stream.
    pub fn merge(&self, event_type: impl Into<EventType>, stream: &Stream<Payload>) {
        let event_type = event_type.into();
        if self.state.disposed.get() {
            tracing::warn!(
                component = %self.component(),
                event_type = %event_type,
                "merge on disposed multiplexer ignored"
            );
            return;
        }
        tracing::debug!(component = %self.component(), event_type = %event_type, "stream merged");
        let subscription = stream.subscribe(self.state.sink.forward(event_type));
        self.state.subscriptions.borrow_mut().add(subscription);
    }

    /// Replaces `node`'s `onEvent` with a handler that maps each record and
    /// injects the result into the local stream.
    pub fn map(&self, mapper: impl Into<Mapper>, node: Node) -> Node {
        let mapper = mapper.into();
        let sink = self.state.sink.clone();
        node.with_on_event(EventHandler::new(move |record| match mapper.apply(record)? {
            Some(mapped) => sink.send(mapped),
            None => Ok(()),
        }))
    }

    /// Exhaustive remapping from a child vocabulary `C` into a parent vocabulary `P`.
    pub fn map_typed<C, P>(&self, f: impl Fn(C) -> P + 'static, node: Node) -> Node
    where
        C: EventKind,
        P: EventKind,
    {
        self.map(
            Mapper::try_transform(move |record| f(C::from_record(&record)?).into_record()),
            node,
        )
    }

    /// Bridges `element` for exactly the map's keys, then maps through it.
    pub fn map_ordinary(&self, event_map: EventMap, element: ElementNode) -> Node {
        let node = bridge(element, event_map.event_types());
        self.map(event_map, node)
    }

    /// Re-emits a child's records unchanged.
    pub fn link(&self, node: Node) -> Node {
        self.map(Mapper::identity(), node)
    }

    pub fn registered(&self) -> Vec<EventType> {
        self.state.registered.borrow().clone()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.state.registered.borrow().iter().any(|ty| ty.name() == name)
    }

    /// Trap shared by every injection into this multiplexer.
    pub fn failures(&self) -> &Failures {
        &self.state.sink.failures
    }

    pub fn subscription_count(&self) -> usize {
        self.state.subscriptions.borrow().len()
    }

    pub fn is_disposed(&self) -> bool {
        self.state.disposed.get()
    }

    /// Releases every upstream subscription and completes the local stream.
    pub fn dispose(&self) {
        if self.state.disposed.replace(true) {
            return;
        }
        tracing::debug!(
            component = %self.component(),
            subscriptions = self.subscription_count(),
            "multiplexer disposed"
        );
        let released = self.state.subscriptions.borrow_mut().take();
        drop(released);
        self.state.sink.events.complete();
    }
}

impl fmt::Debug for EventMux {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventMux")
            .field("component", &self.component())
            .field("registered", &self.state.registered.borrow())
            .field("disposed", &self.state.disposed.get())
            .finish()
    }
}

type MapFn = Rc<dyn Fn(EventRecord) -> Result<Option<EventRecord>>>;

/// Record transform applied by [`EventMux::map`].
#[derive(Clone)]
pub struct Mapper(MapFn);

impl Mapper {
    pub fn transform(f: impl Fn(EventRecord) -> EventRecord + 'static) -> Self {
        Self(Rc::new(move |record| Ok(Some(f(record)))))
    }

    pub fn try_transform(f: impl Fn(EventRecord) -> Result<EventRecord> + 'static) -> Self {
        Self(Rc::new(move |record| f(record).map(Some)))
    }

    /// Drops records for which `f` returns `None`.
    pub fn filter_map(f: impl Fn(EventRecord) -> Option<EventRecord> + 'static) -> Self {
        Self(Rc::new(move |record| Ok(f(record))))
    }

    pub fn identity() -> Self {
        Self(Rc::new(|record| Ok(Some(record))))
    }

    pub fn apply(&self, record: EventRecord) -> Result<Option<EventRecord>> {
        (self.0)(record)
    }
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Mapper(..)")
    }
}

impl From<EventMap> for Mapper {
    fn from(map: EventMap) -> Self {
        Self(Rc::new(move |record| map.apply(record).map(Some)))
    }
}

type PayloadMap = Rc<dyn Fn(Payload) -> EventRecord>;

/// Mapping keyed by event type name; each entry builds a new record from the payload.
#[derive(Clone, Default)]
pub struct EventMap {
    entries: Vec<(EventType, PayloadMap)>,
}

impl EventMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the entry for `event_type`.
    pub fn on(
        mut self,
        event_type: impl Into<EventType>,
        f: impl Fn(Payload) -> EventRecord + 'static,
    ) -> Self {
        let event_type = event_type.into();
        let f: PayloadMap = Rc::new(f);
        match self.entries.iter_mut().find(|(ty, _)| *ty == event_type) {
            Some(entry) => entry.1 = f,
            None => self.entries.push((event_type, f)),
        }
        self
    }

    /// Renames `event_type` to `target`, keeping the payload.
    pub fn to(self, event_type: impl Into<EventType>, target: impl Into<EventType>) -> Self {
        let target = target.into();
        self.on(event_type, move |payload| target.record(payload))
    }

    pub fn event_types(&self) -> Vec<EventType> {
        self.entries.iter().map(|(ty, _)| ty.clone()).collect()
    }

    pub fn apply(&self, record: EventRecord) -> Result<EventRecord> {
        let (event_type, payload) = record.into_parts();
        match self.entries.iter().find(|(ty, _)| *ty == event_type) {
            Some((_, f)) => Ok(f(payload)),
            None => Err(RillError::UnknownEventType {
                name: event_type.name().to_string(),
            }),
        }
    }
}

impl fmt::Debug for EventMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventMap")
            .field("event_types", &self.event_types())
            .finish()
    }
}
