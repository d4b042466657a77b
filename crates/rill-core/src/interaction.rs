//! Interaction source provider.
//!
//! The multiplexer reads raw payload sources by name and never enumerates
//! them. [`Interactions`] is the in-process provider: one lazily created
//! subject per name.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use rill_stream::{Stream, Subject};

use crate::event::{EventType, Payload};
use crate::node::Callback;

/// Source of raw interaction payloads, keyed by event type name.
pub trait InteractionSource {
    /// The push source of payloads for `event_type`.
    fn get(&self, event_type: &EventType) -> Stream<Payload>;

    /// A pass-through callback feeding the same source.
    fn listener(&self, event_type: &EventType) -> Callback;
}

#[derive(Clone, Default)]
pub struct Interactions {
    sources: Rc<RefCell<HashMap<EventType, Subject<Payload>>>>,
}

impl Interactions {
    pub fn new() -> Self {
        Self::default()
    }

    fn source(&self, event_type: &EventType) -> Subject<Payload> {
        self.sources
            .borrow_mut()
            .entry(event_type.clone())
            .or_insert_with(|| {
                tracing::trace!(event_type = %event_type, "interaction source created");
                Subject::new()
            })
            .clone()
    }

    /// Pushes a payload as if the named interaction fired.
    pub fn emit(&self, event_type: impl Into<EventType>, payload: impl Into<Payload>) {
        let event_type = event_type.into();
        // Clone the subject out so observers may touch the map.
        let subject = self.source(&event_type);
        subject.emit(payload.into());
    }

    /// Whether anything has asked for `name` yet.
    pub fn is_created(&self, name: &str) -> bool {
        self.sources.borrow().keys().any(|ty| ty.name() == name)
    }

    pub fn observer_count(&self, name: &str) -> usize {
        self.sources
            .borrow()
            .iter()
            .find(|(ty, _)| ty.name() == name)
            .map(|(_, subject)| subject.observer_count())
            .unwrap_or(0)
    }
}

impl InteractionSource for Interactions {
    fn get(&self, event_type: &EventType) -> Stream<Payload> {
        self.source(event_type).stream()
    }

    fn listener(&self, event_type: &EventType) -> Callback {
        let subject = self.source(event_type);
        Callback::new(move |payload| {
            subject.emit(payload);
            Ok(())
        })
    }
}

impl fmt::Debug for Interactions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sources = self.sources.borrow();
        let mut names: Vec<&str> = sources.keys().map(EventType::name).collect();
        names.sort_unstable();
        f.debug_struct("Interactions").field("sources", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sources_are_created_lazily() {
        let interactions = Interactions::new();
        assert!(!interactions.is_created("click"));

        let _stream = interactions.get(&EventType::from("click"));
        assert!(interactions.is_created("click"));
        assert!(!interactions.is_created("change"));
    }

    #[test]
    fn listener_and_emit_feed_the_same_source() {
        let interactions = Interactions::new();
        let click = EventType::from("click");

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _sub = interactions
            .get(&click)
            .subscribe(move |p| sink.borrow_mut().push(p));

        interactions.listener(&click).call(1).unwrap();
        interactions.emit("click", 2);
        interactions.emit("change", 3);

        assert_eq!(*seen.borrow(), vec![json!(1), json!(2)]);
        assert_eq!(interactions.observer_count("click"), 1);
    }

    #[test]
    fn clones_share_sources() {
        let interactions = Interactions::new();
        let other = interactions.clone();
        other.emit("submit", json!(null));
        assert!(interactions.is_created("submit"));
    }
}
