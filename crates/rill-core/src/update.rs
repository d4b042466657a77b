//! Model update functions.
//!
//! Anything implementing [`Update`] can drive a [`Program`](crate::Program):
//! a plain closure over records, a name-keyed [`UpdateMap`], or an
//! exhaustive match over an [`EventKind`] via [`typed_update`].

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use crate::error::{Result, RillError};
use crate::event::{EventRecord, EventType, Payload};
use crate::kind::EventKind;

/// Reduces one event into the next model.
pub trait Update<M> {
    fn update(&self, event: &EventRecord, model: &M) -> Result<M>;
}

impl<M, F> Update<M> for F
where
    F: Fn(&EventRecord, &M) -> M,
{
    fn update(&self, event: &EventRecord, model: &M) -> Result<M> {
        Ok(self(event, model))
    }
}

type PayloadUpdate<M> = Box<dyn Fn(&Payload, &M) -> M>;

/// Update functions keyed by event type name.
///
/// Each entry sees only the payload; a record whose type has no entry fails
/// with [`RillError::UnknownEventType`].
pub struct UpdateMap<M> {
    entries: BTreeMap<EventType, PayloadUpdate<M>>,
}

impl<M> UpdateMap<M> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Adds (or replaces) the update for `event_type`.
    pub fn on(
        mut self,
        event_type: impl Into<EventType>,
        f: impl Fn(&Payload, &M) -> M + 'static,
    ) -> Self {
        self.entries.insert(event_type.into(), Box::new(f));
        self
    }

    pub fn handles(&self, name: &str) -> bool {
        self.entries.keys().any(|ty| ty.name() == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<M> Default for UpdateMap<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> fmt::Debug for UpdateMap<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateMap")
            .field("event_types", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<M> Update<M> for UpdateMap<M> {
    fn update(&self, event: &EventRecord, model: &M) -> Result<M> {
        let f = self
            .entries
            .get(event.event_type())
            .ok_or_else(|| RillError::UnknownEventType {
                name: event.event_type().name().to_string(),
            })?;
        Ok(f(event.payload(), model))
    }
}

/// Update that decodes each record into `K` before calling `f`.
pub struct TypedUpdate<K, F> {
    f: F,
    _kind: PhantomData<fn() -> K>,
}

pub fn typed_update<K, M, F>(f: F) -> TypedUpdate<K, F>
where
    K: EventKind,
    F: Fn(K, &M) -> M,
{
    TypedUpdate {
        f,
        _kind: PhantomData,
    }
}

impl<K, M, F> Update<M> for TypedUpdate<K, F>
where
    K: EventKind,
    F: Fn(K, &M) -> M,
{
    fn update(&self, event: &EventRecord, model: &M) -> Result<M> {
        let kind = K::from_record(event)?;
        Ok((self.f)(kind, model))
    }
}

impl<K, F> fmt::Debug for TypedUpdate<K, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedUpdate")
            .field("kind", &std::any::type_name::<K>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn apply<M>(update: &dyn Update<M>, model: M, events: &[EventRecord]) -> Result<M> {
        events
            .iter()
            .try_fold(model, |model, event| update.update(event, &model))
    }

    #[test]
    fn closure_update() {
        let update = |e: &EventRecord, m: &i64| if e.is("inc") { m + 1 } else { *m };
        let events = [
            EventType::from("inc").signal(),
            EventType::from("noop").signal(),
            EventType::from("inc").signal(),
        ];
        assert_eq!(apply(&update, 0, &events).unwrap(), 2);
    }

    #[test]
    fn update_map_dispatches_by_name() {
        let update = UpdateMap::new()
            .on("add", |p: &Payload, m: &i64| m + p.as_i64().unwrap_or(0))
            .on("reset", |_: &Payload, _: &i64| 0);

        let events = [
            EventType::from("add").record(5),
            EventType::from("add").record(2),
        ];
        assert_eq!(apply(&update, 0, &events).unwrap(), 7);
        assert_eq!(update.update(&EventType::from("reset").signal(), &7).unwrap(), 0);
        assert!(update.handles("add"));
        assert_eq!(update.len(), 2);
    }

    #[test]
    fn update_map_rejects_unknown_type() {
        let update = UpdateMap::new().on("add", |_: &Payload, m: &i64| *m);
        let err = update
            .update(&EventType::from("sub").record(json!(1)), &0)
            .unwrap_err();
        assert!(matches!(err, RillError::UnknownEventType { ref name } if name == "sub"));
    }

    crate::event_kinds! {
        enum Counter {
            Inc(()) => "inc",
            Add(i64) => "add",
        }
    }

    #[test]
    fn typed_update_matches_exhaustively() {
        let update = typed_update(|event: Counter, m: &i64| match event {
            Counter::Inc(()) => m + 1,
            Counter::Add(n) => m + n,
        });
        let events = [
            EventType::from("inc").signal(),
            EventType::from("add").record(10),
        ];
        assert_eq!(apply(&update, 0, &events).unwrap(), 11);
    }

    #[test]
    fn typed_update_surfaces_decode_errors() {
        let update = typed_update(|_: Counter, m: &i64| *m);
        assert!(matches!(
            update.update(&EventType::from("add").record("ten"), &0),
            Err(RillError::Payload { .. })
        ));
        assert!(matches!(
            update.update(&EventType::from("dec").signal(), &0),
            Err(RillError::UnknownEventType { .. })
        ));
    }
}
