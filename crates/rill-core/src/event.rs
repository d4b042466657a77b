//! Event types and event records.
//!
//! An [`EventType`] is nothing but a stable name. It doubles as the
//! subscription key for interaction sources and as the dispatch key for
//! updates, so two event types with the same name are the same event type.
//! Calling [`EventType::record`] wraps a payload into an [`EventRecord`].

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Arbitrary event payload. `Null` stands in for "no payload".
pub type Payload = Value;

/// Named identity for a class of event.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventType(Cow<'static, str>);

impl EventType {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Constructs a record of this type carrying `payload`.
    pub fn record(&self, payload: impl Into<Payload>) -> EventRecord {
        EventRecord {
            event_type: self.clone(),
            payload: payload.into(),
        }
    }

    /// Constructs a record with a `Null` payload.
    pub fn signal(&self) -> EventRecord {
        self.record(Value::Null)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventType({})", self.0)
    }
}

impl AsRef<str> for EventType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for EventType {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for EventType {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl From<&EventType> for EventType {
    fn from(event_type: &EventType) -> Self {
        event_type.clone()
    }
}

impl PartialEq<str> for EventType {
    fn eq(&self, other: &str) -> bool {
        self.name() == other
    }
}

impl PartialEq<&str> for EventType {
    fn eq(&self, other: &&str) -> bool {
        self.name() == *other
    }
}

/// `{eventType, payload}`: one occurrence flowing through a stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    event_type: EventType,
    payload: Payload,
}

impl EventRecord {
    pub fn new(event_type: impl Into<EventType>, payload: impl Into<Payload>) -> Self {
        Self {
            event_type: event_type.into(),
            payload: payload.into(),
        }
    }

    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn is(&self, name: &str) -> bool {
        self.event_type == *name
    }

    pub fn into_parts(self) -> (EventType, Payload) {
        (self.event_type, self.payload)
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }

    /// Same payload, different type. This is how a parent renames a child's event.
    pub fn retag(self, event_type: impl Into<EventType>) -> Self {
        Self {
            event_type: event_type.into(),
            payload: self.payload,
        }
    }

    pub fn with_payload(self, payload: impl Into<Payload>) -> Self {
        Self {
            event_type: self.event_type,
            payload: payload.into(),
        }
    }

    pub fn map_payload(self, f: impl FnOnce(Payload) -> Payload) -> Self {
        Self {
            payload: f(self.payload),
            event_type: self.event_type,
        }
    }
}
