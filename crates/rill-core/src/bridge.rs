//! Event bridge for leaf elements.
//!
//! A bridged element exposes one callback per listed event type. Each callback
//! tags its payload as `{eventType, payload}` and forwards the record through
//! the bridge's single `onEvent` handler.

use crate::error::RillError;
use crate::event::EventType;
use crate::node::{Callback, ElementNode, EventHandler, Node};

#[derive(Debug, Clone)]
pub struct BridgeNode {
    pub inner: ElementNode,
    pub event_types: Vec<EventType>,
    pub on_event: Option<EventHandler>,
}

/// Wraps `element` so that the named callbacks emit tagged records.
pub fn bridge<I, N>(element: ElementNode, event_types: I) -> Node
where
    I: IntoIterator<Item = N>,
    N: Into<EventType>,
{
    let mut types: Vec<EventType> = Vec::new();
    for ty in event_types {
        let ty = ty.into();
        if !types.contains(&ty) {
            types.push(ty);
        }
    }
    Node::Bridge(BridgeNode {
        inner: element,
        event_types: types,
        on_event: None,
    })
}

impl BridgeNode {
    /// Clones the inner element with the bridged callbacks installed.
    ///
    /// Inner handlers with a bridged name are shadowed; all others are kept.
    pub fn materialize(&self) -> ElementNode {
        let mut element = self.inner.clone();
        for ty in &self.event_types {
            element
                .handlers
                .insert(ty.name().to_string(), bridged_callback(ty.clone(), self.on_event.clone()));
        }
        element.on_event = self.on_event.clone();
        element
    }
}

fn bridged_callback(event_type: EventType, sink: Option<EventHandler>) -> Callback {
    Callback::new(move |payload| match &sink {
        Some(handler) => handler.call(event_type.record(payload)),
        None => Err(RillError::MissingEventSink {
            event_type: event_type.name().to_string(),
        }),
    })
}
