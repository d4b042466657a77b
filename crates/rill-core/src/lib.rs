//! # rill
//!
//! Elm-style event multiplexing for component trees. Every component funnels
//! its interactions into one ordered stream of tagged records, re-exposes a
//! derived stream to its parent, and the root folds everything into a single
//! model.
//!
//! ```text
//! leaf callbacks --bridge--> {eventType, payload}
//!        |                         |
//!        v                         v
//!   EventMux::register      EventMux::map / link
//!        \                        /
//!         component-local stream ---> ComponentInstance::on_event
//!                                            |
//!                                  parent mux / Program
//!                                            |
//!                         update(event, model) -> view -> RootContainer
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rill_core::{
//!     beginner_program, el, text, Dispatcher, EventRecord, MemoryRoot, Node, ProgramSpec,
//! };
//!
//! let root = MemoryRoot::new();
//! let program = beginner_program(
//!     ProgramSpec {
//!         model: 0i64,
//!         update: |e: &EventRecord, m: &i64| if e.is("inc") { m + 1 } else { *m },
//!         view: |m: &i64, dispatch: &Dispatcher| -> Node {
//!             el("button")
//!                 .key("inc")
//!                 .child(text(m.to_string()))
//!                 .on_event(dispatch.handler())
//!                 .into()
//!         },
//!     },
//!     root.clone(),
//! )?;
//!
//! program.dispatcher().send("inc", rill_core::Payload::Null)?;
//! assert_eq!(program.model(), 1);
//! # Ok::<(), rill_core::RillError>(())
//! ```

mod bridge;
mod component;
mod config;
mod error;
mod event;
mod host;
mod inbox;
mod interaction;
mod kind;
mod mux;
mod node;
mod program;
mod registry;
mod render;
mod update;

#[cfg(any(test, feature = "test-utils"))]
pub mod proptest_strategies;

pub use bridge::{bridge, BridgeNode};
pub use component::{
    component, component_with_options, ComponentContext, ComponentDef, ComponentInstance,
    ComponentNode, ComponentOptions, Definition, Lifecycles,
};
pub use config::{DispatchConfig, DuplicatePolicy, RegistryConfig, RillConfig};
pub use error::{Failures, Result, RillError};
pub use event::{EventRecord, EventType, Payload};
pub use host::{MemoryRoot, Mounted, RootContainer, DEFAULT_HISTORY_LIMIT};
pub use inbox::{inbox, Inbox, InboxSender};
pub use interaction::{InteractionSource, Interactions};
pub use kind::EventKind;
pub use mux::{EventMap, EventMux, Mapper};
pub use node::{el, fragment, text, Callback, ElementNode, EventHandler, Node, Props};
pub use program::{beginner_program, Dispatcher, Program, ProgramSpec};
pub use registry::{create_event_types, EventTypes};
pub use render::render_to_string;
pub use update::{typed_update, TypedUpdate, Update, UpdateMap};

pub use rill_stream::{Stream, Subject, Subscription};

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
