//! In-memory host for node trees.
//!
//! [`Mounted`] turns a view into a live tree: bridges become plain elements
//! with their callbacks installed, component descriptors are instantiated and
//! their outbound streams wired to the descriptor's `onEvent`. [`MemoryRoot`]
//! is a root container that replaces its tree on every mount.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use rill_stream::Subscription;

use crate::component::{ComponentInstance, ComponentNode, Lifecycles};
use crate::error::{Result, RillError};
use crate::event::{EventRecord, Payload};
use crate::node::{Callback, ElementNode, Node};
use crate::render::render_to_string;

/// Anything a program can render into. Each mount replaces the previous contents.
pub trait RootContainer {
    fn mount(&self, node: Node) -> Result<()>;
}

struct LiveInstance {
    instance: ComponentInstance,
    wiring: Option<Subscription>,
}

/// A materialised tree and the component instances it owns.
pub struct Mounted {
    tree: Node,
    // Children precede their parents.
    instances: Vec<LiveInstance>,
}

impl Mounted {
    /// Builds the live tree without firing mount lifecycles.
    pub fn new(node: Node) -> Self {
        let mut instances = Vec::new();
        let tree = materialize(node, &mut instances);
        Self { tree, instances }
    }

    /// Builds the live tree and notifies every instance that it is mounted.
    pub fn mount(node: Node) -> Self {
        let mounted = Self::new(node);
        for lifecycles in mounted.lifecycles() {
            lifecycles.notify_mounted();
        }
        mounted
    }

    pub fn tree(&self) -> &Node {
        &self.tree
    }

    /// Lifecycle handles of every instance, children first.
    pub fn lifecycles(&self) -> Vec<Lifecycles> {
        self.instances
            .iter()
            .map(|live| live.instance.lifecycles().clone())
            .collect()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn instance(&self, name: &str) -> Option<&ComponentInstance> {
        self.instances
            .iter()
            .map(|live| &live.instance)
            .find(|instance| instance.name() == name)
    }

    pub fn find(&self, key: &str) -> Option<&ElementNode> {
        find_element(&self.tree, key)
    }

    pub fn callback(&self, key: &str, handler: &str) -> Option<Callback> {
        self.find(key).and_then(|e| e.handlers.get(handler).cloned())
    }

    pub fn invoke(&self, key: &str, handler: &str, payload: impl Into<Payload>) -> Result<()> {
        let callback = self
            .callback(key, handler)
            .ok_or_else(|| handler_not_found(key, handler))?;
        callback.call(payload)
    }

    /// Hands `record` to the `onEvent` of the element keyed `key`.
    pub fn emit(&self, key: &str, record: EventRecord) -> Result<()> {
        let handler = self
            .find(key)
            .and_then(|e| e.on_event.clone())
            .ok_or_else(|| handler_not_found(key, "onEvent"))?;
        handler.call(record)
    }

    pub fn render(&self) -> String {
        render_to_string(&self.tree)
    }
}

impl Drop for Mounted {
    // Parents first, releasing each instance's wiring before its subscriptions.
    fn drop(&mut self) {
        while let Some(live) = self.instances.pop() {
            drop(live.wiring);
            live.instance.unmount();
        }
    }
}

impl fmt::Debug for Mounted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mounted")
            .field("tree", &self.render())
            .field("instances", &self.instances.len())
            .finish()
    }
}

fn handler_not_found(key: &str, handler: &str) -> RillError {
    RillError::HandlerNotFound {
        key: key.to_string(),
        handler: handler.to_string(),
    }
}

fn materialize(node: Node, instances: &mut Vec<LiveInstance>) -> Node {
    match node {
        Node::Element(mut e) => {
            e.children = materialize_all(e.children, instances);
            Node::Element(e)
        }
        Node::Fragment(children) => Node::Fragment(materialize_all(children, instances)),
        Node::Bridge(b) => {
            let mut e = b.materialize();
            e.children = materialize_all(e.children, instances);
            Node::Element(e)
        }
        Node::Component(c) => instantiate(c, instances),
        leaf @ (Node::Empty | Node::Text(_)) => leaf,
    }
}

fn materialize_all(children: Vec<Node>, instances: &mut Vec<LiveInstance>) -> Vec<Node> {
    children
        .into_iter()
        .map(|child| materialize(child, instances))
        .collect()
}

fn instantiate(node: ComponentNode, instances: &mut Vec<LiveInstance>) -> Node {
    let ComponentNode {
        def,
        key,
        props,
        on_event,
    } = node;
    let instance = def.instantiate(props);

    let wiring = match on_event {
        Some(handler) => {
            let failures = instance.mux().failures().clone();
            Some(instance.on_event().subscribe(move |record| {
                if let Err(err) = handler.call(record) {
                    failures.push(err);
                }
            }))
        }
        None => {
            tracing::trace!(component = %def.name(), ?key, "component events not consumed");
            None
        }
    };

    let view = materialize(instance.view().clone(), instances);
    instances.push(LiveInstance { instance, wiring });
    view
}

fn find_element<'a>(node: &'a Node, key: &str) -> Option<&'a ElementNode> {
    match node {
        Node::Element(e) => {
            if e.key.as_deref() == Some(key) {
                return Some(e);
            }
            e.children.iter().find_map(|child| find_element(child, key))
        }
        Node::Fragment(children) => children.iter().find_map(|child| find_element(child, key)),
        _ => None,
    }
}

/// Renders a [`MemoryRoot`] keeps by default.
pub const DEFAULT_HISTORY_LIMIT: usize = 256;

struct RootState {
    current: Option<Mounted>,
    history: VecDeque<String>,
    history_limit: usize,
    mounts: usize,
}

impl RootState {
    fn record(&mut self, rendered: String) {
        self.mounts += 1;
        if self.history_limit == 0 {
            return;
        }
        while self.history.len() >= self.history_limit {
            self.history.pop_front();
        }
        self.history.push_back(rendered);
    }
}

/// Cloneable in-memory root container for tests and debugging.
///
/// Keeps the most recent renders, up to the history limit, and a count of
/// every mount.
#[derive(Clone)]
pub struct MemoryRoot {
    state: Rc<RefCell<RootState>>,
}

impl Default for MemoryRoot {
    fn default() -> Self {
        Self::with_history_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl MemoryRoot {
    pub fn new() -> Self {
        Self::default()
    }

    /// A root that keeps at most `limit` renders. Zero keeps none.
    pub fn with_history_limit(limit: usize) -> Self {
        Self {
            state: Rc::new(RefCell::new(RootState {
                current: None,
                history: VecDeque::new(),
                history_limit: limit,
                mounts: 0,
            })),
        }
    }

    /// Retained renders, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.state.borrow().history.iter().cloned().collect()
    }

    pub fn last_render(&self) -> Option<String> {
        self.state.borrow().history.back().cloned()
    }

    /// Mounts since creation, including those dropped from the history.
    pub fn mount_count(&self) -> usize {
        self.state.borrow().mounts
    }

    pub fn is_mounted(&self) -> bool {
        self.state.borrow().current.is_some()
    }

    /// Calls a mounted callback without holding the tree borrowed.
    pub fn invoke(&self, key: &str, handler: &str, payload: impl Into<Payload>) -> Result<()> {
        let callback = self
            .state
            .borrow()
            .current
            .as_ref()
            .and_then(|tree| tree.callback(key, handler))
            .ok_or_else(|| handler_not_found(key, handler))?;
        callback.call(payload)
    }

    /// Hands `record` to a mounted element's `onEvent`.
    pub fn emit(&self, key: &str, record: EventRecord) -> Result<()> {
        let handler = self
            .state
            .borrow()
            .current
            .as_ref()
            .and_then(|tree| tree.find(key))
            .and_then(|e| e.on_event.clone())
            .ok_or_else(|| handler_not_found(key, "onEvent"))?;
        handler.call(record)
    }

    /// Reads the current tree.
    pub fn with_tree<R>(&self, f: impl FnOnce(Option<&Mounted>) -> R) -> R {
        f(self.state.borrow().current.as_ref())
    }

    pub fn unmount(&self) {
        let previous = self.state.borrow_mut().current.take();
        drop(previous);
    }
}

impl RootContainer for MemoryRoot {
    fn mount(&self, node: Node) -> Result<()> {
        let mounted = Mounted::new(node);
        let rendered = mounted.render();
        let lifecycles = mounted.lifecycles();
        tracing::trace!(render = %rendered, "mounting into memory root");

        let previous = {
            let mut state = self.state.borrow_mut();
            state.record(rendered);
            state.current.replace(mounted)
        };

        // Both of these may re-enter the root.
        drop(previous);
        for lifecycle in lifecycles {
            lifecycle.notify_mounted();
        }
        Ok(())
    }
}

impl fmt::Debug for MemoryRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("MemoryRoot")
            .field("mounted", &state.current.is_some())
            .field("renders", &state.mounts)
            .finish()
    }
}
