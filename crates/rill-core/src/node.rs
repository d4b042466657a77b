use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::bridge::BridgeNode;
use crate::component::ComponentNode;
use crate::error::Result;
use crate::event::{EventRecord, Payload};

/// Attribute map passed to elements and components.
pub type Props = BTreeMap<String, Payload>;

/// Named interaction handler on an element (`onClick`, `onChange`, ...).
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(Payload) -> Result<()>>);

impl Callback {
    pub fn new(f: impl Fn(Payload) -> Result<()> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn noop() -> Self {
        Self::new(|_| Ok(()))
    }

    pub fn call(&self, payload: impl Into<Payload>) -> Result<()> {
        (self.0)(payload.into())
    }

    pub fn ptr_eq(&self, other: &Callback) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

/// The `onEvent` escape hatch: receives fully tagged records.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(EventRecord) -> Result<()>>);

impl EventHandler {
    pub fn new(f: impl Fn(EventRecord) -> Result<()> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, record: EventRecord) -> Result<()> {
        (self.0)(record)
    }

    pub fn ptr_eq(&self, other: &EventHandler) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EventHandler(..)")
    }
}

#[derive(Debug, Clone, Default)]
pub enum Node {
    #[default]
    Empty,
    Text(String),
    Element(ElementNode),
    Fragment(Vec<Node>),
    Bridge(BridgeNode),
    Component(ComponentNode),
}

#[derive(Debug, Clone, Default)]
pub struct ElementNode {
    pub tag: String,
    pub key: Option<String>,
    pub attrs: Props,
    pub handlers: BTreeMap<String, Callback>,
    /// Set on leaves that emit tagged records themselves
    pub on_event: Option<EventHandler>,
    pub children: Vec<Node>,
}

pub fn el(tag: impl Into<String>) -> ElementNode {
    ElementNode {
        tag: tag.into(),
        ..Default::default()
    }
}

pub fn text(content: impl Into<String>) -> Node {
    Node::Text(content.into())
}

pub fn fragment(children: impl IntoIterator<Item = Node>) -> Node {
    Node::Fragment(children.into_iter().collect())
}

impl ElementNode {
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Payload>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn on(
        mut self,
        name: impl Into<String>,
        f: impl Fn(Payload) -> Result<()> + 'static,
    ) -> Self {
        self.handlers.insert(name.into(), Callback::new(f));
        self
    }

    pub fn handler(mut self, name: impl Into<String>, callback: Callback) -> Self {
        self.handlers.insert(name.into(), callback);
        self
    }

    pub fn on_event(mut self, handler: EventHandler) -> Self {
        self.on_event = Some(handler);
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }
}

impl From<ElementNode> for Node {
    fn from(element: ElementNode) -> Self {
        Node::Element(element)
    }
}

impl From<&str> for Node {
    fn from(content: &str) -> Self {
        text(content)
    }
}

impl From<String> for Node {
    fn from(content: String) -> Self {
        Node::Text(content)
    }
}

impl Node {
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Empty => "empty",
            Node::Text(_) => "text",
            Node::Element(_) => "element",
            Node::Fragment(_) => "fragment",
            Node::Bridge(_) => "bridge",
            Node::Component(_) => "component",
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            Node::Element(e) => e.key.as_deref(),
            Node::Bridge(b) => b.inner.key.as_deref(),
            Node::Component(c) => c.key.as_deref(),
            _ => None,
        }
    }

    /// Clone-with-override of the `onEvent` prop.
    ///
    /// Only nodes that emit tagged records carry one; anything else comes
    /// back unchanged.
    pub fn with_on_event(self, handler: EventHandler) -> Self {
        match self {
            Node::Element(mut e) => {
                e.on_event = Some(handler);
                Node::Element(e)
            }
            Node::Bridge(mut b) => {
                b.on_event = Some(handler);
                Node::Bridge(b)
            }
            Node::Component(mut c) => {
                c.on_event = Some(handler);
                Node::Component(c)
            }
            other => {
                tracing::trace!(kind = other.kind(), "node emits no events, onEvent ignored");
                other
            }
        }
    }

    pub fn on_event(&self) -> Option<&EventHandler> {
        match self {
            Node::Element(e) => e.on_event.as_ref(),
            Node::Bridge(b) => b.on_event.as_ref(),
            Node::Component(c) => c.on_event.as_ref(),
            _ => None,
        }
    }
}
