//! Component factory.
//!
//! A component is a definition function run once per instance. It receives a
//! [`ComponentContext`] (fresh multiplexer, props, lifecycles) and returns a
//! [`Definition`]: a view, optionally with extra named streams to merge. The
//! instance's only public event output is [`ComponentInstance::on_event`].

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use rill_stream::{Stream, Subject};

use crate::config::RillConfig;
use crate::event::{EventRecord, EventType, Payload};
use crate::interaction::{InteractionSource, Interactions};
use crate::mux::EventMux;
use crate::node::{EventHandler, Node, Props};

/// What a definition function returns.
#[derive(Debug, Clone)]
pub enum Definition {
    View(Node),
    WithEvents {
        view: Node,
        events: Vec<(EventType, Stream<Payload>)>,
    },
}

impl Definition {
    pub fn with_events<I, N>(view: impl Into<Node>, events: I) -> Self
    where
        I: IntoIterator<Item = (N, Stream<Payload>)>,
        N: Into<EventType>,
    {
        Definition::WithEvents {
            view: view.into(),
            events: events.into_iter().map(|(ty, s)| (ty.into(), s)).collect(),
        }
    }

    pub fn into_parts(self) -> (Node, Vec<(EventType, Stream<Payload>)>) {
        match self {
            Definition::View(view) => (view, Vec::new()),
            Definition::WithEvents { view, events } => (view, events),
        }
    }
}

impl From<Node> for Definition {
    fn from(view: Node) -> Self {
        Definition::View(view)
    }
}

/// Mount and unmount notifications for one instance.
#[derive(Clone, Default)]
pub struct Lifecycles {
    mounted: Subject<()>,
    unmounted: Subject<()>,
    is_mounted: Rc<Cell<bool>>,
}

impl Lifecycles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mounted(&self) -> Stream<()> {
        self.mounted.stream()
    }

    pub fn unmounted(&self) -> Stream<()> {
        self.unmounted.stream()
    }

    pub fn is_mounted(&self) -> bool {
        self.is_mounted.get()
    }

    pub(crate) fn notify_mounted(&self) {
        if !self.is_mounted.replace(true) {
            self.mounted.emit(());
        }
    }

    pub(crate) fn notify_unmounted(&self) {
        if self.is_mounted.replace(false) {
            self.unmounted.emit(());
        }
    }
}

impl fmt::Debug for Lifecycles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycles")
            .field("is_mounted", &self.is_mounted.get())
            .finish()
    }
}

/// Everything a definition function gets to work with.
#[derive(Debug)]
pub struct ComponentContext {
    name: String,
    mux: EventMux,
    props: Props,
    lifecycles: Lifecycles,
}

impl ComponentContext {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mux(&self) -> &EventMux {
        &self.mux
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn prop(&self, name: &str) -> Option<&Payload> {
        self.props.get(name)
    }

    pub fn lifecycles(&self) -> &Lifecycles {
        &self.lifecycles
    }
}

type InteractionsFactory = Rc<dyn Fn() -> Rc<dyn InteractionSource>>;

#[derive(Clone, Default)]
pub struct ComponentOptions {
    pub config: RillConfig,
    interactions: Option<InteractionsFactory>,
}

impl ComponentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: RillConfig) -> Self {
        self.config = config;
        self
    }

    /// Supplies the interaction provider each new instance reads from.
    pub fn with_interactions<S>(mut self, factory: impl Fn() -> S + 'static) -> Self
    where
        S: InteractionSource + 'static,
    {
        self.interactions = Some(Rc::new(move || Rc::new(factory()) as Rc<dyn InteractionSource>));
        self
    }

    fn interactions(&self) -> Rc<dyn InteractionSource> {
        match &self.interactions {
            Some(factory) => factory(),
            None => Rc::new(Interactions::new()),
        }
    }
}

impl fmt::Debug for ComponentOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentOptions")
            .field("config", &self.config)
            .field("custom_interactions", &self.interactions.is_some())
            .finish()
    }
}

type DefFn = dyn Fn(&ComponentContext) -> Definition;

struct DefInner {
    name: String,
    def_fn: Box<DefFn>,
    options: ComponentOptions,
}

/// A named component definition. Cheap to clone.
#[derive(Clone)]
pub struct ComponentDef(Rc<DefInner>);

pub fn component<D>(
    name: impl Into<String>,
    def_fn: impl Fn(&ComponentContext) -> D + 'static,
) -> ComponentDef
where
    D: Into<Definition>,
{
    component_with_options(name, def_fn, ComponentOptions::default())
}

pub fn component_with_options<D>(
    name: impl Into<String>,
    def_fn: impl Fn(&ComponentContext) -> D + 'static,
    options: ComponentOptions,
) -> ComponentDef
where
    D: Into<Definition>,
{
    ComponentDef(Rc::new(DefInner {
        name: name.into(),
        def_fn: Box::new(move |ctx: &ComponentContext| def_fn(ctx).into()),
        options,
    }))
}

impl ComponentDef {
    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn options(&self) -> &ComponentOptions {
        &self.0.options
    }

    /// Runs the definition function against a fresh multiplexer.
    pub fn instantiate(&self, props: Props) -> ComponentInstance {
        let options = &self.0.options;
        let mux = EventMux::new(self.name(), options.interactions(), &options.config.dispatch);
        let ctx = ComponentContext {
            name: self.0.name.clone(),
            mux: mux.clone(),
            props,
            lifecycles: Lifecycles::new(),
        };

        let (view, events) = (self.0.def_fn)(&ctx).into_parts();
        for (event_type, stream) in &events {
            mux.merge(event_type.clone(), stream);
        }

        tracing::debug!(
            component = %self.name(),
            merged = events.len(),
            registered = mux.registered().len(),
            "component instantiated"
        );

        ComponentInstance {
            view,
            mux,
            lifecycles: ctx.lifecycles,
        }
    }

    /// Unmounted descriptor to place in a parent's view.
    pub fn node(&self, props: Props) -> ComponentNode {
        ComponentNode {
            def: self.clone(),
            key: None,
            props,
            on_event: None,
        }
    }

    pub fn element(&self, props: Props) -> Node {
        Node::Component(self.node(props))
    }
}

impl fmt::Debug for ComponentDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDef").field("name", &self.name()).finish()
    }
}

/// A component placed in a tree but not yet instantiated.
#[derive(Debug, Clone)]
pub struct ComponentNode {
    pub def: ComponentDef,
    pub key: Option<String>,
    pub props: Props,
    pub on_event: Option<EventHandler>,
}

impl ComponentNode {
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn prop(mut self, name: impl Into<String>, value: impl Into<Payload>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }
}

impl From<ComponentNode> for Node {
    fn from(node: ComponentNode) -> Self {
        Node::Component(node)
    }
}

/// A live component. Dropping it releases every subscription it owns.
#[derive(Debug)]
pub struct ComponentInstance {
    view: Node,
    mux: EventMux,
    lifecycles: Lifecycles,
}

impl ComponentInstance {
    pub fn name(&self) -> &str {
        self.mux.component()
    }

    pub fn view(&self) -> &Node {
        &self.view
    }

    pub fn mux(&self) -> &EventMux {
        &self.mux
    }

    /// The instance's single outbound stream.
    pub fn on_event(&self) -> Stream<EventRecord> {
        self.mux.events()
    }

    pub fn lifecycles(&self) -> &Lifecycles {
        &self.lifecycles
    }

    pub fn mount(&self) {
        self.lifecycles.notify_mounted();
    }

    pub fn unmount(&self) {
        if self.mux.is_disposed() {
            return;
        }
        self.lifecycles.notify_unmounted();
        self.mux.dispose();
        tracing::debug!(component = %self.name(), "component torn down");
    }
}

impl Drop for ComponentInstance {
    fn drop(&mut self) {
        self.unmount();
    }
}
