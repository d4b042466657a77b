use std::fmt::Write;

use crate::node::{ElementNode, Node};

/// Deterministic text rendering of a node tree.
///
/// Elements render as `<tag key="k" attr=json @handler @event>children</tag>`,
/// unmounted components as `<Name prop=json/>`.
pub fn render_to_string(node: &Node) -> String {
    let mut out = String::new();
    render_into(node, &mut out);
    out
}

fn render_into(node: &Node, out: &mut String) {
    match node {
        Node::Empty => {}
        Node::Text(content) => out.push_str(content),
        Node::Element(e) => render_element(e, out),
        Node::Fragment(children) => {
            for child in children {
                render_into(child, out);
            }
        }
        Node::Bridge(b) => render_element(&b.materialize(), out),
        Node::Component(c) => {
            let _ = write!(out, "<{}", c.def.name());
            if let Some(key) = &c.key {
                let _ = write!(out, " key=\"{key}\"");
            }
            for (name, value) in &c.props {
                let _ = write!(out, " {name}={value}");
            }
            if c.on_event.is_some() {
                out.push_str(" @event");
            }
            out.push_str("/>");
        }
    }
}

fn render_element(e: &ElementNode, out: &mut String) {
    let _ = write!(out, "<{}", e.tag);
    if let Some(key) = &e.key {
        let _ = write!(out, " key=\"{key}\"");
    }
    for (name, value) in &e.attrs {
        let _ = write!(out, " {name}={value}");
    }
    for name in e.handlers.keys() {
        let _ = write!(out, " @{name}");
    }
    if e.on_event.is_some() {
        out.push_str(" @event");
    }
    out.push('>');
    for child in &e.children {
        render_into(child, out);
    }
    let _ = write!(out, "</{}>", e.tag);
}
