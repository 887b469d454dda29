//! The decode/encode contract shared by every record type.
//!
//! A record is decoded from its raw subtree in three passes over a fresh
//! default value:
//! 1. the `@`-attributes named in [`Element::ATTRIBUTES_XML`] are copied,
//! 2. the first `Value` of every attribute tag named in
//!    [`Element::ATTRIBUTES_TAG`] is copied,
//! 3. every external interface is handed to the thread's [`LinkResolver`] and,
//!    when it resolves, the partner record's identifier is appended to the
//!    relationship list named like the interface.
//!
//! Encoding mirrors this on a fresh copy of [`Element::raw_template`] and then
//! gives every placeholder interface or nested element a fresh identifier.
//! Missing sections are never an error, they leave defaults in place.

use tracing::debug;

use crate::error::Result;
use crate::identity::IdRegistry;
use crate::library::OperationLibrary;
use crate::links::LinkResolver;
use crate::node::{self, Node};

/// Everything a record needs from its surroundings while being decoded or
/// encoded: the document's identifier registry, the operation type catalog
/// and, inside a digital thread, the thread's link resolver.
pub struct Context<'a> {
    pub ids: &'a mut IdRegistry,
    pub library: &'a OperationLibrary,
    pub links: Option<&'a LinkResolver>,
}

impl<'a> Context<'a> {
    pub fn new(ids: &'a mut IdRegistry, library: &'a OperationLibrary) -> Self {
        Self {
            ids,
            library,
            links: None,
        }
    }
    /// Reborrows the context with a different link resolver in scope.
    pub fn with_links<'b>(&'b mut self, links: &'b LinkResolver) -> Context<'b> {
        Context {
            ids: &mut *self.ids,
            library: self.library,
            links: Some(links),
        }
    }
}

/// Appends a decoded record unless `records` already holds one with its
/// identifier. Repeated nodes come from copied fragments of a document.
pub(crate) fn push_unique<T: Element>(records: &mut Vec<T>, record: T, kind: &str) {
    let id = record.field("ID");
    if records.iter().any(|known| known.field("ID") == id) {
        debug!(kind, id = id.as_deref().unwrap_or_default(), "skipping repeated record");
        return;
    }
    records.push(record);
}

pub trait Element: Sized + Default {
    /// `@`-attributes copied verbatim between record and raw node.
    const ATTRIBUTES_XML: &'static [&'static str] = &["Name", "ID"];
    /// Attribute tags whose first `Value` maps onto a record field.
    const ATTRIBUTES_TAG: &'static [&'static str] = &[];

    fn raw_template() -> Node;
    fn field(&self, name: &str) -> Option<String>;
    fn set_field(&mut self, name: &str, value: String);
    /// Relationship list named like an external interface, if the record has one.
    fn relation_mut(&mut self, _name: &str) -> Option<&mut Vec<String>> {
        None
    }

    fn decode(raw: &Node, cx: &mut Context<'_>) -> Result<Self>;
    fn encode(&self, cx: &mut Context<'_>) -> Result<Node>;

    /// Default record holding a freshly minted identifier.
    fn new(ids: &mut IdRegistry) -> Self {
        let mut element = Self::default();
        if Self::ATTRIBUTES_XML.contains(&"ID") {
            element.set_field("ID", ids.generate());
        }
        element
    }

    /// Runs the three shared decode passes on a default record.
    fn decode_fields(raw: &Node, cx: &mut Context<'_>) -> Self {
        let mut element = Self::default();

        for attr in Self::ATTRIBUTES_XML {
            if let Some(value) = node::attr_text(raw, &format!("@{attr}")) {
                element.set_field(attr, value);
            }
        }
        if Self::ATTRIBUTES_XML.contains(&"ID") && element.field("ID").is_none() {
            element.set_field("ID", cx.ids.generate());
        }

        for tag in node::children(raw, "Attribute") {
            let Some(name) = node::name(tag) else { continue };
            if !Self::ATTRIBUTES_TAG.contains(&name) {
                continue;
            }
            if let Some(value) = node::value(tag) {
                element.set_field(name, value);
            }
        }

        if let Some(links) = cx.links {
            for ei in node::children(raw, "ExternalInterface") {
                let (Some(stub), Some(name)) = (node::id(ei), node::name(ei)) else {
                    continue;
                };
                let Some(target) = links.resolve(stub) else {
                    debug!(stub, name, "external interface has no linked partner");
                    continue;
                };
                if let Some(relation) = element.relation_mut(name) {
                    relation.push(target.to_owned());
                }
            }
        }
        element
    }

    /// Fills a fresh raw template from the record.
    fn encode_fields(&self, ids: &mut IdRegistry) -> Node {
        let mut raw = Self::raw_template();

        for attr in Self::ATTRIBUTES_XML {
            if let Some(value) = self.field(attr) {
                node::set_attr(&mut raw, &format!("@{attr}"), value);
            }
        }

        if let Some(tags) = node::children_mut(&mut raw, "Attribute") {
            for tag in tags.iter_mut() {
                let Some(name) = node::name(tag).map(str::to_owned) else { continue };
                if !Self::ATTRIBUTES_TAG.contains(&name.as_str()) {
                    continue;
                }
                if let Some(value) = self.field(&name) {
                    node::set_value(tag, &value);
                }
            }
        }

        for kind in ["ExternalInterface", "InternalElement"] {
            if let Some(nodes) = node::children_mut(&mut raw, kind) {
                for child in nodes.iter_mut() {
                    let placeholder = match child.get(node::ID) {
                        Some(id) => node::text(id).is_none_or(|s| s.eq_ignore_ascii_case("none")),
                        None => false,
                    };
                    if placeholder {
                        node::set_attr(child, node::ID, ids.generate());
                    }
                }
            }
        }
        raw
    }
}
