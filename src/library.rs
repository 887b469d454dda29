//! The catalog of operation types.
//!
//! The catalog lives in the `Operations` system unit class library of the
//! exchange document. Each class is a type name carrying a Stage, Step and
//! Operation label that `set_operation_type` copies onto an operation.

use indexmap::IndexMap;
use indexmap::map::Iter;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::element::{Context, Element};
use crate::error::Result;
use crate::identity::IdRegistry;
use crate::node::{self, Node};
use crate::templates;

pub const OPERATIONS_LIB: &str = "Operations";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LibraryEntry {
    #[serde(skip)]
    pub name: String,
    #[serde(skip)]
    pub id: String,
    #[serde(rename = "Stage")]
    pub stage: Option<String>,
    #[serde(rename = "Step")]
    pub step: Option<String>,
    #[serde(rename = "Operation")]
    pub operation: Option<String>,
}

impl Element for LibraryEntry {
    const ATTRIBUTES_TAG: &'static [&'static str] = &["Stage", "Step", "Operation"];

    fn raw_template() -> Node {
        templates::library_entry()
    }
    fn field(&self, name: &str) -> Option<String> {
        match name {
            "Name" => (!self.name.is_empty()).then(|| self.name.clone()),
            "ID" => (!self.id.is_empty()).then(|| self.id.clone()),
            "Stage" => self.stage.clone(),
            "Step" => self.step.clone(),
            "Operation" => self.operation.clone(),
            _ => None,
        }
    }
    fn set_field(&mut self, name: &str, value: String) {
        match name {
            "Name" => self.name = value,
            "ID" => self.id = value,
            "Stage" => self.stage = Some(value),
            "Step" => self.step = Some(value),
            "Operation" => self.operation = Some(value),
            _ => (),
        }
    }
    fn decode(raw: &Node, cx: &mut Context<'_>) -> Result<Self> {
        Ok(Self::decode_fields(raw, cx))
    }
    fn encode(&self, cx: &mut Context<'_>) -> Result<Node> {
        Ok(self.encode_fields(cx.ids))
    }
}

/// Read-only once built; an empty catalog makes every type lookup fail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationLibrary {
    version: Option<String>,
    entries: IndexMap<String, LibraryEntry>,
}

impl OperationLibrary {
    /// Builds the catalog from a `CAEXFile` node. A missing `Operations`
    /// library yields an empty catalog.
    pub fn from_caex(caex: &Node, ids: &mut IdRegistry) -> Result<Self> {
        let mut library = Self::default();
        let Some(section) = node::find_named(node::children(caex, "SystemUnitClassLib"), OPERATIONS_LIB) else {
            debug!("document has no operation type catalog");
            return Ok(library);
        };
        library.version = node::children(section, "Version").first().and_then(node::text);

        let empty = Self::default();
        let mut cx = Context::new(ids, &empty);
        for class in node::children(section, "SystemUnitClass") {
            let entry = LibraryEntry::decode(class, &mut cx)?;
            if entry.name.is_empty() {
                debug!(id = %entry.id, "skipping unnamed operation type");
                continue;
            }
            library.entries.insert(entry.name.clone(), entry);
        }
        Ok(library)
    }

    /// The `SystemUnitClassLib` node holding the catalog.
    pub fn encode(&self, ids: &mut IdRegistry) -> Result<Node> {
        let empty = Self::default();
        let mut cx = Context::new(ids, &empty);
        let classes = self
            .entries
            .values()
            .map(|entry| entry.encode(&mut cx))
            .collect::<Result<Vec<_>>>()?;
        let mut raw = json!({ "@Name": OPERATIONS_LIB });
        if let Some(version) = &self.version {
            node::set_attr(&mut raw, "Version", json!([version]));
        }
        node::set_attr(&mut raw, "SystemUnitClass", classes);
        Ok(raw)
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
    pub fn get(&self, name: &str) -> Option<&LibraryEntry> {
        self.entries.get(name)
    }
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
    /// Entries in catalog order.
    pub fn iter(&self) -> Iter<'_, String, LibraryEntry> {
        self.entries.iter()
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
