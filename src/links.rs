//! Link reconstruction and synthesis for one digital thread.
//!
//! In the exchange format a relationship is never stored on the record that
//! owns it. Instead both records carry an external interface stub and the
//! thread carries an internal link pairing the two stub identifiers:
//!
//! ```text
//! Operation --ExternalInterface(OutputFile, id=a)
//!                                   InternalLink(A=a, B=b)
//! File      --ExternalInterface(OutputOf,   id=b)
//! ```
//!
//! Decoding maps a stub back to the record owning the partner stub. Encoding
//! goes the other way: every entry of a relationship list becomes a fresh
//! stub pair plus a sequentially named link.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde_json::json;

use crate::error::{MamlError, Result};
use crate::identity::{IdHasher, IdRegistry};
use crate::node::{self, Node};
use crate::templates::{FILE_EXCHANGE, SOFTWARE_INTERFACE};

// ------------- Relation -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    InputFile,
    OutputFile,
    SoftwareUsed,
    ConfigFile,
}

impl Relation {
    pub const OPERATION: [Relation; 3] = [Relation::InputFile, Relation::OutputFile, Relation::SoftwareUsed];
    pub const SOFTWARE: [Relation; 1] = [Relation::ConfigFile];

    /// Interface name on the record declaring the relationship.
    pub fn name(&self) -> &'static str {
        match self {
            Relation::InputFile => "InputFile",
            Relation::OutputFile => "OutputFile",
            Relation::SoftwareUsed => "SoftwareUsed",
            Relation::ConfigFile => "ConfigFile",
        }
    }
    /// Interface name on the record being referenced.
    pub fn reciprocal(&self) -> &'static str {
        match self {
            Relation::InputFile => "InputOf",
            Relation::OutputFile => "OutputOf",
            Relation::SoftwareUsed => "Operation",
            Relation::ConfigFile => "ConfigOf",
        }
    }
    pub fn interface(&self) -> &'static str {
        match self {
            Relation::SoftwareUsed => SOFTWARE_INTERFACE,
            _ => FILE_EXCHANGE,
        }
    }
}

impl FromStr for Relation {
    type Err = MamlError;
    fn from_str(name: &str) -> Result<Self> {
        match name {
            "InputFile" => Ok(Relation::InputFile),
            "OutputFile" => Ok(Relation::OutputFile),
            "SoftwareUsed" => Ok(Relation::SoftwareUsed),
            "ConfigFile" => Ok(Relation::ConfigFile),
            _ => Err(MamlError::UnknownRelationship(name.to_owned())),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ------------- InternalLink -------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalLink {
    pub name: String,
    pub side_a: String,
    pub side_b: String,
}

impl InternalLink {
    fn from_raw(raw: &Node) -> Option<Self> {
        Some(Self {
            name: node::name(raw).unwrap_or_default().to_owned(),
            side_a: node::attr_text(raw, "@RefPartnerSideA")?,
            side_b: node::attr_text(raw, "@RefPartnerSideB")?,
        })
    }
    fn to_raw(&self) -> Node {
        json!({
            "@Name": self.name,
            "@RefPartnerSideA": self.side_a,
            "@RefPartnerSideB": self.side_b,
        })
    }
    /// The stub on the other side of `stub`, if this link touches it.
    pub fn partner(&self, stub: &str) -> Option<&str> {
        if stub == self.side_a {
            Some(&self.side_b)
        } else if stub == self.side_b {
            Some(&self.side_a)
        } else {
            None
        }
    }
}

// ------------- LinkResolver -------------
#[derive(Debug, Default)]
pub struct LinkResolver {
    // stub identifier -> identifier of the record owning the stub
    lineage: HashMap<String, String, IdHasher>,
    links: Vec<InternalLink>,
}

impl LinkResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the resolver for a decoded thread from its record nodes and
    /// its internal link table. Only file-exchange and software-interface
    /// stubs take part in relationships.
    pub fn from_raw<'a>(records: impl IntoIterator<Item = &'a Node>, links: &[Node]) -> Self {
        let mut resolver = Self::new();
        for record in records {
            let Some(owner) = node::id(record) else { continue };
            for ei in node::children(record, "ExternalInterface") {
                let supported = matches!(
                    node::attr(ei, "@RefBaseClassPath"),
                    Some(FILE_EXCHANGE) | Some(SOFTWARE_INTERFACE)
                );
                if let (true, Some(stub)) = (supported, node::id(ei)) {
                    resolver.lineage.insert(stub.to_owned(), owner.to_owned());
                }
            }
        }
        resolver.links = links.iter().filter_map(InternalLink::from_raw).collect();
        resolver
    }

    /// Identifier of the record on the other end of `stub`, `None` when the
    /// stub is not linked or its partner belongs to no known record.
    pub fn resolve(&self, stub: &str) -> Option<&str> {
        self.links
            .iter()
            .filter_map(|link| link.partner(stub))
            .find_map(|partner| self.lineage.get(partner).map(String::as_str))
    }

    /// Adds a stub pair to `source` and `target` plus the link joining them.
    pub fn create_link(
        &mut self,
        source: &mut Node,
        target: &mut Node,
        relation: Relation,
        ids: &mut IdRegistry,
    ) -> Result<()> {
        let source_id = record_id(source)?;
        let target_id = record_id(target)?;

        let source_stub = ids.generate();
        node::children_entry(source, "ExternalInterface")?.push(json!({
            "@Name": relation.name(),
            "@ID": source_stub,
            "@RefBaseClassPath": relation.interface(),
        }));
        let target_stub = ids.generate();
        node::children_entry(target, "ExternalInterface")?.push(json!({
            "@Name": relation.reciprocal(),
            "@ID": target_stub,
            "@RefBaseClassPath": relation.interface(),
        }));

        self.lineage.insert(source_stub.clone(), source_id);
        self.lineage.insert(target_stub.clone(), target_id);
        let name = format!("InternalLink{}", self.links.len() + 1);
        self.links.push(InternalLink {
            name,
            side_a: source_stub,
            side_b: target_stub,
        });
        Ok(())
    }

    pub fn links(&self) -> &[InternalLink] {
        &self.links
    }

    /// The link table in its raw form.
    pub fn to_raw(&self) -> Vec<Node> {
        self.links.iter().map(InternalLink::to_raw).collect()
    }
}

fn record_id(record: &Node) -> Result<String> {
    node::id(record)
        .map(str::to_owned)
        .ok_or_else(|| MamlError::Malformed("linked record has no identifier".into()))
}
