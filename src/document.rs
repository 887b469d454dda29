//! The root record.
//!
//! A [`Document`] owns the digital threads, the operation type catalog and
//! the identifier registry every nested record draws from. It converts
//! between the raw exchange tree ([`Document::decode`], [`Document::encode`])
//! and the simplified model ([`Document::from_value`], [`Document::to_value`]).

use std::collections::HashSet;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::element::{Context, Element, push_unique};
use crate::error::{MamlError, Result};
use crate::file::File;
use crate::identity::{IdHasher, IdRegistry};
use crate::library::{OPERATIONS_LIB, OperationLibrary};
use crate::node::{self, Node};
use crate::operation::Operation;
use crate::software::Software;
use crate::templates::{self, DIGITAL_THREAD_PATH};
use crate::thread::{DigitalThread, ThreadMut};

/// A record found by [`Document::find_by_id`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Record<'a> {
    Thread(&'a DigitalThread),
    Operation(&'a Operation),
    File(&'a File),
    Software(&'a Software),
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    #[serde(rename = "FileName")]
    pub file_name: Option<String>,
    #[serde(rename = "Digital Threads")]
    pub digital_threads: Vec<DigitalThread>,
    #[serde(skip)]
    library: OperationLibrary,
    #[serde(skip)]
    ids: IdRegistry,
}

fn caex(raw: &Node) -> Result<&Node> {
    node::children(raw, "CAEXFile")
        .first()
        .ok_or_else(|| MamlError::Malformed("missing CAEXFile root".into()))
}

fn caex_mut(raw: &mut Node) -> Result<&mut Node> {
    node::children_mut(raw, "CAEXFile")
        .and_then(|files| files.first_mut())
        .ok_or_else(|| MamlError::Malformed("missing CAEXFile root".into()))
}

fn default_library(ids: &mut IdRegistry) -> Result<OperationLibrary> {
    OperationLibrary::from_caex(caex(&templates::document())?, ids)
}

// Every record identifier slot of the simplified model.
fn id_slots(threads: &mut [DigitalThread]) -> Vec<&mut String> {
    let mut slots = Vec::new();
    for thread in threads {
        slots.push(&mut thread.id);
        slots.extend(thread.operations.iter_mut().map(|o| &mut o.id));
        slots.extend(thread.files.iter_mut().map(|f| &mut f.id));
        slots.extend(thread.softwares.iter_mut().map(|s| &mut s.id));
    }
    slots
}

impl Document {
    /// An empty document with the default operation type catalog.
    pub fn new(mut ids: IdRegistry) -> Result<Self> {
        let library = default_library(&mut ids)?;
        Ok(Self {
            file_name: None,
            digital_threads: Vec::new(),
            library,
            ids,
        })
    }

    /// Decodes a raw exchange tree. The catalog is taken from the tree
    /// itself, a tree without one gives a document whose type lookups fail.
    pub fn decode(mut raw: Node, mut ids: IdRegistry) -> Result<Self> {
        node::retain_ids(&raw, &mut ids);
        let repaired = node::fix_null_ids(&mut raw, &mut ids);
        if repaired > 0 {
            debug!(repaired, "replaced null identifiers");
        }
        node::unique_ids(&raw, node::ID)?;

        let root = caex(&raw)?;
        let file_name = node::attr_text(root, "@FileName");
        let library = OperationLibrary::from_caex(root, &mut ids)?;

        let mut digital_threads = Vec::new();
        if let Some(hierarchy) = node::children(root, "InstanceHierarchy").first() {
            let mut cx = Context::new(&mut ids, &library);
            for element in node::children(hierarchy, "InternalElement") {
                if node::attr(element, "@RefBaseSystemUnitPath") != Some(DIGITAL_THREAD_PATH) {
                    continue;
                }
                push_unique(&mut digital_threads, DigitalThread::decode(element, &mut cx)?, "DigitalThread");
            }
        }
        info!(threads = digital_threads.len(), types = library.len(), "decoded document");
        Ok(Self {
            file_name,
            digital_threads,
            library,
            ids,
        })
    }

    /// Encodes the document into a fresh raw exchange tree. Every interface
    /// stub and internal link is derived anew from the relationship lists.
    pub fn encode(&mut self) -> Result<Node> {
        let mut raw = templates::document();
        let root = caex_mut(&mut raw)?;
        node::set_attr(root, "@FileName", self.file_name.clone());

        let mut cx = Context::new(&mut self.ids, &self.library);
        let threads = self
            .digital_threads
            .iter()
            .map(|thread| thread.encode(&mut cx))
            .collect::<Result<Vec<_>>>()?;
        let hierarchy = node::children_entry(root, "InstanceHierarchy")?
            .first_mut()
            .ok_or_else(|| MamlError::Malformed("document template lacks an instance hierarchy".into()))?;
        node::children_entry(hierarchy, "InternalElement")?.extend(threads);

        if !self.library.is_empty() || self.library.version().is_some() {
            let section = self.library.encode(&mut self.ids)?;
            let libraries = node::children_entry(root, "SystemUnitClassLib")?;
            match node::find_named_mut(libraries, OPERATIONS_LIB) {
                Some(existing) => *existing = section,
                None => libraries.push(section),
            }
        }

        if !self.ids.is_replicable() {
            if let Some(info) = node::children_mut(root, "SourceDocumentInformation").and_then(|i| i.first_mut()) {
                let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
                node::set_attr(info, "@LastWritingDateTime", now);
            }
        }

        let repaired = node::fix_null_ids(&mut raw, &mut self.ids);
        if repaired > 0 {
            debug!(repaired, "replaced null identifiers");
        }
        Ok(raw)
    }

    /// Builds a document from the simplified model.
    ///
    /// Missing record identifiers are generated, an identifier used by two
    /// records is an [`MamlError::IdentifierCollision`] and a relationship
    /// naming no record of the right kind in its thread is a
    /// [`MamlError::DanglingReference`].
    pub fn from_value(value: Value, mut ids: IdRegistry) -> Result<Self> {
        let mut document: Document = serde_json::from_value(value)?;

        let mut seen: HashSet<String, IdHasher> = HashSet::default();
        let mut missing = Vec::new();
        for slot in id_slots(&mut document.digital_threads) {
            if slot.is_empty() {
                missing.push(slot);
            } else if !seen.insert(slot.clone()) {
                return Err(MamlError::IdentifierCollision { id: slot.clone() });
            } else {
                ids.retain(slot);
            }
        }
        for slot in missing {
            *slot = ids.generate();
        }
        document.library = default_library(&mut ids)?;
        for thread in &document.digital_threads {
            thread.check_references()?;
        }
        document.ids = ids;
        Ok(document)
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn new_digital_thread(&mut self) -> ThreadMut<'_> {
        let thread = DigitalThread::new(&mut self.ids);
        self.digital_threads.push(thread);
        let index = self.digital_threads.len() - 1;
        ThreadMut {
            thread: &mut self.digital_threads[index],
            ids: &mut self.ids,
            library: &self.library,
        }
    }

    pub fn thread_mut(&mut self, index: usize) -> Option<ThreadMut<'_>> {
        let ids = &mut self.ids;
        let library = &self.library;
        self.digital_threads
            .get_mut(index)
            .map(|thread| ThreadMut { thread, ids, library })
    }

    /// The record carrying `id`. Structurally identical records sharing an
    /// identifier are tolerated, different ones are a collision.
    pub fn find_by_id(&self, id: &str) -> Result<Option<Record<'_>>> {
        let mut found: Vec<Record<'_>> = Vec::new();
        for thread in &self.digital_threads {
            if thread.id == id {
                found.push(Record::Thread(thread));
            }
            found.extend(thread.operations.iter().filter(|o| o.id == id).map(Record::Operation));
            found.extend(thread.files.iter().filter(|f| f.id == id).map(Record::File));
            found.extend(thread.softwares.iter().filter(|s| s.id == id).map(Record::Software));
        }
        if found.windows(2).any(|pair| pair[0] != pair[1]) {
            return Err(MamlError::IdentifierCollision { id: id.to_owned() });
        }
        Ok(found.first().copied())
    }

    /// blake3 digest of the simplified model, stable across export and
    /// re-import of the same content.
    pub fn fingerprint(&self) -> Result<String> {
        let snapshot = serde_json::to_vec(&self.to_value()?)?;
        Ok(blake3::hash(&snapshot).to_hex().to_string())
    }

    pub fn library(&self) -> &OperationLibrary {
        &self.library
    }
    pub fn ids(&self) -> &IdRegistry {
        &self.ids
    }
}
