//! Digital threads: the unit grouping operations, files and softwares.
//!
//! A thread owns the relationships between its records. In the exchange
//! form the three collections sit in fixed named containers and every
//! relationship is an interface stub pair joined by an internal link, see
//! [`crate::links`]. Decoding rebuilds the identifier lists from those links;
//! encoding throws all stubs away and derives them again from the lists.

use std::collections::HashSet;
use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

use crate::element::{Context, Element, push_unique};
use crate::error::{MamlError, Result};
use crate::file::File;
use crate::identity::{IdHasher, IdRegistry};
use crate::library::OperationLibrary;
use crate::links::{LinkResolver, Relation};
use crate::node::{self, Node};
use crate::operation::{Operation, OperationMut};
use crate::software::{Software, SoftwareMut};
use crate::templates;

pub const DEFAULT_MODULE: &str = "Requirements";

const OPERATIONS: &str = "Operations";
const FILES: &str = "Files";
const SOFTWARES: &str = "Softwares";
const MODULES: &str = "Modules";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigitalThread {
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Modules")]
    pub modules: Vec<String>,
    #[serde(rename = "Operations")]
    pub operations: Vec<Operation>,
    #[serde(rename = "Files")]
    pub files: Vec<File>,
    #[serde(rename = "Softwares")]
    pub softwares: Vec<Software>,
}

impl Default for DigitalThread {
    fn default() -> Self {
        Self {
            name: None,
            id: String::new(),
            modules: vec![DEFAULT_MODULE.to_owned()],
            operations: Vec::new(),
            files: Vec::new(),
            softwares: Vec::new(),
        }
    }
}

// records of one container inside the raw thread
fn container<'a>(raw: &'a Node, name: &str) -> &'a [Node] {
    node::children(raw, "InternalElement")
        .iter()
        .find(|ie| node::name(ie) == Some(name) && ie.get("InternalElement").is_some())
        .map(|ie| node::children(ie, "InternalElement"))
        .unwrap_or_default()
}

fn position<'a>(mut ids: impl Iterator<Item = &'a str>, id: &str) -> Result<usize> {
    ids.position(|candidate| candidate == id)
        .ok_or_else(|| MamlError::DanglingReference { id: id.to_owned() })
}

impl DigitalThread {
    /// Appends a module tag unless the thread already has it.
    pub fn add_module(&mut self, module: impl Into<String>) -> bool {
        let module = module.into();
        if self.modules.contains(&module) {
            return false;
        }
        self.modules.push(module);
        true
    }

    pub fn push_operation(&mut self, operation: Operation) -> &mut Operation {
        self.operations.push(operation);
        let last = self.operations.len() - 1;
        &mut self.operations[last]
    }
    pub fn push_file(&mut self, file: File) -> &mut File {
        self.files.push(file);
        let last = self.files.len() - 1;
        &mut self.files[last]
    }
    pub fn push_software(&mut self, software: Software) -> &mut Software {
        self.softwares.push(software);
        let last = self.softwares.len() - 1;
        &mut self.softwares[last]
    }

    pub fn operation(&self, id: &str) -> Option<&Operation> {
        self.operations.iter().find(|o| o.id == id)
    }
    pub fn file(&self, id: &str) -> Option<&File> {
        self.files.iter().find(|f| f.id == id)
    }
    pub fn software(&self, id: &str) -> Option<&Software> {
        self.softwares.iter().find(|s| s.id == id)
    }

    /// Fails on the first relationship entry naming no record of the
    /// expected kind in this thread.
    pub fn check_references(&self) -> Result<()> {
        let files = || self.files.iter().map(|f| f.id.as_str());
        let softwares = || self.softwares.iter().map(|s| s.id.as_str());
        for operation in &self.operations {
            for id in operation.input_file.iter().chain(&operation.output_file) {
                position(files(), id)?;
            }
            for id in &operation.software_used {
                position(softwares(), id)?;
            }
        }
        for software in &self.softwares {
            for id in &software.config_file {
                position(files(), id)?;
            }
        }
        Ok(())
    }

    // A raw Modules group replaces the default tags, so a thread without
    // Requirements stays without it.
    fn decode_modules(&mut self, raw: &Node) {
        let Some(group) = node::find_named(node::children(raw, "Attribute"), MODULES) else {
            return;
        };
        self.modules.clear();
        for tag in node::children(group, "Attribute") {
            if let Some(module) = node::value(tag) {
                self.add_module(module);
            }
        }
    }

    // Tags are reused by value, new ones take the lowest free Module<N> name.
    fn encode_modules(&self, raw: &mut Node) {
        let Some(groups) = node::children_mut(raw, "Attribute") else { return };
        let Some(group) = node::find_named_mut(groups, MODULES) else { return };
        let Ok(tags) = node::children_entry(group, "Attribute") else { return };
        let prototype = tags
            .first()
            .cloned()
            .unwrap_or_else(|| json!({ "@AttributeDataType": "xs:string" }));

        let mut encoded = Vec::with_capacity(self.modules.len());
        let mut fresh = Vec::new();
        for module in &self.modules {
            match tags.iter().find(|tag| node::value(tag).as_deref() == Some(module.as_str())) {
                Some(tag) => encoded.push(tag.clone()),
                None => {
                    let mut tag = prototype.clone();
                    node::set_attr(&mut tag, node::NAME, Value::Null);
                    node::set_value(&mut tag, module);
                    fresh.push(encoded.len());
                    encoded.push(tag);
                }
            }
        }
        let mut next = 1;
        for index in fresh {
            let name = loop {
                let name = format!("Module{next}");
                next += 1;
                if !encoded.iter().any(|tag| node::name(tag) == Some(name.as_str())) {
                    break name;
                }
            };
            node::set_attr(&mut encoded[index], node::NAME, name);
        }
        *tags = encoded;
    }

    /// Drops relationship entries that resolved to a record of the wrong
    /// kind, such as an input file linked to a software stub.
    fn drop_mismatched_links(&mut self) {
        let files: HashSet<String, IdHasher> = self.files.iter().map(|f| f.id.clone()).collect();
        let softwares: HashSet<String, IdHasher> = self.softwares.iter().map(|s| s.id.clone()).collect();
        for operation in &mut self.operations {
            let owner = operation.id.clone();
            for relation in Relation::OPERATION {
                let known = match relation {
                    Relation::SoftwareUsed => &softwares,
                    _ => &files,
                };
                if let Some(list) = operation.relation_mut(relation.name()) {
                    retain_known(list, known, &owner, relation);
                }
            }
        }
        for software in &mut self.softwares {
            let owner = software.id.clone();
            for relation in Relation::SOFTWARE {
                if let Some(list) = software.relation_mut(relation.name()) {
                    retain_known(list, &files, &owner, relation);
                }
            }
        }
    }
}

fn retain_known(list: &mut Vec<String>, known: &HashSet<String, IdHasher>, owner: &str, relation: Relation) {
    list.retain(|target| {
        let keep = known.contains(target);
        if !keep {
            warn!(record = owner, %relation, target = %target, "dropping link to a record of the wrong kind");
        }
        keep
    });
}

impl Element for DigitalThread {
    fn raw_template() -> Node {
        templates::digital_thread()
    }
    fn field(&self, name: &str) -> Option<String> {
        match name {
            "Name" => self.name.clone(),
            "ID" => (!self.id.is_empty()).then(|| self.id.clone()),
            _ => None,
        }
    }
    fn set_field(&mut self, name: &str, value: String) {
        match name {
            "Name" => self.name = Some(value),
            "ID" => self.id = value,
            _ => (),
        }
    }

    fn decode(raw: &Node, cx: &mut Context<'_>) -> Result<Self> {
        let mut thread = Self::decode_fields(raw, cx);
        thread.decode_modules(raw);

        let (files, softwares, operations) = (
            container(raw, FILES),
            container(raw, SOFTWARES),
            container(raw, OPERATIONS),
        );
        let links = LinkResolver::from_raw(
            files.iter().chain(softwares).chain(operations),
            node::children(raw, "InternalLink"),
        );
        let mut cx = cx.with_links(&links);
        for file in files {
            push_unique(&mut thread.files, File::decode(file, &mut cx)?, FILES);
        }
        for software in softwares {
            push_unique(&mut thread.softwares, Software::decode(software, &mut cx)?, SOFTWARES);
        }
        for operation in operations {
            push_unique(&mut thread.operations, Operation::decode(operation, &mut cx)?, OPERATIONS);
        }
        thread.drop_mismatched_links();
        Ok(thread)
    }

    fn encode(&self, cx: &mut Context<'_>) -> Result<Node> {
        let mut raw = self.encode_fields(cx.ids);
        self.encode_modules(&mut raw);

        let mut files = self.files.iter().map(|f| f.encode(cx)).collect::<Result<Vec<_>>>()?;
        let mut softwares = self.softwares.iter().map(|s| s.encode(cx)).collect::<Result<Vec<_>>>()?;
        let mut operations = self.operations.iter().map(|o| o.encode(cx)).collect::<Result<Vec<_>>>()?;

        let mut links = LinkResolver::new();
        for (operation, source) in self.operations.iter().zip(operations.iter_mut()) {
            for relation in Relation::OPERATION {
                for target_id in operation.relation(relation.name()).into_iter().flatten() {
                    let target = match relation {
                        Relation::SoftwareUsed => {
                            &mut softwares[position(self.softwares.iter().map(|s| s.id.as_str()), target_id)?]
                        }
                        _ => &mut files[position(self.files.iter().map(|f| f.id.as_str()), target_id)?],
                    };
                    links.create_link(source, target, relation, cx.ids)?;
                }
            }
        }
        for (software, source) in self.softwares.iter().zip(softwares.iter_mut()) {
            for relation in Relation::SOFTWARE {
                for target_id in software.relation(relation.name()).into_iter().flatten() {
                    let target = &mut files[position(self.files.iter().map(|f| f.id.as_str()), target_id)?];
                    links.create_link(source, target, relation, cx.ids)?;
                }
            }
        }

        let containers = node::children_entry(&mut raw, "InternalElement")?;
        for (name, records) in [(OPERATIONS, operations), (FILES, files), (SOFTWARES, softwares)] {
            let holder = node::find_named_mut(containers, name)
                .ok_or_else(|| MamlError::Malformed(format!("thread template lacks the {name} container")))?;
            node::children_entry(holder, "InternalElement")?.extend(records);
        }
        node::set_attr(&mut raw, "InternalLink", links.to_raw());
        Ok(raw)
    }
}

// ------------- ThreadMut -------------
/// Editing handle for a thread of a document. New records get their
/// identifiers from the document's registry.
pub struct ThreadMut<'a> {
    pub(crate) thread: &'a mut DigitalThread,
    pub(crate) ids: &'a mut IdRegistry,
    pub(crate) library: &'a OperationLibrary,
}

impl ThreadMut<'_> {
    pub fn new_operation(&mut self) -> OperationMut<'_> {
        let operation = Operation::new(self.ids);
        self.thread.push_operation(operation);
        let index = self.thread.operations.len() - 1;
        OperationMut {
            thread: &mut *self.thread,
            index,
            ids: &mut *self.ids,
            library: self.library,
        }
    }
    pub fn new_file(&mut self) -> &mut File {
        let file = File::new(self.ids);
        self.thread.push_file(file)
    }
    pub fn new_software(&mut self) -> SoftwareMut<'_> {
        let software = Software::new(self.ids);
        self.thread.push_software(software);
        let index = self.thread.softwares.len() - 1;
        SoftwareMut {
            thread: &mut *self.thread,
            index,
            ids: &mut *self.ids,
        }
    }
    pub fn operation_mut(&mut self, index: usize) -> Option<OperationMut<'_>> {
        (index < self.thread.operations.len()).then(|| OperationMut {
            thread: &mut *self.thread,
            index,
            ids: &mut *self.ids,
            library: self.library,
        })
    }
    pub fn software_mut(&mut self, index: usize) -> Option<SoftwareMut<'_>> {
        (index < self.thread.softwares.len()).then(|| SoftwareMut {
            thread: &mut *self.thread,
            index,
            ids: &mut *self.ids,
        })
    }
}

impl Deref for ThreadMut<'_> {
    type Target = DigitalThread;
    fn deref(&self) -> &DigitalThread {
        &*self.thread
    }
}
impl DerefMut for ThreadMut<'_> {
    fn deref_mut(&mut self) -> &mut DigitalThread {
        &mut *self.thread
    }
}
