use std::ops::{Deref, DerefMut};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::element::{Context, Element};
use crate::error::Result;
use crate::file::File;
use crate::identity::IdRegistry;
use crate::library::OperationLibrary;
use crate::node::{self, Node};
use crate::software::Software;
use crate::templates;
use crate::thread::DigitalThread;

pub const OPS_LIB_KEY: &str = "@RefBaseSystemUnitPath";
pub const OPS_LIB_PREFIX: &str = "Operations/";

lazy_static! {
    static ref OPERATION_TYPE: Regex = Regex::new(r"^Operations/(?P<name>.+)$").unwrap();
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    #[serde(rename = "Username")]
    pub username: Option<String>,
    #[serde(rename = "UserID")]
    pub user_id: Option<String>,
    #[serde(rename = "Timestamp")]
    pub timestamp: Option<String>,
}

impl UserInfo {
    const NAME: &'static str = "UserInfo";

    fn set(&mut self, key: &str, value: String) {
        // older files carry misspelled keys
        match key {
            "Username" | "User Name" => self.username = Some(value),
            "UserID" => self.user_id = Some(value),
            "Timestamp" | "Timestmp" => self.timestamp = Some(value),
            _ => (),
        }
    }
    fn get(&self, key: &str) -> Option<&str> {
        match key {
            "Username" => self.username.as_deref(),
            "UserID" => self.user_id.as_deref(),
            "Timestamp" => self.timestamp.as_deref(),
            _ => None,
        }
    }
}

/// A manufacturing step of a digital thread.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Operation {
    pub name: Option<String>,
    #[serde(rename = "ID")]
    pub id: String,
    pub module: Option<String>,
    pub success: Option<bool>,
    // classification from the operation type catalog
    pub r#type: Option<String>,
    pub stage: Option<String>,
    pub step: Option<String>,
    pub operation: Option<String>,
    pub input_file: Vec<String>,
    pub output_file: Vec<String>,
    pub software_used: Vec<String>,
    pub user_info: UserInfo,
    pub comments: Option<String>,
}

/// Classification referenced by a raw operation node, if any.
pub fn operation_type_of(raw: &Node) -> Option<String> {
    let path = node::attr(raw, OPS_LIB_KEY)?;
    OPERATION_TYPE
        .captures(path)
        .and_then(|c| c.name("name"))
        .map(|m| m.as_str().to_owned())
}

impl Operation {
    pub fn operation_type(&self) -> Option<&str> {
        self.r#type.as_deref()
    }

    /// Classifies the operation with an entry of the catalog. Returns false,
    /// leaving the operation untouched, when `name` is not in the catalog.
    /// Unless `overwrite_attributes` is false, Stage, Step and Operation are
    /// copied from the catalog entry.
    pub fn set_operation_type(
        &mut self,
        name: &str,
        library: &OperationLibrary,
        overwrite_attributes: bool,
    ) -> bool {
        let Some(entry) = library.get(name) else {
            return false;
        };
        self.r#type = Some(name.to_owned());
        if overwrite_attributes {
            self.stage = entry.stage.clone();
            self.step = entry.step.clone();
            self.operation = entry.operation.clone();
        }
        true
    }

    pub fn relation(&self, name: &str) -> Option<&Vec<String>> {
        match name {
            "InputFile" => Some(&self.input_file),
            "OutputFile" => Some(&self.output_file),
            "SoftwareUsed" => Some(&self.software_used),
            _ => None,
        }
    }

    fn decode_user_info(&mut self, raw: &Node) {
        let Some(info) = node::find_named(node::children(raw, "InternalElement"), UserInfo::NAME) else {
            return;
        };
        for attr in node::children(info, "Attribute") {
            if let (Some(key), Some(value)) = (node::name(attr), node::value(attr)) {
                self.user_info.set(key, value);
            }
        }
    }

    fn encode_user_info(&self, raw: &mut Node, ids: &mut IdRegistry) {
        let Some(elements) = node::children_mut(raw, "InternalElement") else { return };
        let Some(info) = node::find_named_mut(elements, UserInfo::NAME) else { return };
        if node::id(info).is_none() {
            node::set_attr(info, node::ID, ids.generate());
        }
        if let Some(attrs) = node::children_mut(info, "Attribute") {
            for attr in attrs.iter_mut() {
                let value = node::name(attr).and_then(|key| self.user_info.get(key)).map(str::to_owned);
                if let Some(value) = value {
                    node::set_value(attr, &value);
                }
            }
        }
    }
}

impl Element for Operation {
    const ATTRIBUTES_TAG: &'static [&'static str] =
        &["Module", "Success", "Stage", "Step", "Operation", "Comments"];

    fn raw_template() -> Node {
        templates::operation()
    }
    fn field(&self, name: &str) -> Option<String> {
        match name {
            "Name" => self.name.clone(),
            "ID" => (!self.id.is_empty()).then(|| self.id.clone()),
            "Module" => self.module.clone(),
            "Success" => self.success.map(|s| s.to_string()),
            "Type" => self.r#type.clone(),
            "Stage" => self.stage.clone(),
            "Step" => self.step.clone(),
            "Operation" => self.operation.clone(),
            "Comments" => self.comments.clone(),
            _ => None,
        }
    }
    fn set_field(&mut self, name: &str, value: String) {
        match name {
            "Name" => self.name = Some(value),
            "ID" => self.id = value,
            "Module" => self.module = Some(value),
            "Success" => match value.trim().to_ascii_lowercase().as_str() {
                "true" => self.success = Some(true),
                "false" => self.success = Some(false),
                _ => warn!(operation = %self.id, value = %value, "ignoring success flag that is not a boolean"),
            },
            "Type" => self.r#type = Some(value),
            "Stage" => self.stage = Some(value),
            "Step" => self.step = Some(value),
            "Operation" => self.operation = Some(value),
            "Comments" => self.comments = Some(value),
            _ => (),
        }
    }
    fn relation_mut(&mut self, name: &str) -> Option<&mut Vec<String>> {
        match name {
            "InputFile" => Some(&mut self.input_file),
            "OutputFile" => Some(&mut self.output_file),
            "SoftwareUsed" => Some(&mut self.software_used),
            _ => None,
        }
    }

    fn decode(raw: &Node, cx: &mut Context<'_>) -> Result<Self> {
        let mut operation = Self::decode_fields(raw, cx);
        operation.r#type = operation_type_of(raw);
        operation.decode_user_info(raw);
        Ok(operation)
    }

    fn encode(&self, cx: &mut Context<'_>) -> Result<Node> {
        let mut raw = self.encode_fields(cx.ids);
        if let Some(name) = self.operation_type() {
            if !cx.library.contains(name) {
                warn!(operation = %self.id, kind = name, "operation type is not in the catalog");
            }
            node::set_attr(&mut raw, OPS_LIB_KEY, format!("{OPS_LIB_PREFIX}{name}"));
        }
        self.encode_user_info(&mut raw, cx.ids);
        Ok(raw)
    }
}

// ------------- OperationMut -------------
/// Editing handle for an operation that can also add the records it refers
/// to, keeping the thread's collections and the registry in step.
pub struct OperationMut<'a> {
    pub(crate) thread: &'a mut DigitalThread,
    pub(crate) index: usize,
    pub(crate) ids: &'a mut IdRegistry,
    pub(crate) library: &'a OperationLibrary,
}

impl<'a> OperationMut<'a> {
    pub fn new_input_file(&mut self) -> &mut File {
        let file = File::new(self.ids);
        self.thread.operations[self.index].input_file.push(file.id.clone());
        self.thread.push_file(file)
    }
    pub fn new_output_file(&mut self) -> &mut File {
        let file = File::new(self.ids);
        self.thread.operations[self.index].output_file.push(file.id.clone());
        self.thread.push_file(file)
    }
    pub fn new_software_used(&mut self) -> &mut Software {
        let software = Software::new(self.ids);
        self.thread.operations[self.index].software_used.push(software.id.clone());
        self.thread.push_software(software)
    }
    pub fn operation_types_available(&self) -> &OperationLibrary {
        self.library
    }
    pub fn set_operation_type(&mut self, name: &str) -> bool {
        let library = self.library;
        self.thread.operations[self.index].set_operation_type(name, library, true)
    }
}

impl Deref for OperationMut<'_> {
    type Target = Operation;
    fn deref(&self) -> &Operation {
        &self.thread.operations[self.index]
    }
}
impl DerefMut for OperationMut<'_> {
    fn deref_mut(&mut self) -> &mut Operation {
        &mut self.thread.operations[self.index]
    }
}
