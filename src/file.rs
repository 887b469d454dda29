use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::element::{Context, Element};
use crate::error::Result;
use crate::node::{self, Node};
use crate::templates;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileInfo {
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "MIMEType")]
    pub mime_type: Option<String>,
    #[serde(rename = "UUID")]
    pub uuid: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Connection {
    #[serde(rename = "IP")]
    pub ip: Option<String>,
    #[serde(rename = "Port")]
    pub port: Option<String>,
    #[serde(rename = "URL")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Security {
    #[serde(rename = "Checksum")]
    pub checksum: Option<String>,
}

/// One physical part of a file, described by three fixed attribute groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubFile {
    #[serde(rename = "File")]
    pub file: FileInfo,
    #[serde(rename = "Connection")]
    pub connection: Connection,
    #[serde(rename = "Security")]
    pub security: Security,
}

impl SubFile {
    pub fn is_empty(&self) -> bool {
        *self == SubFile::default()
    }
    fn slot(&mut self, group: &str, key: &str) -> Option<&mut Option<String>> {
        match (group, key) {
            ("File", "Name") => Some(&mut self.file.name),
            ("File", "MIMEType") => Some(&mut self.file.mime_type),
            ("File", "UUID") => Some(&mut self.file.uuid),
            ("Connection", "IP") => Some(&mut self.connection.ip),
            ("Connection", "Port") => Some(&mut self.connection.port),
            ("Connection", "URL") => Some(&mut self.connection.url),
            ("Security", "Checksum") => Some(&mut self.security.checksum),
            _ => None,
        }
    }
    pub fn get(&self, group: &str, key: &str) -> Option<&str> {
        match (group, key) {
            ("File", "Name") => self.file.name.as_deref(),
            ("File", "MIMEType") => self.file.mime_type.as_deref(),
            ("File", "UUID") => self.file.uuid.as_deref(),
            ("Connection", "IP") => self.connection.ip.as_deref(),
            ("Connection", "Port") => self.connection.port.as_deref(),
            ("Connection", "URL") => self.connection.url.as_deref(),
            ("Security", "Checksum") => self.security.checksum.as_deref(),
            _ => None,
        }
    }
    /// Stores `value` under `group`/`key`, false for an unknown pair.
    pub fn set(&mut self, group: &str, key: &str, value: String) -> bool {
        match self.slot(group, key) {
            Some(slot) => {
                *slot = Some(value);
                true
            }
            None => false,
        }
    }

    fn decode(raw: &Node) -> Option<SubFile> {
        let interface = node::children(raw, "ExternalInterface").first()?;
        interface.get("Attribute")?;
        let mut subfile = SubFile::default();
        for group in node::children(interface, "Attribute") {
            let Some(group_name) = node::name(group) else { continue };
            for attr in node::children(group, "Attribute") {
                if let (Some(key), Some(value)) = (node::name(attr), node::value(attr)) {
                    subfile.set(group_name, key, value);
                }
            }
        }
        Some(subfile)
    }
}

/// A named artifact of a digital thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct File {
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Files")]
    pub files: Vec<SubFile>,
}

impl Default for File {
    fn default() -> Self {
        Self {
            name: None,
            id: String::new(),
            files: vec![SubFile::default()],
        }
    }
}

impl File {
    /// Appends an empty subfile, reusing the last one when it is still empty.
    pub fn new_sub_file(&mut self) -> &mut SubFile {
        if !self.files.last().is_some_and(SubFile::is_empty) {
            self.files.push(SubFile::default());
        }
        let last = self.files.len() - 1;
        &mut self.files[last]
    }
}

impl Element for File {
    // subfile elements are cloned from templates::sub_file on encode
    fn raw_template() -> Node {
        let mut raw = templates::file();
        if let Some(elements) = node::children_mut(&mut raw, "InternalElement") {
            elements.clear();
        }
        raw
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
        let mut file = Self::decode_fields(raw, cx);
        file.files.clear();
        for (position, subfile) in node::children(raw, "InternalElement").iter().enumerate() {
            match SubFile::decode(subfile) {
                Some(decoded) => file.files.push(decoded),
                None => warn!(file = %file.id, position, "skipping subfile without interface attributes"),
            }
        }
        Ok(file)
    }

    fn encode(&self, cx: &mut Context<'_>) -> Result<Node> {
        let mut raw = self.encode_fields(cx.ids);
        let template = templates::sub_file();
        let elements = node::children_entry(&mut raw, "InternalElement")?;
        for subfile in &self.files {
            let mut element = template.clone();
            node::set_attr(&mut element, node::ID, cx.ids.generate());
            if let Some(interfaces) = node::children_mut(&mut element, "ExternalInterface") {
                for interface in interfaces.iter_mut() {
                    node::set_attr(interface, node::ID, cx.ids.generate());
                }
                if let Some(groups) = interfaces
                    .first_mut()
                    .and_then(|ei| node::children_mut(ei, "Attribute"))
                {
                    for group in groups.iter_mut() {
                        let Some(group_name) = node::name(group).map(str::to_owned) else { continue };
                        let Some(attrs) = node::children_mut(group, "Attribute") else { continue };
                        for attr in attrs.iter_mut() {
                            let value = node::name(attr)
                                .and_then(|key| subfile.get(&group_name, key))
                                .map(str::to_owned);
                            if let Some(value) = value {
                                node::set_value(attr, &value);
                            }
                        }
                    }
                }
            }
            elements.push(element);
        }
        Ok(raw)
    }
}
