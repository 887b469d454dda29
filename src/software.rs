use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::element::{Context, Element};
use crate::error::Result;
use crate::file::File;
use crate::identity::IdRegistry;
use crate::node::Node;
use crate::templates;
use crate::thread::DigitalThread;

/// A tool used by operations of a digital thread.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Software {
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Software Name")]
    pub software_name: Option<String>,
    #[serde(rename = "Version")]
    pub version: Option<String>,
    #[serde(rename = "Description")]
    pub description: Option<String>,
    #[serde(rename = "Input type(s)")]
    pub input_types: Option<String>,
    #[serde(rename = "Output type(s)")]
    pub output_types: Option<String>,
    #[serde(rename = "ConfigFile")]
    pub config_file: Vec<String>,
}

impl Software {
    pub fn relation(&self, name: &str) -> Option<&Vec<String>> {
        match name {
            "ConfigFile" => Some(&self.config_file),
            _ => None,
        }
    }
}

impl Element for Software {
    const ATTRIBUTES_TAG: &'static [&'static str] = &[
        "Software Name",
        "Version",
        "Description",
        "Input type(s)",
        "Output type(s)",
    ];

    fn raw_template() -> Node {
        templates::software()
    }
    fn field(&self, name: &str) -> Option<String> {
        match name {
            "Name" => self.name.clone(),
            "ID" => (!self.id.is_empty()).then(|| self.id.clone()),
            "Software Name" => self.software_name.clone(),
            "Version" => self.version.clone(),
            "Description" => self.description.clone(),
            "Input type(s)" => self.input_types.clone(),
            "Output type(s)" => self.output_types.clone(),
            _ => None,
        }
    }
    fn set_field(&mut self, name: &str, value: String) {
        match name {
            "Name" => self.name = Some(value),
            "ID" => self.id = value,
            "Software Name" => self.software_name = Some(value),
            "Version" => self.version = Some(value),
            "Description" => self.description = Some(value),
            "Input type(s)" => self.input_types = Some(value),
            "Output type(s)" => self.output_types = Some(value),
            _ => (),
        }
    }
    fn relation_mut(&mut self, name: &str) -> Option<&mut Vec<String>> {
        match name {
            "ConfigFile" => Some(&mut self.config_file),
            _ => None,
        }
    }

    fn decode(raw: &Node, cx: &mut Context<'_>) -> Result<Self> {
        Ok(Self::decode_fields(raw, cx))
    }
    fn encode(&self, cx: &mut Context<'_>) -> Result<Node> {
        Ok(self.encode_fields(cx.ids))
    }
}

// ------------- SoftwareMut -------------
pub struct SoftwareMut<'a> {
    pub(crate) thread: &'a mut DigitalThread,
    pub(crate) index: usize,
    pub(crate) ids: &'a mut IdRegistry,
}

impl SoftwareMut<'_> {
    /// Adds a file to the thread and lists it as configuration of this software.
    pub fn new_config_file(&mut self) -> &mut File {
        let file = File::new(self.ids);
        self.thread.softwares[self.index].config_file.push(file.id.clone());
        self.thread.push_file(file)
    }
}

impl Deref for SoftwareMut<'_> {
    type Target = Software;
    fn deref(&self) -> &Software {
        &self.thread.softwares[self.index]
    }
}
impl DerefMut for SoftwareMut<'_> {
    fn deref_mut(&mut self) -> &mut Software {
        &mut self.thread.softwares[self.index]
    }
}
