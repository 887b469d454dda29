//! Conversion facade between the two on-disk forms of a document.
//!
//! [`MasterAml`] wraps a [`Document`] together with the output settings and
//! knows how to load and store it as AML (`.aml`) or as the simplified JSON
//! model (`.json`). Exports are all-or-nothing: the whole output is produced
//! in memory and written through a temporary file that replaces the target
//! in one step.

use std::fs;
use std::io::Write;
use std::ops::{Deref, DerefMut};
use std::path::Path;

use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::info;

use crate::codec;
use crate::document::Document;
use crate::error::{MamlError, Result};
use crate::identity::IdRegistry;

pub const DEFAULT_INDENT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Aml,
    Json,
}

impl Format {
    /// Format named by the extension of `path`, case-insensitive.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("aml") => Ok(Format::Aml),
            Some("json") => Ok(Format::Json),
            _ => Err(MamlError::UnsupportedFormat(path.display().to_string())),
        }
    }
    pub fn opposite(&self) -> Self {
        match self {
            Format::Aml => Format::Json,
            Format::Json => Format::Aml,
        }
    }
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Aml => "aml",
            Format::Json => "json",
        }
    }
}

#[derive(Debug)]
pub struct MasterAml {
    document: Document,
    indent: usize,
}

impl MasterAml {
    /// An empty master document.
    pub fn new(ids: IdRegistry) -> Result<Self> {
        Ok(Self::wrap(Document::new(ids)?))
    }
    fn wrap(document: Document) -> Self {
        Self {
            document,
            indent: DEFAULT_INDENT,
        }
    }
    /// Indentation width used by AML output.
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Loads a document from an `.aml` or `.json` file.
    pub fn open(path: impl AsRef<Path>, ids: IdRegistry) -> Result<Self> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let content = fs::read_to_string(path)?;
        info!(path = %path.display(), ?format, "loading document");
        match format {
            Format::Aml => Self::from_aml_str(&content, ids),
            Format::Json => Self::from_json_str(&content, ids),
        }
    }
    pub fn from_aml_str(xml: &str, ids: IdRegistry) -> Result<Self> {
        let raw = codec::parse(xml)?;
        Ok(Self::wrap(Document::decode(raw, ids)?))
    }
    pub fn from_json_str(text: &str, ids: IdRegistry) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_dict(value, ids)
    }
    /// Loads a document from the in-memory simplified model.
    pub fn from_dict(value: Value, ids: IdRegistry) -> Result<Self> {
        Ok(Self::wrap(Document::from_value(value, ids)?))
    }

    /// Snapshot of the simplified model.
    pub fn to_dict(&self) -> Result<Value> {
        self.document.to_value()
    }
    pub fn to_aml_string(&mut self) -> Result<String> {
        let raw = self.document.encode()?;
        codec::serialize(&raw, self.indent)
    }
    pub fn to_json_string(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(&self.to_dict()?)?;
        text.push('\n');
        Ok(text)
    }

    /// Writes the document to `path` in the format named by its extension.
    /// Nothing is written when the extension is unknown or encoding fails.
    pub fn export(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        let content = match format {
            Format::Aml => self.to_aml_string()?,
            Format::Json => self.to_json_string()?,
        };
        let directory = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut staged = NamedTempFile::new_in(directory)?;
        staged.write_all(content.as_bytes())?;
        staged.persist(path).map_err(|e| MamlError::from(e.error))?;
        info!(path = %path.display(), ?format, bytes = content.len(), "exported document");
        Ok(())
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}

impl Deref for MasterAml {
    type Target = Document;
    fn deref(&self) -> &Document {
        &self.document
    }
}
impl DerefMut for MasterAml {
    fn deref_mut(&mut self) -> &mut Document {
        &mut self.document
    }
}
