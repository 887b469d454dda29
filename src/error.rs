use thiserror::Error;

#[derive(Error, Debug)]
pub enum MamlError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("XML error: {0}")]
    Xml(String),
    #[error("JSON error: {0}")]
    Json(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Identifier collision: {id} is claimed by different nodes")]
    IdentifierCollision { id: String },
    #[error("Dangling reference: {id} does not resolve to a record")]
    DanglingReference { id: String },
    #[error("Unknown relationship: {0}")]
    UnknownRelationship(String),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Malformed document: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, MamlError>;

// Helper conversions
impl From<std::io::Error> for MamlError {
    fn from(e: std::io::Error) -> Self { Self::Io(e.to_string()) }
}
impl From<serde_json::Error> for MamlError {
    fn from(e: serde_json::Error) -> Self { Self::Json(e.to_string()) }
}
impl From<config::ConfigError> for MamlError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
impl From<quick_xml::Error> for MamlError {
    fn from(e: quick_xml::Error) -> Self { Self::Xml(e.to_string()) }
}
