//! Layered settings: built-in defaults, then an optional settings file
//! (`maml.toml` unless a path is given), then `MAML_`-prefixed environment
//! variables such as `MAML_REPLICABLE_IDS=true`.

use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;
use crate::identity::IdRegistry;
use crate::master::DEFAULT_INDENT;

pub const DEFAULT_SETTINGS_FILE: &str = "maml.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// Mint identifiers from a seeded generator so exports are reproducible.
    pub replicable_ids: bool,
    pub seed: u64,
    /// Indentation width of AML output.
    pub indent: usize,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            replicable_ids: false,
            seed: 0,
            indent: DEFAULT_INDENT,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    /// Loads the settings. An explicit `path` must exist, the default
    /// settings file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Settings::default();
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_SETTINGS_FILE).required(false),
        };
        let settings = Config::builder()
            .set_default("replicable_ids", defaults.replicable_ids)?
            .set_default("seed", defaults.seed)?
            .set_default("indent", defaults.indent as u64)?
            .set_default("log_filter", defaults.log_filter)?
            .add_source(file)
            .add_source(Environment::with_prefix("MAML"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// The identifier registry these settings ask for.
    pub fn registry(&self) -> IdRegistry {
        if self.replicable_ids {
            IdRegistry::seeded(self.seed)
        } else {
            IdRegistry::new()
        }
    }
}
