//! # Configuration
//!
//! Defaults for new bag types and the built-in validator are managed by
//! [`confique`], which layers environment variables over a TOML file over
//! compiled defaults.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `DATABAG_MAGIC_ASSIGNMENT`,
//!    `DATABAG_CAST_UNSET_OBJECTS`, `DATABAG_PRETTY_JSON`.
//! 2. **Config file**: `databag.toml`, by default in the OS config directory
//!    (via `directories`). A missing file is skipped.
//! 3. **Compiled defaults**: `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `magic_assignment` | `true` | Whether bag types allow property/index-style writes |
//! | `cast_unset_objects` | `false` | Whether nested-bag casts materialize empty bags for null |
//! | `pretty_json` | `false` | Default formatting of `to_json()` |
//! | `messages` | none | Message template overrides, keyed by rule or `attribute.rule` |
//!
//! ```toml
//! magic_assignment = false
//!
//! [messages]
//! required = "Please fill in :attribute."
//! ```
//!
//! Apply a loaded config with [`BagType::configured`](crate::BagType::configured)
//! and [`Validator::from_config`](crate::Validator::from_config).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// File name looked up in the config directory.
pub const CONFIG_FILE: &str = "databag.toml";

/// Configuration for bag types and validation, stored in `databag.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DataBagConfig {
    /// Whether new bag types accept property/index-style writes.
    #[config(env = "DATABAG_MAGIC_ASSIGNMENT", default = true)]
    pub magic_assignment: bool,

    /// Whether nested-bag casts create empty bags for null values.
    #[config(env = "DATABAG_CAST_UNSET_OBJECTS", default = false)]
    pub cast_unset_objects: bool,

    /// Whether `to_json()` pretty-prints by default.
    #[config(env = "DATABAG_PRETTY_JSON", default = false)]
    pub pretty_json: bool,

    /// Validation message overrides, keyed by rule name or `attribute.rule`.
    pub messages: Option<HashMap<String, String>>,
}

impl Default for DataBagConfig {
    fn default() -> Self {
        Self {
            magic_assignment: true,
            cast_unset_objects: false,
            pretty_json: false,
            messages: None,
        }
    }
}

impl DataBagConfig {
    /// Load from the environment, then `path` (or the default location),
    /// then compiled defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder().env();
        if let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) {
            builder = builder.file(path);
        }
        Ok(builder.load()?)
    }

    /// `databag.toml` in the OS config directory, if one can be determined.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "databag").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Message override for `key`, if configured.
    pub fn message(&self, key: &str) -> Option<&str> {
        self.messages
            .as_ref()
            .and_then(|messages| messages.get(key))
            .map(String::as_str)
    }
}
