use crate::engine::VarFormat;
use crate::muted_error;
use anyhow::Context;
use serde::Deserialize;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

/// Adapter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Largest protocol-visible stoppoint number.
    pub max_stoppoint_id: u32,
    /// Thread group id used in thread and process records.
    pub thread_group: String,
    /// Write `(gdb)` prompt after result records and `*stopped` records.
    pub prompt: bool,
    /// Write logs into this file instead of stderr.
    pub log_file: Option<PathBuf>,
    /// Default format for new variable objects.
    pub var_format: VarFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_stoppoint_id: i32::MAX as u32,
            thread_group: "i1".to_string(),
            prompt: true,
            log_file: None,
            var_format: VarFormat::Natural,
        }
    }
}

impl Config {
    const DEFAULT_PATH: &'static str = ".config/bs/mi.toml";

    /// Parse configuration from TOML text.
    pub fn from_toml(data: &str) -> anyhow::Result<Self> {
        toml::de::from_str(data).context("parse configuration")
    }

    /// Load configuration from file.
    ///
    /// If `path` is `None` then `~/.config/bs/mi.toml` is used, a missing default file
    /// means default configuration. An explicitly given file must exist and be valid.
    pub fn from_file(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            None => {
                let Some(home) = home::home_dir() else {
                    return Ok(Self::default());
                };
                match muted_error!(read_to_string(home.join(Self::DEFAULT_PATH))) {
                    Some(data) => Self::from_toml(&data),
                    None => Ok(Self::default()),
                }
            }
            Some(path) => {
                let data = read_to_string(path)
                    .with_context(|| format!("read configuration file {}", path.display()))?;
                Self::from_toml(&data)
            }
        }
    }
}
