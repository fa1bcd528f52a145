//! `dray.toml` loading: parse if present, fall back to defaults otherwise,
//! never fail the whole run over a missing config file.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct DrayConfig {
    #[serde(default = "DrayConfig::default_ranks")]
    pub ranks: usize,
}

impl Default for DrayConfig {
    fn default() -> Self {
        Self {
            ranks: Self::default_ranks(),
        }
    }
}

impl DrayConfig {
    const fn default_ranks() -> usize {
        4
    }
}

fn discover() -> PathBuf {
    PathBuf::from("dray.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<DrayConfig> {
    let path = path.unwrap_or_else(discover);
    match fs::read_to_string(&path) {
        Ok(content) => {
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
        }
        Err(_) => Ok(DrayConfig::default()),
    }
}
