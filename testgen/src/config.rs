#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use testgen_atc::SuffixScheme;
use testgen_solver::SolverConfig;

use crate::ConfigError;
use crate::tester::DEFAULT_PIN_RETRIES;

pub const CONFIG_FILE: &str = "testgen.toml";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub generation: GenerationConfig,
    pub solver: SolverConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationConfig {
    pub suffix: SuffixScheme,
    /// Extra runs allowed when values pinned for a symbolic call make the
    /// rest of the sequence unsatisfiable.
    pub pin_retries: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            suffix: SuffixScheme::default(),
            pin_retries: DEFAULT_PIN_RETRIES,
        }
    }
}

impl Config {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError {
            message: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|e| ConfigError {
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError {
            message: format!("failed to parse {}: {e}", path.display()),
        })
    }
}

/// Nearest `testgen.toml` at or above `start`.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    let mut cur = if start.is_file() {
        start.parent()?.to_path_buf()
    } else {
        start.to_path_buf()
    };

    loop {
        let candidate = cur.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        cur = cur.parent()?.to_path_buf();
    }
}

/// The explicit file if given, else the nearest discovered one, else defaults.
pub fn resolve_config(explicit: Option<&Path>, start: &Path) -> Result<(Config, Option<PathBuf>), ConfigError> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(start),
    };
    match path {
        Some(p) => {
            debug!("config: {}", p.display());
            Ok((Config::load(&p)?, Some(p)))
        }
        None => Ok((Config::default(), None)),
    }
}
