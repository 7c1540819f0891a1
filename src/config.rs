//! Store configuration

use std::path::PathBuf;

use serde::Deserialize;

use crate::constants::{DEFAULT_DB_PATH, DEFAULT_MAP_SIZE, DEFAULT_MAX_DBS};
use crate::error::{RbacError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the LMDB environment
    pub path: PathBuf,
    /// Maximum size of the memory map in bytes
    pub map_size: usize,
    pub max_dbs: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            path: PathBuf::from(DEFAULT_DB_PATH),
            map_size: DEFAULT_MAP_SIZE,
            max_dbs: DEFAULT_MAX_DBS,
        }
    }
}

impl Config {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Config { path: path.into(), ..Default::default() }
    }

    /// Read `ROLEMASK_DB` and `ROLEMASK_MAP_SIZE`, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut c = Config::default();
        if let Some(p) = get("ROLEMASK_DB") {
            c.path = PathBuf::from(p);
        }
        if let Some(s) = get("ROLEMASK_MAP_SIZE") {
            c.map_size = s
                .parse()
                .map_err(|_| RbacError::InvalidInput(format!("ROLEMASK_MAP_SIZE `{}`", s)))?;
        }
        Ok(c)
    }
}
