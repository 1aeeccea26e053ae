use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::scan::{ExtensionFilter, PathScanner};

/// Where libraries live and how they are recognised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub roots: Vec<PathBuf>,
    pub extension: String,
    pub max_depth: Option<usize>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        let mut roots = Vec::new();
        if let Some(config) = dirs::config_dir() {
            roots.push(config.join("snippets/libraries"));
        }
        if let Some(home) = dirs::home_dir() {
            roots.push(home.join(".snippets/libraries"));
        }
        Self {
            roots,
            extension: std::env::consts::DLL_EXTENSION.to_string(),
            max_depth: None,
        }
    }
}

impl LoaderConfig {
    pub fn with_roots(roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Read a JSON configuration file. Missing keys fall back to the defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let raw = fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("snippets/config.json"))
    }

    pub fn scanner(&self) -> PathScanner {
        let mut scanner = PathScanner::new(
            self.roots.clone(),
            ExtensionFilter::new(self.extension.as_str()),
        );
        if let Some(depth) = self.max_depth {
            scanner = scanner.max_depth(depth);
        }
        scanner
    }
}
