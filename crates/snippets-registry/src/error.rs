use std::path::PathBuf;

use thiserror::Error;

use crate::manifest::ManifestError;

/// Problems with the configured library roots or the configuration file.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("library root {0} does not exist")]
    MissingRoot(PathBuf),
    #[error("failed to read configuration: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised by [`ModuleRegistry`](crate::ModuleRegistry) mutations.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("module '{0}' is already registered")]
    AlreadyRegistered(String),
    #[error("module '{0}' is not registered")]
    NotRegistered(String),
    #[error("directory {path} of module '{name}' does not exist")]
    MissingDirectory { name: String, path: PathBuf },
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// A library could not be imported by the active backend.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("no library named '{name}' in the search path")]
    NotFound { name: String },
    #[error("failed to import '{name}': {reason}")]
    Load { name: String, reason: String },
    #[error("I/O error while importing: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-module failures while resolving entry points.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error("module '{module}' has an invalid interface manifest: {source}")]
    InvalidManifest {
        module: String,
        #[source]
        source: ManifestError,
    },
    #[error("module '{module}' declares interface '{symbol}' but does not export it")]
    MissingSymbol { module: String, symbol: String },
    #[error("module '{0}' has not been imported")]
    NotImported(String),
}

impl ResolutionError {
    pub fn is_import_failure(&self) -> bool {
        matches!(self, ResolutionError::Import(_))
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("interface '{display_name}' is exported by both '{first}' and '{second}'")]
    DuplicateInterfaceName {
        display_name: String,
        first: String,
        second: String,
    },
    #[error("invalid filter pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error("unknown interface '{0}'")]
    UnknownInterface(String),
}

/// A full reload could not complete; the live registry was left untouched.
#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("rescan failed: {0}")]
    Registration(#[from] RegistrationError),
    #[error("catalog rebuild failed: {0}")]
    Catalog(#[from] CatalogError),
    #[error("a reload is already in progress")]
    Busy,
}

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("unknown interface '{0}'")]
    UnknownInterface(String),
    #[error("module '{0}' has not been imported")]
    NotImported(String),
    #[error("failed to call '{symbol}': {reason}")]
    Call { symbol: String, reason: String },
}
