use std::path::PathBuf;

use snippets_registry::ImportError;
use thiserror::Error;

/// Errors that can occur while loading a library from disk.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("library binary not found at {0}")]
    MissingBinary(PathBuf),
    #[error("failed to load library: {0}")]
    LibraryLoad(#[from] libloading::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HostError {
    pub(crate) fn into_import_error(self, name: &str) -> ImportError {
        match self {
            HostError::MissingBinary(_) => ImportError::NotFound {
                name: name.to_string(),
            },
            HostError::Io(err) => ImportError::Io(err),
            HostError::LibraryLoad(err) => ImportError::Load {
                name: name.to_string(),
                reason: err.to_string(),
            },
        }
    }
}
