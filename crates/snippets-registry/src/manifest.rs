//! The interface manifest: the contract between library authors and the
//! registry.
//!
//! A library declares its entry points explicitly; nothing is inferred from
//! symbol names. The manifest is JSON:
//!
//! ```json
//! { "interfaces": [
//!     "solidify",
//!     { "name": "align_components", "category": "Modeling",
//!       "description": "Align selected components between two anchors." }
//! ] }
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::naming::nice_name;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("malformed manifest: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("interface name cannot be empty or only separators")]
    EmptyName,
    #[error("interface '{0}' is declared more than once")]
    DuplicateName(String),
    #[error("manifest could not be read: {0}")]
    Unreadable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl InterfaceDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: None,
            description: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDecl {
    Name(String),
    Full(InterfaceDecl),
}

impl From<RawDecl> for InterfaceDecl {
    fn from(raw: RawDecl) -> Self {
        match raw {
            RawDecl::Name(name) => InterfaceDecl::new(name),
            RawDecl::Full(decl) => decl,
        }
    }
}

#[derive(Deserialize)]
struct RawManifest {
    interfaces: Vec<RawDecl>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InterfaceManifest {
    pub interfaces: Vec<InterfaceDecl>,
}

impl InterfaceManifest {
    pub fn new(interfaces: Vec<InterfaceDecl>) -> Result<Self, ManifestError> {
        let mut seen = HashSet::new();
        for decl in &interfaces {
            if decl.name.trim().is_empty() || nice_name(&decl.name).is_empty() {
                return Err(ManifestError::EmptyName);
            }
            if !seen.insert(decl.name.as_str()) {
                return Err(ManifestError::DuplicateName(decl.name.clone()));
            }
        }
        Ok(Self { interfaces })
    }

    pub fn from_names<I, S>(names: I) -> Result<Self, ManifestError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(InterfaceDecl::new).collect())
    }

    pub fn from_json(raw: &str) -> Result<Self, ManifestError> {
        let manifest: RawManifest = serde_json::from_str(raw)?;
        Self::new(manifest.interfaces.into_iter().map(Into::into).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }
}
