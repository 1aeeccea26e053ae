use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::ModuleHandle;
use crate::manifest::InterfaceDecl;

/// An entry point declared by a library and confirmed present on its handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoint {
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
}

impl From<InterfaceDecl> for EntryPoint {
    fn from(decl: InterfaceDecl) -> Self {
        Self {
            name: decl.name,
            category: decl.category,
            description: decl.description,
        }
    }
}

/// One discovered library, owned by the [`ModuleRegistry`](crate::ModuleRegistry).
#[derive(Debug, Clone)]
pub struct ModuleRecord {
    name: String,
    path: PathBuf,
    directory: PathBuf,
    pub(crate) handle: Option<Arc<dyn ModuleHandle>>,
    pub(crate) entry_points: Vec<EntryPoint>,
    pub(crate) imported_at: Option<DateTime<Utc>>,
}

impl ModuleRecord {
    pub(crate) fn new(name: String, path: PathBuf, directory: PathBuf) -> Self {
        Self {
            name,
            path,
            directory,
            handle: None,
            entry_points: Vec::new(),
            imported_at: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The library file this record was registered from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn handle(&self) -> Option<&Arc<dyn ModuleHandle>> {
        self.handle.as_ref()
    }

    pub fn is_imported(&self) -> bool {
        self.handle.is_some()
    }

    pub fn entry_points(&self) -> &[EntryPoint] {
        &self.entry_points
    }

    pub fn entry_point_names(&self) -> impl Iterator<Item = &str> {
        self.entry_points.iter().map(|entry| entry.name.as_str())
    }

    pub fn imported_at(&self) -> Option<DateTime<Utc>> {
        self.imported_at
    }

    /// Take over the import state of a previous record for the same file.
    pub(crate) fn inherit(&mut self, previous: &ModuleRecord) {
        self.handle = previous.handle.clone();
        self.entry_points = previous.entry_points.clone();
        self.imported_at = previous.imported_at;
    }
}
