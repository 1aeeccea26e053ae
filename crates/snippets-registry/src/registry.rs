use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{ConfigurationError, RegistrationError};
use crate::naming::module_name;
use crate::record::ModuleRecord;
use crate::scan::PathScanner;

/// Outcome of [`ModuleRegistry::register_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterSummary {
    pub registered: usize,
    /// Configured roots that were not existing directories.
    pub missing_roots: Vec<PathBuf>,
}

/// The authoritative name -> [`ModuleRecord`] mapping.
///
/// Names are unique: registering a name twice is an error, never an
/// overwrite. Iteration order is unspecified; sort when order matters.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, ModuleRecord>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<(), RegistrationError> {
        let name = name.into();
        if self.modules.contains_key(&name) {
            return Err(RegistrationError::AlreadyRegistered(name));
        }
        let path = path.as_ref();
        let directory = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(PathBuf::new);
        if !directory.is_dir() {
            return Err(RegistrationError::MissingDirectory {
                name,
                path: directory,
            });
        }
        debug!("registering module '{}' from {}", name, path.display());
        let record = ModuleRecord::new(name.clone(), path.to_path_buf(), directory);
        self.modules.insert(name, record);
        Ok(())
    }

    pub fn unregister(&mut self, name: &str) -> Result<ModuleRecord, RegistrationError> {
        self.modules
            .remove(name)
            .ok_or_else(|| RegistrationError::NotRegistered(name.to_string()))
    }

    /// Register every library the scanner yields.
    ///
    /// A missing root only loses that root: it is logged, collected in the
    /// returned [`RegisterSummary`] and scanning goes on. A module name
    /// discovered twice (for instance in two roots) stops registration.
    pub fn register_all(
        &mut self,
        scanner: &PathScanner,
    ) -> Result<RegisterSummary, RegistrationError> {
        let mut summary = RegisterSummary::default();
        for item in scanner.scan() {
            let path = match item {
                Ok(path) => path,
                Err(ConfigurationError::MissingRoot(root)) => {
                    warn!("library root {} does not exist", root.display());
                    summary.missing_roots.push(root);
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            let Some(name) = module_name(&path) else {
                warn!("ignoring library with unusable file name: {}", path.display());
                continue;
            };
            self.register(name, &path)?;
            summary.registered += 1;
        }
        info!("registered {} modules", summary.registered);
        Ok(summary)
    }

    pub fn lookup(&self, name: &str) -> Option<&ModuleRecord> {
        self.modules.get(name)
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut ModuleRecord> {
        self.modules.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn count(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModuleRecord)> {
        self.modules
            .iter()
            .map(|(name, record)| (name.as_str(), record))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut ModuleRecord> {
        self.modules.values_mut()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.modules.keys().cloned().collect();
        names.sort();
        names
    }

    /// Unregister everything.
    pub fn clear(&mut self) {
        self.modules.clear();
    }
}
