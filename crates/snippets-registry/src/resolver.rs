use std::path::PathBuf;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::backend::ImportBackend;
use crate::error::ResolutionError;
use crate::record::{EntryPoint, ModuleRecord};
use crate::registry::ModuleRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// The module declared this many entry points, all present.
    Resolved(usize),
    /// The module imported fine but declares no interfaces.
    NoInterfaces,
}

#[derive(Debug)]
pub struct ModuleFailure {
    pub module: String,
    pub error: ResolutionError,
}

/// Per-module results of [`EntryPointResolver::resolve_all`].
#[derive(Debug, Default)]
pub struct ResolutionReport {
    pub resolved: Vec<String>,
    pub without_interfaces: Vec<String>,
    pub failures: Vec<ModuleFailure>,
}

impl ResolutionReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failure_for(&self, module: &str) -> Option<&ResolutionError> {
        self.failures
            .iter()
            .find(|failure| failure.module == module)
            .map(|failure| &failure.error)
    }
}

/// Imports registered modules and records their declared entry points.
///
/// The resolver owns the import search path and is the only component that
/// touches the backend's module cache.
#[derive(Debug)]
pub struct EntryPointResolver<B> {
    backend: B,
    search_path: Vec<PathBuf>,
}

impl<B: ImportBackend> EntryPointResolver<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            search_path: Vec::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    /// Forget search path directories that no module in `registry` lives in.
    pub fn prune_search_path(&mut self, registry: &ModuleRegistry) {
        let before = self.search_path.len();
        self.search_path
            .retain(|dir| registry.iter().any(|(_, record)| record.directory() == dir));
        if self.search_path.len() != before {
            debug!(
                "dropped {} stale directories from the import search path",
                before - self.search_path.len()
            );
        }
    }

    /// Import `record` afresh and store its handle and entry points.
    ///
    /// A stale cache entry is always evicted first so the library is really
    /// re-executed. On any error the record keeps its previous handle and
    /// entry points.
    pub fn resolve(&mut self, record: &mut ModuleRecord) -> Result<ResolveOutcome, ResolutionError> {
        let name = record.name().to_string();

        if !self.search_path.iter().any(|dir| dir == record.directory()) {
            debug!("adding {} to the import search path", record.directory().display());
            self.search_path.push(record.directory().to_path_buf());
        }

        if self.backend.is_cached(&name) || record.is_imported() {
            debug!("evicting cached import of '{}'", name);
            self.backend.evict(&name);
        }

        let handle = self.backend.import(&name, &self.search_path)?;

        let manifest = handle
            .manifest()
            .map_err(|source| ResolutionError::InvalidManifest {
                module: name.clone(),
                source,
            })?;

        let entry_points: Vec<EntryPoint> = match manifest {
            Some(manifest) => {
                for decl in &manifest.interfaces {
                    if !handle.has_symbol(&decl.name) {
                        return Err(ResolutionError::MissingSymbol {
                            module: name,
                            symbol: decl.name.clone(),
                        });
                    }
                }
                manifest.interfaces.into_iter().map(EntryPoint::from).collect()
            }
            None => Vec::new(),
        };

        record.handle = Some(handle);
        record.imported_at = Some(Utc::now());
        record.entry_points = entry_points;

        if record.entry_points.is_empty() {
            warn!("module '{}' is not exporting any interfaces", name);
            Ok(ResolveOutcome::NoInterfaces)
        } else {
            info!(
                "registering {:?} interfaces from '{}'",
                record.entry_point_names().collect::<Vec<_>>(),
                name
            );
            Ok(ResolveOutcome::Resolved(record.entry_points.len()))
        }
    }

    /// Resolve every registered module in name order. Failures are collected
    /// per module and never stop the others.
    pub fn resolve_all(&mut self, registry: &mut ModuleRegistry) -> ResolutionReport {
        let mut report = ResolutionReport::default();
        for name in registry.names() {
            let Some(record) = registry.lookup_mut(&name) else {
                continue;
            };
            match self.resolve(record) {
                Ok(ResolveOutcome::Resolved(_)) => report.resolved.push(name),
                Ok(ResolveOutcome::NoInterfaces) => report.without_interfaces.push(name),
                Err(error) => {
                    warn!("failed to resolve module '{}': {}", name, error);
                    report.failures.push(ModuleFailure {
                        module: name,
                        error,
                    });
                }
            }
        }
        report
    }

    /// The entry points of `record`, checked against its current handle.
    pub fn entry_points_of<'r>(
        &self,
        record: &'r ModuleRecord,
    ) -> Result<&'r [EntryPoint], ResolutionError> {
        let handle = record
            .handle()
            .ok_or_else(|| ResolutionError::NotImported(record.name().to_string()))?;
        for entry in record.entry_points() {
            if !handle.has_symbol(&entry.name) {
                return Err(ResolutionError::MissingSymbol {
                    module: record.name().to_string(),
                    symbol: entry.name.clone(),
                });
            }
        }
        Ok(record.entry_points())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;
    use crate::testing::FakeBackend;

    fn registry_with(dir: &std::path::Path, names: &[&str]) -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        for name in names {
            registry
                .register(*name, dir.join(format!("{name}.py")))
                .unwrap();
        }
        registry
    }

    #[test]
    fn resolve_records_declared_entry_points() {
        let dir = tempdir().unwrap();
        let mut backend = FakeBackend::default();
        backend.define(
            "collapse_components",
            dir.path(),
            &["collapse_on_x", "collapse_on_y"],
        );
        let mut registry = registry_with(dir.path(), &["collapse_components"]);
        let mut resolver = EntryPointResolver::new(backend);

        let record = registry.lookup_mut("collapse_components").unwrap();
        let outcome = resolver.resolve(record).unwrap();
        assert_eq!(outcome, ResolveOutcome::Resolved(2));
        assert_eq!(
            record.entry_point_names().collect::<Vec<_>>(),
            vec!["collapse_on_x", "collapse_on_y"]
        );
        assert!(record.imported_at().is_some());
        assert_eq!(resolver.search_path(), &[dir.path().to_path_buf()]);
    }

    #[test]
    fn search_path_is_not_duplicated() {
        let dir = tempdir().unwrap();
        let mut backend = FakeBackend::default();
        backend.define("a", dir.path(), &["a"]);
        backend.define("b", dir.path(), &["b"]);
        let mut registry = registry_with(dir.path(), &["a", "b"]);
        let mut resolver = EntryPointResolver::new(backend);
        let report = resolver.resolve_all(&mut registry);
        assert!(report.is_clean());
        assert_eq!(resolver.search_path().len(), 1);
    }

    #[test]
    fn second_resolve_evicts_before_importing() {
        let dir = tempdir().unwrap();
        let mut backend = FakeBackend::default();
        backend.define("solidify", dir.path(), &["solidify"]);
        let mut registry = registry_with(dir.path(), &["solidify"]);
        let mut resolver = EntryPointResolver::new(backend);

        resolver
            .resolve(registry.lookup_mut("solidify").unwrap())
            .unwrap();
        resolver.backend_mut().define(
            "solidify",
            dir.path(),
            &["solidify", "solidify_inward"],
        );
        resolver
            .resolve(registry.lookup_mut("solidify").unwrap())
            .unwrap();

        let record = registry.lookup("solidify").unwrap();
        assert_eq!(
            record.entry_point_names().collect::<Vec<_>>(),
            vec!["solidify", "solidify_inward"]
        );
        assert_eq!(resolver.backend().evictions, 1);
        assert_eq!(resolver.backend().imports, 2);
    }

    #[test]
    fn failed_import_keeps_previous_handle() {
        let dir = tempdir().unwrap();
        let mut backend = FakeBackend::default();
        backend.define("solidify", dir.path(), &["solidify"]);
        let mut registry = registry_with(dir.path(), &["solidify"]);
        let mut resolver = EntryPointResolver::new(backend);
        resolver
            .resolve(registry.lookup_mut("solidify").unwrap())
            .unwrap();

        resolver
            .backend_mut()
            .break_module("solidify", "SyntaxError: invalid syntax");
        let record = registry.lookup_mut("solidify").unwrap();
        let err = resolver.resolve(record).unwrap_err();
        assert!(err.is_import_failure());
        assert!(record.is_imported());
        assert_eq!(record.entry_point_names().collect::<Vec<_>>(), vec!["solidify"]);
    }

    #[test]
    fn manifest_naming_a_missing_symbol_is_rejected() {
        let dir = tempdir().unwrap();
        let mut backend = FakeBackend::default();
        backend.define_with_symbols("uvs", dir.path(), Some(&["unfold", "layout"]), &["unfold"]);
        let mut registry = registry_with(dir.path(), &["uvs"]);
        let mut resolver = EntryPointResolver::new(backend);

        let record = registry.lookup_mut("uvs").unwrap();
        let err = resolver.resolve(record).unwrap_err();
        assert!(matches!(
            err,
            ResolutionError::MissingSymbol { ref symbol, .. } if symbol == "layout"
        ));
        assert!(!record.is_imported());
        assert!(record.entry_points().is_empty());
    }

    #[test]
    fn module_without_manifest_contributes_nothing() {
        let dir = tempdir().unwrap();
        let mut backend = FakeBackend::default();
        backend.define_with_symbols("common", dir.path(), None, &["helper"]);
        let mut registry = registry_with(dir.path(), &["common"]);
        let mut resolver = EntryPointResolver::new(backend);

        let report = resolver.resolve_all(&mut registry);
        assert_eq!(report.without_interfaces, vec!["common".to_string()]);
        let record = registry.lookup("common").unwrap();
        assert!(record.is_imported());
        assert!(record.entry_points().is_empty());
    }

    #[test]
    fn entry_points_of_requires_a_handle() {
        let dir = tempdir().unwrap();
        let mut backend = FakeBackend::default();
        backend.define("b", dir.path(), &["b"]);
        let mut registry = registry_with(dir.path(), &["a", "b"]);
        let mut resolver = EntryPointResolver::new(backend);
        resolver.resolve(registry.lookup_mut("b").unwrap()).unwrap();

        let err = resolver
            .entry_points_of(registry.lookup("a").unwrap())
            .unwrap_err();
        assert!(matches!(err, ResolutionError::NotImported(name) if name == "a"));
        let entry_points = resolver
            .entry_points_of(registry.lookup("b").unwrap())
            .unwrap();
        assert_eq!(entry_points.len(), 1);
        assert_eq!(entry_points[0].name, "b");
    }
}
