use tracing::info;

use crate::backend::ImportBackend;
use crate::catalog::{Catalog, InterfaceEntry};
use crate::config::LoaderConfig;
use crate::error::{InvokeError, ReloadError};
use crate::record::ModuleRecord;
use crate::registry::ModuleRegistry;
use crate::reload::{ReloadCoordinator, ReloadReport};
use crate::resolver::EntryPointResolver;
use crate::scan::PathScanner;

/// Registry, resolver and catalog wired together for one host.
///
/// All mutations take `&mut self`; a host that shares the loader between
/// threads should go through [`SharedLoader`](crate::SharedLoader).
#[derive(Debug)]
pub struct Loader<B> {
    config: LoaderConfig,
    scanner: PathScanner,
    registry: ModuleRegistry,
    resolver: EntryPointResolver<B>,
    coordinator: ReloadCoordinator,
    catalog: Catalog,
}

impl<B: ImportBackend> Loader<B> {
    pub fn new(config: LoaderConfig, backend: B) -> Self {
        let scanner = config.scanner();
        Self {
            config,
            scanner,
            registry: ModuleRegistry::new(),
            resolver: EntryPointResolver::new(backend),
            coordinator: ReloadCoordinator::new(),
            catalog: Catalog::new(),
        }
    }

    /// Scan, import and index every library. Loading is a reload from an
    /// empty registry, so it can be repeated at any time.
    pub fn load(&mut self) -> Result<ReloadReport, ReloadError> {
        self.reload()
    }

    pub fn reload(&mut self) -> Result<ReloadReport, ReloadError> {
        let (catalog, report) =
            self.coordinator
                .reload_all(&mut self.registry, &self.scanner, &mut self.resolver)?;
        self.catalog = catalog;
        Ok(report)
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &EntryPointResolver<B> {
        &self.resolver
    }

    pub fn coordinator(&self) -> &ReloadCoordinator {
        &self.coordinator
    }

    /// Catalog entry with the record of the module exporting it.
    pub fn describe(&self, display_name: &str) -> Option<(&InterfaceEntry, &ModuleRecord)> {
        let entry = self.catalog.get(display_name)?;
        let record = self.registry.lookup(&entry.owning_module)?;
        Some((entry, record))
    }

    /// Call the entry point shown as `display_name`.
    pub fn invoke(&self, display_name: &str) -> Result<(), InvokeError> {
        let entry = self
            .catalog
            .get(display_name)
            .ok_or_else(|| InvokeError::UnknownInterface(display_name.to_string()))?;
        let handle = self
            .registry
            .lookup(&entry.owning_module)
            .and_then(ModuleRecord::handle)
            .ok_or_else(|| InvokeError::NotImported(entry.owning_module.clone()))?;
        info!(
            "executing '{}' interface from '{}' module",
            entry.raw_name, entry.owning_module
        );
        handle.invoke(&entry.raw_name)
    }
}
