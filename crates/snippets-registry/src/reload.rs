use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::backend::ImportBackend;
use crate::catalog::Catalog;
use crate::error::ReloadError;
use crate::registry::ModuleRegistry;
use crate::resolver::{EntryPointResolver, ResolutionReport};
use crate::scan::PathScanner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReloadState {
    #[default]
    Idle,
    Rescanning,
    Resolving,
    Unregistering,
}

#[derive(Debug)]
pub struct ReloadReport {
    pub registered: usize,
    /// Configured roots skipped because they do not exist.
    pub missing_roots: Vec<PathBuf>,
    pub resolution: ResolutionReport,
    /// Modules whose re-import failed and which kept their previous import.
    pub retained: Vec<String>,
    pub finished_at: DateTime<Utc>,
}

/// Runs a full hot-reload into a shadow registry.
///
/// The live registry is only replaced once rescanning, resolving and the
/// catalog rebuild have all succeeded; on error it is left exactly as it was.
#[derive(Debug, Default)]
pub struct ReloadCoordinator {
    state: ReloadState,
    last_failure: Option<ReloadState>,
}

impl ReloadCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ReloadState {
        self.state
    }

    /// The stage the most recent reload failed in, if it failed.
    pub fn last_failure(&self) -> Option<ReloadState> {
        self.last_failure
    }

    pub fn reload_all<B: ImportBackend>(
        &mut self,
        registry: &mut ModuleRegistry,
        scanner: &PathScanner,
        resolver: &mut EntryPointResolver<B>,
    ) -> Result<(Catalog, ReloadReport), ReloadError> {
        info!("reloading all modules");
        self.last_failure = None;
        let rebuilt = self.rebuild(registry, scanner, resolver);
        let (shadow, catalog, report) = match rebuilt {
            Ok(rebuilt) => rebuilt,
            Err(err) => {
                warn!("reload failed while {:?}: {}", self.state, err);
                self.last_failure = Some(self.state);
                self.transition(ReloadState::Idle);
                return Err(err);
            }
        };

        self.transition(ReloadState::Unregistering);
        let retired = std::mem::replace(registry, shadow);
        debug!("retired {} module records", retired.count());
        drop(retired);
        self.transition(ReloadState::Idle);

        info!(
            "reload complete: {} modules, {} interfaces, {} failures",
            registry.count(),
            catalog.len(),
            report.resolution.failures.len()
        );
        Ok((catalog, report))
    }

    fn rebuild<B: ImportBackend>(
        &mut self,
        live: &ModuleRegistry,
        scanner: &PathScanner,
        resolver: &mut EntryPointResolver<B>,
    ) -> Result<(ModuleRegistry, Catalog, ReloadReport), ReloadError> {
        self.transition(ReloadState::Rescanning);
        let mut shadow = ModuleRegistry::new();
        let summary = shadow.register_all(scanner)?;

        let mut inherited = Vec::new();
        for record in shadow.iter_mut() {
            if let Some(previous) = live.lookup(record.name()) {
                if previous.path() == record.path() && previous.is_imported() {
                    record.inherit(previous);
                    inherited.push(record.name().to_string());
                }
            }
        }

        self.transition(ReloadState::Resolving);
        resolver.prune_search_path(&shadow);
        let resolution = resolver.resolve_all(&mut shadow);
        let retained = resolution
            .failures
            .iter()
            .filter(|failure| inherited.contains(&failure.module))
            .map(|failure| failure.module.clone())
            .collect::<Vec<_>>();
        for module in &retained {
            warn!("keeping previous import of '{}' after failed reload", module);
        }

        let catalog = Catalog::build(&shadow)?;
        let report = ReloadReport {
            registered: summary.registered,
            missing_roots: summary.missing_roots,
            resolution,
            retained,
            finished_at: Utc::now(),
        };
        Ok((shadow, catalog, report))
    }

    fn transition(&mut self, next: ReloadState) {
        debug!("reload state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
