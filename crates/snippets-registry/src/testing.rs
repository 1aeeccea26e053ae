use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::backend::{ImportBackend, ModuleHandle};
use crate::error::{ImportError, InvokeError};
use crate::manifest::{InterfaceManifest, ManifestError};

#[derive(Debug)]
pub struct FakeModule {
    pub source: PathBuf,
    pub manifest: Option<InterfaceManifest>,
    pub symbols: Vec<String>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl ModuleHandle for FakeModule {
    fn source(&self) -> &Path {
        &self.source
    }

    fn manifest(&self) -> Result<Option<InterfaceManifest>, ManifestError> {
        Ok(self.manifest.clone())
    }

    fn has_symbol(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }

    fn invoke(&self, symbol: &str) -> Result<(), InvokeError> {
        if !self.has_symbol(symbol) {
            return Err(InvokeError::Call {
                symbol: symbol.to_string(),
                reason: "no such symbol".into(),
            });
        }
        self.calls.lock().push(symbol.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Source {
    Module {
        directory: PathBuf,
        manifest: Option<Vec<String>>,
        symbols: Vec<String>,
    },
    Broken(String),
}

/// In-memory stand-in for a language runtime: sources keyed by module name
/// plus a module cache that keeps returning stale imports until evicted.
#[derive(Debug, Default)]
pub struct FakeBackend {
    sources: HashMap<String, Source>,
    cache: HashMap<String, Arc<FakeModule>>,
    /// Every symbol invoked on any module imported by this backend.
    pub calls: Arc<Mutex<Vec<String>>>,
    pub imports: usize,
    pub evictions: usize,
}

impl FakeBackend {
    pub fn define(&mut self, name: &str, directory: &Path, interfaces: &[&str]) {
        self.define_with_symbols(name, directory, Some(interfaces), interfaces);
    }

    pub fn define_with_symbols(
        &mut self,
        name: &str,
        directory: &Path,
        interfaces: Option<&[&str]>,
        symbols: &[&str],
    ) {
        self.sources.insert(
            name.to_string(),
            Source::Module {
                directory: directory.to_path_buf(),
                manifest: interfaces.map(|names| names.iter().map(|s| s.to_string()).collect()),
                symbols: symbols.iter().map(|s| s.to_string()).collect(),
            },
        );
    }

    pub fn break_module(&mut self, name: &str, reason: &str) {
        self.sources
            .insert(name.to_string(), Source::Broken(reason.to_string()));
    }
}

impl ImportBackend for FakeBackend {
    fn is_cached(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }

    fn evict(&mut self, name: &str) -> bool {
        let removed = self.cache.remove(name).is_some();
        if removed {
            self.evictions += 1;
        }
        removed
    }

    fn import(
        &mut self,
        name: &str,
        search_path: &[PathBuf],
    ) -> Result<Arc<dyn ModuleHandle>, ImportError> {
        if let Some(cached) = self.cache.get(name) {
            return Ok(cached.clone());
        }
        self.imports += 1;
        match self.sources.get(name) {
            Some(Source::Module {
                directory,
                manifest,
                symbols,
            }) if search_path.contains(directory) => {
                let manifest = manifest
                    .as_ref()
                    .map(|names| InterfaceManifest::from_names(names.clone()).unwrap());
                let module = Arc::new(FakeModule {
                    source: directory.join(format!("{name}.py")),
                    manifest,
                    symbols: symbols.clone(),
                    calls: self.calls.clone(),
                });
                self.cache.insert(name.to_string(), module.clone());
                Ok(module)
            }
            Some(Source::Broken(reason)) => Err(ImportError::Load {
                name: name.to_string(),
                reason: reason.clone(),
            }),
            _ => Err(ImportError::NotFound {
                name: name.to_string(),
            }),
        }
    }
}
