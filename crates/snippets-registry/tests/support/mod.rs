//! A file-backed stub runtime for integration tests.
//!
//! A library is a text file; each line is one of
//!
//! * `export <name>`: declares an interface in the manifest,
//! * `def <name>`: defines a symbol,
//! * `raise <message>`: makes the import fail.
//!
//! Imports are cached like a real runtime's module table, so a resolver that
//! forgot to evict would keep seeing the old file contents.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use snippets_registry::{
    ImportBackend, ImportError, InterfaceManifest, InvokeError, ManifestError, ModuleHandle,
};

#[derive(Debug)]
pub struct ScriptModule {
    source: PathBuf,
    exports: Vec<String>,
    symbols: Vec<String>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ModuleHandle for ScriptModule {
    fn source(&self) -> &Path {
        &self.source
    }

    fn manifest(&self) -> Result<Option<InterfaceManifest>, ManifestError> {
        if self.exports.is_empty() {
            return Ok(None);
        }
        InterfaceManifest::from_names(self.exports.clone()).map(Some)
    }

    fn has_symbol(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }

    fn invoke(&self, symbol: &str) -> Result<(), InvokeError> {
        if !self.has_symbol(symbol) {
            return Err(InvokeError::Call {
                symbol: symbol.to_string(),
                reason: "not defined".into(),
            });
        }
        self.calls.lock().push(symbol.to_string());
        Ok(())
    }
}

#[derive(Debug)]
pub struct ScriptBackend {
    extension: String,
    cache: HashMap<String, Arc<ScriptModule>>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptBackend {
    pub fn new(extension: &str) -> Self {
        Self {
            extension: extension.to_string(),
            cache: HashMap::new(),
            calls: Arc::default(),
        }
    }
}

impl ImportBackend for ScriptBackend {
    fn is_cached(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }

    fn evict(&mut self, name: &str) -> bool {
        self.cache.remove(name).is_some()
    }

    fn import(
        &mut self,
        name: &str,
        search_path: &[PathBuf],
    ) -> Result<Arc<dyn ModuleHandle>, ImportError> {
        if let Some(cached) = self.cache.get(name) {
            return Ok(cached.clone());
        }
        let file = format!("{name}.{}", self.extension);
        let source = search_path
            .iter()
            .map(|dir| dir.join(&file))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| ImportError::NotFound {
                name: name.to_string(),
            })?;

        let text = fs::read_to_string(&source)?;
        let mut exports = Vec::new();
        let mut symbols = Vec::new();
        for line in text.lines() {
            match line.trim().split_once(' ') {
                Some(("export", symbol)) => exports.push(symbol.trim().to_string()),
                Some(("def", symbol)) => symbols.push(symbol.trim().to_string()),
                Some(("raise", message)) => {
                    return Err(ImportError::Load {
                        name: name.to_string(),
                        reason: message.trim().to_string(),
                    })
                }
                _ => {}
            }
        }

        let module = Arc::new(ScriptModule {
            source,
            exports,
            symbols,
            calls: self.calls.clone(),
        });
        self.cache.insert(name.to_string(), module.clone());
        Ok(module)
    }
}

pub fn write_library(dir: &Path, file: &str, body: &str) -> PathBuf {
    let path = dir.join(file);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, body).unwrap();
    path
}
