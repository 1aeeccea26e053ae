use std::collections::HashMap;
use std::ffi::{c_char, CStr};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;
use snippets_registry::{
    ImportBackend, ImportError, InterfaceManifest, InvokeError, ManifestError, ModuleHandle,
};
use tempfile::TempPath;
use tracing::debug;

use crate::HostError;

/// Name of the exported function returning the interface manifest as a
/// NUL-terminated JSON string.
pub const MANIFEST_SYMBOL: &str = "snippets_interfaces";

/// Signature of the `snippets_interfaces` export.
pub type ManifestEntry = unsafe extern "C" fn() -> *const c_char;

/// Signature every declared interface must have.
pub type InterfaceEntry = unsafe extern "C" fn();

/// A shared library loaded from a private shadow copy of its file.
///
/// Loading a copy means a changed library is really mapped again even while
/// an older handle of the same file is still alive.
pub struct DylibModule {
    library: Library,
    source: PathBuf,
    shadow: TempPath,
}

impl DylibModule {
    pub fn load(source: impl AsRef<Path>, shadow_dir: &Path) -> Result<Self, HostError> {
        let source = source.as_ref();
        if !source.is_file() {
            return Err(HostError::MissingBinary(source.to_path_buf()));
        }

        let stem = source
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let suffix = source
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let mut shadow = tempfile::Builder::new()
            .prefix(&format!("{stem}-"))
            .suffix(&suffix)
            .tempfile_in(shadow_dir)?;
        io::copy(&mut File::open(source)?, shadow.as_file_mut())?;
        let shadow = shadow.into_temp_path();

        let library = unsafe { Library::new(&*shadow) }?;
        debug!("loaded {} from shadow {}", source.display(), shadow.display());
        Ok(Self {
            library,
            source: source.to_path_buf(),
            shadow,
        })
    }

    pub fn shadow_path(&self) -> &Path {
        &self.shadow
    }

    /// Borrow the dynamic library backing this module.
    pub fn library(&self) -> &Library {
        &self.library
    }
}

impl fmt::Debug for DylibModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DylibModule")
            .field("source", &self.source)
            .field("shadow", &&*self.shadow)
            .finish()
    }
}

impl ModuleHandle for DylibModule {
    fn source(&self) -> &Path {
        &self.source
    }

    fn manifest(&self) -> Result<Option<InterfaceManifest>, ManifestError> {
        let entry = match unsafe { self.library.get::<ManifestEntry>(MANIFEST_SYMBOL.as_bytes()) }
        {
            Ok(symbol) => *symbol,
            Err(_) => return Ok(None),
        };
        let raw = unsafe { entry() };
        if raw.is_null() {
            return Ok(None);
        }
        let json = unsafe { CStr::from_ptr(raw) }
            .to_str()
            .map_err(|err| ManifestError::Unreadable(err.to_string()))?;
        InterfaceManifest::from_json(json).map(Some)
    }

    fn has_symbol(&self, symbol: &str) -> bool {
        unsafe { self.library.get::<InterfaceEntry>(symbol.as_bytes()) }.is_ok()
    }

    fn invoke(&self, symbol: &str) -> Result<(), InvokeError> {
        let entry = unsafe { self.library.get::<InterfaceEntry>(symbol.as_bytes()) }.map_err(
            |err| InvokeError::Call {
                symbol: symbol.to_string(),
                reason: err.to_string(),
            },
        )?;
        unsafe { entry() };
        Ok(())
    }
}

/// [`ImportBackend`] over native shared libraries.
#[derive(Debug)]
pub struct DylibBackend {
    extension: String,
    shadow_dir: PathBuf,
    cache: HashMap<String, Arc<DylibModule>>,
}

impl Default for DylibBackend {
    fn default() -> Self {
        Self::new(std::env::consts::DLL_EXTENSION)
    }
}

impl DylibBackend {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into().trim_start_matches('.').to_string(),
            shadow_dir: std::env::temp_dir(),
            cache: HashMap::new(),
        }
    }

    /// Directory receiving the shadow copies; the system temp dir by default.
    pub fn with_shadow_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shadow_dir = dir.into();
        self
    }

    fn locate(&self, name: &str, search_path: &[PathBuf]) -> Option<PathBuf> {
        let file = format!("{name}.{}", self.extension);
        search_path
            .iter()
            .map(|dir| dir.join(&file))
            .find(|candidate| candidate.is_file())
    }
}

impl ImportBackend for DylibBackend {
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
        let source = self
            .locate(name, search_path)
            .ok_or_else(|| ImportError::NotFound {
                name: name.to_string(),
            })?;
        let module = DylibModule::load(&source, &self.shadow_dir)
            .map(Arc::new)
            .map_err(|err| err.into_import_error(name))?;
        self.cache.insert(name.to_string(), module.clone());
        Ok(module)
    }
}
