use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{ImportError, InvokeError};
use crate::manifest::{InterfaceManifest, ManifestError};

/// A successfully imported library.
pub trait ModuleHandle: fmt::Debug + Send + Sync {
    /// File the handle was imported from.
    fn source(&self) -> &Path;

    /// The declared interface manifest, `None` when the library exports none.
    fn manifest(&self) -> Result<Option<InterfaceManifest>, ManifestError>;

    fn has_symbol(&self, symbol: &str) -> bool;

    /// Call an exported entry point. What the call does is up to the library.
    fn invoke(&self, symbol: &str) -> Result<(), InvokeError>;
}

/// The dynamic-import primitive together with its module cache.
///
/// The cache is global state from the registry's point of view; only the
/// [`EntryPointResolver`](crate::EntryPointResolver) calls [`evict`] and
/// [`import`], and always in that order.
///
/// [`evict`]: ImportBackend::evict
/// [`import`]: ImportBackend::import
pub trait ImportBackend {
    fn is_cached(&self, name: &str) -> bool;

    /// Drop the cached import of `name`. Returns whether an entry was removed.
    fn evict(&mut self, name: &str) -> bool;

    /// Import `name` from the first directory of `search_path` that holds it.
    /// A cached import may be returned as is.
    fn import(
        &mut self,
        name: &str,
        search_path: &[PathBuf],
    ) -> Result<Arc<dyn ModuleHandle>, ImportError>;
}

impl<B: ImportBackend + ?Sized> ImportBackend for Box<B> {
    fn is_cached(&self, name: &str) -> bool {
        (**self).is_cached(name)
    }

    fn evict(&mut self, name: &str) -> bool {
        (**self).evict(name)
    }

    fn import(
        &mut self,
        name: &str,
        search_path: &[PathBuf],
    ) -> Result<Arc<dyn ModuleHandle>, ImportError> {
        (**self).import(name, search_path)
    }
}
