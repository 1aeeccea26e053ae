use std::sync::Arc;

use parking_lot::Mutex;

use crate::backend::ImportBackend;
use crate::error::ReloadError;
use crate::loader::Loader;
use crate::reload::ReloadReport;

/// A [`Loader`] behind one coarse, non-reentrant lock.
///
/// Hosts that keep their UI thread responsive can run the pipeline on a
/// worker and read the catalog from the UI. A reload requested while the
/// loader is busy is refused with [`ReloadError::Busy`] instead of queueing
/// or re-entering.
#[derive(Debug)]
pub struct SharedLoader<B> {
    inner: Arc<Mutex<Loader<B>>>,
}

impl<B> Clone for SharedLoader<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: ImportBackend> SharedLoader<B> {
    pub fn new(loader: Loader<B>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(loader)),
        }
    }

    pub fn try_reload(&self) -> Result<ReloadReport, ReloadError> {
        let mut loader = self.inner.try_lock().ok_or(ReloadError::Busy)?;
        loader.reload()
    }

    /// Run `f` with the loader locked, blocking until it is available.
    pub fn with<R>(&self, f: impl FnOnce(&Loader<B>) -> R) -> R {
        f(&self.inner.lock())
    }

    pub fn is_busy(&self) -> bool {
        self.inner.is_locked()
    }
}
