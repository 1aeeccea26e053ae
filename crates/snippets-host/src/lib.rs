//! Native hosting for snippet libraries.
//!
//! A library is a shared object exporting `snippets_interfaces`, a C function
//! returning the interface manifest as JSON, plus one `extern "C" fn()` per
//! declared interface. [`DylibBackend`] plugs these libraries into the
//! registry's [`ImportBackend`](snippets_registry::ImportBackend) seam.

mod dylib;
mod error;

pub use dylib::{DylibBackend, DylibModule, InterfaceEntry, ManifestEntry, MANIFEST_SYMBOL};
pub use error::HostError;
