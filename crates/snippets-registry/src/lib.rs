//! Discovery, registration and hot-reload of script libraries.
//!
//! Libraries are found on disk by a [`PathScanner`], tracked by name in a
//! [`ModuleRegistry`], imported through an [`ImportBackend`] by the
//! [`EntryPointResolver`] and indexed for display in a [`Catalog`]. The
//! [`ReloadCoordinator`] rebuilds all of it without ever exposing a half
//! updated registry.

mod backend;
mod catalog;
mod config;
mod error;
mod loader;
mod manifest;
mod naming;
mod record;
mod registry;
mod reload;
mod resolver;
mod scan;
mod shared;
#[cfg(test)]
mod testing;

pub use backend::*;
pub use catalog::*;
pub use config::*;
pub use error::*;
pub use loader::*;
pub use manifest::*;
pub use naming::*;
pub use record::*;
pub use registry::*;
pub use reload::*;
pub use resolver::*;
pub use scan::*;
pub use shared::*;
