//! Backend module system
//!
//! Route-definition files dropped into `{webroot}/backend/` are loaded as
//! extra routes, remounted when they change, and unmounted when they
//! disappear. The live route set is an immutable snapshot swapped on every
//! change, never mutated under a reader.

pub mod module;
pub mod registry;
pub mod watcher;

pub use module::{BackendModule, BackendRoute, ModuleError, RouteAction, RouteProvider};
pub use registry::{BackendRegistry, RouteSet};
