//! CrossMap is a data-mapping layer over heterogeneous storage backends:
//! entity classes are declared once, bound to one or more named adapters,
//! and queried through a single typed surface.
//!
//! ## Crate layout
//! - `core`: runtime reflection, values, the query engine, the association
//!   resolver, and the hybrid coordinator.
//!
//! The `prelude` module mirrors the vocabulary used at call sites.

pub use crossmap_core as core;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use crossmap_core::{Connection, Error};

///
/// Prelude
///

pub mod prelude {
    pub use crate::core::prelude::*;
}
