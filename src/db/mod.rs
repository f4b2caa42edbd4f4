//! Account storage.
//!
//! - [`traits`] - the `UserStore` trait and provider selection
//! - [`turso`] - libsql implementation (in-memory, local file or remote Turso)

#![allow(missing_docs)]

pub mod traits;
pub mod turso;

pub use traits::{DatabaseProvider, UserStore};
pub use turso::TursoClient;
