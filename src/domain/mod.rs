//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod entities;
pub mod error;
pub mod tree;

pub use entities::*;
pub use error::DomainError;
pub use tree::{CodeNode, CodeTree, TreeIterator};

/// Upper bound on parent hops when walking towards a root.
pub const MAX_ANCESTOR_DEPTH: usize = 64;

/// Expand `~`, `$VAR` and `${VAR}` in a path string.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}
