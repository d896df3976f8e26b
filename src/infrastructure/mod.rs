//! Infrastructure layer: stores, cache, I/O implementations and DI container
//!
//! This layer implements the persistence port and wires up services.

pub mod cache;
pub mod di;
pub mod error;
pub mod repository;
pub mod traits;

pub use cache::{CacheGroup, TtlCache};
pub use error::{InfraError, InfraResult};
pub use repository::{CodeTable, FileCodeRepository, InMemoryCodeRepository};
