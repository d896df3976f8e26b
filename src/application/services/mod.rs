//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on the `CodeRepository` port and the shared cache
//! but are themselves concrete structs, not traits.

mod code;

pub use code::CodeService;
