//! Application layer: services and use cases
//!
//! This layer orchestrates domain logic and depends on the store port.

pub mod error;
pub mod sequencing;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
