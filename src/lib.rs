//! codetree: hierarchical reference codes with sibling sequencing and root caching

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
