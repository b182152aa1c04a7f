//! Service construction shared by the CLI commands
//!
//! - `SimpleServices`: builds storage, page sessions and extractors from the config

pub mod simple_container;

pub use simple_container::SimpleServices;
