//! Utility modules for common functionality
//!
//! - `logging`: Logging configuration and setup
//! - `progress`: Progress bar utilities for crawl feedback

pub mod logging;
pub mod progress;
