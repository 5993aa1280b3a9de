//! Infrastructure adapters for markup IO, configuration, and logging.

pub mod config;
pub mod logging;
pub mod markup;
