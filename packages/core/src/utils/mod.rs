//! Utility functions for Sinoptico Core

pub mod logging;

pub use logging::init_tracing;
