//! gptr - research kernel library
//!
//! Exports the kernel, plugins and agents for the binaries and for testing.

pub mod agents;
pub mod cli;
pub mod config;
pub mod kernel;
pub mod llm;
pub mod logging;
pub mod plugin;
pub mod research;
