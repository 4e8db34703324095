//! Configuration for the triad pipeline.
//!
//! Settings are layered:
//! - Built-in defaults
//! - `~/.triad/config.json`
//! - Environment variable overrides (including provider detection from API keys)
//! - Validation of required settings

mod builder;
mod constants;
mod defaults;
mod environment;
mod loader;
mod types;
mod validation;

pub use types::{Config, LlmProvider, LlmSettings};
