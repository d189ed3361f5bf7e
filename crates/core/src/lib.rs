//! terrane: a terrain sampling service driven by data pack overrides.
//!
//! On startup the worldgen categories of a data pack replace the dynamic
//! registries of the generation engine; afterwards `POST /chunk` samples a
//! square region of terrain and returns it one column per string.

#![warn(
    clippy::expect_used,
    clippy::get_unwrap,
    clippy::let_underscore_untyped,
    clippy::unwrap_in_result,
    clippy::unwrap_used,
    clippy::str_to_string,
    clippy::clone_on_ref_ptr,
    clippy::implicit_clone,
    clippy::manual_let_else,
    clippy::redundant_closure_for_method_calls,
    clippy::unused_async
)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod handler;
pub mod instance;
pub mod logging;
pub mod overrides;
pub mod sampler;

pub use config::{ConfigError, ConfigSource, ServerConfig};
pub use handler::ChunkHandler;
pub use instance::{Instance, LoadSummary};
pub use overrides::{apply_overrides, ApplyReport, EntryFailure, RegistryReport};
pub use sampler::{RegionSampler, SampleError};
