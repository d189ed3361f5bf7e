//! Terrain generation engine for terrane.
//!
//! Generation objects (noises, density functions and noise settings) live in
//! [`Registry`] instances collected in a [`RegistryStore`]. A [`TerrainEngine`]
//! reads those registries to build generators that materialize chunks.

#![warn(
    clippy::expect_used,
    clippy::get_unwrap,
    clippy::if_then_some_else_none,
    clippy::let_underscore_untyped,
    clippy::unwrap_in_result,
    clippy::unwrap_used,
    clippy::str_to_string,
    clippy::clone_on_ref_ptr,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inefficient_to_string,
    clippy::manual_let_else,
    clippy::redundant_closure_for_method_calls,
    clippy::unused_self
)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod block;
pub mod chunk;
pub mod density;
pub mod engine;
pub mod error;
pub mod generator;
pub mod identifier;
pub mod noise;
pub mod random;
pub mod registries;
pub mod registry;
pub mod settings;

pub use block::{BlockDefinition, BlockKind, BlockState};
pub use chunk::{ChunkPos, HeightRange, ProtoChunk, CHUNK_WIDTH};
pub use density::DensityFunction;
pub use engine::{NoiseEngine, TerrainEngine, TerrainGenerator};
pub use error::{Result, WorldgenError};
pub use generator::{NoiseChunkGenerator, RandomState};
pub use identifier::{Identifier, IdentifierError, DEFAULT_NAMESPACE};
pub use noise::NoiseParameters;
pub use registries::keys;
pub use registry::{DynamicRegistry, Registry, RegistryBatch, RegistryError, RegistryStore, RegistryValue};
pub use settings::NoiseGeneratorSettings;
