//! Region sampling.
//!
//! A region of `span × span` blocks starting at an origin is covered by a
//! grid of `ceil(span / 16)` chunks per axis. Chunks are visited x major, z
//! minor; within a chunk columns are visited local x major, local z minor.
//! Each column becomes one string of block names from the bottom of the world
//! to the top, each name followed by a comma.

use proto::ChunkResponse;
use rayon::prelude::*;
use std::sync::Arc;
use worldgen::{ChunkPos, Identifier, ProtoChunk, TerrainEngine, TerrainGenerator, WorldgenError, CHUNK_WIDTH};

/// Errors that prevent a region from being sampled.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("Data pack is still loading")]
    NotReady,

    #[error("Generation settings {0} are not registered")]
    MissingSettings(Identifier),

    #[error("Terrain generation failed: {0}")]
    Generation(WorldgenError),
}

impl From<WorldgenError> for SampleError {
    fn from(error: WorldgenError) -> Self {
        match error {
            WorldgenError::MissingSettings(id) => Self::MissingSettings(id),
            other => Self::Generation(other),
        }
    }
}

/// Samples regions of a fixed span with one settings entry and seed.
pub struct RegionSampler {
    engine: Arc<dyn TerrainEngine>,
    settings: Identifier,
    seed: u64,
    span: u32,
    parallel: bool,
}

impl RegionSampler {
    pub fn new(engine: Arc<dyn TerrainEngine>, settings: Identifier, seed: i64, span: u32) -> Self {
        Self {
            engine,
            settings,
            seed: seed as u64,
            span,
            parallel: false,
        }
    }

    /// Materialize the chunks of a region on the rayon pool.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    #[inline]
    pub fn settings(&self) -> &Identifier {
        &self.settings
    }

    /// Chunks per axis of every sampled region.
    pub fn cells_per_axis(&self) -> usize {
        (self.span as usize).div_ceil(CHUNK_WIDTH)
    }

    /// Columns in every successful response.
    pub fn columns_per_region(&self) -> usize {
        let width = self.cells_per_axis() * CHUNK_WIDTH;
        width * width
    }

    /// Chunks covering the region at the given origin, in traversal order.
    pub fn cells(&self, origin_x: i64, origin_z: i64) -> Vec<ChunkPos> {
        let cells = self.cells_per_axis();
        let step = CHUNK_WIDTH as i64;

        (0..cells as i64)
            .flat_map(|i| {
                (0..cells as i64).map(move |j| {
                    ChunkPos::containing(
                        origin_x.saturating_add(i * step),
                        origin_z.saturating_add(j * step),
                    )
                })
            })
            .collect()
    }

    /// Sample the region whose southwest corner is at the given origin.
    ///
    /// A fresh generator is prepared for every call.
    pub fn sample(&self, origin_x: i64, origin_z: i64) -> Result<ChunkResponse, SampleError> {
        let generator = self.engine.prepare(self.seed, &self.settings)?;
        let cells = self.cells(origin_x, origin_z);

        let columns: Vec<Vec<String>> = if self.parallel {
            cells
                .par_iter()
                .map(|pos| render_chunk(generator.as_ref(), *pos))
                .collect()
        } else {
            cells
                .iter()
                .map(|pos| render_chunk(generator.as_ref(), *pos))
                .collect()
        };

        Ok(columns.into_iter().flatten().collect())
    }
}

fn render_chunk(generator: &dyn TerrainGenerator, pos: ChunkPos) -> Vec<String> {
    let chunk = generator.materialize(pos);

    let mut columns = Vec::with_capacity(CHUNK_WIDTH * CHUNK_WIDTH);
    for x in 0..CHUNK_WIDTH {
        for z in 0..CHUNK_WIDTH {
            columns.push(render_column(&chunk, x, z));
        }
    }
    columns
}

fn render_column(chunk: &ProtoChunk, x: usize, z: usize) -> String {
    let range = chunk.height_range();

    let mut column = String::with_capacity(range.height.max(0) as usize * 6);
    for y in range.min_y..range.max_y() {
        column.push_str(chunk.block_state(x, y, z).name().path());
        column.push(',');
    }
    column
}
