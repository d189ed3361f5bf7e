//! Noise based chunk generation.

use crate::block::{block_kind, BlockDefinition, BlockKind, BlockState};
use crate::chunk::{ChunkPos, HeightRange, ProtoChunk, CHUNK_WIDTH};
use crate::density::{BoundDensity, DensityBinder, DensityFunction, DensityPos};
use crate::error::Result;
use crate::noise::NoiseParameters;
use crate::random::WorldRandom;
use crate::registry::Registry;
use crate::settings::{NoiseGeneratorSettings, SurfaceContext};
use std::collections::HashMap;
use std::sync::Arc;

/// World seed plus the settings' density functions bound to it.
///
/// Every noise referenced by the settings is instantiated up front, after
/// which the state is immutable and can be shared between threads.
#[derive(Debug, Clone)]
pub struct RandomState {
    seed: u64,
    final_density: BoundDensity,
}

impl RandomState {
    pub fn new(
        seed: u64,
        settings: &NoiseGeneratorSettings,
        functions: &Registry<DensityFunction>,
        noises: &Registry<NoiseParameters>,
    ) -> Result<Self> {
        let final_density =
            DensityBinder::new(seed, functions, noises).bind(&settings.noise_router.final_density)?;
        Ok(Self { seed, final_density })
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    pub fn final_density(&self) -> &BoundDensity {
        &self.final_density
    }
}

/// Generates terrain for one settings entry and world seed.
#[derive(Debug)]
pub struct NoiseChunkGenerator {
    settings: Arc<NoiseGeneratorSettings>,
    blocks: Arc<Registry<BlockDefinition>>,
    state: RandomState,
}

impl NoiseChunkGenerator {
    pub fn new(
        settings: Arc<NoiseGeneratorSettings>,
        blocks: Arc<Registry<BlockDefinition>>,
        state: RandomState,
    ) -> Self {
        Self {
            settings,
            blocks,
            state,
        }
    }

    #[inline]
    pub fn settings(&self) -> &NoiseGeneratorSettings {
        &self.settings
    }

    pub fn height_range(&self) -> HeightRange {
        HeightRange {
            min_y: self.settings.noise.min_y,
            height: self.settings.noise.height,
        }
    }

    /// Place the default block wherever the final density is positive and
    /// the default fluid below sea level everywhere else.
    ///
    /// Density is sampled at the corners of each noise cell and trilinearly
    /// interpolated inside it.
    pub fn fill(&self, chunk: &mut ProtoChunk) {
        let shape = self.settings.noise;
        let cell_width = shape.cell_width() as usize;
        let cell_height = shape.cell_height();
        let cells_xz = CHUNK_WIDTH / cell_width;
        let cells_y = (shape.height / cell_height) as usize;
        let stride = cells_xz + 1;

        let pos = chunk.pos();
        let (base_x, base_z) = (pos.min_block_x(), pos.min_block_z());

        let mut corners = vec![0.0; stride * stride * (cells_y + 1)];
        for cy in 0..=cells_y {
            for cz in 0..=cells_xz {
                for cx in 0..=cells_xz {
                    let corner = DensityPos::new(
                        base_x + (cx * cell_width) as i64,
                        shape.min_y + cy as i32 * cell_height,
                        base_z + (cz * cell_width) as i64,
                    );
                    corners[(cy * stride + cz) * stride + cx] =
                        self.state.final_density.compute(corner);
                }
            }
        }
        let corner = |cx: usize, cy: usize, cz: usize| corners[(cy * stride + cz) * stride + cx];

        let default_block = &self.settings.default_block;
        let default_fluid = &self.settings.default_fluid;
        let sea_level = self.settings.sea_level;

        for y in shape.min_y..shape.max_y() {
            let local_y = y - shape.min_y;
            let cy = (local_y / cell_height) as usize;
            let fy = f64::from(local_y % cell_height) / f64::from(cell_height);

            for z in 0..CHUNK_WIDTH {
                let cz = z / cell_width;
                let fz = (z % cell_width) as f64 / cell_width as f64;

                for x in 0..CHUNK_WIDTH {
                    let cx = x / cell_width;
                    let fx = (x % cell_width) as f64 / cell_width as f64;

                    let density = lerp3(
                        fx,
                        fy,
                        fz,
                        [
                            corner(cx, cy, cz),
                            corner(cx + 1, cy, cz),
                            corner(cx, cy + 1, cz),
                            corner(cx + 1, cy + 1, cz),
                            corner(cx, cy, cz + 1),
                            corner(cx + 1, cy, cz + 1),
                            corner(cx, cy + 1, cz + 1),
                            corner(cx + 1, cy + 1, cz + 1),
                        ],
                    );

                    if density > 0.0 {
                        chunk.set_block_state(x, y, z, default_block);
                    } else if y < sea_level {
                        chunk.set_block_state(x, y, z, default_fluid);
                    }
                }
            }
        }
    }

    /// Run the surface rule over every default block, top down per column.
    pub fn build_surface(&self, chunk: &mut ProtoChunk) {
        let range = self.height_range();
        let height = range.height.max(0) as usize;
        let pos = chunk.pos();
        let default_block = &self.settings.default_block;

        let mut kind_cache: HashMap<BlockState, BlockKind> = HashMap::new();
        let mut kinds = Vec::with_capacity(height);
        let mut is_default = Vec::with_capacity(height);
        let mut depth_below = vec![0i32; height];

        for x in 0..CHUNK_WIDTH {
            for z in 0..CHUNK_WIDTH {
                let world_x = pos.min_block_x() + x as i64;
                let world_z = pos.min_block_z() + z as i64;

                kinds.clear();
                is_default.clear();
                for y in range.min_y..range.max_y() {
                    let state = chunk.block_state(x, y, z);
                    let kind = match kind_cache.get(state) {
                        Some(kind) => *kind,
                        None => {
                            let kind = block_kind(&self.blocks, state);
                            kind_cache.insert(state.clone(), kind);
                            kind
                        }
                    };
                    kinds.push(kind);
                    is_default.push(state == default_block);
                }

                let mut run = 0;
                for (index, kind) in kinds.iter().enumerate() {
                    run = if *kind == BlockKind::Solid { run + 1 } else { 0 };
                    depth_below[index] = run;
                }

                let surface_depth = 3 + WorldRandom::at(self.state.seed, world_x, 0, world_z).next_below(3) as i32;
                let mut stone_depth_above = 0;
                let mut water_height = None;

                for index in (0..height).rev() {
                    let y = range.min_y + index as i32;
                    match kinds[index] {
                        BlockKind::Air => {
                            stone_depth_above = 0;
                            water_height = None;
                        }
                        BlockKind::Fluid => {
                            stone_depth_above = 0;
                            if water_height.is_none() {
                                water_height = Some(y + 1);
                            }
                        }
                        BlockKind::Solid => {
                            stone_depth_above += 1;
                            if !is_default[index] {
                                continue;
                            }

                            let ctx = SurfaceContext {
                                seed: self.state.seed,
                                x: world_x,
                                y,
                                z: world_z,
                                min_y: range.min_y,
                                max_y: range.max_y(),
                                surface_depth,
                                stone_depth_above,
                                stone_depth_below: depth_below[index],
                                water_height,
                            };
                            if let Some(state) = self.settings.surface_rule.apply(&ctx) {
                                chunk.set_block_state(x, y, z, &state);
                            }
                        }
                    }
                }
            }
        }
    }

    /// Base terrain followed by the surface pass.
    pub fn materialize(&self, pos: ChunkPos) -> ProtoChunk {
        let mut chunk = ProtoChunk::new(pos, self.height_range());
        self.fill(&mut chunk);
        self.build_surface(&mut chunk);
        chunk
    }
}

#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

/// Corners are ordered x fastest, then y, then z.
fn lerp3(fx: f64, fy: f64, fz: f64, c: [f64; 8]) -> f64 {
    let near = lerp(fy, lerp(fx, c[0], c[1]), lerp(fx, c[2], c[3]));
    let far = lerp(fy, lerp(fx, c[4], c[5]), lerp(fx, c[6], c[7]));
    lerp(fz, near, far)
}
