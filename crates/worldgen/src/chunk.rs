//! Chunk positions and paletted block storage.

use crate::block::BlockState;
use indexmap::IndexSet;
use std::fmt;

/// Width of a chunk along both horizontal axes.
pub const CHUNK_WIDTH: usize = 16;

/// Horizontal chunk coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing the given block coordinates.
    pub fn containing(block_x: i64, block_z: i64) -> Self {
        Self {
            x: to_chunk(block_x),
            z: to_chunk(block_z),
        }
    }

    #[inline]
    pub fn min_block_x(&self) -> i64 {
        i64::from(self.x) * CHUNK_WIDTH as i64
    }

    #[inline]
    pub fn min_block_z(&self) -> i64 {
        i64::from(self.z) * CHUNK_WIDTH as i64
    }
}

fn to_chunk(block: i64) -> i32 {
    let chunk = block.div_euclid(CHUNK_WIDTH as i64);
    chunk.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}

/// Vertical bounds of generated terrain: `min_y..min_y + height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeightRange {
    pub min_y: i32,
    pub height: i32,
}

impl HeightRange {
    #[inline]
    pub const fn max_y(&self) -> i32 {
        self.min_y + self.height
    }

    #[inline]
    pub fn contains(&self, y: i32) -> bool {
        y >= self.min_y && y < self.max_y()
    }
}

/// A chunk under construction.
///
/// Blocks are stored as indices into a palette. Index 0 is always air, so a
/// freshly created chunk is empty.
pub struct ProtoChunk {
    pos: ChunkPos,
    range: HeightRange,
    palette: IndexSet<BlockState>,
    blocks: Vec<u16>,
}

impl ProtoChunk {
    pub fn new(pos: ChunkPos, range: HeightRange) -> Self {
        let mut palette = IndexSet::new();
        palette.insert(BlockState::air());

        let height = range.height.max(0) as usize;
        Self {
            pos,
            range,
            palette,
            blocks: vec![0; CHUNK_WIDTH * CHUNK_WIDTH * height],
        }
    }

    #[inline]
    pub fn pos(&self) -> ChunkPos {
        self.pos
    }

    #[inline]
    pub fn height_range(&self) -> HeightRange {
        self.range
    }

    fn index(&self, x: usize, y: i32, z: usize) -> Option<usize> {
        if x >= CHUNK_WIDTH || z >= CHUNK_WIDTH || !self.range.contains(y) {
            return None;
        }
        let y = (y - self.range.min_y) as usize;
        Some((y * CHUNK_WIDTH + z) * CHUNK_WIDTH + x)
    }

    /// Block at local `x`/`z` and world `y`. Positions outside the chunk read
    /// as air.
    pub fn block_state(&self, x: usize, y: i32, z: usize) -> &BlockState {
        let palette_index = self.index(x, y, z).map_or(0, |index| self.blocks[index]);
        // Palette indices only ever come from `palette_id`.
        &self.palette[usize::from(palette_index)]
    }

    /// Set the block at local `x`/`z` and world `y`. Out of range writes are
    /// ignored.
    pub fn set_block_state(&mut self, x: usize, y: i32, z: usize, state: &BlockState) {
        if let Some(index) = self.index(x, y, z) {
            let id = self.palette_id(state);
            self.blocks[index] = id;
        }
    }

    fn palette_id(&mut self, state: &BlockState) -> u16 {
        let index = match self.palette.get_index_of(state) {
            Some(index) => index,
            None => self.palette.insert_full(state.clone()).0,
        };
        index as u16
    }

    /// Distinct block states present in the palette.
    pub fn palette(&self) -> impl Iterator<Item = &BlockState> {
        self.palette.iter()
    }
}

impl fmt::Debug for ProtoChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtoChunk")
            .field("pos", &self.pos)
            .field("range", &self.range)
            .field("palette", &self.palette.len())
            .finish()
    }
}
