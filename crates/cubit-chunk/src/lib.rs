//! Chunk storage, coordinates and neighbor lookups.
#![forbid(unsafe_code)]

mod chunk;
mod coord;
mod grid;
mod neighbors;

pub use chunk::{Chunk, ChunkState, LodLevel, MeshHandles};
pub use coord::{ChunkCoord, world_to_local};
pub use grid::{ChunkOccupancy, VoxelGrid};
pub use neighbors::{ChunkStack, NeighborSnapshot, NeighborView, neighbor_slot};

/// Edge length of a chunk in blocks.
pub const CHUNK_LENGTH: usize = 32;
pub const CHUNK_AREA: usize = CHUNK_LENGTH * CHUNK_LENGTH;
pub const CHUNK_VOLUME: usize = CHUNK_AREA * CHUNK_LENGTH;
/// Number of chunks stacked vertically in a column.
pub const VERTICAL_CHUNKS: usize = 8;

/// Slot of the center chunk in a 27-entry neighbor array.
pub const CENTER_SLOT: usize = 13;
