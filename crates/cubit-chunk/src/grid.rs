use cubit_blocks::{AIR, BlockType};

use crate::{CHUNK_AREA, CHUNK_LENGTH, CHUNK_VOLUME};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChunkOccupancy {
    Empty,
    Populated,
}

impl ChunkOccupancy {
    #[inline]
    pub fn is_empty(self) -> bool {
        matches!(self, ChunkOccupancy::Empty)
    }

    #[inline]
    pub fn has_blocks(self) -> bool {
        matches!(self, ChunkOccupancy::Populated)
    }
}

/// Block storage for one chunk. Storage is allocated on the first non-air write.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VoxelGrid {
    blocks: Option<Box<[BlockType]>>,
    non_empty: usize,
}

impl VoxelGrid {
    #[inline]
    pub const fn new() -> Self {
        Self {
            blocks: None,
            non_empty: 0,
        }
    }

    /// Grid with every cell set to `block`.
    pub fn filled(block: BlockType) -> Self {
        if block == AIR {
            return Self::new();
        }
        Self {
            blocks: Some(vec![block; CHUNK_VOLUME].into_boxed_slice()),
            non_empty: CHUNK_VOLUME,
        }
    }

    #[inline]
    pub const fn idx(x: usize, y: usize, z: usize) -> usize {
        y * CHUNK_AREA + z * CHUNK_LENGTH + x
    }

    #[inline]
    pub fn in_bounds(x: i32, y: i32, z: i32) -> bool {
        let l = CHUNK_LENGTH as i32;
        (0..l).contains(&x) && (0..l).contains(&y) && (0..l).contains(&z)
    }

    /// Block at local coordinates; air when out of bounds or unallocated.
    #[inline]
    pub fn get(&self, x: i32, y: i32, z: i32) -> BlockType {
        if !Self::in_bounds(x, y, z) {
            return AIR;
        }
        self.get_local(x as usize, y as usize, z as usize)
    }

    /// Block at in-bounds local coordinates.
    #[inline]
    pub fn get_local(&self, x: usize, y: usize, z: usize) -> BlockType {
        match &self.blocks {
            Some(b) => b[Self::idx(x, y, z)],
            None => AIR,
        }
    }

    /// Writes `block`; returns whether the stored value changed. Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: i32, y: i32, z: i32, block: BlockType) -> bool {
        if !Self::in_bounds(x, y, z) {
            return false;
        }
        let i = Self::idx(x as usize, y as usize, z as usize);
        if self.blocks.is_none() {
            if block == AIR {
                return false;
            }
            self.blocks = Some(vec![AIR; CHUNK_VOLUME].into_boxed_slice());
        }
        let Some(blocks) = self.blocks.as_mut() else {
            return false;
        };
        let old = blocks[i];
        if old == block {
            return false;
        }
        blocks[i] = block;
        match (old == AIR, block == AIR) {
            (true, false) => self.non_empty += 1,
            (false, true) => self.non_empty -= 1,
            _ => {}
        }
        true
    }

    #[inline]
    pub fn non_empty_count(&self) -> usize {
        self.non_empty
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.non_empty == 0
    }

    #[inline]
    pub fn occupancy(&self) -> ChunkOccupancy {
        if self.is_empty() {
            ChunkOccupancy::Empty
        } else {
            ChunkOccupancy::Populated
        }
    }

    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.blocks.is_some()
    }

    /// Raw storage in `y*Area + z*Length + x` order.
    #[inline]
    pub fn blocks(&self) -> Option<&[BlockType]> {
        self.blocks.as_deref()
    }

    /// Drops storage and resets to all air.
    pub fn clear(&mut self) {
        self.blocks = None;
        self.non_empty = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn air_write_does_not_allocate() {
        let mut g = VoxelGrid::new();
        assert!(!g.set(1, 2, 3, AIR));
        assert!(!g.is_allocated());
        assert!(g.set(1, 2, 3, 5));
        assert!(g.is_allocated());
        assert_eq!(g.get(1, 2, 3), 5);
        assert_eq!(g.non_empty_count(), 1);
    }

    #[test]
    fn count_tracks_transitions() {
        let mut g = VoxelGrid::new();
        g.set(0, 0, 0, 1);
        g.set(0, 0, 0, 2);
        assert_eq!(g.non_empty_count(), 1);
        g.set(0, 0, 0, AIR);
        assert_eq!(g.non_empty_count(), 0);
        assert_eq!(g.occupancy(), ChunkOccupancy::Empty);
    }

    #[test]
    fn out_of_bounds_reads_air() {
        let g = VoxelGrid::filled(3);
        assert_eq!(g.get(-1, 0, 0), AIR);
        assert_eq!(g.get(0, 32, 0), AIR);
        assert_eq!(g.get(31, 31, 31), 3);
        assert_eq!(g.non_empty_count(), CHUNK_VOLUME);
    }
}
