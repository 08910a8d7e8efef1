use std::sync::Arc;

use cubit_blocks::BlockType;

use crate::{ChunkCoord, VoxelGrid};

/// Progress of a chunk through terrain generation or meshing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ChunkState {
    #[default]
    NotFinished,
    Queued,
    Finished,
}

/// Which mesh currently represents a chunk.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum LodLevel {
    #[default]
    NoMesh,
    Regular,
    One,
    Two,
    Three,
}

impl LodLevel {
    /// Blocks per coarse cell along each axis.
    #[inline]
    pub fn factor(self) -> usize {
        match self {
            LodLevel::NoMesh | LodLevel::Regular => 1,
            LodLevel::One => 2,
            LodLevel::Two => 4,
            LodLevel::Three => 8,
        }
    }

    pub fn from_factor(factor: usize) -> Option<Self> {
        match factor {
            1 => Some(LodLevel::Regular),
            2 => Some(LodLevel::One),
            4 => Some(LodLevel::Two),
            8 => Some(LodLevel::Three),
            _ => None,
        }
    }

    #[inline]
    pub fn is_lod(self) -> bool {
        matches!(self, LodLevel::One | LodLevel::Two | LodLevel::Three)
    }
}

/// Registry handle ids of a chunk's full-resolution meshes; 0 when absent.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MeshHandles {
    pub opaque: u32,
    pub translucent: u32,
}

impl MeshHandles {
    pub const NONE: MeshHandles = MeshHandles {
        opaque: 0,
        translucent: 0,
    };

    #[inline]
    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

#[derive(Clone, Debug)]
pub struct Chunk {
    pub coord: ChunkCoord,
    pub terrain_state: ChunkState,
    pub mesh_state: ChunkState,
    pub lod_level: LodLevel,
    pub mesh_handle: MeshHandles,
    /// Id of the terrain or mesh job in flight for this chunk; 0 when none.
    /// Ids are never reused, so results queued before an unload stay stale.
    pub job_id: u64,
    grid: Arc<VoxelGrid>,
    revision: u64,
}

impl Chunk {
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            coord,
            terrain_state: ChunkState::NotFinished,
            mesh_state: ChunkState::NotFinished,
            lod_level: LodLevel::NoMesh,
            mesh_handle: MeshHandles::NONE,
            job_id: 0,
            grid: Arc::new(VoxelGrid::new()),
            revision: 0,
        }
    }

    #[inline]
    pub fn grid(&self) -> &Arc<VoxelGrid> {
        &self.grid
    }

    /// Installs generated terrain and marks the chunk ready for meshing.
    pub fn set_grid(&mut self, grid: Arc<VoxelGrid>) {
        self.grid = grid;
        self.terrain_state = ChunkState::Finished;
        self.mesh_state = ChunkState::NotFinished;
        self.revision += 1;
    }

    #[inline]
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> BlockType {
        self.grid.get(x, y, z)
    }

    /// Edits one block. Grids shared with in-flight snapshots are copied first.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: BlockType) -> bool {
        if !VoxelGrid::in_bounds(x, y, z) || self.grid.get(x, y, z) == block {
            return false;
        }
        let changed = Arc::make_mut(&mut self.grid).set(x, y, z, block);
        if changed {
            self.revision += 1;
            self.mesh_state = ChunkState::NotFinished;
        }
        changed
    }

    /// Requests a re-mesh without a content change, e.g. after a neighbour changed.
    /// In-flight mesh results for the old revision become stale.
    pub fn invalidate_mesh(&mut self) {
        self.revision += 1;
        self.mesh_state = ChunkState::NotFinished;
    }

    /// Bumped on every content change; mesh results built from older revisions are stale.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_bumps_revision_and_copies_shared_grid() {
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0, 0));
        chunk.set_grid(Arc::new(VoxelGrid::filled(1)));
        let snapshot = Arc::clone(chunk.grid());
        let rev = chunk.revision();
        assert!(chunk.set_block(3, 3, 3, 0));
        assert_eq!(chunk.revision(), rev + 1);
        assert_eq!(snapshot.get(3, 3, 3), 1);
        assert_eq!(chunk.get_block(3, 3, 3), 0);
        assert!(!chunk.set_block(3, 3, 3, 0));
        assert_eq!(chunk.revision(), rev + 1);
    }

    #[test]
    fn lod_factor_round_trip() {
        for lod in [LodLevel::Regular, LodLevel::One, LodLevel::Two, LodLevel::Three] {
            assert_eq!(LodLevel::from_factor(lod.factor()), Some(lod));
        }
        assert_eq!(LodLevel::from_factor(3), None);
    }
}
