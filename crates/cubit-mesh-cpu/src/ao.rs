//! Per-corner ambient occlusion and the per-pass face info arena.

use cubit_blocks::{BlockDatabase, Face};
use cubit_chunk::{CHUNK_VOLUME, NeighborView};

use crate::tables::AO_OFFSETS;

/// Four 2-bit corner AO levels plus an initialized flag; the greedy merge key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FaceInfo {
    packed: u8,
    initialized: bool,
}

impl FaceInfo {
    /// Uninitialized info carried by mask cells without a face.
    pub const EMPTY: FaceInfo = FaceInfo {
        packed: 0,
        initialized: false,
    };

    #[inline]
    pub fn new(levels: [u8; 4]) -> Self {
        debug_assert!(levels.iter().all(|l| *l <= 3));
        let packed = levels[0] | (levels[1] << 2) | (levels[2] << 4) | (levels[3] << 6);
        Self {
            packed,
            initialized: true,
        }
    }

    /// Face info for faces drawn without occlusion.
    #[inline]
    pub fn unoccluded() -> Self {
        Self::new([3; 4])
    }

    #[inline]
    pub fn corner(&self, i: usize) -> u8 {
        (self.packed >> (i * 2)) & 3
    }

    #[inline]
    pub fn levels(&self) -> [u8; 4] {
        [self.corner(0), self.corner(1), self.corner(2), self.corner(3)]
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

/// AO for `face` of the voxel at center-local `(x, y, z)`.
///
/// Each corner counts its two edge occluders and one corner occluder; two solid
/// edges force full occlusion regardless of the corner.
pub fn compute_face_info(
    view: &NeighborView<'_>,
    db: &BlockDatabase,
    x: i32,
    y: i32,
    z: i32,
    face: Face,
) -> FaceInfo {
    let mut levels = [3u8; 4];
    for (level, occluders) in levels.iter_mut().zip(AO_OFFSETS[face.index()].iter()) {
        let solid = |o: &[i32; 3]| db.occludes(view.get(x + o[0], y + o[1], z + o[2]));
        let [edge1, corner, edge2] = occluders;
        let (e1, c, e2) = (solid(edge1), solid(corner), solid(edge2));
        *level = if e1 && e2 {
            0
        } else {
            3 - (e1 as u8 + c as u8 + e2 as u8)
        };
    }
    FaceInfo::new(levels)
}

/// Dense `(voxel, face)` memo, invalidated per meshing pass by bumping an epoch.
#[derive(Clone, Debug)]
pub struct FaceInfoArena {
    entries: Vec<FaceInfo>,
    stamps: Vec<u32>,
    epoch: u32,
}

impl Default for FaceInfoArena {
    fn default() -> Self {
        Self::new()
    }
}

impl FaceInfoArena {
    pub fn new() -> Self {
        Self {
            entries: vec![FaceInfo::default(); CHUNK_VOLUME * 6],
            stamps: vec![0; CHUNK_VOLUME * 6],
            epoch: 0,
        }
    }

    /// Starts a new pass; everything memoized before is forgotten.
    pub fn begin_pass(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        if self.epoch == 0 {
            self.stamps.fill(0);
            self.epoch = 1;
        }
    }

    #[inline]
    pub fn get_or_compute(
        &mut self,
        voxel: usize,
        face: Face,
        compute: impl FnOnce() -> FaceInfo,
    ) -> FaceInfo {
        let i = voxel * 6 + face.index();
        if self.stamps[i] != self.epoch {
            self.entries[i] = compute();
            self.stamps[i] = self.epoch;
        }
        self.entries[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubit_chunk::VoxelGrid;

    #[test]
    fn open_face_is_unoccluded() {
        let db = BlockDatabase::from_entries(vec![("stone".into(), Default::default())]);
        let mut grid = VoxelGrid::new();
        grid.set(5, 5, 5, 1);
        let view = NeighborView::new(&grid);
        for face in Face::ALL {
            assert_eq!(compute_face_info(&view, &db, 5, 5, 5, face).levels(), [3; 4]);
        }
    }

    #[test]
    fn single_edge_and_corner() {
        let db = BlockDatabase::from_entries(vec![("stone".into(), Default::default())]);
        let mut grid = VoxelGrid::new();
        grid.set(5, 5, 5, 1);
        // block on the +y face plane, one step along -z (the u axis of +y faces)
        grid.set(5, 6, 4, 1);
        let view = NeighborView::new(&grid);
        let info = compute_face_info(&view, &db, 5, 5, 5, Face::PosY);
        // corners with du = 0 see it as an edge occluder
        assert_eq!(info.levels(), [2, 3, 3, 2]);
        // a diagonal block only darkens one corner
        grid.set(5, 6, 4, 0);
        grid.set(4, 6, 4, 1);
        let view = NeighborView::new(&grid);
        let info = compute_face_info(&view, &db, 5, 5, 5, Face::PosY);
        assert_eq!(info.levels(), [2, 3, 3, 3]);
    }

    #[test]
    fn arena_memoizes_within_pass() {
        let mut arena = FaceInfoArena::new();
        arena.begin_pass();
        let a = arena.get_or_compute(10, Face::PosX, || FaceInfo::new([1, 2, 3, 0]));
        let b = arena.get_or_compute(10, Face::PosX, || FaceInfo::new([3; 4]));
        assert_eq!(a, b);
        arena.begin_pass();
        let c = arena.get_or_compute(10, Face::PosX, || FaceInfo::new([3; 4]));
        assert_eq!(c.levels(), [3; 4]);
        assert!(c.is_initialized());
        assert!(!FaceInfo::default().is_initialized());
    }
}
