use std::sync::Arc;

use cubit_blocks::{AIR, BlockType};

use crate::{CENTER_SLOT, CHUNK_LENGTH, ChunkCoord, VoxelGrid};

/// Index of the chunk at offset `(dx, dy, dz)` (each in -1..=1) in a 27-entry neighbor array.
#[inline]
pub const fn neighbor_slot(dx: i32, dy: i32, dz: i32) -> usize {
    (9 * (dy + 1) + 3 * (dz + 1) + (dx + 1)) as usize
}

/// Borrowed 3x3x3 neighborhood around a chunk. Missing neighbors read as air.
#[derive(Clone, Copy, Debug)]
pub struct NeighborView<'a> {
    slots: [Option<&'a VoxelGrid>; 27],
}

impl<'a> NeighborView<'a> {
    /// View with only the center chunk present.
    pub fn new(center: &'a VoxelGrid) -> Self {
        let mut slots = [None; 27];
        slots[CENTER_SLOT] = Some(center);
        Self { slots }
    }

    #[inline]
    pub fn from_slots(slots: [Option<&'a VoxelGrid>; 27]) -> Self {
        Self { slots }
    }

    pub fn with_neighbor(mut self, dx: i32, dy: i32, dz: i32, grid: &'a VoxelGrid) -> Self {
        self.slots[neighbor_slot(dx, dy, dz)] = Some(grid);
        self
    }

    #[inline]
    pub fn center(&self) -> Option<&'a VoxelGrid> {
        self.slots[CENTER_SLOT]
    }

    #[inline]
    pub fn slot(&self, index: usize) -> Option<&'a VoxelGrid> {
        self.slots.get(index).copied().flatten()
    }

    /// Block at center-local coordinates, which may spill one chunk over in any direction.
    #[inline]
    pub fn get(&self, x: i32, y: i32, z: i32) -> BlockType {
        let l = CHUNK_LENGTH as i32;
        let (ox, oy, oz) = (x.div_euclid(l), y.div_euclid(l), z.div_euclid(l));
        if ox.abs() > 1 || oy.abs() > 1 || oz.abs() > 1 {
            return AIR;
        }
        match self.slots[neighbor_slot(ox, oy, oz)] {
            Some(grid) => grid.get_local(
                x.rem_euclid(l) as usize,
                y.rem_euclid(l) as usize,
                z.rem_euclid(l) as usize,
            ),
            None => AIR,
        }
    }
}

/// Owned neighborhood captured under the chunk map lock and handed to a worker.
#[derive(Clone, Debug, Default)]
pub struct NeighborSnapshot {
    grids: [Option<Arc<VoxelGrid>>; 27],
}

impl NeighborSnapshot {
    pub fn new(center: Arc<VoxelGrid>) -> Self {
        let mut snap = Self::default();
        snap.grids[CENTER_SLOT] = Some(center);
        snap
    }

    /// Collects the neighborhood of `center` through `lookup`.
    pub fn gather(
        center: ChunkCoord,
        mut lookup: impl FnMut(ChunkCoord) -> Option<Arc<VoxelGrid>>,
    ) -> Self {
        let mut snap = Self::default();
        for dy in -1..=1 {
            for dz in -1..=1 {
                for dx in -1..=1 {
                    snap.grids[neighbor_slot(dx, dy, dz)] = lookup(center.offset(dx, dy, dz));
                }
            }
        }
        snap
    }

    pub fn set(&mut self, dx: i32, dy: i32, dz: i32, grid: Option<Arc<VoxelGrid>>) {
        self.grids[neighbor_slot(dx, dy, dz)] = grid;
    }

    #[inline]
    pub fn center(&self) -> Option<&VoxelGrid> {
        self.grids[CENTER_SLOT].as_deref()
    }

    pub fn view(&self) -> NeighborView<'_> {
        NeighborView::from_slots(std::array::from_fn(|i| self.grids[i].as_deref()))
    }
}

/// A vertical column of chunks, bottom section first, meshed together at reduced resolution.
#[derive(Clone, Debug, Default)]
pub struct ChunkStack {
    sections: Vec<Option<Arc<VoxelGrid>>>,
}

impl ChunkStack {
    pub fn new(sections: Vec<Option<Arc<VoxelGrid>>>) -> Self {
        Self { sections }
    }

    /// Collects `count` sections of the column at `(cx, cz)` starting at `cy = 0`.
    pub fn gather(
        column: ChunkCoord,
        count: usize,
        mut lookup: impl FnMut(ChunkCoord) -> Option<Arc<VoxelGrid>>,
    ) -> Self {
        let sections = (0..count)
            .map(|cy| lookup(column.with_y(cy as i32)))
            .collect();
        Self { sections }
    }

    #[inline]
    pub fn num_sections(&self) -> usize {
        self.sections.len()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.sections.len() * CHUNK_LENGTH
    }

    #[inline]
    pub fn section(&self, index: usize) -> Option<&VoxelGrid> {
        self.sections.get(index).and_then(|s| s.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.sections
            .iter()
            .all(|s| s.as_ref().is_none_or(|g| g.is_empty()))
    }

    /// Block at column-local coordinates; air outside the column.
    #[inline]
    pub fn get(&self, x: i32, y: i32, z: i32) -> BlockType {
        let l = CHUNK_LENGTH as i32;
        if y < 0 || y >= self.height() as i32 {
            return AIR;
        }
        match self.section((y / l) as usize) {
            Some(grid) => grid.get(x, y % l, z),
            None => AIR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_slot_is_thirteen() {
        assert_eq!(neighbor_slot(0, 0, 0), CENTER_SLOT);
        assert_eq!(neighbor_slot(-1, -1, -1), 0);
        assert_eq!(neighbor_slot(1, 1, 1), 26);
    }

    #[test]
    fn spill_reads_neighbor() {
        let center = VoxelGrid::new();
        let mut east = VoxelGrid::new();
        east.set(0, 4, 5, 9);
        let view = NeighborView::new(&center).with_neighbor(1, 0, 0, &east);
        assert_eq!(view.get(32, 4, 5), 9);
        assert_eq!(view.get(-1, 4, 5), AIR);
        assert_eq!(view.get(64, 4, 5), AIR);
    }

    #[test]
    fn stack_maps_height_to_sections() {
        let mut top = VoxelGrid::new();
        top.set(1, 0, 1, 4);
        let stack = ChunkStack::new(vec![None, Some(Arc::new(top))]);
        assert_eq!(stack.height(), 64);
        assert_eq!(stack.get(1, 32, 1), 4);
        assert_eq!(stack.get(1, 0, 1), AIR);
        assert_eq!(stack.get(1, 64, 1), AIR);
        assert!(!stack.is_empty());
    }
}
