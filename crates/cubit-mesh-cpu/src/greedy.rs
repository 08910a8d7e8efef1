//! Binary greedy mesher: per-slice masks merged into maximal first-fit rectangles.

use cubit_blocks::{AIR, BlockDatabase, BlockType, Face};
use cubit_chunk::{CHUNK_AREA, CHUNK_LENGTH, NeighborView, VoxelGrid};

use crate::ao::{FaceInfo, FaceInfoArena, compute_face_info};
use crate::buffers::ChunkMeshData;
use crate::tables::tangent_axes;
use crate::visibility::should_show_face;

/// One exposed face in a slice mask. Positive `block` faces along +axis, negative along -axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct MaskCell {
    pub block: i32,
    pub info: FaceInfo,
}

impl MaskCell {
    pub const EMPTY: MaskCell = MaskCell {
        block: 0,
        info: FaceInfo::EMPTY,
    };

    #[inline]
    pub fn block_type(&self) -> BlockType {
        self.block.unsigned_abs() as BlockType
    }
}

/// Merges an `n x n` mask (index `v * n + u`) into rectangles.
///
/// Rows are scanned V outer, U inner; each rectangle grows along U first, then
/// along V while the whole row matches. Covered cells are cleared.
pub(crate) fn merge_mask(
    mask: &mut [MaskCell],
    n: usize,
    mut emit: impl FnMut(usize, usize, usize, usize, MaskCell),
) {
    for jv in 0..n {
        let mut iu = 0;
        while iu < n {
            let cell = mask[jv * n + iu];
            if cell.block == 0 {
                iu += 1;
                continue;
            }
            let mut w = 1;
            while iu + w < n && mask[jv * n + iu + w] == cell {
                w += 1;
            }
            let mut h = 1;
            'grow: while jv + h < n {
                for k in 0..w {
                    if mask[(jv + h) * n + iu + k] != cell {
                        break 'grow;
                    }
                }
                h += 1;
            }
            emit(iu, jv, w, h, cell);
            for row in mask[jv * n..(jv + h) * n].chunks_exact_mut(n) {
                row[iu..iu + w].fill(MaskCell::EMPTY);
            }
            iu += w;
        }
    }
}

/// Reusable greedy mesher; holds the AO arena and mask scratch between calls.
pub struct GreedyMesher {
    arena: FaceInfoArena,
    mask: Vec<MaskCell>,
}

impl Default for GreedyMesher {
    fn default() -> Self {
        Self::new()
    }
}

impl GreedyMesher {
    pub fn new() -> Self {
        Self {
            arena: FaceInfoArena::new(),
            mask: vec![MaskCell::EMPTY; CHUNK_AREA],
        }
    }

    pub fn mesh(&mut self, view: &NeighborView<'_>, db: &BlockDatabase) -> ChunkMeshData {
        let mut out = ChunkMeshData::default();
        self.mesh_into(view, db, &mut out);
        out
    }

    /// Meshes the center chunk of `view` into `out`, which is cleared first.
    pub fn mesh_into(
        &mut self,
        view: &NeighborView<'_>,
        db: &BlockDatabase,
        out: &mut ChunkMeshData,
    ) {
        out.clear();
        let Some(center) = view.center() else {
            return;
        };
        if center.is_empty() {
            return;
        }
        self.arena.begin_pass();
        let l = CHUNK_LENGTH;
        for d in 0..3 {
            let (u, v) = tangent_axes(d);
            for back_face in [false, true] {
                let face = Face::from_axis(d, !back_face);
                for s in 0..=l {
                    self.build_mask(view, center, db, face, s);
                    let sign = if back_face { -1 } else { 1 };
                    merge_mask(&mut self.mask, l, |iu, jv, w, h, cell| {
                        debug_assert_eq!(cell.block.signum(), sign);
                        let block = cell.block_type();
                        let mut origin = [0u32; 3];
                        origin[d] = s as u32;
                        origin[u] = iu as u32;
                        origin[v] = jv as u32;
                        out.stream_mut(db.is_transparent(block, face)).push_quad(
                            face,
                            origin,
                            w as u32,
                            h as u32,
                            cell.info.levels(),
                            db.texture_index(block, face),
                        );
                    });
                }
            }
        }
        log::trace!(
            target: "mesh",
            "greedy: {} opaque quads, {} translucent quads",
            out.opaque.quad_count(),
            out.translucent.quad_count()
        );
    }

    /// Fills the mask for the boundary plane at `s` along `face`'s axis.
    ///
    /// Positive faces come from the cell below the plane (`s - 1`), negative faces
    /// from the cell above it (`s`); only cells inside the chunk contribute.
    fn build_mask(
        &mut self,
        view: &NeighborView<'_>,
        center: &VoxelGrid,
        db: &BlockDatabase,
        face: Face,
        s: usize,
    ) {
        let l = CHUNK_LENGTH;
        let d = face.axis();
        let (u, v) = tangent_axes(d);
        let (dx, dy, dz) = face.delta();
        let layer = if face.is_positive() {
            s.checked_sub(1)
        } else {
            Some(s).filter(|s| *s < l)
        };
        let Some(layer) = layer else {
            self.mask.fill(MaskCell::EMPTY);
            return;
        };
        let sign = if face.is_positive() { 1 } else { -1 };
        for jv in 0..l {
            for iu in 0..l {
                let mut p = [0usize; 3];
                p[d] = layer;
                p[u] = iu;
                p[v] = jv;
                let block = center.get_local(p[0], p[1], p[2]);
                let mut cell = MaskCell::EMPTY;
                if block != AIR {
                    let (x, y, z) = (p[0] as i32, p[1] as i32, p[2] as i32);
                    let neighbor = view.get(x + dx, y + dy, z + dz);
                    if should_show_face(db, block, face, neighbor, face.opposite()) {
                        let voxel = VoxelGrid::idx(p[0], p[1], p[2]);
                        let info = self.arena.get_or_compute(voxel, face, || {
                            compute_face_info(view, db, x, y, z, face)
                        });
                        cell = MaskCell {
                            block: sign * block as i32,
                            info,
                        };
                    }
                }
                self.mask[jv * l + iu] = cell;
            }
        }
    }
}
