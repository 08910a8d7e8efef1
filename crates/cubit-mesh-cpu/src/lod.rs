//! Reduced-resolution greedy meshing over a vertical chunk stack.

use cubit_blocks::{AIR, BlockDatabase, BlockType, Face};
use cubit_chunk::{CHUNK_LENGTH, ChunkCoord, ChunkStack, LodLevel};
use cubit_geom::{Mat4, Vec3};

use crate::ao::FaceInfo;
use crate::buffers::MeshBuffers;
use crate::greedy::{MaskCell, merge_mask};
use crate::tables::tangent_axes;
use crate::vertex::pack_rgb;
use crate::visibility::should_show_face_lod;

/// Mesh of one stack section, in coarse units local to the section.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LodSection {
    pub section: usize,
    pub factor: usize,
    pub mesh: MeshBuffers,
}

impl LodSection {
    /// Model transform placing this section of `column` in the world.
    pub fn transform(&self, column: ChunkCoord) -> Mat4 {
        let [ox, _, oz] = column.origin();
        let oy = (self.section * CHUNK_LENGTH) as f32;
        Mat4::scale_translation(self.factor as f32, Vec3::new(ox as f32, oy, oz as f32))
    }
}

/// Downsamples a stack by an integer factor and greedy-meshes each section.
///
/// Vertices carry the face's average colour in place of a texture index.
#[derive(Default)]
pub struct LodMesher {
    coarse: Vec<BlockType>,
    mask: Vec<MaskCell>,
    scratch: Vec<BlockType>,
}

impl LodMesher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mesh(
        &mut self,
        stack: &ChunkStack,
        level: LodLevel,
        db: &BlockDatabase,
    ) -> Vec<LodSection> {
        let f = level.factor();
        debug_assert!(CHUNK_LENGTH % f == 0);
        let n = CHUNK_LENGTH / f;
        let ny = stack.height() / f;
        self.downsample(stack, f, n, ny);
        self.mask.clear();
        self.mask.resize(n * n, MaskCell::EMPTY);

        let mut sections = Vec::new();
        for section in 0..stack.num_sections() {
            if stack.section(section).is_none_or(|g| g.is_empty()) {
                continue;
            }
            let mesh = self.mesh_section(section * n, n, ny, db);
            if !mesh.is_empty() {
                sections.push(LodSection {
                    section,
                    factor: f,
                    mesh,
                });
            }
        }
        log::trace!(target: "mesh", "lod x{}: {} sections", f, sections.len());
        sections
    }

    fn downsample(&mut self, stack: &ChunkStack, f: usize, n: usize, ny: usize) {
        self.coarse.clear();
        self.coarse.resize(n * n * ny, AIR);
        for cy in 0..ny {
            for cz in 0..n {
                for cx in 0..n {
                    self.scratch.clear();
                    for dy in 0..f {
                        for dz in 0..f {
                            for dx in 0..f {
                                let b = stack.get(
                                    (cx * f + dx) as i32,
                                    (cy * f + dy) as i32,
                                    (cz * f + dz) as i32,
                                );
                                if b != AIR {
                                    self.scratch.push(b);
                                }
                            }
                        }
                    }
                    self.coarse[(cy * n + cz) * n + cx] = dominant_block(&mut self.scratch);
                }
            }
        }
    }

    fn mesh_section(&mut self, y0: usize, n: usize, ny: usize, db: &BlockDatabase) -> MeshBuffers {
        let Self { coarse, mask, .. } = self;
        let get = |x: i32, y: i32, z: i32| -> BlockType {
            let (ni, nyi) = (n as i32, ny as i32);
            if x < 0 || z < 0 || y < 0 || x >= ni || z >= ni || y >= nyi {
                return AIR;
            }
            coarse[((y as usize) * n + z as usize) * n + x as usize]
        };
        let mut out = MeshBuffers::default();
        for d in 0..3 {
            let (u, v) = tangent_axes(d);
            for back_face in [false, true] {
                let face = Face::from_axis(d, !back_face);
                let (dx, dy, dz) = face.delta();
                let sign = if back_face { -1 } else { 1 };
                for s in 0..=n {
                    let layer = if back_face {
                        Some(s).filter(|s| *s < n)
                    } else {
                        s.checked_sub(1)
                    };
                    for jv in 0..n {
                        for iu in 0..n {
                            let mut cell = MaskCell::EMPTY;
                            if let Some(layer) = layer {
                                let mut p = [0usize; 3];
                                p[d] = layer;
                                p[u] = iu;
                                p[v] = jv;
                                let (x, y, z) = (p[0] as i32, (p[1] + y0) as i32, p[2] as i32);
                                let block = get(x, y, z);
                                if should_show_face_lod(block, get(x + dx, y + dy, z + dz)) {
                                    cell = MaskCell {
                                        block: sign * block as i32,
                                        info: FaceInfo::unoccluded(),
                                    };
                                }
                            }
                            mask[jv * n + iu] = cell;
                        }
                    }
                    merge_mask(mask, n, |iu, jv, w, h, cell| {
                        let block = cell.block_type();
                        let mut origin = [0u32; 3];
                        origin[d] = s as u32;
                        origin[u] = iu as u32;
                        origin[v] = jv as u32;
                        out.push_quad(
                            face,
                            origin,
                            w as u32,
                            h as u32,
                            cell.info.levels(),
                            pack_rgb(db.avg_color(block, face)),
                        );
                    });
                }
            }
        }
        out
    }
}

/// Most frequent block of a coarse cell; ties go to the lower id, empty cells are air.
fn dominant_block(blocks: &mut [BlockType]) -> BlockType {
    blocks.sort_unstable();
    let mut best = AIR;
    let mut best_count = 0;
    for run in blocks.chunk_by(|a, b| a == b) {
        if run.len() > best_count {
            best = run[0];
            best_count = run.len();
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominant_prefers_count_then_low_id() {
        assert_eq!(dominant_block(&mut [3, 1, 3, 2]), 3);
        assert_eq!(dominant_block(&mut [5, 2, 2, 5]), 2);
        assert_eq!(dominant_block(&mut []), AIR);
    }
}
