use cubit_blocks::{AIR, BlockDatabase, Face};
use cubit_chunk::{CHUNK_LENGTH, NeighborView};

use crate::buffers::ChunkMeshData;
use crate::visibility::should_show_face;

/// One unit quad per visible face; no merging and no occlusion.
pub fn generate_naive(view: &NeighborView<'_>, db: &BlockDatabase) -> ChunkMeshData {
    let mut out = ChunkMeshData::default();
    let Some(center) = view.center() else {
        return out;
    };
    if center.is_empty() {
        return out;
    }
    for y in 0..CHUNK_LENGTH {
        for z in 0..CHUNK_LENGTH {
            for x in 0..CHUNK_LENGTH {
                let block = center.get_local(x, y, z);
                if block == AIR {
                    continue;
                }
                let p = [x as i32, y as i32, z as i32];
                for face in Face::ALL {
                    let (dx, dy, dz) = face.delta();
                    let neighbor = view.get(p[0] + dx, p[1] + dy, p[2] + dz);
                    if !should_show_face(db, block, face, neighbor, face.opposite()) {
                        continue;
                    }
                    let mut origin = [x as u32, y as u32, z as u32];
                    if face.is_positive() {
                        origin[face.axis()] += 1;
                    }
                    out.stream_mut(db.is_transparent(block, face)).push_quad(
                        face,
                        origin,
                        1,
                        1,
                        [3; 4],
                        db.texture_index(block, face),
                    );
                }
            }
        }
    }
    out
}
