use cubit_blocks::Face;

use crate::buffers::MeshBuffers;

/// Unit cube at the origin with one quad per face, for item and editor previews.
pub fn generate_block(texture_indices: &[u32; 6]) -> MeshBuffers {
    let mut out = MeshBuffers::default();
    out.reserve_quads(6);
    for face in Face::ALL {
        let mut origin = [0u32; 3];
        if face.is_positive() {
            origin[face.axis()] = 1;
        }
        out.push_quad(face, origin, 1, 1, [3; 4], texture_indices[face.index()]);
    }
    out
}
