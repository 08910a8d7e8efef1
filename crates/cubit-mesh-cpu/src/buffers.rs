use cubit_blocks::Face;

use crate::tables::{corners, quad_indices, tangent_axes};
use crate::vertex::ChunkVertex;

/// Vertex and index stream for one draw.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MeshBuffers {
    pub vertices: Vec<ChunkVertex>,
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[inline]
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    pub fn reserve_quads(&mut self, quads: usize) {
        self.vertices.reserve(quads * 4);
        self.indices.reserve(quads * 6);
    }

    /// Appends a `w x h` quad on `face` whose minimum corner sits at `origin`.
    ///
    /// `origin[face.axis()]` is the plane coordinate. `ao` is indexed by corner in
    /// [`corners`] order and also picks the triangle split.
    pub fn push_quad(
        &mut self,
        face: Face,
        origin: [u32; 3],
        w: u32,
        h: u32,
        ao: [u8; 4],
        texture: u32,
    ) {
        let base = self.vertices.len() as u32;
        let (u, v) = tangent_axes(face.axis());
        for (k, &(du, dv)) in corners(face).iter().enumerate() {
            let mut pos = origin;
            pos[u] += du * w;
            pos[v] += dv * h;
            self.vertices
                .push(ChunkVertex::new(pos, [du * w, dv * h], ao[k], texture, face));
        }
        let flip = ao[0] as u32 + ao[2] as u32 > ao[1] as u32 + ao[3] as u32;
        self.indices
            .extend(quad_indices(flip).iter().map(|i| base + i));
    }
}

/// Output of meshing one chunk, split by transparency.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkMeshData {
    pub opaque: MeshBuffers,
    pub translucent: MeshBuffers,
}

impl ChunkMeshData {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty() && self.translucent.is_empty()
    }

    pub fn clear(&mut self) {
        self.opaque.clear();
        self.translucent.clear();
    }

    #[inline]
    pub fn quad_count(&self) -> usize {
        self.opaque.quad_count() + self.translucent.quad_count()
    }

    /// Selects the stream a face of the given transparency goes to.
    #[inline]
    pub fn stream_mut(&mut self, transparent: bool) -> &mut MeshBuffers {
        if transparent {
            &mut self.translucent
        } else {
            &mut self.opaque
        }
    }
}
