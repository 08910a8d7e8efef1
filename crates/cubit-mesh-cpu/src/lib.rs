//! CPU meshing crate: greedy, naive, single-block and LOD meshers.
#![forbid(unsafe_code)]

pub mod ao;
mod block;
pub mod buffers;
pub mod greedy;
pub mod lod;
mod naive;
pub mod tables;
pub mod vertex;
pub mod visibility;

pub use ao::{FaceInfo, FaceInfoArena, compute_face_info};
pub use block::generate_block;
pub use buffers::{ChunkMeshData, MeshBuffers};
pub use greedy::GreedyMesher;
pub use lod::{LodMesher, LodSection};
pub use naive::generate_naive;
pub use vertex::ChunkVertex;
pub use visibility::{should_show_face, should_show_face_lod};
