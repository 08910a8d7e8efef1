//! GPU-side mesh storage: sub-allocated shared buffers, mesh handles and
//! GPU-culled indirect multi-draw batching behind a narrow backend trait.
#![forbid(unsafe_code)]

pub mod allocator;
pub mod backend;
pub mod batcher;
pub mod config;
pub mod error;
pub mod gpu_types;
pub mod headless;
pub mod registry;

pub use allocator::{Allocation, AllocatorStats, GpuSubAllocator, SubAllocation};
pub use backend::{BufferId, CullDispatch, GpuBackend, IndirectDraw};
pub use batcher::{DrawBatcher, FrameParams, FrameStats};
pub use config::GpuConfig;
pub use error::GpuError;
pub use gpu_types::{
    ChunkDrawCmdUniform, ChunkDrawInfo, CullParams, DrawElementsIndirectCommand,
    StaticChunkDrawCmdUniform,
};
pub use headless::{BackendCall, HeadlessBackend};
pub use registry::{ChunkMesh, ChunkMeshRegistry, MeshClass, MeshHandle};
