//! Per-class shared vertex/index storage for chunk meshes.
//!
//! Each [`MeshClass`] owns one vertex and one index sub-allocator. The vertex
//! allocation carries the [`ChunkDrawInfo`] the cull pass consumes, and a
//! parallel table keeps a ready-made indirect command per handle for the
//! CPU-built dynamic path.

use crossbeam_channel::{Receiver, Sender, unbounded};
use cubit_geom::Aabb;
use cubit_mesh_cpu::{ChunkVertex, MeshBuffers};
use hashbrown::HashMap;

use crate::allocator::{AllocatorStats, GpuSubAllocator};
use crate::backend::{BufferId, GpuBackend};
use crate::config::GpuConfig;
use crate::error::GpuError;
use crate::gpu_types::{ChunkDrawInfo, DrawElementsIndirectCommand};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MeshClass {
    OpaqueStatic,
    TranslucentStatic,
    LodStatic,
    Dynamic,
}

impl MeshClass {
    pub const ALL: [MeshClass; 4] = [
        MeshClass::OpaqueStatic,
        MeshClass::TranslucentStatic,
        MeshClass::LodStatic,
        MeshClass::Dynamic,
    ];
    /// Classes drawn through the GPU cull path, in draw order.
    pub const STATIC: [MeshClass; 3] = [
        MeshClass::OpaqueStatic,
        MeshClass::LodStatic,
        MeshClass::TranslucentStatic,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn is_static(self) -> bool {
        !matches!(self, MeshClass::Dynamic)
    }
}

/// Raw mesh handle: the class plus the vertex allocation's handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshHandle {
    pub class: MeshClass,
    pub id: u32,
}

#[derive(Clone, Copy, Debug)]
struct MeshRecord {
    index_handle: u32,
    command: DrawElementsIndirectCommand,
}

struct ClassStorage {
    vertices: GpuSubAllocator<ChunkDrawInfo>,
    indices: GpuSubAllocator<()>,
    meshes: HashMap<u32, MeshRecord>,
    dirty: bool,
}

impl ClassStorage {
    fn new(backend: &mut impl GpuBackend, cfg: &GpuConfig) -> Result<Self, GpuError> {
        Ok(Self {
            vertices: GpuSubAllocator::new(backend, cfg.vertex_buffer_bytes, cfg.alignment)?,
            indices: GpuSubAllocator::new(backend, cfg.index_buffer_bytes, cfg.alignment)?,
            meshes: HashMap::new(),
            dirty: false,
        })
    }
}

/// Owning guard for a registered mesh. Dropping it queues the mesh for release;
/// the registry frees queued meshes in [`ChunkMeshRegistry::collect_released`].
#[derive(Debug)]
pub struct ChunkMesh {
    handle: MeshHandle,
    release: Sender<MeshHandle>,
}

impl ChunkMesh {
    #[inline]
    pub fn handle(&self) -> MeshHandle {
        self.handle
    }
}

impl Drop for ChunkMesh {
    fn drop(&mut self) {
        // Receiver only disappears with the registry, which frees everything anyway.
        let _ = self.release.send(self.handle);
    }
}

pub struct ChunkMeshRegistry {
    classes: [ClassStorage; 4],
    release_tx: Sender<MeshHandle>,
    release_rx: Receiver<MeshHandle>,
}

impl ChunkMeshRegistry {
    pub fn new(backend: &mut impl GpuBackend, cfg: &GpuConfig) -> Result<Self, GpuError> {
        let classes = [
            ClassStorage::new(backend, cfg)?,
            ClassStorage::new(backend, cfg)?,
            ClassStorage::new(backend, cfg)?,
            ClassStorage::new(backend, cfg)?,
        ];
        let (release_tx, release_rx) = unbounded();
        Ok(Self {
            classes,
            release_tx,
            release_rx,
        })
    }

    /// Uploads a mesh into `class`. `aabb` is the world-space bound used for
    /// culling and `scale` the vertex scale (1 for regular chunks, the LOD
    /// factor for coarse sections). Returns `None` for empty input or when
    /// either buffer is out of space.
    pub fn allocate(
        &mut self,
        backend: &mut impl GpuBackend,
        class: MeshClass,
        vertices: &[ChunkVertex],
        indices: &[u32],
        aabb: Aabb,
        scale: f32,
    ) -> Option<MeshHandle> {
        if vertices.is_empty() || indices.is_empty() {
            return None;
        }
        let storage = &mut self.classes[class.index()];
        let ebo = storage
            .indices
            .allocate(backend, bytemuck::cast_slice(indices), None)?;
        let Some(vbo) = storage
            .vertices
            .allocate(backend, bytemuck::cast_slice(vertices), None)
        else {
            storage.indices.free(ebo.handle);
            return None;
        };

        let first_index = ebo.offset / std::mem::size_of::<u32>() as u32;
        let base_vertex = (vbo.offset / std::mem::size_of::<ChunkVertex>() as u32) as i32;
        let count = indices.len() as u32;
        let info = ChunkDrawInfo {
            aabb_min: aabb.min.extend(scale),
            aabb_max: aabb.max.extend(0.0),
            first_index,
            count,
            base_vertex,
            _pad: 0,
        };
        storage.vertices.set_user_data(vbo.handle, info);
        storage.meshes.insert(
            vbo.handle,
            MeshRecord {
                index_handle: ebo.handle,
                command: DrawElementsIndirectCommand {
                    count,
                    instance_count: 1,
                    first_index,
                    base_vertex,
                    base_instance: 0,
                },
            },
        );
        storage.dirty = true;
        log::trace!(
            target: "alloc",
            "{:?} mesh {} ({} vertices, {} indices)",
            class,
            vbo.handle,
            vertices.len(),
            count
        );
        Some(MeshHandle {
            class,
            id: vbo.handle,
        })
    }

    pub fn allocate_mesh(
        &mut self,
        backend: &mut impl GpuBackend,
        class: MeshClass,
        mesh: &MeshBuffers,
        aabb: Aabb,
        scale: f32,
    ) -> Option<MeshHandle> {
        self.allocate(backend, class, &mesh.vertices, &mesh.indices, aabb, scale)
    }

    /// Wraps a raw handle in an owning guard. The caller gives up the right to
    /// call [`Self::free`] on it.
    pub fn adopt(&self, handle: MeshHandle) -> ChunkMesh {
        ChunkMesh {
            handle,
            release: self.release_tx.clone(),
        }
    }

    pub fn free(&mut self, handle: MeshHandle) -> bool {
        let storage = &mut self.classes[handle.class.index()];
        let Some(record) = storage.meshes.remove(&handle.id) else {
            log::error!(target: "alloc", "free of unknown mesh {:?}", handle);
            return false;
        };
        storage.vertices.free(handle.id);
        storage.indices.free(record.index_handle);
        storage.dirty = true;
        true
    }

    /// Frees every mesh whose guard was dropped since the last call.
    pub fn collect_released(&mut self) -> usize {
        let released: Vec<MeshHandle> = self.release_rx.try_iter().collect();
        released.into_iter().filter(|h| self.free(*h)).count()
    }

    pub fn contains(&self, handle: MeshHandle) -> bool {
        self.classes[handle.class.index()]
            .meshes
            .contains_key(&handle.id)
    }

    pub fn draw_command(&self, handle: MeshHandle) -> Option<DrawElementsIndirectCommand> {
        self.classes[handle.class.index()]
            .meshes
            .get(&handle.id)
            .map(|r| r.command)
    }

    /// Cull records for every live mesh of `class`, in vertex-buffer order.
    pub fn draw_infos(&self, class: MeshClass) -> Vec<ChunkDrawInfo> {
        self.classes[class.index()]
            .vertices
            .live()
            .filter_map(|a| a.user_data)
            .collect()
    }

    #[inline]
    pub fn is_dirty(&self, class: MeshClass) -> bool {
        self.classes[class.index()].dirty
    }

    #[inline]
    pub fn clear_dirty(&mut self, class: MeshClass) {
        self.classes[class.index()].dirty = false;
    }

    #[inline]
    pub fn num_meshes(&self, class: MeshClass) -> usize {
        self.classes[class.index()].meshes.len()
    }

    #[inline]
    pub fn vertex_buffer(&self, class: MeshClass) -> BufferId {
        self.classes[class.index()].vertices.buffer()
    }

    #[inline]
    pub fn index_buffer(&self, class: MeshClass) -> BufferId {
        self.classes[class.index()].indices.buffer()
    }

    /// (vertex, index) allocator statistics for `class`.
    pub fn stats(&self, class: MeshClass) -> (AllocatorStats, AllocatorStats) {
        let storage = &self.classes[class.index()];
        (storage.vertices.stats(), storage.indices.stats())
    }
}
