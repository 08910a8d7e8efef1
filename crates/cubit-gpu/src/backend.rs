//! The graphics API surface the mesh storage and batcher rely on.

/// Opaque handle to a GPU buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u32);

/// Buffers bound for one cull dispatch over `num_draws` [`crate::ChunkDrawInfo`] records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CullDispatch {
    pub draw_info: BufferId,
    pub params: BufferId,
    /// Receives surviving [`crate::DrawElementsIndirectCommand`]s.
    pub commands: BufferId,
    /// Receives a [`crate::StaticChunkDrawCmdUniform`] per survivor.
    pub uniforms: BufferId,
    /// Append counter; the first u32 is the survivor count.
    pub count: BufferId,
    pub num_draws: u32,
}

/// Buffers one indirect multi-draw reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndirectDraw {
    pub vertices: BufferId,
    pub indices: BufferId,
    pub commands: BufferId,
    pub uniforms: BufferId,
}

/// Minimal graphics backend. All calls happen on the thread owning the context.
pub trait GpuBackend {
    fn create_buffer(&mut self, capacity: u64) -> BufferId;
    /// Reallocates a buffer; previous contents are undefined afterwards.
    fn resize_buffer(&mut self, id: BufferId, capacity: u64);
    fn upload_sub_data(&mut self, id: BufferId, offset: u64, bytes: &[u8]);
    fn dispatch_cull(&mut self, dispatch: &CullDispatch);
    /// Makes shader storage writes visible to later indirect reads.
    fn memory_barrier(&mut self);
    /// Draws `min(count, max_draws)` commands, `count` being read from `count_buffer` on the GPU.
    fn multi_draw_indirect_count(&mut self, draw: &IndirectDraw, count_buffer: BufferId, max_draws: u32);
    fn multi_draw_indirect(&mut self, draw: &IndirectDraw, draw_count: u32);
}
