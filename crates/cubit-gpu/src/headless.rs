//! Host-memory backend. Buffers live in `Vec<u8>`s, the cull pass runs on the
//! CPU with the same predicate as the compute shader, and every call is logged
//! so tests can assert ordering.

use bytemuck::{Pod, Zeroable};
use cubit_geom::{Aabb, Frustum, Plane, Vec3};

use crate::backend::{BufferId, CullDispatch, GpuBackend, IndirectDraw};
use crate::gpu_types::{
    ChunkDrawInfo, CullParams, DrawElementsIndirectCommand, StaticChunkDrawCmdUniform,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendCall {
    CreateBuffer { id: BufferId, capacity: u64 },
    ResizeBuffer { id: BufferId, capacity: u64 },
    Upload { id: BufferId, offset: u64, len: usize },
    DispatchCull { commands: BufferId, num_draws: u32 },
    MemoryBarrier,
    MultiDrawIndirectCount {
        commands: BufferId,
        max_draws: u32,
        drawn: u32,
    },
    MultiDrawIndirect { commands: BufferId, draw_count: u32 },
}

#[derive(Default)]
struct HostBuffer {
    capacity: u64,
    // Grows lazily up to `capacity`; unwritten bytes read as zero.
    data: Vec<u8>,
}

#[derive(Default)]
pub struct HeadlessBackend {
    buffers: Vec<HostBuffer>,
    calls: Vec<BackendCall>,
    drawn_commands: Vec<DrawElementsIndirectCommand>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<BackendCall> {
        std::mem::take(&mut self.calls)
    }

    /// Commands consumed by draw calls since the last [`Self::take_drawn`].
    pub fn take_drawn(&mut self) -> Vec<DrawElementsIndirectCommand> {
        std::mem::take(&mut self.drawn_commands)
    }

    pub fn capacity(&self, id: BufferId) -> u64 {
        self.buffers.get(id.0 as usize).map_or(0, |b| b.capacity)
    }

    /// Bytes written so far. Trailing never-written bytes are not included.
    pub fn buffer(&self, id: BufferId) -> &[u8] {
        self.buffers
            .get(id.0 as usize)
            .map_or(&[][..], |b| &b.data[..])
    }

    /// Reads `count` values of `T` starting at byte `offset`; unwritten bytes read as zero.
    pub fn read<T: Pod>(&self, id: BufferId, offset: u64, count: usize) -> Vec<T> {
        let size = std::mem::size_of::<T>();
        let bytes = self.buffer(id);
        (0..count)
            .map(|i| {
                let start = offset as usize + i * size;
                let mut raw = vec![0u8; size];
                if start < bytes.len() {
                    let end = (start + size).min(bytes.len());
                    raw[..end - start].copy_from_slice(&bytes[start..end]);
                }
                bytemuck::pod_read_unaligned(&raw)
            })
            .collect()
    }

    fn write(&mut self, id: BufferId, offset: u64, bytes: &[u8]) {
        let Some(buf) = self.buffers.get_mut(id.0 as usize) else {
            log::error!(target: "batch", "upload to unknown buffer {:?}", id);
            return;
        };
        let end = offset + bytes.len() as u64;
        if end > buf.capacity {
            log::error!(
                target: "batch",
                "upload of {} bytes at {} overruns buffer {:?} ({} bytes)",
                bytes.len(),
                offset,
                id,
                buf.capacity
            );
            return;
        }
        if buf.data.len() < end as usize {
            buf.data.resize(end as usize, 0);
        }
        buf.data[offset as usize..end as usize].copy_from_slice(bytes);
    }

    fn read_one<T: Pod + Zeroable>(&self, id: BufferId, offset: u64) -> T {
        self.read::<T>(id, offset, 1)
            .pop()
            .unwrap_or_else(T::zeroed)
    }

    fn record_drawn(&mut self, commands: BufferId, count: u32) {
        let cmds = self.read::<DrawElementsIndirectCommand>(commands, 0, count as usize);
        self.drawn_commands.extend(cmds);
    }
}

fn frustum_from(params: &CullParams) -> Frustum {
    let mut frustum = Frustum::default();
    for (plane, raw) in frustum.planes.iter_mut().zip(params.planes.iter()) {
        *plane = Plane::new(Vec3::new(raw[0], raw[1], raw[2]), raw[3]);
    }
    frustum
}

impl GpuBackend for HeadlessBackend {
    fn create_buffer(&mut self, capacity: u64) -> BufferId {
        let id = BufferId(self.buffers.len() as u32);
        self.buffers.push(HostBuffer {
            capacity,
            data: Vec::new(),
        });
        self.calls.push(BackendCall::CreateBuffer { id, capacity });
        id
    }

    fn resize_buffer(&mut self, id: BufferId, capacity: u64) {
        if let Some(buf) = self.buffers.get_mut(id.0 as usize) {
            buf.capacity = capacity;
            buf.data.clear();
        }
        self.calls.push(BackendCall::ResizeBuffer { id, capacity });
    }

    fn upload_sub_data(&mut self, id: BufferId, offset: u64, bytes: &[u8]) {
        self.write(id, offset, bytes);
        self.calls.push(BackendCall::Upload {
            id,
            offset,
            len: bytes.len(),
        });
    }

    fn dispatch_cull(&mut self, dispatch: &CullDispatch) {
        let params: CullParams = self.read_one(dispatch.params, 0);
        let frustum = frustum_from(&params);
        let eye = Vec3::new(
            params.camera_pos[0],
            params.camera_pos[1],
            params.camera_pos[2],
        );
        let infos = self.read::<ChunkDrawInfo>(dispatch.draw_info, 0, dispatch.num_draws as usize);
        let mut count: u32 = self.read_one(dispatch.count, 0);

        for (i, info) in infos.iter().enumerate() {
            let aabb = Aabb::new(
                Vec3::new(info.aabb_min[0], info.aabb_min[1], info.aabb_min[2]),
                Vec3::new(info.aabb_max[0], info.aabb_max[1], info.aabb_max[2]),
            );
            let visible = params.cull_frustum == 0
                || frustum.accepts(&aabb, eye, params.min_distance, params.max_distance);
            if !visible {
                continue;
            }
            let slot = count as u64;
            let cmd = DrawElementsIndirectCommand {
                count: info.count,
                instance_count: 1,
                first_index: info.first_index,
                base_vertex: info.base_vertex,
                base_instance: i as u32,
            };
            let uniform = StaticChunkDrawCmdUniform { pos: info.aabb_min };
            self.write(
                dispatch.commands,
                slot * std::mem::size_of::<DrawElementsIndirectCommand>() as u64,
                bytemuck::bytes_of(&cmd),
            );
            self.write(
                dispatch.uniforms,
                slot * std::mem::size_of::<StaticChunkDrawCmdUniform>() as u64,
                bytemuck::bytes_of(&uniform),
            );
            count += 1;
        }
        self.write(dispatch.count, 0, bytemuck::bytes_of(&count));
        self.calls.push(BackendCall::DispatchCull {
            commands: dispatch.commands,
            num_draws: dispatch.num_draws,
        });
    }

    fn memory_barrier(&mut self) {
        self.calls.push(BackendCall::MemoryBarrier);
    }

    fn multi_draw_indirect_count(&mut self, draw: &IndirectDraw, count_buffer: BufferId, max_draws: u32) {
        let count: u32 = self.read_one(count_buffer, 0);
        let drawn = count.min(max_draws);
        self.record_drawn(draw.commands, drawn);
        self.calls.push(BackendCall::MultiDrawIndirectCount {
            commands: draw.commands,
            max_draws,
            drawn,
        });
    }

    fn multi_draw_indirect(&mut self, draw: &IndirectDraw, draw_count: u32) {
        self.record_drawn(draw.commands, draw_count);
        self.calls.push(BackendCall::MultiDrawIndirect {
            commands: draw.commands,
            draw_count,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uploads_land_at_offset_and_overruns_are_dropped() {
        let mut gpu = HeadlessBackend::new();
        let id = gpu.create_buffer(16);
        gpu.upload_sub_data(id, 4, &[9, 8, 7]);
        assert_eq!(gpu.buffer(id), &[0, 0, 0, 0, 9, 8, 7]);
        gpu.upload_sub_data(id, 14, &[1, 2, 3]);
        assert_eq!(gpu.buffer(id).len(), 7);
        assert_eq!(gpu.read::<u32>(id, 4, 2), vec![0x0007_0809, 0]);
    }

    #[test]
    fn cull_without_frustum_keeps_every_draw() {
        let mut gpu = HeadlessBackend::new();
        let infos = [
            ChunkDrawInfo {
                aabb_min: [0.0, 0.0, 0.0, 1.0],
                aabb_max: [32.0, 32.0, 32.0, 0.0],
                first_index: 0,
                count: 6,
                base_vertex: 0,
                _pad: 0,
            },
            ChunkDrawInfo {
                aabb_min: [32.0, 0.0, 0.0, 2.0],
                aabb_max: [96.0, 64.0, 64.0, 0.0],
                first_index: 6,
                count: 12,
                base_vertex: 4,
                _pad: 0,
            },
        ];
        let info_buf = gpu.create_buffer(96);
        let params_buf = gpu.create_buffer(128);
        let cmds = gpu.create_buffer(40);
        let unis = gpu.create_buffer(32);
        let count = gpu.create_buffer(4);
        gpu.upload_sub_data(info_buf, 0, bytemuck::cast_slice(&infos));
        gpu.upload_sub_data(params_buf, 0, bytemuck::bytes_of(&CullParams::default()));
        gpu.dispatch_cull(&CullDispatch {
            draw_info: info_buf,
            params: params_buf,
            commands: cmds,
            uniforms: unis,
            count,
            num_draws: 2,
        });
        assert_eq!(gpu.read::<u32>(count, 0, 1), vec![2]);
        let out = gpu.read::<DrawElementsIndirectCommand>(cmds, 0, 2);
        assert_eq!(out[1].first_index, 6);
        assert_eq!(out[1].base_vertex, 4);
        assert_eq!(out[1].base_instance, 1);
        let pos = gpu.read::<StaticChunkDrawCmdUniform>(unis, 0, 2);
        assert_eq!(pos[1].pos, [32.0, 0.0, 0.0, 2.0]);
    }
}
