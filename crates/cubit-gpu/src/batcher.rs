//! Per-frame draw submission.
//!
//! Static classes are culled on the GPU: the cull pass reads every mesh's
//! [`ChunkDrawInfo`], appends survivors to a command buffer and an append
//! counter, and a single count-driven multi-draw renders them. Dynamic meshes
//! are submitted per frame and drawn with one CPU-built multi-draw.

use cubit_geom::{Frustum, Mat4, Vec3};

use crate::backend::{BufferId, CullDispatch, GpuBackend, IndirectDraw};
use crate::config::GpuConfig;
use crate::gpu_types::{
    ChunkDrawCmdUniform, ChunkDrawInfo, CullParams, DrawElementsIndirectCommand,
    StaticChunkDrawCmdUniform,
};
use crate::registry::{ChunkMeshRegistry, MeshClass, MeshHandle};

const INFO_SIZE: u64 = std::mem::size_of::<ChunkDrawInfo>() as u64;
const STATIC_UNIFORM_SIZE: u64 = std::mem::size_of::<StaticChunkDrawCmdUniform>() as u64;
const DYNAMIC_UNIFORM_SIZE: u64 = std::mem::size_of::<ChunkDrawCmdUniform>() as u64;
const COMMAND_SIZE: u64 = std::mem::size_of::<DrawElementsIndirectCommand>() as u64;

/// Camera inputs for one frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameParams {
    pub view_proj: Mat4,
    pub camera_pos: Vec3,
    pub cull_frustum: bool,
    pub min_distance: f32,
    /// Non-positive disables the far limit.
    pub max_distance: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Static classes whose draw-info buffer was rebuilt this frame.
    pub rebuilt_classes: u32,
    /// Meshes handed to the cull pass.
    pub static_candidates: u32,
    pub cull_dispatches: u32,
    pub dynamic_draws: u32,
    pub draw_calls: u32,
}

struct StaticPass {
    class: MeshClass,
    draw_info: BufferId,
    uniforms: BufferId,
    commands: BufferId,
    count: BufferId,
    capacity: u32,
    num_draws: u32,
}

impl StaticPass {
    fn new(backend: &mut impl GpuBackend, class: MeshClass) -> Self {
        Self {
            class,
            draw_info: backend.create_buffer(INFO_SIZE),
            uniforms: backend.create_buffer(STATIC_UNIFORM_SIZE),
            commands: backend.create_buffer(COMMAND_SIZE),
            count: backend.create_buffer(std::mem::size_of::<u32>() as u64),
            capacity: 1,
            num_draws: 0,
        }
    }

    /// Full re-upload of the class's draw infos; buffers grow to the new count.
    fn rebuild(&mut self, backend: &mut impl GpuBackend, mut infos: Vec<ChunkDrawInfo>, max: u32) {
        if infos.len() > max as usize {
            log::warn!(
                target: "batch",
                "{:?}: {} meshes exceed the {} draw command limit",
                self.class,
                infos.len(),
                max
            );
            infos.truncate(max as usize);
        }
        let n = infos.len() as u32;
        if n > self.capacity {
            backend.resize_buffer(self.draw_info, n as u64 * INFO_SIZE);
            backend.resize_buffer(self.uniforms, n as u64 * STATIC_UNIFORM_SIZE);
            backend.resize_buffer(self.commands, n as u64 * COMMAND_SIZE);
            self.capacity = n;
        }
        if n > 0 {
            backend.upload_sub_data(self.draw_info, 0, bytemuck::cast_slice(&infos));
        }
        self.num_draws = n;
    }
}

pub struct DrawBatcher {
    passes: [StaticPass; 3],
    params: BufferId,
    dynamic_commands: BufferId,
    dynamic_uniforms: BufferId,
    frame_commands: Vec<DrawElementsIndirectCommand>,
    frame_uniforms: Vec<ChunkDrawCmdUniform>,
    max_draw_cmds: u32,
    max_dynamic_draw_cmds: u32,
}

impl DrawBatcher {
    pub fn new(backend: &mut impl GpuBackend, cfg: &GpuConfig) -> Self {
        let [opaque, lod, translucent] = MeshClass::STATIC;
        let passes = [
            StaticPass::new(backend, opaque),
            StaticPass::new(backend, lod),
            StaticPass::new(backend, translucent),
        ];
        let params = backend.create_buffer(std::mem::size_of::<CullParams>() as u64);
        let max_dynamic = cfg.max_dynamic_draw_cmds.max(1) as u64;
        Self {
            passes,
            params,
            dynamic_commands: backend.create_buffer(max_dynamic * COMMAND_SIZE),
            dynamic_uniforms: backend.create_buffer(max_dynamic * DYNAMIC_UNIFORM_SIZE),
            frame_commands: Vec::new(),
            frame_uniforms: Vec::new(),
            max_draw_cmds: cfg.max_draw_cmds,
            max_dynamic_draw_cmds: cfg.max_dynamic_draw_cmds,
        }
    }

    /// Queues a dynamic mesh for this frame with its own model matrix.
    pub fn submit_chunk_draw_command(
        &mut self,
        registry: &ChunkMeshRegistry,
        model: Mat4,
        handle: MeshHandle,
    ) -> bool {
        if handle.class != MeshClass::Dynamic {
            log::warn!(target: "batch", "{:?} is not a dynamic mesh", handle);
            return false;
        }
        let Some(command) = registry.draw_command(handle) else {
            log::warn!(target: "batch", "draw of unknown mesh {:?}", handle);
            return false;
        };
        if self.frame_commands.len() >= self.max_dynamic_draw_cmds as usize {
            log::warn!(target: "batch", "dynamic draw limit {} reached", self.max_dynamic_draw_cmds);
            return false;
        }
        self.frame_commands.push(command);
        self.frame_uniforms.push(ChunkDrawCmdUniform { model: model.cols });
        true
    }

    #[inline]
    pub fn pending_dynamic_draws(&self) -> usize {
        self.frame_commands.len()
    }

    pub fn render(
        &mut self,
        backend: &mut impl GpuBackend,
        registry: &mut ChunkMeshRegistry,
        frame: &FrameParams,
    ) -> FrameStats {
        let mut stats = FrameStats::default();
        let max = self.max_draw_cmds;
        for pass in &mut self.passes {
            if registry.is_dirty(pass.class) {
                pass.rebuild(backend, registry.draw_infos(pass.class), max);
                registry.clear_dirty(pass.class);
                stats.rebuilt_classes += 1;
            }
        }

        if self.passes.iter().any(|p| p.num_draws > 0) {
            let params = CullParams {
                planes: Frustum::from_clip_matrix(&frame.view_proj).to_arrays(),
                camera_pos: frame.camera_pos.extend(1.0),
                min_distance: frame.min_distance,
                max_distance: frame.max_distance,
                cull_frustum: frame.cull_frustum as u32,
                _pad: 0,
            };
            backend.upload_sub_data(self.params, 0, bytemuck::bytes_of(&params));

            for pass in self.passes.iter().filter(|p| p.num_draws > 0) {
                backend.upload_sub_data(pass.count, 0, bytemuck::bytes_of(&0u32));
                backend.dispatch_cull(&CullDispatch {
                    draw_info: pass.draw_info,
                    params: self.params,
                    commands: pass.commands,
                    uniforms: pass.uniforms,
                    count: pass.count,
                    num_draws: pass.num_draws,
                });
                stats.static_candidates += pass.num_draws;
                stats.cull_dispatches += 1;
            }
            // Cull writes must be visible before the indirect reads below.
            backend.memory_barrier();

            for pass in self.passes.iter().filter(|p| p.num_draws > 0) {
                let draw = IndirectDraw {
                    vertices: registry.vertex_buffer(pass.class),
                    indices: registry.index_buffer(pass.class),
                    commands: pass.commands,
                    uniforms: pass.uniforms,
                };
                backend.multi_draw_indirect_count(&draw, pass.count, pass.num_draws);
                stats.draw_calls += 1;
            }
        }

        if !self.frame_commands.is_empty() {
            backend.upload_sub_data(
                self.dynamic_uniforms,
                0,
                bytemuck::cast_slice(&self.frame_uniforms),
            );
            backend.upload_sub_data(
                self.dynamic_commands,
                0,
                bytemuck::cast_slice(&self.frame_commands),
            );
            let draw = IndirectDraw {
                vertices: registry.vertex_buffer(MeshClass::Dynamic),
                indices: registry.index_buffer(MeshClass::Dynamic),
                commands: self.dynamic_commands,
                uniforms: self.dynamic_uniforms,
            };
            backend.multi_draw_indirect(&draw, self.frame_commands.len() as u32);
            stats.dynamic_draws = self.frame_commands.len() as u32;
            stats.draw_calls += 1;
            self.frame_commands.clear();
            self.frame_uniforms.clear();
        }
        stats
    }
}
