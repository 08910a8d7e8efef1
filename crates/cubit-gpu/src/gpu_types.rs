//! Plain-old-data structs shared with the GPU. Layouts are std430-compatible.

use bytemuck::{Pod, Zeroable};

/// Matches `DrawElementsIndirectCommand` consumed by indirect multi-draw.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawElementsIndirectCommand {
    pub count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub base_vertex: i32,
    pub base_instance: u32,
}

/// Per-mesh record the cull pass reads: world AABB (scale in `aabb_min.w`) and draw range.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ChunkDrawInfo {
    pub aabb_min: [f32; 4],
    pub aabb_max: [f32; 4],
    pub first_index: u32,
    pub count: u32,
    pub base_vertex: i32,
    pub _pad: u32,
}

/// Per-draw uniform for static chunks: world origin in xyz, vertex scale in w.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct StaticChunkDrawCmdUniform {
    pub pos: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ChunkDrawCmdUniform {
    pub model: [[f32; 4]; 4],
}

/// Cull pass inputs, uploaded once per frame.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct CullParams {
    pub planes: [[f32; 4]; 6],
    pub camera_pos: [f32; 4],
    pub min_distance: f32,
    pub max_distance: f32,
    pub cull_frustum: u32,
    pub _pad: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn layouts_match_shader_structs() {
        assert_eq!(size_of::<DrawElementsIndirectCommand>(), 20);
        assert_eq!(size_of::<ChunkDrawInfo>(), 48);
        assert_eq!(size_of::<StaticChunkDrawCmdUniform>(), 16);
        assert_eq!(size_of::<ChunkDrawCmdUniform>(), 64);
        assert_eq!(size_of::<CullParams>(), 128);
    }
}
