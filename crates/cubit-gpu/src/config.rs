use serde::Deserialize;

/// Sizes of the shared mesh buffers and draw command tables.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct GpuConfig {
    /// Vertex buffer capacity per mesh class.
    #[serde(default = "default_vertex_bytes")]
    pub vertex_buffer_bytes: u32,
    /// Index buffer capacity per mesh class.
    #[serde(default = "default_index_bytes")]
    pub index_buffer_bytes: u32,
    #[serde(default = "default_alignment")]
    pub alignment: u32,
    #[serde(default = "default_max_draw_cmds")]
    pub max_draw_cmds: u32,
    #[serde(default = "default_max_dynamic_draw_cmds")]
    pub max_dynamic_draw_cmds: u32,
}
fn default_vertex_bytes() -> u32 {
    64 << 20
}
fn default_index_bytes() -> u32 {
    64 << 20
}
fn default_alignment() -> u32 {
    16
}
fn default_max_draw_cmds() -> u32 {
    1_000_000
}
fn default_max_dynamic_draw_cmds() -> u32 {
    100_000
}
impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            vertex_buffer_bytes: default_vertex_bytes(),
            index_buffer_bytes: default_index_bytes(),
            alignment: default_alignment(),
            max_draw_cmds: default_max_draw_cmds(),
            max_dynamic_draw_cmds: default_max_dynamic_draw_cmds(),
        }
    }
}
