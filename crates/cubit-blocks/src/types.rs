use serde::Deserialize;

/// Block kind identifier; [`AIR`] marks the absence of a block.
pub type BlockType = u16;

pub const AIR: BlockType = 0;

/// How much of what lies behind a block face shows through it.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Deserialize)]
pub enum TransparencyClass {
    #[default]
    #[serde(rename = "opaque")]
    Opaque,
    #[serde(rename = "semi")]
    SemiTransparent,
    #[serde(rename = "full")]
    FullyTransparent,
}

impl TransparencyClass {
    #[inline]
    pub fn is_transparent(self) -> bool {
        !matches!(self, TransparencyClass::Opaque)
    }
}

/// Static per-face mesh description, indexed by [`crate::Face::index`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockMeshData {
    pub texture_indices: [u32; 6],
    pub avg_colors: [[u8; 3]; 6],
    pub transparency: [TransparencyClass; 6],
}

impl Default for BlockMeshData {
    fn default() -> Self {
        Self::uniform(0, [255, 0, 255], TransparencyClass::Opaque)
    }
}

impl BlockMeshData {
    pub const fn uniform(texture: u32, avg_color: [u8; 3], class: TransparencyClass) -> Self {
        Self {
            texture_indices: [texture; 6],
            avg_colors: [avg_color; 6],
            transparency: [class; 6],
        }
    }

    pub(crate) const fn air() -> Self {
        Self::uniform(0, [0, 0, 0], TransparencyClass::FullyTransparent)
    }

    /// True when every face is opaque; such blocks occlude light for AO.
    #[inline]
    pub fn is_opaque(&self) -> bool {
        self.transparency
            .iter()
            .all(|c| matches!(c, TransparencyClass::Opaque))
    }
}
