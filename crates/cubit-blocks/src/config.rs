use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::{BlockType, TransparencyClass};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct BlocksConfig {
    #[serde(default)]
    pub default: DefaultBlockDef,
    #[serde(default)]
    pub textures: BTreeMap<String, TextureDef>,
    #[serde(default)]
    pub blocks: Vec<BlockDef>,
}

/// Fallback used whenever a block description is missing or malformed.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DefaultBlockDef {
    /// Block substituted for unknown block names.
    #[serde(default)]
    pub block: Option<String>,
    /// Texture applied to every face of the fallback mesh description.
    #[serde(default)]
    pub texture: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TextureDef {
    pub index: u32,
    #[serde(default = "default_avg_color")]
    pub avg_color: [u8; 3],
}

fn default_avg_color() -> [u8; 3] {
    [128, 128, 128]
}

#[derive(Clone, Debug, Deserialize)]
pub struct BlockDef {
    pub name: String,
    #[serde(default)]
    pub id: Option<BlockType>,
    #[serde(default)]
    pub model: Option<ModelDef>,
    #[serde(default)]
    pub transparency: Option<TransparencyDef>,
}

/// Texture assignment; `kind` is one of `all`, `top_bottom` or `unique`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ModelDef {
    #[serde(rename = "type")]
    pub kind: String,
    pub all: Option<String>,
    pub top: Option<String>,
    pub bottom: Option<String>,
    pub side: Option<String>,
    pub pos_x: Option<String>,
    pub neg_x: Option<String>,
    pub pos_y: Option<String>,
    pub neg_y: Option<String>,
    pub pos_z: Option<String>,
    pub neg_z: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum TransparencyDef {
    Uniform(TransparencyClass),
    PerFace([TransparencyClass; 6]),
}

impl TransparencyDef {
    pub fn per_face(&self) -> [TransparencyClass; 6] {
        match self {
            TransparencyDef::Uniform(c) => [*c; 6],
            TransparencyDef::PerFace(faces) => *faces,
        }
    }
}
