use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::config::{BlockDef, BlocksConfig, ModelDef, TextureDef};
use crate::error::BlockDbError;
use crate::face::Face;
use crate::types::{AIR, BlockMeshData, BlockType, TransparencyClass};

/// Flat, block-type-indexed tables of mesh descriptions consumed by the meshers.
#[derive(Clone, Debug)]
pub struct BlockDatabase {
    mesh: Vec<BlockMeshData>,
    names: Vec<String>,
    by_name: HashMap<String, BlockType>,
    default_mesh: BlockMeshData,
    default_block: BlockType,
}

impl Default for BlockDatabase {
    fn default() -> Self {
        Self::from_entries(Vec::new())
    }
}

impl BlockDatabase {
    /// Builds a database from ready-made entries; ids are assigned from 1 in order.
    pub fn from_entries(entries: Vec<(String, BlockMeshData)>) -> Self {
        let mut mesh = vec![BlockMeshData::air()];
        let mut names = vec!["air".to_string()];
        let mut by_name = HashMap::new();
        by_name.insert("air".to_string(), AIR);
        for (name, data) in entries {
            let id = mesh.len() as BlockType;
            by_name.insert(name.clone(), id);
            names.push(name);
            mesh.push(data);
        }
        let default_block = if mesh.len() > 1 { 1 } else { AIR };
        Self {
            mesh,
            names,
            by_name,
            default_mesh: BlockMeshData::default(),
            default_block,
        }
    }

    pub fn from_toml_str(src: &str) -> Result<Self, BlockDbError> {
        let cfg: BlocksConfig = toml::from_str(src)?;
        Self::from_config(cfg)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, BlockDbError> {
        let path = path.as_ref();
        let src = fs::read_to_string(path).map_err(|source| BlockDbError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&src)
    }

    pub fn from_config(cfg: BlocksConfig) -> Result<Self, BlockDbError> {
        let default_mesh = match cfg.default.texture.as_deref() {
            Some(name) => match cfg.textures.get(name) {
                Some(tex) => {
                    BlockMeshData::uniform(tex.index, tex.avg_color, TransparencyClass::Opaque)
                }
                None => {
                    log::warn!(target: "blocks", "default texture `{}` not found", name);
                    BlockMeshData::default()
                }
            },
            None => BlockMeshData::default(),
        };

        let ids = assign_ids(&cfg.blocks)?;
        let len = ids.iter().copied().max().map_or(1, |m| m as usize + 1);
        let mut mesh = vec![default_mesh; len];
        let mut names = vec![String::new(); len];
        mesh[0] = BlockMeshData::air();
        names[0] = "air".to_string();
        let mut by_name = HashMap::with_capacity(len);
        by_name.insert("air".to_string(), AIR);

        for (def, id) in cfg.blocks.iter().zip(ids) {
            let mut data = match def.model.as_ref() {
                Some(model) => resolve_model(&def.name, model, &cfg.textures, &default_mesh),
                None => {
                    log::warn!(target: "blocks", "block `{}` has no model, using default", def.name);
                    default_mesh
                }
            };
            if let Some(t) = def.transparency.as_ref() {
                data.transparency = t.per_face();
            }
            mesh[id as usize] = data;
            names[id as usize] = def.name.clone();
            by_name.insert(def.name.clone(), id);
        }

        let default_block = match cfg.default.block.as_deref() {
            Some(name) => by_name.get(name).copied().unwrap_or_else(|| {
                log::warn!(target: "blocks", "default block `{}` is not defined", name);
                AIR
            }),
            None => AIR,
        };

        log::info!(target: "blocks", "loaded {} block types", by_name.len());
        Ok(Self {
            mesh,
            names,
            by_name,
            default_mesh,
            default_block,
        })
    }

    /// Number of block type slots, including air and unused gaps.
    #[inline]
    pub fn len(&self) -> usize {
        self.mesh.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mesh.len() <= 1
    }

    /// The raw table indexed by block type.
    #[inline]
    pub fn mesh_table(&self) -> &[BlockMeshData] {
        &self.mesh
    }

    /// Mesh description for `block`; unknown ids get the default description.
    #[inline]
    pub fn mesh_data(&self, block: BlockType) -> &BlockMeshData {
        self.mesh.get(block as usize).unwrap_or(&self.default_mesh)
    }

    #[inline]
    pub fn texture_index(&self, block: BlockType, face: Face) -> u32 {
        self.mesh_data(block).texture_indices[face.index()]
    }

    #[inline]
    pub fn texture_indices(&self, block: BlockType) -> [u32; 6] {
        self.mesh_data(block).texture_indices
    }

    #[inline]
    pub fn avg_color(&self, block: BlockType, face: Face) -> [u8; 3] {
        self.mesh_data(block).avg_colors[face.index()]
    }

    #[inline]
    pub fn transparency(&self, block: BlockType, face: Face) -> TransparencyClass {
        self.mesh_data(block).transparency[face.index()]
    }

    #[inline]
    pub fn is_transparent(&self, block: BlockType, face: Face) -> bool {
        self.transparency(block, face).is_transparent()
    }

    /// Whether `block` counts as an occluder for ambient occlusion.
    #[inline]
    pub fn occludes(&self, block: BlockType) -> bool {
        block != AIR && self.mesh_data(block).is_opaque()
    }

    pub fn name(&self, block: BlockType) -> Option<&str> {
        self.names
            .get(block as usize)
            .map(String::as_str)
            .filter(|n| !n.is_empty())
    }

    pub fn id_by_name(&self, name: &str) -> Option<BlockType> {
        self.by_name.get(name).copied()
    }

    /// The block substituted when a name cannot be resolved.
    #[inline]
    pub fn default_block(&self) -> BlockType {
        self.default_block
    }

    /// Looks up `name`, falling back to the default block with a warning.
    pub fn resolve(&self, name: &str) -> BlockType {
        self.id_by_name(name).unwrap_or_else(|| {
            log::warn!(target: "blocks", "unknown block `{}`, using default", name);
            self.default_block
        })
    }
}

fn assign_ids(blocks: &[BlockDef]) -> Result<Vec<BlockType>, BlockDbError> {
    let mut owner: HashMap<BlockType, &str> = HashMap::new();
    for def in blocks {
        if let Some(id) = def.id {
            if id == AIR {
                return Err(BlockDbError::ReservedAirId(def.name.clone()));
            }
            if let Some(first) = owner.insert(id, &def.name) {
                return Err(BlockDbError::DuplicateId {
                    id,
                    first: first.to_string(),
                    second: def.name.clone(),
                });
            }
        }
    }
    let mut next: BlockType = 1;
    let mut ids = Vec::with_capacity(blocks.len());
    for def in blocks {
        let id = match def.id {
            Some(id) => id,
            None => {
                while owner.contains_key(&next) {
                    next += 1;
                }
                owner.insert(next, &def.name);
                next
            }
        };
        ids.push(id);
    }
    Ok(ids)
}

fn resolve_model(
    block: &str,
    model: &ModelDef,
    textures: &BTreeMap<String, TextureDef>,
    fallback: &BlockMeshData,
) -> BlockMeshData {
    let lookup = |slot: &str, name: Option<&String>, face: usize| -> (u32, [u8; 3]) {
        match name.and_then(|n| textures.get(n.as_str())) {
            Some(tex) => (tex.index, tex.avg_color),
            None => {
                log::warn!(
                    target: "blocks",
                    "block `{}`: missing texture for `{}` ({:?}), using default",
                    block,
                    slot,
                    name
                );
                (fallback.texture_indices[face], fallback.avg_colors[face])
            }
        }
    };

    // Face order: +x, -x, +y, -y, +z, -z
    let slots: [(&str, Option<&String>); 6] = match model.kind.as_str() {
        "all" => [("all", model.all.as_ref()); 6],
        "top_bottom" => [
            ("side", model.side.as_ref()),
            ("side", model.side.as_ref()),
            ("top", model.top.as_ref()),
            ("bottom", model.bottom.as_ref()),
            ("side", model.side.as_ref()),
            ("side", model.side.as_ref()),
        ],
        "unique" => [
            ("pos_x", model.pos_x.as_ref()),
            ("neg_x", model.neg_x.as_ref()),
            ("pos_y", model.pos_y.as_ref()),
            ("neg_y", model.neg_y.as_ref()),
            ("pos_z", model.pos_z.as_ref()),
            ("neg_z", model.neg_z.as_ref()),
        ],
        other => {
            log::warn!(
                target: "blocks",
                "block `{}` uses unknown model type `{}`, using default",
                block,
                other
            );
            return *fallback;
        }
    };

    let mut data = *fallback;
    data.transparency = [TransparencyClass::Opaque; 6];
    for (face, (slot, name)) in slots.into_iter().enumerate() {
        let (index, color) = lookup(slot, name, face);
        data.texture_indices[face] = index;
        data.avg_colors[face] = color;
    }
    data
}
