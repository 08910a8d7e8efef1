use std::fs;
use std::path::Path;

use cubit_blocks::{BlockDatabase, BlockType};
use serde::Deserialize;

use crate::error::WorldGenError;

#[derive(Clone, Debug, Default, Deserialize)]
pub struct WorldGenConfig {
    #[serde(default)]
    pub height: Height,
    #[serde(default)]
    pub flat: Flat,
    /// Block used by the `solid`, `checker` and `layers` modes.
    #[serde(default = "default_fill_block")]
    pub fill_block: String,
    /// Block below the biome layer stack.
    #[serde(default = "default_stone")]
    pub stone: String,
    #[serde(default)]
    pub biomes: Biomes,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Height {
    #[serde(default = "default_height_freq")]
    pub frequency: f32,
    #[serde(default = "default_octaves")]
    pub octaves: u32,
    #[serde(default = "default_amplitude")]
    pub amplitude: f32,
    #[serde(default = "default_base_height")]
    pub base: i32,
}
fn default_height_freq() -> f32 {
    0.0013
}
fn default_octaves() -> u32 {
    4
}
fn default_amplitude() -> f32 {
    128.0
}
fn default_base_height() -> i32 {
    16
}
impl Default for Height {
    fn default() -> Self {
        Self {
            frequency: default_height_freq(),
            octaves: default_octaves(),
            amplitude: default_amplitude(),
            base: default_base_height(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Flat {
    #[serde(default = "default_flat_thickness")]
    pub thickness: i32,
    #[serde(default = "default_fill_block")]
    pub block: String,
}
fn default_flat_thickness() -> i32 {
    1
}
fn default_fill_block() -> String {
    "stone".into()
}
fn default_stone() -> String {
    "stone".into()
}
impl Default for Flat {
    fn default() -> Self {
        Self {
            thickness: default_flat_thickness(),
            block: default_fill_block(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Biomes {
    #[serde(default = "default_biome_freq")]
    pub frequency: f32,
    #[serde(default)]
    pub list: Vec<BiomeDef>,
}
fn default_biome_freq() -> f32 {
    0.0013
}
impl Default for Biomes {
    fn default() -> Self {
        Self {
            frequency: default_biome_freq(),
            list: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct BiomeDef {
    pub name: String,
    /// Relative share of the biome noise range.
    #[serde(default)]
    pub weight: Option<f32>,
    #[serde(default)]
    pub layers: Vec<LayerDef>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LayerDef {
    pub blocks: Vec<String>,
    #[serde(default)]
    pub frequencies: Vec<f32>,
    #[serde(default = "default_layer_depth")]
    pub depth: u32,
}
fn default_layer_depth() -> u32 {
    1
}

impl WorldGenConfig {
    pub fn from_toml_str(src: &str) -> Result<Self, WorldGenError> {
        Ok(toml::from_str(src)?)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, WorldGenError> {
        let path = path.as_ref();
        let src = fs::read_to_string(path).map_err(|source| WorldGenError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&src)
    }
}

/// One band of a biome column; `weights` are normalized cumulative-ready shares.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerParams {
    pub blocks: Vec<BlockType>,
    pub weights: Vec<f32>,
    pub depth: u32,
}

impl LayerParams {
    /// Picks a block for a noise value in `[-1, 1]`.
    pub fn pick(&self, noise: f32) -> BlockType {
        match self.blocks.as_slice() {
            [] => cubit_blocks::AIR,
            [only] => *only,
            blocks => blocks[pick_weighted(&self.weights, (noise + 1.0) * 0.5)],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BiomeParams {
    pub name: String,
    pub layers: Vec<LayerParams>,
    pub depth_sum: u32,
}

/// Worldgen config with block names resolved against a [`BlockDatabase`].
#[derive(Clone, Debug, PartialEq)]
pub struct WorldGenParams {
    pub height_frequency: f32,
    pub height_octaves: u32,
    pub height_amplitude: f32,
    pub base_height: i32,
    pub flat_thickness: i32,
    pub flat_block: BlockType,
    pub fill_block: BlockType,
    pub stone: BlockType,
    pub biome_frequency: f32,
    pub biomes: Vec<BiomeParams>,
    pub biome_weights: Vec<f32>,
}

impl WorldGenParams {
    pub fn resolve(cfg: &WorldGenConfig, db: &BlockDatabase) -> Self {
        let biomes: Vec<BiomeParams> = cfg
            .biomes
            .list
            .iter()
            .map(|b| resolve_biome(b, db))
            .collect();
        let raw: Vec<f32> = cfg
            .biomes
            .list
            .iter()
            .map(|b| b.weight.unwrap_or(1.0))
            .collect();
        let biome_weights = normalize_weights(&raw, biomes.len(), "biome list");
        Self {
            height_frequency: cfg.height.frequency,
            height_octaves: cfg.height.octaves.max(1),
            height_amplitude: cfg.height.amplitude,
            base_height: cfg.height.base,
            flat_thickness: cfg.flat.thickness,
            flat_block: db.resolve(&cfg.flat.block),
            fill_block: db.resolve(&cfg.fill_block),
            stone: db.resolve(&cfg.stone),
            biome_frequency: cfg.biomes.frequency,
            biomes,
            biome_weights,
        }
    }

    /// Biome for a noise value in `[-1, 1]`.
    pub fn biome(&self, noise: f32) -> Option<&BiomeParams> {
        if self.biomes.is_empty() {
            return None;
        }
        self.biomes
            .get(pick_weighted(&self.biome_weights, (noise + 1.0) * 0.5))
    }
}

fn resolve_biome(def: &BiomeDef, db: &BlockDatabase) -> BiomeParams {
    let layers: Vec<LayerParams> = def
        .layers
        .iter()
        .map(|l| {
            let blocks: Vec<BlockType> = l.blocks.iter().map(|n| db.resolve(n)).collect();
            let what = format!("biome `{}` layer", def.name);
            let weights = normalize_weights(&l.frequencies, blocks.len(), &what);
            LayerParams {
                blocks,
                weights,
                depth: l.depth,
            }
        })
        .collect();
    let depth_sum = layers.iter().map(|l| l.depth).sum();
    BiomeParams {
        name: def.name.clone(),
        layers,
        depth_sum,
    }
}

/// Normalizes `raw` to sum to 1; missing or mismatched lists become uniform.
fn normalize_weights(raw: &[f32], len: usize, what: &str) -> Vec<f32> {
    if len == 0 {
        return Vec::new();
    }
    let uniform = || vec![1.0 / len as f32; len];
    if raw.is_empty() {
        return uniform();
    }
    if raw.len() != len {
        log::warn!(
            target: "blocks",
            "{}: {} frequencies for {} entries, using uniform",
            what,
            raw.len(),
            len
        );
        return uniform();
    }
    let sum: f32 = raw.iter().map(|w| w.max(0.0)).sum();
    if sum <= 0.0 {
        log::warn!(target: "blocks", "{}: frequencies sum to zero, using uniform", what);
        return uniform();
    }
    raw.iter().map(|w| w.max(0.0) / sum).collect()
}

/// Index of the first entry whose cumulative weight reaches `t` in `[0, 1]`.
fn pick_weighted(weights: &[f32], t: f32) -> usize {
    let mut sum = 0.0;
    for (i, w) in weights.iter().enumerate() {
        sum += w;
        if sum >= t {
            return i;
        }
    }
    weights.len().saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_pick_walks_cumulative_sum() {
        let w = [0.25, 0.5, 0.25];
        assert_eq!(pick_weighted(&w, 0.0), 0);
        assert_eq!(pick_weighted(&w, 0.25), 0);
        assert_eq!(pick_weighted(&w, 0.3), 1);
        assert_eq!(pick_weighted(&w, 0.9), 2);
        assert_eq!(pick_weighted(&w, 1.5), 2);
    }

    #[test]
    fn mismatched_frequencies_become_uniform() {
        assert_eq!(normalize_weights(&[1.0], 2, "t"), vec![0.5, 0.5]);
        assert_eq!(normalize_weights(&[], 4, "t"), vec![0.25; 4]);
        assert_eq!(normalize_weights(&[3.0, 1.0], 2, "t"), vec![0.75, 0.25]);
    }

    #[test]
    fn parses_biome_layers() {
        let cfg = WorldGenConfig::from_toml_str(
            r#"
            [height]
            frequency = 0.01
            [[biomes.list]]
            name = "plains"
            layers = [
                { blocks = ["grass"], depth = 1 },
                { blocks = ["dirt", "gravel"], frequencies = [0.8, 0.2], depth = 3 },
            ]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.height.frequency, 0.01);
        assert_eq!(cfg.height.octaves, 4);
        assert_eq!(cfg.biomes.list[0].layers[1].depth, 3);

        let db = BlockDatabase::from_entries(vec![
            ("stone".into(), Default::default()),
            ("grass".into(), Default::default()),
            ("dirt".into(), Default::default()),
        ]);
        let params = WorldGenParams::resolve(&cfg, &db);
        let plains = &params.biomes[0];
        assert_eq!(plains.depth_sum, 4);
        // unknown `gravel` resolves to the default block
        assert_eq!(plains.layers[1].blocks, vec![3, 1]);
        assert_eq!(plains.layers[1].pick(-1.0), 3);
        assert_eq!(plains.layers[1].pick(1.0), 1);
        assert_eq!(params.stone, 1);
    }
}
