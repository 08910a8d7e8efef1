use std::sync::Arc;

use cubit_blocks::{AIR, BlockType};
use cubit_chunk::{CHUNK_LENGTH, ChunkCoord, VERTICAL_CHUNKS, VoxelGrid};
use fastnoise_lite::{FastNoiseLite, NoiseType};
use serde::Deserialize;

use crate::worldgen::WorldGenParams;

/// Mode name as written in config files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainKind {
    Solid,
    Checker,
    Layers,
    Flat,
    #[default]
    Noise,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerrainMode {
    Solid(BlockType),
    /// Every other cell along all three axes.
    Checker(BlockType),
    /// Every other horizontal layer.
    Layers(BlockType),
    Flat { thickness: i32, block: BlockType },
    /// Ridged heightmap with biome layers over the vertical chunk stack.
    Noise,
}

impl TerrainMode {
    pub fn from_kind(kind: TerrainKind, params: &WorldGenParams) -> Self {
        match kind {
            TerrainKind::Solid => TerrainMode::Solid(params.fill_block),
            TerrainKind::Checker => TerrainMode::Checker(params.fill_block),
            TerrainKind::Layers => TerrainMode::Layers(params.fill_block),
            TerrainKind::Flat => TerrainMode::Flat {
                thickness: params.flat_thickness,
                block: params.flat_block,
            },
            TerrainKind::Noise => TerrainMode::Noise,
        }
    }
}

/// Per-call noise state; cheap to build, so every chunk gets its own.
struct GenCtx {
    height: FastNoiseLite,
    biome: FastNoiseLite,
}

/// Fills chunks as a pure function of seed, mode, params and chunk coordinate.
#[derive(Clone, Debug)]
pub struct TerrainGenerator {
    seed: i32,
    mode: TerrainMode,
    params: Arc<WorldGenParams>,
    vertical_chunks: i32,
}

impl TerrainGenerator {
    pub fn new(seed: i32, mode: TerrainMode, params: Arc<WorldGenParams>) -> Self {
        Self {
            seed,
            mode,
            params,
            vertical_chunks: VERTICAL_CHUNKS as i32,
        }
    }

    /// Caps noise terrain to a stack of `n` chunks instead of [`VERTICAL_CHUNKS`].
    pub fn with_vertical_chunks(mut self, n: i32) -> Self {
        self.vertical_chunks = n.max(1);
        self
    }

    #[inline]
    pub fn vertical_chunks(&self) -> i32 {
        self.vertical_chunks
    }

    #[inline]
    pub fn seed(&self) -> i32 {
        self.seed
    }

    #[inline]
    pub fn mode(&self) -> TerrainMode {
        self.mode
    }

    #[inline]
    pub fn params(&self) -> &WorldGenParams {
        &self.params
    }

    pub fn generate(&self, coord: ChunkCoord) -> VoxelGrid {
        let mut grid = VoxelGrid::new();
        self.generate_into(&mut grid, coord);
        grid
    }

    pub fn generate_into(&self, grid: &mut VoxelGrid, coord: ChunkCoord) {
        let l = CHUNK_LENGTH as i32;
        match self.mode {
            TerrainMode::Solid(block) => *grid = VoxelGrid::filled(block),
            TerrainMode::Checker(block) => {
                for y in (0..l).step_by(2) {
                    for z in (0..l).step_by(2) {
                        for x in (0..l).step_by(2) {
                            grid.set(x, y, z, block);
                        }
                    }
                }
            }
            TerrainMode::Layers(block) => {
                for y in (0..l).step_by(2) {
                    for z in 0..l {
                        for x in 0..l {
                            grid.set(x, y, z, block);
                        }
                    }
                }
            }
            TerrainMode::Flat { thickness, block } => {
                let base_y = coord.cy * l;
                for y in 0..l {
                    let wy = base_y + y;
                    if !(0..thickness).contains(&wy) {
                        continue;
                    }
                    for z in 0..l {
                        for x in 0..l {
                            grid.set(x, y, z, block);
                        }
                    }
                }
            }
            TerrainMode::Noise => self.generate_noise(grid, coord),
        }
    }

    fn make_ctx(&self) -> GenCtx {
        let mut height = FastNoiseLite::with_seed(self.seed);
        height.set_noise_type(Some(NoiseType::OpenSimplex2));
        height.set_frequency(Some(self.params.height_frequency));
        let mut biome = FastNoiseLite::with_seed(self.seed.wrapping_add(1));
        biome.set_noise_type(Some(NoiseType::OpenSimplex2));
        biome.set_frequency(Some(self.params.biome_frequency));
        GenCtx { height, biome }
    }

    /// Surface height of the noise terrain at a world column.
    pub fn height_at(&self, wx: i32, wz: i32) -> i32 {
        let ctx = self.make_ctx();
        self.column_height(&ctx, wx, wz)
    }

    fn column_height(&self, ctx: &GenCtx, wx: i32, wz: i32) -> i32 {
        let p = &self.params;
        let ridge = ridged(&ctx.height, wx as f32, wz as f32, p.height_octaves);
        let max_y = self.vertical_chunks * CHUNK_LENGTH as i32 - 1;
        (p.base_height + (ridge * p.height_amplitude).floor() as i32).clamp(0, max_y)
    }

    fn generate_noise(&self, grid: &mut VoxelGrid, coord: ChunkCoord) {
        let l = CHUNK_LENGTH as i32;
        if !(0..self.vertical_chunks).contains(&coord.cy) {
            return;
        }
        let ctx = self.make_ctx();
        let [ox, oy, oz] = coord.origin();
        let p = &self.params;
        for z in 0..l {
            for x in 0..l {
                let (wx, wz) = (ox + x, oz + z);
                let height = self.column_height(&ctx, wx, wz);
                if height < oy {
                    continue;
                }
                let biome = p.biome(fbm2(&ctx.biome, wx as f32, wz as f32));
                let top = (height - oy).min(l - 1);
                for y in 0..=top {
                    let wy = oy + y;
                    let depth = (height - wy) as u32;
                    let block = match biome {
                        Some(b) if depth < b.depth_sum => {
                            let mut sum = 0;
                            let mut picked = p.stone;
                            for layer in &b.layers {
                                sum += layer.depth;
                                if sum > depth {
                                    picked = layer.pick(white_noise(self.seed, wx, wy, wz));
                                    break;
                                }
                            }
                            picked
                        }
                        _ => p.stone,
                    };
                    if block != AIR {
                        grid.set(x, y, z, block);
                    }
                }
            }
        }
    }
}

/// Ridged multi-octave noise remapped to `[0, 1]`.
fn ridged(n: &FastNoiseLite, x: f32, z: f32, octaves: u32) -> f32 {
    let mut amp = 1.0_f32;
    let mut freq = 1.0_f32;
    let mut sum = 0.0_f32;
    let mut max_amp = 0.0_f32;
    for _ in 0..octaves {
        let v = 1.0 - n.get_noise_2d(x * freq, z * freq).abs();
        sum += v * v * amp;
        max_amp += amp;
        amp *= 0.5;
        freq *= 2.0;
    }
    if max_amp > 0.0 { sum / max_amp } else { sum }
}

/// Two-octave fbm in `[-1, 1]`, used for biome selection.
fn fbm2(n: &FastNoiseLite, x: f32, z: f32) -> f32 {
    let a = n.get_noise_2d(x, z);
    let b = n.get_noise_2d(x * 2.0, z * 2.0);
    ((a + b * 0.5) / 1.5).clamp(-1.0, 1.0)
}

/// Hash-based white noise in `[-1, 1]`.
fn white_noise(seed: i32, x: i32, y: i32, z: i32) -> f32 {
    let uhash32 = |mut a: u32| -> u32 {
        a ^= a >> 16;
        a = a.wrapping_mul(0x7feb_352d);
        a ^= a >> 15;
        a = a.wrapping_mul(0x846c_a68b);
        a ^= a >> 16;
        a
    };
    let mut h = uhash32(seed as u32);
    h = uhash32(h ^ x as u32);
    h = uhash32(h ^ (y as u32).wrapping_mul(0x9E37_79B9));
    h = uhash32(h ^ (z as u32).wrapping_mul(0x85EB_CA6B));
    (h as f32 / u32::MAX as f32) * 2.0 - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubit_blocks::BlockDatabase;
    use cubit_chunk::CHUNK_VOLUME;

    use crate::worldgen::WorldGenConfig;

    fn params() -> Arc<WorldGenParams> {
        let db = BlockDatabase::from_entries(vec![("stone".into(), Default::default())]);
        Arc::new(WorldGenParams::resolve(&WorldGenConfig::default(), &db))
    }

    #[test]
    fn checker_fills_one_eighth() {
        let g = TerrainGenerator::new(1, TerrainMode::Checker(2), params());
        let grid = g.generate(ChunkCoord::new(0, 0, 0));
        assert_eq!(grid.non_empty_count(), CHUNK_VOLUME / 8);
        assert_eq!(grid.get(0, 0, 0), 2);
        assert_eq!(grid.get(1, 0, 0), AIR);
        assert_eq!(grid.get(2, 2, 2), 2);
    }

    #[test]
    fn layers_fill_even_rows() {
        let g = TerrainGenerator::new(1, TerrainMode::Layers(2), params());
        let grid = g.generate(ChunkCoord::new(3, 0, -3));
        assert_eq!(grid.non_empty_count(), CHUNK_VOLUME / 2);
        assert_eq!(grid.get(5, 1, 7), AIR);
        assert_eq!(grid.get(5, 2, 7), 2);
    }

    #[test]
    fn flat_only_fills_bottom() {
        let g = TerrainGenerator::new(1, TerrainMode::Flat { thickness: 3, block: 1 }, params());
        assert_eq!(
            g.generate(ChunkCoord::new(0, 0, 0)).non_empty_count(),
            3 * CHUNK_LENGTH * CHUNK_LENGTH
        );
        assert!(g.generate(ChunkCoord::new(0, 1, 0)).is_empty());
        assert!(g.generate(ChunkCoord::new(0, -1, 0)).is_empty());
    }

    #[test]
    fn noise_is_bounded_and_deterministic() {
        let g = TerrainGenerator::new(42, TerrainMode::Noise, params());
        let a = g.generate(ChunkCoord::new(2, 0, -1));
        let b = g.generate(ChunkCoord::new(2, 0, -1));
        assert_eq!(a, b);
        assert!(g.generate(ChunkCoord::new(2, VERTICAL_CHUNKS as i32, -1)).is_empty());
        let h = g.height_at(70, -20);
        assert!((0..(VERTICAL_CHUNKS * CHUNK_LENGTH) as i32).contains(&h));
    }

    #[test]
    fn noise_respects_a_shorter_stack() {
        let mut cfg = WorldGenConfig::default();
        cfg.height.base = 200;
        let db = BlockDatabase::from_entries(vec![("stone".into(), Default::default())]);
        let params = Arc::new(WorldGenParams::resolve(&cfg, &db));
        let g = TerrainGenerator::new(42, TerrainMode::Noise, params).with_vertical_chunks(2);
        assert_eq!(g.vertical_chunks(), 2);
        let top = 2 * CHUNK_LENGTH as i32 - 1;
        for (x, z) in [(0, 0), (70, -20), (-300, 45)] {
            assert_eq!(g.height_at(x, z), top);
        }
        assert!(!g.generate(ChunkCoord::new(0, 1, 0)).is_empty());
        assert!(g.generate(ChunkCoord::new(0, 2, 0)).is_empty());
    }

    #[test]
    fn white_noise_in_range() {
        for i in -50..50 {
            let v = white_noise(7, i, i * 3, -i);
            assert!((-1.0..=1.0).contains(&v));
        }
    }
}
