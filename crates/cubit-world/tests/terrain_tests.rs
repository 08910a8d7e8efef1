use std::sync::Arc;

use cubit_blocks::BlockDatabase;
use cubit_chunk::{CHUNK_LENGTH, ChunkCoord};
use cubit_world::{TerrainGenerator, TerrainMode, WorldGenConfig, WorldGenParams};
use proptest::prelude::*;

const WORLDGEN: &str = r#"
    stone = "stone"
    [height]
    frequency = 0.01
    amplitude = 64.0
    base = 20
    [biomes]
    frequency = 0.004
    [[biomes.list]]
    name = "plains"
    weight = 2.0
    layers = [
        { blocks = ["grass"], depth = 1 },
        { blocks = ["dirt"], depth = 3 },
    ]
    [[biomes.list]]
    name = "desert"
    layers = [{ blocks = ["sand"], depth = 4 }]
"#;

fn generator(seed: i32) -> TerrainGenerator {
    let db = BlockDatabase::from_entries(vec![
        ("stone".into(), Default::default()),
        ("grass".into(), Default::default()),
        ("dirt".into(), Default::default()),
        ("sand".into(), Default::default()),
    ]);
    let cfg = WorldGenConfig::from_toml_str(WORLDGEN).unwrap();
    let params = WorldGenParams::resolve(&cfg, &db);
    TerrainGenerator::new(seed, TerrainMode::Noise, Arc::new(params))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    // Same seed and coordinate always yield the same grid
    #[test]
    fn generation_is_deterministic(seed in any::<i32>(), cx in -50i32..50, cz in -50i32..50) {
        let a = generator(seed).generate(ChunkCoord::new(cx, 0, cz));
        let b = generator(seed).generate(ChunkCoord::new(cx, 0, cz));
        prop_assert_eq!(a, b);
    }

    // Columns are solid from the bottom up to the surface height, air above
    #[test]
    fn columns_match_height(seed in any::<i32>(), wx in -500i32..500, wz in -500i32..500) {
        let g = generator(seed);
        let h = g.height_at(wx, wz);
        let coord = ChunkCoord::from_world(wx, h, wz);
        let grid = g.generate(coord);
        let [ox, oy, oz] = coord.origin();
        let (lx, lz) = (wx - ox, wz - oz);
        prop_assert_ne!(grid.get(lx, h - oy, lz), 0);
        if h - oy + 1 < CHUNK_LENGTH as i32 {
            prop_assert_eq!(grid.get(lx, h - oy + 1, lz), 0);
        }
        // top block comes from a biome layer, deep blocks are stone
        let top = grid.get(lx, h - oy, lz);
        prop_assert!(top == 2 || top == 4);
    }
}
