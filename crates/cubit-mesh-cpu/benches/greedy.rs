use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use cubit_blocks::BlockDatabase;
use cubit_chunk::{ChunkCoord, NeighborSnapshot};
use cubit_mesh_cpu::{GreedyMesher, generate_naive};
use cubit_world::{TerrainGenerator, TerrainMode, WorldGenConfig, WorldGenParams};

fn load_blocks() -> BlockDatabase {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    BlockDatabase::load_from_path(root.join("../../assets/blocks.toml")).unwrap()
}

fn terrain_snapshot(db: &BlockDatabase) -> NeighborSnapshot {
    let params = Arc::new(WorldGenParams::resolve(&WorldGenConfig::default(), db));
    let terrain = TerrainGenerator::new(1337, TerrainMode::Noise, params);
    NeighborSnapshot::gather(ChunkCoord::new(0, 0, 0), |c| Some(Arc::new(terrain.generate(c))))
}

fn bench_mesh_terrain_chunk(c: &mut Criterion) {
    let mut group = c.benchmark_group("mesh_terrain_chunk");
    let db = load_blocks();
    let snap = terrain_snapshot(&db);
    let mut mesher = GreedyMesher::new();
    group.bench_function("greedy_32", |b| {
        b.iter(|| black_box(mesher.mesh(&snap.view(), &db)))
    });
    group.bench_function("naive_32", |b| {
        b.iter(|| black_box(generate_naive(&snap.view(), &db)))
    });
    group.finish();
}

criterion_group!(benches, bench_mesh_terrain_chunk);
criterion_main!(benches);
