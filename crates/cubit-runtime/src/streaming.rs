//! Player-centred chunk streaming.
//!
//! The manager owns the chunk map and walks the load window in spiral order,
//! queueing terrain, mesh and LOD jobs on the runtime. Finished results are
//! applied on the calling (GPU) thread; results whose chunk was evicted or
//! edited since submission are dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cubit_blocks::{BlockDatabase, BlockType};
use cubit_chunk::{
    CHUNK_LENGTH, Chunk, ChunkCoord, ChunkStack, ChunkState, LodLevel, MeshHandles,
    NeighborSnapshot, VoxelGrid, world_to_local,
};
use cubit_geom::{Aabb, Vec3};
use cubit_gpu::{ChunkMesh, ChunkMeshRegistry, GpuBackend, MeshClass};
use cubit_mesh_cpu::{ChunkMeshData, LodSection};
use cubit_world::TerrainGenerator;
use hashbrown::{HashMap, HashSet};

use crate::{
    BuildJob, JobPayload, JobResult, Runtime, RuntimeError, StreamingConfig, spiral_offsets,
};

type ChunkMap = HashMap<ChunkCoord, Chunk>;

fn lock(chunks: &Mutex<ChunkMap>) -> MutexGuard<'_, ChunkMap> {
    chunks.lock().unwrap_or_else(PoisonError::into_inner)
}

fn take_id(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

/// What one [`ChunkStreamingManager::update`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub loaded: usize,
    pub evicted: usize,
    pub terrain_jobs: usize,
    pub mesh_jobs: usize,
    pub lod_jobs: usize,
    pub applied: usize,
    pub discarded: usize,
    pub released: usize,
}

impl StreamStats {
    pub fn jobs(&self) -> usize {
        self.terrain_jobs + self.mesh_jobs + self.lod_jobs
    }
}

struct LodColumn {
    level: LodLevel,
    state: ChunkState,
    job_id: u64,
    meshes: Vec<ChunkMesh>,
}

impl LodColumn {
    fn new(level: LodLevel) -> Self {
        Self {
            level,
            state: ChunkState::NotFinished,
            job_id: 0,
            meshes: Vec::new(),
        }
    }
}

/// Resident region around the player's column.
#[derive(Clone, Copy, Debug)]
struct Window {
    center: (i32, i32),
    load: i32,
    lod: i32,
    vertical: i32,
}

impl Window {
    #[inline]
    fn ring(&self, cx: i32, cz: i32) -> i32 {
        (cx - self.center.0).abs().max((cz - self.center.1).abs())
    }

    #[inline]
    fn contains(&self, c: ChunkCoord) -> bool {
        self.ring(c.cx, c.cz) <= self.load && (0..self.vertical).contains(&c.cy)
    }

    #[inline]
    fn is_lod_column(&self, cx: i32, cz: i32) -> bool {
        self.ring(cx, cz) > self.lod
    }
}

fn neighbor_offsets() -> impl Iterator<Item = (i32, i32, i32)> {
    (-1..=1)
        .flat_map(|dy| (-1..=1).flat_map(move |dz| (-1..=1).map(move |dx| (dx, dy, dz))))
        .filter(|&o| o != (0, 0, 0))
}

/// Every in-window neighbour has terrain; out-of-window neighbours read as air.
fn neighbors_ready(chunks: &ChunkMap, window: Window, coord: ChunkCoord) -> bool {
    neighbor_offsets().all(|(dx, dy, dz)| {
        let n = coord.offset(dx, dy, dz);
        !window.contains(n)
            || chunks
                .get(&n)
                .is_some_and(|c| c.terrain_state == ChunkState::Finished)
    })
}

fn column_ready(chunks: &ChunkMap, window: Window, cx: i32, cz: i32) -> bool {
    (0..window.vertical).all(|cy| {
        chunks
            .get(&ChunkCoord::new(cx, cy, cz))
            .is_some_and(|c| c.terrain_state == ChunkState::Finished)
    })
}

fn chunk_aabb(coord: ChunkCoord) -> Aabb {
    let [x, y, z] = coord.origin();
    Aabb::from_origin_size(
        Vec3::new(x as f32, y as f32, z as f32),
        CHUNK_LENGTH as f32,
    )
}

pub struct ChunkStreamingManager {
    cfg: StreamingConfig,
    lod_level: LodLevel,
    runtime: Runtime,
    chunks: Mutex<ChunkMap>,
    meshes: HashMap<ChunkCoord, Vec<ChunkMesh>>,
    lod_columns: HashMap<(i32, i32), LodColumn>,
    offsets: Vec<(i32, i32)>,
    window: Option<Window>,
    edited: HashSet<ChunkCoord>,
    next_job_id: u64,
    pending_jobs: usize,
    queued_last_update: usize,
}

impl ChunkStreamingManager {
    pub fn new(
        cfg: StreamingConfig,
        generator: Arc<TerrainGenerator>,
        db: Arc<BlockDatabase>,
        workers: usize,
    ) -> Result<Self, RuntimeError> {
        let runtime = Runtime::new(generator, db, workers)?;
        Ok(Self {
            lod_level: cfg.lod_level(),
            offsets: spiral_offsets(cfg.load_distance.max(0)),
            cfg,
            runtime,
            chunks: Mutex::new(HashMap::new()),
            meshes: HashMap::new(),
            lod_columns: HashMap::new(),
            window: None,
            edited: HashSet::new(),
            next_job_id: 0,
            pending_jobs: 0,
            queued_last_update: 0,
        })
    }

    /// One streaming step: recentre on `player`, apply finished work (uploading
    /// meshes through `registry`), queue new work and reclaim released meshes.
    /// Never blocks on workers.
    pub fn update<B: GpuBackend>(
        &mut self,
        player: Vec3,
        backend: &mut B,
        registry: &mut ChunkMeshRegistry,
    ) -> StreamStats {
        let mut stats = StreamStats::default();
        let c = ChunkCoord::from_world(player.x.floor() as i32, 0, player.z.floor() as i32);
        let center = (c.cx, c.cz);
        if self.window.map(|w| w.center) != Some(center) {
            self.recenter(center, &mut stats);
        }
        self.apply_results(backend, registry, &mut stats);
        self.schedule(&mut stats);
        stats.released = registry.collect_released();
        self.queued_last_update = stats.jobs();
        stats
    }

    fn recenter(&mut self, center: (i32, i32), stats: &mut StreamStats) {
        let window = Window {
            center,
            load: self.cfg.load_distance.max(0),
            lod: self.cfg.effective_lod_distance(),
            vertical: self.cfg.vertical_chunks.max(1),
        };
        self.window = Some(window);

        let mut chunks = lock(&self.chunks);
        let before = chunks.len();
        chunks.retain(|c, _| window.contains(*c));
        stats.evicted += before - chunks.len();
        for chunk in chunks.values_mut() {
            if window.is_lod_column(chunk.coord.cx, chunk.coord.cz) {
                if chunk.lod_level == LodLevel::Regular || chunk.mesh_state != ChunkState::NotFinished {
                    chunk.invalidate_mesh();
                    chunk.lod_level = LodLevel::NoMesh;
                    chunk.mesh_handle = MeshHandles::NONE;
                }
            } else if chunk.lod_level.is_lod() {
                chunk.lod_level = LodLevel::NoMesh;
            }
        }
        let resident = chunks.len();
        drop(chunks);

        self.meshes
            .retain(|c, _| window.contains(*c) && !window.is_lod_column(c.cx, c.cz));
        self.lod_columns
            .retain(|&(x, z), _| window.ring(x, z) <= window.load && window.is_lod_column(x, z));
        self.edited.retain(|c| window.contains(*c));
        log::info!(
            target: "stream",
            "recentred on column ({}, {}): {} chunks resident, {} evicted",
            center.0,
            center.1,
            resident,
            stats.evicted
        );
    }

    fn apply_results<B: GpuBackend>(
        &mut self,
        backend: &mut B,
        registry: &mut ChunkMeshRegistry,
        stats: &mut StreamStats,
    ) {
        for out in self.runtime.drain_worker_results() {
            self.pending_jobs = self.pending_jobs.saturating_sub(1);
            let what = match &out.result {
                JobResult::Terrain(_) => "terrain",
                JobResult::Mesh(_) => "mesh",
                JobResult::Lod(_) => "lod",
            };
            let applied = match out.result {
                JobResult::Terrain(grid) => {
                    self.apply_terrain(out.coord, out.job_id, out.rev, grid)
                }
                JobResult::Mesh(data) => {
                    self.apply_mesh(out.coord, out.job_id, out.rev, &data, backend, registry)
                }
                JobResult::Lod(sections) => {
                    self.apply_lod(out.coord, out.job_id, &sections, backend, registry)
                }
            };
            if applied {
                stats.applied += 1;
            } else {
                stats.discarded += 1;
                log::debug!(
                    target: "stream",
                    "discarded stale {} result for {:?} (rev {}, {} ms)",
                    what,
                    out.coord,
                    out.rev,
                    out.t_total_ms
                );
            }
        }
    }

    fn apply_terrain(
        &mut self,
        coord: ChunkCoord,
        job_id: u64,
        rev: u64,
        grid: VoxelGrid,
    ) -> bool {
        let mut chunks = lock(&self.chunks);
        match chunks.get_mut(&coord) {
            Some(chunk)
                if chunk.terrain_state == ChunkState::Queued
                    && chunk.job_id == job_id
                    && chunk.revision() == rev =>
            {
                chunk.set_grid(Arc::new(grid));
                chunk.job_id = 0;
            }
            _ => return false,
        }
        // Neighbours meshed while this chunk was outside the window saw air here.
        for (dx, dy, dz) in neighbor_offsets() {
            if let Some(n) = chunks.get_mut(&coord.offset(dx, dy, dz)) {
                if n.mesh_state != ChunkState::NotFinished {
                    n.invalidate_mesh();
                }
            }
        }
        true
    }

    fn apply_mesh<B: GpuBackend>(
        &mut self,
        coord: ChunkCoord,
        job_id: u64,
        rev: u64,
        data: &ChunkMeshData,
        backend: &mut B,
        registry: &mut ChunkMeshRegistry,
    ) -> bool {
        let current = lock(&self.chunks).get(&coord).is_some_and(|c| {
            c.mesh_state == ChunkState::Queued && c.job_id == job_id && c.revision() == rev
        });
        if !current {
            return false;
        }

        let aabb = chunk_aabb(coord);
        let mut guards = Vec::with_capacity(2);
        let mut handles = MeshHandles::NONE;
        for (class, mesh, slot) in [
            (MeshClass::OpaqueStatic, &data.opaque, &mut handles.opaque),
            (MeshClass::TranslucentStatic, &data.translucent, &mut handles.translucent),
        ] {
            if let Some(handle) = registry.allocate_mesh(backend, class, mesh, aabb, 1.0) {
                *slot = handle.id;
                guards.push(registry.adopt(handle));
            }
        }

        if let Some(chunk) = lock(&self.chunks).get_mut(&coord) {
            chunk.mesh_state = ChunkState::Finished;
            chunk.lod_level = LodLevel::Regular;
            chunk.mesh_handle = handles;
            chunk.job_id = 0;
        }
        if guards.is_empty() {
            self.meshes.remove(&coord);
        } else {
            self.meshes.insert(coord, guards);
        }
        true
    }

    fn apply_lod<B: GpuBackend>(
        &mut self,
        column: ChunkCoord,
        job_id: u64,
        sections: &[LodSection],
        backend: &mut B,
        registry: &mut ChunkMeshRegistry,
    ) -> bool {
        let Some(entry) = self.lod_columns.get_mut(&(column.cx, column.cz)) else {
            return false;
        };
        if entry.state != ChunkState::Queued || entry.job_id != job_id {
            return false;
        }

        let [ox, _, oz] = column.origin();
        let mut guards = Vec::with_capacity(sections.len());
        for section in sections {
            let origin = Vec3::new(
                ox as f32,
                (section.section * CHUNK_LENGTH) as f32,
                oz as f32,
            );
            let aabb = Aabb::from_origin_size(origin, CHUNK_LENGTH as f32);
            if let Some(handle) = registry.allocate_mesh(
                backend,
                MeshClass::LodStatic,
                &section.mesh,
                aabb,
                section.factor as f32,
            ) {
                guards.push(registry.adopt(handle));
            }
        }
        entry.meshes = guards;
        entry.state = ChunkState::Finished;
        let level = entry.level;

        let mut chunks = lock(&self.chunks);
        for cy in 0..self.cfg.vertical_chunks {
            if let Some(chunk) = chunks.get_mut(&column.with_y(cy)) {
                chunk.lod_level = level;
            }
        }
        true
    }

    fn schedule(&mut self, stats: &mut StreamStats) {
        let Some(window) = self.window else {
            return;
        };
        let budget = self.cfg.max_jobs_per_frame.max(1);
        let mut submitted = 0usize;
        let mut chunks = lock(&self.chunks);

        for &(dx, dz) in &self.offsets {
            if submitted >= budget {
                break;
            }
            let (cx, cz) = (window.center.0 + dx, window.center.1 + dz);

            for cy in 0..window.vertical {
                let coord = ChunkCoord::new(cx, cy, cz);
                let chunk = chunks.entry(coord).or_insert_with(|| {
                    stats.loaded += 1;
                    Chunk::new(coord)
                });
                if chunk.terrain_state == ChunkState::NotFinished && submitted < budget {
                    let job_id = take_id(&mut self.next_job_id);
                    chunk.terrain_state = ChunkState::Queued;
                    chunk.job_id = job_id;
                    self.runtime.submit_build_job_bg(BuildJob {
                        coord,
                        rev: chunk.revision(),
                        job_id,
                        payload: JobPayload::Terrain,
                    });
                    self.pending_jobs += 1;
                    submitted += 1;
                    stats.terrain_jobs += 1;
                }
            }

            if window.is_lod_column(cx, cz) {
                let level = self.lod_level;
                let entry = self
                    .lod_columns
                    .entry((cx, cz))
                    .or_insert_with(|| LodColumn::new(level));
                if entry.state != ChunkState::NotFinished || !column_ready(&chunks, window, cx, cz) {
                    continue;
                }
                let column_empty = (0..window.vertical).all(|cy| {
                    chunks
                        .get(&ChunkCoord::new(cx, cy, cz))
                        .is_none_or(|c| c.is_empty())
                });
                if column_empty {
                    entry.state = ChunkState::Finished;
                    entry.meshes.clear();
                    continue;
                }
                if submitted >= budget {
                    continue;
                }
                let base = ChunkCoord::new(cx, 0, cz);
                let stack = ChunkStack::gather(base, window.vertical as usize, |c| {
                    chunks.get(&c).map(|ch| Arc::clone(ch.grid()))
                });
                let job_id = take_id(&mut self.next_job_id);
                entry.state = ChunkState::Queued;
                entry.job_id = job_id;
                let edited = (0..window.vertical)
                    .filter(|&cy| self.edited.remove(&ChunkCoord::new(cx, cy, cz)))
                    .count()
                    > 0;
                let job = BuildJob {
                    coord: base,
                    rev: 0,
                    job_id,
                    payload: JobPayload::Lod {
                        stack,
                        level: entry.level,
                    },
                };
                if edited {
                    self.runtime.submit_build_job_edit(job);
                } else {
                    self.runtime.submit_build_job_bg(job);
                }
                self.pending_jobs += 1;
                submitted += 1;
                stats.lod_jobs += 1;
                continue;
            }

            for cy in 0..window.vertical {
                let coord = ChunkCoord::new(cx, cy, cz);
                let Some(chunk) = chunks.get(&coord) else {
                    continue;
                };
                if chunk.terrain_state != ChunkState::Finished
                    || chunk.mesh_state != ChunkState::NotFinished
                    || !neighbors_ready(&chunks, window, coord)
                {
                    continue;
                }
                if chunk.is_empty() {
                    // Air never emits faces; nothing to build.
                    if let Some(chunk) = chunks.get_mut(&coord) {
                        chunk.mesh_state = ChunkState::Finished;
                        chunk.lod_level = LodLevel::Regular;
                        chunk.mesh_handle = MeshHandles::NONE;
                    }
                    self.meshes.remove(&coord);
                    self.edited.remove(&coord);
                    continue;
                }
                if submitted >= budget {
                    break;
                }
                let rev = chunk.revision();
                let snapshot = NeighborSnapshot::gather(coord, |n| {
                    chunks
                        .get(&n)
                        .filter(|c| c.terrain_state == ChunkState::Finished)
                        .map(|c| Arc::clone(c.grid()))
                });
                let job_id = take_id(&mut self.next_job_id);
                if let Some(chunk) = chunks.get_mut(&coord) {
                    chunk.mesh_state = ChunkState::Queued;
                    chunk.job_id = job_id;
                }
                let job = BuildJob {
                    coord,
                    rev,
                    job_id,
                    payload: JobPayload::Mesh(snapshot),
                };
                if self.edited.remove(&coord) {
                    self.runtime.submit_build_job_edit(job);
                } else {
                    self.runtime.submit_build_job_bg(job);
                }
                self.pending_jobs += 1;
                submitted += 1;
                stats.mesh_jobs += 1;
            }
        }
    }

    /// Edits one block in a loaded chunk. Re-meshes the chunk and every
    /// neighbour whose mesh samples the edited cell (faces and AO).
    pub fn set_block(&mut self, world: [i32; 3], block: BlockType) -> bool {
        let (coord, [lx, ly, lz]) = world_to_local(world[0], world[1], world[2]);
        let mut chunks = lock(&self.chunks);
        let Some(chunk) = chunks.get_mut(&coord) else {
            log::debug!(target: "stream", "edit at {:?} outside loaded chunks", world);
            return false;
        };
        if chunk.terrain_state != ChunkState::Finished || !chunk.set_block(lx, ly, lz, block) {
            return false;
        }
        self.edited.insert(coord);

        let last = CHUNK_LENGTH as i32 - 1;
        let span = |v: i32| -> &'static [i32] {
            if v == 0 {
                &[-1, 0]
            } else if v == last {
                &[0, 1]
            } else {
                &[0]
            }
        };
        for &dy in span(ly) {
            for &dz in span(lz) {
                for &dx in span(lx) {
                    if (dx, dy, dz) == (0, 0, 0) {
                        continue;
                    }
                    let n = coord.offset(dx, dy, dz);
                    if let Some(neighbor) = chunks.get_mut(&n) {
                        if neighbor.mesh_state != ChunkState::NotFinished {
                            neighbor.invalidate_mesh();
                            self.edited.insert(n);
                        }
                    }
                }
            }
        }
        drop(chunks);

        if let Some(column) = self.lod_columns.get_mut(&(coord.cx, coord.cz)) {
            column.state = ChunkState::NotFinished;
            column.job_id = 0;
        }
        true
    }

    /// Block at a world position, or `None` if its chunk has no terrain yet.
    pub fn get_block(&self, world: [i32; 3]) -> Option<BlockType> {
        let (coord, [lx, ly, lz]) = world_to_local(world[0], world[1], world[2]);
        lock(&self.chunks)
            .get(&coord)
            .filter(|c| c.terrain_state == ChunkState::Finished)
            .map(|c| c.get_block(lx, ly, lz))
    }

    /// `(terrain_state, mesh_state, lod_level)` of a resident chunk.
    pub fn chunk_status(&self, coord: ChunkCoord) -> Option<(ChunkState, ChunkState, LodLevel)> {
        lock(&self.chunks)
            .get(&coord)
            .map(|c| (c.terrain_state, c.mesh_state, c.lod_level))
    }

    /// Handles of a resident chunk's full-resolution meshes.
    pub fn mesh_handles(&self, coord: ChunkCoord) -> Option<MeshHandles> {
        lock(&self.chunks).get(&coord).map(|c| c.mesh_handle)
    }

    /// `(level, state, resident section meshes)` of an LOD column.
    pub fn lod_column_status(&self, cx: i32, cz: i32) -> Option<(LodLevel, ChunkState, usize)> {
        self.lod_columns
            .get(&(cx, cz))
            .map(|c| (c.level, c.state, c.meshes.len()))
    }

    pub fn num_chunks(&self) -> usize {
        lock(&self.chunks).len()
    }

    /// Chunks with at least one resident full-resolution mesh.
    pub fn num_meshed_chunks(&self) -> usize {
        self.meshes.len()
    }

    pub fn num_lod_meshes(&self) -> usize {
        self.lod_columns.values().map(|c| c.meshes.len()).sum()
    }

    pub fn pending_jobs(&self) -> usize {
        self.pending_jobs
    }

    /// No jobs in flight and the last update found nothing left to queue.
    pub fn is_settled(&self) -> bool {
        self.window.is_some() && self.pending_jobs == 0 && self.queued_last_update == 0
    }

    pub fn center(&self) -> Option<(i32, i32)> {
        self.window.map(|w| w.center)
    }

    pub fn config(&self) -> &StreamingConfig {
        &self.cfg
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubit_blocks::Face;
    use cubit_gpu::{GpuConfig, HeadlessBackend};
    use cubit_mesh_cpu::MeshBuffers;
    use cubit_world::{TerrainMode, WorldGenConfig, WorldGenParams};

    fn manager() -> ChunkStreamingManager {
        let db = Arc::new(BlockDatabase::from_entries(vec![(
            "stone".into(),
            Default::default(),
        )]));
        let params = Arc::new(WorldGenParams::resolve(&WorldGenConfig::default(), &db));
        let generator = Arc::new(TerrainGenerator::new(1, TerrainMode::Solid(1), params));
        let cfg = StreamingConfig {
            load_distance: 1,
            vertical_chunks: 1,
            ..Default::default()
        };
        ChunkStreamingManager::new(cfg, generator, db, 1).unwrap()
    }

    fn quad() -> MeshBuffers {
        let mut m = MeshBuffers::default();
        m.push_quad(Face::PosY, [0, 1, 0], 1, 1, [3; 4], 0);
        m
    }

    /// A chunk with terrain and a mesh job `job_id` in flight.
    fn insert_queued(mgr: &ChunkStreamingManager, coord: ChunkCoord, job_id: u64) -> u64 {
        let mut chunk = Chunk::new(coord);
        chunk.set_grid(Arc::new(VoxelGrid::filled(1)));
        chunk.mesh_state = ChunkState::Queued;
        chunk.job_id = job_id;
        let rev = chunk.revision();
        lock(&mgr.chunks).insert(coord, chunk);
        rev
    }

    #[test]
    fn mesh_from_before_a_reload_is_stale() {
        let mut mgr = manager();
        let mut gpu = HeadlessBackend::new();
        let mut registry = ChunkMeshRegistry::new(&mut gpu, &GpuConfig::default()).unwrap();
        let mut stats = StreamStats::default();
        let coord = ChunkCoord::new(0, 0, 0);
        let data = ChunkMeshData {
            opaque: quad(),
            translucent: MeshBuffers::default(),
        };

        mgr.recenter((0, 0), &mut stats);
        let old_rev = insert_queued(&mgr, coord, 5);
        mgr.recenter((100, 100), &mut stats);
        mgr.recenter((0, 0), &mut stats);
        let new_rev = insert_queued(&mgr, coord, 9);
        assert_eq!(old_rev, new_rev);

        assert!(!mgr.apply_mesh(coord, 5, old_rev, &data, &mut gpu, &mut registry));
        assert_eq!(
            mgr.chunk_status(coord),
            Some((ChunkState::Finished, ChunkState::Queued, LodLevel::NoMesh))
        );
        assert_eq!(registry.num_meshes(MeshClass::OpaqueStatic), 0);

        assert!(mgr.apply_mesh(coord, 9, new_rev, &data, &mut gpu, &mut registry));
        assert_eq!(
            mgr.chunk_status(coord),
            Some((ChunkState::Finished, ChunkState::Finished, LodLevel::Regular))
        );
        assert_eq!(registry.num_meshes(MeshClass::OpaqueStatic), 1);
    }

    #[test]
    fn terrain_from_before_a_reload_is_stale() {
        let mut mgr = manager();
        let mut stats = StreamStats::default();
        let coord = ChunkCoord::new(1, 0, 0);
        mgr.recenter((0, 0), &mut stats);

        let mut chunk = Chunk::new(coord);
        chunk.terrain_state = ChunkState::Queued;
        chunk.job_id = 12;
        lock(&mgr.chunks).insert(coord, chunk);

        assert!(!mgr.apply_terrain(coord, 3, 0, VoxelGrid::filled(1)));
        assert_eq!(mgr.get_block([32, 0, 0]), None);
        assert!(mgr.apply_terrain(coord, 12, 0, VoxelGrid::filled(1)));
        assert_eq!(mgr.get_block([32, 0, 0]), Some(1));
    }

    #[test]
    fn both_mesh_handles_are_recorded() {
        let mut mgr = manager();
        let mut gpu = HeadlessBackend::new();
        let mut registry = ChunkMeshRegistry::new(&mut gpu, &GpuConfig::default()).unwrap();
        let mut stats = StreamStats::default();
        let coord = ChunkCoord::new(0, 0, 0);
        mgr.recenter((0, 0), &mut stats);
        let rev = insert_queued(&mgr, coord, 4);

        let data = ChunkMeshData {
            opaque: quad(),
            translucent: quad(),
        };
        assert!(mgr.apply_mesh(coord, 4, rev, &data, &mut gpu, &mut registry));
        let handles = mgr.mesh_handles(coord).unwrap();
        assert_ne!(handles.opaque, 0);
        assert_ne!(handles.translucent, 0);
        assert_eq!(registry.num_meshes(MeshClass::TranslucentStatic), 1);

        // Leaving the full-resolution ring drops them.
        mgr.recenter((5, 0), &mut stats);
        assert_eq!(mgr.mesh_handles(coord), None);
    }
}
