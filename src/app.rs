use std::sync::Arc;

use cubit_blocks::{BlockDatabase, BlockDbError};
use cubit_chunk::CHUNK_LENGTH;
use cubit_geom::{Aabb, Mat4, Vec3};
use cubit_gpu::{
    ChunkMesh, ChunkMeshRegistry, DrawBatcher, FrameParams, FrameStats, GpuBackend, GpuError,
    MeshClass,
};
use cubit_mesh_cpu::generate_block;
use cubit_runtime::{ChunkStreamingManager, RuntimeError, StreamStats};
use cubit_world::{TerrainGenerator, TerrainMode, WorldGenConfig, WorldGenError, WorldGenParams};
use thiserror::Error;

use crate::camera::{Camera, FpsCamera, OrbitCamera};
use crate::config::{AppConfig, CameraKind, ConfigError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Blocks(#[from] BlockDbError),
    #[error(transparent)]
    WorldGen(#[from] WorldGenError),
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FrameReport {
    pub frame: u64,
    pub stream: StreamStats,
    pub draw: FrameStats,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub applied: usize,
    pub discarded: usize,
    pub evicted: usize,
    pub draw_calls: u64,
}

/// Owns every subsystem of the demo for its whole lifetime. Nothing here is
/// global; tests build as many contexts as they like.
pub struct AppContext<B: GpuBackend> {
    pub cfg: AppConfig,
    pub db: Arc<BlockDatabase>,
    pub camera: Camera,
    pub streaming: ChunkStreamingManager,
    pub batcher: DrawBatcher,
    pub registry: ChunkMeshRegistry,
    pub backend: B,
    /// Dynamic block drawn in front of the camera every frame.
    marker: Option<ChunkMesh>,
    frame: u64,
}

impl<B: GpuBackend> AppContext<B> {
    pub fn new(cfg: AppConfig, mut backend: B) -> Result<Self, AppError> {
        let db = Arc::new(BlockDatabase::load_from_path(&cfg.world.blocks)?);
        let worldgen = WorldGenConfig::load_from_path(&cfg.world.worldgen)?;
        let params = Arc::new(WorldGenParams::resolve(&worldgen, &db));
        let mode = TerrainMode::from_kind(cfg.world.mode, &params);
        let generator = Arc::new(
            TerrainGenerator::new(cfg.world.seed, mode, params)
                .with_vertical_chunks(cfg.streaming.vertical_chunks),
        );
        log::info!(
            target: "app",
            "world seed {} mode {:?}, {} block types",
            cfg.world.seed,
            mode,
            db.len()
        );

        let spawn_y = spawn_height(&generator, cfg.streaming.vertical_chunks);
        let spawn = Vec3::new(16.0, spawn_y, 16.0);
        let camera = match cfg.render.camera {
            CameraKind::Fps => Camera::Fps(FpsCamera::new(spawn)),
            CameraKind::Orbit => Camera::Orbit(OrbitCamera::new(
                Vec3::new(spawn.x, spawn_y - 24.0, spawn.z),
                96.0,
            )),
        };

        let mut registry = ChunkMeshRegistry::new(&mut backend, &cfg.gpu)?;
        let batcher = DrawBatcher::new(&mut backend, &cfg.gpu);
        let streaming = ChunkStreamingManager::new(
            cfg.streaming.clone(),
            generator,
            Arc::clone(&db),
            cfg.runtime.workers,
        )?;

        let marker_block = db.id_by_name("glass").unwrap_or_else(|| db.default_block());
        let cube = generate_block(&db.texture_indices(marker_block));
        let marker = registry
            .allocate_mesh(
                &mut backend,
                MeshClass::Dynamic,
                &cube,
                Aabb::from_origin_size(Vec3::ZERO, 1.0),
                1.0,
            )
            .map(|h| registry.adopt(h));

        Ok(Self {
            cfg,
            db,
            camera,
            streaming,
            batcher,
            registry,
            backend,
            marker,
            frame: 0,
        })
    }

    /// Advances the camera, streams chunks around it and renders one frame.
    pub fn frame(&mut self, dt: f32) -> FrameReport {
        self.camera.advance(dt);
        let eye = self.camera.position();
        let stream = self
            .streaming
            .update(eye, &mut self.backend, &mut self.registry);

        if let Some(marker) = &self.marker {
            let forward = self.camera.target() - eye;
            let at = eye + forward.normalized() * 4.0;
            self.batcher.submit_chunk_draw_command(
                &self.registry,
                Mat4::translation(at),
                marker.handle(),
            );
        }

        let render = &self.cfg.render;
        let params = FrameParams {
            view_proj: self.camera.view_proj(render.fov_degrees, render.aspect),
            camera_pos: eye,
            cull_frustum: render.cull_frustum,
            min_distance: render.min_cull_distance,
            max_distance: render.max_cull_distance,
        };
        let draw = self
            .batcher
            .render(&mut self.backend, &mut self.registry, &params);
        self.frame += 1;
        FrameReport {
            frame: self.frame,
            stream,
            draw,
        }
    }

    pub fn run(&mut self, frames: u64, dt: f32) -> RunSummary {
        let mut summary = RunSummary::default();
        for _ in 0..frames {
            let report = self.frame(dt);
            summary.frames += 1;
            summary.applied += report.stream.applied;
            summary.discarded += report.stream.discarded;
            summary.evicted += report.stream.evicted;
            summary.draw_calls += u64::from(report.draw.draw_calls);
            log::debug!(target: "app", "{:?}", report);
            if report.frame % 60 == 0 {
                self.log_stats(&report);
            }
        }
        self.log_stats(&FrameReport {
            frame: self.frame,
            ..Default::default()
        });
        summary
    }

    fn log_stats(&self, report: &FrameReport) {
        let (q_edit, inflight_edit, q_bg, inflight_bg) = self.streaming.runtime().queue_debug_counts();
        let (vtx, idx) = self.registry.stats(MeshClass::OpaqueStatic);
        let eye = self.camera.position();
        log::info!(
            target: "app",
            "frame {} at ({:.0}, {:.0}, {:.0}): {} chunks, {} meshed, {} lod meshes, jobs edit {}+{} bg {}+{}",
            report.frame,
            eye.x,
            eye.y,
            eye.z,
            self.streaming.num_chunks(),
            self.streaming.num_meshed_chunks(),
            self.streaming.num_lod_meshes(),
            q_edit,
            inflight_edit,
            q_bg,
            inflight_bg
        );
        log::info!(
            target: "app",
            "  draw: {} candidates, {} calls, {} dynamic | opaque vtx {}/{} bytes ({} allocs, largest free {}), idx {}/{} bytes",
            report.draw.static_candidates,
            report.draw.draw_calls,
            report.draw.dynamic_draws,
            vtx.used_bytes,
            vtx.capacity,
            vtx.num_allocs,
            vtx.largest_free_block,
            idx.used_bytes,
            idx.capacity
        );
    }

    #[inline]
    pub fn frames_rendered(&self) -> u64 {
        self.frame
    }
}

fn spawn_height(generator: &TerrainGenerator, vertical_chunks: i32) -> f32 {
    let top = match generator.mode() {
        TerrainMode::Noise => generator.height_at(16, 16),
        TerrainMode::Flat { thickness, .. } => thickness,
        _ => vertical_chunks * CHUNK_LENGTH as i32,
    };
    (top + 24) as f32
}
