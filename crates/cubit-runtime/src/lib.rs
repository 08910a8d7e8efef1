//! Worker pools for terrain generation and meshing, plus the streaming manager
//! that feeds them and hands finished meshes to the GPU registry.
#![forbid(unsafe_code)]

mod config;
mod error;
mod mesher_pool;
mod spiral;
mod streaming;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, TryRecvError, select, unbounded};
use cubit_blocks::BlockDatabase;
use cubit_chunk::{ChunkCoord, ChunkStack, LodLevel, NeighborSnapshot, VoxelGrid};
use cubit_mesh_cpu::{ChunkMeshData, LodSection};
use cubit_world::TerrainGenerator;
use rayon::{ThreadPool, ThreadPoolBuilder};

pub use config::StreamingConfig;
pub use error::RuntimeError;
pub use mesher_pool::{MeshScratch, MesherPool};
pub use spiral::spiral_offsets;
pub use streaming::{ChunkStreamingManager, StreamStats};

/// Work a job asks for. Mesh jobs carry a read-only snapshot of the 27-chunk
/// neighbourhood, LOD jobs the whole vertical column.
#[derive(Clone, Debug)]
pub enum JobPayload {
    Terrain,
    Mesh(NeighborSnapshot),
    Lod { stack: ChunkStack, level: LodLevel },
}

#[derive(Clone, Debug)]
pub struct BuildJob {
    pub coord: ChunkCoord,
    /// Chunk revision the job was built from.
    pub rev: u64,
    pub job_id: u64,
    pub payload: JobPayload,
}

pub enum JobResult {
    Terrain(VoxelGrid),
    Mesh(ChunkMeshData),
    Lod(Vec<LodSection>),
}

pub struct JobOut {
    pub coord: ChunkCoord,
    pub rev: u64,
    pub job_id: u64,
    pub kind: JobKind,
    pub result: JobResult,
    pub t_total_ms: u32,
}

/// Queue a job went through. Edits jump ahead of background streaming work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobKind {
    Edit,
    Bg,
}

/// Queued and running job counts of one lane.
#[derive(Default)]
struct LaneCounters {
    queued: AtomicUsize,
    running: AtomicUsize,
}

impl LaneCounters {
    fn snapshot(&self) -> (usize, usize) {
        (
            self.queued.load(Ordering::Relaxed),
            self.running.load(Ordering::Relaxed),
        )
    }
}

struct WorkerCtx {
    generator: Arc<TerrainGenerator>,
    db: Arc<BlockDatabase>,
    scratch: Arc<MesherPool>,
    results: Sender<JobOut>,
    edit: Arc<LaneCounters>,
    bg: Arc<LaneCounters>,
}

impl WorkerCtx {
    fn run(&self, job: BuildJob, kind: JobKind) {
        let lane = match kind {
            JobKind::Edit => &self.edit,
            JobKind::Bg => &self.bg,
        };
        lane.queued.fetch_sub(1, Ordering::Relaxed);
        lane.running.fetch_add(1, Ordering::Relaxed);
        let out = self.build(job, kind);
        lane.running.fetch_sub(1, Ordering::Relaxed);
        // The manager dropping its receiver just means nobody wants results anymore.
        let _ = self.results.send(out);
    }

    fn build(&self, job: BuildJob, kind: JobKind) -> JobOut {
        let started = Instant::now();
        let result = match job.payload {
            JobPayload::Terrain => JobResult::Terrain(self.generator.generate(job.coord)),
            JobPayload::Mesh(snapshot) => JobResult::Mesh(
                self.scratch
                    .with_scratch(|s| s.greedy.mesh(&snapshot.view(), &self.db)),
            ),
            JobPayload::Lod { stack, level } => JobResult::Lod(
                self.scratch
                    .with_scratch(|s| s.lod.mesh(&stack, level, &self.db)),
            ),
        };
        JobOut {
            coord: job.coord,
            rev: job.rev,
            job_id: job.job_id,
            kind,
            result,
            t_total_ms: started.elapsed().as_millis().min(u128::from(u32::MAX)) as u32,
        }
    }

    /// Edit-lane worker: drains edit jobs until the manager goes away.
    fn edit_loop(&self, edits: Receiver<BuildJob>) {
        for job in edits.iter() {
            self.run(job, JobKind::Edit);
        }
    }

    /// Background worker. Pending edits always win over streaming work.
    fn bg_loop(&self, edits: Receiver<BuildJob>, bg: Receiver<BuildJob>) {
        loop {
            match edits.try_recv() {
                Ok(job) => {
                    self.run(job, JobKind::Edit);
                    continue;
                }
                Err(TryRecvError::Disconnected) => return,
                Err(TryRecvError::Empty) => {}
            }
            select! {
                recv(edits) -> job => match job {
                    Ok(job) => self.run(job, JobKind::Edit),
                    Err(_) => return,
                },
                recv(bg) -> job => match job {
                    Ok(job) => self.run(job, JobKind::Bg),
                    Err(_) => return,
                },
            }
        }
    }
}

fn build_pool(lane: &'static str, threads: usize) -> Result<ThreadPool, RuntimeError> {
    ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(move |i| format!("cubit-{lane}-{i}"))
        .build()
        .map_err(|source| RuntimeError::ThreadPool { lane, source })
}

/// Two rayon pools fed by crossbeam channels: a single-thread edit lane and a
/// background lane whose workers also help with edits.
pub struct Runtime {
    edit_tx: Sender<BuildJob>,
    bg_tx: Sender<BuildJob>,
    results: Receiver<JobOut>,
    edit: Arc<LaneCounters>,
    bg: Arc<LaneCounters>,
    _pools: [ThreadPool; 2],
    pub w_edit: usize,
    pub w_bg: usize,
}

impl Runtime {
    /// Spawns one edit worker and `workers - 1` background workers (at least
    /// one). `workers == 0` uses the available parallelism.
    pub fn new(
        generator: Arc<TerrainGenerator>,
        db: Arc<BlockDatabase>,
        workers: usize,
    ) -> Result<Self, RuntimeError> {
        let workers = match workers {
            0 => thread::available_parallelism().map_or(4, |n| n.get()),
            n => n,
        };
        let w_edit = 1;
        let w_bg = workers.saturating_sub(w_edit).max(1);
        log::info!(target: "runtime", "worker pools: {} edit, {} background", w_edit, w_bg);

        let (edit_tx, edit_rx) = unbounded::<BuildJob>();
        let (bg_tx, bg_rx) = unbounded::<BuildJob>();
        let (res_tx, results) = unbounded::<JobOut>();
        let edit = Arc::new(LaneCounters::default());
        let bg = Arc::new(LaneCounters::default());
        let ctx = Arc::new(WorkerCtx {
            generator,
            db,
            scratch: Arc::new(MesherPool::with_capacity_from_workers(w_edit + w_bg)),
            results: res_tx,
            edit: Arc::clone(&edit),
            bg: Arc::clone(&bg),
        });

        let edit_pool = build_pool("edit", w_edit)?;
        for _ in 0..w_edit {
            let (ctx, edits) = (Arc::clone(&ctx), edit_rx.clone());
            edit_pool.spawn(move || ctx.edit_loop(edits));
        }
        let bg_pool = build_pool("bg", w_bg)?;
        for _ in 0..w_bg {
            let (ctx, edits, jobs) = (Arc::clone(&ctx), edit_rx.clone(), bg_rx.clone());
            bg_pool.spawn(move || ctx.bg_loop(edits, jobs));
        }

        Ok(Self {
            edit_tx,
            bg_tx,
            results,
            edit,
            bg,
            _pools: [edit_pool, bg_pool],
            w_edit,
            w_bg,
        })
    }

    fn submit(tx: &Sender<BuildJob>, lane: &LaneCounters, job: BuildJob) {
        lane.queued.fetch_add(1, Ordering::Relaxed);
        if tx.send(job).is_err() {
            lane.queued.fetch_sub(1, Ordering::Relaxed);
        }
    }

    pub fn submit_build_job_edit(&self, job: BuildJob) {
        Self::submit(&self.edit_tx, &self.edit, job);
    }

    pub fn submit_build_job_bg(&self, job: BuildJob) {
        Self::submit(&self.bg_tx, &self.bg, job);
    }

    pub fn drain_worker_results(&self) -> Vec<JobOut> {
        self.results.try_iter().collect()
    }

    /// `(queued_edit, inflight_edit, queued_bg, inflight_bg)`.
    pub fn queue_debug_counts(&self) -> (usize, usize, usize, usize) {
        let (q_edit, inflight_edit) = self.edit.snapshot();
        let (q_bg, inflight_bg) = self.bg.snapshot();
        (q_edit, inflight_edit, q_bg, inflight_bg)
    }
}
