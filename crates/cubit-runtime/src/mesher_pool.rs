use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_channel::{Receiver, Sender, bounded};
use cubit_mesh_cpu::{GreedyMesher, LodMesher};

/// Reusable per-job meshing state. The greedy mesher's face-info arena is
/// large, so workers borrow one instead of building it per job.
#[derive(Default)]
pub struct MeshScratch {
    pub greedy: GreedyMesher,
    pub lod: LodMesher,
}

/// Lock-free pool of [`MeshScratch`] instances shared by all workers.
pub struct MesherPool {
    available_tx: Sender<MeshScratch>,
    available_rx: Receiver<MeshScratch>,
    allocated: AtomicUsize,
    max_scratch: usize,
}

impl MesherPool {
    pub fn new(max_scratch: usize) -> Self {
        debug_assert!(max_scratch > 0);
        let (tx, rx) = bounded(max_scratch);
        Self {
            available_tx: tx,
            available_rx: rx,
            allocated: AtomicUsize::new(0),
            max_scratch,
        }
    }

    pub fn with_capacity_from_workers(worker_count: usize) -> Self {
        Self::new(worker_count.max(1))
    }

    /// Runs `f` with a pooled scratch, creating one while under capacity and
    /// otherwise waiting for another worker to return theirs.
    pub fn with_scratch<R>(&self, f: impl FnOnce(&mut MeshScratch) -> R) -> R {
        let mut scratch = self.acquire();
        let out = f(&mut scratch);
        // Capacity matches the number of scratches ever created, so this never blocks.
        let _ = self.available_tx.try_send(scratch);
        out
    }

    fn acquire(&self) -> MeshScratch {
        if let Ok(scratch) = self.available_rx.try_recv() {
            return scratch;
        }
        loop {
            let current = self.allocated.load(Ordering::Acquire);
            if current < self.max_scratch {
                let prev = self.allocated.fetch_add(1, Ordering::AcqRel);
                if prev < self.max_scratch {
                    return MeshScratch::default();
                }
                self.allocated.fetch_sub(1, Ordering::AcqRel);
            }
            // We hold a sender, so recv only fails if the pool is being torn down.
            match self.available_rx.recv() {
                Ok(scratch) => return scratch,
                Err(_) => return MeshScratch::default(),
            }
        }
    }

    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }
}
