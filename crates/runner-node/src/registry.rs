use std::collections::HashMap;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A handle to the per-camera frame-processing task. The pipeline itself
/// (stream decode, inference RPC, blob upload, box drawing) is out of
/// scope; `FrameSink` is the seam a real implementation would plug into.
pub struct WorkerHandle {
    pub url: String,
    pub cancel: CancellationToken,
    pub task: JoinHandle<()>,
}

#[async_trait::async_trait]
pub trait FrameSink: Send + Sync {
    async fn on_tick(&self, camera_id: i32);
}

pub struct NoopFrameSink;

#[async_trait::async_trait]
impl FrameSink for NoopFrameSink {
    async fn on_tick(&self, _camera_id: i32) {}
}

pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("worker not found")]
    NotFound,
}

/// Process-wide registry: `camera_id -> worker handle`, protected by one
/// mutex, exactly as spec §4.H prescribes.
pub struct WorkerRegistry {
    workers: Mutex<HashMap<i32, WorkerHandle>>,
    sink: std::sync::Arc<dyn FrameSink>,
}

impl WorkerRegistry {
    pub fn new(sink: std::sync::Arc<dyn FrameSink>) -> Self {
        Self {
            workers: Mutex::new(HashMap::new()),
            sink,
        }
    }

    /// Idempotent: an existing entry for `camera_id` is left untouched and
    /// reported as already running, which is what lets the scheduler's
    /// StartWorker retries succeed after a partial-failure rollback.
    pub async fn start_worker(&self, camera_id: i32, url: &str) -> StartOutcome {
        let mut workers = self.workers.lock().await;
        if workers.contains_key(&camera_id) {
            return StartOutcome::AlreadyRunning;
        }

        let cancel = CancellationToken::new();
        let sink = self.sink.clone();
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            run_worker(camera_id, sink, task_cancel).await;
        });

        workers.insert(
            camera_id,
            WorkerHandle {
                url: url.to_string(),
                cancel,
                task,
            },
        );

        StartOutcome::Started
    }

    pub async fn remove_worker(&self, camera_id: i32) -> Result<(), RegistryError> {
        let mut workers = self.workers.lock().await;
        let Some(handle) = workers.remove(&camera_id) else {
            return Err(RegistryError::NotFound);
        };
        handle.cancel.cancel();
        handle.task.abort();
        Ok(())
    }
}

/// Stand-in for the out-of-scope frame-processing loop: grab a frame, skip
/// `fps` frames, hand it to the sink, repeat until cancelled.
async fn run_worker(camera_id: i32, sink: std::sync::Arc<dyn FrameSink>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(std::time::Duration::from_millis(200));
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = interval.tick() => {
                sink.on_tick(camera_id).await;
            }
        }
    }
}
