use runner_proto::runner::runner_service_server::RunnerService;
use runner_proto::runner::{RemoveWorkerRequest, StartWorkerRequest, WorkerReply};
use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::info;

use crate::registry::{RegistryError, StartOutcome, WorkerRegistry};

pub struct RunnerNodeService {
    registry: Arc<WorkerRegistry>,
}

impl RunnerNodeService {
    pub fn new(registry: Arc<WorkerRegistry>) -> Self {
        Self { registry }
    }
}

#[tonic::async_trait]
impl RunnerService for RunnerNodeService {
    async fn start_worker(
        &self,
        request: Request<StartWorkerRequest>,
    ) -> Result<Response<WorkerReply>, Status> {
        let req = request.into_inner();
        match self.registry.start_worker(req.camera_id, &req.url).await {
            StartOutcome::Started => {
                info!(event = "runner_node.worker_started", camera_id = req.camera_id);
            }
            StartOutcome::AlreadyRunning => {
                info!(
                    event = "runner_node.worker_already_running",
                    camera_id = req.camera_id
                );
            }
        }

        Ok(Response::new(WorkerReply {
            success: true,
            error: String::new(),
        }))
    }

    async fn remove_worker(
        &self,
        request: Request<RemoveWorkerRequest>,
    ) -> Result<Response<WorkerReply>, Status> {
        let req = request.into_inner();
        match self.registry.remove_worker(req.camera_id).await {
            Ok(()) => {
                info!(event = "runner_node.worker_removed", camera_id = req.camera_id);
                Ok(Response::new(WorkerReply {
                    success: true,
                    error: String::new(),
                }))
            }
            Err(RegistryError::NotFound) => Ok(Response::new(WorkerReply {
                success: false,
                error: "worker not found".to_string(),
            })),
        }
    }
}
