use async_trait::async_trait;
use rtsp_core::error::Result;
use runner_proto::runner::runner_service_client::RunnerServiceClient;
use runner_proto::runner::StartWorkerRequest;

/// Seam between the scheduler's DB-transaction logic and `RunnerRPC`, kept
/// separate so scheduler ticks can be tested against a fake node without a
/// live gRPC server — the same role `MessageBus` plays for the bus.
#[async_trait]
pub trait RunnerClient: Send + Sync {
    async fn start_worker(&self, addr: &str, camera_id: i32, url: &str) -> Result<()>;
}

pub struct GrpcRunnerClient;

#[async_trait]
impl RunnerClient for GrpcRunnerClient {
    async fn start_worker(&self, addr: &str, camera_id: i32, url: &str) -> Result<()> {
        let endpoint = format!("http://{addr}");
        let mut client = RunnerServiceClient::connect(endpoint)
            .await
            .map_err(|err| anyhow::anyhow!("connect to runner node {addr}: {err}"))?;

        let response = client
            .start_worker(StartWorkerRequest {
                camera_id,
                url: url.to_string(),
            })
            .await
            .map_err(|err| anyhow::anyhow!("StartWorker rpc to {addr}: {err}"))?
            .into_inner();

        if !response.success {
            return Err(anyhow::anyhow!(
                "StartWorker rejected by {addr}: {}",
                response.error
            )
            .into());
        }

        Ok(())
    }
}
