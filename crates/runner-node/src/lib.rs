pub mod config;
pub mod grpc;
pub mod registry;

use anyhow::Context;
use runner_proto::runner::runner_service_server::RunnerServiceServer;
use std::sync::Arc;
use tracing::info;

use config::RunnerNodeConfig;
use grpc::RunnerNodeService;
use registry::{NoopFrameSink, WorkerRegistry};

pub async fn run(config: RunnerNodeConfig) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", config.grpc_port)
        .parse()
        .context("parse grpc bind addr")?;

    let registry = Arc::new(WorkerRegistry::new(Arc::new(NoopFrameSink)));
    let service = RunnerNodeService::new(registry);

    info!(event = "runner_node.listening", port = config.grpc_port);

    tonic::transport::Server::builder()
        .add_service(RunnerServiceServer::new(service))
        .serve_with_shutdown(addr, async {
            let _ = tokio::signal::ctrl_c().await;
            info!(event = "runner_node.shutdown_signal");
        })
        .await
        .context("serve grpc")?;

    Ok(())
}
