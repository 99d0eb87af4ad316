use runner_node::config::RunnerNodeConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    runner_node::run(RunnerNodeConfig::from_env()).await
}
