use runner_scheduler::config::RunnerSchedulerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    runner_scheduler::run(RunnerSchedulerConfig::from_env()).await
}
