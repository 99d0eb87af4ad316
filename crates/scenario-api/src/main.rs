use scenario_api::config::ScenarioApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    scenario_api::run(ScenarioApiConfig::from_env()).await
}
