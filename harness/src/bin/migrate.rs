use anyhow::Context;
use clap::Parser;
use rtsp_core::config::DbConfig;
use sqlx::postgres::PgPoolOptions;

#[derive(Parser, Debug)]
#[command(name = "rtsp-migrate")]
struct Cli {
    #[command(flatten)]
    db: DbConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&cli.db.connection_url())
        .await
        .context("connect to database")?;

    sqlx::migrate!("./migrations").run(&pool).await.context("run migrations")?;
    tracing::info!(event = "rtsp_migrate.applied");
    Ok(())
}
