use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use crate::config::DbConfig;

pub async fn connect(config: &DbConfig) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_pool_max_conns)
        .min_connections(config.db_pool_min_conns)
        .max_lifetime(Duration::from_secs(config.db_pool_max_conn_lifetime_secs))
        .idle_timeout(Duration::from_secs(config.db_pool_max_conn_idle_time_secs))
        .test_before_acquire(true)
        .acquire_timeout(Duration::from_secs(config.db_pool_connect_timeout_secs))
        .connect(&config.connection_url())
        .await
        .context("connect to postgres")
}
