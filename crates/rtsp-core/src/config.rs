//! Shared configuration fragments, `#[command(flatten)]`-ed into each
//! binary's own `clap::Parser` struct.

use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct DbConfig {
    #[arg(long, env = "DB_HOST", default_value = "localhost")]
    pub db_host: String,

    #[arg(long, env = "DB_PORT", default_value_t = 5432)]
    pub db_port: u16,

    #[arg(long, env = "DB_USER", default_value = "postgres")]
    pub db_user: String,

    #[arg(long, env = "DB_PASSWORD", default_value = "postgres")]
    pub db_password: String,

    #[arg(long, env = "DB_NAME", default_value = "rtsp_control_plane")]
    pub db_name: String,

    #[arg(long, env = "DB_POOL_MAX_CONNS", default_value_t = 10)]
    pub db_pool_max_conns: u32,

    #[arg(long, env = "DB_POOL_MIN_CONNS", default_value_t = 1)]
    pub db_pool_min_conns: u32,

    #[arg(long, env = "DB_POOL_MAX_CONN_LIFETIME", default_value_t = 1800)]
    pub db_pool_max_conn_lifetime_secs: u64,

    #[arg(long, env = "DB_POOL_MAX_CONN_IDLE_TIME", default_value_t = 600)]
    pub db_pool_max_conn_idle_time_secs: u64,

    #[arg(long, env = "DB_POOL_HEALTH_CHECK_PERIOD", default_value_t = 30)]
    pub db_pool_health_check_period_secs: u64,

    #[arg(long, env = "DB_POOL_CONNECT_TIMEOUT", default_value_t = 5)]
    pub db_pool_connect_timeout_secs: u64,
}

impl DbConfig {
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db_user, self.db_password, self.db_host, self.db_port, self.db_name
        )
    }
}

#[derive(Args, Debug, Clone)]
pub struct BusConfig {
    #[arg(long, env = "KAFKA_BROKERS", default_value = "localhost:9092")]
    pub kafka_brokers: String,

    #[arg(long, env = "KAFKA_CONSUMER_GROUP", default_value = "runner-scheduler")]
    pub kafka_consumer_group: String,

    #[arg(long, env = "KAFKA_OUTBOX_TOPIC", default_value = "outbox_scenario")]
    pub kafka_outbox_topic: String,
}
