use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "runner-node")]
pub struct RunnerNodeConfig {
    #[arg(long, env = "RUNNER_GRPC_PORT", default_value_t = 50052)]
    pub grpc_port: u16,
}

impl RunnerNodeConfig {
    pub fn from_env() -> Self {
        Self::parse()
    }
}
