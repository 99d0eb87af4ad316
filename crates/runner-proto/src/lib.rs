//! Generated gRPC client/server code for `RunnerService`.

pub mod runner {
    tonic::include_proto!("runner.v1");
}
