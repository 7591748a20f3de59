//! Server assembly
//!
//! Builds the engine and the gRPC handler for a store and serves them until
//! the shutdown signal resolves.

use super::service::{BankGrpcService, DEFAULT_WORKERS};
use crate::core::{AccountEngine, EngineConfig, RetryPolicy};
use crate::store::AccountStore;
use std::future::Future;
use std::net::SocketAddr;
use tonic::transport::Server;
use tracing::{info, warn};

/// Default listen address of the service
pub const DEFAULT_LISTEN_ADDR: &str = "[::]:50051";

/// Configuration for the gRPC server
#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    /// Address the server binds to
    pub listen_addr: SocketAddr,
    /// Maximum number of operations executing concurrently
    pub workers: usize,
    /// Engine settings shared by every handler
    pub engine: EngineConfig,
}

impl ServerConfig {
    /// Create a ServerConfig, replacing zero values with defaults
    pub fn new(listen_addr: SocketAddr, workers: usize, max_retries: u32) -> Self {
        let workers = if workers == 0 {
            warn!(
                workers,
                default = DEFAULT_WORKERS,
                "Invalid worker count, using default"
            );
            DEFAULT_WORKERS
        } else {
            workers
        };

        Self {
            listen_addr,
            workers,
            engine: EngineConfig {
                retry: RetryPolicy::new(max_retries),
            },
        }
    }
}

/// Serve `store` over gRPC until `shutdown` resolves
///
/// # Errors
///
/// Returns the transport error if the address cannot be bound or the server
/// fails while running.
pub async fn serve<S, F>(
    config: &ServerConfig,
    store: S,
    shutdown: F,
) -> Result<(), tonic::transport::Error>
where
    S: AccountStore,
    F: Future<Output = ()>,
{
    let engine = AccountEngine::new(store, config.engine);
    let service = BankGrpcService::new(engine, config.workers);

    info!(
        addr = %config.listen_addr,
        workers = config.workers,
        max_attempts = config.engine.retry.max_attempts,
        "Bank service listening"
    );

    Server::builder()
        .add_service(service.into_server())
        .serve_with_shutdown(config.listen_addr, shutdown)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn addr() -> SocketAddr {
        DEFAULT_LISTEN_ADDR.parse().unwrap()
    }

    #[rstest]
    #[case::defaults(10, 3, 10, 3)]
    #[case::custom(4, 8, 4, 8)]
    #[case::zero_workers(0, 3, DEFAULT_WORKERS, 3)]
    #[case::zero_retries(10, 0, 10, crate::core::MAX_RETRIES)]
    fn test_server_config(
        #[case] workers: usize,
        #[case] max_retries: u32,
        #[case] expected_workers: usize,
        #[case] expected_attempts: u32,
    ) {
        let config = ServerConfig::new(addr(), workers, max_retries);

        assert_eq!(config.listen_addr, addr());
        assert_eq!(config.workers, expected_workers);
        assert_eq!(config.engine.retry.max_attempts, expected_attempts);
    }
}
