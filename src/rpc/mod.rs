//! Service façade
//!
//! - `pb` - Protobuf messages and tonic stubs generated from `proto/bank.proto`
//! - `service` - The `bank.BankService` handler
//! - `status` - Engine outcome to gRPC status mapping
//! - `server` - Server configuration and startup
//! - `client` - Typed client used by `bank-client` and the tests

pub mod client;
pub mod server;
pub mod service;
pub mod status;

/// Generated protobuf code
pub mod pb {
    tonic::include_proto!("bank");
}

pub use client::{BankClient, Receipt};
pub use server::{serve, ServerConfig, DEFAULT_LISTEN_ADDR};
pub use service::{BankGrpcService, DEFAULT_WORKERS};
