use crate::core::MAX_RETRIES;
use crate::rpc::{ServerConfig, DEFAULT_LISTEN_ADDR, DEFAULT_WORKERS};
use crate::store::redis::RedisConfig;
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::net::SocketAddr;

/// Serve bank account operations over gRPC
#[derive(Parser, Debug)]
#[command(name = "bank-server")]
#[command(about = "Serve bank account operations over gRPC", long_about = None)]
pub struct ServerArgs {
    /// Address to listen on
    #[arg(long = "listen", env = "BANK_LISTEN_ADDR", default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Backing store for account documents
    #[arg(
        long = "store",
        env = "BANK_STORE",
        value_name = "STORE",
        default_value = "redis",
        help = "Account store: 'redis' for a shared Redis server or 'memory' for a process-local store"
    )]
    pub store: StoreType,

    /// Redis host
    #[arg(long = "redis-host", env = "REDIS_HOST", default_value = "localhost")]
    pub redis_host: String,

    /// Redis port
    #[arg(long = "redis-port", env = "REDIS_PORT", default_value_t = 6379)]
    pub redis_port: u16,

    /// Redis logical database
    #[arg(long = "redis-db", env = "REDIS_DB", default_value_t = 0)]
    pub redis_db: i64,

    /// Maximum number of operations executing concurrently
    #[arg(
        long = "workers",
        env = "BANK_WORKERS",
        value_name = "COUNT",
        default_value_t = DEFAULT_WORKERS
    )]
    pub workers: usize,

    /// Optimistic-locking attempts per operation before giving up
    #[arg(
        long = "max-retries",
        env = "BANK_MAX_RETRIES",
        value_name = "COUNT",
        default_value_t = MAX_RETRIES
    )]
    pub max_retries: u32,
}

/// Available account stores
#[derive(Clone, Debug, PartialEq, ValueEnum)]
pub enum StoreType {
    Redis,
    Memory,
}

impl ServerArgs {
    /// Create a ServerConfig from CLI arguments
    ///
    /// Zero worker or retry counts fall back to the defaults with a warning.
    pub fn to_server_config(&self) -> ServerConfig {
        ServerConfig::new(self.listen_addr, self.workers, self.max_retries)
    }

    /// Create the Redis connection settings from CLI arguments
    ///
    /// One idle connection is kept per worker.
    pub fn to_redis_config(&self) -> RedisConfig {
        RedisConfig {
            host: self.redis_host.clone(),
            port: self.redis_port,
            db: self.redis_db,
            max_idle: self.workers.max(1),
        }
    }
}

/// Issue bank account operations against a running server
#[derive(Parser, Debug)]
#[command(name = "bank-client")]
#[command(about = "Issue bank account operations against a running server", long_about = None)]
pub struct ClientArgs {
    /// Server endpoint
    #[arg(
        long = "server",
        env = "BANK_SERVER",
        default_value = "http://localhost:50051"
    )]
    pub server: String,

    #[command(subcommand)]
    pub command: ClientCommand,
}

/// Client operations
#[derive(Subcommand, Debug, PartialEq)]
pub enum ClientCommand {
    /// Create an account with a zero balance
    Create { account_id: String, account_type: String },
    /// Show the balance of an account
    Balance { account_id: String },
    /// Deposit an amount
    Deposit {
        account_id: String,
        #[arg(allow_negative_numbers = true)]
        amount: Decimal,
    },
    /// Withdraw an amount
    Withdraw {
        account_id: String,
        #[arg(allow_negative_numbers = true)]
        amount: Decimal,
    },
    /// Apply one period of interest at an annual percentage rate
    Interest {
        account_id: String,
        #[arg(allow_negative_numbers = true)]
        rate: Decimal,
    },
    /// Run a short create/deposit/withdraw/interest walkthrough
    Demo {
        #[arg(default_value = "admin123")]
        account_id: String,
    },
    /// Fire concurrent deposits of 1 at one account and report the final balance
    Stress {
        account_id: String,
        #[arg(long = "count", default_value_t = 100)]
        count: usize,
    },
}
