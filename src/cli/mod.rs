// CLI module
// Command-line interface and argument parsing for both binaries

mod args;

pub use args::{ClientArgs, ClientCommand, ServerArgs, StoreType};

use clap::Parser;

/// Parse the server's command-line arguments using clap
///
/// Values missing from the command line are taken from the environment
/// (`BANK_*`, `REDIS_*`) and then from the built-in defaults. On invalid
/// arguments or `--help`, clap prints a message and exits the process.
pub fn parse_server_args() -> ServerArgs {
    ServerArgs::parse()
}

/// Parse the client's command-line arguments using clap
pub fn parse_client_args() -> ClientArgs {
    ClientArgs::parse()
}

/// Install the global `tracing` subscriber
///
/// The filter defaults to `info` and can be overridden with `RUST_LOG`.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
