//! Command Line Interface (CLI) arguments.

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Election Explorer command line interface
#[derive(Clone, Debug, Parser)]
pub struct CommandLineArgs {
    /// The IP address on which the server should listen
    #[arg(long, default_value = "0.0.0.0", env = "ELECTION_EXPLORER_HOST")]
    pub host: String,
    /// The port to which the server should bind
    #[arg(long, default_value_t = 8080, env = "ELECTION_EXPLORER_PORT")]
    pub port: u16,
    /// Flag indicating whether HTTPS should be used
    #[arg(long, default_value_t = false, env = "ELECTION_EXPLORER_HTTPS")]
    pub https: bool,
    /// Path to the certificate file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/election-explorer/certs/cert.pem",
        env = "ELECTION_EXPLORER_CERT_FILE"
    )]
    pub cert_file: String,
    /// Path to the key file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/election-explorer/certs/key.pem",
        env = "ELECTION_EXPLORER_KEY_FILE"
    )]
    pub key_file: String,
    /// Maximum time in seconds to wait for operations to complete upon receiving `ctrl+c` signal.
    #[arg(long, default_value_t = 60, env = "ELECTION_EXPLORER_SHUTDOWN_TIMEOUT")]
    pub graceful_shutdown_timeout: u64,
    /// Directory containing the election results CSV files
    #[arg(long, default_value = "data", env = "ELECTION_EXPLORER_DATA_DIR")]
    pub data_dir: String,
    /// Comma separated origins allowed to make cross-origin requests. `*` allows any origin.
    #[arg(
        long,
        default_value = "*",
        value_delimiter = ',',
        env = "ELECTION_EXPLORER_CORS_ORIGINS"
    )]
    pub cors_origins: Vec<String>,
    /// Log filter directives used when `RUST_LOG` is not set
    #[arg(
        long,
        default_value = "election_explorer=debug,tower_http=debug",
        value_parser = parse_log_filter,
        env = "ELECTION_EXPLORER_LOG_FILTER"
    )]
    pub log_filter: String,
}

/// Check that `directives` form a valid log filter.
fn parse_log_filter(directives: &str) -> Result<String, String> {
    EnvFilter::try_new(directives)
        .map(|_| directives.to_string())
        .map_err(|error| error.to_string())
}

/// Returns parsed command line arguments.
pub fn parse() -> CommandLineArgs {
    CommandLineArgs::parse()
}
