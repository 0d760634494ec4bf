//! This file defines the election-explorer binary entry point.

use election_explorer::app;
use election_explorer::cli;
use election_explorer::error::log_error_chain;
use election_explorer::loader;
use election_explorer::metrics;
use election_explorer::server;
use election_explorer::tracing;

use expanduser::expanduser;
use std::process::exit;
use ::tracing::{event, Level};

/// Application entry point
#[tokio::main]
async fn main() {
    let args = cli::parse();
    tracing::init_tracing(&args);
    event!(Level::DEBUG, "{:?}", args);
    metrics::register_metrics();

    let data_dir = match expanduser(&args.data_dir) {
        Ok(path) => path,
        Err(error) => {
            event!(
                Level::ERROR,
                "Failed to expand ~ in data directory '{}': {}",
                args.data_dir,
                error
            );
            exit(1)
        }
    };
    let data = match loader::load_dir(&data_dir) {
        Ok(data) => data,
        Err(error) => {
            log_error_chain(&error);
            exit(1)
        }
    };
    metrics::record_loaded(&data);

    let service = app::service(&args, data);
    server::serve(&args, service).await;
}
