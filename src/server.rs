//! Web server

use crate::cli;

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    process::exit,
    str::FromStr,
    time::Duration,
};

use axum::ServiceExt;
use axum_server::{tls_rustls::RustlsConfig, Handle};
use expanduser::expanduser;
use tokio::signal;
use tracing::{event, Level};

/// Log an error and exit. Used for failures during startup.
fn fail(message: String) -> ! {
    event!(Level::ERROR, "{}", message);
    exit(1)
}

/// Expand `~` in a TLS file path and check that the file exists.
///
/// # Arguments
///
/// * `path`: Path to expand
/// * `description`: Description of the file for log messages
fn tls_file(path: &str, description: &str) -> PathBuf {
    let expanded = expanduser(path).unwrap_or_else(|error| {
        fail(format!(
            "Failed to expand ~ in {} path '{}': {}. Please provide an absolute path instead.",
            description, path, error
        ))
    });
    if !Path::new(&expanded).exists() {
        fail(format!(
            "{} expected at '{}' but not found.",
            description,
            expanded.display()
        ))
    }
    expanded.canonicalize().unwrap_or_else(|error| {
        fail(format!(
            "Failed to determine absolute path to {} '{}': {}",
            description,
            expanded.display(),
            error
        ))
    })
}

/// Serve the Election Explorer API
///
/// # Arguments
///
/// * `args`: Command line arguments
/// * `service`: The [crate::app::Service] to serve
pub async fn serve(args: &cli::CommandLineArgs, service: crate::app::Service) {
    let addr = SocketAddr::from_str(&format!("{}:{}", args.host, args.port)).unwrap_or_else(|_| {
        fail(format!(
            "Invalid host name, IP address or port number: {}:{}",
            args.host, args.port
        ))
    });

    // Catch ctrl+c and try to shutdown gracefully
    let handle = Handle::new();
    tokio::spawn(shutdown_signal(
        handle.clone(),
        args.graceful_shutdown_timeout,
    ));

    let result = if args.https {
        let cert_file = tls_file(&args.cert_file, "TLS certificate file");
        let key_file = tls_file(&args.key_file, "TLS key file");
        let tls_config = RustlsConfig::from_pem_file(cert_file, key_file)
            .await
            .unwrap_or_else(|error| {
                fail(format!("Failed to load TLS certificate files: {}", error))
            });
        event!(Level::INFO, "Listening on https://{}", addr);
        // run HTTPS server with hyper
        axum_server::bind_rustls(addr, tls_config)
            .handle(handle)
            .serve(service.into_make_service())
            .await
    } else {
        event!(Level::INFO, "Listening on http://{}", addr);
        // run HTTP server with hyper
        axum_server::bind(addr)
            .handle(handle)
            .serve(service.into_make_service())
            .await
    };

    if let Err(error) = result {
        fail(format!("Server error: {}", error))
    }
}

/// Graceful shutdown handler
///
/// Installs signal handlers to catch Ctrl-C or SIGTERM and trigger a graceful shutdown.
async fn shutdown_signal(handle: Handle, timeout: u64) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            fail(format!("Failed to install Ctrl+C handler: {}", error))
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => fail(format!("Failed to install signal handler: {}", error)),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    event!(Level::INFO, "Signal received, starting graceful shutdown");
    // Force shutdown if graceful shutdown takes longer than the timeout
    handle.graceful_shutdown(Some(Duration::from_secs(timeout)));
}
