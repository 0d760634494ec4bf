use crate::cli::CommandLineArgs;
use crate::dataset::ElectionData;

use std::sync::Arc;

/// Shared application state passed to each request handler.
pub struct AppState {
    /// Command line arguments.
    pub args: CommandLineArgs,

    /// Election results loaded at startup. Never modified.
    pub data: ElectionData,
}

impl AppState {
    /// Create and return an [AppState].
    pub fn new(args: &CommandLineArgs, data: ElectionData) -> Self {
        Self {
            args: args.clone(),
            data,
        }
    }
}

/// AppState wrapped in an Atomic Reference Count (Arc) to allow multiple references.
pub type SharedAppState = Arc<AppState>;
