//! Structured logging using **tracing**.
//!
//! The core only emits events (`debug!` for cache traffic, `warn!` for files
//! that failed to parse). Installing a subscriber is left to the embedding
//! binary, which calls one of the initializers below exactly once.

/// Initializes the global tracing collector with JSON output on stderr.
///
/// # Environment Variables
/// - `RUST_LOG`: Controls log filtering (e.g., `RUST_LOG=deadsym_core=debug`)
pub fn init_structured_logging() {
    tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_current_span(true)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr) // stdout carries tool output
        .init();
}

/// Initializes a compact, human-readable collector on stderr.
///
/// Defaults to `warn` when `RUST_LOG` is unset.
pub fn init_plain_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .compact()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
