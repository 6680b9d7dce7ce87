// src/infra/logger.rs — Tracing setup for the server and CLI
//
// Filter precedence: RUST_LOG, then STORYMILL_LOG, then the built-in
// default. Targets stay on so analytics delivery warnings can be traced
// back to their module.

use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

fn filter_directives() -> String {
    std::env::var("RUST_LOG")
        .or_else(|_| std::env::var("STORYMILL_LOG"))
        .unwrap_or_else(|_| DEFAULT_FILTER.to_string())
}

pub fn init_logging() {
    fmt()
        .with_env_filter(EnvFilter::new(filter_directives()))
        .with_target(true)
        .compact()
        .init();
}
