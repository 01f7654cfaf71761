//! This file defines the plotline binary entry point.

use plotline::app;
use plotline::cli;
use plotline::metrics;
use plotline::server;
use plotline::tracing;

/// Application entry point
#[tokio::main]
async fn main() {
    let args = cli::parse();
    println!("{:?}", args);
    tracing::init_tracing(&args);
    metrics::register_metrics();
    let service = app::service(&args);
    server::serve(&args, service).await;
    tracing::shutdown_tracing();
}
