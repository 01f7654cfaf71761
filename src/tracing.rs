//! Tracing (logging)

use crate::cli::CommandLineArgs;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initlialise tracing (logging)
///
/// Applies a filter based on the `RUST_LOG` environment variable, falling back to enable debug
/// logging for this crate and tower_http if not set.
///
/// If `--enable-jaeger` is set, traces are additionally exported to a Jaeger agent in batches.
pub fn init_tracing(args: &CommandLineArgs) {
    let registry = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plotline=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer());

    if args.enable_jaeger {
        let tracer = opentelemetry_jaeger::new_agent_pipeline()
            .with_service_name("plotline")
            .install_batch(opentelemetry::runtime::Tokio)
            .expect("failed to install Jaeger tracer");
        registry
            .with(tracing_opentelemetry::layer().with_tracer(tracer))
            .init();
    } else {
        registry.init();
    }
}

/// Shut down tracing, flushing any batched spans.
pub fn shutdown_tracing() {
    opentelemetry::global::shutdown_tracer_provider();
}
