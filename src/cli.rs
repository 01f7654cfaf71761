//! Command Line Interface (CLI) arguments.

use clap::Parser;

/// Plotline command line interface
#[derive(Clone, Debug, Parser)]
pub struct CommandLineArgs {
    /// The IP address on which the server should listen
    #[arg(long, default_value = "0.0.0.0", env = "PLOTLINE_HOST")]
    pub host: String,
    /// The port to which the server should bind
    #[arg(long, default_value_t = 8080, env = "PLOTLINE_PORT")]
    pub port: u16,
    /// Flag indicating whether HTTPS should be used
    #[arg(long, default_value_t = false, env = "PLOTLINE_HTTPS")]
    pub https: bool,
    /// Path to the certificate file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/plotline/certs/cert.pem",
        env = "PLOTLINE_CERT_FILE"
    )]
    pub cert_file: String,
    /// Path to the key file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/plotline/certs/key.pem",
        env = "PLOTLINE_KEY_FILE"
    )]
    pub key_file: String,
    /// Maximum time in seconds to wait for operations to complete upon receiving `ctrl+c` signal.
    #[arg(long, default_value_t = 60, env = "PLOTLINE_SHUTDOWN_TIMEOUT")]
    pub graceful_shutdown_timeout: u64,
    /// Maximum memory in bytes that sample scans may allocate concurrently. Accepts
    /// human-readable sizes such as "512 MiB". No limit by default.
    #[arg(long, env = "PLOTLINE_MEMORY_LIMIT")]
    pub memory_limit: Option<String>,
    /// Maximum number of concurrent reduction tasks. Defaults to one less than the
    /// number of CPUs.
    #[arg(long, env = "PLOTLINE_THREAD_LIMIT")]
    pub thread_limit: Option<usize>,
    /// Whether to enable sending traces to Jaeger.
    #[arg(long, default_value_t = false, env = "PLOTLINE_ENABLE_JAEGER")]
    pub enable_jaeger: bool,
    /// Whether to use Rayon for execution of CPU-bound reductions.
    #[arg(long, default_value_t = false, env = "PLOTLINE_USE_RAYON")]
    pub use_rayon: bool,
}

/// Returns parsed command line arguments.
pub fn parse() -> CommandLineArgs {
    CommandLineArgs::parse()
}
