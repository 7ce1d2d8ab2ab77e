//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber
///
/// `RUST_LOG` wins when set; otherwise warnings only, or debug output for
/// this tool's crates with `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,routesync=debug,routesync_cli=debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
