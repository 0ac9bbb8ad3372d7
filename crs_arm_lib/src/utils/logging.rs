//! Tracing setup shared by the command-line tools.

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;

/// Installs a thread-local subscriber for the arm tools.
///
/// Honors `RUST_LOG` (defaults to "info"). Log lines go to stderr because
/// `crs_motion` prints its pose and motion reports as JSON on stdout, and a
/// stray log line there would break anything parsing that output. Keep the
/// returned guard alive for as long as logging is needed.
///
/// # Example
/// ```no_run
/// use crs_arm_lib::init_tracing;
///
/// fn main() {
///     let _guard = init_tracing();
///     // tool code here
/// }
/// ```
pub fn init_tracing() -> DefaultGuard {
    use tracing_subscriber::layer::SubscriberExt;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(false)
        .with_line_number(false);

    let subscriber = tracing_subscriber::Registry::default()
        .with(env_filter)
        .with(fmt_layer);

    tracing::subscriber::set_default(subscriber)
}
