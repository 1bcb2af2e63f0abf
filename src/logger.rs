use tracing_subscriber::{EnvFilter, fmt};

/// Installs a `tracing` subscriber for test runs.
///
/// The level is read from `RUST_LOG` and defaults to `info`, e.g.
/// `RUST_LOG=httptester=debug cargo test` shows every request dispatched.
/// Safe to call from every test: only the first call installs anything.
pub fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_test_writer()
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!("Logger initialized");
    }
}
