use std::sync::atomic::AtomicBool;

/// Directives read from this variable, e.g. `ROLLPACK_LOG=rollpack_core=trace`.
pub const LOG_ENV: &str = "ROLLPACK_LOG";

static IS_INIT: AtomicBool = AtomicBool::new(false);

/// Install the subscriber once. Without `ROLLPACK_LOG`, `verbose` shows the
/// debug events of rollpack crates and the rest stays at `info`.
pub fn init(verbose: bool) {
  use tracing_subscriber::{fmt, prelude::*, EnvFilter};
  if !IS_INIT.swap(true, std::sync::atomic::Ordering::SeqCst) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
      EnvFilter::new(if verbose {
        "info,rollpack=debug,rollpack_core=debug,rollpack_cli=debug"
      } else {
        "info"
      })
    });
    // Another subscriber may already be installed, e.g. by a test harness
    let _ = tracing_subscriber::registry()
      .with(fmt::layer().with_target(false))
      .with(filter)
      .try_init();
  }
}

/// Installs the subscriber only when `ROLLPACK_LOG` is set.
pub fn enable_tracing_on_demand() {
  if std::env::var_os(LOG_ENV).is_some() {
    init(false);
  }
}
