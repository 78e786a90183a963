//! Standardized logging for box-toplevel
//!
//! Diagnostics go through `tracing`. The `wlog!` macro tags lifecycle
//! messages with a module identifier so they read as
//! `YYYY-MM-DD HH:MM:SS [MODULE] Message` under the subscriber installed by
//! [`init`].

use tracing::Level;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

#[macro_export]
macro_rules! wlog {
    ($module:expr, $($arg:tt)*) => {{
        tracing::info!("[{}] {}", $module, format!($($arg)*));
    }};
}

/// Standardized module identifiers
pub const MANAGER: &str = "MANAGER";
pub const TOPLEVEL: &str = "TOPLEVEL";
pub const IDLE: &str = "IDLE";
pub const WAYLAND: &str = "WAYLAND";

/// Install the global subscriber.
///
/// `verbosity` picks the default level (0=warn, 1=info, 2=debug, 3+=trace);
/// `RUST_LOG` directives still apply on top. Calling this twice is harmless.
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_ansi(false)
        .try_init();
}
