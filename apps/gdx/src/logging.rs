//! Diagnostic output on stderr.
//!
//! stdout is left to the commands themselves; `gdx export` prints nothing
//! there except the artifact list.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "GDX_LOG";

/// Default filter directive for a `-v` count.
#[must_use]
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "gdx=info",
        1 => "gdx=debug",
        _ => "gdx=trace",
    }
}

/// Installs the global subscriber.
///
/// `GDX_LOG` takes precedence over the verbosity flag. Calling this twice
/// leaves the first subscriber in place.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init();
}
