use std::io::{self, IsTerminal};
use tracing_subscriber::EnvFilter;

/// Install the stderr subscriber used by the binary.
///
/// `level` is an `EnvFilter` directive such as `debug` or
/// `codequery::matcher=trace`. Without it `RUST_LOG` is consulted, and
/// without that only warnings are shown. Calling this twice is harmless.
pub fn init(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    // Ignore the error: a subscriber may already be installed (tests).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init(Some("debug"));
        init(None);
        tracing::debug!("still logging");
    }
}
