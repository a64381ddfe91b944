// ============================================================================
// retime-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: env_logger Initialization
//
// The application logs through the standard `log` facade with `env_logger`
// as the backend. Output goes to stderr so it never mixes with JSON written
// to stdout.
//
// USAGE:
// - default: info level
// - --verbose: debug level
// - RUST_LOG=...: overrides both, e.g. RUST_LOG=retime::engine=trace to see
//   every line ffmpeg writes

use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;

/// Level used when `RUST_LOG` is not set.
#[must_use]
pub fn default_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Installs the global logger. Call once, before any command runs.
pub fn init(verbose: bool) {
    let level = default_level(verbose);
    Builder::from_env(Env::default().default_filter_or(level.as_str()))
        .format(|buf, record| match record.level() {
            log::Level::Info => writeln!(buf, "{}", record.args()),
            level => writeln!(
                buf,
                "[{} {}] {}",
                level,
                record.target(),
                record.args()
            ),
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level() {
        assert_eq!(default_level(false), LevelFilter::Info);
        assert_eq!(default_level(true), LevelFilter::Debug);
    }
}
