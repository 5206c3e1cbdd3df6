//! Logging setup for cmixgen
//!
//! Uses the `log` facade with `env_logger`. Levels are used as follows:
//!
//! - `error!` - a failed run
//! - `warn!`  - a file written twice in one run
//! - `info!`  - phase boundaries (each kind, the aggregate headers)
//! - `debug!` - every written file, template overrides
//!
//! `RUST_LOG` takes precedence when set:
//!
//! ```bash
//! RUST_LOG=debug cmixgen generate
//! RUST_LOG=generator::output=debug cmixgen generate
//! ```

use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize with the default level (Warn).
///
/// This only initializes once; subsequent calls are no-ops.
pub fn init() {
    init_with_level(LevelFilter::Warn);
}

/// Map `-v` occurrences to a level: none is Warn, one is Info, more is Debug.
pub fn level_for_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

/// Initialize with `level` unless `RUST_LOG` says otherwise.
///
/// This only initializes once; subsequent calls are no-ops.
pub fn init_with_level(level: LevelFilter) {
    INIT.call_once(|| {
        Builder::from_env(Env::default().default_filter_or(level.as_str()))
            .format(|buf, record| {
                writeln!(buf, "[{:5}] {} - {}", record.level(), record.target(), record.args())
            })
            .init();
    });
}

/// Initialize logging for tests.
///
/// Output is captured by the test harness; safe to call from every test.
pub fn init_test() {
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Warn)
        .is_test(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_test();
        init_test();
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for_verbosity(0), LevelFilter::Warn);
        assert_eq!(level_for_verbosity(1), LevelFilter::Info);
        assert_eq!(level_for_verbosity(2), LevelFilter::Debug);
        assert_eq!(level_for_verbosity(9), LevelFilter::Debug);
    }
}
