//! Logger setup for `opsplit` and the test suites
//!
//! Passes only talk to the `log` facade. The binary installs an `env_logger`
//! whose level comes from the `-v` count, or from `RUST_LOG` when no `-v` is
//! given:
//!
//! ```bash
//! opsplit split model.json          # RUST_LOG, else warn
//! opsplit split model.json -v       # per-module summaries
//! opsplit split model.json -vv      # every inserted clone
//! opsplit split model.json -vvv     # every stateful operand inspected
//! RUST_LOG=compiler::ir::split_merged_operands=trace opsplit split model.json
//! ```
//!
//! Failures of a function are logged with `error!` before they are returned.

use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;

/// Map a `-v` count to a level filter (0 = Warn, 1 = Info, 2 = Debug, more = Trace).
pub fn level_for_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Logger builder for a `-v` count. Without `-v`, `RUST_LOG` decides and
/// falls back to warnings only.
pub fn builder(verbose: u8) -> Builder {
    let mut builder = if verbose == 0 {
        Builder::from_env(Env::default().default_filter_or("warn"))
    } else {
        let mut builder = Builder::new();
        builder.filter_level(level_for_verbosity(verbose));
        builder
    };
    builder.format(|buf, record| {
        writeln!(
            buf,
            "[{:5}] {}: {}",
            record.level(),
            record.target(),
            record.args()
        )
    });
    builder
}

/// Install the logger for the binary. Returns false if a logger was
/// already installed.
pub fn init(verbose: u8) -> bool {
    builder(verbose).try_init().is_ok()
}

/// Install a test logger; safe to call from every test.
pub fn init_test() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_is_repeatable() {
        init_test();
        init_test();
        log::trace!("operand #18 reads $3");
    }

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for_verbosity(0), LevelFilter::Warn);
        assert_eq!(level_for_verbosity(1), LevelFilter::Info);
        assert_eq!(level_for_verbosity(2), LevelFilter::Debug);
        assert_eq!(level_for_verbosity(7), LevelFilter::Trace);
    }

    #[test]
    fn test_verbose_builder_ignores_environment() {
        assert_eq!(builder(1).build().filter(), LevelFilter::Info);
        assert_eq!(builder(3).build().filter(), LevelFilter::Trace);
    }
}
