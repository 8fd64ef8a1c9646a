//! Logger setup for the `presetbridge` binary

use env_logger::Env;
use log::LevelFilter;

/// Default filter for the given verbosity flags. `RUST_LOG` still wins.
pub fn default_level(verbose: bool, quiet: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else if quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    }
}

/// Initialize env_logger (logs to stderr)
pub fn init_logger(verbose: bool, quiet: bool) {
    let level = default_level(verbose, quiet).to_string().to_lowercase();
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level() {
        assert_eq!(default_level(false, false), LevelFilter::Info);
        assert_eq!(default_level(true, false), LevelFilter::Debug);
        assert_eq!(default_level(false, true), LevelFilter::Warn);
        assert_eq!(default_level(true, true), LevelFilter::Debug);
    }
}
