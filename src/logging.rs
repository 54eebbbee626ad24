// Logging setup plus a hot-path macro that compiles out of release builds

use log::LevelFilter;

/// Maps the `-v` count to a level: 0 = info, 1 = debug, 2+ = trace.
/// `RUST_LOG` still overrides it when set.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

pub fn init(verbosity: u8) {
    env_logger::builder()
        .filter_level(level_for(verbosity))
        .parse_default_env()
        .format_target(false)
        .init();
}

#[cfg(debug_assertions)]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        log::debug!($($arg)*);
    };
}

#[cfg(not(debug_assertions))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {{}};
}
