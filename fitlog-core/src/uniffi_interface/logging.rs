use log::LevelFilter;
use std::io::Write;
use std::str::FromStr;

fn init_logger(level: LevelFilter) {
    let mut builder = env_logger::Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}] {}",
                buf.timestamp_seconds(),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Stdout)
        .filter_level(level);

    // A logger may already be installed; only the level changes then.
    let _ = builder.try_init();
    log::set_max_level(level);
}

fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_ascii_lowercase().as_str() {
        "warning" => Some(LevelFilter::Warn),
        other => LevelFilter::from_str(other).ok(),
    }
}

#[uniffi::export]
pub fn set_debug_log_level() {
    init_logger(LevelFilter::Debug);
}

/// Returns false for an unknown level name.
#[uniffi::export]
pub fn set_log_level(level: &str) -> bool {
    match parse_level(level) {
        Some(lvl) => {
            init_logger(lvl);
            true
        }
        None => false,
    }
}
