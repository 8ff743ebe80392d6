//! Provides [init] to set up logging for the command line tool.
use std::io::Write as _;

/// Initializes [env_logger] from `RUST_LOG` (default `info`) with a compact
/// one-line format.
pub fn init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(format_record)
        .target(env_logger::Target::Stderr)
        .init();
}

fn format_record(formatter: &mut env_logger::fmt::Formatter, record: &log::Record) -> std::io::Result<()> {
    writeln!(
        formatter,
        "{time} {level:<5} {target}  {msg}",
        time = chrono::Local::now().format("%H:%M:%S%.3f"),
        level = record.level(),
        target = record.target(),
        msg = record.args()
    )
}
