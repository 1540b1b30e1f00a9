//! Console logger setup.

use std::io::Write;

use log::LevelFilter;

/// Installs the `env_logger` backend.
///
/// `RUST_LOG` wins when set. Otherwise only this crate logs, at `warn`,
/// raised to `info` / `debug` / `trace` by each `-v`.
pub fn init_logging(verbosity: u8) {
    let mut builder = env_logger::Builder::new();

    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_env("RUST_LOG");
    } else {
        let level = match verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };
        builder.filter(None, LevelFilter::Off);
        builder.filter(Some("logmask"), level);
    }

    builder.format(|buf, record| {
        let module = match (record.module_path(), record.line()) {
            (Some(module), Some(line)) => format!("{module}:{line}"),
            (Some(module), None) => module.to_string(),
            _ => "unknown".to_string(),
        };
        writeln!(
            buf,
            "{} {:<5} {} {}",
            buf.timestamp_millis(),
            record.level(),
            module,
            record.args()
        )
    });
    builder.target(env_logger::Target::Stderr);

    // A second call (tests, embedding) keeps the first logger.
    let _ = builder.try_init();
}
