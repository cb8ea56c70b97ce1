//! Logging (A4): `tracing_subscriber` setup driven by `--verbose`/`--log-level`/
//! `--trace`/`--log-file`, mirroring the teacher's `fmt()`-based init in spirit
//! but resolving the level from the richer `Observability` config rather than
//! three boolean CLI flags.
use crate::config::types::Observability;
use std::fs::OpenOptions;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

pub fn init(observability: &Observability) -> anyhow::Result<()> {
    let level = if observability.trace {
        "trace"
    } else if observability.verbose {
        "debug"
    } else {
        observability.log_level.as_str()
    };

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(level)
    };

    match &observability.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(file)
                .init();
        }
        None => {
            fmt().with_env_filter(filter).with_target(false).init();
        }
    }

    Ok(())
}
