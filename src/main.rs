mod audit;
mod catalog;
mod config;
mod constants;
mod db;
mod errors;
mod graph;
mod logging;
mod render;
mod rules;
mod run;
mod sampling;
mod self_test;
mod staging;
mod verify;

use clap::Parser;
use config::types::{
    ConfigInput, ConnectionArgs, ModeArgs, ObservabilityArgs, OutputArgs, PolicyArgs, ScopeArgs,
};
use dotenv::dotenv;
use tracing::{error, info};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Produce small, referentially consistent SQL dumps sampled from a PostgreSQL database"
)]
struct Cli {
    /// Path to a dbsample.yaml/.json config file (optional; CLI flags win).
    #[arg(long, default_value = constants::CONFIG_FILENAME)]
    config_file: String,

    #[command(flatten)]
    connection: ConnectionArgs,
    #[command(flatten)]
    scope: ScopeArgs,
    #[command(flatten)]
    policy: PolicyArgs,
    #[command(flatten)]
    mode: ModeArgs,
    #[command(flatten)]
    output: OutputArgs,
    #[command(flatten)]
    observability: ObservabilityArgs,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();

    let config = match resolve_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(errors::exit_code_for(&e));
        }
    };

    if let Err(e) = logging::init(&config.observability) {
        eprintln!("failed to initialize logging: {e}");
        std::process::exit(1);
    }

    let result = tokio::select! {
        result = run::run(&config) => result,
        _ = wait_for_shutdown_signal() => {
            info!("received shutdown signal, exiting");
            cleanup_staging_on_cancel(&config).await;
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(errors::exit_code_for(&e));
    }
}

fn resolve_config(cli: &Cli) -> anyhow::Result<config::Config> {
    let file_config = config::load_config(&cli.config_file)?;

    let cli_config = ConfigInput {
        connection: Some(cli.connection.clone().into()),
        scope: Some(cli.scope.clone().into()),
        policy: Some(cli.policy.clone().into()),
        mode: Some(cli.mode.clone().into()),
        output: Some(cli.output.clone().into()),
        observability: Some(cli.observability.clone().into()),
    };

    config::ConfigBuilder::new()
        .with_file(file_config)
        .with_cli_args(cli_config)
        .resolve()
}

/// §5: a cancelled run may have left a staging schema behind mid-closure.
/// Reconnect (the in-flight pool may be stuck mid-query) and drop it,
/// unless the operator asked to keep it. Best-effort: a failure here isn't
/// worth a non-zero exit on top of the cancellation itself.
async fn cleanup_staging_on_cancel(config: &config::Config) {
    if config.mode.keep {
        return;
    }
    let Ok(uri) = db::connection::build_connection_uri(&config.connection) else {
        return;
    };
    if let Ok(pool) = sqlx::PgPool::connect(&uri).await {
        if let Err(e) =
            staging::drop_schema_by_name(&pool, constants::DEFAULT_STAGING_SCHEMA).await
        {
            tracing::warn!(error = %e, "could not clean up staging schema after cancellation");
        }
    }
}

async fn wait_for_shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
