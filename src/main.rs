use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use placetrack::config::{CliArgs, Config, get_config};
use placetrack::db::init_pool;
use placetrack::{AppState, create_app, repo, run_migrations};

/// Initializes tracing: human-readable output on stderr, plus daily
/// rolling JSON files when a log directory is given.
///
/// Returns the appender guard; dropping it would stop the background
/// writer, so it lives for the whole run.
fn init_logging(log_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "placetrack.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
                .init();

            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();

            None
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    // Initialize the database pool and bring the schema up to date
    let pool = Arc::new(init_pool(&config.database_url));
    {
        let mut conn = pool.get().context("failed to get a database connection")?;
        run_migrations(&mut conn);
    }

    // A fresh deployment gets the bootstrap admin account
    repo::ensure_default_admin(&pool)?;

    let state = AppState::from_config(pool, &config);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;

    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Load environment variables from a .env file if present
    if std::fs::metadata(".env").is_ok() {
        dotenv::dotenv().ok();
    }

    let args = CliArgs::parse();

    // Logging comes up before config resolution so the resolution itself
    // is logged; the file appender location can only come from env/CLI.
    let _log_guard = init_logging(args.log_dir.clone());

    let config = get_config(args);

    // The service historically ran as 2 worker processes x 4 threads; a
    // single multi-threaded runtime of the same width replaces that.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .enable_all()
        .build()
        .context("failed to build the async runtime")?;

    runtime.block_on(serve(config))
}
