use clap::{Parser, Subcommand};
use diesel_async::{AsyncPgConnection, async_connection_wrapper::AsyncConnectionWrapper};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness};
use starburger_distances::geocoder::YandexGeocoder;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod handlers;
mod models;

use config::Config;
use handlers::{AppState, app};

#[derive(Parser)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Address to listen on, overrides LISTEN_ADDR
        #[arg(long)]
        listen: Option<String>,
    },
    /// Apply pending database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Serve { listen } => serve(config, listen).await,
        Commands::Migrate => migrate(&config).await,
    }
}

async fn serve(config: Config, listen: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let geocoder = YandexGeocoder::new(
        &config.geocoder_base_url,
        &config.yandex_api_key,
        config.geocoder_timeout,
    )?;

    let state = AppState {
        database_url: config.database_url.into(),
        geocoder,
        manager_token: config.manager_token.into(),
        static_url: config.static_url.into(),
    };

    let listen_addr = listen.unwrap_or(config.listen_addr);
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    info!("Star Burger API listening on {}", listener.local_addr()?);

    axum::serve(listener, app(state)).await?;

    Ok(())
}

async fn migrate(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    for (name, migrations) in [
        ("distances", starburger_distances::MIGRATIONS),
        ("foodcart", starburger_foodcart::MIGRATIONS),
    ] {
        let applied = run_migrations(&config.database_url, migrations).await?;
        info!(crate_name = name, applied, "migrations applied");
    }
    Ok(())
}

async fn run_migrations(
    database_url: &str,
    migrations: EmbeddedMigrations,
) -> Result<usize, Box<dyn std::error::Error>> {
    let conn = starburger_foodcart::establish_connection(database_url).await?;
    let mut async_wrapper: AsyncConnectionWrapper<AsyncPgConnection> =
        AsyncConnectionWrapper::from(conn);
    let applied = tokio::task::spawn_blocking(move || {
        async_wrapper
            .run_pending_migrations(migrations)
            .map(|versions| versions.len())
            .map_err(|e| e.to_string())
    })
    .await??;
    Ok(applied)
}
