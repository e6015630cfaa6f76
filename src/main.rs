use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use weather_cities::{CityCatalogFetcher, ImportJob, SqliteCityStore};
use weather_core::{is_known_country, App, Config};
use weather_provider::{WeatherBlock, WeatherBlockPlugin, WeatherQueryService};
use weather_server::AppState;

/// Weather block service: city catalog import, autocomplete and current conditions.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Config file. Defaults to <config dir>/weather-block/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Import the city catalog into the local database
    Import {
        /// Country to import instead of the configured one
        #[arg(long)]
        country: Option<String>,
    },
    /// Print the HTML of a configured block
    Render {
        /// Block id as used in /block/<id>
        block_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => Config::config_path()?,
    };
    let config = Config::load_from(&config_path)?;

    weather_core::init(&config.logging.level)?;

    config.ensure_valid()?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.weather.timeout_secs))
        .build()
        .context("Failed to create HTTP client")?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, config_path, client).await,
        Command::Import { country } => import(&config, country, client).await,
        Command::Render { block_id } => render(&config, &block_id, client).await,
    }
}

async fn serve(config: Config, config_path: PathBuf, client: reqwest::Client) -> Result<()> {
    let mut app = App::new(config.clone());
    app.register_plugin(Box::new(WeatherBlockPlugin::new()));
    app.initialize()?;

    for block in app.block_definitions() {
        tracing::info!("Block type available: {} ({})", block.admin_label, block.id);
    }

    let store = SqliteCityStore::new(&config.storage.database_path)
        .context("Failed to open city database")?;
    let state = AppState::new(config.clone(), Some(config_path), store, client);

    let result = weather_server::serve(state, &config.server.host, config.server.port).await;

    app.shutdown()?;
    result
}

async fn import(config: &Config, country: Option<String>, client: reqwest::Client) -> Result<()> {
    let country = country
        .map(|c| c.trim().to_uppercase())
        .unwrap_or_else(|| config.weather.country.clone());
    if !is_known_country(&country) {
        anyhow::bail!("Unsupported country: {}", country);
    }

    let store = SqliteCityStore::new(&config.storage.database_path)
        .context("Failed to open city database")?;
    let fetcher = CityCatalogFetcher::new(client, config.catalog.url.clone());

    let mut job = ImportJob::new(country);
    job.run_to_completion(&fetcher, &store).await?;

    tracing::info!(
        "Import finished: {} inserted of {}",
        job.progress.inserted_count,
        job.progress.total_count
    );
    println!("{}", job.finish_message());

    if !job.succeeded() {
        anyhow::bail!("City import failed");
    }
    Ok(())
}

async fn render(config: &Config, block_id: &str, client: reqwest::Client) -> Result<()> {
    let settings = config
        .blocks
        .get(block_id)
        .with_context(|| format!("No block configured with id {}", block_id))?;

    let service = WeatherQueryService::new(client, &config.weather);
    let html = WeatherBlock::new(config).render(&service, settings).await;
    println!("{}", html);
    Ok(())
}
