//! Loads the movie catalog into PostgreSQL
//!
//! Usage: `seed [movies.csv] [credits.json]`. Paths not given on the command
//! line come from `SEED_MOVIES_CSV` and `SEED_CREDITS_JSON`. Safe to re-run:
//! movies whose TMDB id is already stored are left untouched.

use std::{collections::HashMap, fs::File, io::BufReader, path::PathBuf};

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cinesocial_api::{
    config::ImportConfig,
    db::{create_pool, run_migrations, PgStore},
    services::catalog_import,
};

const CHUNK_SIZE: usize = 500;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("seed=info,cinesocial_api=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ImportConfig::from_env()?;

    let mut args = std::env::args().skip(1);
    let movies_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| config.seed_movies_csv.clone());
    let credits_path = args
        .next()
        .map(PathBuf::from)
        .or_else(|| config.seed_credits_json.clone());

    let credits = match credits_path {
        Some(path) => {
            let file = File::open(&path)
                .with_context(|| format!("Failed to open credits file {}", path.display()))?;
            let credits = catalog_import::load_credits(BufReader::new(file))
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            tracing::info!(count = credits.len(), "Loaded credits");
            credits
        }
        None => {
            tracing::warn!("No credits file given, actors and directors stay empty");
            HashMap::new()
        }
    };

    let file = File::open(&movies_path)
        .with_context(|| format!("Failed to open movies file {}", movies_path.display()))?;
    let catalog =
        catalog_import::read_catalog(BufReader::new(file), &credits, &config.tmdb_image_base_url)?;
    tracing::info!(
        parsed = catalog.movies.len(),
        skipped = catalog.skipped,
        "Parsed movies CSV"
    );

    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    run_migrations(&pool).await?;

    let store = PgStore::new(pool);
    catalog_import::import_movies(&store, &catalog.movies, CHUNK_SIZE).await?;

    Ok(())
}
