use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cinesocial_api::{
    config::Config,
    db::{create_pool, create_redis_client, run_migrations, Cache, PgStore, Store},
    middleware::TokenVerifier,
    routes::{create_router, AppState, Settings},
    services::{HttpModelService, MovieEnricher, TmdbClient, TmdbEnricher},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cinesocial_api=debug,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    run_migrations(&pool).await?;
    tracing::info!("Database ready");

    // Redis is optional; without it TMDB lookups go straight to the API
    let (cache, cache_writer) = match config.redis_url.as_deref() {
        Some(url) => {
            let client = create_redis_client(url)?;
            let (cache, writer) = Cache::new(client);
            tracing::info!("Redis cache enabled");
            (Some(cache), Some(writer))
        }
        None => {
            tracing::info!("REDIS_URL not set, caching disabled");
            (None, None)
        }
    };

    let tmdb_key = config.tmdb_key();
    if tmdb_key.is_none() {
        tracing::warn!("TMDB_API_KEY not configured, posters and ratings will not be fetched");
    }
    let tmdb = Arc::new(TmdbClient::new(
        tmdb_key,
        config.tmdb_api_url.clone(),
        config.tmdb_image_base_url.clone(),
        cache,
    ));

    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
    let enricher: Arc<dyn MovieEnricher> = Arc::new(TmdbEnricher::new(store.clone(), tmdb));
    let models = Arc::new(HttpModelService::new(config.model_service_url.clone()));

    let state = Arc::new(AppState::new(
        store,
        models,
        enricher,
        TokenVerifier::new(&config.jwt_secret),
        Settings {
            recommendation_top_n: config.recommendation_top_n,
            movies_page_size: config.movies_page_size,
        },
    ));

    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, model_service = %config.model_service_url, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(writer) = cache_writer {
        writer.shutdown().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
