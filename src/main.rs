mod auth;
mod cache;
mod config;
mod error;
mod graphql;
mod helpers;
mod middleware;
mod models;
mod routes;
mod schema;
mod services;

use std::sync::Arc;

use anyhow::anyhow;
use diesel::Connection;
use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_async::pooled_connection::deadpool::{Hook, Pool};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::*;

use crate::auth::TokenKeys;
use crate::cache::{CacheStore, LocalStore, RedisStore};
use crate::config::AppCfg;
use crate::middleware::cors::CorsExt;
use crate::middleware::logging::HttpLoggingExt;
use crate::services::Services;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppCfg::load()?;

    config::tracing::init(&cfg.log_level);

    run_migrations(cfg.database_url.clone()).await?;

    // create a new connection pool with the default config
    let mgr = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&cfg.database_url);

    info!(max_size = cfg.db_pool_size, "Starting DB pool");
    let pool = Pool::builder(mgr)
        .max_size(cfg.db_pool_size)
        .post_create(Hook::async_fn(|conn, metrics| {
            tracing::trace_span!("dbpool::post_create").in_scope(|| {
                let c = std::ptr::addr_of!(conn);
                tracing::trace!(?c, ?metrics, "Post-create");
                Box::pin(std::future::ready(Ok(())))
            })
        }))
        .build()?;

    let (cache, redis_pool): (Arc<dyn CacheStore>, _) = match cfg.redis_url.as_deref() {
        Some(url) => {
            info!(max_size = cfg.redis_pool_size, "Starting Redis pool");
            let redis_pool = RedisStore::pool(url, cfg.redis_pool_size, cfg.cache_timeout())?;
            (Arc::new(RedisStore::new(redis_pool.clone())), Some(redis_pool))
        }
        None => {
            warn!("no redis_url configured, post feed is cached in process memory");
            (Arc::new(LocalStore::default()), None)
        }
    };

    let tokens = TokenKeys::new(&cfg.jwt_secret, cfg.token_ttl_secs);
    let services = Services::postgres(pool.clone(), cache, cfg.cache_timeout(), tokens);

    let app = routes::router(routes::GraphqlState {
        schema: graphql::build_schema(services),
        timeout: cfg.operation_timeout(),
    })
    .with_cors(&cfg.cors_origins)
    .with_http_logging();

    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr).await?;
    info!("starting listening at {}", cfg.listen_addr);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close();
    if let Some(redis_pool) = redis_pool {
        redis_pool.close();
    }
    info!("pools closed");

    Ok(())
}

/// Apply pending migrations over a blocking connection before the pool starts.
async fn run_migrations(database_url: String) -> anyhow::Result<()> {
    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let mut conn = AsyncConnectionWrapper::<AsyncPgConnection>::establish(&database_url)?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| anyhow!("running migrations: {e}"))?;
        for version in applied {
            info!(%version, "applied migration");
        }
        Ok(())
    })
    .await?
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
