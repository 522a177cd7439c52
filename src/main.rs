use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use dotenvy::dotenv;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod leave;
mod model;
mod models;
mod routes;
mod utils;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::routes::RateLimiters;
use crate::utils::username_index::UsernameIndex;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "office-hrm.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    info!(addr = %config.server_addr, prefix = %config.api_prefix, "Server starting");

    let pool = init_db(&config.database_url, config.db_max_connections)
        .await
        .context("failed to connect to the database")?;

    let limiters = RateLimiters::from_config(&config)?;
    let usernames = Data::new(UsernameIndex::default());

    let filter_index = usernames.clone();
    let filter_pool = pool.clone();
    actix_web::rt::spawn(async move {
        match filter_index.filter.warmup(&filter_pool, 100).await {
            Ok(n) => info!(usernames = n, "Username filter warmed up"),
            Err(e) => warn!(error = %e, "Failed to warm up username filter"),
        }
    });

    let cache_index = usernames.clone();
    let cache_pool = pool.clone();
    actix_web::rt::spawn(async move {
        // Most recent accounts, in batches of 250
        match cache_index.cache.warmup(&cache_pool, 10_000, 250).await {
            Ok(n) => info!(usernames = n, "Username cache warmed up"),
            Err(e) => warn!(error = %e, "Failed to warm up username cache"),
        }
    });

    let server_addr = config.server_addr.clone();
    let pool = Data::new(pool);
    let config = Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                // wildcard so the UI's JS/CSS assets resolve
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(pool.clone())
            .app_data(config.clone())
            .app_data(usernames.clone())
            .configure(|cfg| routes::configure(cfg, &config, &limiters))
    })
    .bind(&server_addr)
    .with_context(|| format!("failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
