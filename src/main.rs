//! Agrimart - storefront and admin back office for an agricultural goods
//! retailer

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agrimart::{
    api::{self, AppState, RequestStats},
    cache::create_cache,
    config::Config,
    db::{
        self,
        repositories::{
            SqlxCategoryRepository, SqlxEventRepository, SqlxIntegrationRepository,
            SqlxPostRepository, SqlxProductRepository, SqlxSessionRepository,
            SqlxSettingsRepository, SqlxUserRepository,
        },
    },
    engine::{EngineClient, ProductGenerator},
    services::{
        AnalyticsService, CategoryService, CheckoutService, IntegrationService, PostService,
        ProductService, SettingsService, UserService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agrimart=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Agrimart...");

    // Load configuration (file + AGRIMART_* env overrides)
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    let applied = db::migrations::run_migrations(&pool).await?;
    tracing::info!(applied, "Database ready");

    // Initialize cache
    let cache = create_cache(&config.cache);

    // Repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let category_repo = SqlxCategoryRepository::boxed(pool.clone());
    let product_repo = SqlxProductRepository::boxed(pool.clone());
    let post_repo = SqlxPostRepository::boxed(pool.clone());
    let settings_repo = SqlxSettingsRepository::boxed(pool.clone());
    let integration_repo = SqlxIntegrationRepository::boxed(pool.clone());
    let event_repo = SqlxEventRepository::boxed(pool.clone());

    // Services
    let user_service = Arc::new(UserService::new(user_repo, session_repo.clone()));
    let category_service = Arc::new(CategoryService::new(
        category_repo.clone(),
        product_repo.clone(),
        post_repo.clone(),
        cache.clone(),
    ));
    let product_service = Arc::new(ProductService::new(
        product_repo.clone(),
        category_repo.clone(),
        cache.clone(),
    ));
    let post_service = Arc::new(PostService::new(post_repo, category_repo, cache.clone()));
    let settings_service = Arc::new(SettingsService::new(settings_repo, cache.clone()));
    let integration_service = Arc::new(IntegrationService::new(integration_repo, cache.clone()));
    let checkout_service = Arc::new(CheckoutService::new(
        product_repo,
        integration_service.clone(),
        event_repo.clone(),
    ));
    let analytics_service = Arc::new(AnalyticsService::new(event_repo));

    // Engine bridge
    let engine_client = Arc::new(EngineClient::new(&config.engine)?);
    let product_generator = Arc::new(ProductGenerator::new(engine_client.clone()));
    tracing::info!(hub = %config.engine.hub_url, "Engine bridge configured");

    // Expired-session sweeper (hourly)
    {
        let sessions = session_repo.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600));
            loop {
                interval.tick().await;
                match sessions.prune_expired().await {
                    Ok(pruned) if pruned > 0 => {
                        tracing::info!(pruned, "Pruned expired sessions");
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "Session pruning failed"),
                }
            }
        });
    }

    // Build application state
    let state = AppState {
        config: Arc::new(config.clone()),
        user_service,
        category_service,
        product_service,
        post_service,
        settings_service,
        integration_service,
        checkout_service,
        analytics_service,
        engine_client,
        product_generator,
        request_stats: Arc::new(RequestStats::new()),
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
