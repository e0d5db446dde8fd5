/*
 * Responsibility
 * - Config読み込み → 依存生成 (DrinkRepo, AuthGate) → Router 組み立て
 * - Middleware の適用 (HTTP/CORS)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::Result;
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api,
    config::Config,
    middleware,
    repos::{DrinkRepo, InMemoryDrinkRepo, PgDrinkRepo},
    services::auth::build_auth_gate,
    state::AppState,
};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,coffee_shop_api=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // Development: crash the whole process so the panic is noticed.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;

    let app = build_router(state);
    let app = middleware::http::apply(app);
    let app = middleware::cors::apply(app, config.app_env, &config.cors_allowed_origins);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let drinks: Arc<dyn DrinkRepo> = match &config.database_url {
        Some(url) => {
            let repo = PgDrinkRepo::connect(url).await?;
            repo.ensure_schema().await?;
            tracing::info!("using postgres drink store");
            Arc::new(repo)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, drinks are kept in memory");
            Arc::new(InMemoryDrinkRepo::new())
        }
    };

    let auth = build_auth_gate(&config.auth)?;

    Ok(AppState::new(drinks, auth))
}

/// Routes with state applied, without the router-wide HTTP/CORS layers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::routes(&state))
        .with_state(state)
}
