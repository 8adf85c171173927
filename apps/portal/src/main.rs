use std::sync::Arc;

use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use schedule_portal::{create_router, PortalState};
use shared_config::ClientConfig;
use shared_session::{FileStorage, MemoryCookieJar, SessionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting schedule portal");

    let config = ClientConfig::from_env();
    let storage = FileStorage::open_in(&config.session_dir)?;
    info!("Session persisted in {}", storage.path().display());
    let store = SessionStore::new(
        Arc::new(storage),
        Arc::new(MemoryCookieJar::new()),
        config.client_id.clone(),
    );

    let state = PortalState::new(config, store)?;
    let shell_task = state.shell().spawn(state.api.subscribe());
    let addr = state.config.portal_addr.clone();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;
    shell_task.abort();
    Ok(())
}
