//! Taskstream Web Server
//!
//! Axum-based server exposing the item JSON API and the per-view realtime
//! WebSocket endpoints.

pub mod bridge;
pub mod hub;
pub mod routes;
pub mod state;
pub mod websocket;

use axum::{
    routing::{delete, get, post},
    Router,
};
use taskstream_db::{ItemFilter, RedisChangeSource};
use tokio::sync::watch;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use hub::Hub;
use state::{AppState, ViewHubs};

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/items", get(routes::items::list_all))
        .route("/items", post(routes::items::create_item))
        .route("/items/active", get(routes::items::list_active))
        .route("/items/completed", get(routes::items::list_completed))
        .route("/items/completed", delete(routes::items::clear_completed))
        .route("/items/{id}", delete(routes::items::delete_item))
        .route("/items/{id}/toggle", post(routes::items::toggle_item))
        .with_state(state.clone());

    Router::new()
        .nest("/api", api_routes)
        .route("/ws/{view}", get(websocket::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run the web server until ctrl-c.
///
/// Starts one hub and one feed bridge per view before accepting connections,
/// and waits for all of them to stop on shutdown.
pub async fn run_server(redis_url: &str, host: &str, port: u16) -> anyhow::Result<()> {
    let db = taskstream_db::init_pool(redis_url).await?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let (all, all_dispatch) = Hub::spawn(shutdown_rx.clone());
    let (active, active_dispatch) = Hub::spawn(shutdown_rx.clone());
    let (completed, completed_dispatch) = Hub::spawn(shutdown_rx.clone());
    let hubs = ViewHubs { all, active, completed };

    let mut background = vec![all_dispatch, active_dispatch, completed_dispatch];
    for filter in ItemFilter::VIEWS {
        let source = RedisChangeSource::connect(redis_url, filter)?;
        let hub = hubs.get(filter).clone();
        background.push(tokio::spawn(bridge::run(
            source,
            hub,
            filter.as_str(),
            shutdown_rx.clone(),
        )));
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    let state = AppState::new(db, hubs, shutdown_rx.clone());
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    tracing::info!("Web server listening on http://{}:{}", host, port);

    let mut rx = shutdown_rx;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = rx.changed().await;
        })
        .await?;

    // Let the bridges and dispatch loops drain before exiting
    for task in background {
        let _ = task.await;
    }

    Ok(())
}
