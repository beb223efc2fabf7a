use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use roost_api::auth::{AppState, AppStateInner};
use roost_api::{admin, auth, messages};
use roost_store::{load_stores, save_stores};
use roost_types::DEFAULT_LOG_CAP;

#[derive(Clone)]
struct ServerState {
    app: AppState,
    data_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roost=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let host = std::env::var("ROOST_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("ROOST_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let data_dir = PathBuf::from(std::env::var("ROOST_DATA_DIR").unwrap_or_else(|_| ".".into()));
    let log_cap: usize = std::env::var("ROOST_LOG_CAP")
        .unwrap_or_else(|_| DEFAULT_LOG_CAP.to_string())
        .parse()?;
    let snapshot_secs: u64 = std::env::var("ROOST_SNAPSHOT_SECS")
        .unwrap_or_else(|_| "300".into())
        .parse()?;

    // Load persisted metadata; chat logs always start fresh.
    let (users, channels) = load_stores(&data_dir, log_cap)?;
    let app_state: AppState = Arc::new(AppStateInner { users, channels });

    let state = ServerState {
        app: app_state.clone(),
        data_dir: data_dir.clone(),
    };

    // Periodic snapshots, off the request path.
    tokio::spawn(snapshot_loop(state.clone(), snapshot_secs));

    // Routes
    let chat_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/get/{channel}", post(messages::get_messages))
        .route("/msg/{channel}", post(messages::send_message))
        .with_state(app_state.clone());

    let dev_routes = Router::new()
        .route("/dev/create/{channel}", post(admin::create_channel))
        .route("/dev/signup", post(admin::signup))
        .route("/dev/stats", post(admin::stats))
        .route("/dev/channels", post(admin::list_channels))
        .route("/dev/edit/{channel}", post(admin::edit_channel))
        .route("/dev/hash", get(admin::dev_hash))
        .with_state(app_state);

    let ping_route = Router::new()
        .route("/ping", get(ping))
        .with_state(state.clone());

    let app = Router::new()
        .merge(chat_routes)
        .merge(dev_routes)
        .merge(ping_route)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Roost listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // One last snapshot so counters and signups survive the restart.
    snapshot(&state).await;

    Ok(())
}

/// `GET /ping` — liveness probe that also forces a snapshot.
async fn ping(State(state): State<ServerState>) -> Json<serde_json::Value> {
    snapshot(&state).await;
    Json(serde_json::json!({ "success": true }))
}

async fn snapshot_loop(state: ServerState, secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(secs.max(1)));
    interval.tick().await; // first tick fires immediately; skip it
    loop {
        interval.tick().await;
        snapshot(&state).await;
    }
}

/// Clone the store metadata under brief entity locks, then write to disk on
/// the blocking pool so no request ever waits on file I/O.
async fn snapshot(state: &ServerState) {
    let app = state.app.clone();
    let dir = state.data_dir.clone();
    let result =
        tokio::task::spawn_blocking(move || save_stores(&dir, &app.users, &app.channels)).await;

    match result {
        Ok(Ok(())) => info!("snapshot saved to {}", state.data_dir.display()),
        Ok(Err(e)) => warn!("snapshot failed: {e:#}"),
        Err(e) => warn!("snapshot task panicked: {e}"),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {e}");
    }
}
