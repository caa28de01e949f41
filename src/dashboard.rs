use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;

use crate::agent_engine::handle::AgentHandle;
use crate::commands;
use crate::errors::PhoneClawResult;

pub const DASHBOARD_HTML: &str = include_str!("../assets/dashboard.html");

pub fn router(agent: AgentHandle) -> Router {
    Router::new()
        .route("/", get(commands::index))
        .route("/api/state", get(commands::get_state))
        .route("/api/check", get(commands::check_connection))
        .route("/api/screenshot", get(commands::screenshot))
        .route("/api/start", post(commands::start_task))
        .route("/api/stop", post(commands::stop_task))
        .route("/api/tap", post(commands::manual_tap))
        .route("/api/swipe", post(commands::manual_swipe))
        .route("/api/back", post(commands::manual_back))
        .route("/api/home", post(commands::manual_home))
        .with_state(agent)
}

/// Serve the dashboard until Ctrl-C.
pub async fn serve(agent: AgentHandle, host: &str, port: u16) -> PhoneClawResult<()> {
    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "dashboard listening");
    println!("Dashboard: http://localhost:{port}");

    let on_shutdown = agent.clone();
    axum::serve(listener, router(agent))
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down dashboard");
            on_shutdown.stop();
        })
        .await?;
    Ok(())
}
