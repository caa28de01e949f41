// Dashboard HTTP handlers. Each one is a thin call into `AgentHandle`.
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::agent_engine::action::Action;
use crate::agent_engine::handle::AgentHandle;
use crate::agent_engine::state::AgentSnapshot;
use crate::dashboard::DASHBOARD_HTML;
use crate::errors::PhoneClawError;

/// Error body for dashboard calls; `Busy` maps to 409 so the page can tell the
/// operator a task is running.
pub struct ApiError(PhoneClawError);

impl From<PhoneClawError> for ApiError {
    fn from(err: PhoneClawError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            PhoneClawError::Busy => StatusCode::CONFLICT,
            PhoneClawError::Agent(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::BAD_GATEWAY,
        };
        (status, Json(json!({ "success": false, "error": self.0 }))).into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    #[serde(default)]
    pub task: String,
}

#[derive(Debug, Deserialize)]
pub struct TapRequest {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Deserialize)]
pub struct SwipeRequest {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

pub async fn index() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

pub async fn get_state(State(agent): State<AgentHandle>) -> Json<AgentSnapshot> {
    Json(agent.state())
}

pub async fn check_connection(State(agent): State<AgentHandle>) -> Json<Value> {
    Json(json!({ "connected": agent.check_device().await }))
}

pub async fn screenshot(State(agent): State<AgentHandle>) -> Json<Value> {
    match agent.capture_preview().await {
        Ok(image) => Json(json!({ "success": true, "image": image })),
        Err(e) => {
            tracing::warn!(error = %e, "preview capture failed");
            Json(json!({ "success": false, "error": e }))
        }
    }
}

pub async fn start_task(
    State(agent): State<AgentHandle>,
    Json(req): Json<StartRequest>,
) -> ApiResult {
    agent.start(&req.task).await?;
    tracing::info!(task = %req.task.trim(), "task started from dashboard");
    Ok(Json(json!({ "success": true })))
}

pub async fn stop_task(State(agent): State<AgentHandle>) -> Json<Value> {
    let was_running = agent.stop();
    Json(json!({ "success": true, "was_running": was_running }))
}

async fn manual(agent: &AgentHandle, action: Action) -> ApiResult {
    let delivered = agent.manual(action).await?;
    Ok(Json(json!({ "success": delivered })))
}

pub async fn manual_tap(State(agent): State<AgentHandle>, Json(req): Json<TapRequest>) -> ApiResult {
    manual(&agent, Action::Tap { x: req.x, y: req.y }).await
}

pub async fn manual_swipe(
    State(agent): State<AgentHandle>,
    Json(req): Json<SwipeRequest>,
) -> ApiResult {
    let action = Action::Swipe {
        x1: req.x1,
        y1: req.y1,
        x2: req.x2,
        y2: req.y2,
    };
    manual(&agent, action).await
}

pub async fn manual_back(State(agent): State<AgentHandle>) -> ApiResult {
    manual(&agent, Action::Back).await
}

pub async fn manual_home(State(agent): State<AgentHandle>) -> ApiResult {
    manual(&agent, Action::Home).await
}
