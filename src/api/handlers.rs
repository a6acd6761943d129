use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::PageContext;
use crate::services::{ActionOutcome, IntersectionEntry, PanelState};
use crate::signals::{PageSignal, SignalBus, SignalTopic};

use super::AppState;

// Request/Response types

/// Which footer control of a card to invoke
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionSlot {
    Primary,
    Wishlist,
}

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub sku: String,
    pub action: ActionSlot,
}

#[derive(Debug, Serialize)]
pub struct IntersectionResponse {
    pub fired: usize,
    pub visible: bool,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Publishes a payload to the page data layer
pub async fn publish_signal(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Json(payload): Json<Value>,
) -> AppResult<StatusCode> {
    let topic: SignalTopic = path.parse()?;
    PageSignal::from_payload(topic, &payload)?;

    state.data_layer.publish(topic, payload);
    Ok(StatusCode::ACCEPTED)
}

/// Forwards viewport intersection entries for the block's section
pub async fn report_intersections(
    State(state): State<AppState>,
    Json(entries): Json<Vec<IntersectionEntry>>,
) -> Json<IntersectionResponse> {
    let fired = state.viewport.emit(&state.section, &entries);
    Json(IntersectionResponse {
        fired,
        visible: state.viewport.observer_count(&state.section) == 0,
    })
}

/// Current aggregated page context
pub async fn get_context(State(state): State<AppState>) -> Json<PageContext> {
    Json(state.controller.context())
}

/// What the recommendations panel currently shows
pub async fn get_panel(State(state): State<AppState>) -> Json<PanelState> {
    Json(state.panel.snapshot().await)
}

/// Invokes a footer control of a rendered card
pub async fn invoke_action(
    State(state): State<AppState>,
    Json(request): Json<ActionRequest>,
) -> AppResult<Json<ActionOutcome>> {
    let card = state
        .panel
        .find_card(&request.sku)
        .await
        .ok_or_else(|| AppError::NotFound(format!("No recommendation for {}", request.sku)))?;

    let footer = card
        .footer
        .ok_or_else(|| AppError::NotFound(format!("No footer actions for {}", request.sku)))?;

    let action = match request.action {
        ActionSlot::Primary => &footer.primary,
        ActionSlot::Wishlist => &footer.wishlist,
    };

    let outcome = state.actions.invoke(action).await?;
    Ok(Json(outcome))
}
