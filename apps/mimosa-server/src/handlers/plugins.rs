// [apps/mimosa-server/src/handlers/plugins.rs]
//! Ingestion plugin configuration (§6) and the public, signature-
//! verified MimosaNPM webhook (§4.9).

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use mimosa_models::PluginConfig;
use tracing::warn;

use crate::handlers::ApiResult;
use crate::services::ingestion::mimosa_npm::{handle_record, log_rejected_signature, verify_signature, WebhookRecord};
use crate::state::AppState;

pub async fn get(State(state): State<AppState>) -> ApiResult<Json<Option<PluginConfig>>> {
    Ok(Json(state.settings.get_plugin_config().await?))
}

pub async fn put(State(state): State<AppState>, Json(config): Json<PluginConfig>) -> ApiResult<()> {
    state.settings.set_plugin_config(&config).await?;
    Ok(())
}

const SIGNATURE_HEADER: &str = "x-mimosa-signature";

/// `POST /api/plugins/mimosanpm/ingest`: public, but every request must
/// carry a valid HMAC signature over the raw body or it is rejected
/// before the JSON is even parsed.
pub async fn ingest(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> StatusCode {
    let settings = match state.settings.get_plugin_config().await {
        Ok(Some(config)) => config,
        Ok(None) => return StatusCode::SERVICE_UNAVAILABLE,
        Err(e) => {
            warn!("mimosa_npm: failed to load plugin config: {}", e);
            return StatusCode::SERVICE_UNAVAILABLE;
        }
    };

    if !settings.mimosa_npm.enabled {
        return StatusCode::NOT_FOUND;
    }

    let Some(signature) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) else {
        return StatusCode::UNAUTHORIZED;
    };

    if verify_signature(&settings.mimosa_npm, &body, signature).is_err() {
        log_rejected_signature("unknown");
        return StatusCode::UNAUTHORIZED;
    }

    let record: WebhookRecord = match serde_json::from_slice(&body) {
        Ok(record) => record,
        Err(_) => return StatusCode::BAD_REQUEST,
    };

    if let Err(e) = handle_record(&state, &settings.mimosa_npm, record).await {
        warn!("mimosa_npm: failed to record webhook offense: {}", e);
        return StatusCode::INTERNAL_SERVER_ERROR;
    }

    StatusCode::NO_CONTENT
}
