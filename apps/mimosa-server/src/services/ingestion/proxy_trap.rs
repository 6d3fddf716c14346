// [apps/mimosa-server/src/services/ingestion/proxy_trap.rs]
//! The "ProxyTrap" honeypot HTTP listener (§4.9): a second, unrelated
//! port that exists only to be scanned. Every request it receives is
//! an offense by definition; there is no legitimate traffic to this
//! listener, so unlike a normal web server it never 404s without also
//! recording the hit.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use mimosa_models::{OffenseEvent, ResponseType};
use tracing::{error, info, warn};

use crate::state::AppState;

pub fn spawn(state: AppState, port: u16) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let app = Router::new().fallback(any(handle)).with_state(state);
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("proxy_trap: failed to bind port {}: {}", port, e);
                return;
            }
        };

        info!("proxy_trap: listening on {}", addr);
        if let Err(e) = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await {
            error!("proxy_trap: server error: {}", e);
        }
    })
}

async fn handle(State(state): State<AppState>, ConnectInfo(peer): ConnectInfo<SocketAddr>, method: Method, uri: Uri) -> Response {
    let settings = match state.settings.get_plugin_config().await {
        Ok(Some(config)) => config,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            warn!("proxy_trap: failed to load plugin config: {}", e);
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    if !settings.proxy_trap.enabled {
        return StatusCode::NOT_FOUND.into_response();
    }

    let path = uri.path();
    let host = uri.host().map(|h| h.to_string());
    let severity = settings.proxy_trap.severity_for(host.as_deref().unwrap_or(""));
    let description = format!("honeypot {} {}{}", method, host.clone().unwrap_or_default(), path);

    let event = OffenseEvent {
        source_ip: peer.ip(),
        description,
        plugin: Some("proxy_trap".to_string()),
        severity: Some(severity),
        host,
        path: Some(path.to_string()),
        context: super::submit::empty_context(),
    };

    if let Err(e) = super::submit::submit(&state, event).await {
        error!("proxy_trap: submit failed: {}", e);
    }

    match settings.proxy_trap.response_type {
        ResponseType::Silence => StatusCode::NO_CONTENT.into_response(),
        ResponseType::NotFound => StatusCode::NOT_FOUND.into_response(),
        ResponseType::Custom => {
            let body = settings.proxy_trap.custom_html.clone().unwrap_or_default();
            ([(axum::http::header::CONTENT_TYPE, "text/html; charset=utf-8")], body).into_response()
        }
    }
}
