// [apps/mimosa-server/src/routes.rs]
//! The full HTTP surface (§6): authenticated admin/API routes guarded
//! by `session_guard`, the public redacted read surface, and the two
//! routes that carry their own authentication (the MimosaNPM webhook's
//! HMAC signature, and the login endpoint that issues the cookie).

use std::time::Duration;

use axum::http::{header, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{auth, blocks, dashboard, firewalls, ips, offenses, plugins, public, rules, stats, whitelist, ws};
use crate::middleware::session_guard;
use crate::state::AppState;

pub fn build(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::COOKIE])
        .max_age(Duration::from_secs(3600));

    let auth_routes = Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout));

    let admin_routes = Router::new()
        .route("/api/auth/session", get(auth::session))
        .route("/api/firewalls", get(firewalls::list).post(firewalls::create))
        .route("/api/firewalls/:id", put(firewalls::update).delete(firewalls::delete))
        .route("/api/firewalls/:id/test", post(firewalls::test))
        .route("/api/firewalls/:id/setup", post(firewalls::setup))
        .route("/api/firewalls/:id/aliases", get(firewalls::aliases))
        .route("/api/firewalls/:id/blacklist", get(firewalls::blacklist))
        .route("/api/firewalls/:id/blocks", get(firewalls::blocks))
        .route("/api/firewalls/:id/rules", get(firewalls::list_rules))
        .route("/api/firewalls/:id/rules/:rule_id", put(firewalls::toggle_rule).delete(firewalls::delete_rule))
        .route("/api/whitelist", get(whitelist::list).post(whitelist::create))
        .route("/api/whitelist/:id", delete(whitelist::delete))
        .route("/api/rules", get(rules::list).post(rules::create))
        .route("/api/rules/:id", put(rules::update).delete(rules::delete))
        .route("/api/offenses", get(offenses::list))
        .route("/api/offenses/stats", get(offenses::stats))
        .route("/api/blocks", get(blocks::list).post(blocks::create))
        .route("/api/blocks/history", get(blocks::history))
        .route("/api/blocks/:ip", delete(blocks::delete))
        .route("/api/stats", get(stats::current))
        .route("/api/dashboard/health", get(firewalls::health_summary))
        .route("/api/dashboard/top_ips", get(dashboard::top_ips))
        .route("/api/dashboard/blocks/expiring", get(dashboard::blocks_expiring))
        .route("/api/dashboard/blocks/reasons", get(dashboard::blocks_reasons))
        .route("/api/dashboard/ip_types", get(dashboard::ip_types))
        .route("/api/dashboard/reaction_time", get(dashboard::reaction_time))
        .route("/api/ips", get(ips::list))
        .route("/api/ips/:ip", get(ips::get))
        .route("/api/ips/:ip/refresh", post(ips::refresh))
        .route("/api/plugins/config", get(plugins::get).put(plugins::put))
        .route("/ws/live", get(ws::upgrade))
        .layer(from_fn_with_state(state.clone(), session_guard));

    let public_routes = Router::new()
        .route("/api/plugins/mimosanpm/ingest", post(plugins::ingest))
        .route("/api/public/feed", get(public::feed))
        .route("/api/public/stats", get(public::stats))
        .route("/api/public/offense_types", get(public::offense_types));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(auth_routes)
        .merge(admin_routes)
        .merge(public_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
