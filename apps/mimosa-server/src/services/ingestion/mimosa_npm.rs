// [apps/mimosa-server/src/services/ingestion/mimosa_npm.rs]
//! The "MimosaNPM" reverse-proxy webhook (§4.9): signed JSON POSTs from
//! an external log shipper. Mounted as a regular public route on the
//! main HTTP server rather than its own listener, since it is just
//! another authenticated endpoint, not a raw-socket honeypot.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use mimosa_models::{wildcard, MimosaNpmConfig, OffenseEvent};
use serde::Deserialize;
use serde_json::Map;
use sha2::Sha256;
use tracing::warn;

use crate::services::ingestion::submit::{is_ignored, IgnoreRule};
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize)]
pub struct WebhookRecord {
    pub host: String,
    pub path: String,
    pub status: u16,
    pub source_ip: std::net::IpAddr,
}

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("plugin disabled")]
    Disabled,
    #[error("signature verification failed")]
    BadSignature,
    #[error("malformed payload")]
    Malformed,
}

/// Verifies the `X-Mimosa-Signature` header against the raw body using
/// the configured shared secret. `hmac`+`sha2`'s `verify_slice` is
/// constant-time by construction; no hand-rolled comparison is needed.
pub fn verify_signature(config: &MimosaNpmConfig, body: &[u8], signature_b64: &str) -> Result<(), WebhookError> {
    let signature = BASE64.decode(signature_b64).map_err(|_| WebhookError::BadSignature)?;
    let mut mac = HmacSha256::new_from_slice(config.shared_secret.as_bytes()).map_err(|_| WebhookError::BadSignature)?;
    mac.update(body);
    mac.verify_slice(&signature).map_err(|_| WebhookError::BadSignature)
}

/// Classifies a verified webhook record per §8 scenario S5: entries on
/// `ignore_list` are dropped before anything else runs; an explicit
/// `rules` match picks its severity; otherwise the suspicious-status
/// and catch-all alert toggles decide whether a fallback-severity
/// offense is still worth raising. Returns `None` when the record
/// should produce no offense at all.
fn classify(config: &MimosaNpmConfig, record: &WebhookRecord) -> Option<mimosa_models::Severity> {
    let ignore_rules: Vec<IgnoreRule> = config
        .ignore_list
        .iter()
        .map(|entry| IgnoreRule { host: entry.host.clone(), path: entry.path.clone(), status: entry.status })
        .collect();

    if is_ignored(&ignore_rules, Some(&record.host), Some(&record.path), Some(record.status)) {
        return None;
    }

    let matched = config.rules.iter().find(|rule| {
        wildcard::matches(&rule.host, &record.host)
            && wildcard::matches(&rule.path, &record.path)
            && rule.status.map(|status| status == record.status).unwrap_or(true)
    });

    if let Some(rule) = matched {
        return Some(rule.severity);
    }

    let fallback = config.fallback_severity.unwrap_or(config.default_severity);
    if config.alert_on_suspicious_status && record.status >= 400 {
        return Some(fallback);
    }
    if config.alert_on_unmatched {
        return Some(fallback);
    }
    None
}

/// Turns a verified webhook record into an offense, or silently drops
/// it when `classify` finds no reason to alert.
pub async fn handle_record(state: &AppState, config: &MimosaNpmConfig, record: WebhookRecord) -> anyhow::Result<()> {
    let Some(severity) = classify(config, &record) else {
        return Ok(());
    };

    let description = format!("mimosa_npm {} {} -> {}", record.host, record.path, record.status);

    let event = OffenseEvent {
        source_ip: record.source_ip,
        description,
        plugin: Some("mimosa_npm".to_string()),
        severity: Some(severity),
        host: Some(record.host),
        path: Some(record.path),
        context: Map::new(),
    };

    super::submit::submit(state, event).await
}

pub fn log_rejected_signature(host: &str) {
    warn!("mimosa_npm: rejected webhook with invalid signature for host {}", host);
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimosa_models::{MimosaNpmIgnoreEntry, MimosaNpmRule, Severity};

    fn config() -> MimosaNpmConfig {
        MimosaNpmConfig {
            enabled: true,
            shared_secret: "s".into(),
            default_severity: Severity::Bajo,
            fallback_severity: Some(Severity::Medio),
            rules: vec![MimosaNpmRule { host: "*.internal.example.com".into(), path: "/admin*".into(), status: None, severity: Severity::Critico }],
            ignore_list: vec![MimosaNpmIgnoreEntry { host: "health.example.com".into(), path: "/*".into(), status: None }],
            alert_on_suspicious_status: true,
            alert_on_unmatched: false,
        }
    }

    fn record(host: &str, path: &str, status: u16) -> WebhookRecord {
        WebhookRecord { host: host.into(), path: path.into(), status, source_ip: "203.0.113.9".parse().unwrap() }
    }

    #[test]
    fn ignore_list_suppresses_even_a_matching_rule() {
        let mut cfg = config();
        cfg.ignore_list.push(MimosaNpmIgnoreEntry { host: "*.internal.example.com".into(), path: "/admin*".into(), status: None });
        assert!(classify(&cfg, &record("app.internal.example.com", "/admin/login", 200)).is_none());
    }

    #[test]
    fn explicit_rule_match_wins_over_status_heuristics() {
        let cfg = config();
        let severity = classify(&cfg, &record("app.internal.example.com", "/admin/login", 200)).expect("rule should match");
        assert_eq!(severity, Severity::Critico);
    }

    #[test]
    fn suspicious_status_without_a_rule_still_alerts_at_fallback_severity() {
        let cfg = config();
        let severity = classify(&cfg, &record("unrelated.example.com", "/", 404)).expect("suspicious status should alert");
        assert_eq!(severity, Severity::Medio);
    }

    #[test]
    fn unmatched_clean_status_is_silent_when_catchall_disabled() {
        let cfg = config();
        assert!(classify(&cfg, &record("unrelated.example.com", "/", 200)).is_none());
    }
}
