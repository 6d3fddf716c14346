//! [libs/domain/mimosa-models/src/offense.rs]
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Map;
use std::net::IpAddr;

use crate::severity::Severity;

/// A single detected signal of hostile behavior tied to a source IP.
/// Immutable after insert: once recorded, an Offense is never mutated,
/// only read by the rule engine and the stats/heatmap aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offense {
    pub id: u64,
    pub source_ip: IpAddr,
    pub description: String,
    pub description_clean: String,
    pub plugin: Option<String>,
    pub severity: Option<Severity>,
    pub host: Option<String>,
    pub path: Option<String>,
    pub context: Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Strips bracketed/parenthesized technical suffixes and collapses
/// internal whitespace, producing the string the rule engine matches
/// against. Pure function; unit-tested directly rather than only
/// through storage round-trips.
pub fn clean_description(raw: &str) -> String {
    let mut without_suffixes = String::with_capacity(raw.len());
    let mut depth_square = 0i32;
    let mut depth_round = 0i32;

    for ch in raw.chars() {
        match ch {
            '[' => depth_square += 1,
            ']' if depth_square > 0 => depth_square -= 1,
            '(' => depth_round += 1,
            ')' if depth_round > 0 => depth_round -= 1,
            _ if depth_square == 0 && depth_round == 0 => without_suffixes.push(ch),
            _ => {}
        }
    }

    without_suffixes.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Derives the `event_id` used by the rule engine per §4.5: the
/// explicit `context.event_id`, else `context.alert_type`, else the
/// first token after a `:` in the description, else empty.
pub fn derive_event_id(description: &str, context: &Map<String, serde_json::Value>) -> String {
    if let Some(value) = context.get("event_id").and_then(|v| v.as_str()) {
        return value.to_string();
    }
    if let Some(value) = context.get("alert_type").and_then(|v| v.as_str()) {
        return value.to_string();
    }
    description
        .split_once(':')
        .map(|(_, rest)| rest.trim().split_whitespace().next().unwrap_or("").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bracketed_and_parenthesized_suffixes() {
        assert_eq!(
            clean_description("honeypot GET /wp-login.php [ua: curl/7.64] (geo:unknown)"),
            "honeypot GET /wp-login.php"
        );
    }

    #[test]
    fn collapses_internal_whitespace() {
        assert_eq!(clean_description("a   b\tc"), "a b c");
    }

    #[test]
    fn event_id_prefers_explicit_field() {
        let mut ctx = Map::new();
        ctx.insert("event_id".into(), serde_json::json!("brute_force"));
        ctx.insert("alert_type".into(), serde_json::json!("ignored"));
        assert_eq!(derive_event_id("whatever", &ctx), "brute_force");
    }

    #[test]
    fn event_id_falls_back_to_alert_type_then_description_token() {
        let mut ctx = Map::new();
        ctx.insert("alert_type".into(), serde_json::json!("scan"));
        assert_eq!(derive_event_id("whatever", &ctx), "scan");

        let empty = Map::new();
        assert_eq!(derive_event_id("alert: brute_force detected", &empty), "brute_force");
        assert_eq!(derive_event_id("no colon here", &empty), "");
    }
}
