//! [libs/domain/mimosa-models/src/rule.rs]
use serde::{Deserialize, Serialize};

use crate::severity::Severity;

/// An escalation rule (§3, §4.5): when an offense's `plugin`/
/// `event_id`/`description` match this rule's wildcard patterns and
/// the rolling counts clear its configured thresholds, it decides the
/// block duration. Rules are evaluated in ascending `id` order; the
/// first one that matches wins, so id order is this system's only
/// priority mechanism.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: u64,
    pub plugin: String,
    pub event_id: String,
    pub severity: Option<Severity>,
    pub description: String,
    pub min_last_hour: u32,
    pub min_total: u32,
    pub min_blocks_total: u32,
    pub block_minutes: Option<u32>,
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_with_no_block_minutes_is_permanent_when_it_fires() {
        let rule = Rule {
            id: 1,
            plugin: "*".into(),
            event_id: "*".into(),
            severity: None,
            description: "brute*force".into(),
            min_last_hour: 5,
            min_total: 5,
            min_blocks_total: 0,
            block_minutes: None,
            enabled: true,
        };
        assert!(rule.block_minutes.is_none());
    }
}
