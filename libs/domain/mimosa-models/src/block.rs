//! [libs/domain/mimosa-models/src/block.rs]
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::Severity;

/// A decision to have the firewall drop traffic from a source IP for
/// a bounded (or unbounded) time. At most one active Block exists per
/// IP; `expires_at = None` means permanent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub ip: IpAddr,
    pub reason: String,
    pub reason_text: Option<String>,
    pub reason_plugin: Option<String>,
    /// Severity of the reason currently recorded, when it came from an
    /// automated rule; `None` for manual/admin blocks. Drives whether a
    /// later automated block is allowed to overwrite the reason.
    pub reason_severity: Option<Severity>,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub sync_with_firewall: bool,
}

impl Block {
    /// A block with `expires_at = None` is permanent.
    pub fn is_permanent(&self) -> bool {
        self.expires_at.is_none()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expiry) if expiry <= now)
    }
}

/// Append-only audit trail entry for a block's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockHistoryAction {
    Add,
    Remove,
    Expire,
    Extend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockHistoryEntry {
    pub ip: IpAddr,
    pub reason: String,
    pub action: BlockHistoryAction,
    pub at: DateTime<Utc>,
    pub source: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn block(expires_in_minutes: Option<i64>) -> Block {
        let now = Utc::now();
        Block {
            ip: "203.0.113.10".parse().unwrap(),
            reason: "test".into(),
            reason_text: None,
            reason_plugin: None,
            reason_severity: None,
            source: "test".into(),
            created_at: now,
            expires_at: expires_in_minutes.map(|m| now + Duration::minutes(m)),
            active: true,
            sync_with_firewall: true,
        }
    }

    #[test]
    fn permanent_block_has_no_expiry() {
        assert!(block(None).is_permanent());
        assert!(!block(Some(60)).is_permanent());
    }

    #[test]
    fn expiry_check_uses_now() {
        let past = block(Some(-1));
        assert!(past.is_expired(Utc::now()));
        let future = block(Some(60));
        assert!(!future.is_expired(Utc::now()));
    }
}
