//! [libs/domain/mimosa-models/src/event.rs]
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::block::Block;
use crate::offense::Offense;
use crate::severity::Severity;

/// The inbound shape an ingestion source hands to the shared
/// `submit()` pipeline (§4.9), before it is persisted as an `Offense`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffenseEvent {
    pub source_ip: IpAddr,
    pub description: String,
    pub plugin: Option<String>,
    pub severity: Option<Severity>,
    pub host: Option<String>,
    pub path: Option<String>,
    pub context: serde_json::Map<String, serde_json::Value>,
}

/// A point-in-time rollup broadcast alongside offense/block events so
/// connected dashboards can render counters without re-querying the
/// store on every tick (§4.10).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub offenses_last_hour: u64,
    pub offenses_total: u64,
    pub active_blocks: u64,
    pub blocks_total: u64,
    pub at: DateTime<Utc>,
}

/// Everything published on the live-events broadcaster (§4.10). The
/// WebSocket handler serializes this directly; each connected client
/// gets its own lagging-tolerant receiver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent {
    Offense(Offense),
    Block(Block),
    Stats(StatsSnapshot),
}
