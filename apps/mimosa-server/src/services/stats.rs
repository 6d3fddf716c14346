// [apps/mimosa-server/src/services/stats.rs]
//! Builds the `StatsSnapshot` the dashboard, the synchronizer, and the
//! broadcaster's 30-second heartbeat all share (§4.10).

use chrono::Utc;
use mimosa_models::StatsSnapshot;

use crate::state::AppState;

pub async fn snapshot(state: &AppState) -> anyhow::Result<StatsSnapshot> {
    let now = Utc::now();
    let since_last_hour = now - chrono::Duration::hours(1);

    let offenses_last_hour = state.offenses.count_global_since(since_last_hour).await?;
    let offenses_total = state.offenses.count_global_total().await?;
    let active_blocks = state.blocks.count_active().await?;
    let blocks_total = state.blocks.count_total().await?;

    Ok(StatsSnapshot { offenses_last_hour, offenses_total, active_blocks, blocks_total, at: now })
}
