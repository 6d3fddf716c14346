// [apps/mimosa-server/src/services/ingestion/mod.rs]
//! Offense producers (C9, §4.9): each runs as its own listener task,
//! started only when enabled in `PluginConfig`, and all three funnel
//! through `submit::submit`.

pub mod mimosa_npm;
pub mod port_detector;
pub mod proxy_trap;
pub mod submit;

pub use submit::submit;
