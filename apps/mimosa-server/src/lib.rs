// [apps/mimosa-server/src/lib.rs]
//! The Mimosa server binary's library half: everything `main.rs` and
//! the `mimosa-migrator`/`mimosa-seed` binaries share.

pub mod config;
pub mod handlers;
pub mod kernel;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub mod prelude {
    pub use crate::kernel::MimosaKernel;
    pub use crate::state::AppState;
}
