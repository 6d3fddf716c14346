// [libs/infra/mimosa-firewall/src/error.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FirewallError {
    #[error("gateway unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    #[error("gateway rejected the request (status {0}): {1}")]
    Rejected(u16, String),

    #[error("gateway authentication failed")]
    AuthenticationFailed,

    #[error("gateway returned an unexpected response shape: {0}")]
    UnexpectedResponse(String),
}
