// INICIO DEL ARCHIVO [libs/infra/mimosa-firewall/src/opnsense.rs]
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use mimosa_models::FirewallConfig;
use reqwest::Client;
use serde::Deserialize;

use crate::alias::{PortProtocol, ALL_ALIASES, MIMOSA_RULE_SPECS};
use crate::driver::{FirewallDriver, FirewallRule};
use crate::error::FirewallError;

/// Talks to an OPNsense box over its `/api/firewall/alias_util/*` and
/// `/api/firewall/filter/*` endpoints. Alias membership is read as the
/// alias's resolved content list and rewritten with `set` rather than
/// individual add/delete calls, since OPNsense applies a `set` in one
/// atomic reconfigure.
pub struct OpnSenseDriver {
    http: Client,
    base_url: String,
    username: String,
    password: String,
    apply_changes: bool,
}

impl OpnSenseDriver {
    pub fn new(config: &FirewallConfig) -> Self {
        Self {
            http: Client::builder()
                .timeout(Duration::from_secs(15))
                .danger_accept_invalid_certs(!config.verify_tls)
                .build()
                .expect("failed to initialize OPNsense HTTP client"),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            apply_changes: config.apply_changes,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/firewall/{}", self.base_url, path)
    }

    async fn maybe_apply(&self) -> Result<(), FirewallError> {
        if self.apply_changes {
            self.apply().await
        } else {
            Ok(())
        }
    }

    async fn ensure_alias(&self, name: &str) -> Result<(), FirewallError> {
        let response = self
            .http
            .get(self.endpoint(&format!("alias/get_uuid/{}", name)))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        if response.status().as_u16() == 200 {
            return Ok(());
        }

        let response = self
            .http
            .post(self.endpoint("alias/addItem"))
            .basic_auth(&self.username, Some(&self.password))
            .json(&serde_json::json!({ "alias": { "name": name, "type": "host", "content": "", "enabled": "1" } }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FirewallError::Rejected(response.status().as_u16(), format!("failed to create alias {}", name)));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct AliasListResponse {
    rows: Vec<AliasRow>,
}

#[derive(Deserialize)]
struct AliasRow {
    ip: String,
}

#[derive(Deserialize)]
struct ApplyResponse {
    status: String,
}

#[derive(Deserialize)]
struct FilterSearchResponse {
    rows: Vec<FilterRuleRow>,
}

#[derive(Deserialize)]
struct FilterRuleRow {
    uuid: String,
    description: String,
    enabled: String,
    action: String,
    source_net: String,
}

impl From<FilterRuleRow> for FirewallRule {
    fn from(row: FilterRuleRow) -> Self {
        FirewallRule { id: row.uuid, description: row.description, enabled: row.enabled == "1", action: row.action, source_alias: row.source_net }
    }
}

#[async_trait]
impl FirewallDriver for OpnSenseDriver {
    async fn health_check(&self) -> Result<(), FirewallError> {
        let response = self
            .http
            .get(self.endpoint("alias/get_uuid"))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        match response.status().as_u16() {
            200 => Ok(()),
            401 | 403 => Err(FirewallError::AuthenticationFailed),
            status => Err(FirewallError::Rejected(status, "health check failed".into())),
        }
    }

    async fn ensure_aliases(&self) -> Result<(), FirewallError> {
        for name in ALL_ALIASES {
            self.ensure_alias(name).await?;
        }
        self.maybe_apply().await
    }

    async fn read_alias_contents(&self, alias: &str) -> Result<Vec<IpAddr>, FirewallError> {
        let response = self
            .http
            .get(self.endpoint(&format!("alias_util/list/{}", alias)))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FirewallError::Rejected(response.status().as_u16(), "list rejected".into()));
        }

        let payload: AliasListResponse = response.json().await.map_err(|e| FirewallError::UnexpectedResponse(e.to_string()))?;

        payload
            .rows
            .into_iter()
            .map(|row| row.ip.parse().map_err(|_| FirewallError::UnexpectedResponse(format!("bad address: {}", row.ip))))
            .collect()
    }

    async fn set_alias_contents(&self, alias: &str, desired: &[IpAddr]) -> Result<(), FirewallError> {
        let content = desired.iter().map(|ip| ip.to_string()).collect::<Vec<_>>().join("\n");

        let response = self
            .http
            .post(self.endpoint(&format!("alias_util/set/{}", alias)))
            .basic_auth(&self.username, Some(&self.password))
            .json(&serde_json::json!({ "address": content }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FirewallError::Rejected(response.status().as_u16(), "set rejected".into()));
        }

        let payload: ApplyResponse = response.json().await.map_err(|e| FirewallError::UnexpectedResponse(e.to_string()))?;
        if payload.status != "ok" {
            return Err(FirewallError::UnexpectedResponse(payload.status));
        }

        self.maybe_apply().await
    }

    async fn ports_alias_sync(&self, protocol: PortProtocol, ports: &[u16]) -> Result<(), FirewallError> {
        let name = protocol.alias_name();
        self.ensure_alias(name).await?;
        let content = ports.iter().map(|p| p.to_string()).collect::<Vec<_>>().join("\n");

        let response = self
            .http
            .post(self.endpoint(&format!("alias_util/set/{}", name)))
            .basic_auth(&self.username, Some(&self.password))
            .json(&serde_json::json!({ "address": content }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FirewallError::Rejected(response.status().as_u16(), "port alias set rejected".into()));
        }
        self.maybe_apply().await
    }

    async fn list_rules(&self) -> Result<Vec<FirewallRule>, FirewallError> {
        let response = self
            .http
            .get(self.endpoint("filter/searchRule"))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FirewallError::Rejected(response.status().as_u16(), "rule search rejected".into()));
        }

        let payload: FilterSearchResponse = response.json().await.map_err(|e| FirewallError::UnexpectedResponse(e.to_string()))?;
        Ok(payload.rows.into_iter().map(FirewallRule::from).collect())
    }

    async fn toggle_rule(&self, id: &str, enabled: bool) -> Result<(), FirewallError> {
        let response = self
            .http
            .post(self.endpoint(&format!("filter/toggleRule/{}/{}", id, if enabled { 1 } else { 0 })))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FirewallError::Rejected(response.status().as_u16(), "rule toggle rejected".into()));
        }
        self.maybe_apply().await
    }

    async fn delete_rule(&self, id: &str) -> Result<(), FirewallError> {
        let response = self
            .http
            .post(self.endpoint(&format!("filter/delRule/{}", id)))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FirewallError::Rejected(response.status().as_u16(), "rule delete rejected".into()));
        }
        self.maybe_apply().await
    }

    async fn install_mimosa_rules(&self) -> Result<(), FirewallError> {
        let existing = self.list_rules().await?;
        for spec in MIMOSA_RULE_SPECS {
            if existing.iter().any(|rule| rule.description == spec.description) {
                continue;
            }
            let response = self
                .http
                .post(self.endpoint("filter/addRule"))
                .basic_auth(&self.username, Some(&self.password))
                .json(&serde_json::json!({
                    "rule": {
                        "description": spec.description,
                        "action": spec.action,
                        "source_net": spec.source_alias,
                        "enabled": "1",
                    }
                }))
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(FirewallError::Rejected(response.status().as_u16(), format!("failed to install rule {}", spec.description)));
            }
        }
        self.maybe_apply().await
    }

    async fn apply(&self) -> Result<(), FirewallError> {
        let response = self
            .http
            .post(self.endpoint("filter/apply"))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FirewallError::Rejected(response.status().as_u16(), "apply rejected".into()));
        }
        Ok(())
    }
}
