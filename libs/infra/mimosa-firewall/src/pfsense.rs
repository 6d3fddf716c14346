// INICIO DEL ARCHIVO [libs/infra/mimosa-firewall/src/pfsense.rs]
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use mimosa_models::FirewallConfig;
use reqwest::Client;
use serde::Deserialize;

use crate::alias::{PortProtocol, ALL_ALIASES, MIMOSA_RULE_SPECS};
use crate::driver::{FirewallDriver, FirewallRule};
use crate::error::FirewallError;

/// Talks to the pfSense REST API package's `/api/v2/*` endpoints.
/// Unlike the legacy v1 API, v2 represents alias members as a JSON
/// array rather than a delimited string, and rule ids are the
/// gateway's `tracker` field.
pub struct PfSenseDriver {
    http: Client,
    base_url: String,
    username: String,
    password: String,
    apply_changes: bool,
}

impl PfSenseDriver {
    pub fn new(config: &FirewallConfig) -> Self {
        Self {
            http: Client::builder()
                .timeout(Duration::from_secs(15))
                .danger_accept_invalid_certs(!config.verify_tls)
                .build()
                .expect("failed to initialize pfSense HTTP client"),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            apply_changes: config.apply_changes,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v2/{}", self.base_url, path)
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
            .get(self.endpoint("firewall/alias"))
            .query(&[("name", name)])
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }

        let response = self
            .http
            .post(self.endpoint("firewall/alias"))
            .basic_auth(&self.username, Some(&self.password))
            .json(&serde_json::json!({ "name": name, "type": "host", "address": [], "descr": "managed by mimosa" }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FirewallError::Rejected(response.status().as_u16(), format!("failed to create alias {}", name)));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct AliasResponse {
    data: AliasEntry,
}

#[derive(Deserialize)]
struct AliasEntry {
    address: Vec<String>,
}

#[derive(Deserialize)]
struct RuleListResponse {
    data: Vec<RuleEntry>,
}

#[derive(Deserialize)]
struct RuleEntry {
    tracker: String,
    descr: String,
    disabled: Option<bool>,
    #[serde(rename = "type")]
    kind: String,
    source: RuleSource,
}

#[derive(Deserialize)]
struct RuleSource {
    address: Option<String>,
}

impl From<RuleEntry> for FirewallRule {
    fn from(entry: RuleEntry) -> Self {
        FirewallRule {
            id: entry.tracker,
            description: entry.descr,
            enabled: !entry.disabled.unwrap_or(false),
            action: entry.kind,
            source_alias: entry.source.address.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl FirewallDriver for PfSenseDriver {
    async fn health_check(&self) -> Result<(), FirewallError> {
        let response = self
            .http
            .get(self.endpoint("status/system"))
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
            .get(self.endpoint("firewall/alias"))
            .query(&[("name", alias)])
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FirewallError::Rejected(response.status().as_u16(), "alias lookup rejected".into()));
        }

        let payload: AliasResponse = response.json().await.map_err(|e| FirewallError::UnexpectedResponse(e.to_string()))?;

        payload
            .data
            .address
            .into_iter()
            .filter(|s| !s.is_empty())
            .map(|ip| ip.parse().map_err(|_| FirewallError::UnexpectedResponse(format!("bad address: {}", ip))))
            .collect()
    }

    async fn set_alias_contents(&self, alias: &str, desired: &[IpAddr]) -> Result<(), FirewallError> {
        let address: Vec<String> = desired.iter().map(|ip| ip.to_string()).collect();

        let response = self
            .http
            .patch(self.endpoint("firewall/alias"))
            .basic_auth(&self.username, Some(&self.password))
            .json(&serde_json::json!({ "name": alias, "address": address }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FirewallError::Rejected(response.status().as_u16(), "alias update rejected".into()));
        }

        self.maybe_apply().await
    }

    async fn ports_alias_sync(&self, protocol: PortProtocol, ports: &[u16]) -> Result<(), FirewallError> {
        let name = protocol.alias_name();
        self.ensure_alias(name).await?;
        let address: Vec<String> = ports.iter().map(|p| p.to_string()).collect();

        let response = self
            .http
            .patch(self.endpoint("firewall/alias"))
            .basic_auth(&self.username, Some(&self.password))
            .json(&serde_json::json!({ "name": name, "address": address }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FirewallError::Rejected(response.status().as_u16(), "port alias update rejected".into()));
        }
        self.maybe_apply().await
    }

    async fn list_rules(&self) -> Result<Vec<FirewallRule>, FirewallError> {
        let response = self
            .http
            .get(self.endpoint("firewall/rules"))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FirewallError::Rejected(response.status().as_u16(), "rule list rejected".into()));
        }

        let payload: RuleListResponse = response.json().await.map_err(|e| FirewallError::UnexpectedResponse(e.to_string()))?;
        Ok(payload.data.into_iter().map(FirewallRule::from).collect())
    }

    async fn toggle_rule(&self, id: &str, enabled: bool) -> Result<(), FirewallError> {
        let response = self
            .http
            .patch(self.endpoint("firewall/rule"))
            .basic_auth(&self.username, Some(&self.password))
            .json(&serde_json::json!({ "tracker": id, "disabled": !enabled }))
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
            .delete(self.endpoint("firewall/rule"))
            .basic_auth(&self.username, Some(&self.password))
            .query(&[("tracker", id)])
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
                .post(self.endpoint("firewall/rule"))
                .basic_auth(&self.username, Some(&self.password))
                .json(&serde_json::json!({
                    "descr": spec.description,
                    "type": spec.action,
                    "source": { "address": spec.source_alias },
                    "disabled": false,
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
            .post(self.endpoint("firewall/apply"))
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FirewallError::Rejected(response.status().as_u16(), "apply rejected".into()));
        }
        Ok(())
    }
}
