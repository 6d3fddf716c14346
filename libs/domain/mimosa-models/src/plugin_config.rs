//! [libs/domain/mimosa-models/src/plugin_config.rs]
use serde::{Deserialize, Serialize};

use crate::severity::Severity;
use crate::wildcard;

/// What the proxy trap sends back to a probing client. `NotFound` is
/// the least revealing (looks like an absent route); `Custom` lets an
/// operator serve a convincing decoy page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Silence,
    #[serde(rename = "404")]
    NotFound,
    Custom,
}

/// A wildcard-matched severity override for requests whose `Host`
/// matches `pattern`; the first matching policy wins (§8 scenario S5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainPolicy {
    pub pattern: String,
    pub severity: Severity,
}

/// Honeypot configuration for the proxy trap listener (§6). Every
/// request it receives produces an offense; `domain_policies` picks
/// the severity by matching the request's host, falling back to
/// `default_severity` when nothing matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyTrapConfig {
    pub enabled: bool,
    pub port: u16,
    pub default_severity: Severity,
    pub response_type: ResponseType,
    pub custom_html: Option<String>,
    /// Hostnames the trap considers "known bait"; purely informational
    /// today, carried through so `domain_policies` can reference them.
    pub trap_hosts: Vec<String>,
    pub domain_policies: Vec<DomainPolicy>,
}

impl ProxyTrapConfig {
    /// The severity a request against `host` should be tagged with:
    /// the first `domain_policies` entry whose pattern matches, else
    /// `default_severity`.
    pub fn severity_for(&self, host: &str) -> Severity {
        self.domain_policies
            .iter()
            .find(|policy| wildcard::matches(&policy.pattern, host))
            .map(|policy| policy.severity)
            .unwrap_or(self.default_severity)
    }
}

/// Which transport a port honeypot rule watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

/// The port(s) a `PortRule` covers: a single port, an explicit list,
/// or an inclusive range. Kept as a flattened, untagged enum so the
/// admin config JSON reads as `{"port": 23}` / `{"ports": [23, 2323]}`
/// / `{"range": [6000, 6010]}` rather than a wrapped variant tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortSpec {
    Single { port: u16 },
    List { ports: Vec<u16> },
    Range { range: [u16; 2] },
}

impl PortSpec {
    pub fn contains(&self, port: u16) -> bool {
        match self {
            PortSpec::Single { port: single } => *single == port,
            PortSpec::List { ports } => ports.contains(&port),
            PortSpec::Range { range } => (range[0]..=range[1]).contains(&port),
        }
    }

    pub fn all_ports(&self) -> Vec<u16> {
        match self {
            PortSpec::Single { port } => vec![*port],
            PortSpec::List { ports } => ports.clone(),
            PortSpec::Range { range } => (range[0]..=range[1]).collect(),
        }
    }
}

/// One honeypot rule the port detector watches: a connection/datagram
/// on any port covered by `spec`, over `protocol`, is reported at
/// `severity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortRule {
    pub protocol: Protocol,
    pub severity: Severity,
    #[serde(flatten)]
    pub spec: PortSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortDetectorConfig {
    pub enabled: bool,
    pub rules: Vec<PortRule>,
}

/// A host/path/status pattern mapped to a severity for an inbound
/// MimosaNPM webhook record; the first matching rule wins. `status`
/// left unset matches any status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MimosaNpmRule {
    pub host: String,
    pub path: String,
    pub status: Option<u16>,
    pub severity: Severity,
}

/// A host/path/status pattern that suppresses a webhook record
/// entirely: no offense, no broadcast (§8 scenario S5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MimosaNpmIgnoreEntry {
    pub host: String,
    pub path: String,
    pub status: Option<u16>,
}

/// Webhook ingestion from an external MimosaNPM reverse-proxy log
/// shipper. `shared_secret` signs inbound payloads (HMAC, §4.9);
/// `fallback_severity` is used when a payload matches no `rules` entry
/// and no rule-derived default applies (resolves to `default_severity`
/// otherwise). `ignore_list` entries are checked first and silently
/// drop the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MimosaNpmConfig {
    pub enabled: bool,
    pub shared_secret: String,
    pub default_severity: Severity,
    pub fallback_severity: Option<Severity>,
    pub rules: Vec<MimosaNpmRule>,
    pub ignore_list: Vec<MimosaNpmIgnoreEntry>,
    /// Raise an offense for a record whose status looks suspicious
    /// (4xx/5xx) even when no explicit rule matches it.
    pub alert_on_suspicious_status: bool,
    /// Raise an offense for every record that matches neither a rule
    /// nor the suspicious-status heuristic, at `fallback_severity`.
    pub alert_on_unmatched: bool,
}

/// The full set of pluggable ingestion sources and their settings, as
/// stored in `system_settings` and surfaced on the admin config screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    pub proxy_trap: ProxyTrapConfig,
    pub port_detector: PortDetectorConfig,
    pub mimosa_npm: MimosaNpmConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_severity_defaults_to_default_severity_when_unset() {
        let cfg = MimosaNpmConfig {
            enabled: true,
            shared_secret: "s".into(),
            default_severity: Severity::Medio,
            fallback_severity: None,
            rules: Vec::new(),
            ignore_list: Vec::new(),
            alert_on_suspicious_status: true,
            alert_on_unmatched: true,
        };
        let resolved = cfg.fallback_severity.unwrap_or(cfg.default_severity);
        assert_eq!(resolved, Severity::Medio);
    }

    #[test]
    fn domain_policy_falls_back_to_default_severity() {
        let cfg = ProxyTrapConfig {
            enabled: true,
            port: 8081,
            default_severity: Severity::Bajo,
            response_type: ResponseType::NotFound,
            custom_html: None,
            trap_hosts: vec![],
            domain_policies: vec![DomainPolicy { pattern: "*.admin.example.com".into(), severity: Severity::Critico }],
        };
        assert_eq!(cfg.severity_for("login.admin.example.com"), Severity::Critico);
        assert_eq!(cfg.severity_for("unrelated.example.com"), Severity::Bajo);
    }

    #[test]
    fn port_spec_range_contains_is_inclusive() {
        let spec = PortSpec::Range { range: [6000, 6005] };
        assert!(spec.contains(6000));
        assert!(spec.contains(6005));
        assert!(!spec.contains(5999));
        assert_eq!(spec.all_ports().len(), 6);
    }
}
