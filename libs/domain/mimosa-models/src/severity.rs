//! [libs/domain/mimosa-models/src/severity.rs]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Offense/rule severity, ordered lowest-to-highest so the block
/// manager can decide whether a new reason outranks an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Bajo,
    Medio,
    Alto,
    Critico,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Bajo => "bajo",
            Severity::Medio => "medio",
            Severity::Alto => "alto",
            Severity::Critico => "critico",
        };
        f.write_str(label)
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "bajo" => Ok(Severity::Bajo),
            "medio" => Ok(Severity::Medio),
            "alto" => Ok(Severity::Alto),
            "critico" => Ok(Severity::Critico),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_escalating() {
        assert!(Severity::Bajo < Severity::Medio);
        assert!(Severity::Medio < Severity::Alto);
        assert!(Severity::Alto < Severity::Critico);
    }

    #[test]
    fn round_trips_through_str() {
        for s in [Severity::Bajo, Severity::Medio, Severity::Alto, Severity::Critico] {
            let parsed: Severity = s.to_string().parse().unwrap();
            assert_eq!(parsed, s);
        }
    }
}
