//! Translation from declarative resources to runtime-native units.
//!
//! Nothing here touches the runtime. Malformed CPU or memory strings do not
//! fail the translation: they produce a [`Limit`] of 0 ("no limit") whose
//! outcome records why, so callers choose whether to accept or reject it.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use thiserror::Error;

use super::types::{ANY_HOST_IP, PortBinding, PortBindings};
use crate::service::PortMapping;

const NANOS_PER_CORE: f64 = 1_000_000_000.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("malformed cpu limit '{0}'")]
    MalformedCpu(String),
    #[error("malformed memory limit '{0}'")]
    MalformedMemory(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitOutcome {
    /// Input was empty.
    Unset,
    Parsed,
    Malformed(ResourceError),
}

/// A parsed limit in runtime units. `value` is 0 unless the outcome is
/// [`LimitOutcome::Parsed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limit {
    pub value: i64,
    pub outcome: LimitOutcome,
}

impl Limit {
    fn unset() -> Self {
        Limit {
            value: 0,
            outcome: LimitOutcome::Unset,
        }
    }

    fn parsed(value: i64) -> Self {
        Limit {
            value,
            outcome: LimitOutcome::Parsed,
        }
    }

    fn malformed(err: ResourceError) -> Self {
        Limit {
            value: 0,
            outcome: LimitOutcome::Malformed(err),
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self.outcome, LimitOutcome::Malformed(_))
    }

    pub fn into_result(self) -> Result<i64, ResourceError> {
        match self.outcome {
            LimitOutcome::Malformed(err) => Err(err),
            LimitOutcome::Unset | LimitOutcome::Parsed => Ok(self.value),
        }
    }
}

/// Cores as a decimal (`"0.5"`, `"2"`) to nanocores.
pub fn parse_cpu(spec: &str) -> Limit {
    let spec = spec.trim();
    if spec.is_empty() {
        return Limit::unset();
    }

    let malformed = || Limit::malformed(ResourceError::MalformedCpu(spec.to_string()));
    let cores: f64 = match spec.parse() {
        Ok(cores) => cores,
        Err(_) => return malformed(),
    };
    if !cores.is_finite() || cores < 0.0 {
        return malformed();
    }

    let nanos = (cores * NANOS_PER_CORE).round();
    if nanos > i64::MAX as f64 {
        return malformed();
    }
    Limit::parsed(nanos as i64)
}

/// `<integer><unit>` to bytes. Units are k, m, g with an optional `b`,
/// case-insensitive, 1024-based.
pub fn parse_memory(spec: &str) -> Limit {
    let spec = spec.trim();
    if spec.is_empty() {
        return Limit::unset();
    }

    let malformed = || Limit::malformed(ResourceError::MalformedMemory(spec.to_string()));
    let split = spec
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(spec.len());
    let (digits, unit) = spec.split_at(split);
    if digits.is_empty() {
        return malformed();
    }
    let value: i64 = match digits.parse() {
        Ok(value) => value,
        Err(_) => return malformed(),
    };

    let multiplier: i64 = match unit.to_ascii_lowercase().as_str() {
        "" => 1,
        "k" | "kb" => 1024,
        "m" | "mb" => 1024 * 1024,
        "g" | "gb" => 1024 * 1024 * 1024,
        _ => return malformed(),
    };

    match value.checked_mul(multiplier) {
        Some(bytes) => Limit::parsed(bytes),
        None => malformed(),
    }
}

/// Publishes every mapping on all host interfaces. `None` for no mappings:
/// an empty table would suppress port exposure altogether.
pub fn convert_ports(mappings: &[PortMapping]) -> Option<PortBindings> {
    if mappings.is_empty() {
        return None;
    }

    let mut bindings = HashMap::with_capacity(mappings.len());
    for mapping in mappings {
        let host_port = match mapping.host_port {
            0 => String::new(),
            port => port.to_string(),
        };
        bindings.insert(
            mapping.key(),
            vec![PortBinding {
                host_ip: ANY_HOST_IP.to_string(),
                host_port,
            }],
        );
    }
    Some(bindings)
}

pub fn exposed_ports(mappings: &[PortMapping]) -> Option<BTreeSet<String>> {
    if mappings.is_empty() {
        return None;
    }
    Some(mappings.iter().map(PortMapping::key).collect())
}

/// `KEY=VALUE` pairs in key order.
pub fn convert_env(env: &BTreeMap<String, String>) -> Vec<String> {
    env.iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_fraction_to_nanocores() {
        assert_eq!(parse_cpu("0.5").value, 500_000_000);
        assert_eq!(parse_cpu("2").value, 2_000_000_000);
        assert_eq!(parse_cpu("0.333333333").value, 333_333_333);
    }

    #[test]
    fn empty_cpu_is_unset() {
        let limit = parse_cpu("");
        assert_eq!(limit.value, 0);
        assert_eq!(limit.outcome, LimitOutcome::Unset);
        assert!(limit.is_valid());
    }

    #[test]
    fn bogus_cpu_degrades_to_no_limit() {
        for spec in ["bogus", "-1", "NaN", "inf", "0.5cores"] {
            let limit = parse_cpu(spec);
            assert_eq!(limit.value, 0, "{}", spec);
            assert!(!limit.is_valid(), "{}", spec);
        }
        assert_eq!(
            parse_cpu("bogus").into_result(),
            Err(ResourceError::MalformedCpu("bogus".to_string()))
        );
    }

    #[test]
    fn memory_units() {
        assert_eq!(parse_memory("512m").value, 512 * 1024 * 1024);
        assert_eq!(parse_memory("1g").value, 1024 * 1024 * 1024);
        assert_eq!(parse_memory("100").value, 100);
        assert_eq!(parse_memory("4k").value, 4096);
        assert_eq!(parse_memory("2GB").value, 2 * 1024 * 1024 * 1024);
        assert_eq!(parse_memory("256Mb").value, 256 * 1024 * 1024);
    }

    #[test]
    fn malformed_memory() {
        assert_eq!(parse_memory("").value, 0);
        assert!(parse_memory("").is_valid());
        for spec in ["m", "12x", "1.5g", "-5m", "99999999999999999999", "9223372036854775807g"] {
            let limit = parse_memory(spec);
            assert_eq!(limit.value, 0, "{}", spec);
            assert!(!limit.is_valid(), "{}", spec);
        }
    }

    #[test]
    fn no_mappings_means_no_binding_table() {
        assert_eq!(convert_ports(&[]), None);
        assert_eq!(exposed_ports(&[]), None);
    }

    #[test]
    fn ports_publish_on_all_interfaces() {
        let mappings = [PortMapping::tcp(80).on_host(8080), PortMapping::udp(53)];
        let bindings = convert_ports(&mappings).unwrap();

        assert_eq!(
            bindings["80/tcp"],
            vec![PortBinding {
                host_ip: "0.0.0.0".to_string(),
                host_port: "8080".to_string(),
            }]
        );
        assert_eq!(bindings["53/udp"][0].host_port, "");
    }

    #[test]
    fn empty_protocol_defaults_to_tcp() {
        let mapping: PortMapping =
            serde_yaml::from_str("container_port: 80\nprotocol: \"\"").unwrap();
        let exposed = exposed_ports(&[mapping]).unwrap();
        assert!(exposed.contains("80/tcp"));
        assert!(convert_ports(&[mapping]).unwrap().contains_key("80/tcp"));
    }

    #[test]
    fn env_is_sorted_by_key() {
        let env = BTreeMap::from([
            ("ZED".to_string(), "1".to_string()),
            ("ALPHA".to_string(), "a=b".to_string()),
        ]);
        assert_eq!(convert_env(&env), vec!["ALPHA=a=b", "ZED=1"]);
    }
}
