use std::{collections::BTreeMap, fmt, str::FromStr, time::Duration};

use serde::{
    Deserialize, Deserializer, Serialize,
    de::{MapAccess, Visitor},
};

/// Declarative description of one logical service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub replicas: u32,
    #[serde(default)]
    pub ports: Vec<PortMapping>,
    #[serde(default, deserialize_with = "unique_keys")]
    pub environment: BTreeMap<String, String>,
    #[serde(default)]
    pub resources: ResourceLimits,
    #[serde(default)]
    pub scale_policy: ScalePolicy,
    #[serde(default)]
    pub health_check: Option<HealthCheck>,
}

impl ServiceConfig {
    pub fn new(name: &str, image: &str) -> Self {
        ServiceConfig {
            name: name.to_string(),
            image: image.to_string(),
            replicas: 1,
            ports: Vec::new(),
            environment: BTreeMap::new(),
            resources: ResourceLimits::default(),
            scale_policy: ScalePolicy::default(),
            health_check: None,
        }
    }

    pub fn with_port(mut self, mapping: PortMapping) -> Self {
        self.ports.push(mapping);
        self
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.environment.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_resources(mut self, cpu: &str, memory: &str) -> Self {
        self.resources = ResourceLimits {
            cpu: cpu.to_string(),
            memory: memory.to_string(),
        };
        self
    }
}

/// Map deserializer that fails on a repeated key instead of keeping the last.
fn unique_keys<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct UniqueKeys;

    impl<'de> Visitor<'de> for UniqueKeys {
        type Value = BTreeMap<String, String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of environment variables")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut env = BTreeMap::new();
            while let Some((key, value)) = access.next_entry::<String, String>()? {
                if env.contains_key(&key) {
                    return Err(serde::de::Error::custom(format!(
                        "duplicate environment key '{}'",
                        key
                    )));
                }
                env.insert(key, value);
            }
            Ok(env)
        }
    }

    deserializer.deserialize_map(UniqueKeys)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = String;

    /// An empty protocol means tcp.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            other => Err(format!("unknown protocol '{}'", other)),
        }
    }
}

impl<'de> Deserialize<'de> for Protocol {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            None => Ok(Protocol::Tcp),
            Some(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    /// 0 lets the runtime pick a host port.
    #[serde(default)]
    pub host_port: u16,
    pub container_port: u16,
    #[serde(default)]
    pub protocol: Protocol,
}

impl PortMapping {
    pub fn tcp(container_port: u16) -> Self {
        PortMapping {
            host_port: 0,
            container_port,
            protocol: Protocol::Tcp,
        }
    }

    pub fn udp(container_port: u16) -> Self {
        PortMapping {
            host_port: 0,
            container_port,
            protocol: Protocol::Udp,
        }
    }

    pub fn on_host(mut self, host_port: u16) -> Self {
        self.host_port = host_port;
        self
    }

    /// Runtime key, e.g. `80/tcp`.
    pub fn key(&self) -> String {
        format!("{}/{}", self.container_port, self.protocol)
    }
}

/// Human-authored limits such as `"0.5"` cores and `"512m"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    #[serde(default)]
    pub cpu: String,
    #[serde(default)]
    pub memory: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalePolicy {
    #[serde(default)]
    pub min_replicas: u32,
    #[serde(default)]
    pub max_replicas: u32,
    /// Percent, 70.0 = 70%.
    #[serde(default)]
    pub target_cpu: f64,
    #[serde(default)]
    pub target_memory: f64,
    #[serde(default)]
    pub cooldown_seconds: u64,
}

impl ScalePolicy {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }

    pub fn is_bounded(&self) -> bool {
        self.max_replicas > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HealthProbe {
    Command { command: Vec<String> },
    Http { path: String, port: u16 },
    Tcp { port: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    #[serde(flatten)]
    pub probe: HealthProbe,
    #[serde(default)]
    pub interval: u64,
    #[serde(default)]
    pub timeout: u64,
    #[serde(default)]
    pub retries: u32,
}

impl HealthCheck {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
