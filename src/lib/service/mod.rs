pub mod types;
pub mod validate;

pub use types::{
    HealthCheck, HealthProbe, PortMapping, Protocol, ResourceLimits, ScalePolicy, ServiceConfig,
};
pub use validate::ValidationError;
