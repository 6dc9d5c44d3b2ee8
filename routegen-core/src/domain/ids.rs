//! Identities shared by the topology model and the routing table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The instance and cluster name that is left out of endpoint names.
pub const DEFAULT_NAME: &str = "default";

/// Identifies one deployed instance of an application.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicationId {
    /// Owning tenant.
    pub tenant: String,
    /// Application name within the tenant.
    pub application: String,
    /// Instance name, e.g. `default` or `beta`.
    pub instance: String,
}

impl ApplicationId {
    /// Create an application identity from its three parts.
    pub fn new(
        tenant: impl Into<String>,
        application: impl Into<String>,
        instance: impl Into<String>,
    ) -> Self {
        Self {
            tenant: tenant.into(),
            application: application.into(),
            instance: instance.into(),
        }
    }

    /// Whether this is the `default` instance of the application.
    pub fn is_default_instance(&self) -> bool {
        self.instance == DEFAULT_NAME
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.tenant, self.application, self.instance)
    }
}

/// Name of a container cluster within an application.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(pub String);

impl ClusterId {
    /// Create a cluster id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The cluster name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the `default` cluster.
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_NAME
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A deployment location: environment plus region.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZoneId {
    /// Environment, e.g. `prod`.
    pub environment: String,
    /// Region, e.g. `us-north-1`.
    pub region: String,
}

impl ZoneId {
    /// Create a zone id.
    pub fn new(environment: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            region: region.into(),
        }
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.environment, self.region)
    }
}

/// How traffic for an endpoint reaches its reals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoutingMethod {
    /// Shared layer 7 routing.
    Shared,
    /// Shared layer 4 routing, TLS terminated by the application.
    #[default]
    SharedLayer4,
    /// Application-dedicated load balancer.
    Exclusive,
}

impl fmt::Display for RoutingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Shared => "shared",
            Self::SharedLayer4 => "sharedLayer4",
            Self::Exclusive => "exclusive",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_identities() {
        assert_eq!(
            ApplicationId::new("vespa", "music", "default").to_string(),
            "vespa/music/default"
        );
        assert_eq!(ZoneId::new("prod", "us-north-1").to_string(), "prod.us-north-1");
        assert_eq!(RoutingMethod::SharedLayer4.to_string(), "sharedLayer4");
    }

    #[test]
    fn routing_method_uses_camel_case() {
        let method: RoutingMethod = serde_json::from_str("\"sharedLayer4\"").unwrap();
        assert_eq!(method, RoutingMethod::SharedLayer4);
        assert_eq!(serde_json::to_string(&RoutingMethod::Exclusive).unwrap(), "\"exclusive\"");
    }
}
