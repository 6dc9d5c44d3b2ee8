//! Topology model: the deployed applications a routing table is derived from.
//!
//! This is a plain tree of immutable values (snapshot → deployment → cluster →
//! host) as delivered by the configuration source. Nothing here is validated on
//! deserialization; [`TableBuilder`](crate::builder::TableBuilder) rejects
//! malformed entries when it translates a snapshot.

pub mod source;

use serde::{Deserialize, Serialize};

use crate::domain::ids::{ApplicationId, ClusterId, RoutingMethod, ZoneId};

/// A point-in-time description of everything deployed behind the routing layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    /// Version stamp assigned by the source.
    #[serde(default)]
    pub generation: u64,
    /// Zone served by this routing layer.
    pub zone: ZoneId,
    /// DNS suffix of generated endpoint names, e.g. `vespa.oath.cloud`.
    pub routing_domain: String,
    /// Deployed application instances, in declared order.
    #[serde(default)]
    pub deployments: Vec<Deployment>,
    /// Named rotations spanning several instances of one application.
    #[serde(default)]
    pub rotations: Vec<WeightedRotation>,
}

/// One application instance deployed to one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// The deployed instance.
    pub application: ApplicationId,
    /// Where it is deployed.
    pub zone: ZoneId,
    /// How its endpoints are routed.
    #[serde(default)]
    pub routing_method: RoutingMethod,
    /// Whether the instance takes zone-local traffic.
    pub active: bool,
    /// Whether this zone is in the global rotation for the instance.
    pub in_rotation: bool,
    /// Container clusters, in declared order.
    #[serde(default)]
    pub clusters: Vec<ClusterDeployment>,
}

/// A container cluster and its hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterDeployment {
    /// Cluster name.
    pub id: ClusterId,
    /// Whether the cluster is exposed through a global endpoint.
    #[serde(default)]
    pub global: bool,
    /// Hosts running the cluster.
    #[serde(default)]
    pub hosts: Vec<Host>,
}

/// A host as reported by the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    /// Host name.
    pub hostname: String,
    /// Raw port; must be present and within 1..=65535.
    #[serde(default)]
    pub port: Option<u32>,
    /// Whether the host is eligible for traffic.
    #[serde(default = "default_true")]
    pub active: bool,
}

/// A named rotation aggregating clusters of several instances of one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedRotation {
    /// Rotation name; the first label of its endpoint.
    pub name: String,
    /// Owning tenant.
    pub tenant: String,
    /// Owning application.
    pub application: String,
    /// Contributing clusters.
    #[serde(default)]
    pub members: Vec<RotationMember>,
}

/// A cluster contributing to a weighted rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationMember {
    /// Instance of the rotation's application.
    pub instance: String,
    /// Cluster within that instance.
    pub cluster: ClusterId,
    /// Weight of every real of the cluster. Zero keeps the cluster warm.
    #[serde(default)]
    pub weight: Option<u32>,
}

impl WeightedRotation {
    /// The member for a deployed cluster, if it contributes to this rotation.
    pub fn member(
        &self,
        application: &ApplicationId,
        cluster: &ClusterId,
    ) -> Option<&RotationMember> {
        if application.tenant != self.tenant || application.application != self.application {
            return None;
        }
        self.members
            .iter()
            .find(|member| member.instance == application.instance && &member.cluster == cluster)
    }
}

fn default_true() -> bool {
    true
}
