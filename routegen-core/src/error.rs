//! Errors raised while fetching topology, building tables and loading them.

use thiserror::Error;

use crate::domain::backend::TargetOwner;
use crate::domain::endpoint::Endpoint;
use crate::domain::ids::{ApplicationId, ClusterId};

/// A topology snapshot could not be translated into a routing table.
///
/// Every variant names the topology entry at fault. No table is
/// produced when any of these occur.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// Two targets resolved to the same endpoint.
    #[error("endpoint {endpoint} is claimed by both {first} and {second}")]
    DuplicateEndpoint {
        /// The contested endpoint.
        endpoint: Endpoint,
        /// Owner of the target inserted first.
        first: TargetOwner,
        /// Owner of the conflicting target.
        second: TargetOwner,
    },
    /// A host has no port or one outside 1..=65535.
    #[error("host '{hostname}' in {application} cluster {cluster} has invalid port {port:?}")]
    InvalidPort {
        /// Application the host is deployed in.
        application: ApplicationId,
        /// Cluster the host belongs to.
        cluster: ClusterId,
        /// The offending host.
        hostname: String,
        /// The raw port value.
        port: Option<u32>,
    },
    /// A host has an empty host name.
    #[error("{application} cluster {cluster} has a host without a hostname")]
    InvalidHostname {
        /// Application the host is deployed in.
        application: ApplicationId,
        /// Cluster the host belongs to.
        cluster: ClusterId,
    },
    /// A tenant, application, instance or cluster name is empty or contains a
    /// dot, so it cannot be a single endpoint label.
    #[error("{application} cluster '{cluster}' has an empty or dotted name label")]
    InvalidIdentity {
        /// The application as declared.
        application: ApplicationId,
        /// The cluster as declared.
        cluster: ClusterId,
    },
    /// A weighted rotation name is empty or contains a dot.
    #[error("weighted rotation '{rotation}' of {tenant}/{application} has an invalid name")]
    InvalidRotationName {
        /// Rotation name as declared.
        rotation: String,
        /// Tenant owning the rotation.
        tenant: String,
        /// Application owning the rotation.
        application: String,
    },
    /// A rotation lists the same instance and cluster more than once.
    #[error("rotation '{rotation}' lists {application} cluster {cluster} more than once")]
    DuplicateRotationMember {
        /// Rotation name.
        rotation: String,
        /// Application instance of the member.
        application: ApplicationId,
        /// Cluster of the member.
        cluster: ClusterId,
    },
    /// A rotation member does not declare its weight.
    #[error("rotation '{rotation}' member {application} cluster {cluster} has no weight")]
    MissingWeight {
        /// Rotation name.
        rotation: String,
        /// Application instance of the member.
        application: ApplicationId,
        /// Cluster of the member.
        cluster: ClusterId,
    },
    /// A rotation member refers to a cluster that is not deployed.
    #[error(
        "rotation '{rotation}' refers to {application} cluster {cluster}, which is not deployed"
    )]
    UnknownRotationMember {
        /// Rotation name.
        rotation: String,
        /// Application instance of the member.
        application: ApplicationId,
        /// Cluster of the member.
        cluster: ClusterId,
    },
}

/// The topology source could not deliver a snapshot this cycle.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The source is unreachable or has nothing to deliver yet.
    #[error("topology unavailable: {0}")]
    Unavailable(String),
    /// Reading the snapshot failed.
    #[error("failed to read topology: {0}")]
    Io(#[from] std::io::Error),
    /// The snapshot could not be parsed.
    #[error("failed to parse topology: {0}")]
    Json(#[from] serde_json::Error),
}

/// The router refused a routing table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// The table was rejected, with the router's reason.
    #[error("router rejected routing table: {0}")]
    Rejected(String),
}
