//! Backend models: reals and the targets that group them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::ids::{ApplicationId, ClusterId, ZoneId};

/// Represents a single upstream backend instance.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Real {
    /// Host name of the backend.
    pub hostname: String,
    /// Port the backend serves on.
    pub port: u16,
    /// Relative traffic share within its target. Zero keeps the real known
    /// without driving traffic to it.
    pub weight: u32,
    /// Whether the real is eligible to receive traffic for its target.
    pub active: bool,
}

impl Real {
    /// Create a new real.
    pub fn new(hostname: impl Into<String>, port: u16, weight: u32, active: bool) -> Self {
        Self {
            hostname: hostname.into(),
            port,
            weight,
            active,
        }
    }
}

impl fmt::Display for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} w{}", self.hostname, self.port, self.weight)?;
        if !self.active {
            f.write_str(" inactive")?;
        }
        Ok(())
    }
}

/// Who a target belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TargetOwner {
    /// A single application instance.
    Application(ApplicationId),
    /// A named endpoint spanning several instances of one application.
    Named {
        /// Rotation name.
        name: String,
        /// Owning tenant.
        tenant: String,
        /// Owning application.
        application: String,
    },
}

impl fmt::Display for TargetOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Application(id) => id.fmt(f),
            Self::Named {
                name,
                tenant,
                application,
            } => write!(f, "{tenant}/{application} rotation {name}"),
        }
    }
}

/// The resolved backend set for one endpoint.
///
/// A target always holds at least one real, and its reals keep the order they
/// were contributed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    owner: TargetOwner,
    cluster: ClusterId,
    zone: ZoneId,
    reals: Vec<Real>,
}

impl Target {
    /// Create a single-application target. Returns `None` when `reals` is empty.
    pub fn new(
        application: ApplicationId,
        cluster: ClusterId,
        zone: ZoneId,
        reals: Vec<Real>,
    ) -> Option<Self> {
        Self::with_owner(TargetOwner::Application(application), cluster, zone, reals)
    }

    /// Create a named target that may aggregate reals from several clusters.
    /// Returns `None` when `reals` is empty.
    pub fn named(
        name: impl Into<String>,
        tenant: impl Into<String>,
        application: impl Into<String>,
        cluster: ClusterId,
        zone: ZoneId,
        reals: Vec<Real>,
    ) -> Option<Self> {
        let owner = TargetOwner::Named {
            name: name.into(),
            tenant: tenant.into(),
            application: application.into(),
        };
        Self::with_owner(owner, cluster, zone, reals)
    }

    fn with_owner(
        owner: TargetOwner,
        cluster: ClusterId,
        zone: ZoneId,
        reals: Vec<Real>,
    ) -> Option<Self> {
        if reals.is_empty() {
            return None;
        }
        Some(Self { owner, cluster, zone, reals })
    }

    /// The owning identity.
    pub fn owner(&self) -> &TargetOwner {
        &self.owner
    }

    /// The cluster the target routes to.
    pub fn cluster(&self) -> &ClusterId {
        &self.cluster
    }

    /// The zone the target is served from.
    pub fn zone(&self) -> &ZoneId {
        &self.zone
    }

    /// All reals, in contribution order.
    pub fn reals(&self) -> &[Real] {
        &self.reals
    }

    /// Reals that should currently receive traffic: active and non-zero weight.
    pub fn active_reals(&self) -> impl Iterator<Item = &Real> {
        self.reals.iter().filter(|real| real.active && real.weight > 0)
    }

    /// Sum of the weights of all active reals.
    pub fn total_weight(&self) -> u64 {
        self.active_reals().map(|real| u64::from(real.weight)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone() -> ZoneId {
        ZoneId::new("prod", "us-north-1")
    }

    #[test]
    fn empty_targets_are_rejected() {
        let app = ApplicationId::new("vespa", "music", "default");
        assert!(Target::new(app, ClusterId::new("default"), zone(), Vec::new()).is_none());
    }

    #[test]
    fn total_weight_counts_only_active_reals() {
        let target = Target::named(
            "music",
            "vespa",
            "music",
            ClusterId::new("default"),
            zone(),
            vec![
                Real::new("host1", 4443, 3, true),
                Real::new("host2", 4443, 5, false),
                Real::new("host3", 4443, 0, true),
            ],
        )
        .unwrap();

        assert_eq!(target.total_weight(), 3);
        assert_eq!(target.active_reals().count(), 1);
        assert_eq!(target.reals().len(), 3);
    }

    #[test]
    fn owner_display() {
        let owner = TargetOwner::Named {
            name: "canary".to_string(),
            tenant: "vespa".to_string(),
            application: "music".to_string(),
        };
        assert_eq!(owner.to_string(), "vespa/music rotation canary");
    }
}
