//! Translation of a topology snapshot into a routing table.
//!
//! Three kinds of endpoints are emitted:
//!
//! 1. A zone-local endpoint per deployed cluster, weighted by whether the
//!    instance takes zone-local traffic.
//! 2. A global endpoint per cluster marked `global`, holding the cluster's reals
//!    from every zone, weighted by whether that zone is in rotation.
//! 3. An endpoint per weighted rotation, aggregating every member cluster with the
//!    member's own weight.
//!
//! Clusters are visited in declared order and hosts within a cluster in
//! ascending hostname order, so identical snapshots produce identical tables.
//! Any malformed entry or endpoint conflict fails the whole build.

use std::collections::btree_map::{BTreeMap, Entry};

use tracing::debug;

use crate::domain::backend::{Real, Target};
use crate::domain::endpoint::Endpoint;
use crate::domain::ids::{ApplicationId, ClusterId, RoutingMethod, DEFAULT_NAME};
use crate::domain::routing::RoutingTable;
use crate::error::BuildError;
use crate::topology::{ClusterDeployment, Deployment, TopologySnapshot, WeightedRotation};

const GLOBAL_LABEL: &str = "global";

/// Builds routing tables from topology snapshots.
#[derive(Debug)]
pub struct TableBuilder<'a> {
    snapshot: &'a TopologySnapshot,
    entries: BTreeMap<Endpoint, Target>,
}

impl<'a> TableBuilder<'a> {
    /// Translate `snapshot` into a routing table.
    pub fn build(snapshot: &'a TopologySnapshot) -> Result<RoutingTable, BuildError> {
        let mut builder = TableBuilder {
            snapshot,
            entries: BTreeMap::new(),
        };
        builder.add_zone_endpoints()?;
        builder.add_global_endpoints()?;
        for rotation in &snapshot.rotations {
            builder.add_rotation_endpoint(rotation)?;
        }

        debug!(
            "Built routing table for generation {} with {} endpoints",
            snapshot.generation,
            builder.entries.len()
        );
        Ok(RoutingTable::new(builder.entries, snapshot.generation))
    }

    fn add_zone_endpoints(&mut self) -> Result<(), BuildError> {
        let snapshot = self.snapshot;
        for deployment in &snapshot.deployments {
            let weight = u32::from(deployment.active);
            for cluster in &deployment.clusters {
                let reals = cluster_reals(deployment, cluster, weight)?;
                let name = self.endpoint_name(
                    &deployment.application,
                    &cluster.id,
                    &deployment.zone.region,
                );
                let endpoint = Endpoint::new(name, deployment.routing_method);
                let target = Target::new(
                    deployment.application.clone(),
                    cluster.id.clone(),
                    deployment.zone.clone(),
                    reals,
                );
                self.insert(endpoint, target)?;
            }
        }
        Ok(())
    }

    fn add_global_endpoints(&mut self) -> Result<(), BuildError> {
        let snapshot = self.snapshot;
        // Keyed by first appearance so aggregation follows declared order.
        let mut groups: Vec<(GroupKey<'_>, Vec<Real>)> = Vec::new();
        for deployment in &snapshot.deployments {
            let weight = u32::from(deployment.in_rotation);
            for cluster in deployment.clusters.iter().filter(|cluster| cluster.global) {
                let key = (&deployment.application, &cluster.id, deployment.routing_method);
                let contributed = cluster_reals(deployment, cluster, weight)?;
                match groups.iter_mut().find(|(existing, _)| *existing == key) {
                    Some((_, reals)) => reals.extend(contributed),
                    None => groups.push((key, contributed)),
                }
            }
        }

        for ((application, cluster, routing_method), reals) in groups {
            let name = self.endpoint_name(application, cluster, GLOBAL_LABEL);
            let target = Target::new(
                application.clone(),
                cluster.clone(),
                snapshot.zone.clone(),
                reals,
            );
            self.insert(Endpoint::new(name, routing_method), target)?;
        }
        Ok(())
    }

    fn add_rotation_endpoint(&mut self, rotation: &WeightedRotation) -> Result<(), BuildError> {
        let snapshot = self.snapshot;
        check_rotation(rotation)?;
        let mut matched = vec![false; rotation.members.len()];
        let mut first: Option<(&ClusterId, RoutingMethod)> = None;
        let mut reals = Vec::new();

        for deployment in &snapshot.deployments {
            for cluster in &deployment.clusters {
                let Some(member) = rotation.member(&deployment.application, &cluster.id) else {
                    continue;
                };
                let weight = member.weight.ok_or_else(|| BuildError::MissingWeight {
                    rotation: rotation.name.clone(),
                    application: deployment.application.clone(),
                    cluster: cluster.id.clone(),
                })?;
                let index = rotation
                    .members
                    .iter()
                    .position(|candidate| std::ptr::eq(candidate, member));
                if let Some(index) = index {
                    matched[index] = true;
                }
                first.get_or_insert((&cluster.id, deployment.routing_method));
                reals.extend(cluster_reals(deployment, cluster, weight)?);
            }
        }

        if let Some(index) = matched.iter().position(|matched| !matched) {
            let member = &rotation.members[index];
            return Err(BuildError::UnknownRotationMember {
                rotation: rotation.name.clone(),
                application: member_application(rotation, &member.instance),
                cluster: member.cluster.clone(),
            });
        }

        let Some((cluster, routing_method)) = first else {
            debug!("Rotation '{}' has no members, skipping", rotation.name);
            return Ok(());
        };

        let name = Endpoint::join([
            rotation.name.as_str(),
            rotation.application.as_str(),
            rotation.tenant.as_str(),
            GLOBAL_LABEL,
            snapshot.routing_domain.as_str(),
        ]);
        let target = Target::named(
            &rotation.name,
            &rotation.tenant,
            &rotation.application,
            cluster.clone(),
            snapshot.zone.clone(),
            reals,
        );
        self.insert(Endpoint::new(name, routing_method), target)
    }

    /// `[cluster.][instance.]application.tenant.scope.domain`, with `default`
    /// cluster and instance labels left out.
    fn endpoint_name(
        &self,
        application: &ApplicationId,
        cluster: &ClusterId,
        scope: &str,
    ) -> String {
        Endpoint::join([
            label(cluster.as_str()),
            label(&application.instance),
            application.application.as_str(),
            application.tenant.as_str(),
            scope,
            self.snapshot.routing_domain.as_str(),
        ])
    }

    fn insert(&mut self, endpoint: Endpoint, target: Option<Target>) -> Result<(), BuildError> {
        let Some(target) = target else {
            debug!("Endpoint {endpoint} has no reals, skipping");
            return Ok(());
        };
        match self.entries.entry(endpoint) {
            Entry::Vacant(entry) => {
                entry.insert(target);
                Ok(())
            }
            Entry::Occupied(entry) => Err(BuildError::DuplicateEndpoint {
                endpoint: entry.key().clone(),
                first: entry.get().owner().clone(),
                second: target.owner().clone(),
            }),
        }
    }
}

/// Application, cluster and routing method of a global endpoint.
type GroupKey<'a> = (&'a ApplicationId, &'a ClusterId, RoutingMethod);

fn label(name: &str) -> &str {
    if name == DEFAULT_NAME {
        ""
    } else {
        name
    }
}

/// A name is usable as one endpoint label when it is non-blank and has no dots.
fn is_label(name: &str) -> bool {
    !name.trim().is_empty() && !name.contains('.')
}

fn check_identity(application: &ApplicationId, cluster: &ClusterId) -> Result<(), BuildError> {
    let labels = [
        application.tenant.as_str(),
        application.application.as_str(),
        application.instance.as_str(),
        cluster.as_str(),
    ];
    if labels.into_iter().all(is_label) {
        Ok(())
    } else {
        Err(BuildError::InvalidIdentity {
            application: application.clone(),
            cluster: cluster.clone(),
        })
    }
}

fn member_application(rotation: &WeightedRotation, instance: &str) -> ApplicationId {
    ApplicationId::new(&rotation.tenant, &rotation.application, instance)
}

/// Rejects rotations whose name or members cannot produce an unambiguous endpoint.
fn check_rotation(rotation: &WeightedRotation) -> Result<(), BuildError> {
    if !is_label(&rotation.name) {
        return Err(BuildError::InvalidRotationName {
            rotation: rotation.name.clone(),
            tenant: rotation.tenant.clone(),
            application: rotation.application.clone(),
        });
    }
    for (index, member) in rotation.members.iter().enumerate() {
        let application = member_application(rotation, &member.instance);
        check_identity(&application, &member.cluster)?;
        let repeated = rotation.members[..index]
            .iter()
            .any(|other| other.instance == member.instance && other.cluster == member.cluster);
        if repeated {
            return Err(BuildError::DuplicateRotationMember {
                rotation: rotation.name.clone(),
                application,
                cluster: member.cluster.clone(),
            });
        }
    }
    Ok(())
}

/// Validated reals of a cluster, sorted by hostname then port.
fn cluster_reals(
    deployment: &Deployment,
    cluster: &ClusterDeployment,
    weight: u32,
) -> Result<Vec<Real>, BuildError> {
    check_identity(&deployment.application, &cluster.id)?;
    let mut reals = cluster
        .hosts
        .iter()
        .map(|host| {
            if host.hostname.trim().is_empty() {
                return Err(BuildError::InvalidHostname {
                    application: deployment.application.clone(),
                    cluster: cluster.id.clone(),
                });
            }
            let port = host
                .port
                .and_then(|port| u16::try_from(port).ok())
                .filter(|port| *port != 0)
                .ok_or_else(|| BuildError::InvalidPort {
                    application: deployment.application.clone(),
                    cluster: cluster.id.clone(),
                    hostname: host.hostname.clone(),
                    port: host.port,
                })?;
            Ok(Real::new(host.hostname.clone(), port, weight, host.active))
        })
        .collect::<Result<Vec<_>, _>>()?;
    reals.sort_by(|a, b| (&a.hostname, a.port).cmp(&(&b.hostname, b.port)));
    Ok(reals)
}
