//! Routing module mapping endpoints to their traffic targets.

use std::collections::btree_map::{self, BTreeMap};

use crate::domain::backend::Target;
use crate::domain::endpoint::Endpoint;

/// An immutable routing table mapping every endpoint to its target.
///
/// Entries live in a `BTreeMap`, so two tables built independently from the same
/// topology iterate identically and compare equal. The generation is carried for
/// observability only and takes no part in equality.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    entries: BTreeMap<Endpoint, Target>,
    generation: u64,
}

impl RoutingTable {
    /// Create a routing table from its entries.
    pub fn new(entries: BTreeMap<Endpoint, Target>, generation: u64) -> Self {
        Self { entries, generation }
    }

    /// Topology generation this table was built from.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The target of an endpoint.
    pub fn get(&self, endpoint: &Endpoint) -> Option<&Target> {
        self.entries.get(endpoint)
    }

    /// All entries whose endpoint has the given name, regardless of routing method.
    pub fn find<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = (&'a Endpoint, &'a Target)> + 'a {
        self.entries.iter().filter(move |(endpoint, _)| endpoint.name.eq_ignore_ascii_case(name))
    }

    /// Iterate entries in endpoint order.
    pub fn iter(&self) -> btree_map::Iter<'_, Endpoint, Target> {
        self.entries.iter()
    }

    /// Number of endpoints.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table routes nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The underlying mapping.
    pub fn entries(&self) -> &BTreeMap<Endpoint, Target> {
        &self.entries
    }

    /// Compute what changes when going from `self` to `next`.
    pub fn diff(&self, next: &RoutingTable) -> TableDiff {
        let mut diff = TableDiff::default();
        for (endpoint, target) in &next.entries {
            match self.entries.get(endpoint) {
                None => diff.added.push(endpoint.clone()),
                Some(current) if current != target => diff.changed.push(endpoint.clone()),
                Some(_) => {}
            }
        }
        diff.removed = self
            .entries
            .keys()
            .filter(|endpoint| !next.entries.contains_key(*endpoint))
            .cloned()
            .collect();
        diff
    }
}

impl PartialEq for RoutingTable {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for RoutingTable {}

impl<'a> IntoIterator for &'a RoutingTable {
    type Item = (&'a Endpoint, &'a Target);
    type IntoIter = btree_map::Iter<'a, Endpoint, Target>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Endpoints that differ between two routing tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDiff {
    /// Endpoints only present in the newer table.
    pub added: Vec<Endpoint>,
    /// Endpoints only present in the older table.
    pub removed: Vec<Endpoint>,
    /// Endpoints present in both whose target differs.
    pub changed: Vec<Endpoint>,
}

impl TableDiff {
    /// Whether the two tables route identically.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}
