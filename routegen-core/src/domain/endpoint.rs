//! Routable endpoint names.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::ids::RoutingMethod;

/// A publicly routable name plus the method used to route it.
///
/// This is the key of a [`RoutingTable`](crate::domain::routing::RoutingTable).
/// Ordering is by name first so that table iteration is stable and readable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    /// Fully-qualified host name, always lower case.
    pub name: String,
    /// Routing method this endpoint is served with.
    pub routing_method: RoutingMethod,
}

impl Endpoint {
    /// Create an endpoint, normalizing the name to lower case.
    pub fn new(name: impl AsRef<str>, routing_method: RoutingMethod) -> Self {
        Self {
            name: name.as_ref().to_ascii_lowercase(),
            routing_method,
        }
    }

    /// Build a dotted name from its labels, skipping empty ones.
    pub(crate) fn join<'a>(labels: impl IntoIterator<Item = &'a str>) -> String {
        labels
            .into_iter()
            .filter(|label| !label.is_empty())
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.routing_method)
    }
}
