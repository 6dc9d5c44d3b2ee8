//! Routegen Core functionality.
//!
//! This crate contains the routing table model, the topology description it is
//! derived from, the translation between the two, and the contracts of the
//! collaborators on either side: the topology source and the router.

pub mod builder;
pub mod domain;
pub mod error;
pub mod router;
pub mod topology;

pub use builder::TableBuilder;
pub use domain::backend::{Real, Target, TargetOwner};
pub use domain::endpoint::Endpoint;
pub use domain::ids::{ApplicationId, ClusterId, RoutingMethod, ZoneId};
pub use domain::routing::{RoutingTable, TableDiff};
pub use error::{BuildError, FetchError, RouterError};
pub use router::{Router, SwapRouter};
pub use topology::source::{MemoryTopology, TopologySource};
pub use topology::TopologySnapshot;
