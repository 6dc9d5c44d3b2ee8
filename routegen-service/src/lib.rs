//! Routegen Service
//!
//! The tokio engine that keeps a router's routing table in step with the
//! deployed topology: subscription handling, retries and change-only publication.

pub mod config;
pub mod error;
pub mod file_source;
pub mod generator;

pub use config::GeneratorConfig;
pub use error::GeneratorError;
pub use file_source::FileTopologySource;
pub use generator::{GeneratorState, GeneratorStats, RoutingGenerator, TopologyNotifier};
