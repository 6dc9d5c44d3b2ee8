//! Routing domain models.

pub mod backend;
pub mod endpoint;
pub mod ids;
pub mod routing;
