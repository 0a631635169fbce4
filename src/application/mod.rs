//! Application Layer
//!
//! Wires backend configurations, the shared authorizer and HTTP clients into
//! ready-to-use connectors.

pub mod connector_factory;

pub use connector_factory::ConnectorFactory;
