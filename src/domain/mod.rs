//! Domain Layer
//!
//! Backend descriptions, capability tables, result types and the error
//! taxonomy. No network code lives here.

pub mod entities;
pub mod errors;
pub mod ports;
pub mod value_objects;

pub use entities::{
    AwsSettings, AzureSettings, BackendConfig, BackendKind, MetricSample, OperationalFlags,
    SamplePoint,
};
pub use errors::{ConnectorError, FlagsParseError, RequestError, TokenRefreshError};
pub use value_objects::{Capability, CapabilitySet, FlagsService};
