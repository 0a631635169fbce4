//! Adapters Layer
//!
//! Outbound adapters talk to metrics backends and identity providers.

pub mod outbound;
