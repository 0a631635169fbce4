//! Infrastructure Layer
//!
//! Cross-cutting machinery shared by the outbound adapters.

pub mod flags_parser;
pub mod query_params;
pub mod sigv4;
pub mod token_cell;

pub use flags_parser::parse_flags;
pub use query_params::{merge_params, parse_query_string, QueryParams};
pub use sigv4::{SigV4Signer, SigningError};
pub use token_cell::TokenCell;
