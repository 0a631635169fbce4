mod authorizer;

pub use authorizer::{AuthHeaders, Authorizer};
