//! Access token issuance and validation shared by the user service (which
//! issues tokens) and the gateway (which validates them).

pub mod claims;
pub mod jwt;

pub use claims::Claims;
pub use jwt::{AuthError, JwtManager};
