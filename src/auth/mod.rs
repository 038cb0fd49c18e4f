//! Bearer token issuance, verification and the authenticated-user extractor.

mod extractor;
mod token;

pub use extractor::AuthUser;
pub use token::{AuthError, Claims, TokenVerifier};
