/// Authentication module
///
/// Password hashing, session token issuance/validation, and the
/// registration/login service built on top of them.

mod claims;
mod jwt;
mod password;
mod service;

pub use claims::{Claims, SessionToken};
pub use jwt::{session_tokens, SessionKeys, TokenIssuer, TokenValidator};
pub use password::PasswordHasher;
pub use service::{AuthService, Credentials};
