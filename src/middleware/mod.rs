/// Middleware module
///
/// Session authentication and CORS.

mod auth_middleware;
mod cors;

pub use auth_middleware::{authenticate, AuthMiddleware, AuthenticatedUser};
pub use cors::Cors;
