mod auth;
mod finance;
mod health_check;

pub use auth::{get_current_user, login, register, CredentialsRequest, TokenResponse};
pub use finance::submit_finance;
pub use health_check::{health_check, index};
