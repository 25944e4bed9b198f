/// Authentication Routes
///
/// Registration, login, and the current session's identity.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthService, Credentials};
use crate::error::{AppError, ErrorContext};
use crate::middleware::AuthenticatedUser;

/// Registration and login body; `email` is only read by registration
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

impl CredentialsRequest {
    fn into_parts(self) -> (Credentials, Option<String>) {
        (
            Credentials {
                username: self.username,
                password: self.password,
            },
            self.email,
        )
    }
}

/// Successful login
#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub username: String,
}

/// POST /register
///
/// # Errors
/// - 400: empty or malformed username/password/email, or malformed body
/// - 409: username already registered
/// - 500: hashing or storage failure
pub async fn register(
    body: web::Json<CredentialsRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration");
    let (credentials, email) = body.into_inner().into_parts();

    auth.register(credentials, email.as_deref())
        .await
        .map_err(|e| {
            let error = AppError::from(e);
            context.log_error(&error);
            error
        })?;

    tracing::info!(request_id = %context.request_id, "User account created");
    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "User account created"
    })))
}

/// POST /login
///
/// # Errors
/// - 401: unknown username or wrong password (one message for both)
/// - 500: hashing or storage failure
pub async fn login(
    body: web::Json<CredentialsRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");
    let (credentials, _) = body.into_inner().into_parts();

    let token = auth.login(credentials).await.map_err(|e| {
        let error = AppError::from(e);
        context.log_error(&error);
        error
    })?;

    tracing::info!(request_id = %context.request_id, "User logged in");
    Ok(HttpResponse::Ok().json(TokenResponse {
        token: token.into_string(),
        token_type: "Bearer".to_string(),
        expires_in: auth.token_ttl_seconds(),
    }))
}

/// GET /api/me
///
/// **Requires** `Authorization: Bearer <token>`; the subject comes from the
/// token alone, no store lookup.
pub async fn get_current_user(user: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(UserResponse {
        username: user.username,
    })
}
