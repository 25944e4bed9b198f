use actix_web::{web, HttpResponse};

use crate::error::{AppError, ErrorContext};
use crate::finance::FinanceSubmission;
use crate::middleware::AuthenticatedUser;
use crate::store::FinanceStore;

/// POST /api/submit-finance
///
/// Stores an income or expense entry for the authenticated user. Any
/// `user_id` or `username` in the body is ignored.
///
/// # Errors
/// - 400: unknown type, malformed amount, or malformed body
/// - 401: missing or invalid session (handled by middleware)
/// - 500: storage failure
pub async fn submit_finance(
    user: AuthenticatedUser,
    body: web::Json<FinanceSubmission>,
    store: web::Data<dyn FinanceStore>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("finance_submission").with_username(&user.username);

    let entry = body.into_inner().into_entry(&user.username).map_err(|e| {
        let error = AppError::from(e);
        context.log_error(&error);
        error
    })?;

    store.insert(&entry).await.map_err(|e| {
        let error = AppError::from(e);
        context.log_error(&error);
        error
    })?;

    tracing::info!(
        request_id = %context.request_id,
        username = %user.username,
        kind = entry.kind.as_str(),
        "Finance entry saved"
    );
    Ok(HttpResponse::Created().json(serde_json::json!({ "status": "saved" })))
}
