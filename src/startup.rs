use actix_web::{middleware::Logger, web, App, HttpServer};
use actix_web::dev::Server;
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{session_tokens, AuthService, PasswordHasher, TokenValidator};
use crate::configuration::{ApplicationSettings, Settings};
use crate::error::{AppError, AuthError, ValidationError};
use crate::logger::LoggerMiddleware;
use crate::middleware::{AuthMiddleware, Cors};
use crate::routes::{get_current_user, health_check, index, login, register, submit_finance};
use crate::store::{CredentialStore, FinanceStore};

/// Everything the request handlers share. Built once at startup; the
/// signing key and hasher inside are immutable from then on.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub validator: TokenValidator,
    pub finances: Arc<dyn FinanceStore>,
}

impl AppState {
    /// # Errors
    /// `HashingError` if the configured bcrypt cost is unusable
    pub fn new(
        settings: &Settings,
        credentials: Arc<dyn CredentialStore>,
        finances: Arc<dyn FinanceStore>,
    ) -> Result<Self, AuthError> {
        let hasher = PasswordHasher::new(settings.password.hash_cost)?;
        let (issuer, validator) = session_tokens(&settings.jwt);

        Ok(Self {
            auth: AuthService::new(credentials, hasher, issuer),
            validator,
            finances,
        })
    }
}

pub fn run(
    listener: TcpListener,
    state: AppState,
    application: &ApplicationSettings,
) -> Result<Server, std::io::Error> {
    let auth = web::Data::new(state.auth);
    let finances: web::Data<dyn FinanceStore> = web::Data::from(state.finances);
    let validator = state.validator;
    let allowed_origin = application.allowed_origin.clone();
    let json_config = web::JsonConfig::default()
        .limit(application.max_body_bytes)
        // serde's message would echo the body back; keep it server-side.
        .error_handler(|err, _req| {
            tracing::debug!(error = %err, "Rejected request body");
            AppError::Validation(ValidationError::MalformedBody).into()
        });

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)
            .wrap(Cors::new(&allowed_origin))

            // Shared state
            .app_data(json_config.clone())
            .app_data(auth.clone())
            .app_data(finances.clone())

            // Public routes
            .route("/", web::get().to(index))
            .route("/health_check", web::get().to(health_check))
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))

            // Protected routes (require a session token)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(validator.clone()))
                    .route("/me", web::get().to(get_current_user))
                    .route("/submit-finance", web::post().to(submit_finance)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
