/// Session Authentication Middleware
///
/// Validates the bearer token on every request to the wrapped scope and
/// attaches the token subject to the request as an `AuthenticatedUser`.
/// Every rejection gets the same opaque 401 body.

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderValue, AUTHORIZATION},
    Error, FromRequest, HttpMessage, HttpRequest, ResponseError,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;

use crate::auth::TokenValidator;
use crate::error::{AppError, AuthError};

const BEARER: &str = "Bearer";

/// Identity of the caller, set by `AuthMiddleware`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub username: String,
}

/// Handlers take `AuthenticatedUser` as an argument; outside the
/// middleware-protected scope the extraction fails with a 401.
impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthenticatedUser>()
                .cloned()
                .ok_or(AppError::Auth(AuthError::MissingCredentials)),
        )
    }
}

/// Run the per-request state machine on the raw `Authorization` header.
pub fn authenticate(
    header: Option<&HeaderValue>,
    validator: &TokenValidator,
) -> Result<AuthenticatedUser, AuthError> {
    let header = header.ok_or(AuthError::MissingCredentials)?;
    let token = bearer_token(header).ok_or(AuthError::MalformedCredentials)?;
    let username = validator.verify(token)?;
    Ok(AuthenticatedUser { username })
}

/// `Bearer <token>`, scheme case-insensitive, exactly one non-empty token.
fn bearer_token(header: &HeaderValue) -> Option<&str> {
    let value = header.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case(BEARER) || token.is_empty() || token.contains(' ') {
        return None;
    }
    Some(token)
}

/// Wrap a scope to require a valid session token
pub struct AuthMiddleware {
    validator: TokenValidator,
}

impl AuthMiddleware {
    pub fn new(validator: TokenValidator) -> Self {
        Self { validator }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            validator: self.validator.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    validator: TokenValidator,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match authenticate(req.headers().get(AUTHORIZATION), &self.validator) {
            Ok(user) => {
                tracing::debug!(username = %user.username, "Session token accepted");
                req.extensions_mut().insert(user);

                let service = self.service.clone();
                Box::pin(async move {
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                })
            }
            Err(e) => {
                let response = AppError::Auth(e).error_response();
                Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) })
            }
        }
    }
}
