/// CORS middleware
///
/// Adds the allow-origin/methods/headers triple to every response and
/// answers `OPTIONS` preflights itself, before routing or authentication.

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{
        HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
        ACCESS_CONTROL_ALLOW_ORIGIN,
    },
    http::Method,
    Error, HttpResponse,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;

const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

pub struct Cors {
    allowed_origin: HeaderValue,
}

impl Cors {
    /// An origin that is not a valid header value falls back to `*`.
    pub fn new(allowed_origin: &str) -> Self {
        let allowed_origin = HeaderValue::from_str(allowed_origin).unwrap_or_else(|_| {
            tracing::warn!("Invalid CORS origin in configuration, allowing any origin");
            HeaderValue::from_static("*")
        });
        Self { allowed_origin }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Cors
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = CorsService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CorsService {
            service: Rc::new(service),
            allowed_origin: self.allowed_origin.clone(),
        }))
    }
}

pub struct CorsService<S> {
    service: Rc<S>,
    allowed_origin: HeaderValue,
}

fn apply_headers(headers: &mut HeaderMap, allowed_origin: HeaderValue) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, allowed_origin);
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
}

impl<S, B> Service<ServiceRequest> for CorsService<S>
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
        let allowed_origin = self.allowed_origin.clone();

        if req.method() == Method::OPTIONS {
            let mut res = req
                .into_response(HttpResponse::Ok().finish())
                .map_into_right_body();
            apply_headers(res.headers_mut(), allowed_origin);
            return Box::pin(async move { Ok(res) });
        }

        let service = self.service.clone();
        Box::pin(async move {
            let mut res = service.call(req).await?.map_into_left_body();
            apply_headers(res.headers_mut(), allowed_origin);
            Ok(res)
        })
    }
}
