use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header;
use actix_web::{web, Error, FromRequest, HttpRequest};
use jsonwebtoken::{decode, DecodingKey, Validation};
use log::{debug, error, info, warn};
use std::future::{ready, Future, Ready};
use std::pin::Pin;
use std::rc::Rc;

use crate::config::AppConfig;
use crate::errors::ApiError;
use crate::models::{Claims, Identity, Role};

// Logger middleware to log all requests and responses
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestLoggerMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggerMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestLoggerMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + 'static>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let method = req.method().clone();
        let path = req.path().to_owned();
        let client_ip = req
            .connection_info()
            .realip_remote_addr()
            .map(|s| s.to_owned())
            .unwrap_or_else(|| String::from("unknown"));

        info!(
            "→ Request: \x1B[1;34m{} {}\x1B[0m from IP: {}",
            method, path, client_ip
        );

        let service = self.service.clone();

        Box::pin(async move {
            let start = std::time::Instant::now();
            let res = service.call(req).await?;
            let elapsed = start.elapsed();

            let status = res.status();

            if status.is_success() {
                info!(
                    "← Response: \x1B[1;32m{}\x1B[0m for {} {} completed in {:.2?}",
                    status, method, path, elapsed
                );
            } else if status.is_client_error() {
                warn!(
                    "← Response: \x1B[1;33m{}\x1B[0m for {} {} completed in {:.2?}",
                    status, method, path, elapsed
                );
            } else {
                error!(
                    "← Response: \x1B[1;31m{}\x1B[0m for {} {} completed in {:.2?}",
                    status, method, path, elapsed
                );
            }

            Ok(res)
        })
    }
}

// JWT identity extraction. Handlers take an `Identity` parameter and actix
// resolves it from the Authorization header before the handler runs.
impl FromRequest for Identity {
    type Error = ApiError;
    type Future = Ready<Result<Identity, ApiError>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(identity_from_request(req))
    }
}

fn identity_from_request(req: &HttpRequest) -> Result<Identity, ApiError> {
    let config = req
        .app_data::<web::Data<AppConfig>>()
        .ok_or_else(|| ApiError::InternalError("application config not registered".to_string()))?;

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::AuthError("missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::AuthError("malformed authorization header".to_string()))?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        ApiError::AuthError("invalid or expired token".to_string())
    })?;

    let role = Role::parse(&token_data.claims.user_type)
        .ok_or_else(|| ApiError::AuthError("unknown account role".to_string()))?;

    Ok(Identity {
        user_id: token_data.claims.user_id,
        role,
    })
}
