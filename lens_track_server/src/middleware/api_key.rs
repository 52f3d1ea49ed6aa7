//! Shared-key access control for the LensTrack gateway.
//! This middleware can be placed on any route or service.
//!
//! It checks the incoming request for the `ltg-api-key` header and compares it against the
//! configured key. A request without the header is answered with 401 Unauthorized, and a request
//! with the wrong key with 403 Forbidden. Both rejections carry a JSON body.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::warn;
use ltg_common::Secret;

use crate::{errors::ServerError, helpers::get_remote_ip};

pub const API_KEY_HEADER: &str = "ltg-api-key";

pub struct ApiKeyMiddlewareFactory {
    api_key: Secret<String>,
    use_x_forwarded_for: bool,
    use_forwarded: bool,
}

impl ApiKeyMiddlewareFactory {
    pub fn new(api_key: Secret<String>, use_x_forwarded_for: bool, use_forwarded: bool) -> Self {
        ApiKeyMiddlewareFactory { api_key, use_x_forwarded_for, use_forwarded }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = ApiKeyMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(ApiKeyMiddlewareService {
            api_key: self.api_key.clone(),
            use_x_forwarded_for: self.use_x_forwarded_for,
            use_forwarded: self.use_forwarded,
            service: Rc::new(service),
        })
    }
}

pub struct ApiKeyMiddlewareService<S> {
    api_key: Secret<String>,
    use_x_forwarded_for: bool,
    use_forwarded: bool,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ApiKeyMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let api_key = self.api_key.clone();
        let use_x_forwarded_for = self.use_x_forwarded_for;
        let use_forwarded = self.use_forwarded;
        Box::pin(async move {
            let supplied = match req.headers().get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
                Some(value) => value,
                None => return Err(ServerError::MissingApiKey.into()),
            };
            if supplied != api_key.reveal().as_str() {
                let peer = get_remote_ip(req.request(), use_x_forwarded_for, use_forwarded)
                    .map(|ip| ip.to_string())
                    .unwrap_or_else(|| "unknown peer".into());
                warn!("🚨️ Invalid API key presented by {peer} for {}", req.path());
                return Err(ServerError::InvalidApiKey.into());
            }
            service.call(req).await
        })
    }
}
