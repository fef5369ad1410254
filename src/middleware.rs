use std::future::{Ready, ready};
use std::sync::Arc;

use actix_web::{
    Error, HttpMessage,
    dev::{self, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
};

use crate::forwarded::parse_forwarded;

/// Attaches [`crate::forwarded::ForwardedInfo`] to requests whose `Forwarded`
/// header carries the shared proxy secret.
pub struct TrustForwarded {
    secret: Arc<str>,
}

impl TrustForwarded {
    pub fn new(secret: impl Into<Arc<str>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for TrustForwarded
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TrustForwardedMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TrustForwardedMiddleware {
            service,
            secret: self.secret.clone(),
        }))
    }
}

pub struct TrustForwardedMiddleware<S> {
    service: S,
    secret: Arc<str>,
}

impl<S, B> Service<ServiceRequest> for TrustForwardedMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = S::Future;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let values = req
            .headers()
            .get_all(header::FORWARDED)
            .filter_map(|value| value.to_str().ok());

        if let Some(info) = parse_forwarded(values, &self.secret) {
            log::trace!("Trusted forwarded element: {info:?}");
            req.extensions_mut().insert(info);
        }

        self.service.call(req)
    }
}
