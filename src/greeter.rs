//! Single-route greeter meant to run behind a reverse proxy.
use std::convert::Infallible;
use std::fmt;
use std::future::{Ready, ready};

use actix_web::http::header::ContentType;
use actix_web::middleware::{Condition, Logger};
use actix_web::{
    App, FromRequest, HttpMessage, HttpRequest, HttpResponse, HttpServer, Responder,
    dev::Payload, get, web,
};

use crate::forwarded::ForwardedInfo;
use crate::middleware::TrustForwarded;
use crate::models::config::GreeterConfig;

/// Fixed body of the greeting route.
pub const GREETING: &str = "zeabur";

/// Client address: the `for` value of a trusted `Forwarded` element, or the
/// socket peer otherwise.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientAddr(pub String);

impl ClientAddr {
    fn from_request_head(req: &HttpRequest) -> Self {
        if let Some(addr) = req
            .extensions()
            .get::<ForwardedInfo>()
            .and_then(|info| info.for_addr.clone())
        {
            return Self(addr);
        }

        let peer = req
            .peer_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".into());
        Self(peer)
    }
}

impl fmt::Display for ClientAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromRequest for ClientAddr {
    type Error = Infallible;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(Self::from_request_head(req)))
    }
}

#[get("/zeabur")]
pub async fn zeabur(client: ClientAddr) -> impl Responder {
    log::debug!("Greeting {client}");
    HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(GREETING)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(zeabur);
}

/// Run the greeter with the configured number of workers until shutdown.
pub async fn run(config: GreeterConfig) -> std::io::Result<()> {
    if config.forwarded_secret.is_empty() {
        log::warn!("No forwarded secret configured, Forwarded headers will be ignored");
    }

    let bind_address = config.bind_address();
    let access_log = config.access_log;
    let secret: std::sync::Arc<str> = config.forwarded_secret.as_str().into();

    log::info!(
        "Starting greeter on {}:{} with {} workers",
        bind_address.0,
        bind_address.1,
        config.workers
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Condition::new(access_log, Logger::default()))
            .wrap(TrustForwarded::new(secret.clone()))
            .configure(configure)
    })
    .workers(config.workers)
    .bind(bind_address)?
    .run()
    .await
}
