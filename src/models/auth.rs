use std::future::{Ready, ready};

use actix_web::error::{ErrorInternalServerError, ErrorNotFound, ErrorUnauthorized};
use actix_web::http::header;
use actix_web::{Error, FromRequest, HttpRequest, dev::Payload, web::Data};

use crate::models::config::UploadConfig;

/// Proof that the request carried the configured admin bearer token.
#[derive(Debug)]
pub struct AdminAccess;

impl AdminAccess {
    fn check(req: &HttpRequest) -> Result<Self, Error> {
        let server_config = req
            .app_data::<Data<UploadConfig>>()
            .ok_or_else(|| ErrorInternalServerError("Server config not found"))?;

        let expected = match server_config.admin_token.as_deref() {
            Some(token) if !token.is_empty() => token,
            _ => return Err(ErrorNotFound("Not found")),
        };

        let provided = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim);

        match provided {
            Some(token) if token == expected => Ok(AdminAccess),
            Some(_) => Err(ErrorUnauthorized("Invalid token")),
            None => Err(ErrorUnauthorized("Unauthorized")),
        }
    }
}

impl FromRequest for AdminAccess {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Self::check(req))
    }
}
