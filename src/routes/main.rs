use actix_multipart::form::MultipartForm;
use actix_web::{HttpResponse, Responder, get, post, web};
use tera::Context;

use crate::dto::UploadFormDto;
use crate::forms::profile::UploadForm;
use crate::render::TemplateRenderer;
use crate::routes::{render_template, upload_failed};
use crate::services::profiles::ProfileService;

#[get("/")]
pub async fn home(renderer: web::Data<dyn TemplateRenderer>) -> impl Responder {
    render_template(renderer.get_ref(), "home.html", &Context::new())
}

#[get("/profile/")]
pub async fn profile_form(renderer: web::Data<dyn TemplateRenderer>) -> impl Responder {
    let mut context = Context::new();
    context.insert("form", &UploadFormDto::default());

    render_template(renderer.get_ref(), "profile.html", &context)
}

#[post("/profile/")]
pub async fn profile_upload(
    form: Result<MultipartForm<UploadForm>, actix_web::Error>,
    profiles: web::Data<ProfileService>,
    renderer: web::Data<dyn TemplateRenderer>,
) -> HttpResponse {
    let MultipartForm(form) = match form {
        Ok(form) => form,
        Err(err) => {
            log::debug!("Failed to bind upload form: {err}");
            return upload_failed();
        }
    };

    match profiles.create_profile(form) {
        Ok(profile) => {
            let mut context = Context::new();
            context.insert("profile", &profile);
            render_template(renderer.get_ref(), "profile.html", &context)
        }
        Err(err) if err.is_client_error() => {
            log::debug!("Rejected profile upload: {err}");
            upload_failed()
        }
        Err(err) => {
            log::error!("Profile upload error: {err:?}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
