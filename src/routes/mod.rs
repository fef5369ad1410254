use actix_files::Files;
use actix_web::HttpResponse;
use actix_web::http::header::ContentType;
use actix_web::web;
use log::error;
use tera::Context;

use crate::UploadState;
use crate::render::TemplateRenderer;

pub mod admin;
pub mod main;

/// Body returned for any rejected profile upload.
pub const UPLOAD_FAILED: &str = "Image upload failed";

/// Register application data and the route table of the upload site.
/// In debug mode stored images are served as well; nothing else under the
/// media root is reachable.
pub fn configure(cfg: &mut web::ServiceConfig, state: &UploadState) {
    cfg.app_data(state.config.clone())
        .app_data(state.profiles.clone())
        .app_data(state.renderer.clone())
        .app_data(state.multipart_config())
        .app_data(state.temp_file_config())
        .service(admin::index)
        .service(main::home)
        .service(main::profile_form)
        .service(main::profile_upload);

    if state.config.debug {
        let mount = state.config.media_mount();
        let image_dir = state.profiles.storage().image_dir();
        log::info!("Serving images from {image_dir:?} at {mount}");
        cfg.service(Files::new(&mount, image_dir));
    }
}

fn render_template(
    renderer: &dyn TemplateRenderer,
    template: &str,
    context: &Context,
) -> HttpResponse {
    match renderer.render(template, context) {
        Ok(body) => HttpResponse::Ok()
            .content_type(ContentType::html())
            .body(body),
        Err(e) => {
            error!("Failed to render template '{}': {}", template, e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

fn upload_failed() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(UPLOAD_FAILED)
}
