use actix_web::{HttpResponse, Responder, get, web};
use tera::Context;

use crate::models::auth::AdminAccess;
use crate::render::TemplateRenderer;
use crate::routes::render_template;
use crate::services::profiles::ProfileService;

/// Read-only listing of every stored profile.
#[get("/admin/")]
pub async fn index(
    _admin: AdminAccess,
    profiles: web::Data<ProfileService>,
    renderer: web::Data<dyn TemplateRenderer>,
) -> impl Responder {
    let profiles = match profiles.list_profiles() {
        Ok(profiles) => profiles,
        Err(err) => {
            log::error!("Failed to list profiles: {err:?}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let mut context = Context::new();
    context.insert("profiles", &profiles);

    render_template(renderer.get_ref(), "admin/profiles.html", &context)
}

#[cfg(test)]
mod tests {
    use actix_web::http::{StatusCode, header};
    use actix_web::{App, test};
    use tempfile::tempdir;

    use crate::domain::{ImageName, ImageRef};
    use crate::repository::ProfileRepository;
    use crate::routes::configure;
    use crate::test_support::{state as build_state, upload_config};

    #[actix_web::test]
    async fn listing_requires_token() {
        let dir = tempdir().unwrap();
        let (state, repository) = build_state(upload_config(dir.path(), false));
        repository
            .create(ImageRef::for_image(&ImageName::try_from_str("a.png").unwrap()))
            .unwrap();
        let app = test::init_service(App::new().configure(|cfg| configure(cfg, &state))).await;

        let req = test::TestRequest::get().uri("/admin/").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/admin/")
            .insert_header((header::AUTHORIZATION, "Bearer wrong"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/admin/")
            .insert_header((header::AUTHORIZATION, "Bearer letmein"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("Profiles (1)"));
    }

    #[actix_web::test]
    async fn listing_is_hidden_without_configured_token() {
        let dir = tempdir().unwrap();
        let mut config = upload_config(dir.path(), false);
        config.admin_token = None;
        let (state, _) = build_state(config);
        let app = test::init_service(App::new().configure(|cfg| configure(cfg, &state))).await;

        let req = test::TestRequest::get()
            .uri("/admin/")
            .insert_header((header::AUTHORIZATION, "Bearer letmein"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
