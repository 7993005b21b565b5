use actix_web::web;

use crate::handlers::{admin_images, settings, system::admin_health_check};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .service(admin_health_check)
            .service(
                web::scope("/images")
                    .service(web::resource("").route(web::post().to(admin_images::upload_image)))
                    .service(web::resource("/orphans").route(web::get().to(admin_images::list_orphans)))
                    .service(
                        web::resource("/{image_id}")
                            .route(web::patch().to(admin_images::update_image))
                            .route(web::delete().to(admin_images::delete_image)),
                    )
                    .service(web::resource("/{image_id}/move").route(web::post().to(admin_images::move_image))),
            )
            .service(
                web::resource("/pending-deletions").route(web::get().to(admin_images::list_pending_deletions)),
            )
            .service(
                web::resource("/settings/{key}")
                    .route(web::put().to(settings::put_setting))
                    .route(web::delete().to(settings::clear_setting)),
            ),
    );
}
