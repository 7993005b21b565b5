use actix_web::web;

use crate::handlers::{assets::serve_asset, home::home, system::health_check};

mod admin;
mod auth;
mod images;
mod json_error;
mod settings;

/// Public asset URLs are `/assets/{storage path}`.
pub const ASSET_ROUTE_PREFIX: &str = "/assets";

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(home).service(health_check);

    cfg.service(
        web::scope("/api/v1")
            .configure(images::config_routes)
            .configure(settings::config_routes)
            .configure(auth::config_routes)
            .configure(admin::config_routes),
    );

    cfg.service(web::resource(format!("{ASSET_ROUTE_PREFIX}/{{path:.*}}")).route(web::get().to(serve_asset)));

    cfg.configure(json_error::config_routes);
}
