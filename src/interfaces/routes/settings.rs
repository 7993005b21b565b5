use actix_web::web;

use crate::handlers::settings;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/settings/{key}").route(web::get().to(settings::get_setting)));
}
