use actix_web::{get, HttpResponse, Responder};

#[get("/")]
pub async fn home() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Welcome to the Artfolio API",
        "status": "Ok",
        "version": env!("CARGO_PKG_VERSION"),
        "categories": ["featured", "gallery", "store", "collaborations", "about"],
        "images": "/api/v1/images?category={category}&subcategory={subcategory}",
        "health": "/health"
    }))
}
