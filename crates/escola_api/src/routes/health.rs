use actix_web::{Responder, get, web};
use serde_json::json;

#[get("/healthcheck")]
pub async fn healthcheck() -> impl Responder {
    web::Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "gerar_agenda": true,
            "gerar_guias": true,
            "gerar_ementa_eletiva": true,
        }
    }))
}
