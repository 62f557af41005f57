use actix_web::web;

pub mod agenda;
pub mod electives;
pub mod guides;
pub mod health;

/// Register every endpoint. Shared by the server and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health::healthcheck)
        .service(agenda::gerar_agenda)
        .service(guides::gerar_guias)
        .service(electives::gerar_ementa_eletiva);
}
