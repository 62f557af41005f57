use actix_web::{App, HttpServer, middleware, web};
use escola_core::EscolaConfig;

use crate::routes;

/// Largest accepted request body; long elective texts and source lists fit
/// comfortably.
pub const MAX_PAYLOAD_BYTES: usize = 10 * 1024 * 1024;

pub async fn start_server(config: EscolaConfig) -> std::io::Result<()> {
    let addr = config.bind_addr();
    let config = web::Data::new(config);

    tracing::info!("starting server on http://{addr}");

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(config.clone())
            .app_data(web::PayloadConfig::new(MAX_PAYLOAD_BYTES))
            .configure(routes::configure)
    })
    .bind(&addr)?
    .run()
    .await
}
