use actix_web::{HttpRequest, Responder, post, web};
use escola_core::EscolaConfig;
use escola_docs::{Delivery, ElectiveRequest, generate_elective};
use serde_json::json;

use crate::error::Result;
use crate::params::RequestParams;

fn elective_request(params: &RequestParams) -> ElectiveRequest {
    let field = |key: &str| params.str(key).unwrap_or_default();
    let professor = |key: &str| {
        params
            .str(key)
            .or_else(|| params.nested_str("professores", key))
            .unwrap_or_default()
    };

    ElectiveRequest {
        titulo: field("titulo"),
        tema: field("tema"),
        professor1: professor("professor1"),
        professor2: professor("professor2"),
        ano_serie: field("ano_serie"),
        justificativa: field("justificativa"),
        objetivo: field("objetivo"),
        habilidades: field("habilidades"),
        conteudo: field("conteudo"),
        metodologia: field("metodologia"),
        recursos: field("recursos"),
        culminancia: field("culminancia"),
        referencia: field("referencia"),
    }
}

/// Elective course syllabus.
#[post("/webhook/n8n/gerar-ementa-eletiva")]
pub async fn gerar_ementa_eletiva(
    req: HttpRequest,
    body: web::Bytes,
    config: web::Data<EscolaConfig>,
) -> Result<impl Responder> {
    let params = RequestParams::from_request(&req, &body);
    let elective = elective_request(&params);
    let delivery = Delivery::from_flag(params.bool("return_base64")?.unwrap_or(true));

    let request = elective.clone();
    let delivered =
        web::block(move || generate_elective(&config, &request, delivery)).await??;

    let response = match delivered.path {
        Some(path) => json!({
            "status": "success",
            "file_url": path.display().to_string(),
            "details": {
                "titulo": elective.titulo,
                "tema": elective.tema,
                "professores": {
                    "professor1": elective.professor1,
                    "professor2": elective.professor2,
                },
                "ano_serie": elective.ano_serie,
            }
        }),
        None => json!({
            "status": "success",
            "file_base64": delivered.document.base64(),
            "file_name": delivered.document.file_name,
        }),
    };
    Ok(web::Json(response))
}
