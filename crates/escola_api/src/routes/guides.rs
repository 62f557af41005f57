use actix_web::{HttpRequest, HttpResponse, post, web};
use escola_core::{EscolaConfig, EscolaError};
use escola_docs::{Cycle, Delivery, GuideRequest, generate_guide};
use serde_json::{Value, json};

use crate::error::{Result, status_for};
use crate::params::RequestParams;

const REQUIRED: [&str; 6] = [
    "professor",
    "disciplina",
    "ano_serie",
    "bimestre",
    "ciclo",
    "fontes",
];

fn guide_request(params: &RequestParams) -> escola_core::Result<GuideRequest> {
    // `ciclo: 0` and `fontes: []` are as good as absent.
    let missing = params.missing_or_empty(&REQUIRED);
    if !missing.is_empty() {
        return Err(EscolaError::missing(missing));
    }

    let ciclo = params.int("ciclo")?.unwrap_or_default();
    Ok(GuideRequest {
        professor: params.str("professor").unwrap_or_default(),
        disciplina: params.str("disciplina").unwrap_or_default(),
        ano_serie: params.str("ano_serie").unwrap_or_default(),
        bimestre: params.str("bimestre").unwrap_or_default(),
        ciclo: Cycle::try_from(ciclo)?,
        fontes: params.value("fontes").cloned(),
    })
}

/// Body returned when a well-formed request fails during generation.
fn error_envelope(req: &GuideRequest, err: &EscolaError) -> Value {
    json!({
        "status": "error",
        "message": err.to_string(),
        "error_details": {
            "professor": req.professor,
            "disciplina": req.disciplina,
            "ano_serie": req.ano_serie,
            "bimestre": req.bimestre,
        }
    })
}

/// Learning guide rendered from the scope & sequence workbook of the cycle.
#[post("/webhook/n8n/guias")]
pub async fn gerar_guias(
    req: HttpRequest,
    body: web::Bytes,
    config: web::Data<EscolaConfig>,
) -> Result<HttpResponse> {
    let params = RequestParams::from_request(&req, &body);
    let guide = guide_request(&params)?;
    let delivery = Delivery::from_flag(params.bool("return_base64")?.unwrap_or(true));

    let request = guide.clone();
    let outcome = web::block(move || generate_guide(&config, &request, delivery)).await?;

    let delivered = match outcome {
        Ok(delivered) => delivered,
        Err(err) => {
            let status = status_for(&err);
            if status.is_server_error() {
                tracing::error!(error = ?err, disciplina = %guide.disciplina, "guide generation failed");
            } else {
                tracing::warn!(error = %err, disciplina = %guide.disciplina, "guide generation rejected");
            }
            return Ok(HttpResponse::build(status).json(error_envelope(&guide, &err)));
        }
    };

    let data = match &delivered.path {
        Some(path) => json!({
            "file_path": path.display().to_string(),
            "file_name": delivered.document.file_name,
        }),
        None => json!({
            "file_base64": delivered.document.base64(),
            "mime_type": delivered.document.mime_type,
            "file_name": delivered.document.file_name,
        }),
    };
    Ok(HttpResponse::Ok().json(json!({ "status": "success", "data": data })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(body: Value) -> RequestParams {
        RequestParams::from_parts("", "application/json", body.to_string().as_bytes())
    }

    #[test]
    fn test_guide_request_keeps_raw_sources() {
        let req = guide_request(&params(json!({
            "professor": "Ana",
            "disciplina": "Matemática",
            "ano_serie": "6° ano",
            "bimestre": 1,
            "ciclo": "2",
            "fontes": [{ "fonte_nome": "Livro" }],
        })))
        .unwrap();

        assert_eq!(req.ciclo, Cycle::AnosFinais);
        assert_eq!(req.bimestre, "1");
        assert_eq!(req.fontes, Some(json!([{ "fonte_nome": "Livro" }])));
    }

    #[test]
    fn test_guide_request_missing_and_invalid_cycle() {
        let err = guide_request(&params(json!({ "professor": "Ana" }))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parâmetros obrigatórios faltando: disciplina, ano_serie, bimestre, ciclo, fontes"
        );

        let err = guide_request(&params(json!({
            "professor": "Ana",
            "disciplina": "Matemática",
            "ano_serie": "6° ano",
            "bimestre": "1",
            "ciclo": 7,
            "fontes": "Livro",
        })))
        .unwrap_err();
        assert!(matches!(err, EscolaError::InvalidInput(_)));
    }

    #[test]
    fn test_guide_request_zero_cycle_and_empty_sources_are_missing() {
        let err = guide_request(&params(json!({
            "professor": "Ana",
            "disciplina": "Matemática",
            "ano_serie": "6° ano",
            "bimestre": "1",
            "ciclo": 0,
            "fontes": [],
        })))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parâmetros obrigatórios faltando: ciclo, fontes"
        );
    }

    #[test]
    fn test_error_envelope_shape() {
        let req = GuideRequest {
            professor: "Ana".into(),
            disciplina: "Arte".into(),
            ano_serie: "7° ano".into(),
            bimestre: "2".into(),
            ciclo: Cycle::AnosFinais,
            fontes: None,
        };
        let err = EscolaError::MissingColumn("Titulo".into());
        let body = error_envelope(&req, &err);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], err.to_string());
        assert_eq!(body["error_details"]["disciplina"], "Arte");
    }
}
