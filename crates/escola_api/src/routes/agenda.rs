use actix_web::{HttpRequest, Responder, post, web};
use escola_core::{EscolaConfig, EscolaError};
use escola_docs::{AgendaRequest, Delivery, generate_agenda};
use serde_json::json;

use crate::error::Result;
use crate::params::RequestParams;

const REQUIRED: [&str; 3] = ["mes", "ano", "professor"];

fn agenda_request(params: &RequestParams) -> escola_core::Result<AgendaRequest> {
    let missing = params.missing(&REQUIRED);
    if !missing.is_empty() {
        return Err(EscolaError::missing(missing));
    }

    let mes = params.int("mes")?.unwrap_or_default();
    let ano = params.int("ano")?.unwrap_or_default();
    Ok(AgendaRequest {
        mes: u32::try_from(mes)
            .map_err(|_| EscolaError::invalid(format!("Mês inválido: {mes} (esperado 1 a 12)")))?,
        ano: i32::try_from(ano).map_err(|_| EscolaError::invalid(format!("Ano inválido: {ano}")))?,
        professor: params.str("professor").unwrap_or_default(),
    })
}

/// Monthly lesson agenda as an XLSX workbook.
#[post("/webhook/n8n/gerar-agenda")]
pub async fn gerar_agenda(
    req: HttpRequest,
    body: web::Bytes,
    config: web::Data<EscolaConfig>,
) -> Result<impl Responder> {
    let params = RequestParams::from_request(&req, &body);
    let agenda = agenda_request(&params)?;
    let delivery = Delivery::from_flag(params.bool("return_base64")?.unwrap_or(true));

    let request = agenda.clone();
    let delivered =
        web::block(move || generate_agenda(&config, &request, delivery)).await??;

    let response = match delivered.path {
        Some(path) => json!({
            "status": "success",
            "file_url": path.display().to_string(),
            "details": {
                "mes": agenda.mes,
                "ano": agenda.ano,
                "professor": agenda.professor,
            }
        }),
        None => json!({
            "file_data": delivered.document.base64(),
            "file_name": delivered.document.file_name,
            "mime_type": delivered.document.mime_type,
        }),
    };
    Ok(web::Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agenda_request_from_params() {
        let params = RequestParams::from_parts("mes=3&ano=2025&professor=Ana", "", b"");
        assert_eq!(
            agenda_request(&params).unwrap(),
            AgendaRequest {
                mes: 3,
                ano: 2025,
                professor: "Ana".into(),
            }
        );
    }

    #[test]
    fn test_agenda_request_reports_missing() {
        let params = RequestParams::from_parts("mes=3", "", b"");
        match agenda_request(&params) {
            Err(EscolaError::MissingParameters(names)) => {
                assert_eq!(names, vec!["ano".to_string(), "professor".to_string()]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_agenda_request_rejects_negative_month() {
        let params = RequestParams::from_parts("mes=-1&ano=2025&professor=Ana", "", b"");
        assert!(matches!(
            agenda_request(&params),
            Err(EscolaError::InvalidInput(_))
        ));
    }
}
