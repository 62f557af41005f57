use chrono::Local;
use escola_core::{EscolaConfig, EscolaError, Result};
use tracing::info;

use crate::output::{DOCX_MIME, Delivered, Delivery, GeneratedDocument};
use crate::template::{DocxTemplate, TemplateContext};
use crate::text::sanitize_filename;

/// Fields of an elective syllabus. `titulo`, `tema`, `professor1`,
/// `justificativa` and `objetivo` are required; the rest may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElectiveRequest {
    pub titulo: String,
    pub tema: String,
    pub professor1: String,
    pub professor2: String,
    pub ano_serie: String,
    pub justificativa: String,
    pub objetivo: String,
    pub habilidades: String,
    pub conteudo: String,
    pub metodologia: String,
    pub recursos: String,
    pub culminancia: String,
    pub referencia: String,
}

impl ElectiveRequest {
    /// Names of the required fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("titulo", &self.titulo),
            ("tema", &self.tema),
            ("professor1", &self.professor1),
            ("justificativa", &self.justificativa),
            ("objetivo", &self.objetivo),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

pub fn elective_file_name(req: &ElectiveRequest) -> String {
    format!("EMENTA_{}.docx", sanitize_filename(&req.titulo))
}

/// Template values; `generated_at` fills `DATA_GERACAO`.
pub fn elective_context(req: &ElectiveRequest, generated_at: &str) -> TemplateContext {
    let ano_serie = if req.ano_serie.trim().is_empty() {
        String::new()
    } else {
        format!(" - {}", req.ano_serie)
    };

    let mut context = TemplateContext::new();
    context
        .insert("TITULO", req.titulo.as_str())
        .insert("TEMA", req.tema.as_str())
        .insert("PROFESSOR1", req.professor1.as_str())
        .insert("PROFESSOR2", req.professor2.as_str())
        .insert("ANO_SERIE", ano_serie)
        .insert("JUSTIFICATIVA", req.justificativa.as_str())
        .insert("OBJETIVO", req.objetivo.as_str())
        .insert("HABILIDADES", req.habilidades.as_str())
        .insert("CONTEUDO", req.conteudo.as_str())
        .insert("METODOLOGIA", req.metodologia.as_str())
        .insert("RECURSOS", req.recursos.as_str())
        .insert("CULMINANCIA", req.culminancia.as_str())
        .insert("REFERENCIA", req.referencia.as_str())
        .insert("DATA_GERACAO", generated_at);
    context
}

/// Render an elective syllabus. The document is always kept in the elective
/// output directory; `delivery` only decides what the caller gets back.
pub fn generate_elective(
    config: &EscolaConfig,
    req: &ElectiveRequest,
    delivery: Delivery,
) -> Result<Delivered> {
    let missing = req.missing_fields();
    if !missing.is_empty() {
        return Err(EscolaError::missing(missing));
    }

    let template = DocxTemplate::from_path(&config.elective_template_path())?;
    let generated_at = Local::now().format("%d/%m/%Y %H:%M").to_string();
    let bytes = template.render(&elective_context(req, &generated_at))?;

    let document = GeneratedDocument {
        file_name: elective_file_name(req),
        mime_type: DOCX_MIME,
        bytes,
    };
    let path = document.write_to(&config.elective_output_path())?;
    info!(titulo = %req.titulo, file = %path.display(), "elective syllabus generated");

    Ok(Delivered {
        document,
        path: match delivery {
            Delivery::Base64 => None,
            Delivery::File => Some(path),
        },
    })
}
