//! Learning guides: lesson titles, contents and objectives for one subject,
//! grade and bimester, taken from the scope & sequence workbook of the
//! school cycle and rendered into the guide template.

use escola_core::{EscolaConfig, EscolaError, Result};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use tracing::{info, warn};

use crate::output::{DOCX_MIME, Delivered, Delivery, GeneratedDocument};
use crate::sheet::{SheetTable, read_sheet};
use crate::template::{DocxTemplate, TemplateContext};
use crate::text::{extract_series_number, find_column, match_key, path_safe, truncate_chars};

/// Rendered guides smaller than this are treated as broken output.
pub const MIN_DOCUMENT_SIZE: usize = 1024;

/// At most this many sources are listed in a guide.
pub const MAX_SOURCES: usize = 5;

pub const EMPTY_SECTION: &str = "Nenhum conteúdo disponível";
pub const DEFAULT_SOURCES: &str =
    "• Materiais didáticos\n\n• Plataformas digitais\n\n• Orientação do professor";
pub const NO_SOURCES: &str = "• Nenhuma fonte disponível";
pub const INVALID_SOURCES: &str = "• Formato de fontes inválido";
pub const UNSUPPORTED_SOURCES: &str = "• Formato de fontes não suportado";

/// Canonical column names and the header patterns that identify them, most
/// specific first.
pub const COLUMN_PATTERNS: [(&str, &[&str]); 5] = [
    ("AnoSerie", &["ANO/SÉRIE", "ANO SERIE", "SÉRIE", "ANO"]),
    ("Bimestre", &["BIMESTRE", "PERÍODO", "BIM"]),
    ("Titulo", &["TÍTULO DA AULA", "NOME DA AULA", "TITULO"]),
    ("Conteudo", &["CONTEÚDO", "CONTEUDO", "MATÉRIA", "ASSUNTO"]),
    ("Objetivos", &["OBJETIVOS", "OBJETIVO", "METAS"]),
];

/// School cycle; selects the scope & sequence workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Cycle {
    AnosIniciais = 1,
    AnosFinais = 2,
    EnsinoMedio = 3,
}

impl Cycle {
    pub fn number(self) -> u8 {
        self as u8
    }
}

impl TryFrom<i64> for Cycle {
    type Error = EscolaError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            1 => Ok(Self::AnosIniciais),
            2 => Ok(Self::AnosFinais),
            3 => Ok(Self::EnsinoMedio),
            other => Err(EscolaError::invalid(format!(
                "Ciclo inválido: {other} (esperado 1, 2 ou 3)"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GuideRequest {
    pub professor: String,
    pub disciplina: String,
    pub ano_serie: String,
    pub bimestre: String,
    pub ciclo: Cycle,
    pub fontes: Option<Value>,
}

/// Positions of the canonical columns in a scope table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeColumns {
    pub ano_serie: usize,
    pub bimestre: usize,
    pub titulo: usize,
    pub conteudo: usize,
    pub objetivos: usize,
}

/// Locate (and rename to their canonical names) the five columns a guide
/// needs. A header that matches no pattern may still carry the canonical
/// name literally.
pub fn map_columns(table: &mut SheetTable) -> Result<ScopeColumns> {
    let mut found = [0usize; 5];
    for (slot, (canonical, patterns)) in COLUMN_PATTERNS.iter().enumerate() {
        let idx = find_column(&table.headers, patterns)
            .or_else(|| table.column(canonical))
            .ok_or_else(|| EscolaError::MissingColumn((*canonical).to_string()))?;
        table.rename_column(idx, *canonical);
        found[slot] = idx;
    }
    Ok(ScopeColumns {
        ano_serie: found[0],
        bimestre: found[1],
        titulo: found[2],
        conteudo: found[3],
        objetivos: found[4],
    })
}

/// Numeric keys compare as numbers (`"6"` never matches `"16"`); anything
/// else falls back to substring matching on the normalized text.
fn keys_match(cell_key: &str, wanted: &str) -> bool {
    match (cell_key.parse::<u64>(), wanted.parse::<u64>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => cell_key.contains(wanted),
    }
}

/// Rows of the requested grade and bimester that have a lesson title.
pub fn filter_rows<'a>(
    table: &'a SheetTable,
    columns: &ScopeColumns,
    ano_serie: &str,
    bimestre: &str,
) -> Result<Vec<&'a [String]>> {
    let series = extract_series_number(ano_serie);
    if series.is_empty() {
        return Err(EscolaError::invalid(format!(
            "Formato inválido para Ano/Série: {ano_serie}"
        )));
    }
    let bimester = match_key(bimestre);

    let cell = |row: &'a [String], idx: usize| row.get(idx).map(String::as_str).unwrap_or("");

    let rows: Vec<&[String]> = table
        .rows
        .iter()
        .map(Vec::as_slice)
        .filter(|&row| {
            keys_match(&match_key(cell(row, columns.ano_serie)), &series)
                && keys_match(&match_key(cell(row, columns.bimestre)), &bimester)
                && !cell(row, columns.titulo).trim().is_empty()
        })
        .collect();

    if rows.is_empty() {
        let grades: BTreeSet<&str> = table.column_values(columns.ano_serie).collect();
        let bimesters: BTreeSet<&str> = table.column_values(columns.bimestre).collect();
        warn!(
            series = %series,
            bimester = %bimester,
            ?grades,
            ?bimesters,
            "no scope rows match the requested filters"
        );
    }

    Ok(rows)
}

/// Bullet list of the distinct, non-blank values, in first-seen order.
pub fn format_section<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    let mut seen = HashSet::new();
    let items: Vec<String> = values
        .into_iter()
        .map(str::trim)
        .filter(|v| !v.is_empty() && seen.insert(*v))
        .map(|v| format!("• {v}"))
        .collect();

    if items.is_empty() {
        EMPTY_SECTION.to_string()
    } else {
        items.join("\n\n")
    }
}

/// Format the study sources of a guide.
///
/// Accepts an array of `{fonte_nome, descricao, link}` objects or plain
/// names, a single object, a JSON string holding either (n8n sometimes sends
/// it wrapped in quotes with escaped inner quotes), or a comma-separated list
/// of names.
pub fn format_sources(fontes: Option<&Value>) -> String {
    let items = match fontes {
        None | Some(Value::Null) => return DEFAULT_SOURCES.to_string(),
        Some(Value::Array(items)) if items.is_empty() => return DEFAULT_SOURCES.to_string(),
        Some(Value::String(s)) if s.trim().is_empty() => return DEFAULT_SOURCES.to_string(),
        Some(Value::Array(items)) => items.clone(),
        Some(obj @ Value::Object(_)) => vec![obj.clone()],
        Some(Value::String(s)) => match parse_sources_string(s) {
            Some(items) => items,
            None => return INVALID_SOURCES.to_string(),
        },
        Some(other) => {
            warn!(kind = ?other, "unsupported sources format");
            return UNSUPPORTED_SOURCES.to_string();
        }
    };

    let formatted: Vec<String> = items
        .iter()
        .take(MAX_SOURCES)
        .filter_map(format_source)
        .collect();

    if formatted.is_empty() {
        NO_SOURCES.to_string()
    } else {
        formatted.join("\n\n")
    }
}

/// `None` when the string looks like JSON but does not parse.
fn parse_sources_string(raw: &str) -> Option<Vec<Value>> {
    let mut cleaned = raw.trim();
    if cleaned.starts_with("\"[") && cleaned.ends_with("]\"") && cleaned.len() >= 4 {
        cleaned = &cleaned[1..cleaned.len() - 1];
    }

    if cleaned.starts_with('[') || cleaned.starts_with('{') {
        let unescaped = cleaned.replace("\\\"", "\"");
        return match serde_json::from_str::<Value>(&unescaped) {
            Ok(Value::Array(items)) => Some(items),
            Ok(Value::Null) => Some(Vec::new()),
            Ok(other) => Some(vec![other]),
            Err(e) => {
                warn!(error = %e, content = raw, "failed to decode sources JSON");
                None
            }
        };
    }

    Some(
        cleaned
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Value::String(s.to_string()))
            .collect(),
    )
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn format_source(source: &Value) -> Option<String> {
    match source {
        Value::String(name) => {
            let name = name.trim();
            (!name.is_empty()).then(|| format!("• {name}"))
        }
        Value::Object(fields) => {
            let name = fields.get("fonte_nome").map(value_text).unwrap_or_default();
            if name.is_empty() {
                return None;
            }
            let mut item = format!("• {name}");
            if let Some(desc) = fields.get("descricao").map(value_text)
                && !desc.is_empty()
            {
                item.push_str(&format!("\n  Descrição: {desc}"));
            }
            if let Some(link) = fields.get("link").map(value_text)
                && !link.is_empty()
            {
                item.push_str(&format!("\n  Link: {link}"));
            }
            Some(item)
        }
        other => {
            warn!(source = %other, "skipping source that is neither a name nor an object");
            None
        }
    }
}

/// `Guia_<professor>_<grade>_Bim<bimester>_<subject>.docx`
pub fn guide_file_name(req: &GuideRequest) -> String {
    let name = format!(
        "Guia_{}_{}_Bim{}_{}.docx",
        truncate_chars(&req.professor, 20).replace(' ', "_"),
        req.ano_serie.replace(' ', ""),
        req.bimestre,
        truncate_chars(&req.disciplina, 30).replace(' ', "_"),
    );
    path_safe(&name)
}

/// Template values for a guide built from the matching scope rows.
pub fn guide_context(
    req: &GuideRequest,
    rows: &[&[String]],
    columns: &ScopeColumns,
) -> TemplateContext {
    let column = |idx: usize| {
        format_section(
            rows.iter()
                .map(move |row| row.get(idx).map(String::as_str).unwrap_or("")),
        )
    };

    let mut context = TemplateContext::new();
    context
        .insert("Professor", req.professor.as_str())
        .insert("Disciplina", req.disciplina.as_str())
        .insert("AnoSerie", req.ano_serie.as_str())
        .insert("Bimestre", req.bimestre.as_str())
        .insert("Titulo", column(columns.titulo))
        .insert("Conteudo", column(columns.conteudo))
        .insert("Objetivos", column(columns.objetivos))
        .insert("Fontes", format_sources(req.fontes.as_ref()));
    context
}

/// Generate a learning guide and deliver it.
pub fn generate_guide(
    config: &EscolaConfig,
    req: &GuideRequest,
    delivery: Delivery,
) -> Result<Delivered> {
    let template = DocxTemplate::from_path(&config.guide_template_path())?;

    let workbook = config.scope_sheet_path(req.ciclo.number()).ok_or_else(|| {
        EscolaError::Config(format!(
            "nenhuma planilha configurada para o ciclo {}",
            req.ciclo.number()
        ))
    })?;
    if !workbook.exists() {
        return Err(EscolaError::SpreadsheetNotFound(workbook));
    }

    let mut table = read_sheet(&workbook, &req.disciplina)?;
    let columns = map_columns(&mut table)?;
    let rows = filter_rows(&table, &columns, &req.ano_serie, &req.bimestre)?;
    if rows.is_empty() {
        return Err(EscolaError::NoMatchingRows {
            disciplina: req.disciplina.clone(),
            ano_serie: req.ano_serie.clone(),
            bimestre: req.bimestre.clone(),
        });
    }

    let context = guide_context(req, &rows, &columns);
    let bytes = template.render(&context)?;
    if bytes.len() < MIN_DOCUMENT_SIZE {
        return Err(EscolaError::OutputTooSmall(bytes.len()));
    }

    let document = GeneratedDocument {
        file_name: guide_file_name(req),
        mime_type: DOCX_MIME,
        bytes,
    };
    info!(
        professor = %req.professor,
        disciplina = %req.disciplina,
        ano_serie = %req.ano_serie,
        bimestre = %req.bimestre,
        rows = rows.len(),
        file = %document.file_name,
        "guide generated"
    );

    let path = match delivery {
        Delivery::Base64 => None,
        Delivery::File => Some(document.write_to(&config.guide_output_path())?),
    };
    Ok(Delivered { document, path })
}
