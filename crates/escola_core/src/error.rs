use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Error type shared by the document generators and the HTTP layer.
///
/// Display strings are the public, Portuguese messages returned to callers.
#[derive(Error, Debug)]
pub enum EscolaError {
    #[error("Parâmetros obrigatórios faltando: {}", .0.join(", "))]
    MissingParameters(Vec<String>),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Template não encontrado em: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("Planilha não encontrada em: {}", .0.display())]
    SpreadsheetNotFound(PathBuf),

    #[error("Erro ao acessar aba '{sheet}'. Abas disponíveis: {}", .available.join(", "))]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },

    #[error("Coluna obrigatória '{0}' não encontrada")]
    MissingColumn(String),

    #[error(
        "Nenhum dado encontrado para: Disciplina={disciplina}, Ano/Série (formatos aceitos: '6°', '6° ano', '6ª', etc)={ano_serie}, Bimestre={bimestre}"
    )]
    NoMatchingRows {
        disciplina: String,
        ano_serie: String,
        bimestre: String,
    },

    #[error("Arquivo gerado é muito pequeno ({0} bytes)")]
    OutputTooSmall(usize),

    #[error("Erro no template: {0}")]
    Template(String),

    #[error("Erro ao ler planilha: {0}")]
    Spreadsheet(String),

    #[error("Erro ao gerar documento: {0}")]
    Render(String),

    #[error("Erro de configuração: {0}")]
    Config(String),

    #[error("Erro de E/S: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON inválido: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EscolaError>;

/// Classification used to pick HTTP statuses and log levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// The request itself is wrong (missing or malformed parameters, no data).
    UserError,
    /// A requested resource (sheet, subject) does not exist.
    NotFound,
    /// Server-side failure: missing template files, I/O, rendering.
    SystemError,
    /// Invalid or missing configuration.
    ConfigError,
}

impl EscolaError {
    pub fn missing(params: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::MissingParameters(params.into_iter().map(Into::into).collect())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Returns the broad error category for routing and display purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingParameters(_)
            | Self::InvalidInput(_)
            | Self::MissingColumn(_)
            | Self::NoMatchingRows { .. }
            | Self::Json(_) => ErrorCategory::UserError,
            Self::SheetNotFound { .. } => ErrorCategory::NotFound,
            Self::TemplateNotFound(_)
            | Self::SpreadsheetNotFound(_)
            | Self::OutputTooSmall(_)
            | Self::Template(_)
            | Self::Spreadsheet(_)
            | Self::Render(_)
            | Self::Io(_) => ErrorCategory::SystemError,
            Self::Config(_) => ErrorCategory::ConfigError,
        }
    }

    /// Stable variant name, reported to clients as the error `type`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingParameters(_) => "MissingParameters",
            Self::InvalidInput(_) => "InvalidInput",
            Self::TemplateNotFound(_) => "TemplateNotFound",
            Self::SpreadsheetNotFound(_) => "SpreadsheetNotFound",
            Self::SheetNotFound { .. } => "SheetNotFound",
            Self::MissingColumn(_) => "MissingColumn",
            Self::NoMatchingRows { .. } => "NoMatchingRows",
            Self::OutputTooSmall(_) => "OutputTooSmall",
            Self::Template(_) => "TemplateError",
            Self::Spreadsheet(_) => "SpreadsheetError",
            Self::Render(_) => "RenderError",
            Self::Config(_) => "ConfigError",
            Self::Io(_) => "IoError",
            Self::Json(_) => "JsonError",
        }
    }
}
