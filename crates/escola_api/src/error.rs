use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use escola_core::{ErrorCategory, EscolaError};
use serde_json::json;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Escola(#[from] EscolaError),

    #[error("blocking task failed: {0}")]
    Blocking(#[from] actix_web::error::BlockingError),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// HTTP status for a generator error.
pub fn status_for(err: &EscolaError) -> StatusCode {
    match err.category() {
        ErrorCategory::UserError => StatusCode::BAD_REQUEST,
        ErrorCategory::NotFound => StatusCode::NOT_FOUND,
        ErrorCategory::SystemError | ErrorCategory::ConfigError => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl ApiError {
    fn to_body(&self) -> serde_json::Value {
        match self {
            // Plain-message errors, as the n8n workflow expects them
            Self::Escola(err @ (EscolaError::MissingParameters(_) | EscolaError::InvalidInput(_))) => {
                json!({ "detail": err.to_string() })
            }
            Self::Escola(err) => json!({
                "detail": { "error": err.to_string(), "type": err.kind() }
            }),
            Self::Blocking(_) => json!({
                "detail": { "error": "Erro interno ao gerar documento", "type": "InternalError" }
            }),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Escola(err) => status_for(err),
            Self::Blocking(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        HttpResponse::build(status).json(self.to_body())
    }
}
