use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub const MISSING_TEXT_MESSAGE: &str = "Texto não fornecido";
pub const INVALID_BODY_MESSAGE: &str = "Corpo da requisição inválido";
pub const ANALYSIS_FAILED_MESSAGE: &str = "Falha ao analisar nutrição";

/// Failure talking to the text-generation API.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model API returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("model response could not be decoded: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("model response contained no text")]
    EmptyResponse,
}

/// The model answered, but not with a usable nutrition object.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("no JSON object found in model output")]
    NoJson,
    #[error("embedded JSON is malformed: {0}")]
    Syntax(#[source] serde_json::Error),
    #[error("embedded JSON has the wrong shape: {0}")]
    Shape(#[source] serde_json::Error),
    #[error("field `{field}` is invalid: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("meal text is missing or empty")]
    MissingText,
    #[error("request body rejected: {0}")]
    InvalidBody(#[from] JsonRejection),
    #[error(transparent)]
    Transport(#[from] LlmError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

impl AnalysisError {
    /// Stable label for logs, keeps outages apart from bad model output.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::MissingText | AnalysisError::InvalidBody(_) => "input",
            AnalysisError::Transport(_) => "transport",
            AnalysisError::Extraction(_) => "extraction",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AnalysisError::MissingText | AnalysisError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            AnalysisError::Transport(_) | AnalysisError::Extraction(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// What the caller sees. Server-side failures never carry their cause.
    pub fn public_message(&self) -> &'static str {
        match self {
            AnalysisError::MissingText => MISSING_TEXT_MESSAGE,
            AnalysisError::InvalidBody(_) => INVALID_BODY_MESSAGE,
            AnalysisError::Transport(_) | AnalysisError::Extraction(_) => ANALYSIS_FAILED_MESSAGE,
        }
    }
}

impl IntoResponse for AnalysisError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.public_message() }))).into_response()
    }
}
