use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::{error, instrument, warn};

use super::{
    dto::{AnalyzeRequest, NutritionEstimate},
    error::AnalysisError,
    service::analyze_meal,
};
use crate::state::AppState;

pub fn analysis_routes() -> Router<AppState> {
    Router::new().route("/analyze", post(analyze))
}

/// POST /analyze { text, profile? }
#[instrument(skip(state, body))]
pub async fn analyze(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<NutritionEstimate>, AnalysisError> {
    let Json(req) = body.map_err(|e| {
        warn!(error = %e, "analyze body rejected");
        AnalysisError::from(e)
    })?;
    let text = req.text.unwrap_or_default();

    analyze_meal(state.generator.as_ref(), &text, req.profile.as_ref())
        .await
        .map(Json)
        .map_err(|e| {
            match &e {
                AnalysisError::MissingText | AnalysisError::InvalidBody(_) => {
                    warn!(kind = e.kind(), "analyze rejected")
                }
                _ => error!(kind = e.kind(), error = %e, "analyze failed"),
            }
            e
        })
}
