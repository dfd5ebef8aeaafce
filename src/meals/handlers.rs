use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{delete, get},
    Json, Router,
};
use tracing::{error, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{CreateMealRequest, DailySummary, DayQuery},
    repo::{self, Meal},
    service::{daily_summary, log_meal, meals_for_day, parse_day, LogMealError},
};
use crate::{analysis::error::AnalysisError, auth::jwt::ClientUser, state::AppState};

pub fn meal_routes() -> Router<AppState> {
    Router::new()
        .route("/meals", get(list_meals).post(create_meal))
        .route("/meals/summary", get(get_summary))
        .route("/meals/:id", delete(delete_meal))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "meals internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into())
}

/// POST /meals { text }: analyse and store.
#[instrument(skip(state, body))]
pub async fn create_meal(
    State(state): State<AppState>,
    ClientUser(user_id): ClientUser,
    body: Result<Json<CreateMealRequest>, JsonRejection>,
) -> Result<(StatusCode, HeaderMap, Json<Meal>), LogMealError> {
    let Json(req) = body.map_err(AnalysisError::from)?;
    let text = req.text.unwrap_or_default();

    let meal = log_meal(&state, user_id, &text).await.map_err(|e| {
        warn!(%user_id, error = %e, "create_meal failed");
        e
    })?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/v1/meals/{}", meal.id)) {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(meal)))
}

#[instrument(skip(state))]
pub async fn list_meals(
    State(state): State<AppState>,
    ClientUser(user_id): ClientUser,
    Query(q): Query<DayQuery>,
) -> Result<Json<Vec<Meal>>, (StatusCode, String)> {
    let day = parse_day(q.date.as_deref())
        .map_err(|_| (StatusCode::BAD_REQUEST, "date must be YYYY-MM-DD".to_string()))?;
    let meals = meals_for_day(&state.db, user_id, day)
        .await
        .map_err(internal)?;
    Ok(Json(meals))
}

#[instrument(skip(state))]
pub async fn get_summary(
    State(state): State<AppState>,
    ClientUser(user_id): ClientUser,
    Query(q): Query<DayQuery>,
) -> Result<Json<DailySummary>, (StatusCode, String)> {
    let day = parse_day(q.date.as_deref())
        .map_err(|_| (StatusCode::BAD_REQUEST, "date must be YYYY-MM-DD".to_string()))?;
    let summary = daily_summary(&state.db, user_id, day)
        .await
        .map_err(internal)?;
    Ok(Json(summary))
}

#[instrument(skip(state))]
pub async fn delete_meal(
    State(state): State<AppState>,
    ClientUser(user_id): ClientUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if repo::delete(&state.db, user_id, id).await.map_err(internal)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Meal not found".into()))
    }
}
