use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::{error, info, instrument, warn};

use super::{
    dto::{ProfileResponse, UpdateProfileRequest},
    repo::Profile,
};
use crate::{auth::jwt::AuthUser, state::AppState};

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/me/profile", get(get_profile).put(update_profile))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    match Profile::find(&state.db, user.id).await {
        Ok(Some(p)) => Ok(Json(p.into_response())),
        Ok(None) => Err((StatusCode::NOT_FOUND, "Profile not found".into())),
        Err(e) => {
            error!(error = %e, user_id = %user.id, "get_profile failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into()))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    if let Err(msg) = payload.validate() {
        warn!(user_id = %user.id, reason = msg, "profile update rejected");
        return Err((StatusCode::BAD_REQUEST, msg.into()));
    }

    match Profile::update(&state.db, user.id, &payload).await {
        Ok(Some(p)) => {
            info!(user_id = %user.id, "profile updated");
            Ok(Json(p.into_response()))
        }
        Ok(None) => Err((StatusCode::NOT_FOUND, "Profile not found".into())),
        Err(e) => {
            error!(error = %e, user_id = %user.id, "update_profile failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into()))
        }
    }
}
