use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use super::{
    dto::{AuthResponse, LoginRequest, MeResponse, PublicUser, RefreshRequest, RegisterRequest},
    jwt::{AuthUser, JwtKeys},
    password::{hash_password, verify_password, MIN_PASSWORD_LEN},
    repo::{is_unique_violation, User},
};
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "auth internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into())
}

/// A concurrent registration can pass the lookup above and still lose the
/// insert on the unique email index.
fn create_failed(e: anyhow::Error, email: &str) -> (StatusCode, String) {
    if is_unique_violation(&e) {
        warn!(email = %email, "email already registered");
        return email_taken();
    }
    internal(e)
}

fn email_taken() -> (StatusCode, String) {
    (StatusCode::CONFLICT, "Email already registered".into())
}

fn issue_tokens(keys: &JwtKeys, user: &User) -> Result<AuthResponse, (StatusCode, String)> {
    let role = user.role();
    let access_token = keys.sign_access(user.id, role).map_err(internal)?;
    let refresh_token = keys.sign_refresh(user.id, role).map_err(internal)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser {
            id: user.id,
            email: user.email.clone(),
            role,
        },
        home: role.home_path(),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), (StatusCode, String)> {
    payload.email = normalize_email(&payload.email);

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }

    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err((StatusCode::BAD_REQUEST, "Password too short".into()));
    }

    match User::find_by_email(&state.db, &payload.email).await {
        Ok(Some(_)) => {
            warn!(email = %payload.email, "email already registered");
            return Err(email_taken());
        }
        Ok(None) => {}
        Err(e) => return Err(internal(e)),
    }

    let hash = hash_password(&payload.password).map_err(internal)?;
    let user = User::create(&state.db, &payload.email, &hash, payload.role)
        .await
        .map_err(|e| create_failed(e, &payload.email))?;

    let keys = JwtKeys::from_ref(&state);
    let response = issue_tokens(&keys, &user)?;
    info!(user_id = %user.id, role = user.role.as_str(), "user registered");
    Ok((StatusCode::CREATED, Json(response)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    payload.email = normalize_email(&payload.email);

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err((StatusCode::BAD_REQUEST, "Invalid email".into()));
    }

    let user = match User::find_by_email(&state.db, &payload.email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(email = %payload.email, "login unknown email");
            return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
        }
        Err(e) => return Err(internal(e)),
    };

    if !verify_password(&payload.password, &user.password_hash).map_err(internal)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let response = issue_tokens(&keys, &user)?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(response))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        (StatusCode::UNAUTHORIZED, "Invalid refresh token".to_string())
    })?;

    // Role is re-read so a changed account type takes effect on refresh.
    let user = User::find_by_id(&state.db, claims.sub)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    Ok(Json(issue_tokens(&keys, &user)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<MeResponse>, (StatusCode, String)> {
    let found = User::find_by_id(&state.db, user.id)
        .await
        .map_err(internal)?
        .ok_or_else(|| {
            error!(user_id = %user.id, "user not found");
            (StatusCode::UNAUTHORIZED, "User not found".to_string())
        })?;

    let role = found.role();
    Ok(Json(MeResponse {
        user: PublicUser {
            id: found.id,
            email: found.email,
            role,
        },
        home: role.home_path(),
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::analysis::service::testing::ScriptedGenerator;
    use crate::app::build_app;
    use crate::auth::repo::testing::DuplicateEmail;

    #[test]
    fn email_rules() {
        assert!(is_valid_email("ana@clinic.com.br"));
        assert!(!is_valid_email("ana@clinic"));
        assert!(!is_valid_email("ana clinic@x.io"));
        assert_eq!(normalize_email("  Ana@Clinic.COM "), "ana@clinic.com");
    }

    async fn post_json(uri: &str, body: &str) -> StatusCode {
        let app = build_app(AppState::fake(Arc::new(ScriptedGenerator::default())));
        app.oneshot(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
    }

    #[tokio::test]
    async fn register_validates_before_touching_the_database() {
        let status = post_json(
            "/api/v1/auth/register",
            r#"{"email":"not-an-email","password":"longenough"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let status = post_json(
            "/api/v1/auth/register",
            r#"{"email":"ok@example.com","password":"short"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn losing_a_registration_race_is_a_conflict() {
        let (status, _) = create_failed(DuplicateEmail::into_anyhow(), "ana@clinic.com");
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = create_failed(anyhow::anyhow!("pool timed out"), "ana@clinic.com");
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn refresh_rejects_garbage_token() {
        let status = post_json("/api/v1/auth/refresh", r#"{"refresh_token":"nope"}"#).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_requires_bearer_token() {
        let app = build_app(AppState::fake(Arc::new(ScriptedGenerator::default())));
        let res = app
            .oneshot(Request::get("/api/v1/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
