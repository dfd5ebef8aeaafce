use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{AddPatientRequest, ClinicalNote, NewNoteRequest, PatientEntry},
    repo,
};
use crate::{
    auth::{
        dto::Role,
        handlers::normalize_email,
        jwt::Professional,
        repo::User,
    },
    meals::{
        dto::{DailySummary, DayQuery},
        service::{daily_summary, parse_day},
    },
    state::AppState,
};

pub fn patient_routes() -> Router<AppState> {
    Router::new()
        .route("/pro/patients", get(list_patients).post(add_patient))
        .route("/pro/patients/:id", delete(remove_patient))
        .route("/pro/patients/:id/notes", get(list_notes).post(add_note))
        .route("/pro/patients/:id/summary", get(patient_summary))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "patients internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into())
}

async fn ensure_linked(
    state: &AppState,
    professional_id: Uuid,
    patient_id: Uuid,
) -> Result<(), (StatusCode, String)> {
    if repo::is_linked(&state.db, professional_id, patient_id)
        .await
        .map_err(internal)?
    {
        Ok(())
    } else {
        Err((StatusCode::NOT_FOUND, "Patient not found".into()))
    }
}

#[instrument(skip(state))]
pub async fn list_patients(
    State(state): State<AppState>,
    Professional(pro_id): Professional,
) -> Result<Json<Vec<PatientEntry>>, (StatusCode, String)> {
    let rows = repo::list_patients(&state.db, pro_id)
        .await
        .map_err(internal)?;
    Ok(Json(rows))
}

/// POST /pro/patients { email }: link an existing client account.
#[instrument(skip(state, payload))]
pub async fn add_patient(
    State(state): State<AppState>,
    Professional(pro_id): Professional,
    Json(payload): Json<AddPatientRequest>,
) -> Result<(StatusCode, Json<PatientEntry>), (StatusCode, String)> {
    let email = normalize_email(&payload.email);
    let patient = User::find_by_email(&state.db, &email)
        .await
        .map_err(internal)?
        .ok_or_else(|| {
            warn!(%pro_id, "add_patient unknown email");
            (StatusCode::NOT_FOUND, "No client with this email".to_string())
        })?;

    if patient.role() != Role::Client {
        return Err((
            StatusCode::BAD_REQUEST,
            "Only client accounts can be patients".into(),
        ));
    }

    match repo::link(&state.db, pro_id, patient.id).await.map_err(internal)? {
        Some(entry) => {
            info!(%pro_id, patient_id = %entry.id, "patient linked");
            Ok((StatusCode::CREATED, Json(entry)))
        }
        None => Err((StatusCode::CONFLICT, "Patient already linked".into())),
    }
}

#[instrument(skip(state))]
pub async fn remove_patient(
    State(state): State<AppState>,
    Professional(pro_id): Professional,
    Path(patient_id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if repo::unlink(&state.db, pro_id, patient_id)
        .await
        .map_err(internal)?
    {
        info!(%pro_id, %patient_id, "patient unlinked");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Patient not found".into()))
    }
}

#[instrument(skip(state))]
pub async fn list_notes(
    State(state): State<AppState>,
    Professional(pro_id): Professional,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Vec<ClinicalNote>>, (StatusCode, String)> {
    ensure_linked(&state, pro_id, patient_id).await?;
    let notes = repo::list_notes(&state.db, pro_id, patient_id)
        .await
        .map_err(internal)?;
    Ok(Json(notes))
}

#[instrument(skip(state, payload))]
pub async fn add_note(
    State(state): State<AppState>,
    Professional(pro_id): Professional,
    Path(patient_id): Path<Uuid>,
    Json(payload): Json<NewNoteRequest>,
) -> Result<(StatusCode, Json<ClinicalNote>), (StatusCode, String)> {
    let body = payload
        .cleaned()
        .map_err(|msg| (StatusCode::BAD_REQUEST, msg.to_string()))?;
    ensure_linked(&state, pro_id, patient_id).await?;

    let note = repo::add_note(&state.db, pro_id, patient_id, body)
        .await
        .map_err(internal)?;
    info!(%pro_id, %patient_id, note_id = %note.id, "clinical note added");
    Ok((StatusCode::CREATED, Json(note)))
}

#[instrument(skip(state))]
pub async fn patient_summary(
    State(state): State<AppState>,
    Professional(pro_id): Professional,
    Path(patient_id): Path<Uuid>,
    Query(q): Query<DayQuery>,
) -> Result<Json<DailySummary>, (StatusCode, String)> {
    let day = parse_day(q.date.as_deref())
        .map_err(|_| (StatusCode::BAD_REQUEST, "date must be YYYY-MM-DD".to_string()))?;
    ensure_linked(&state, pro_id, patient_id).await?;
    let summary = daily_summary(&state.db, patient_id, day)
        .await
        .map_err(internal)?;
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        extract::FromRef,
        http::{header, Request},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::analysis::service::testing::ScriptedGenerator;
    use crate::app::build_app;
    use crate::auth::jwt::JwtKeys;

    #[tokio::test]
    async fn clients_cannot_reach_the_roster() {
        let state = AppState::fake(Arc::new(ScriptedGenerator::default()));
        let token = JwtKeys::from_ref(&state)
            .sign_access(Uuid::new_v4(), Role::Client)
            .unwrap();

        let res = build_app(state)
            .oneshot(
                Request::get("/api/v1/pro/patients")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn blank_note_is_rejected_before_lookup() {
        let state = AppState::fake(Arc::new(ScriptedGenerator::default()));
        let token = JwtKeys::from_ref(&state)
            .sign_access(Uuid::new_v4(), Role::Professional)
            .unwrap();

        let res = build_app(state)
            .oneshot(
                Request::post(format!("/api/v1/pro/patients/{}/notes", Uuid::new_v4()))
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"body":"   "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
