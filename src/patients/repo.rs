use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::dto::{ClinicalNote, PatientEntry};

pub async fn list_patients(db: &PgPool, professional_id: Uuid) -> anyhow::Result<Vec<PatientEntry>> {
    let rows = sqlx::query_as::<_, PatientEntry>(
        r#"
        SELECT u.id, u.email, p.full_name, l.created_at AS linked_at
          FROM patient_links l
          JOIN users u ON u.id = l.patient_id
          LEFT JOIN profiles p ON p.user_id = u.id
         WHERE l.professional_id = $1
         ORDER BY p.full_name NULLS LAST, u.email
        "#,
    )
    .bind(professional_id)
    .fetch_all(db)
    .await
    .context("list patients")?;
    Ok(rows)
}

/// Returns the new roster entry, or `None` when the link already existed.
pub async fn link(
    db: &PgPool,
    professional_id: Uuid,
    patient_id: Uuid,
) -> anyhow::Result<Option<PatientEntry>> {
    let row = sqlx::query_as::<_, PatientEntry>(
        r#"
        WITH inserted AS (
            INSERT INTO patient_links (professional_id, patient_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            RETURNING patient_id, created_at
        )
        SELECT u.id, u.email, p.full_name, i.created_at AS linked_at
          FROM inserted i
          JOIN users u ON u.id = i.patient_id
          LEFT JOIN profiles p ON p.user_id = u.id
        "#,
    )
    .bind(professional_id)
    .bind(patient_id)
    .fetch_optional(db)
    .await
    .context("link patient")?;
    Ok(row)
}

pub async fn unlink(db: &PgPool, professional_id: Uuid, patient_id: Uuid) -> anyhow::Result<bool> {
    let result =
        sqlx::query("DELETE FROM patient_links WHERE professional_id = $1 AND patient_id = $2")
            .bind(professional_id)
            .bind(patient_id)
            .execute(db)
            .await
            .context("unlink patient")?;
    Ok(result.rows_affected() > 0)
}

pub async fn is_linked(db: &PgPool, professional_id: Uuid, patient_id: Uuid) -> anyhow::Result<bool> {
    let found: Option<(i32,)> = sqlx::query_as(
        "SELECT 1 FROM patient_links WHERE professional_id = $1 AND patient_id = $2",
    )
    .bind(professional_id)
    .bind(patient_id)
    .fetch_optional(db)
    .await
    .context("check patient link")?;
    Ok(found.is_some())
}

pub async fn list_notes(
    db: &PgPool,
    professional_id: Uuid,
    patient_id: Uuid,
) -> anyhow::Result<Vec<ClinicalNote>> {
    let rows = sqlx::query_as::<_, ClinicalNote>(
        r#"
        SELECT id, patient_id, body, created_at
          FROM clinical_notes
         WHERE professional_id = $1 AND patient_id = $2
         ORDER BY created_at DESC
        "#,
    )
    .bind(professional_id)
    .bind(patient_id)
    .fetch_all(db)
    .await
    .context("list clinical notes")?;
    Ok(rows)
}

pub async fn add_note(
    db: &PgPool,
    professional_id: Uuid,
    patient_id: Uuid,
    body: &str,
) -> anyhow::Result<ClinicalNote> {
    let note = sqlx::query_as::<_, ClinicalNote>(
        r#"
        INSERT INTO clinical_notes (id, professional_id, patient_id, body)
        VALUES ($1, $2, $3, $4)
        RETURNING id, patient_id, body, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(professional_id)
    .bind(patient_id)
    .bind(body)
    .fetch_one(db)
    .await
    .context("insert clinical note")?;
    Ok(note)
}
