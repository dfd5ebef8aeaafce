use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const MAX_NOTE_CHARS: usize = 5000;

/// One row of a professional's roster.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PatientEntry {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub linked_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ClinicalNote {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub body: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct AddPatientRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct NewNoteRequest {
    pub body: String,
}

impl NewNoteRequest {
    /// Trimmed note text, or why it was refused.
    pub fn cleaned(&self) -> Result<&str, &'static str> {
        let body = self.body.trim();
        if body.is_empty() {
            return Err("Note body is required");
        }
        if body.chars().count() > MAX_NOTE_CHARS {
            return Err("Note body is too long");
        }
        Ok(body)
    }
}
