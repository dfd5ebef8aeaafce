use anyhow::Context;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{ProfileResponse, UpdateProfileRequest, DEFAULT_CALORIE_GOAL};
use crate::analysis::dto::{Objective, UserNutritionContext};

#[derive(Debug, Clone, FromRow)]
pub struct Profile {
    pub full_name: Option<String>,
    pub age: Option<i32>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub objective: Option<String>,
    pub calorie_goal: Option<i32>,
    pub lgpd_consent_at: Option<OffsetDateTime>,
}

impl Profile {
    pub async fn find(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<Profile>> {
        let row = sqlx::query_as::<_, Profile>(
            r#"
            SELECT full_name, age, weight_kg, height_cm, objective,
                   calorie_goal, lgpd_consent_at
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("select profile")?;
        Ok(row)
    }

    /// Saves the setup form and stamps the consent time.
    pub async fn update(
        db: &PgPool,
        user_id: Uuid,
        req: &UpdateProfileRequest,
    ) -> anyhow::Result<Option<Profile>> {
        let row = sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles
               SET full_name = $2,
                   age = $3,
                   weight_kg = $4,
                   height_cm = $5,
                   objective = $6,
                   calorie_goal = COALESCE($7, calorie_goal),
                   lgpd_consent_at = COALESCE(lgpd_consent_at, now()),
                   updated_at = now()
             WHERE user_id = $1
            RETURNING full_name, age, weight_kg, height_cm, objective,
                      calorie_goal, lgpd_consent_at
            "#,
        )
        .bind(user_id)
        .bind(req.full_name.trim())
        .bind(i32::try_from(req.age).unwrap_or(i32::MAX))
        .bind(req.weight_kg)
        .bind(req.height_cm)
        .bind(req.objective.as_str())
        .bind(req.calorie_goal.map(|g| i32::try_from(g).unwrap_or(i32::MAX)))
        .fetch_optional(db)
        .await
        .context("update profile")?;
        Ok(row)
    }

    pub fn objective(&self) -> Option<Objective> {
        self.objective.as_deref().and_then(Objective::parse)
    }

    pub fn calorie_goal(&self) -> i32 {
        self.calorie_goal.unwrap_or(DEFAULT_CALORIE_GOAL)
    }

    pub fn needs_setup(&self) -> bool {
        self.lgpd_consent_at.is_none() || self.weight_kg.is_none()
    }

    /// Prompt personalisation drawn from the stored profile.
    pub fn nutrition_context(&self) -> UserNutritionContext {
        UserNutritionContext {
            age: self.age.map(f64::from),
            weight_kg: self.weight_kg,
            objective: self.objective(),
        }
    }

    pub fn into_response(self) -> ProfileResponse {
        ProfileResponse {
            needs_setup: self.needs_setup(),
            objective: self.objective(),
            calorie_goal: self.calorie_goal(),
            full_name: self.full_name,
            age: self.age,
            weight_kg: self.weight_kg,
            height_cm: self.height_cm,
            lgpd_consent_at: self.lgpd_consent_at,
        }
    }
}
