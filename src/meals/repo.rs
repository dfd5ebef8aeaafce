use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::analysis::dto::NutritionEstimate;

/// A logged meal with the estimate it was analysed into.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Meal {
    pub id: Uuid,
    pub description: String,
    pub food_name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub insight: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    description: &str,
    estimate: &NutritionEstimate,
) -> anyhow::Result<Meal> {
    let meal = sqlx::query_as::<_, Meal>(
        r#"
        INSERT INTO meals (id, user_id, description, food_name, calories, protein, carbs, fat, insight)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id, description, food_name, calories, protein, carbs, fat, insight, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(description)
    .bind(&estimate.food_name)
    .bind(estimate.calories)
    .bind(estimate.protein)
    .bind(estimate.carbs)
    .bind(estimate.fat)
    .bind(estimate.insight.as_deref())
    .fetch_one(db)
    .await
    .context("insert meal")?;
    Ok(meal)
}

/// Meals created in `[from, to)`, newest first.
pub async fn list_between(
    db: &PgPool,
    user_id: Uuid,
    from: OffsetDateTime,
    to: OffsetDateTime,
) -> anyhow::Result<Vec<Meal>> {
    let rows = sqlx::query_as::<_, Meal>(
        r#"
        SELECT id, description, food_name, calories, protein, carbs, fat, insight, created_at
        FROM meals
        WHERE user_id = $1 AND created_at >= $2 AND created_at < $3
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .bind(from)
    .bind(to)
    .fetch_all(db)
    .await
    .context("list meals")?;
    Ok(rows)
}

/// Returns false when nothing owned by `user_id` matched.
pub async fn delete(db: &PgPool, user_id: Uuid, meal_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM meals WHERE id = $1 AND user_id = $2")
        .bind(meal_id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete meal")?;
    Ok(result.rows_affected() > 0)
}
