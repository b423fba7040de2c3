//! Human validation workflow.
//!
//! Staff submit ground-truth categorizations independently of the
//! automated pipeline. At most one confirmation per (term, user); unlike
//! the pipeline's internal duplicate races, a duplicate here comes from an
//! end user and gets a distinct, user-visible error.

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Confirmation, Term};

#[derive(Debug, Error)]
pub enum ConfirmError {
    #[error("'{phrase}' was already confirmed by {user}; duplicate confirmations are not supported")]
    Duplicate { phrase: String, user: String },

    #[error("Unknown category: '{0}'")]
    UnknownCategory(String),

    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

pub async fn confirm(
    pool: &SqlitePool,
    term: &Term,
    user: &str,
    category_name: &str,
) -> Result<Confirmation, ConfirmError> {
    let category_id: Option<String> = sqlx::query_scalar("SELECT id FROM categories WHERE name = ?")
        .bind(category_name)
        .fetch_optional(pool)
        .await?;

    let category_id =
        category_id.ok_or_else(|| ConfirmError::UnknownCategory(category_name.to_string()))?;

    let result = sqlx::query(
        r#"
        INSERT INTO confirmations (id, term_id, user, category_id, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(term_id, user) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&term.id)
    .bind(user)
    .bind(&category_id)
    .bind(Utc::now().timestamp())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ConfirmError::Duplicate {
            phrase: term.phrase.clone(),
            user: user.to_string(),
        });
    }

    let row = sqlx::query(
        "SELECT id, term_id, user, category_id, created_at FROM confirmations WHERE term_id = ? AND user = ?",
    )
    .bind(&term.id)
    .bind(user)
    .fetch_one(pool)
    .await?;

    Ok(Confirmation {
        id: row.get("id"),
        term_id: row.get("term_id"),
        user: row.get("user"),
        category_id: row.get("category_id"),
        created_at: row.get("created_at"),
    })
}
