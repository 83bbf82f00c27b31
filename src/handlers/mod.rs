// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod directory;
pub mod student;
pub mod teacher;

use sqlx::PgPool;

use crate::{
    error::AppError,
    models::{quiz::Quiz, user::User},
    utils::jwt::Claims,
};

const USER_COLUMNS: &str = "id, name, email, password, role, module_id, group_id, created_at";

const QUIZ_COLUMNS: &str =
    "id, title, duration_minutes, module_id, group_id, teacher_id, is_published, created_at";

/// Loads the authenticated principal's full user row.
///
/// The token carries only id and role; the scope attributes
/// (module_id/group_id) that drive visibility and targeting live on the row.
pub(crate) async fn current_user(pool: &PgPool, claims: &Claims) -> Result<User, AppError> {
    let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
    sqlx::query_as::<_, User>(&query)
        .bind(claims.user_id())
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::AuthError("User not found".to_string()))
}

pub(crate) async fn load_quiz(pool: &PgPool, quiz_id: i64) -> Result<Quiz, AppError> {
    let query = format!("SELECT {} FROM quizzes WHERE id = $1", QUIZ_COLUMNS);
    sqlx::query_as::<_, Quiz>(&query)
        .bind(quiz_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))
}
