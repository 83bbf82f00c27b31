// src/handlers/directory.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::directory::{Group, Module},
};

/// Lists curriculum modules. Referential data for the quiz-assignment UI.
/// Teacher/admin only.
pub async fn list_modules(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let modules = sqlx::query_as::<_, Module>("SELECT id, name FROM modules ORDER BY id")
        .fetch_all(&pool)
        .await?;

    Ok(Json(modules))
}

/// Lists the groups of one module.
/// Teacher/admin only.
pub async fn list_module_groups(
    State(pool): State<PgPool>,
    Path(module_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    sqlx::query("SELECT id FROM modules WHERE id = $1")
        .bind(module_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Module not found".to_string()))?;

    let groups = sqlx::query_as::<_, Group>(
        "SELECT id, name, module_id FROM groups WHERE module_id = $1 ORDER BY id",
    )
    .bind(module_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(groups))
}
