// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{AdminCreateUserRequest, AdminUpdateUserRequest, UserResponse},
    utils::{hash::hash_password, jwt::Claims},
};

/// Lists all users in the system, newest first.
/// Admin only.
pub async fn list_users(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, UserResponse>(
        r#"
        SELECT id, name, email, role, module_id, group_id, created_at
        FROM users
        ORDER BY id DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(users))
}

/// Creates a new user with a specific role and optional module/group scope.
/// Admin only.
pub async fn create_user(
    State(pool): State<PgPool>,
    Json(payload): Json<AdminCreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, UserResponse>(
        r#"
        INSERT INTO users (name, email, password, role, module_id, group_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, name, email, role, module_id, group_id, created_at
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&hashed_password)
    .bind(payload.role)
    .bind(payload.module_id)
    .bind(payload.group_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(format!("Email '{}' is already registered", payload.email))
        }
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AppError::Unprocessable("module_id/group_id must reference existing rows".to_string())
        }
        _ => {
            tracing::error!("Failed to create user: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Updates user information. Fields are optional; an empty password leaves
/// the stored hash untouched.
/// Admin only.
pub async fn update_user(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<AdminUpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    // Check existence
    sqlx::query("SELECT id FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    // Perform updates sequentially if fields are present
    if let Some(new_name) = payload.name {
        sqlx::query("UPDATE users SET name = $1 WHERE id = $2")
            .bind(new_name)
            .bind(id)
            .execute(&pool)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    }

    if let Some(new_email) = payload.email {
        sqlx::query("UPDATE users SET email = $1 WHERE id = $2")
            .bind(&new_email)
            .bind(id)
            .execute(&pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    AppError::Conflict(format!("Email '{}' is already registered", new_email))
                }
                _ => AppError::InternalServerError(e.to_string()),
            })?;
    }

    if let Some(new_role) = payload.role {
        sqlx::query("UPDATE users SET role = $1 WHERE id = $2")
            .bind(new_role)
            .bind(id)
            .execute(&pool)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    }

    if let Some(new_module) = payload.module_id {
        sqlx::query("UPDATE users SET module_id = $1 WHERE id = $2")
            .bind(new_module)
            .bind(id)
            .execute(&pool)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    }

    if let Some(new_group) = payload.group_id {
        sqlx::query("UPDATE users SET group_id = $1 WHERE id = $2")
            .bind(new_group)
            .bind(id)
            .execute(&pool)
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    }

    if let Some(new_password) = payload.password {
        // An empty string means "don't change it", tolerating forms that
        // always send the field.
        if !new_password.is_empty() {
            let hashed = hash_password(&new_password)?;
            sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
                .bind(hashed)
                .bind(id)
                .execute(&pool)
                .await
                .map_err(|e| AppError::InternalServerError(e.to_string()))?;
        }
    }

    let user = sqlx::query_as::<_, UserResponse>(
        "SELECT id, name, email, role, module_id, group_id, created_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(user))
}

/// Deletes a user by ID.
/// Admin only. Prevents deleting self.
pub async fn delete_user(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    // Prevent self-deletion
    if id == claims.user_id() {
        return Err(AppError::Unprocessable(
            "You can't delete your own account".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete user: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(Json(json!({"deleted": true})))
}
