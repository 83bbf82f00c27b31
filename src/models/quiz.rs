// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Quiz {
    pub id: i64,

    pub title: String,

    /// Client-observed time limit. The engine itself accepts late submits.
    pub duration_minutes: i32,

    /// Scope restricting which students may take the quiz. Copied from the
    /// creating teacher and immutable afterwards.
    pub module_id: Option<i64>,
    pub group_id: Option<i64>,

    /// The teacher who owns the quiz.
    pub teacher_id: i64,

    pub is_published: bool,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Quiz fields embedded in a student-facing attempt payload.
#[derive(Debug, Serialize)]
pub struct QuizSummary {
    pub id: i64,
    pub title: String,
    pub duration_minutes: i32,
    pub module_id: Option<i64>,
    pub group_id: Option<i64>,
    pub is_published: bool,
}

impl From<&Quiz> for QuizSummary {
    fn from(quiz: &Quiz) -> Self {
        QuizSummary {
            id: quiz.id,
            title: quiz.title.clone(),
            duration_minutes: quiz.duration_minutes,
            module_id: quiz.module_id,
            group_id: quiz.group_id,
            is_published: quiz.is_published,
        }
    }
}

/// DTO for creating a quiz. Scope is never part of the payload; it is
/// inherited from the creating teacher.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters."))]
    pub title: String,
    #[validate(range(min = 1, max = 300, message = "Duration must be 1 to 300 minutes."))]
    pub duration_minutes: i32,
    pub is_published: Option<bool>,
}

/// DTO for updating a quiz. Only title, duration and publish flag are
/// updatable; module/group scope is immutable.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuizRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters."))]
    pub title: Option<String>,
    #[validate(range(min = 1, max = 300, message = "Duration must be 1 to 300 minutes."))]
    pub duration_minutes: Option<i32>,
    pub is_published: Option<bool>,
}
