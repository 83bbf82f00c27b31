// src/models/assignment.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'quiz_assignments' table in the database.
///
/// An explicit grant of a quiz to a module, group or single student, layered
/// on top of the quiz's own scope. Deduplicated on the full 4-tuple.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuizAssignment {
    pub id: i64,
    pub quiz_id: i64,
    pub module_id: Option<i64>,
    pub group_id: Option<i64>,
    pub student_id: Option<i64>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating an assignment. At least one target must be present.
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub module_id: Option<i64>,
    pub group_id: Option<i64>,
    pub student_id: Option<i64>,
}
