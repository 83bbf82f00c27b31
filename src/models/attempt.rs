// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::question::PublicQuestion;
use crate::models::quiz::QuizSummary;

/// Represents the 'quiz_attempts' table in the database.
///
/// Lifecycle: created on first start with `submitted_at = NULL`;
/// `submitted_at`, `score` and `max_score` are written exactly once, by the
/// grading path, inside one transaction with the answer rows.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuizAttempt {
    pub id: i64,
    pub quiz_id: i64,
    pub student_id: i64,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub score: Option<i32>,
    pub max_score: Option<i32>,
}

/// Represents the 'attempt_answers' table in the database.
/// Rows exist iff the attempt is submitted; one row per answered question.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttemptAnswer {
    pub id: i64,
    pub quiz_attempt_id: i64,
    pub question_id: i64,
    pub choice_id: Option<i64>,
    pub is_correct: bool,
    pub points_earned: i32,
}

/// One entry of a submit payload. A missing or foreign `choice_id` counts as
/// "no answer" for that question.
#[derive(Debug, Deserialize)]
pub struct AnswerInput {
    pub question_id: i64,
    pub choice_id: Option<i64>,
}

/// DTO for submitting an attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitAttemptRequest {
    pub answers: Vec<AnswerInput>,
}

/// Attempt as returned by start/show: the attempt row plus the quiz and its
/// questions with answer-key-free choices, and the graded answers once
/// submitted.
#[derive(Debug, Serialize)]
pub struct AttemptView {
    pub id: i64,
    pub quiz_id: i64,
    pub student_id: i64,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub score: Option<i32>,
    pub max_score: Option<i32>,
    pub quiz: QuizSummary,
    pub questions: Vec<PublicQuestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<AttemptAnswer>>,
}
