// src/handlers/student.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;

use crate::{
    access::scope_side_admits,
    error::AppError,
    grading::grade_attempt,
    models::{
        attempt::{AttemptAnswer, AttemptView, QuizAttempt, SubmitAttemptRequest},
        question::{Choice, PublicChoice, PublicQuestion, Question},
        quiz::{Quiz, QuizSummary},
    },
    utils::jwt::Claims,
};

use super::{QUIZ_COLUMNS, current_user, load_quiz};

const ATTEMPT_COLUMNS: &str = "id, quiz_id, student_id, started_at, submitted_at, score, max_score";

/// Lists quizzes the calling student may currently take, newest first.
///
/// Visible = published + scope match: a NULL quiz module/group admits
/// everyone, a set one only students carrying the same value. Assignment
/// rows do not participate; they narrow who a teacher may target, not what
/// students browse.
pub async fn list_quizzes(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let student = current_user(&pool, &claims).await?;

    let query = format!(
        r#"
        SELECT {}
        FROM quizzes
        WHERE is_published = TRUE
          AND (module_id IS NULL OR module_id = $1)
          AND (group_id IS NULL OR group_id = $2)
        ORDER BY created_at DESC, id DESC
        "#,
        QUIZ_COLUMNS
    );
    let quizzes = sqlx::query_as::<_, Quiz>(&query)
        .bind(student.module_id)
        .bind(student.group_id)
        .fetch_all(&pool)
        .await?;

    Ok(Json(quizzes))
}

/// Starts (or resumes) the student's attempt on a quiz.
///
/// Idempotent per (student, quiz): an existing open attempt is returned
/// unchanged. Under concurrent starts the partial unique index on open
/// attempts makes one insert win; the loser re-reads the winner's row.
pub async fn start_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student = current_user(&pool, &claims).await?;
    let quiz = load_quiz(&pool, quiz_id).await?;

    if !quiz.is_published {
        return Err(AppError::Forbidden("Quiz not published".to_string()));
    }

    let question_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE quiz_id = $1")
            .bind(quiz.id)
            .fetch_one(&pool)
            .await?;

    if question_count == 0 {
        return Err(AppError::Unprocessable(
            "Quiz has no questions yet".to_string(),
        ));
    }

    if !scope_side_admits(student.module_id, quiz.module_id) {
        return Err(AppError::Forbidden(
            "Quiz not allowed for your module".to_string(),
        ));
    }
    if !scope_side_admits(student.group_id, quiz.group_id) {
        return Err(AppError::Forbidden(
            "Quiz not allowed for your group".to_string(),
        ));
    }

    if let Some(existing) = fetch_open_attempt(&pool, quiz.id, student.id).await? {
        let view = attempt_view(&pool, &quiz, existing).await?;
        return Ok(Json(view));
    }

    let insert_query = format!(
        r#"
        INSERT INTO quiz_attempts (quiz_id, student_id, started_at)
        VALUES ($1, $2, $3)
        RETURNING {}
        "#,
        ATTEMPT_COLUMNS
    );
    let inserted = sqlx::query_as::<_, QuizAttempt>(&insert_query)
        .bind(quiz.id)
        .bind(student.id)
        .bind(Utc::now())
        .fetch_one(&pool)
        .await;

    let attempt = match inserted {
        Ok(attempt) => attempt,
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            // Lost the race against a concurrent start: the partial unique
            // index admitted exactly one open row. Return that one.
            fetch_latest_attempt(&pool, quiz.id, student.id)
                .await?
                .ok_or(AppError::InternalServerError(
                    "Open attempt vanished after unique violation".to_string(),
                ))?
        }
        Err(e) => return Err(e.into()),
    };

    let view = attempt_view(&pool, &quiz, attempt).await?;
    Ok(Json(view))
}

/// Shows one attempt, with graded answers once submitted.
/// Only the owning student may read it.
pub async fn show_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student = current_user(&pool, &claims).await?;
    let attempt = load_attempt(&pool, attempt_id).await?;

    if attempt.student_id != student.id {
        return Err(AppError::Forbidden("Forbidden".to_string()));
    }

    let quiz = load_quiz(&pool, attempt.quiz_id).await?;
    let view = attempt_view(&pool, &quiz, attempt).await?;
    Ok(Json(view))
}

/// Grades and finalizes an open attempt, exactly once.
///
/// The CAS on `submitted_at` decides the winner under concurrent submits;
/// answer rows are cleared and rewritten inside the same transaction, so a
/// partially-written answer set is never observable.
pub async fn submit_attempt(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<i64>,
    Json(payload): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let student = current_user(&pool, &claims).await?;
    let attempt = load_attempt(&pool, attempt_id).await?;

    if attempt.student_id != student.id {
        return Err(AppError::Forbidden("Forbidden".to_string()));
    }

    if attempt.submitted_at.is_some() {
        return Err(AppError::Unprocessable(
            "Attempt already submitted".to_string(),
        ));
    }

    // Authoritative answer key, independent of what the client rendered.
    let questions = sqlx::query_as::<_, Question>(
        "SELECT id, quiz_id, statement, points FROM questions WHERE quiz_id = $1 ORDER BY id",
    )
    .bind(attempt.quiz_id)
    .fetch_all(&pool)
    .await?;

    let choices = sqlx::query_as::<_, Choice>(
        r#"
        SELECT c.id, c.question_id, c.label, c.is_correct
        FROM choices c
        JOIN questions q ON c.question_id = q.id
        WHERE q.quiz_id = $1
        "#,
    )
    .bind(attempt.quiz_id)
    .fetch_all(&pool)
    .await?;

    let (score, max_score, graded) = grade_attempt(&questions, &choices, &payload.answers);

    let mut tx = pool.begin().await?;

    let finalized = sqlx::query(
        r#"
        UPDATE quiz_attempts
        SET submitted_at = $1, score = $2, max_score = $3
        WHERE id = $4 AND submitted_at IS NULL
        "#,
    )
    .bind(Utc::now())
    .bind(score)
    .bind(max_score)
    .bind(attempt.id)
    .execute(&mut *tx)
    .await?;

    if finalized.rows_affected() == 0 {
        // A concurrent submit won the CAS.
        tx.rollback().await?;
        return Err(AppError::Unprocessable(
            "Attempt already submitted".to_string(),
        ));
    }

    // Clear-then-insert tolerates a retried request that raced ahead of the
    // submitted_at guard; it is invisible outside the transaction.
    sqlx::query("DELETE FROM attempt_answers WHERE quiz_attempt_id = $1")
        .bind(attempt.id)
        .execute(&mut *tx)
        .await?;

    for row in &graded {
        sqlx::query(
            r#"
            INSERT INTO attempt_answers (quiz_attempt_id, question_id, choice_id, is_correct, points_earned)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(attempt.id)
        .bind(row.question_id)
        .bind(row.choice_id)
        .bind(row.is_correct)
        .bind(row.points_earned)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(Json(json!({
        "attempt_id": attempt.id,
        "score": score,
        "max_score": max_score,
    })))
}

async fn load_attempt(pool: &PgPool, attempt_id: i64) -> Result<QuizAttempt, AppError> {
    let query = format!(
        "SELECT {} FROM quiz_attempts WHERE id = $1",
        ATTEMPT_COLUMNS
    );
    sqlx::query_as::<_, QuizAttempt>(&query)
        .bind(attempt_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Attempt not found".to_string()))
}

async fn fetch_open_attempt(
    pool: &PgPool,
    quiz_id: i64,
    student_id: i64,
) -> Result<Option<QuizAttempt>, AppError> {
    let query = format!(
        r#"
        SELECT {}
        FROM quiz_attempts
        WHERE quiz_id = $1 AND student_id = $2 AND submitted_at IS NULL
        ORDER BY id DESC
        LIMIT 1
        "#,
        ATTEMPT_COLUMNS
    );
    Ok(sqlx::query_as::<_, QuizAttempt>(&query)
        .bind(quiz_id)
        .bind(student_id)
        .fetch_optional(pool)
        .await?)
}

async fn fetch_latest_attempt(
    pool: &PgPool,
    quiz_id: i64,
    student_id: i64,
) -> Result<Option<QuizAttempt>, AppError> {
    let query = format!(
        r#"
        SELECT {}
        FROM quiz_attempts
        WHERE quiz_id = $1 AND student_id = $2
        ORDER BY id DESC
        LIMIT 1
        "#,
        ATTEMPT_COLUMNS
    );
    Ok(sqlx::query_as::<_, QuizAttempt>(&query)
        .bind(quiz_id)
        .bind(student_id)
        .fetch_optional(pool)
        .await?)
}

/// Assembles the student-facing attempt payload: quiz summary, questions
/// with answer-key-free choices, and the graded answer rows once submitted.
/// `is_correct` never appears on a choice here.
async fn attempt_view(
    pool: &PgPool,
    quiz: &Quiz,
    attempt: QuizAttempt,
) -> Result<AttemptView, AppError> {
    let questions = sqlx::query_as::<_, Question>(
        "SELECT id, quiz_id, statement, points FROM questions WHERE quiz_id = $1 ORDER BY id",
    )
    .bind(quiz.id)
    .fetch_all(pool)
    .await?;

    let choices = sqlx::query_as::<_, PublicChoice>(
        r#"
        SELECT c.id, c.question_id, c.label
        FROM choices c
        JOIN questions q ON c.question_id = q.id
        WHERE q.quiz_id = $1
        ORDER BY c.id
        "#,
    )
    .bind(quiz.id)
    .fetch_all(pool)
    .await?;

    let mut choices_by_question: std::collections::HashMap<i64, Vec<PublicChoice>> =
        std::collections::HashMap::new();
    for choice in choices {
        choices_by_question
            .entry(choice.question_id)
            .or_default()
            .push(choice);
    }

    let questions = questions
        .into_iter()
        .map(|q| PublicQuestion {
            id: q.id,
            quiz_id: q.quiz_id,
            statement: q.statement,
            points: q.points,
            choices: choices_by_question.remove(&q.id).unwrap_or_default(),
        })
        .collect();

    let answers = if attempt.submitted_at.is_some() {
        let rows = sqlx::query_as::<_, AttemptAnswer>(
            r#"
            SELECT id, quiz_attempt_id, question_id, choice_id, is_correct, points_earned
            FROM attempt_answers
            WHERE quiz_attempt_id = $1
            ORDER BY question_id
            "#,
        )
        .bind(attempt.id)
        .fetch_all(pool)
        .await?;
        Some(rows)
    } else {
        None
    };

    Ok(AttemptView {
        id: attempt.id,
        quiz_id: attempt.quiz_id,
        student_id: attempt.student_id,
        started_at: attempt.started_at,
        submitted_at: attempt.submitted_at,
        score: attempt.score,
        max_score: attempt.max_score,
        quiz: QuizSummary::from(quiz),
        questions,
        answers,
    })
}
