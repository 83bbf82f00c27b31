// src/handlers/teacher.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    access::{can_manage_quiz, can_target_student},
    error::AppError,
    models::{
        assignment::{AssignRequest, QuizAssignment},
        question::{Choice, CreateQuestionRequest, Question, QuestionWithChoices},
        quiz::{CreateQuizRequest, Quiz, UpdateQuizRequest},
        user::{Role, User, UserResponse},
    },
    utils::{html::clean_html, jwt::Claims},
};

use super::{QUIZ_COLUMNS, USER_COLUMNS, current_user, load_quiz};

/// Loads a quiz and enforces the ownership rule: admins manage everything,
/// teachers only their own quizzes.
async fn load_managed_quiz(pool: &PgPool, user: &User, quiz_id: i64) -> Result<Quiz, AppError> {
    let quiz = load_quiz(pool, quiz_id).await?;
    if !can_manage_quiz(user, &quiz) {
        return Err(AppError::Forbidden("Forbidden".to_string()));
    }
    Ok(quiz)
}

/// Lists quizzes owned by the calling teacher, newest first.
pub async fn list_quizzes(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let query = format!(
        "SELECT {} FROM quizzes WHERE teacher_id = $1 ORDER BY created_at DESC, id DESC",
        QUIZ_COLUMNS
    );
    let quizzes = sqlx::query_as::<_, Quiz>(&query)
        .bind(claims.user_id())
        .fetch_all(&pool)
        .await?;

    Ok(Json(quizzes))
}

/// Creates a quiz inside the calling teacher's own module/group.
///
/// The scope is inherited verbatim from the teacher's profile; a teacher
/// without both module and group set cannot author quizzes.
pub async fn create_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = current_user(&pool, &claims).await?;

    let (Some(module_id), Some(group_id)) = (user.module_id, user.group_id) else {
        return Err(AppError::Unprocessable(
            "Teacher must have module_id and group_id set before creating quizzes".to_string(),
        ));
    };

    let query = format!(
        r#"
        INSERT INTO quizzes (title, duration_minutes, module_id, group_id, teacher_id, is_published)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {}
        "#,
        QUIZ_COLUMNS
    );
    let quiz = sqlx::query_as::<_, Quiz>(&query)
        .bind(clean_html(&payload.title))
        .bind(payload.duration_minutes)
        .bind(module_id)
        .bind(group_id)
        .bind(user.id)
        .bind(payload.is_published.unwrap_or(false))
        .fetch_one(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create quiz: {:?}", e);
            AppError::from(e)
        })?;

    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Shows one quiz with its questions and choices, answer key included.
/// Owner or admin only.
pub async fn show_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(&pool, &claims).await?;
    let quiz = load_managed_quiz(&pool, &user, quiz_id).await?;

    let questions = load_questions_with_choices(&pool, quiz.id).await?;

    let mut body = serde_json::to_value(&quiz)?;
    body["questions"] = serde_json::to_value(&questions)?;

    Ok(Json(body))
}

/// Updates title, duration and publish flag. Module/group scope is immutable
/// once the quiz exists.
pub async fn update_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = current_user(&pool, &claims).await?;
    let quiz = load_managed_quiz(&pool, &user, quiz_id).await?;

    if payload.title.is_none()
        && payload.duration_minutes.is_none()
        && payload.is_published.is_none()
    {
        return Ok(Json(quiz));
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE quizzes SET ");
    let mut separated = builder.separated(", ");

    if let Some(title) = payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(clean_html(&title));
    }

    if let Some(duration_minutes) = payload.duration_minutes {
        separated.push("duration_minutes = ");
        separated.push_bind_unseparated(duration_minutes);
    }

    if let Some(is_published) = payload.is_published {
        separated.push("is_published = ");
        separated.push_bind_unseparated(is_published);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(quiz.id);

    builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update quiz: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let updated = load_quiz(&pool, quiz.id).await?;
    Ok(Json(updated))
}

/// Deletes a quiz and, by cascade, its questions, choices, attempts and
/// assignments. Owner or admin only.
pub async fn delete_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(&pool, &claims).await?;
    let quiz = load_managed_quiz(&pool, &user, quiz_id).await?;

    sqlx::query("DELETE FROM quizzes WHERE id = $1")
        .bind(quiz.id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete quiz: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(json!({"deleted": true})))
}

/// Adds a question with its 3 or 4 choices, exactly one of them correct.
/// Owner or admin only.
pub async fn add_question(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if payload.correct_index >= payload.choices.len() {
        return Err(AppError::BadRequest(
            "correct_index must reference one of the choices".to_string(),
        ));
    }

    let user = current_user(&pool, &claims).await?;
    let quiz = load_managed_quiz(&pool, &user, quiz_id).await?;

    // Question and choices land atomically; a half-written question would be
    // gradable as "no correct choice".
    let mut tx = pool.begin().await?;

    let question = sqlx::query_as::<_, Question>(
        r#"
        INSERT INTO questions (quiz_id, statement, points)
        VALUES ($1, $2, $3)
        RETURNING id, quiz_id, statement, points
        "#,
    )
    .bind(quiz.id)
    .bind(clean_html(&payload.statement))
    .bind(payload.points.unwrap_or(1))
    .fetch_one(&mut *tx)
    .await?;

    let mut choices = Vec::with_capacity(payload.choices.len());
    for (i, choice) in payload.choices.iter().enumerate() {
        let row = sqlx::query_as::<_, Choice>(
            r#"
            INSERT INTO choices (question_id, label, is_correct)
            VALUES ($1, $2, $3)
            RETURNING id, question_id, label, is_correct
            "#,
        )
        .bind(question.id)
        .bind(clean_html(&choice.label))
        .bind(i == payload.correct_index)
        .fetch_one(&mut *tx)
        .await?;
        choices.push(row);
    }

    tx.commit().await?;

    let response = QuestionWithChoices {
        id: question.id,
        quiz_id: question.quiz_id,
        statement: question.statement,
        points: question.points,
        choices,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Lists students the calling teacher may target with assignments.
/// Admins see every student; teachers only those inside their module/group.
pub async fn list_students(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(&pool, &claims).await?;

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT id, name, email, role, module_id, group_id, created_at \
         FROM users WHERE role = 'student'",
    );

    if user.role != Role::Admin {
        if let Some(module_id) = user.module_id {
            builder.push(" AND module_id = ");
            builder.push_bind(module_id);
        }
        if let Some(group_id) = user.group_id {
            builder.push(" AND group_id = ");
            builder.push_bind(group_id);
        }
    }

    builder.push(" ORDER BY name");

    let students: Vec<UserResponse> = builder.build_query_as().fetch_all(&pool).await?;

    Ok(Json(students))
}

/// Grants a quiz to a module, a group, or a single student.
///
/// Requires at least one target. A student target must actually be a student
/// and be inside the calling teacher's scope. Duplicate grants are absorbed
/// (create-if-absent on the 4-tuple).
pub async fn assign(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<AssignRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(&pool, &claims).await?;
    let quiz = load_managed_quiz(&pool, &user, quiz_id).await?;

    if payload.module_id.is_none() && payload.group_id.is_none() && payload.student_id.is_none() {
        return Err(AppError::Unprocessable(
            "You must assign to module, group, or student".to_string(),
        ));
    }

    if let Some(student_id) = payload.student_id {
        let query = format!(
            "SELECT {} FROM users WHERE id = $1 AND role = 'student'",
            USER_COLUMNS
        );
        let student = sqlx::query_as::<_, User>(&query)
            .bind(student_id)
            .fetch_optional(&pool)
            .await?
            .ok_or(AppError::Unprocessable(
                "student_id must be a student user".to_string(),
            ))?;

        if !can_target_student(&user, &student) {
            return Err(AppError::Forbidden(
                "Student not in your module/group".to_string(),
            ));
        }
    }

    sqlx::query(
        r#"
        INSERT INTO quiz_assignments (quiz_id, module_id, group_id, student_id)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(quiz.id)
    .bind(payload.module_id)
    .bind(payload.group_id)
    .bind(payload.student_id)
    .execute(&pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            AppError::Unprocessable("Assignment target does not exist".to_string())
        }
        _ => {
            tracing::error!("Failed to create assignment: {:?}", e);
            AppError::from(e)
        }
    })?;

    Ok(Json(json!({"message": "Quiz assigned successfully"})))
}

/// Lists the explicit grants of one quiz, newest first.
/// Owner or admin only.
pub async fn list_assignments(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(&pool, &claims).await?;
    let quiz = load_managed_quiz(&pool, &user, quiz_id).await?;

    let assignments = sqlx::query_as::<_, QuizAssignment>(
        "SELECT id, quiz_id, module_id, group_id, student_id, created_at \
         FROM quiz_assignments WHERE quiz_id = $1 ORDER BY id DESC",
    )
    .bind(quiz.id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(assignments))
}

/// Removes one grant. The assignment must belong to the addressed quiz.
/// Owner or admin only.
pub async fn unassign(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path((quiz_id, assignment_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let user = current_user(&pool, &claims).await?;
    let quiz = load_managed_quiz(&pool, &user, quiz_id).await?;

    let assignment = sqlx::query_as::<_, QuizAssignment>(
        "SELECT id, quiz_id, module_id, group_id, student_id, created_at \
         FROM quiz_assignments WHERE id = $1",
    )
    .bind(assignment_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Assignment not found".to_string()))?;

    if assignment.quiz_id != quiz.id {
        return Err(AppError::Unprocessable(
            "Assignment does not belong to this quiz".to_string(),
        ));
    }

    sqlx::query("DELETE FROM quiz_assignments WHERE id = $1")
        .bind(assignment.id)
        .execute(&pool)
        .await?;

    Ok(Json(json!({"deleted": true})))
}

async fn load_questions_with_choices(
    pool: &PgPool,
    quiz_id: i64,
) -> Result<Vec<QuestionWithChoices>, AppError> {
    let questions = sqlx::query_as::<_, Question>(
        "SELECT id, quiz_id, statement, points FROM questions WHERE quiz_id = $1 ORDER BY id",
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await?;

    let choices = sqlx::query_as::<_, Choice>(
        r#"
        SELECT c.id, c.question_id, c.label, c.is_correct
        FROM choices c
        JOIN questions q ON c.question_id = q.id
        WHERE q.quiz_id = $1
        ORDER BY c.id
        "#,
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await?;

    Ok(questions
        .into_iter()
        .map(|q| {
            let question_choices = choices
                .iter()
                .filter(|c| c.question_id == q.id)
                .cloned()
                .collect();
            QuestionWithChoices {
                id: q.id,
                quiz_id: q.quiz_id,
                statement: q.statement,
                points: q.points,
                choices: question_choices,
            }
        })
        .collect())
}
