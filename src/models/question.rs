// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,
    pub statement: String,
    pub points: i32,
}

/// Represents the 'choices' table in the database.
/// This is the answer-key-bearing form; it only ever travels to teachers
/// and to the grading path.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Choice {
    pub id: i64,
    pub question_id: i64,
    pub label: String,
    pub is_correct: bool,
}

/// Choice as exposed to a student during an attempt. No `is_correct`.
#[derive(Debug, Serialize, FromRow)]
pub struct PublicChoice {
    pub id: i64,
    pub question_id: i64,
    pub label: String,
}

/// Question with its choices, answer key included (teacher-side view).
#[derive(Debug, Serialize)]
pub struct QuestionWithChoices {
    pub id: i64,
    pub quiz_id: i64,
    pub statement: String,
    pub points: i32,
    pub choices: Vec<Choice>,
}

/// Question with answer-key-free choices (student-side view).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub quiz_id: i64,
    pub statement: String,
    pub points: i32,
    pub choices: Vec<PublicChoice>,
}

/// One choice in an add-question payload.
#[derive(Debug, Deserialize, Serialize)]
pub struct ChoiceInput {
    pub label: String,
}

/// DTO for adding a question to a quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 2000, message = "Statement must not be empty."))]
    pub statement: String,
    #[validate(range(min = 1, max = 100, message = "Points must be 1 to 100."))]
    pub points: Option<i32>,
    #[validate(custom(function = validate_choices))]
    pub choices: Vec<ChoiceInput>,
    /// Index into `choices` of the single correct one.
    pub correct_index: usize,
}

fn validate_choices(choices: &[ChoiceInput]) -> Result<(), validator::ValidationError> {
    if !(3..=4).contains(&choices.len()) {
        return Err(validator::ValidationError::new("choices_must_be_3_or_4"));
    }
    for c in choices {
        if c.label.is_empty() || c.label.len() > 255 {
            return Err(validator::ValidationError::new("choice_label_length"));
        }
    }
    Ok(())
}
