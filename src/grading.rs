// src/grading.rs

//! Deterministic grading of a submitted answer set against a quiz's
//! authoritative answer key. Pure: the caller loads the key and persists the
//! result.

use std::collections::HashMap;

use crate::models::{
    attempt::AnswerInput,
    question::{Choice, Question},
};

/// One graded answer row, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedAnswer {
    pub question_id: i64,
    pub choice_id: Option<i64>,
    pub is_correct: bool,
    pub points_earned: i32,
}

/// Grade a submitted answer set.
///
/// `max_score` counts every question of the quiz, answered or not. Two
/// tolerances for client-side drift: an unknown question id is skipped, and a
/// choice id that does not belong to its question counts as no answer. A
/// question submitted twice keeps the last entry. Questions never submitted
/// produce no row.
pub fn grade_attempt(
    questions: &[Question],
    choices: &[Choice],
    answers: &[AnswerInput],
) -> (i32, i32, Vec<GradedAnswer>) {
    let max_score: i32 = questions.iter().map(|q| q.points).sum();

    let question_map: HashMap<i64, &Question> = questions.iter().map(|q| (q.id, q)).collect();

    let mut graded: Vec<GradedAnswer> = Vec::new();
    let mut row_by_question: HashMap<i64, usize> = HashMap::new();

    for answer in answers {
        let Some(question) = question_map.get(&answer.question_id) else {
            continue;
        };

        let choice = answer.choice_id.and_then(|choice_id| {
            choices
                .iter()
                .find(|c| c.id == choice_id && c.question_id == question.id)
        });

        let is_correct = choice.is_some_and(|c| c.is_correct);
        let points_earned = if is_correct { question.points } else { 0 };

        let row = GradedAnswer {
            question_id: question.id,
            choice_id: choice.map(|c| c.id),
            is_correct,
            points_earned,
        };

        match row_by_question.get(&question.id) {
            Some(&i) => graded[i] = row,
            None => {
                row_by_question.insert(question.id, graded.len());
                graded.push(row);
            }
        }
    }

    let score = graded.iter().map(|g| g.points_earned).sum();
    (score, max_score, graded)
}
