// src/access.rs

//! Authorization predicates for the quiz surface.
//!
//! Role checks live here instead of being re-derived inline at each call
//! site. Handlers translate a `false` into the appropriate `Forbidden`
//! response.

use crate::models::{
    quiz::Quiz,
    user::{Role, User},
};

/// Whether a user may manage (show/update/delete/extend/assign) a quiz.
/// Admins manage everything; teachers manage their own quizzes.
pub fn can_manage_quiz(user: &User, quiz: &Quiz) -> bool {
    user.role == Role::Admin || quiz.teacher_id == user.id
}

/// Whether a teacher may target a student with an assignment.
///
/// Admins target anyone. A teacher's module/group, when set, must match the
/// student's; an unset side does not constrain.
pub fn can_target_student(teacher: &User, student: &User) -> bool {
    if teacher.role == Role::Admin {
        return true;
    }
    let module_ok = teacher.module_id.is_none() || teacher.module_id == student.module_id;
    let group_ok = teacher.group_id.is_none() || teacher.group_id == student.group_id;
    module_ok && group_ok
}

/// Whether one side of a scope (module or group) admits starting an attempt.
///
/// Only a conflict between two set values blocks: a student with no scope may
/// start a scoped quiz, and a quiz with no scope admits everyone. This is
/// deliberately more permissive than the listing predicate, which also hides
/// scoped quizzes from unscoped students.
pub fn scope_side_admits(student_side: Option<i64>, quiz_side: Option<i64>) -> bool {
    match (student_side, quiz_side) {
        (Some(s), Some(q)) => s == q,
        _ => true,
    }
}
