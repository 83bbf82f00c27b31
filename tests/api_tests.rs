// tests/api_tests.rs

mod common;

use common::*;

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let Some((address, _pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn ping_works() {
    let Some((address, _pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/ping", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "API OK");
}

#[tokio::test]
async fn register_and_login_works() {
    let Some((address, _pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let email = format!("student-{}@example.com", uuid::Uuid::new_v4());

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "name": "Some Student",
            "email": email,
            "password": "password123",
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 201);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["role"], "student");
    assert!(body.get("password").is_none());

    // Self-registered accounts can log straight in.
    let token = login(&client, &address, &email, "password123").await;

    let me: serde_json::Value = client
        .get(format!("{}/api/me", address))
        .header("Authorization", bearer(&token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["email"], email);
    assert_eq!(me["role"], "student");
}

#[tokio::test]
async fn register_fails_validation() {
    let Some((address, _pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({
            "name": "Bad Email",
            "email": "not-an-email",
            "password": "password123",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn register_duplicate_email_conflicts() {
    let Some((address, _pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let email = format!("dup-{}@example.com", uuid::Uuid::new_v4());
    let payload = serde_json::json!({
        "name": "First",
        "email": email,
        "password": "password123",
    });

    let first = client
        .post(format!("{}/api/auth/register", address))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 201);

    let second = client
        .post(format!("{}/api/auth/register", address))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 409);
}

#[tokio::test]
async fn admin_manages_users() {
    let Some((address, pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let (module_id, group_id) = seed_module_group(&pool).await;
    let (admin_id, admin_email, admin_password) = seed_user(&pool, "admin", None, None).await;
    let token = login(&client, &address, &admin_email, &admin_password).await;

    // Create a teacher with scope
    let teacher_email = format!("teacher-{}@example.com", uuid::Uuid::new_v4());
    let created = client
        .post(format!("{}/api/admin/users", address))
        .header("Authorization", bearer(&token))
        .json(&serde_json::json!({
            "name": "New Teacher",
            "email": teacher_email,
            "password": "password123",
            "role": "teacher",
            "module_id": module_id,
            "group_id": group_id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status().as_u16(), 201);
    let created: serde_json::Value = created.json().await.unwrap();
    let teacher_id = created["id"].as_i64().unwrap();
    assert_eq!(created["role"], "teacher");
    assert_eq!(created["module_id"].as_i64(), Some(module_id));

    // Duplicate email conflicts
    let duplicate = client
        .post(format!("{}/api/admin/users", address))
        .header("Authorization", bearer(&token))
        .json(&serde_json::json!({
            "name": "Someone Else",
            "email": teacher_email,
            "password": "password123",
            "role": "student",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate.status().as_u16(), 409);

    // A dangling module reference is rejected
    let bad_fk = client
        .post(format!("{}/api/admin/users", address))
        .header("Authorization", bearer(&token))
        .json(&serde_json::json!({
            "name": "Ghost Module",
            "email": format!("ghost-{}@example.com", uuid::Uuid::new_v4()),
            "password": "password123",
            "role": "student",
            "module_id": 999_999_999,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_fk.status().as_u16(), 422);

    // Partial update
    let updated = client
        .put(format!("{}/api/admin/users/{}", address, teacher_id))
        .header("Authorization", bearer(&token))
        .json(&serde_json::json!({"name": "Renamed Teacher", "password": ""}))
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status().as_u16(), 200);
    let updated: serde_json::Value = updated.json().await.unwrap();
    assert_eq!(updated["name"], "Renamed Teacher");

    // The empty password above did not overwrite the stored hash.
    login(&client, &address, &teacher_email, "password123").await;

    // Admins cannot delete themselves
    let self_delete = client
        .delete(format!("{}/api/admin/users/{}", address, admin_id))
        .header("Authorization", bearer(&token))
        .send()
        .await
        .unwrap();
    assert_eq!(self_delete.status().as_u16(), 422);

    // The admin survives and still authenticates
    login(&client, &address, &admin_email, &admin_password).await;

    // Deleting the teacher works
    let deleted = client
        .delete(format!("{}/api/admin/users/{}", address, teacher_id))
        .header("Authorization", bearer(&token))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 200);
    let deleted: serde_json::Value = deleted.json().await.unwrap();
    assert_eq!(deleted["deleted"], true);
}

#[tokio::test]
async fn admin_routes_require_admin_role() {
    let Some((address, pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let (_id, email, password) = seed_user(&pool, "student", None, None).await;
    let token = login(&client, &address, &email, &password).await;

    let response = client
        .get(format!("{}/api/admin/users", address))
        .header("Authorization", bearer(&token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let anonymous = client
        .get(format!("{}/api/admin/users", address))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status().as_u16(), 401);
}

#[tokio::test]
async fn teacher_quiz_crud() {
    let Some((address, pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let (module_id, group_id) = seed_module_group(&pool).await;
    let (_id, email, password) = seed_user(&pool, "teacher", Some(module_id), Some(group_id)).await;
    let token = login(&client, &address, &email, &password).await;

    // The quiz inherits the teacher's scope verbatim.
    let quiz = api_create_quiz(&client, &address, &token, "Unit 1 Checkpoint", false).await;
    let quiz_id = quiz["id"].as_i64().unwrap();
    assert_eq!(quiz["module_id"].as_i64(), Some(module_id));
    assert_eq!(quiz["group_id"].as_i64(), Some(group_id));
    assert_eq!(quiz["is_published"], false);

    // Partial update touches title/duration/publish only.
    let updated = client
        .put(format!("{}/api/teacher/quizzes/{}", address, quiz_id))
        .header("Authorization", bearer(&token))
        .json(&serde_json::json!({"is_published": true}))
        .send()
        .await
        .unwrap();
    assert_eq!(updated.status().as_u16(), 200);
    let updated: serde_json::Value = updated.json().await.unwrap();
    assert_eq!(updated["is_published"], true);
    assert_eq!(updated["title"], "Unit 1 Checkpoint");

    // Add a question; the teacher-side view carries the answer key.
    let question = api_add_question(
        &client,
        &address,
        &token,
        quiz_id,
        "What is 2 + 2?",
        2,
        &["3", "4", "5"],
        1,
    )
    .await;
    assert_eq!(question["choices"].as_array().unwrap().len(), 3);
    assert_eq!(question["choices"][1]["is_correct"], true);
    assert_eq!(question["choices"][0]["is_correct"], false);

    // Choice count is constrained to 3..=4.
    let too_few = client
        .post(format!("{}/api/teacher/quizzes/{}/questions", address, quiz_id))
        .header("Authorization", bearer(&token))
        .json(&serde_json::json!({
            "statement": "Short one?",
            "choices": [{"label": "a"}, {"label": "b"}],
            "correct_index": 0,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(too_few.status().as_u16(), 400);

    // correct_index must land inside the choice list.
    let bad_index = client
        .post(format!("{}/api/teacher/quizzes/{}/questions", address, quiz_id))
        .header("Authorization", bearer(&token))
        .json(&serde_json::json!({
            "statement": "Out of range?",
            "choices": [{"label": "a"}, {"label": "b"}, {"label": "c"}],
            "correct_index": 3,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_index.status().as_u16(), 400);

    // Show includes nested questions and choices.
    let shown: serde_json::Value = client
        .get(format!("{}/api/teacher/quizzes/{}", address, quiz_id))
        .header("Authorization", bearer(&token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(shown["questions"].as_array().unwrap().len(), 1);

    // A different teacher cannot manage this quiz.
    let (other_module, other_group) = seed_module_group(&pool).await;
    let (_oid, other_email, other_password) =
        seed_user(&pool, "teacher", Some(other_module), Some(other_group)).await;
    let other_token = login(&client, &address, &other_email, &other_password).await;
    let foreign = client
        .get(format!("{}/api/teacher/quizzes/{}", address, quiz_id))
        .header("Authorization", bearer(&other_token))
        .send()
        .await
        .unwrap();
    assert_eq!(foreign.status().as_u16(), 403);

    // Delete, then the quiz is gone.
    let deleted: serde_json::Value = client
        .delete(format!("{}/api/teacher/quizzes/{}", address, quiz_id))
        .header("Authorization", bearer(&token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(deleted["deleted"], true);

    let gone = client
        .get(format!("{}/api/teacher/quizzes/{}", address, quiz_id))
        .header("Authorization", bearer(&token))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status().as_u16(), 404);
}

#[tokio::test]
async fn teacher_without_scope_cannot_create_quiz() {
    let Some((address, pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let (_id, email, password) = seed_user(&pool, "teacher", None, None).await;
    let token = login(&client, &address, &email, &password).await;

    let response = client
        .post(format!("{}/api/teacher/quizzes", address))
        .header("Authorization", bearer(&token))
        .json(&serde_json::json!({"title": "No Scope", "duration_minutes": 10}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn assignment_flow() {
    let Some((address, pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let (module_id, group_id) = seed_module_group(&pool).await;
    let (teacher_id, email, password) =
        seed_user(&pool, "teacher", Some(module_id), Some(group_id)).await;
    let token = login(&client, &address, &email, &password).await;

    let quiz = api_create_quiz(&client, &address, &token, "Assignable", true).await;
    let quiz_id = quiz["id"].as_i64().unwrap();
    let assign_url = format!("{}/api/teacher/quizzes/{}/assign", address, quiz_id);

    // At least one target is required.
    let empty = client
        .post(&assign_url)
        .header("Authorization", bearer(&token))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status().as_u16(), 422);

    // In-scope student target works, and re-assigning is absorbed.
    let (student_id, _e, _p) =
        seed_user(&pool, "student", Some(module_id), Some(group_id)).await;
    for _ in 0..2 {
        let assigned = client
            .post(&assign_url)
            .header("Authorization", bearer(&token))
            .json(&serde_json::json!({"student_id": student_id}))
            .send()
            .await
            .unwrap();
        assert_eq!(assigned.status().as_u16(), 200);
    }

    let assignments: Vec<serde_json::Value> = client
        .get(format!("{}/api/teacher/quizzes/{}/assignments", address, quiz_id))
        .header("Authorization", bearer(&token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(assignments.len(), 1);
    let assignment_id = assignments[0]["id"].as_i64().unwrap();

    // A student outside the teacher's module is off limits.
    let (other_module, other_group) = seed_module_group(&pool).await;
    let (outside_id, _e, _p) =
        seed_user(&pool, "student", Some(other_module), Some(other_group)).await;
    let forbidden = client
        .post(&assign_url)
        .header("Authorization", bearer(&token))
        .json(&serde_json::json!({"student_id": outside_id}))
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status().as_u16(), 403);

    // A non-student target is rejected.
    let not_student = client
        .post(&assign_url)
        .header("Authorization", bearer(&token))
        .json(&serde_json::json!({"student_id": teacher_id}))
        .send()
        .await
        .unwrap();
    assert_eq!(not_student.status().as_u16(), 422);

    // Module-wide grant is a separate row.
    let module_wide = client
        .post(&assign_url)
        .header("Authorization", bearer(&token))
        .json(&serde_json::json!({"module_id": module_id}))
        .send()
        .await
        .unwrap();
    assert_eq!(module_wide.status().as_u16(), 200);

    // Unassigning through the wrong quiz fails.
    let other_quiz = api_create_quiz(&client, &address, &token, "Other", true).await;
    let mismatch = client
        .delete(format!(
            "{}/api/teacher/quizzes/{}/assignments/{}",
            address,
            other_quiz["id"].as_i64().unwrap(),
            assignment_id
        ))
        .header("Authorization", bearer(&token))
        .send()
        .await
        .unwrap();
    assert_eq!(mismatch.status().as_u16(), 422);

    // Unassigning through the right quiz removes the row.
    let removed: serde_json::Value = client
        .delete(format!(
            "{}/api/teacher/quizzes/{}/assignments/{}",
            address, quiz_id, assignment_id
        ))
        .header("Authorization", bearer(&token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(removed["deleted"], true);

    let remaining: Vec<serde_json::Value> = client
        .get(format!("{}/api/teacher/quizzes/{}/assignments", address, quiz_id))
        .header("Authorization", bearer(&token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
}

#[tokio::test]
async fn students_listing_is_scoped_to_teacher() {
    let Some((address, pool)) = spawn_app().await else {
        return;
    };
    let client = reqwest::Client::new();
    let (module_id, group_id) = seed_module_group(&pool).await;
    let (other_module, other_group) = seed_module_group(&pool).await;

    let (_tid, email, password) =
        seed_user(&pool, "teacher", Some(module_id), Some(group_id)).await;
    let (inside_id, _e1, _p1) =
        seed_user(&pool, "student", Some(module_id), Some(group_id)).await;
    let (outside_id, _e2, _p2) =
        seed_user(&pool, "student", Some(other_module), Some(other_group)).await;

    let token = login(&client, &address, &email, &password).await;
    let students: Vec<serde_json::Value> = client
        .get(format!("{}/api/teacher/students", address))
        .header("Authorization", bearer(&token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let ids: Vec<i64> = students.iter().map(|s| s["id"].as_i64().unwrap()).collect();
    assert!(ids.contains(&inside_id));
    assert!(!ids.contains(&outside_id));

    // Admins see every student.
    let (_aid, admin_email, admin_password) = seed_user(&pool, "admin", None, None).await;
    let admin_token = login(&client, &address, &admin_email, &admin_password).await;
    let all_students: Vec<serde_json::Value> = client
        .get(format!("{}/api/teacher/students", address))
        .header("Authorization", bearer(&admin_token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let all_ids: Vec<i64> = all_students
        .iter()
        .map(|s| s["id"].as_i64().unwrap())
        .collect();
    assert!(all_ids.contains(&inside_id));
    assert!(all_ids.contains(&outside_id));
}
