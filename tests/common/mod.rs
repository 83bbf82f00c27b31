// tests/common/mod.rs

#![allow(dead_code)]

use quizboard::{config::Config, routes, state::AppState, utils::hash::hash_password};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use uuid::Uuid;

/// Spawns the app on a random port and returns (base_url, pool).
///
/// Returns None when DATABASE_URL is not set, so DB-backed tests degrade to
/// a skip instead of failing on machines without Postgres.
pub async fn spawn_app() -> Option<(String, PgPool)> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping DB-backed test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: database_url.clone(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        admin_email: None,
        admin_password: None,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    Some((address, pool))
}

/// Inserts a module plus one group and returns their ids.
pub async fn seed_module_group(pool: &PgPool) -> (i64, i64) {
    let name = format!("Module {}", Uuid::new_v4());
    let module_id: i64 = sqlx::query_scalar("INSERT INTO modules (name) VALUES ($1) RETURNING id")
        .bind(&name)
        .fetch_one(pool)
        .await
        .unwrap();
    let group_id: i64 =
        sqlx::query_scalar("INSERT INTO groups (name, module_id) VALUES ('Group A', $1) RETURNING id")
            .bind(module_id)
            .fetch_one(pool)
            .await
            .unwrap();
    (module_id, group_id)
}

/// Inserts a user with the given role and scope. Returns (id, email, password).
pub async fn seed_user(
    pool: &PgPool,
    role: &str,
    module_id: Option<i64>,
    group_id: Option<i64>,
) -> (i64, String, String) {
    let email = format!("{}-{}@example.com", role, Uuid::new_v4());
    let password = "password123".to_string();
    let hash = hash_password(&password).unwrap();
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO users (name, email, password, role, module_id, group_id)
        VALUES ($1, $2, $3, $4::user_role, $5, $6)
        RETURNING id
        "#,
    )
    .bind(format!("Test {}", role))
    .bind(&email)
    .bind(&hash)
    .bind(role)
    .bind(module_id)
    .bind(group_id)
    .fetch_one(pool)
    .await
    .unwrap();
    (id, email, password)
}

/// Inserts a quiz row directly, bypassing the teacher API. Useful for shapes
/// the API cannot author, like unscoped quizzes.
pub async fn seed_quiz(
    pool: &PgPool,
    teacher_id: i64,
    module_id: Option<i64>,
    group_id: Option<i64>,
    is_published: bool,
) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO quizzes (title, duration_minutes, module_id, group_id, teacher_id, is_published)
        VALUES ($1, 10, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(format!("Quiz {}", Uuid::new_v4()))
    .bind(module_id)
    .bind(group_id)
    .bind(teacher_id)
    .bind(is_published)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn login(
    client: &reqwest::Client,
    address: &str,
    email: &str,
    password: &str,
) -> String {
    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({"email": email, "password": password}))
        .send()
        .await
        .expect("Failed to execute login request");
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Creates a quiz through the teacher API and returns its JSON.
pub async fn api_create_quiz(
    client: &reqwest::Client,
    address: &str,
    token: &str,
    title: &str,
    is_published: bool,
) -> serde_json::Value {
    let response = client
        .post(format!("{}/api/teacher/quizzes", address))
        .header("Authorization", bearer(token))
        .json(&serde_json::json!({
            "title": title,
            "duration_minutes": 10,
            "is_published": is_published,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.unwrap()
}

/// Adds a question through the teacher API and returns its JSON.
pub async fn api_add_question(
    client: &reqwest::Client,
    address: &str,
    token: &str,
    quiz_id: i64,
    statement: &str,
    points: i32,
    labels: &[&str],
    correct_index: usize,
) -> serde_json::Value {
    let choices: Vec<serde_json::Value> = labels
        .iter()
        .map(|label| serde_json::json!({"label": label}))
        .collect();
    let response = client
        .post(format!("{}/api/teacher/quizzes/{}/questions", address, quiz_id))
        .header("Authorization", bearer(token))
        .json(&serde_json::json!({
            "statement": statement,
            "points": points,
            "choices": choices,
            "correct_index": correct_index,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.unwrap()
}
