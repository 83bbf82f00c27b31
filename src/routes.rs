// src/routes.rs

use std::sync::Arc;

use axum::{
    Json, Router, http::Method, middleware,
    routing::{delete, get, post, put},
};
use serde_json::json;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, directory, student, teacher},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, student_middleware, teacher_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, teacher, student, admin, directory).
/// * Applies global middleware (Trace, CORS) and rate limiting on auth.
/// * Injects global state (Database Pool + Config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    // Credential endpoints are the only ones worth brute-forcing; everything
    // else sits behind a token already.
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(50)
        .burst_size(100)
        .finish()
        .unwrap();
    let governor_conf = Arc::new(governor_conf);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(GovernorLayer::new(governor_conf));

    let me_routes = Router::new()
        .route("/me", get(auth::me))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let directory_routes = Router::new()
        .route("/modules", get(directory::list_modules))
        .route("/modules/{id}/groups", get(directory::list_module_groups))
        .layer(middleware::from_fn(teacher_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let teacher_routes = Router::new()
        .route(
            "/quizzes",
            get(teacher::list_quizzes).post(teacher::create_quiz),
        )
        .route(
            "/quizzes/{id}",
            get(teacher::show_quiz)
                .put(teacher::update_quiz)
                .delete(teacher::delete_quiz),
        )
        .route("/quizzes/{id}/questions", post(teacher::add_question))
        .route("/quizzes/{id}/assign", post(teacher::assign))
        .route("/quizzes/{id}/assignments", get(teacher::list_assignments))
        .route(
            "/quizzes/{id}/assignments/{assignment_id}",
            delete(teacher::unassign),
        )
        .route("/students", get(teacher::list_students))
        // Double middleware protection: Auth first, then role check
        .layer(middleware::from_fn(teacher_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let student_routes = Router::new()
        .route("/quizzes", get(student::list_quizzes))
        .route("/quizzes/{id}/start", post(student::start_attempt))
        .route("/attempts/{id}", get(student::show_attempt))
        .route("/attempts/{id}/submit", post(student::submit_attempt))
        .layer(middleware::from_fn(student_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/users/{id}",
            put(admin::update_user).delete(admin::delete_user),
        )
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/api/ping", get(ping))
        .nest("/api/auth", auth_routes)
        .nest("/api", me_routes.merge(directory_routes))
        .nest("/api/teacher", teacher_routes)
        .nest("/api/student", student_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Simple API health check.
async fn ping() -> Json<serde_json::Value> {
    Json(json!({"status": "API OK"}))
}
