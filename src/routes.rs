// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{
        attempts, auth, completed,
        materials::{self, MAX_MATERIAL_BYTES},
        questions, quizzes,
    },
    state::AppState,
    utils::jwt::{auth_middleware, instructor_middleware},
};

/// Assembles the main application router.
///
/// * Public: auth.
/// * Instructor only: material upload and quiz management.
/// * Any signed-in user: own account, quiz listing, attempts and completed records.
/// * Global middleware: Trace, CORS.
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origin
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let material_routes = Router::new()
        .route("/generate-questions", post(materials::generate_questions))
        .layer(DefaultBodyLimit::max(MAX_MATERIAL_BYTES));

    let question_routes = Router::new()
        .route("/", post(questions::save_questions))
        .route("/{id}", put(questions::update_question))
        .route("/titles", get(questions::list_own_titles))
        .route(
            "/quiz/{title}",
            get(questions::get_own_quiz).delete(questions::delete_quiz),
        )
        .route("/quiz/{title}/results", get(questions::quiz_results));

    // Double middleware protection: Auth first, then Instructor check.
    // Route layers only, so unknown paths still fall through to 404.
    let instructor_routes = Router::new()
        .nest("/api/materials", material_routes)
        .nest("/api/questions", question_routes)
        .route_layer(middleware::from_fn(instructor_middleware))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let quiz_routes = Router::new()
        .route("/", get(quizzes::list_quizzes))
        .route("/{title}/attempts", post(quizzes::start_attempt));

    let attempt_routes = Router::new()
        .route("/{id}", get(attempts::get_attempt))
        .route("/{id}/answers", put(attempts::select_option))
        .route("/{id}/next", post(attempts::next_question))
        .route("/{id}/previous", post(attempts::previous_question))
        .route("/{id}/events", post(attempts::report_event))
        .route("/{id}/submit", post(attempts::submit_attempt));

    let completed_routes = Router::new()
        .route("/", get(completed::list_completed))
        .route("/{title}", get(completed::get_completed));

    let user_routes = Router::new()
        .route("/api/auth/me", get(auth::get_me))
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/attempts", attempt_routes)
        .nest("/api/completed-quizzes", completed_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .merge(instructor_routes)
        .merge(user_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
