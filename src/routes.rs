// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handlers::{admin, application, assessment, auth, health, job, matching, profile},
    state::AppState,
    utils::jwt::{auth_middleware, require_admin, require_company, require_student},
};

/// Assembles the main application router.
///
/// * Public: health, auth, job browsing.
/// * Any signed-in user: assessments, attempts, results.
/// * Role-scoped trees under `/api/student`, `/api/company`, `/api/admin`.
/// * Global middleware: Trace, CORS.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    let authenticated = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let job_routes = Router::new()
        .route("/", get(job::list_jobs))
        .route("/{id}", get(job::get_job));

    let learner_routes = Router::new()
        .route("/api/assessments", get(assessment::list_assessments))
        .route("/api/assessments/{id}", get(assessment::get_assessment))
        .route("/api/assessments/{id}/attempts", post(assessment::start_attempt))
        .route("/api/assessments/{id}/submit", post(assessment::submit_assessment))
        .route(
            "/api/attempts/{id}",
            get(assessment::get_attempt).put(assessment::save_attempt),
        )
        .route("/api/results", get(assessment::list_results))
        .layer(authenticated.clone());

    // Role checks run after authentication: layers apply from the outside in.
    let student_routes = Router::new()
        .route(
            "/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route("/recommendations", get(matching::recommend_jobs))
        .route("/jobs/{id}/apply", post(application::apply))
        .route("/applications", get(application::list_my_applications))
        .layer(middleware::from_fn(require_student))
        .layer(authenticated.clone());

    let company_routes = Router::new()
        .route(
            "/profile",
            get(profile::get_company).put(profile::update_company),
        )
        .route("/jobs", get(job::list_my_jobs).post(job::create_job))
        .route("/jobs/{id}", put(job::update_job).delete(job::delete_job))
        .route("/jobs/{id}/assessment", put(job::put_job_assessment))
        .route("/jobs/{id}/applicants", get(matching::list_applicants))
        .route(
            "/applications/{id}/status",
            put(application::update_application_status),
        )
        .layer(middleware::from_fn(require_company))
        .layer(authenticated.clone());

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/{id}", axum::routing::delete(admin::delete_user))
        .route(
            "/assessments",
            get(admin::list_assessments).post(admin::create_assessment),
        )
        .route(
            "/assessments/{id}",
            put(admin::update_assessment).delete(admin::delete_assessment),
        )
        .route("/assessments/{id}/publish", post(admin::publish_assessment))
        .layer(middleware::from_fn(require_admin))
        .layer(authenticated);

    Router::new()
        .route("/api/health", get(health))
        .nest("/api/auth", auth_routes)
        .nest("/api/jobs", job_routes)
        .merge(learner_routes)
        .nest("/api/student", student_routes)
        .nest("/api/company", company_routes)
        .nest("/api/admin", admin_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
