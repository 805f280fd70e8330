pub mod auth;
pub mod courses;
pub mod media;
pub mod middleware;
pub mod protocol;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use state::AppState;

/// Builds the application router: public routes, authenticated routes,
/// and the teacher-only group, all sharing one `AppState`.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required).
    let public_routes = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/auth/teacher/signup", post(auth::teacher_signup_handler))
        .route("/auth/student/signup", post(auth::student_signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/courses", get(courses::list_courses_handler))
        .route("/courses/{id}", get(courses::get_course_handler));

    // Routes open to any authenticated caller.
    let authenticated_routes = Router::new()
        .route("/courses/{id}/enroll", post(courses::enroll_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            middleware::require_auth,
        ));

    // Teacher-only routes: require_auth runs first, then the role gate.
    let teacher_routes = Router::new()
        .route("/courses/create", post(courses::create_course_handler))
        .route("/courses/{id}", put(courses::update_course_handler))
        .route("/courses/{id}", delete(courses::delete_course_handler))
        .route(
            "/courses/teacher/{teacher_id}",
            get(courses::teacher_courses_handler),
        )
        .route(
            "/courses/teacher/{teacher_id}/stats",
            get(courses::teacher_stats_handler),
        )
        .route("/media/upload", post(media::upload_media_handler))
        .layer(axum_middleware::from_fn(middleware::require_teacher))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .merge(teacher_routes)
        .with_state(app_state)
}
