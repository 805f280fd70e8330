//! services/api/src/web/courses.rs
//!
//! Contains the Axum handlers for the course endpoints and the master
//! definition for the OpenAPI specification.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use course_market_core::domain::{Course, CourseUpdate, NewCourse, TeacherProfile};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::web::auth::{AuthResponse, LoginRequest, StudentSignupRequest, TeacherSignupRequest};
use crate::web::media::MediaUploadResponse;
use crate::web::protocol::{self, ApiFailure, ApiJson};
use crate::web::state::AppState;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::teacher_signup_handler,
        crate::web::auth::student_signup_handler,
        crate::web::auth::login_handler,
        crate::web::media::upload_media_handler,
        list_courses_handler,
        get_course_handler,
        create_course_handler,
        update_course_handler,
        delete_course_handler,
        teacher_courses_handler,
        teacher_stats_handler,
        enroll_handler,
    ),
    components(
        schemas(
            TeacherSignupRequest,
            StudentSignupRequest,
            LoginRequest,
            AuthResponse,
            MediaUploadResponse,
            EnrollRequest,
        )
    ),
    tags(
        (name = "Course Marketplace API", description = "Courses, enrollment, accounts, and media upload.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// A course read, paired with the reduced projection of its owner.
#[derive(Serialize)]
pub struct CourseWithOwner {
    pub course: Course,
    pub teacher: TeacherProfile,
}

#[derive(Deserialize, ToSchema)]
pub struct EnrollRequest {
    pub student_id: Uuid,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /courses - List all courses
#[utoipa::path(
    get,
    path = "/courses",
    responses(
        (status = 200, description = "All courses"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_courses_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiFailure> {
    let courses = state.db.list_courses(None).await?;
    Ok(protocol::ok(courses))
}

/// GET /courses/{id} - Read one course plus its owner projection
#[utoipa::path(
    get,
    path = "/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "The course and its owner"),
        (status = 404, description = "Course not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_course_handler(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiFailure> {
    let course = state.db.get_course(course_id).await?;
    let teacher = state.db.get_teacher_profile(course.teacher_id).await?;
    Ok(protocol::ok(CourseWithOwner { course, teacher }))
}

/// POST /courses/create - Create a course (teacher only)
#[utoipa::path(
    post,
    path = "/courses/create",
    responses(
        (status = 201, description = "Course created"),
        (status = 400, description = "Missing or invalid fields"),
        (status = 403, description = "Caller is not a teacher"),
        (status = 404, description = "Owning teacher not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_course_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(new): ApiJson<NewCourse>,
) -> Result<impl IntoResponse, ApiFailure> {
    let course = state.db.create_course(new).await.map_err(|e| {
        error!("Failed to create course: {:?}", e);
        ApiFailure::from(e)
    })?;
    Ok(protocol::created("Course created", course))
}

/// PUT /courses/{id} - Update a course (teacher only)
#[utoipa::path(
    put,
    path = "/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course updated"),
        (status = 400, description = "Invalid fields"),
        (status = 403, description = "Caller is not a teacher"),
        (status = 404, description = "Course or new owner not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_course_handler(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
    ApiJson(update): ApiJson<CourseUpdate>,
) -> Result<impl IntoResponse, ApiFailure> {
    let course = state.db.update_course(course_id, update).await.map_err(|e| {
        error!("Failed to update course {}: {:?}", course_id, e);
        ApiFailure::from(e)
    })?;
    Ok(protocol::ok(course))
}

/// DELETE /courses/{id} - Delete a course (teacher only)
#[utoipa::path(
    delete,
    path = "/courses/{id}",
    params(("id" = Uuid, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course deleted"),
        (status = 403, description = "Caller is not a teacher"),
        (status = 404, description = "Course not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_course_handler(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiFailure> {
    state.db.delete_course(course_id).await.map_err(|e| {
        error!("Failed to delete course {}: {:?}", course_id, e);
        ApiFailure::from(e)
    })?;
    Ok(protocol::ok(serde_json::json!({ "id": course_id })))
}

/// GET /courses/teacher/{teacher_id} - List one teacher's courses
#[utoipa::path(
    get,
    path = "/courses/teacher/{teacher_id}",
    params(("teacher_id" = Uuid, Path, description = "Teacher id")),
    responses(
        (status = 200, description = "The teacher's courses"),
        (status = 403, description = "Caller is not a teacher"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn teacher_courses_handler(
    State(state): State<Arc<AppState>>,
    Path(teacher_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiFailure> {
    let courses = state.db.list_courses(Some(teacher_id)).await?;
    Ok(protocol::ok(courses))
}

/// GET /courses/teacher/{teacher_id}/stats - Aggregate statistics
#[utoipa::path(
    get,
    path = "/courses/teacher/{teacher_id}/stats",
    params(("teacher_id" = Uuid, Path, description = "Teacher id")),
    responses(
        (status = 200, description = "Course count, total enrollment, and average per course"),
        (status = 403, description = "Caller is not a teacher"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn teacher_stats_handler(
    State(state): State<Arc<AppState>>,
    Path(teacher_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiFailure> {
    let stats = state.db.teacher_stats(teacher_id).await?;
    Ok(protocol::ok(stats))
}

/// POST /courses/{id}/enroll - Enroll a student (any authenticated caller)
#[utoipa::path(
    post,
    path = "/courses/{id}/enroll",
    params(("id" = Uuid, Path, description = "Course id")),
    request_body = EnrollRequest,
    responses(
        (status = 200, description = "Student enrolled"),
        (status = 400, description = "Student already enrolled"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Course not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn enroll_handler(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
    ApiJson(req): ApiJson<EnrollRequest>,
) -> Result<impl IntoResponse, ApiFailure> {
    let course = state
        .db
        .enroll_student(course_id, req.student_id)
        .await
        .map_err(|e| {
            error!("Failed to enroll student in course {}: {:?}", course_id, e);
            ApiFailure::from(e)
        })?;
    Ok(protocol::ok(course))
}
