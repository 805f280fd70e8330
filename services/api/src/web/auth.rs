//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: teacher signup, student signup, and the
//! unified role-resolving login. Login checks the teacher store first and
//! the student store second, server-side, so clients never have to try
//! both roles themselves.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, response::IntoResponse};
use course_market_core::domain::{NewStudent, NewTeacher, Role};
use course_market_core::ports::PortError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::protocol::{self, ApiFailure, ApiJson};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct TeacherSignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub national_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct StudentSignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub account_id: Uuid,
    pub email: String,
    #[schema(value_type = String, example = "teacher")]
    pub role: Role,
    /// The signed bearer token to present on subsequent requests.
    pub token: String,
}

//=========================================================================================
// Password Helpers
//=========================================================================================

fn hash_password(password: &str) -> Result<String, ApiFailure> {
    if password.trim().is_empty() {
        return Err(ApiFailure::BadRequest(
            "password must not be empty".to_string(),
        ));
    }
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ApiFailure::Internal("Failed to hash password".to_string())
        })
}

fn verify_password(password: &str, stored_hash: &str) -> Result<bool, ApiFailure> {
    let parsed_hash = PasswordHash::new(stored_hash).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        ApiFailure::Internal("Authentication error".to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/teacher/signup - Create a new teacher account
#[utoipa::path(
    post,
    path = "/auth/teacher/signup",
    request_body = TeacherSignupRequest,
    responses(
        (status = 201, description = "Teacher account created", body = AuthResponse),
        (status = 400, description = "Invalid request or email already in use"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn teacher_signup_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<TeacherSignupRequest>,
) -> Result<impl IntoResponse, ApiFailure> {
    // 1. Hash the password.
    let password_hash = hash_password(&req.password)?;

    // 2. Create the account.
    let new = NewTeacher {
        first_name: req.first_name,
        last_name: req.last_name,
        email: req.email,
        national_id: req.national_id,
    };
    let teacher = state
        .db
        .create_teacher(new, &password_hash)
        .await
        .map_err(|e| {
            error!("Failed to create teacher: {:?}", e);
            ApiFailure::from(e)
        })?;

    // 3. Issue a token so the new account is signed in immediately.
    let token = state
        .tokens
        .issue(teacher.id, Role::Teacher)
        .map_err(|e| {
            error!("Failed to issue token: {}", e);
            ApiFailure::Internal("Failed to issue token".to_string())
        })?;

    Ok(protocol::created(
        "Teacher account created",
        AuthResponse {
            account_id: teacher.id,
            email: teacher.email,
            role: Role::Teacher,
            token,
        },
    ))
}

/// POST /auth/student/signup - Create a new student account
#[utoipa::path(
    post,
    path = "/auth/student/signup",
    request_body = StudentSignupRequest,
    responses(
        (status = 201, description = "Student account created", body = AuthResponse),
        (status = 400, description = "Invalid request or email already in use"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn student_signup_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<StudentSignupRequest>,
) -> Result<impl IntoResponse, ApiFailure> {
    let password_hash = hash_password(&req.password)?;

    let new = NewStudent {
        first_name: req.first_name,
        last_name: req.last_name,
        email: req.email,
    };
    let student = state
        .db
        .create_student(new, &password_hash)
        .await
        .map_err(|e| {
            error!("Failed to create student: {:?}", e);
            ApiFailure::from(e)
        })?;

    let token = state
        .tokens
        .issue(student.id, Role::Student)
        .map_err(|e| {
            error!("Failed to issue token: {}", e);
            ApiFailure::Internal("Failed to issue token".to_string())
        })?;

    Ok(protocol::created(
        "Student account created",
        AuthResponse {
            account_id: student.id,
            email: student.email,
            role: Role::Student,
            token,
        },
    ))
}

/// POST /auth/login - Login with an existing account of either role
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiFailure> {
    // 1. Resolve the email to an account and role. An unknown email is
    //    reported exactly like a bad password.
    let credentials = state
        .db
        .find_credentials_by_email(&req.email)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => {
                ApiFailure::Unauthorized("Invalid email or password".to_string())
            }
            other => {
                error!("Failed to look up credentials: {:?}", other);
                ApiFailure::from(other)
            }
        })?;

    // 2. Verify the password.
    if !verify_password(&req.password, &credentials.password_hash)? {
        return Err(ApiFailure::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    // 3. Issue the bearer token.
    let token = state
        .tokens
        .issue(credentials.account_id, credentials.role)
        .map_err(|e| {
            error!("Failed to issue token: {}", e);
            ApiFailure::Internal("Failed to issue token".to_string())
        })?;

    Ok(protocol::ok(AuthResponse {
        account_id: credentials.account_id,
        email: credentials.email,
        role: credentials.role,
        token,
    }))
}
