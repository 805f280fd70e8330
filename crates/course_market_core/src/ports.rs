//! crates/course_market_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or the
//! media host.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Course, CourseUpdate, Credentials, NewCourse, NewStudent, NewTeacher, Student, StoredMedia,
    Teacher, TeacherProfile, TeacherStats, ValidationError,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// A precondition on the request data failed before any write happened.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A uniqueness or membership invariant would be violated (duplicate
    /// email, duplicate enrollment).
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The contract for the persistent stores. One implementation wraps the
/// real database; tests substitute an in-memory double.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Account Management ---
    async fn create_teacher(&self, new: NewTeacher, password_hash: &str) -> PortResult<Teacher>;

    async fn create_student(&self, new: NewStudent, password_hash: &str) -> PortResult<Student>;

    /// Resolves an email to an account and its role, checking the teacher
    /// store first and the student store second.
    async fn find_credentials_by_email(&self, email: &str) -> PortResult<Credentials>;

    async fn get_teacher(&self, teacher_id: Uuid) -> PortResult<Teacher>;

    /// The reduced projection used when returning a course's owner.
    async fn get_teacher_profile(&self, teacher_id: Uuid) -> PortResult<TeacherProfile>;

    // --- Course Lifecycle ---

    /// Inserts the course and appends its id to the owner's course list,
    /// atomically. Fails with `NotFound` before any write when the owner
    /// does not exist.
    async fn create_course(&self, new: NewCourse) -> PortResult<Course>;

    async fn get_course(&self, course_id: Uuid) -> PortResult<Course>;

    /// All courses, optionally restricted to one owning teacher.
    async fn list_courses(&self, teacher_id: Option<Uuid>) -> PortResult<Vec<Course>>;

    /// Applies a partial update. An ownership change rewrites both owner
    /// lists and the course row in one transaction.
    async fn update_course(&self, course_id: Uuid, update: CourseUpdate) -> PortResult<Course>;

    /// Deletes the course and removes its id from the owner's course
    /// list, atomically.
    async fn delete_course(&self, course_id: Uuid) -> PortResult<()>;

    /// Atomic add-to-set append of the student onto the enrolled list.
    /// `Conflict` when already enrolled, `NotFound` for a missing course.
    async fn enroll_student(&self, course_id: Uuid, student_id: Uuid) -> PortResult<Course>;

    // --- Statistics ---

    /// Aggregates course count, total enrollment, and average enrollment
    /// per course for one teacher. All zeros when the teacher owns no
    /// courses.
    async fn teacher_stats(&self, teacher_id: Uuid) -> PortResult<TeacherStats>;
}

/// The contract for the external asset host holding course media.
#[async_trait]
pub trait MediaStorageService: Send + Sync {
    /// Uploads one file and returns the durable URL plus the
    /// host-assigned reference id.
    async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> PortResult<StoredMedia>;
}
