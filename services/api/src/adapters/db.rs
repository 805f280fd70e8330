//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! The cross-collection invariant (course row <-> owner's `course_ids` list)
//! is maintained here: every operation that touches both sides runs inside a
//! single transaction, with the owner row locked `FOR UPDATE` so concurrent
//! lifecycle operations on the same teacher serialize.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use course_market_core::domain::{
    Course, CourseUpdate, Credentials, NewCourse, NewStudent, NewTeacher, Role, Student, Teacher,
    TeacherProfile, TeacherStats, ThumbnailEntry, VideoEntry,
};
use course_market_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

const COURSE_COLUMNS: &str =
    "id, name, description, category, teacher_id, enrolled_student_ids, videos, thumbnails, created_at";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// Error Mapping Helpers
//=========================================================================================

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Maps a unique-constraint violation (duplicate email) to `Conflict`;
/// everything else stays `Unexpected`.
fn map_insert_err(e: sqlx::Error, what: &str) -> PortError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.code().as_deref() == Some("23505") {
            return PortError::Conflict(format!("{} already exists", what));
        }
    }
    unexpected(e)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct TeacherRecord {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    national_id: String,
    course_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
}
impl TeacherRecord {
    fn to_domain(self) -> Teacher {
        Teacher {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            national_id: self.national_id,
            course_ids: self.course_ids,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct TeacherProfileRecord {
    first_name: String,
    last_name: String,
    email: String,
}
impl TeacherProfileRecord {
    fn to_domain(self) -> TeacherProfile {
        TeacherProfile {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct StudentRecord {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    created_at: DateTime<Utc>,
}
impl StudentRecord {
    fn to_domain(self) -> Student {
        Student {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CourseRecord {
    id: Uuid,
    name: String,
    description: String,
    category: String,
    teacher_id: Uuid,
    enrolled_student_ids: Vec<Uuid>,
    videos: Json<Vec<VideoEntry>>,
    thumbnails: Json<Vec<ThumbnailEntry>>,
    created_at: DateTime<Utc>,
}
impl CourseRecord {
    fn to_domain(self) -> Course {
        Course {
            id: self.id,
            name: self.name,
            description: self.description,
            category: self.category,
            teacher_id: self.teacher_id,
            enrolled_student_ids: self.enrolled_student_ids,
            videos: self.videos.0,
            thumbnails: self.thumbnails.0,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    email: String,
    password_hash: String,
}
impl CredentialsRecord {
    fn to_domain(self, role: Role) -> Credentials {
        Credentials {
            account_id: self.id,
            email: self.email,
            password_hash: self.password_hash,
            role,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    // --- Account Management ---

    async fn create_teacher(&self, new: NewTeacher, password_hash: &str) -> PortResult<Teacher> {
        let record = sqlx::query_as::<_, TeacherRecord>(
            "INSERT INTO teachers (id, first_name, last_name, email, password_hash, national_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, first_name, last_name, email, national_id, course_ids, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(password_hash)
        .bind(&new.national_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_err(e, "A teacher with this email"))?;

        Ok(record.to_domain())
    }

    async fn create_student(&self, new: NewStudent, password_hash: &str) -> PortResult<Student> {
        let record = sqlx::query_as::<_, StudentRecord>(
            "INSERT INTO students (id, first_name, last_name, email, password_hash) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, first_name, last_name, email, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_insert_err(e, "A student with this email"))?;

        Ok(record.to_domain())
    }

    async fn find_credentials_by_email(&self, email: &str) -> PortResult<Credentials> {
        // Teacher store first, then student store, resolving the role in
        // one server-side call.
        let teacher = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, password_hash FROM teachers WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        if let Some(record) = teacher {
            return Ok(record.to_domain(Role::Teacher));
        }

        let student = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, password_hash FROM students WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        match student {
            Some(record) => Ok(record.to_domain(Role::Student)),
            None => Err(PortError::NotFound(format!(
                "No account with email {}",
                email
            ))),
        }
    }

    async fn get_teacher(&self, teacher_id: Uuid) -> PortResult<Teacher> {
        let record = sqlx::query_as::<_, TeacherRecord>(
            "SELECT id, first_name, last_name, email, national_id, course_ids, created_at \
             FROM teachers WHERE id = $1",
        )
        .bind(teacher_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Teacher {} not found", teacher_id)))?;

        Ok(record.to_domain())
    }

    async fn get_teacher_profile(&self, teacher_id: Uuid) -> PortResult<TeacherProfile> {
        let record = sqlx::query_as::<_, TeacherProfileRecord>(
            "SELECT first_name, last_name, email FROM teachers WHERE id = $1",
        )
        .bind(teacher_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Teacher {} not found", teacher_id)))?;

        Ok(record.to_domain())
    }

    // --- Course Lifecycle ---

    async fn create_course(&self, new: NewCourse) -> PortResult<Course> {
        new.validate()?;

        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        // Verify and lock the owner before any write; a missing owner
        // aborts the whole operation.
        let owner = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM teachers WHERE id = $1 FOR UPDATE",
        )
        .bind(new.teacher_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(unexpected)?;
        if owner.is_none() {
            return Err(PortError::NotFound(format!(
                "Teacher {} not found",
                new.teacher_id
            )));
        }

        let record = sqlx::query_as::<_, CourseRecord>(&format!(
            "INSERT INTO courses (id, name, description, category, teacher_id, videos, thumbnails) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {}",
            COURSE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.category)
        .bind(new.teacher_id)
        .bind(Json(&new.videos))
        .bind(Json(&new.thumbnails))
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        sqlx::query("UPDATE teachers SET course_ids = array_append(course_ids, $1) WHERE id = $2")
            .bind(record.id)
            .bind(new.teacher_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_course(&self, course_id: Uuid) -> PortResult<Course> {
        let record = sqlx::query_as::<_, CourseRecord>(&format!(
            "SELECT {} FROM courses WHERE id = $1",
            COURSE_COLUMNS
        ))
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Course {} not found", course_id)))?;

        Ok(record.to_domain())
    }

    async fn list_courses(&self, teacher_id: Option<Uuid>) -> PortResult<Vec<Course>> {
        let records = match teacher_id {
            Some(teacher_id) => {
                sqlx::query_as::<_, CourseRecord>(&format!(
                    "SELECT {} FROM courses WHERE teacher_id = $1 ORDER BY created_at ASC",
                    COURSE_COLUMNS
                ))
                .bind(teacher_id)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, CourseRecord>(&format!(
                    "SELECT {} FROM courses ORDER BY created_at ASC",
                    COURSE_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn update_course(&self, course_id: Uuid, update: CourseUpdate) -> PortResult<Course> {
        update.validate()?;

        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let current = sqlx::query_as::<_, CourseRecord>(&format!(
            "SELECT {} FROM courses WHERE id = $1 FOR UPDATE",
            COURSE_COLUMNS
        ))
        .bind(course_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Course {} not found", course_id)))?;

        // An ownership change rewrites both owner lists inside the same
        // transaction. All four steps commit together or not at all.
        if let Some(new_owner) = update.teacher_id {
            if new_owner != current.teacher_id {
                sqlx::query(
                    "UPDATE teachers SET course_ids = array_remove(course_ids, $1) WHERE id = $2",
                )
                .bind(course_id)
                .bind(current.teacher_id)
                .execute(&mut *tx)
                .await
                .map_err(unexpected)?;

                let exists = sqlx::query_scalar::<_, Uuid>(
                    "SELECT id FROM teachers WHERE id = $1 FOR UPDATE",
                )
                .bind(new_owner)
                .fetch_optional(&mut *tx)
                .await
                .map_err(unexpected)?;
                if exists.is_none() {
                    return Err(PortError::NotFound(format!(
                        "Teacher {} not found",
                        new_owner
                    )));
                }

                sqlx::query(
                    "UPDATE teachers SET course_ids = array_append(course_ids, $1) WHERE id = $2",
                )
                .bind(course_id)
                .bind(new_owner)
                .execute(&mut *tx)
                .await
                .map_err(unexpected)?;
            }
        }

        // Merge the partial update over the current row and write it back
        // in one statement.
        let name = update.name.unwrap_or(current.name);
        let description = update.description.unwrap_or(current.description);
        let category = update.category.unwrap_or(current.category);
        let teacher_id = update.teacher_id.unwrap_or(current.teacher_id);
        let videos = update.videos.unwrap_or(current.videos.0);
        let thumbnails = update.thumbnails.unwrap_or(current.thumbnails.0);

        let record = sqlx::query_as::<_, CourseRecord>(&format!(
            "UPDATE courses \
             SET name = $1, description = $2, category = $3, teacher_id = $4, videos = $5, thumbnails = $6 \
             WHERE id = $7 \
             RETURNING {}",
            COURSE_COLUMNS
        ))
        .bind(&name)
        .bind(&description)
        .bind(&category)
        .bind(teacher_id)
        .bind(Json(&videos))
        .bind(Json(&thumbnails))
        .bind(course_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn delete_course(&self, course_id: Uuid) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let owner = sqlx::query_scalar::<_, Uuid>(
            "SELECT teacher_id FROM courses WHERE id = $1 FOR UPDATE",
        )
        .bind(course_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Course {} not found", course_id)))?;

        sqlx::query("UPDATE teachers SET course_ids = array_remove(course_ids, $1) WHERE id = $2")
            .bind(course_id)
            .bind(owner)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(course_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }

    async fn enroll_student(&self, course_id: Uuid, student_id: Uuid) -> PortResult<Course> {
        // Single-statement atomic add-to-set: the membership test and the
        // append happen in one UPDATE, so two concurrent enrollments of
        // the same student cannot both succeed.
        let record = sqlx::query_as::<_, CourseRecord>(&format!(
            "UPDATE courses \
             SET enrolled_student_ids = array_append(enrolled_student_ids, $2) \
             WHERE id = $1 AND NOT ($2 = ANY(enrolled_student_ids)) \
             RETURNING {}",
            COURSE_COLUMNS
        ))
        .bind(course_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        if let Some(record) = record {
            return Ok(record.to_domain());
        }

        // Zero rows: either the course is missing or the student is
        // already a member.
        let already = sqlx::query_scalar::<_, bool>(
            "SELECT $2 = ANY(enrolled_student_ids) FROM courses WHERE id = $1",
        )
        .bind(course_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        match already {
            Some(_) => Err(PortError::Conflict(
                "Student already enrolled in this course".to_string(),
            )),
            None => Err(PortError::NotFound(format!(
                "Course {} not found",
                course_id
            ))),
        }
    }

    // --- Statistics ---

    async fn teacher_stats(&self, teacher_id: Uuid) -> PortResult<TeacherStats> {
        let (total_courses, total_students): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(cardinality(enrolled_student_ids)), 0) \
             FROM courses WHERE teacher_id = $1",
        )
        .bind(teacher_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        let average_students_per_course = if total_courses == 0 {
            0.0
        } else {
            total_students as f64 / total_courses as f64
        };

        Ok(TeacherStats {
            total_courses,
            total_students,
            average_students_per_course,
        })
    }
}
