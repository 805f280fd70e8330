//! crates/course_market_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or web framework; they
//! carry `serde` derives only because the same shapes cross the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role a signed-in account carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
}

/// A single hosted video attached to a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoEntry {
    /// Playable URL returned by the media host.
    pub url: String,
    /// Display title shown to students.
    pub title: String,
    /// The host-assigned reference id, kept for later housekeeping.
    pub asset_id: String,
}

/// A single hosted thumbnail image attached to a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailEntry {
    pub url: String,
    pub asset_id: String,
}

/// Represents an offered course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: String,
    /// The one owning teacher. Always present and always resolvable.
    pub teacher_id: Uuid,
    /// Current enrollment membership. Never contains the same student twice.
    pub enrolled_student_ids: Vec<Uuid>,
    pub videos: Vec<VideoEntry>,
    pub thumbnails: Vec<ThumbnailEntry>,
    pub created_at: DateTime<Utc>,
}

/// Represents a content-creating account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub national_id: String,
    /// Denormalized owned-courses list, kept consistent with the Course
    /// rows that name this teacher as owner.
    pub course_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// The reduced owner projection returned alongside a course read.
/// Never carries the password hash or other sensitive fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Represents a learner account. Enrollment membership is derived from
/// the courses that list this student, not stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login - contains sensitive data.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub account_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Aggregate statistics over one teacher's courses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeacherStats {
    pub total_courses: i64,
    pub total_students: i64,
    pub average_students_per_course: f64,
}

/// The media reference handed back by the asset host after an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMedia {
    pub url: String,
    pub asset_id: String,
}

/// A validation failure raised before any store write happens.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("{0} must contain at least one entry")]
    EmptyList(&'static str),
}

/// The fields required to create a new teacher account.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTeacher {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub national_id: String,
}

/// The fields required to create a new student account.
#[derive(Debug, Clone, Deserialize)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// The fields required to create a course.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCourse {
    pub name: String,
    pub description: String,
    pub category: String,
    pub teacher_id: Uuid,
    pub videos: Vec<VideoEntry>,
    pub thumbnails: Vec<ThumbnailEntry>,
}

impl NewCourse {
    /// Checks the creation invariants: text fields non-empty after
    /// trimming, both media lists non-empty. List lengths are not
    /// required to match.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_text("name", &self.name)?;
        validate_text("description", &self.description)?;
        validate_text("category", &self.category)?;
        if self.videos.is_empty() {
            return Err(ValidationError::EmptyList("videos"));
        }
        if self.thumbnails.is_empty() {
            return Err(ValidationError::EmptyList("thumbnails"));
        }
        Ok(())
    }
}

/// A partial course update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    /// When set to a different teacher, ownership is transferred and both
    /// owner lists are rewritten in one transaction.
    pub teacher_id: Option<Uuid>,
    pub videos: Option<Vec<VideoEntry>>,
    pub thumbnails: Option<Vec<ThumbnailEntry>>,
}

impl CourseUpdate {
    /// Re-runs the creation invariants over the fields present in the
    /// update.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            validate_text("name", name)?;
        }
        if let Some(description) = &self.description {
            validate_text("description", description)?;
        }
        if let Some(category) = &self.category {
            validate_text("category", category)?;
        }
        if let Some(videos) = &self.videos {
            if videos.is_empty() {
                return Err(ValidationError::EmptyList("videos"));
            }
        }
        if let Some(thumbnails) = &self.thumbnails {
            if thumbnails.is_empty() {
                return Err(ValidationError::EmptyList("thumbnails"));
            }
        }
        Ok(())
    }
}

fn validate_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_course() -> NewCourse {
        NewCourse {
            name: "Intro to Baking".to_string(),
            description: "Twelve lessons on bread".to_string(),
            category: "cooking".to_string(),
            teacher_id: Uuid::new_v4(),
            videos: vec![VideoEntry {
                url: "https://media.example/v/1.mp4".to_string(),
                title: "Lesson 1".to_string(),
                asset_id: "vid-1".to_string(),
            }],
            thumbnails: vec![ThumbnailEntry {
                url: "https://media.example/t/1.jpg".to_string(),
                asset_id: "thumb-1".to_string(),
            }],
        }
    }

    #[test]
    fn valid_course_passes() {
        assert!(sample_course().validate().is_ok());
    }

    #[test]
    fn whitespace_name_is_rejected() {
        let mut course = sample_course();
        course.name = "   ".to_string();
        assert_eq!(course.validate(), Err(ValidationError::EmptyField("name")));
    }

    #[test]
    fn empty_media_lists_are_rejected() {
        let mut course = sample_course();
        course.videos.clear();
        assert_eq!(course.validate(), Err(ValidationError::EmptyList("videos")));

        let mut course = sample_course();
        course.thumbnails.clear();
        assert_eq!(
            course.validate(),
            Err(ValidationError::EmptyList("thumbnails"))
        );
    }

    #[test]
    fn mismatched_media_list_lengths_are_allowed() {
        let mut course = sample_course();
        course.videos.push(VideoEntry {
            url: "https://media.example/v/2.mp4".to_string(),
            title: "Lesson 2".to_string(),
            asset_id: "vid-2".to_string(),
        });
        // Two videos, one thumbnail: accepted.
        assert!(course.validate().is_ok());
    }

    #[test]
    fn update_revalidates_present_fields_only() {
        let update = CourseUpdate {
            description: Some("New description".to_string()),
            ..Default::default()
        };
        assert!(update.validate().is_ok());

        let update = CourseUpdate {
            thumbnails: Some(Vec::new()),
            ..Default::default()
        };
        assert_eq!(
            update.validate(),
            Err(ValidationError::EmptyList("thumbnails"))
        );
    }
}
