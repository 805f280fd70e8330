//! Integration tests driving the full router against an in-memory store.
//!
//! The mock implements the same `DatabaseService` contract as the real
//! adapter, including the two-sided owner-list bookkeeping, so these tests
//! exercise the lifecycle semantics end to end through the HTTP surface.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use api_lib::auth::TokenIssuer;
use api_lib::web::state::AppState;
use course_market_core::domain::{
    Course, CourseUpdate, Credentials, NewCourse, NewStudent, NewTeacher, Role, Student,
    StoredMedia, Teacher, TeacherProfile, TeacherStats,
};
use course_market_core::ports::{
    DatabaseService, MediaStorageService, PortError, PortResult,
};

const TEST_SECRET: &str = "integration-test-secret";

//=========================================================================================
// In-Memory Mock Store
//=========================================================================================

#[derive(Default)]
struct MockDb {
    teachers: RwLock<HashMap<Uuid, Teacher>>,
    students: RwLock<HashMap<Uuid, Student>>,
    courses: RwLock<HashMap<Uuid, Course>>,
}

#[async_trait]
impl DatabaseService for MockDb {
    async fn create_teacher(&self, new: NewTeacher, _password_hash: &str) -> PortResult<Teacher> {
        let mut teachers = self.teachers.write().unwrap();
        if teachers.values().any(|t| t.email == new.email) {
            return Err(PortError::Conflict(
                "A teacher with this email already exists".to_string(),
            ));
        }
        let teacher = Teacher {
            id: Uuid::new_v4(),
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            national_id: new.national_id,
            course_ids: Vec::new(),
            created_at: Utc::now(),
        };
        teachers.insert(teacher.id, teacher.clone());
        Ok(teacher)
    }

    async fn create_student(&self, new: NewStudent, _password_hash: &str) -> PortResult<Student> {
        let student = Student {
            id: Uuid::new_v4(),
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            created_at: Utc::now(),
        };
        self.students
            .write()
            .unwrap()
            .insert(student.id, student.clone());
        Ok(student)
    }

    async fn find_credentials_by_email(&self, email: &str) -> PortResult<Credentials> {
        if let Some(t) = self
            .teachers
            .read()
            .unwrap()
            .values()
            .find(|t| t.email == email)
        {
            return Ok(Credentials {
                account_id: t.id,
                email: t.email.clone(),
                password_hash: String::new(),
                role: Role::Teacher,
            });
        }
        if let Some(s) = self
            .students
            .read()
            .unwrap()
            .values()
            .find(|s| s.email == email)
        {
            return Ok(Credentials {
                account_id: s.id,
                email: s.email.clone(),
                password_hash: String::new(),
                role: Role::Student,
            });
        }
        Err(PortError::NotFound(format!(
            "No account with email {}",
            email
        )))
    }

    async fn get_teacher(&self, teacher_id: Uuid) -> PortResult<Teacher> {
        self.teachers
            .read()
            .unwrap()
            .get(&teacher_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Teacher {} not found", teacher_id)))
    }

    async fn get_teacher_profile(&self, teacher_id: Uuid) -> PortResult<TeacherProfile> {
        let teacher = self.get_teacher(teacher_id).await?;
        Ok(TeacherProfile {
            first_name: teacher.first_name,
            last_name: teacher.last_name,
            email: teacher.email,
        })
    }

    async fn create_course(&self, new: NewCourse) -> PortResult<Course> {
        new.validate()?;
        let mut teachers = self.teachers.write().unwrap();
        let owner = teachers
            .get_mut(&new.teacher_id)
            .ok_or_else(|| PortError::NotFound(format!("Teacher {} not found", new.teacher_id)))?;
        let course = Course {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            category: new.category,
            teacher_id: new.teacher_id,
            enrolled_student_ids: Vec::new(),
            videos: new.videos,
            thumbnails: new.thumbnails,
            created_at: Utc::now(),
        };
        owner.course_ids.push(course.id);
        self.courses
            .write()
            .unwrap()
            .insert(course.id, course.clone());
        Ok(course)
    }

    async fn get_course(&self, course_id: Uuid) -> PortResult<Course> {
        self.courses
            .read()
            .unwrap()
            .get(&course_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Course {} not found", course_id)))
    }

    async fn list_courses(&self, teacher_id: Option<Uuid>) -> PortResult<Vec<Course>> {
        let courses = self.courses.read().unwrap();
        let mut result: Vec<Course> = courses
            .values()
            .filter(|c| teacher_id.map_or(true, |t| c.teacher_id == t))
            .cloned()
            .collect();
        result.sort_by_key(|c| c.created_at);
        Ok(result)
    }

    async fn update_course(&self, course_id: Uuid, update: CourseUpdate) -> PortResult<Course> {
        update.validate()?;
        let mut courses = self.courses.write().unwrap();
        let course = courses
            .get_mut(&course_id)
            .ok_or_else(|| PortError::NotFound(format!("Course {} not found", course_id)))?;

        if let Some(new_owner) = update.teacher_id {
            if new_owner != course.teacher_id {
                let mut teachers = self.teachers.write().unwrap();
                if !teachers.contains_key(&new_owner) {
                    return Err(PortError::NotFound(format!(
                        "Teacher {} not found",
                        new_owner
                    )));
                }
                if let Some(old) = teachers.get_mut(&course.teacher_id) {
                    old.course_ids.retain(|id| *id != course_id);
                }
                teachers
                    .get_mut(&new_owner)
                    .unwrap()
                    .course_ids
                    .push(course_id);
                course.teacher_id = new_owner;
            }
        }
        if let Some(name) = update.name {
            course.name = name;
        }
        if let Some(description) = update.description {
            course.description = description;
        }
        if let Some(category) = update.category {
            course.category = category;
        }
        if let Some(videos) = update.videos {
            course.videos = videos;
        }
        if let Some(thumbnails) = update.thumbnails {
            course.thumbnails = thumbnails;
        }
        Ok(course.clone())
    }

    async fn delete_course(&self, course_id: Uuid) -> PortResult<()> {
        let mut courses = self.courses.write().unwrap();
        let course = courses
            .remove(&course_id)
            .ok_or_else(|| PortError::NotFound(format!("Course {} not found", course_id)))?;
        if let Some(owner) = self.teachers.write().unwrap().get_mut(&course.teacher_id) {
            owner.course_ids.retain(|id| *id != course_id);
        }
        Ok(())
    }

    async fn enroll_student(&self, course_id: Uuid, student_id: Uuid) -> PortResult<Course> {
        let mut courses = self.courses.write().unwrap();
        let course = courses
            .get_mut(&course_id)
            .ok_or_else(|| PortError::NotFound(format!("Course {} not found", course_id)))?;
        if course.enrolled_student_ids.contains(&student_id) {
            return Err(PortError::Conflict(
                "Student already enrolled in this course".to_string(),
            ));
        }
        course.enrolled_student_ids.push(student_id);
        Ok(course.clone())
    }

    async fn teacher_stats(&self, teacher_id: Uuid) -> PortResult<TeacherStats> {
        let courses = self.courses.read().unwrap();
        let owned: Vec<&Course> = courses
            .values()
            .filter(|c| c.teacher_id == teacher_id)
            .collect();
        let total_courses = owned.len() as i64;
        let total_students: i64 = owned
            .iter()
            .map(|c| c.enrolled_student_ids.len() as i64)
            .sum();
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

/// A media stub that never talks to the network.
struct MockMedia;

#[async_trait]
impl MediaStorageService for MockMedia {
    async fn upload(
        &self,
        file_name: &str,
        _content_type: &str,
        _data: Vec<u8>,
    ) -> PortResult<StoredMedia> {
        Ok(StoredMedia {
            url: format!("https://media.example/{}", file_name),
            asset_id: "asset-1".to_string(),
        })
    }
}

//=========================================================================================
// Test Harness
//=========================================================================================

struct Harness {
    app: Router,
    db: Arc<MockDb>,
    tokens: TokenIssuer,
}

fn make_harness() -> Harness {
    let db = Arc::new(MockDb::default());
    let tokens = TokenIssuer::new(TEST_SECRET, 24);
    let state = Arc::new(AppState {
        db: db.clone(),
        media: Arc::new(MockMedia),
        tokens: tokens.clone(),
    });
    Harness {
        app: api_lib::web::router(state),
        db,
        tokens,
    }
}

impl Harness {
    async fn seed_teacher(&self, email: &str) -> (Uuid, String) {
        let teacher = self
            .db
            .create_teacher(
                NewTeacher {
                    first_name: "Ada".to_string(),
                    last_name: "Lovelace".to_string(),
                    email: email.to_string(),
                    national_id: "A-1".to_string(),
                },
                "hash",
            )
            .await
            .unwrap();
        let token = self.tokens.issue(teacher.id, Role::Teacher).unwrap();
        (teacher.id, token)
    }

    async fn seed_student(&self, email: &str) -> (Uuid, String) {
        let student = self
            .db
            .create_student(
                NewStudent {
                    first_name: "Sam".to_string(),
                    last_name: "Learner".to_string(),
                    email: email.to_string(),
                },
                "hash",
            )
            .await
            .unwrap();
        let token = self.tokens.issue(student.id, Role::Student).unwrap();
        (student.id, token)
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}

fn course_body(teacher_id: Uuid) -> Value {
    json!({
        "name": "Systems Programming",
        "description": "Twelve weeks of pointers",
        "category": "programming",
        "teacher_id": teacher_id,
        "videos": [
            {"url": "https://media.example/v/1.mp4", "title": "Week 1", "asset_id": "v1"}
        ],
        "thumbnails": [
            {"url": "https://media.example/t/1.jpg", "asset_id": "t1"}
        ]
    })
}

//=========================================================================================
// Scenarios
//=========================================================================================

#[tokio::test]
async fn create_links_course_into_owner_list() {
    let h = make_harness();
    let (teacher_id, token) = h.seed_teacher("ada@example.com").await;

    let (status, body) = h
        .request(
            "POST",
            "/courses/create",
            Some(&token),
            Some(course_body(teacher_id)),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    let course_id: Uuid = serde_json::from_value(body["data"]["id"].clone()).unwrap();

    // The owner's list reflects the new course immediately.
    let owner = h.db.get_teacher(teacher_id).await.unwrap();
    assert_eq!(owner.course_ids, vec![course_id]);
}

#[tokio::test]
async fn create_with_missing_teacher_persists_nothing() {
    let h = make_harness();
    let (_, token) = h.seed_teacher("ada@example.com").await;

    let (status, body) = h
        .request(
            "POST",
            "/courses/create",
            Some(&token),
            Some(course_body(Uuid::new_v4())),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));

    let (status, body) = h.request("GET", "/courses", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn create_rejects_empty_media_lists() {
    let h = make_harness();
    let (teacher_id, token) = h.seed_teacher("ada@example.com").await;

    let mut body = course_body(teacher_id);
    body["videos"] = json!([]);

    let (status, response) = h
        .request("POST", "/courses/create", Some(&token), Some(body))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["success"], json!(false));
}

#[tokio::test]
async fn create_with_unparseable_body_stays_in_envelope() {
    let h = make_harness();
    let (_, token) = h.seed_teacher("ada@example.com").await;

    // A body that deserializes to nothing must come back as a 400 wrapped
    // in the usual `{ success, error }` envelope, not a bare rejection.
    let (status, body) = h
        .request("POST", "/courses/create", Some(&token), Some(json!({})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
}

#[tokio::test]
async fn read_returns_owner_projection_and_is_idempotent() {
    let h = make_harness();
    let (teacher_id, token) = h.seed_teacher("ada@example.com").await;
    let (_, created) = h
        .request(
            "POST",
            "/courses/create",
            Some(&token),
            Some(course_body(teacher_id)),
        )
        .await;
    let course_id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, first) = h
        .request("GET", &format!("/courses/{}", course_id), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["teacher"]["email"], json!("ada@example.com"));
    // The projection must not leak credential fields.
    assert!(first["data"]["teacher"].get("password_hash").is_none());

    let (_, second) = h
        .request("GET", &format!("/courses/{}", course_id), None, None)
        .await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn enroll_then_duplicate_enroll() {
    let h = make_harness();
    let (teacher_id, teacher_token) = h.seed_teacher("ada@example.com").await;
    let (student_id, student_token) = h.seed_student("sam@example.com").await;
    let (_, created) = h
        .request(
            "POST",
            "/courses/create",
            Some(&teacher_token),
            Some(course_body(teacher_id)),
        )
        .await;
    let course_id = created["data"]["id"].as_str().unwrap().to_string();

    let enroll_body = json!({ "student_id": student_id });
    let (status, body) = h
        .request(
            "POST",
            &format!("/courses/{}/enroll", course_id),
            Some(&student_token),
            Some(enroll_body.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["enrolled_student_ids"],
        json!([student_id.to_string()])
    );

    // Second enrollment of the same student: 400, membership unchanged.
    let (status, body) = h
        .request(
            "POST",
            &format!("/courses/{}/enroll", course_id),
            Some(&student_token),
            Some(enroll_body),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));

    let course = h
        .db
        .get_course(course_id.parse().unwrap())
        .await
        .unwrap();
    assert_eq!(course.enrolled_student_ids, vec![student_id]);
}

#[tokio::test]
async fn enroll_requires_authentication() {
    let h = make_harness();
    let (teacher_id, token) = h.seed_teacher("ada@example.com").await;
    let (_, created) = h
        .request(
            "POST",
            "/courses/create",
            Some(&token),
            Some(course_body(teacher_id)),
        )
        .await;
    let course_id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = h
        .request(
            "POST",
            &format!("/courses/{}/enroll", course_id),
            None,
            Some(json!({ "student_id": Uuid::new_v4() })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn ownership_transfer_moves_course_between_lists() {
    let h = make_harness();
    let (t1, token) = h.seed_teacher("t1@example.com").await;
    let (t2, _) = h.seed_teacher("t2@example.com").await;
    let (_, created) = h
        .request("POST", "/courses/create", Some(&token), Some(course_body(t1)))
        .await;
    let course_id: Uuid = created["data"]["id"].as_str().unwrap().parse().unwrap();

    let (status, body) = h
        .request(
            "PUT",
            &format!("/courses/{}", course_id),
            Some(&token),
            Some(json!({ "teacher_id": t2 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["teacher_id"], json!(t2.to_string()));

    let old_owner = h.db.get_teacher(t1).await.unwrap();
    let new_owner = h.db.get_teacher(t2).await.unwrap();
    assert!(old_owner.course_ids.is_empty());
    assert_eq!(new_owner.course_ids, vec![course_id]);
}

#[tokio::test]
async fn ownership_transfer_to_missing_teacher_is_rejected() {
    let h = make_harness();
    let (t1, token) = h.seed_teacher("t1@example.com").await;
    let (_, created) = h
        .request("POST", "/courses/create", Some(&token), Some(course_body(t1)))
        .await;
    let course_id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = h
        .request(
            "PUT",
            &format!("/courses/{}", course_id),
            Some(&token),
            Some(json!({ "teacher_id": Uuid::new_v4() })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_course_and_owner_link() {
    let h = make_harness();
    let (teacher_id, token) = h.seed_teacher("ada@example.com").await;
    let (_, created) = h
        .request(
            "POST",
            "/courses/create",
            Some(&token),
            Some(course_body(teacher_id)),
        )
        .await;
    let course_id: Uuid = created["data"]["id"].as_str().unwrap().parse().unwrap();

    let (status, _) = h
        .request("DELETE", &format!("/courses/{}", course_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    assert!(matches!(
        h.db.get_course(course_id).await,
        Err(PortError::NotFound(_))
    ));
    let owner = h.db.get_teacher(teacher_id).await.unwrap();
    assert!(owner.course_ids.is_empty());
}

#[tokio::test]
async fn delete_nonexistent_course_is_404() {
    let h = make_harness();
    let (_, token) = h.seed_teacher("ada@example.com").await;

    let (status, body) = h
        .request(
            "DELETE",
            &format!("/courses/{}", Uuid::new_v4()),
            Some(&token),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn stats_are_zero_for_teacher_without_courses() {
    let h = make_harness();
    let (teacher_id, token) = h.seed_teacher("ada@example.com").await;

    let (status, body) = h
        .request(
            "GET",
            &format!("/courses/teacher/{}/stats", teacher_id),
            Some(&token),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_courses"], json!(0));
    assert_eq!(body["data"]["total_students"], json!(0));
    assert_eq!(body["data"]["average_students_per_course"], json!(0.0));
}

#[tokio::test]
async fn stats_aggregate_enrollment_across_courses() {
    let h = make_harness();
    let (teacher_id, token) = h.seed_teacher("ada@example.com").await;
    let (s1, s1_token) = h.seed_student("s1@example.com").await;
    let (s2, _) = h.seed_student("s2@example.com").await;

    for _ in 0..2 {
        h.request(
            "POST",
            "/courses/create",
            Some(&token),
            Some(course_body(teacher_id)),
        )
        .await;
    }
    let courses = h.db.list_courses(Some(teacher_id)).await.unwrap();
    h.db.enroll_student(courses[0].id, s1).await.unwrap();
    h.db.enroll_student(courses[0].id, s2).await.unwrap();
    // Second course has one student enrolled through the API.
    h.request(
        "POST",
        &format!("/courses/{}/enroll", courses[1].id),
        Some(&s1_token),
        Some(json!({ "student_id": s1 })),
    )
    .await;

    let (status, body) = h
        .request(
            "GET",
            &format!("/courses/teacher/{}/stats", teacher_id),
            Some(&token),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_courses"], json!(2));
    assert_eq!(body["data"]["total_students"], json!(3));
    assert_eq!(body["data"]["average_students_per_course"], json!(1.5));
}

#[tokio::test]
async fn teacher_routes_reject_students() {
    let h = make_harness();
    let (teacher_id, _) = h.seed_teacher("ada@example.com").await;
    let (_, student_token) = h.seed_student("sam@example.com").await;

    let (status, body) = h
        .request(
            "POST",
            "/courses/create",
            Some(&student_token),
            Some(course_body(teacher_id)),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn unified_login_resolves_role() {
    let h = make_harness();
    h.seed_teacher("ada@example.com").await;

    // The mock accepts any password; this test is about role resolution.
    let (status, body) = h
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "irrelevant" })),
        )
        .await;

    // The stored hash is not a parseable argon2 hash, so authentication
    // errors rather than succeeding; what matters here is that the email
    // was found in the teacher store (500 from hash parsing, not 401 from
    // an unknown account).
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], json!(false));

    let (status, _) = h
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": "x" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_and_login_round_trip() {
    let h = make_harness();

    let (status, body) = h
        .request(
            "POST",
            "/auth/teacher/signup",
            None,
            Some(json!({
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email": "ada@example.com",
                "password": "correct horse",
                "national_id": "A-1"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["role"], json!("teacher"));
    let token = body["data"]["token"].as_str().unwrap().to_string();

    // The issued token opens teacher-only routes.
    let teacher_id: Uuid = body["data"]["account_id"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    let (status, _) = h
        .request(
            "POST",
            "/courses/create",
            Some(&token),
            Some(course_body(teacher_id)),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // Duplicate signup with the same email fails.
    let (status, _) = h
        .request(
            "POST",
            "/auth/teacher/signup",
            None,
            Some(json!({
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email": "ada@example.com",
                "password": "correct horse",
                "national_id": "A-1"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn media_upload_requires_teacher_role() {
    let h = make_harness();
    let (_, student_token) = h.seed_student("sam@example.com").await;

    let (status, _) = h
        .request("POST", "/media/upload", Some(&student_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
