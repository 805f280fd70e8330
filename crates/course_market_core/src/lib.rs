pub mod domain;
pub mod ports;

pub use domain::{
    Course, CourseUpdate, Credentials, NewCourse, NewStudent, NewTeacher, Role, Student,
    StoredMedia, Teacher, TeacherProfile, TeacherStats, ThumbnailEntry, ValidationError, VideoEntry,
};
pub use ports::{DatabaseService, MediaStorageService, PortError, PortResult};
