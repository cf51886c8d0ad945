//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod attendance;
pub mod classroom;
pub mod enrollment;
pub mod grade;
pub mod lesson;
pub mod subject;
pub mod user;

// Re-export commonly used models
pub use attendance::{
    AttendanceDetails, AttendanceRecord, AttendanceStatus, CreateAttendanceRequest, UpdateAttendanceRequest,
};
pub use classroom::{ClassRoom, ClassRoomBrief, ClassRoomDetails, CreateClassRoomRequest};
pub use enrollment::{CreateEnrollmentRequest, Enrollment, EnrollmentDetails};
pub use grade::{CreateGradeRequest, GradeDetails, GradeFilter, GradeRecord, UpdateGradeRequest};
pub use lesson::{CreateLessonRequest, Lesson, LessonDetails};
pub use subject::{CreateSubjectRequest, Subject, SubjectBrief, SubjectDetails};
pub use user::{
    CreateUserRequest, Profile, Role, UpdateProfileRequest, UpdateUserRequest, User, UserSummary,
};
