//! Database repositories module
//! 
//! This module contains all repository implementations for data access

pub mod attendance;
pub mod classroom;
pub mod enrollment;
pub mod grade;
pub mod lesson;
pub mod profile;
pub mod subject;
pub mod user;
mod rows;

// Re-export repositories
pub use attendance::AttendanceRepository;
pub use classroom::ClassroomRepository;
pub use enrollment::EnrollmentRepository;
pub use grade::GradeRepository;
pub use lesson::LessonRepository;
pub use profile::ProfileRepository;
pub use subject::SubjectRepository;
pub use user::UserRepository;
