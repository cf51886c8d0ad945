//! Database service layer
//! 
//! This module provides a high-level interface to database operations

use serde::Serialize;

use crate::database::{
    AttendanceRepository, ClassroomRepository, DatabasePool, EnrollmentRepository, GradeRepository,
    LessonRepository, ProfileRepository, SubjectRepository, UserRepository,
};
use crate::models::{LessonDetails, Role};
use crate::services::access::Scope;
use crate::utils::errors::SchoolError;
use crate::utils::helpers::Pagination;

/// Counters and recent lessons shown on the landing page
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub classrooms: i64,
    pub lessons: i64,
    pub grades: i64,
    pub attendance: i64,
    pub subjects: i64,
    pub students: Option<i64>,
    pub teachers: Option<i64>,
    pub recent_lessons: Vec<LessonDetails>,
}

const RECENT_LESSONS: i64 = 5;

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pool: DatabasePool,
    pub users: UserRepository,
    pub profiles: ProfileRepository,
    pub subjects: SubjectRepository,
    pub classrooms: ClassroomRepository,
    pub enrollments: EnrollmentRepository,
    pub lessons: LessonRepository,
    pub grades: GradeRepository,
    pub attendance: AttendanceRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            profiles: ProfileRepository::new(pool.clone()),
            subjects: SubjectRepository::new(pool.clone()),
            classrooms: ClassroomRepository::new(pool.clone()),
            enrollments: EnrollmentRepository::new(pool.clone()),
            lessons: LessonRepository::new(pool.clone()),
            grades: GradeRepository::new(pool.clone()),
            attendance: AttendanceRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Role-specific landing page data; user counts only for administrators
    pub async fn dashboard_stats(&self, scope: &Scope) -> Result<DashboardStats, SchoolError> {
        let recent = self
            .lessons
            .list_visible(scope, Pagination::new(Some(1), RECENT_LESSONS))
            .await?;

        let (students, teachers) = match scope {
            Scope::All => (
                Some(self.users.count(Some(Role::Student)).await?),
                Some(self.users.count(Some(Role::Teacher)).await?),
            ),
            _ => (None, None),
        };

        Ok(DashboardStats {
            classrooms: self.classrooms.count_visible(scope).await?,
            lessons: recent.total,
            grades: self.grades.count_visible(scope).await?,
            attendance: self.attendance.count_visible(scope).await?,
            subjects: self.subjects.count().await?,
            students,
            teachers,
            recent_lessons: recent.items,
        })
    }
}
