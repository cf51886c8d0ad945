//! A small school used by the integration tests
//!
//! Two classrooms, each curated by its own teacher, one student in each, one
//! lesson in each, and an administrator.

use chrono::NaiveDate;

use school_journal::database::DatabaseService;
use school_journal::models::{
    ClassRoom, CreateClassRoomRequest, CreateEnrollmentRequest, CreateLessonRequest, CreateSubjectRequest,
    CreateUserRequest, Lesson, Role, Subject, User,
};
use school_journal::services::auth::hash_password;

pub const PASSWORD: &str = "correct-horse";

pub async fn create_user(db: &DatabaseService, email: &str, first_name: &str, last_name: &str, role: Role) -> User {
    let username = email.split('@').next().unwrap_or(email).to_string();
    let user = db
        .users
        .create(CreateUserRequest {
            email: email.to_string(),
            username,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            password_hash: hash_password(PASSWORD).expect("hash"),
            role,
        })
        .await
        .expect("Failed to create user");
    db.profiles.create_empty(user.id).await.expect("Failed to create profile");
    user
}

pub async fn create_classroom(db: &DatabaseService, grade_level: i16, name: &str, curator: Option<&User>) -> ClassRoom {
    db.classrooms
        .create(CreateClassRoomRequest {
            grade_level,
            name: name.to_string(),
            curator_id: curator.map(|u| u.id),
        })
        .await
        .expect("Failed to create classroom")
}

pub async fn enroll(db: &DatabaseService, student: &User, classroom: &ClassRoom) {
    db.enrollments
        .create(CreateEnrollmentRequest {
            student_id: student.id,
            classroom_id: classroom.id,
        })
        .await
        .expect("Failed to enroll student");
}

pub async fn create_subject(db: &DatabaseService, name: &str, code: &str, teacher: Option<&User>) -> Subject {
    db.subjects
        .create(CreateSubjectRequest {
            name: name.to_string(),
            code: code.to_string(),
            teacher_id: teacher.map(|u| u.id),
        })
        .await
        .expect("Failed to create subject")
}

pub async fn create_lesson(
    db: &DatabaseService,
    subject: &Subject,
    classroom: &ClassRoom,
    teacher: &User,
    date: NaiveDate,
    topic: &str,
) -> Lesson {
    db.lessons
        .create(CreateLessonRequest {
            subject_id: subject.id,
            classroom_id: classroom.id,
            teacher_id: teacher.id,
            date,
            topic: topic.to_string(),
        })
        .await
        .expect("Failed to create lesson")
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub struct School {
    pub admin: User,
    pub teacher: User,
    pub other_teacher: User,
    pub student: User,
    pub other_student: User,
    pub classroom: ClassRoom,
    pub other_classroom: ClassRoom,
    pub subject: Subject,
    pub lesson: Lesson,
    pub other_lesson: Lesson,
}

impl School {
    pub async fn seed(db: &DatabaseService) -> Self {
        let admin = create_user(db, "director@school.test", "Анна", "Смирнова", Role::Admin).await;
        let teacher = create_user(db, "petrov@school.test", "Пётр", "Петров", Role::Teacher).await;
        let other_teacher = create_user(db, "sidorova@school.test", "Мария", "Сидорова", Role::Teacher).await;
        let student = create_user(db, "ivanov@school.test", "Иван", "Иванов", Role::Student).await;
        let other_student = create_user(db, "kuznetsova@school.test", "Ольга", "Кузнецова", Role::Student).await;

        let classroom = create_classroom(db, 5, "А", Some(&teacher)).await;
        let other_classroom = create_classroom(db, 6, "Б", Some(&other_teacher)).await;
        enroll(db, &student, &classroom).await;
        enroll(db, &other_student, &other_classroom).await;

        let subject = create_subject(db, "Математика", "MATH-1A2B", Some(&teacher)).await;
        let lesson = create_lesson(db, &subject, &classroom, &teacher, date(2025, 3, 3), "Дроби").await;
        let other_lesson =
            create_lesson(db, &subject, &other_classroom, &other_teacher, date(2025, 3, 4), "Уравнения").await;

        Self {
            admin,
            teacher,
            other_teacher,
            student,
            other_student,
            classroom,
            other_classroom,
            subject,
            lesson,
            other_lesson,
        }
    }
}
