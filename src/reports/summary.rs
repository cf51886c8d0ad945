//! Grade averages per student

use std::collections::HashMap;

use serde::Serialize;

use crate::models::{ClassRoomBrief, GradeDetails, GradeFilter, UserSummary};
use crate::utils::helpers::{format_score, round2};

/// Shown instead of an average when there are no grades
pub const PLACEHOLDER: &str = "-";

/// Arithmetic mean of raw grade values, rounded to two decimals
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(round2(values.iter().sum::<f64>() / values.len() as f64))
    }
}

pub fn format_average(average: Option<f64>) -> String {
    average.map(format_score).unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Non-empty notes joined with ", ", or the placeholder
pub fn joined_notes(grades: &[GradeDetails]) -> String {
    let notes: Vec<&str> = grades
        .iter()
        .map(|g| g.note.trim())
        .filter(|note| !note.is_empty())
        .collect();
    if notes.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        notes.join(", ")
    }
}

/// One row of the class report
#[derive(Debug, Clone, Serialize)]
pub struct StudentSummary {
    pub student: UserSummary,
    pub average: Option<f64>,
    pub average_display: String,
    pub grade_count: usize,
    pub comment: String,
    pub grades: Vec<GradeDetails>,
}

impl StudentSummary {
    pub fn new(student: UserSummary, grades: Vec<GradeDetails>) -> Self {
        let values: Vec<f64> = grades.iter().map(|g| g.value).collect();
        let average = mean(&values);
        Self {
            average_display: format_average(average),
            grade_count: grades.len(),
            comment: joined_notes(&grades),
            student,
            average,
            grades,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassReport {
    pub classroom: ClassRoomBrief,
    pub filter: GradeFilter,
    pub students: Vec<StudentSummary>,
}

/// Group a class's grades by student; rows follow the order of `students`
pub fn summarize_class(students: Vec<UserSummary>, grades: Vec<GradeDetails>) -> Vec<StudentSummary> {
    let mut by_student: HashMap<i64, Vec<GradeDetails>> = HashMap::new();
    for grade in grades {
        by_student.entry(grade.student.id).or_default().push(grade);
    }

    students
        .into_iter()
        .map(|student| {
            let grades = by_student.remove(&student.id).unwrap_or_default();
            StudentSummary::new(student, grades)
        })
        .collect()
}

/// A single student's grades, newest first, with their mean
#[derive(Debug, Clone, Serialize)]
pub struct StudentReport {
    pub student: UserSummary,
    pub classroom: Option<ClassRoomBrief>,
    pub average: Option<f64>,
    pub average_display: String,
    pub grades: Vec<GradeDetails>,
}

impl StudentReport {
    pub fn new(student: UserSummary, grades: Vec<GradeDetails>) -> Self {
        let values: Vec<f64> = grades.iter().map(|g| g.value).collect();
        let average = mean(&values);
        Self {
            classroom: grades.first().map(|g| g.lesson.classroom.clone()),
            average_display: format_average(average),
            student,
            average,
            grades,
        }
    }
}
