//! Tabular report layouts
//!
//! A layout is plain data (title, header lines, weighted columns, rows) so
//! it can be checked without fonts; `pdf` turns it into a PDF.

use chrono::NaiveDate;

use super::summary::{StudentReport, StudentSummary};
use crate::models::AttendanceDetails;
use crate::utils::helpers::{format_date, format_score};

const PLACEHOLDER: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub header: &'static str,
    /// Relative width
    pub width: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub bold: bool,
}

impl Cell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), bold: false }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self { text: text.into(), bold: true }
    }

    pub fn empty() -> Self {
        Self::plain("")
    }
}

/// A titled document holding one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDocument {
    pub title: String,
    /// Lines printed between the title and the table
    pub header_lines: Vec<String>,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
    /// Download name, e.g. `class_report_5A.pdf`
    pub filename: String,
}

impl ReportDocument {
    pub fn widths(&self) -> Vec<usize> {
        self.columns.iter().map(|c| c.width).collect()
    }

    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

const CLASS_COLUMNS: [(&str, usize); 4] = [
    ("Ученик", 130),
    ("Средний балл", 70),
    ("Кол-во оценок", 80),
    ("Комментарий", 200),
];

const STUDENT_COLUMNS: [(&str, usize); 7] = [
    ("Предмет", 70),
    ("Класс", 50),
    ("Тема урока", 100),
    ("Оценка", 50),
    ("Макс. балл", 50),
    ("Дата", 60),
    ("Комментарий", 120),
];

const ATTENDANCE_COLUMNS: [(&str, usize); 5] = [
    ("Ученик", 120),
    ("Дата", 70),
    ("Предмет", 100),
    ("Статус", 70),
    ("Комментарий", 150),
];

fn columns(layout: &[(&'static str, usize)]) -> Vec<Column> {
    layout.iter()
        .map(|&(header, width)| Column { header, width })
        .collect()
}

fn or_placeholder(text: &str) -> String {
    if text.trim().is_empty() {
        PLACEHOLDER.to_string()
    } else {
        text.to_string()
    }
}

/// Grade averages of every student in a class
pub fn class_grades(
    classroom_label: &str,
    rows: &[StudentSummary],
    generated_on: NaiveDate,
    author: &str,
) -> ReportDocument {
    ReportDocument {
        title: format!("Отчёт по классу {}", classroom_label),
        header_lines: vec![
            format!("Дата: {}", format_date(generated_on)),
            format!("Сформировал: {}", author),
        ],
        columns: columns(&CLASS_COLUMNS),
        rows: rows
            .iter()
            .map(|row| {
                vec![
                    Cell::plain(format!("{} {}", row.student.last_name, row.student.first_name)),
                    Cell::plain(row.average_display.clone()),
                    Cell::plain(row.grade_count.to_string()),
                    Cell::plain(row.comment.clone()),
                ]
            })
            .collect(),
        filename: format!("class_report_{}.pdf", classroom_label),
    }
}

/// Every grade of one student followed by the average row
pub fn student_grades(report: &StudentReport, generated_on: NaiveDate, author: &str) -> ReportDocument {
    let mut rows: Vec<Vec<Cell>> = report
        .grades
        .iter()
        .map(|grade| {
            vec![
                Cell::plain(grade.lesson.subject.name.clone()),
                Cell::plain(grade.lesson.classroom.label.clone()),
                Cell::plain(or_placeholder(&grade.lesson.topic)),
                Cell::plain(format_score(grade.value)),
                Cell::plain(format_score(grade.max_value)),
                Cell::plain(format_date(grade.date)),
                Cell::plain(or_placeholder(&grade.note)),
            ]
        })
        .collect();

    let mut average_row = vec![Cell::bold("Средний балл")];
    average_row.extend((0..STUDENT_COLUMNS.len() - 2).map(|_| Cell::empty()));
    average_row.push(Cell::bold(report.average_display.clone()));
    rows.push(average_row);

    ReportDocument {
        title: "Отчёт об успеваемости ученика".to_string(),
        header_lines: vec![
            format!("Дата формирования: {}", format_date(generated_on)),
            format!("Сформировал: {}", author),
        ],
        columns: columns(&STUDENT_COLUMNS),
        rows,
        filename: format!("student_report_{}.pdf", report.student.last_name),
    }
}

/// One row per attendance mark of the class's students
pub fn class_attendance(
    classroom_label: &str,
    records: &[AttendanceDetails],
    generated_on: NaiveDate,
    author: &str,
) -> ReportDocument {
    ReportDocument {
        title: format!("Отчёт по посещаемости класса {}", classroom_label),
        header_lines: vec![
            format!("Дата: {}", format_date(generated_on)),
            format!("Сформировал: {}", author),
        ],
        columns: columns(&ATTENDANCE_COLUMNS),
        rows: records
            .iter()
            .map(|record| {
                vec![
                    Cell::plain(format!("{} {}", record.student.last_name, record.student.first_name)),
                    Cell::plain(format_date(record.lesson.date)),
                    Cell::plain(record.lesson.subject.to_string()),
                    Cell::plain(record.status.label()),
                    Cell::plain(or_placeholder(&record.comment)),
                ]
            })
            .collect(),
        filename: format!("attendance_report_{}.pdf", classroom_label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttendanceStatus;
    use crate::reports::summary::tests::{grade, student};
    use crate::reports::summary::{summarize_class, StudentReport};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 12).unwrap()
    }

    #[test]
    fn test_class_document_layout() {
        let anna = student(1, "Анна", "Иванова");
        let rows = summarize_class(
            vec![anna.clone(), student(2, "Борис", "Смирнов")],
            vec![grade(1, &anna, 80.0, "устно"), grade(2, &anna, 100.0, "")],
        );
        let doc = class_grades("5A", &rows, today(), "Пётр Петров");

        assert_eq!(doc.title, "Отчёт по классу 5A");
        assert_eq!(doc.header_lines, vec!["Дата: 12.03.2025", "Сформировал: Пётр Петров"]);
        assert_eq!(doc.widths(), vec![130, 70, 80, 200]);
        assert_eq!(
            doc.columns.iter().map(|c| c.header).collect::<Vec<_>>(),
            vec!["Ученик", "Средний балл", "Кол-во оценок", "Комментарий"]
        );
        assert_eq!(doc.rows[0][0].text, "Иванова Анна");
        assert_eq!(doc.rows[0][1].text, "90.00");
        assert_eq!(doc.rows[0][2].text, "2");
        assert_eq!(doc.rows[0][3].text, "устно");
        assert_eq!(doc.rows[1][1].text, "-");
        assert_eq!(doc.rows[1][3].text, "-");
        assert_eq!(doc.content_disposition(), "attachment; filename=\"class_report_5A.pdf\"");
    }

    #[test]
    fn test_student_document_ends_with_average_row() {
        let anna = student(1, "Анна", "Иванова");
        let mut first = grade(1, &anna, 87.5, "");
        first.lesson.topic = String::new();
        let report = StudentReport::new(anna.clone(), vec![first, grade(2, &anna, 92.5, "отлично")]);
        let doc = student_grades(&report, today(), "Пётр Петров");

        assert_eq!(doc.title, "Отчёт об успеваемости ученика");
        assert_eq!(doc.header_lines[0], "Дата формирования: 12.03.2025");
        assert_eq!(doc.widths(), vec![70, 50, 100, 50, 50, 60, 120]);
        assert_eq!(doc.rows.len(), 3);

        let first_row: Vec<&str> = doc.rows[0].iter().map(|c| c.text.as_str()).collect();
        assert_eq!(first_row, vec!["Математика", "5А", "-", "87.50", "100.00", "02.09.2024", "-"]);

        let last = doc.rows.last().unwrap();
        assert_eq!(last.len(), 7);
        assert_eq!(last[0], Cell::bold("Средний балл"));
        assert_eq!(last[6], Cell::bold("90.00"));
        assert!(last[1..6].iter().all(|c| c.text.is_empty()));
        assert_eq!(doc.filename, "student_report_Иванова.pdf");
    }

    #[test]
    fn test_attendance_document_uses_status_labels() {
        let anna = student(1, "Анна", "Иванова");
        let lesson = grade(1, &anna, 0.0, "").lesson;
        let records: Vec<AttendanceDetails> = [AttendanceStatus::Present, AttendanceStatus::Absent, AttendanceStatus::Late]
            .into_iter()
            .enumerate()
            .map(|(i, status)| AttendanceDetails {
                id: i as i64,
                lesson: lesson.clone(),
                student: anna.clone(),
                status,
                status_label: status.label().to_string(),
                comment: if i == 1 { "болел".to_string() } else { String::new() },
            })
            .collect();

        let doc = class_attendance("5A", &records, today(), "Пётр Петров");

        assert_eq!(doc.title, "Отчёт по посещаемости класса 5A");
        assert_eq!(doc.widths(), vec![120, 70, 100, 70, 150]);
        let statuses: Vec<&str> = doc.rows.iter().map(|r| r[3].text.as_str()).collect();
        assert_eq!(statuses, vec!["Был", "Отсутствовал", "Опоздал"]);
        assert_eq!(doc.rows[0][2].text, "Математика (MATH-1A2B)");
        assert_eq!(doc.rows[0][4].text, "-");
        assert_eq!(doc.rows[1][4].text, "болел");
        assert_eq!(doc.filename, "attendance_report_5A.pdf");
    }
}
