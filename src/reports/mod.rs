//! Reporting: aggregation of journal data and document layouts
//!
//! `summary` computes averages, `document` lays the tables out as plain data
//! and `pdf` renders a layout with genpdf.

pub mod document;
pub mod pdf;
pub mod summary;

pub use document::{Cell, Column, ReportDocument};
pub use pdf::PdfRenderer;
pub use summary::{ClassReport, StudentReport, StudentSummary};
