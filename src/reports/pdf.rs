//! PDF rendering of report layouts with genpdf

use std::path::{Path, PathBuf};

use genpdf::elements::{Break, FrameCellDecorator, Paragraph, TableLayout};
use genpdf::fonts::{self, FontData, FontFamily};
use genpdf::style::{Style, StyledString};
use genpdf::{Document, Element as _, Margins, PaperSize, SimplePageDecorator};
use tracing::debug;

use super::document::{Cell, ReportDocument};
use crate::config::ReportsConfig;
use crate::utils::errors::{Result, SchoolError};

const TITLE_SIZE: u8 = 16;
const BODY_SIZE: u8 = 10;

/// Renders layouts to A4 PDFs with the configured font family
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    font_dir: PathBuf,
    font_family: String,
}

impl PdfRenderer {
    pub fn new(config: &ReportsConfig) -> Self {
        Self {
            font_dir: PathBuf::from(&config.font_dir),
            font_family: config.font_family.clone(),
        }
    }

    pub fn font_dir(&self) -> &Path {
        &self.font_dir
    }

    fn load_fonts(&self) -> Result<FontFamily<FontData>> {
        fonts::from_files(&self.font_dir, &self.font_family, None).map_err(|e| {
            SchoolError::Pdf(format!(
                "cannot load font family {} from {}: {}",
                self.font_family,
                self.font_dir.display(),
                e
            ))
        })
    }

    fn cell(cell: &Cell) -> Paragraph {
        let style = if cell.bold { Style::new().bold() } else { Style::new() };
        Paragraph::new(StyledString::new(cell.text.clone(), style))
    }

    pub fn render(&self, report: &ReportDocument) -> Result<Vec<u8>> {
        let mut doc = Document::new(self.load_fonts()?);
        doc.set_title(report.title.clone());
        doc.set_paper_size(PaperSize::A4);
        doc.set_font_size(BODY_SIZE);

        let mut decorator = SimplePageDecorator::new();
        decorator.set_margins(Margins::trbl(14, 10, 10, 10));
        doc.set_page_decorator(decorator);

        doc.push(Paragraph::new(report.title.clone()).styled(Style::new().bold().with_font_size(TITLE_SIZE)));
        doc.push(Break::new(1));
        for line in &report.header_lines {
            doc.push(Paragraph::new(line.clone()));
        }
        doc.push(Break::new(2));

        let mut table = TableLayout::new(report.widths());
        table.set_cell_decorator(FrameCellDecorator::new(true, true, false));

        let mut header = table.row();
        for column in &report.columns {
            header.push_element(Paragraph::new(column.header).styled(Style::new().bold()).padded(1));
        }
        header.push()?;

        for cells in &report.rows {
            let mut row = table.row();
            for cell in cells {
                row.push_element(Self::cell(cell).padded(1));
            }
            row.push()?;
        }
        doc.push(table);

        let mut buffer = Vec::new();
        doc.render(&mut buffer)?;
        debug!(title = %report.title, bytes = buffer.len(), "PDF rendered");
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_font_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = PdfRenderer::new(&ReportsConfig {
            font_dir: dir.path().display().to_string(),
            font_family: "DejaVuSans".to_string(),
        });
        let report = ReportDocument {
            title: "Отчёт".to_string(),
            header_lines: Vec::new(),
            columns: Vec::new(),
            rows: Vec::new(),
            filename: "report.pdf".to_string(),
        };

        let error = renderer.render(&report).unwrap_err();
        assert!(matches!(error, SchoolError::Pdf(message) if message.contains("DejaVuSans")));
    }
}
