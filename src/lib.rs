mod blocks;
mod csv_out;
mod error;
mod fallback;
mod fields;
mod header;
mod language;
mod layout;
mod merge;
mod metadata;
mod model;
mod month;
mod options;
mod outside;
mod pdf_reader;
mod postprocess;
mod table_parse;
mod warning;
mod weeks;

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::csv_out::{write_csv, write_csv_to_string};
use crate::fallback::scan_courses;
use crate::header::{HeaderLayout, locate_header};
use crate::language::{Vocabulary, detect_chinese};
use crate::layout::{document_lines, group_pages};
use crate::merge::merge_continuation_rows;
use crate::metadata::{extract_student, extract_term};
use crate::model::{Line, PageLines};
use crate::month::group_by_month;
use crate::outside::extract_outside_courses;
use crate::pdf_reader::read_pdf_pages_from_bytes;
use crate::postprocess::postprocess;
use crate::table_parse::{courses_from_rows, reconstruct_rows};

pub use error::ParseError;
pub use model::{
    CourseSummary, MonthBucket, PageRuns, ParseResult, ParsedCourse, StudentInfo, TextRun,
    Weekday,
};
pub use options::{LanguageMode, Marker, MarkerSet, PageSelection, ParseOptions};
pub use warning::{ParseWarning, WarningCode};
pub use weeks::expand_weeks;

/// How the grid courses of a document were recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// A day-of-week header was found and the grid rebuilt from it.
    Table,
    /// No usable header; days were taken from day-name lines.
    LineScan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    pub page_count: usize,
    pub course_count: usize,
    pub strategy: Strategy,
    pub warnings: Vec<ParseWarning>,
}

fn validate_options(options: &ParseOptions) -> Result<(), ParseError> {
    if !options.line_tolerance.is_finite() || options.line_tolerance <= 0.0 {
        return Err(ParseError::InvalidOption(format!(
            "line tolerance must be positive, got {}",
            options.line_tolerance
        )));
    }
    if options.continuation_window == 0 {
        return Err(ParseError::InvalidOption(
            "continuation window must be at least 1".to_string(),
        ));
    }
    if options.markers.is_empty() {
        return Err(ParseError::InvalidOption(
            "at least one marker glyph is required".to_string(),
        ));
    }
    if options.pages.as_ref().is_some_and(PageSelection::is_empty) {
        return Err(ParseError::InvalidPageSelection(
            "selection contains no pages".to_string(),
        ));
    }
    Ok(())
}

fn is_chinese_document(text: &str, mode: LanguageMode) -> bool {
    match mode {
        LanguageMode::Auto => detect_chinese(text),
        LanguageMode::Chinese => true,
        LanguageMode::English => false,
    }
}

fn grid_courses(
    pages: &[PageLines],
    vocab: &Vocabulary,
    options: &ParseOptions,
    warnings: &mut Vec<ParseWarning>,
) -> Option<Vec<ParsedCourse>> {
    let Some(hit) = locate_header(pages) else {
        warnings.push(ParseWarning::new(
            WarningCode::NoHeaderDetected,
            "no day-of-week header found; scanning day lines instead",
        ));
        return None;
    };
    let header_page = &pages[hit.page_index];
    let header: &Line = &header_page.lines[hit.line_index];
    let Some(layout) = HeaderLayout::from_line(header) else {
        warnings.push(
            ParseWarning::new(
                WarningCode::MalformedHeader,
                "header line has no usable day labels; scanning day lines instead",
            )
            .with_page(header_page.page_number),
        );
        return None;
    };

    let rows = reconstruct_rows(pages, hit, &layout);
    let row_count = rows.len();
    let rows = merge_continuation_rows(rows, options.continuation_window);
    debug!(
        page = header_page.page_number,
        columns = ?layout.labels,
        rows = row_count,
        merged_rows = rows.len(),
        "rebuilt timetable grid"
    );

    Some(courses_from_rows(&rows, &layout, vocab, &options.markers))
}

fn run_pipeline(
    pages: &[PageRuns],
    options: &ParseOptions,
    mut warnings: Vec<ParseWarning>,
) -> (ParseResult, ExtractionReport) {
    for page in pages.iter().filter(|page| page.runs.is_empty()) {
        warnings.push(
            ParseWarning::new(WarningCode::EmptyPage, "page has no extractable text")
                .with_page(page.page_number),
        );
    }

    let lines = group_pages(pages, options.line_tolerance);
    let text = document_lines(&lines)
        .map(Line::text)
        .collect::<Vec<_>>()
        .join("\n");
    let is_chinese = is_chinese_document(&text, options.language);
    let vocab = Vocabulary::select(is_chinese);
    debug!(
        pages = lines.len(),
        is_chinese, "grouped positioned text into lines"
    );

    let (mut courses, strategy) = match grid_courses(&lines, &vocab, options, &mut warnings) {
        Some(courses) => (courses, Strategy::Table),
        None => {
            warn!("no usable timetable header, falling back to line scan");
            (
                scan_courses(&lines, &vocab, &options.markers),
                Strategy::LineScan,
            )
        }
    };
    let grid_count = courses.len();
    courses.extend(extract_outside_courses(&lines, &vocab, &options.markers));
    debug!(
        grid = grid_count,
        outside = courses.len() - grid_count,
        "extracted raw course records"
    );

    let courses = postprocess(courses);
    if courses.is_empty() {
        warnings.push(ParseWarning::new(
            WarningCode::NoCoursesFound,
            "no courses were extracted from the selected pages",
        ));
    }
    info!(?strategy, courses = courses.len(), "parsed timetable");

    let result = ParseResult {
        table_by_month: group_by_month(&courses),
        student: extract_student(&text),
        term: extract_term(&text),
        is_chinese,
        courses,
    };
    let report = ExtractionReport {
        page_count: pages.len(),
        course_count: result.courses.len(),
        strategy,
        warnings,
    };
    (result, report)
}

/// Parses positioned text runs into courses.
///
/// # Errors
///
/// Returns an error when the options are invalid or the page selection
/// leaves no pages.
pub fn parse_pages(
    pages: &[PageRuns],
    options: &ParseOptions,
) -> Result<(ParseResult, ExtractionReport), ParseError> {
    validate_options(options)?;

    let selected = pages
        .iter()
        .filter(|page| {
            options
                .pages
                .as_ref()
                .is_none_or(|selection| selection.contains(page.page_number))
        })
        .cloned()
        .collect::<Vec<_>>();
    if selected.is_empty() {
        return Err(ParseError::NoPagesSelected);
    }

    Ok(run_pipeline(&selected, options, Vec::new()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RunsDocument {
    Numbered(Vec<PageRuns>),
    Bare(Vec<Vec<TextRun>>),
}

/// Reads runs serialized either as `[[{text,x,y}, ...], ...]` (pages numbered
/// from 1) or as `[{page_number, runs}, ...]`.
///
/// # Errors
///
/// Returns an error when the JSON matches neither shape.
pub fn runs_from_json(json: &str) -> Result<Vec<PageRuns>, ParseError> {
    let pages = match serde_json::from_str::<RunsDocument>(json)? {
        RunsDocument::Numbered(pages) => pages,
        RunsDocument::Bare(pages) => pages
            .into_iter()
            .zip(1_u32..)
            .map(|(runs, page_number)| PageRuns { page_number, runs })
            .collect(),
    };
    Ok(pages)
}

/// # Errors
///
/// Returns an error when the PDF cannot be read or loaded, or when the
/// options are invalid.
pub fn parse_timetable_pdf(
    input_pdf: &Path,
    options: &ParseOptions,
) -> Result<(ParseResult, ExtractionReport), ParseError> {
    let bytes = std::fs::read(input_pdf)?;
    parse_timetable_pdf_bytes(&bytes, options)
}

/// # Errors
///
/// Returns an error when the PDF cannot be loaded, when the options are
/// invalid, or when the page selection leaves no pages.
pub fn parse_timetable_pdf_bytes(
    input_pdf: &[u8],
    options: &ParseOptions,
) -> Result<(ParseResult, ExtractionReport), ParseError> {
    validate_options(options)?;

    let ingested = read_pdf_pages_from_bytes(input_pdf, options.pages.as_ref())?;
    Ok(run_pipeline(&ingested.pages, options, ingested.warnings))
}

/// # Errors
///
/// Returns an error when the file cannot be written.
pub fn write_courses_csv(output_csv: &Path, courses: &[ParsedCourse]) -> Result<(), ParseError> {
    write_csv(output_csv, courses)
}

/// # Errors
///
/// Returns an error when CSV serialization fails.
pub fn courses_to_csv_string(courses: &[ParsedCourse]) -> Result<String, ParseError> {
    write_csv_to_string(courses)
}

#[cfg(test)]
mod tests {
    use crate::{PageSelection, ParseError, ParseOptions, runs_from_json};

    #[test]
    fn rejects_invalid_options() {
        let options = ParseOptions {
            line_tolerance: 0.0,
            ..ParseOptions::default()
        };
        assert!(matches!(
            crate::parse_pages(&[], &options),
            Err(ParseError::InvalidOption(_))
        ));

        let options = ParseOptions {
            continuation_window: 0,
            ..ParseOptions::default()
        };
        assert!(matches!(
            crate::parse_pages(&[], &options),
            Err(ParseError::InvalidOption(_))
        ));
    }

    #[test]
    fn selection_without_matching_pages_is_an_error() {
        let pages = runs_from_json(r#"[[{"text":"Mon","x":1,"y":2}]]"#).expect("valid runs");
        let options = ParseOptions {
            pages: Some("3".parse::<PageSelection>().expect("valid selection")),
            ..ParseOptions::default()
        };
        assert!(matches!(
            crate::parse_pages(&pages, &options),
            Err(ParseError::NoPagesSelected)
        ));
    }

    #[test]
    fn reads_both_runs_json_shapes() {
        let bare = runs_from_json(r#"[[{"text":"A","x":1,"y":2}],[]]"#).expect("bare shape");
        assert_eq!(bare.len(), 2);
        assert_eq!(bare[1].page_number, 2);

        let numbered =
            runs_from_json(r#"[{"page_number":4,"runs":[{"text":"B","x":0,"y":0}]}]"#)
                .expect("numbered shape");
        assert_eq!(numbered[0].page_number, 4);
        assert_eq!(numbered[0].runs[0].text, "B");
    }
}
