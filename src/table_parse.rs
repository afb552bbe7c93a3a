use std::sync::LazyLock;

use regex::Regex;

use crate::blocks::split_blocks;
use crate::fields::parse_block;
use crate::header::{FIRST_DAY_COLUMN, HeaderHit, HeaderLayout, is_header_text};
use crate::language::Vocabulary;
use crate::merge::row_sections;
use crate::model::{Line, PageLines, ParsedCourse};
use crate::options::MarkerSet;

pub(crate) type Row = Vec<String>;

static NOTES_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:备注|備註|注\s*[:：]|其[它他]课程|其[它他]課程|实践课程|實踐課程|notes?\b|remarks?\b|practice\s+courses?\b|other\s+courses?\b|intensive\s+courses?\b)",
    )
    .expect("hardcoded notes marker regex is valid")
});

/// Lines that close the timetable grid (legend notes, outside-course lists).
pub(crate) fn is_notes_line(text: &str) -> bool {
    NOTES_MARKER_RE.is_match(text)
}

pub(crate) fn line_to_row(line: &Line, layout: &HeaderLayout) -> Row {
    let mut row = vec![String::new(); layout.column_count()];
    for run in &line.runs {
        let text = run.text.trim();
        if text.is_empty() {
            continue;
        }
        let cell = &mut row[layout.column_for_x(run.x)];
        if !cell.is_empty() {
            cell.push(' ');
        }
        cell.push_str(text);
    }
    row
}

/// Rebuilds the grid rows following the header, across page breaks, until a
/// notes line ends the table. Repeated header lines on later pages are
/// skipped.
pub(crate) fn reconstruct_rows(
    pages: &[PageLines],
    hit: HeaderHit,
    layout: &HeaderLayout,
) -> Vec<Row> {
    let mut rows = Vec::new();

    for (page_index, page) in pages.iter().enumerate().skip(hit.page_index) {
        let first_line = if page_index == hit.page_index {
            hit.line_index + 1
        } else {
            0
        };

        for line in page.lines.iter().skip(first_line) {
            let text = line.text();
            if is_notes_line(&text) {
                return rows;
            }
            if page_index > hit.page_index && is_header_text(&text) {
                continue;
            }
            rows.push(line_to_row(line, layout));
        }
    }

    rows
}

/// Parses every day cell of the merged grid into courses, row by row.
pub(crate) fn courses_from_rows(
    rows: &[Row],
    layout: &HeaderLayout,
    vocab: &Vocabulary,
    markers: &MarkerSet,
) -> Vec<ParsedCourse> {
    let mut courses = Vec::new();
    for row in rows {
        let sections = row_sections(row);
        for (column, cell) in row.iter().enumerate().skip(FIRST_DAY_COLUMN) {
            let Some(day) = layout.day_for_column(column) else {
                continue;
            };
            courses.extend(
                split_blocks(cell, vocab, markers)
                    .iter()
                    .filter_map(|block| parse_block(block, &sections, vocab, markers))
                    .map(|course| ParsedCourse {
                        day: Some(day),
                        ..course
                    }),
            );
        }
    }
    courses
}

#[cfg(test)]
mod tests {
    use crate::header::{HeaderHit, HeaderLayout};
    use crate::language::Vocabulary;
    use crate::model::{Line, PageLines, TextRun, Weekday};
    use crate::options::MarkerSet;
    use crate::table_parse::{courses_from_rows, is_notes_line, reconstruct_rows};

    fn line(runs: &[(&str, f32)], y: f32) -> Line {
        Line {
            y,
            runs: runs
                .iter()
                .map(|(text, x)| TextRun::new(*text, *x, y))
                .collect(),
        }
    }

    #[test]
    fn buckets_runs_into_columns_across_pages() {
        let header = line(
            &[("Period", 10.0), ("Section", 40.0), ("Mon", 100.0), ("Tue", 200.0)],
            10.0,
        );
        let layout = HeaderLayout::from_line(&header).expect("layout");
        let pages = vec![
            PageLines {
                page_number: 1,
                lines: vec![
                    line(&[("Student Timetable", 10.0)], 0.0),
                    header,
                    line(&[("1-2", 10.0), ("1", 40.0), ("△A", 95.0), ("B", 120.0)], 20.0),
                ],
            },
            PageLines {
                page_number: 2,
                lines: vec![
                    line(&[("Period", 10.0), ("Mon", 100.0), ("Tue", 200.0)], 5.0),
                    line(&[("3-4", 10.0), ("3", 40.0), ("★C", 210.0)], 20.0),
                    line(&[("Notes: legend", 10.0)], 40.0),
                    line(&[("9-10", 10.0), ("9", 40.0), ("★D", 210.0)], 60.0),
                ],
            },
        ];

        let rows = reconstruct_rows(
            &pages,
            HeaderHit {
                page_index: 0,
                line_index: 1,
            },
            &layout,
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["1-2", "1", "△A B", ""]);
        assert_eq!(rows[1], vec!["3-4", "3", "", "★C"]);
    }

    #[test]
    fn recognizes_notes_markers() {
        assert!(is_notes_line("备注: 课程表仅供参考"));
        assert!(is_notes_line("Practice course: Field Training★"));
        assert!(is_notes_line("其它课程：无"));
        assert!(!is_notes_line("Noteworthy Seminar△"));
    }

    #[test]
    fn parses_cells_with_their_column_day() {
        let header = line(
            &[("Period", 10.0), ("Section", 40.0), ("Mon", 100.0), ("Tue", 200.0)],
            10.0,
        );
        let layout = HeaderLayout::from_line(&header).expect("layout");
        let rows = vec![vec![
            "5-6".to_string(),
            "5".to_string(),
            String::new(),
            "★Robotics Week=4-6\n@Lab 2".to_string(),
        ]];

        let courses = courses_from_rows(
            &rows,
            &layout,
            &Vocabulary::select(false),
            &MarkerSet::default(),
        );
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].day, Some(Weekday::Tue));
        assert_eq!(courses[0].periods, vec![5]);
        assert_eq!(courses[0].weeks, vec![4, 5, 6]);
        assert_eq!(courses[0].location.as_deref(), Some("Lab 2"));
    }
}
