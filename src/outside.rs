//! Courses listed in free text around the grid (practice weeks, online
//! courses, intensive sessions) rather than inside a day column.

use std::sync::LazyLock;

use regex::Regex;

use crate::fields::{UNSCHEDULED_LOCATION, extract_weeks, online_group_location};
use crate::language::Vocabulary;
use crate::layout::document_lines;
use crate::model::{PageLines, ParsedCourse};
use crate::options::MarkerSet;
use crate::table_parse::is_notes_line;

static CATEGORY_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:(?:practice|other|intensive)\s+courses?|其[它他]课程|其[它他]課程|实践课程|實踐課程)\s*[:：]?\s*",
    )
    .expect("hardcoded category prefix regex is valid")
});

static TOTAL_WEEKS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[总總共]\s*\d+\s*[周週]|total\s+(?:of\s+)?\d+\s+weeks?")
        .expect("hardcoded total weeks regex is valid")
});

fn has_unscheduled_indicator(text: &str) -> bool {
    text.contains("未排") || text.contains("未定") || text.to_lowercase().contains("unscheduled")
}

fn parse_entry(entry: &str, vocab: &Vocabulary, markers: &MarkerSet) -> Option<ParsedCourse> {
    let entry = entry.trim();
    let (offset, marker) = markers.find_in(entry)?;
    let name = entry[..offset].trim();
    if name.is_empty() {
        return None;
    }
    let after = entry[offset + marker.glyph.len_utf8()..].trim();

    let without_totals = TOTAL_WEEKS_RE.replace_all(after, " ");
    let location = online_group_location(entry).or_else(|| {
        has_unscheduled_indicator(entry).then(|| UNSCHEDULED_LOCATION.to_string())
    });

    Some(ParsedCourse {
        name: Some(name.to_string()),
        teacher: vocab.names.leading_name(after),
        weeks: extract_weeks(&without_totals),
        location,
        course_type: markers
            .label(marker.glyph, vocab.chinese)
            .map(str::to_string),
        type_char: Some(marker.glyph.to_string()),
        raw: entry.to_string(),
        outside: true,
        ..ParsedCourse::default()
    })
}

/// Extracts outside-table courses from category-prefixed lines and from
/// every line following such a line or a notes marker.
pub(crate) fn extract_outside_courses(
    pages: &[PageLines],
    vocab: &Vocabulary,
    markers: &MarkerSet,
) -> Vec<ParsedCourse> {
    let mut courses = Vec::new();
    let mut in_tail = false;

    for line in document_lines(pages) {
        let text = line.text();
        let body = if let Some(prefix) = CATEGORY_PREFIX_RE.find(&text) {
            in_tail = true;
            &text[prefix.end()..]
        } else if is_notes_line(&text) {
            in_tail = true;
            continue;
        } else if in_tail {
            text.as_str()
        } else {
            continue;
        };

        courses.extend(
            body.split([';', '；'])
                .filter_map(|entry| parse_entry(entry, vocab, markers)),
        );
    }

    courses
}
