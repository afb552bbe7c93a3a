use crate::blocks::split_blocks;
use crate::fields::parse_block;
use crate::language::Vocabulary;
use crate::layout::document_lines;
use crate::model::{PageLines, ParsedCourse, Weekday};
use crate::options::MarkerSet;
use crate::table_parse::is_notes_line;

/// Text following each line that names exactly one weekday, up to the next
/// day line or notes marker.
pub(crate) fn day_segments(pages: &[PageLines]) -> Vec<(Weekday, String)> {
    let mut segments: Vec<(Weekday, Vec<String>)> = Vec::new();
    let mut open = false;

    for line in document_lines(pages) {
        let text = line.text();
        if let Some(day) = Weekday::from_label(&text) {
            segments.push((day, Vec::new()));
            open = true;
            continue;
        }
        if is_notes_line(&text) {
            open = false;
            continue;
        }
        if open && let Some((_, lines)) = segments.last_mut() {
            lines.push(text);
        }
    }

    segments
        .into_iter()
        .map(|(day, lines)| (day, lines.join("\n")))
        .collect()
}

/// Scans the document line by line when no table header could be used.
pub(crate) fn scan_courses(
    pages: &[PageLines],
    vocab: &Vocabulary,
    markers: &MarkerSet,
) -> Vec<ParsedCourse> {
    day_segments(pages)
        .into_iter()
        .flat_map(|(day, segment)| {
            split_blocks(&segment, vocab, markers)
                .into_iter()
                .filter_map(|block| parse_block(&block, &[], vocab, markers))
                .map(move |course| ParsedCourse {
                    day: Some(day),
                    ..course
                })
                .collect::<Vec<_>>()
        })
        .collect()
}
