use crate::fields::{is_meta_line, teacher_label_value};
use crate::language::Vocabulary;
use crate::options::MarkerSet;

/// First line after the block starting at `marker_line` that a following
/// block may claim as its name prelude. A bare teacher label keeps the name
/// line right below it.
fn claim_floor(lines: &[&str], marker_line: usize, limit: usize, vocab: &Vocabulary) -> usize {
    let mut floor = marker_line + 1;
    for index in marker_line + 1..limit {
        if teacher_label_value(lines[index]).is_some_and(str::is_empty)
            && index + 1 < limit
            && vocab.names.is_name_line(lines[index + 1])
        {
            floor = floor.max(index + 2);
        }
    }
    floor
}

/// Splits one cell into course blocks, one per marker line.
///
/// Each block starts at its marker line, backtracked over immediately
/// preceding lines that are neither markers nor meta declarations (the
/// course name prelude), and runs up to the next block's start.
pub(crate) fn split_blocks(cell: &str, vocab: &Vocabulary, markers: &MarkerSet) -> Vec<String> {
    let lines = cell
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>();
    let marker_lines = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| markers.find_in(line).is_some())
        .map(|(index, _)| index)
        .collect::<Vec<_>>();

    let mut starts = Vec::with_capacity(marker_lines.len());
    let mut floor = 0;
    for (position, &marker_line) in marker_lines.iter().enumerate() {
        let mut start = marker_line;
        while start > floor
            && markers.find_in(lines[start - 1]).is_none()
            && !is_meta_line(lines[start - 1])
        {
            start -= 1;
        }
        starts.push(start);

        let limit = marker_lines
            .get(position + 1)
            .copied()
            .unwrap_or(lines.len());
        floor = claim_floor(&lines, marker_line, limit, vocab);
    }

    starts
        .iter()
        .enumerate()
        .map(|(position, &start)| {
            let end = starts.get(position + 1).copied().unwrap_or(lines.len());
            lines[start..end].join("\n")
        })
        .collect()
}
