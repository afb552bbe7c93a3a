use std::collections::BTreeSet;

/// Week numbers above this are treated as noise (years, room numbers).
pub(crate) const MAX_WEEK: u32 = 60;
const MAX_SECTION: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Parity {
    Odd,
    Even,
}

fn is_range_sep(ch: char) -> bool {
    matches!(ch, '-' | '~' | '～' | '－' | '—' | '–')
}

fn is_list_sep(ch: char) -> bool {
    matches!(ch, ',' | '，' | '、' | ';' | '；') || ch.is_whitespace()
}

fn parse_number(token: &str) -> Option<u32> {
    let digits = token
        .trim()
        .trim_start_matches('第')
        .trim_end_matches(['周', '週', '节', '節']);
    digits.trim().parse::<u32>().ok()
}

/// Expands a week pattern such as `1,2,3-5,7` or `1-8，10-16` into a sorted,
/// deduplicated list. Unparseable tokens are skipped.
#[must_use]
pub fn expand_weeks(pattern: &str) -> Vec<u32> {
    expand_into(pattern, MAX_WEEK).into_iter().collect()
}

pub(crate) fn expand_with_parity(pattern: &str, parity: Option<Parity>) -> Vec<u32> {
    expand_weeks(pattern)
        .into_iter()
        .filter(|week| match parity {
            Some(Parity::Odd) => week % 2 == 1,
            Some(Parity::Even) => week % 2 == 0,
            None => true,
        })
        .collect()
}

/// Inclusive section range `start..=end`, tolerant of reversed bounds.
/// Inclusive section range; `None` when it leaves `1..=MAX_SECTION`.
pub(crate) fn section_range(start: u32, end: u32) -> Option<Vec<u32>> {
    let (low, high) = if start <= end { (start, end) } else { (end, start) };
    (low >= 1 && high <= MAX_SECTION).then(|| (low..=high).collect())
}

/// Sections named by a row label such as `1`, `3-4` or `5-6节`.
pub(crate) fn expand_sections(label: &str) -> Vec<u32> {
    expand_into(label, MAX_SECTION).into_iter().collect()
}

fn expand_into(pattern: &str, max: u32) -> BTreeSet<u32> {
    let mut out = BTreeSet::new();
    for token in pattern.split(is_list_sep).filter(|token| !token.is_empty()) {
        if let Some((start, end)) = token.split_once(is_range_sep) {
            let (Some(start), Some(end)) = (parse_number(start), parse_number(end)) else {
                continue;
            };
            let (low, high) = if start <= end { (start, end) } else { (end, start) };
            if low == 0 || high > max {
                continue;
            }
            out.extend(low..=high);
        } else if let Some(week) = parse_number(token)
            && (1..=max).contains(&week)
        {
            out.insert(week);
        }
    }
    out
}
