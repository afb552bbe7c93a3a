use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Line, PageLines, Weekday};

pub(crate) const PERIOD_COLUMN: usize = 0;
pub(crate) const SECTION_COLUMN: usize = 1;
pub(crate) const FIRST_DAY_COLUMN: usize = 2;

const PERIOD_COLUMN_MARKERS: &[&str] = &["时间段", "時間段", "time period"];
const DEFAULT_COLUMN_GAP: f32 = 40.0;

static DAY_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:星期|[周週]|禮拜|礼拜)[一二三四五六日天]|\b(?:mon(?:day)?|tue(?:s|sday)?|wed(?:nesday)?|thu(?:rs|rsday)?|fri(?:day)?|sat(?:urday)?|sun(?:day)?)\b",
    )
    .expect("hardcoded day token regex is valid")
});

fn day_from_token(token: &str) -> Option<Weekday> {
    if let Some(last) = token.chars().last()
        && !last.is_ascii()
    {
        return Weekday::from_label(&format!("星期{last}"));
    }
    let prefix = token.get(..3)?;
    Weekday::from_label(prefix)
}

/// Distinct weekdays named anywhere in `text`, in order of first appearance.
pub(crate) fn day_tokens(text: &str) -> Vec<Weekday> {
    let mut seen = BTreeSet::new();
    DAY_TOKEN_RE
        .find_iter(text)
        .filter_map(|found| day_from_token(found.as_str()))
        .filter(|day| seen.insert(*day))
        .collect()
}

fn has_period_marker(text: &str) -> bool {
    let lowered = text.to_lowercase();
    PERIOD_COLUMN_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

pub(crate) fn is_header_text(text: &str) -> bool {
    has_period_marker(text) || day_tokens(text).len() >= 2
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HeaderHit {
    pub page_index: usize,
    pub line_index: usize,
}

/// Finds the day-of-week header row. Per page, a "time period" marker line
/// wins over a line that merely names two or more weekdays.
pub(crate) fn locate_header(pages: &[PageLines]) -> Option<HeaderHit> {
    for (page_index, page) in pages.iter().enumerate() {
        let texts = page.lines.iter().map(Line::text).collect::<Vec<_>>();
        let found = texts
            .iter()
            .position(|text| has_period_marker(text))
            .or_else(|| texts.iter().position(|text| day_tokens(text).len() >= 2));
        if let Some(line_index) = found {
            return Some(HeaderHit {
                page_index,
                line_index,
            });
        }
    }
    None
}

/// Midpoints between adjacent column centers.
pub(crate) fn boundaries_from_centers(centers: &[f32]) -> Vec<f32> {
    centers
        .windows(2)
        .map(|pair| (pair[0] + pair[1]) / 2.0)
        .collect()
}

/// Index of the first boundary `x` does not exceed, else the last column.
pub(crate) fn column_for_x(boundaries: &[f32], x: f32) -> usize {
    boundaries
        .iter()
        .position(|boundary| x <= *boundary)
        .unwrap_or(boundaries.len())
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HeaderLayout {
    pub labels: Vec<String>,
    pub centers: Vec<f32>,
    pub boundaries: Vec<f32>,
    pub days: Vec<Weekday>,
}

impl HeaderLayout {
    /// Builds the column layout from the header line's runs: two leading
    /// columns (period label, section number) then one column per day label.
    /// Returns `None` when the line carries no usable day label.
    pub(crate) fn from_line(line: &Line) -> Option<Self> {
        let mut days = Vec::new();
        let mut day_centers = Vec::new();
        let mut day_labels = Vec::new();
        for run in &line.runs {
            let tokens = day_tokens(&run.text);
            let [day] = tokens.as_slice() else {
                continue;
            };
            if days.contains(day) {
                continue;
            }
            days.push(*day);
            day_centers.push(run.x);
            day_labels.push(run.text.trim().to_string());
        }

        let first_day_x = *day_centers.first()?;
        let gap = day_centers
            .get(1)
            .map_or(DEFAULT_COLUMN_GAP, |second| (second - first_day_x).max(1.0));

        let leading = line
            .runs
            .iter()
            .filter(|run| run.x < first_day_x && day_tokens(&run.text).is_empty())
            .collect::<Vec<_>>();
        let (period, section) = match leading.as_slice() {
            [] => (
                ("Period".to_string(), first_day_x - 2.0 * gap),
                ("Section".to_string(), first_day_x - gap),
            ),
            [only] => (
                (only.text.trim().to_string(), only.x),
                ("Section".to_string(), (only.x + first_day_x) / 2.0),
            ),
            [first, .., last] => (
                (first.text.trim().to_string(), first.x),
                (last.text.trim().to_string(), last.x),
            ),
        };

        let mut labels = vec![period.0, section.0];
        labels.extend(day_labels);
        let mut centers = vec![period.1, section.1];
        centers.extend(day_centers);

        Some(Self {
            boundaries: boundaries_from_centers(&centers),
            labels,
            centers,
            days,
        })
    }

    pub(crate) fn column_count(&self) -> usize {
        self.centers.len()
    }

    pub(crate) fn column_for_x(&self, x: f32) -> usize {
        column_for_x(&self.boundaries, x)
    }

    pub(crate) fn day_for_column(&self, column: usize) -> Option<Weekday> {
        column
            .checked_sub(FIRST_DAY_COLUMN)
            .and_then(|index| self.days.get(index).copied())
    }
}

#[cfg(test)]
mod tests {
    use crate::header::{
        HeaderLayout, boundaries_from_centers, column_for_x, day_tokens, locate_header,
    };
    use crate::model::{Line, PageLines, TextRun, Weekday};

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
    fn assigns_columns_by_nearest_boundary() {
        let boundaries = boundaries_from_centers(&[10.0, 30.0, 50.0]);
        assert_eq!(boundaries, vec![20.0, 40.0]);
        assert_eq!(column_for_x(&boundaries, 25.0), 1);
        assert_eq!(column_for_x(&boundaries, 5.0), 0);
        assert_eq!(column_for_x(&boundaries, 100.0), 2);
    }

    #[test]
    fn recognizes_day_tokens_in_both_languages() {
        assert_eq!(day_tokens("星期一 星期二 周三"), vec![
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed
        ]);
        assert_eq!(day_tokens("Period Section Mon Tuesday"), vec![
            Weekday::Mon,
            Weekday::Tue
        ]);
        assert!(day_tokens("Monitor the section").is_empty());
    }

    #[test]
    fn prefers_period_marker_line_over_day_line() {
        let pages = vec![PageLines {
            page_number: 1,
            lines: vec![
                line(&[("Mon", 10.0), ("Tue", 20.0)], 10.0),
                line(&[("时间段", 10.0), ("节次", 20.0)], 20.0),
            ],
        }];
        let hit = locate_header(&pages).expect("header should be found");
        assert_eq!(hit.line_index, 1);
    }

    #[test]
    fn builds_layout_with_leading_columns() {
        let header = line(
            &[("Period", 10.0), ("Section", 40.0), ("Mon", 100.0), ("Tue", 200.0)],
            50.0,
        );
        let layout = HeaderLayout::from_line(&header).expect("layout should build");
        assert_eq!(layout.column_count(), 4);
        assert_eq!(layout.days, vec![Weekday::Mon, Weekday::Tue]);
        assert_eq!(layout.column_for_x(12.0), 0);
        assert_eq!(layout.column_for_x(45.0), 1);
        assert_eq!(layout.column_for_x(95.0), 2);
        assert_eq!(layout.day_for_column(3), Some(Weekday::Tue));
        assert_eq!(layout.day_for_column(1), None);
    }

    #[test]
    fn synthesizes_leading_columns_when_missing() {
        let header = line(&[("星期一", 100.0), ("星期二", 150.0)], 50.0);
        let layout = HeaderLayout::from_line(&header).expect("layout should build");
        assert_eq!(layout.centers, vec![0.0, 50.0, 100.0, 150.0]);
    }

    #[test]
    fn rejects_header_without_day_labels() {
        let header = line(&[("时间段", 10.0), ("节次", 40.0)], 50.0);
        assert!(HeaderLayout::from_line(&header).is_none());
    }
}
