//! Field extraction for one course block.
//!
//! Every field is resolved by an ordered list of strategies; the first one
//! that produces a value wins and a miss simply leaves the field empty.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::language::{Vocabulary, is_han};
use crate::model::ParsedCourse;
use crate::options::MarkerSet;
use crate::weeks::{Parity, expand_weeks, expand_with_parity, section_range};

pub(crate) const UNSCHEDULED_LOCATION: &str = "Unscheduled";

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("hardcoded field regex is valid")
}

static META_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    regex(
        r"(?ix)^\s*(?:
            [（(]?\s*\d+\s*(?:[-~－]\s*\d+\s*)?(?:节|節|sections?|periods?)
          | (?:sections?|periods?|节次|節次)\s*[=:：]
          | weeks?\s*[=:：]
          | 第?\s*\d+(?:\s*[-~－,，、]\s*\d+)*\s*[周週]
          | (?:上课地点|地点|地點|场地|場地|教室|校区|校區|教学班|任课教师|教师|教師
             |campus|area|location|venue|classroom|room|teachers?|instructors?)\s*[:：/=]
          | @ | \|
          | qq\s*(?:群|group) | 群号
        )",
    )
});

static TEACHER_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)(?:任课教师|教师|教師|teachers?|instructors?)\s*[:：]\s*([^\n]*)")
});

static NEXT_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    regex(
        r"(?i)\s*(?:上课地点|地点|地點|场地|場地|教室|校区|校區|教学班|任课教师|教师|教師|campus|location|venue|classroom|teachers?|instructors?|学分|credits?)\s*[:：]",
    )
});

static FIELD_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    regex(
        r"(?i)[（(]\s*\d|weeks?\s*[=:：]|sections?\s*[=:：]|第\s*\d|\d+\s*[-~－]\s*\d+|\d+\s*[周週]|@|\||(?:任课教师|教师|教師|teachers?|instructors?|campus|location|venue|校区|校區|场地|場地|地点)\s*[:：/]|qq",
    )
});

static TIME_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)^(?:上午|下午|中午|晚上|早上|morning|afternoon|noon|evening)\s*[:：]?\s*")
});

static PAREN_SECTIONS_RE: LazyLock<Regex> = LazyLock::new(|| {
    regex(
        r"(?i)[（(]\s*(\d+)\s*(?:[-~－]\s*(\d+)\s*)?(?:节|節|sections?|periods?)\s*[）)]",
    )
});

static LABELED_SECTIONS_RE: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)(?:sections?|periods?|节次|節次)\s*[=:：]\s*(\d+)(?:\s*[-~－]\s*(\d+))?")
});

static DECLARED_WEEKS_RE: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)weeks?[ \t\u{3000}]*[=:：][ \t\u{3000}]*([\d \t\u{3000},，、\-~－]+)")
});

static SUFFIXED_WEEKS_RE: LazyLock<Regex> = LazyLock::new(|| {
    regex(
        r"(?:第[ \t\u{3000}]*)?(\d+(?:[ \t\u{3000}]*[-~－][ \t\u{3000}]*\d+)?(?:[ \t\u{3000}]*[,，、][ \t\u{3000}]*\d+(?:[ \t\u{3000}]*[-~－][ \t\u{3000}]*\d+)?)*)[ \t\u{3000}]*[周週]",
    )
});

static BARE_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?:^|[^\d])(\d{1,2})\s*[-~－]\s*(\d{1,2})(?:[^\d]|$)"));

static PARITY_RE: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?i)^\s*[（(]?\s*(单|單|odd|双|雙|even)"));

static ONLINE_GROUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)(?:qq\s*群|qq\s*group|群号|群號)\s*(?:号|號|no\.?|id)?\s*[:：]?\s*(\d{5,12})")
});

static VENUE_RE: LazyLock<Regex> = LazyLock::new(|| regex(r"@\s*([^|\n@]+)"));

static AREA_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)(?:上课地点|地点|地點|场地|場地|教室|location|venue|classroom|room)\s*[:：]\s*([^\n|/]+)")
});

static CAMPUS_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?i)(?:校区|校區|campus)\s*[:：]\s*([^\n|/]+)"));

static CAMPUS_AREA_SPAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?is)(?:campus\s*/\s*area|校区\s*/\s*场地|校區\s*/\s*場地)\s*[:：]\s*(.+?)\s*/\s*(?:teachers?|任课教师|教师|教師)")
});

pub(crate) fn is_meta_line(line: &str) -> bool {
    META_LINE_RE.is_match(line)
}

/// The text following a teacher label on `line`, if the line has one.
pub(crate) fn teacher_label_value(line: &str) -> Option<&str> {
    TEACHER_LABEL_RE
        .captures(line)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str().trim())
}

fn cut_at_next_label(value: &str) -> &str {
    NEXT_LABEL_RE
        .find(value)
        .map_or(value, |found| &value[..found.start()])
        .trim()
}

fn capture_u32(captures: &Captures<'_>, group: usize) -> Option<u32> {
    captures.get(group)?.as_str().parse().ok()
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// A block split into trimmed lines with its first marker located.
struct BlockView<'a> {
    lines: Vec<&'a str>,
    marker_line: usize,
    marker_offset: usize,
    glyph: char,
    vocab: &'a Vocabulary,
}

impl<'a> BlockView<'a> {
    fn new(text: &'a str, vocab: &'a Vocabulary, markers: &MarkerSet) -> Option<Self> {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>();
        let (marker_line, marker_offset, glyph) =
            lines.iter().enumerate().find_map(|(index, line)| {
                markers
                    .find_in(line)
                    .map(|(offset, marker)| (index, offset, marker.glyph))
            })?;
        Some(Self {
            lines,
            marker_line,
            marker_offset,
            glyph,
            vocab,
        })
    }

    fn before_marker(&self) -> &'a str {
        let line: &'a str = self.lines[self.marker_line];
        line[..self.marker_offset].trim()
    }

    fn after_marker(&self) -> &'a str {
        let line: &'a str = self.lines[self.marker_line];
        line[self.marker_offset + self.glyph.len_utf8()..].trim()
    }

    fn text(&self) -> String {
        self.lines.join("\n")
    }
}

type NameStrategy = fn(&BlockView<'_>) -> Option<String>;
type TeacherStrategy = fn(&BlockView<'_>) -> Option<String>;
type TextStrategy<T> = fn(&str) -> Option<T>;

const NAME_STRATEGIES: &[NameStrategy] = &[prelude_name, trailing_marker_name];
const PERIOD_STRATEGIES: &[TextStrategy<Vec<u32>>] = &[parenthesized_sections, labeled_sections];
const WEEK_STRATEGIES: &[TextStrategy<Vec<u32>>] = &[declared_weeks, suffixed_weeks, bare_range_weeks];
const LOCATION_STRATEGIES: &[TextStrategy<String>] = &[
    online_group_location,
    venue_location,
    labeled_location,
    campus_area_location,
];
const TEACHER_STRATEGIES: &[TeacherStrategy] = &[labeled_teacher, piped_teacher, last_name_line];

fn first_match<T>(strategies: &[TextStrategy<T>], text: &str) -> Option<T> {
    strategies.iter().find_map(|strategy| strategy(text))
}

fn prelude_name(view: &BlockView<'_>) -> Option<String> {
    let mut parts = view.lines[..view.marker_line]
        .iter()
        .copied()
        .filter(|line| !is_meta_line(line))
        .collect::<Vec<_>>();
    let before = view.before_marker();
    if !before.is_empty() {
        parts.push(before);
    }
    non_empty(&parts.join(" "))
}

fn trailing_marker_name(view: &BlockView<'_>) -> Option<String> {
    let after = view.after_marker();
    let end = FIELD_START_RE.find(after).map_or(after.len(), |found| found.start());
    non_empty(&after[..end])
}

fn strip_time_prefix(name: &str) -> String {
    TIME_PREFIX_RE.replace(name.trim(), "").trim().to_string()
}

fn parenthesized_sections(text: &str) -> Option<Vec<u32>> {
    let captures = PAREN_SECTIONS_RE.captures(text)?;
    let start = capture_u32(&captures, 1)?;
    let end = capture_u32(&captures, 2).unwrap_or(start);
    section_range(start, end)
}

fn labeled_sections(text: &str) -> Option<Vec<u32>> {
    let captures = LABELED_SECTIONS_RE.captures(text)?;
    let start = capture_u32(&captures, 1)?;
    let end = capture_u32(&captures, 2).unwrap_or(start);
    section_range(start, end)
}

fn parity_at(text: &str, offset: usize) -> Option<Parity> {
    let captures = PARITY_RE.captures(&text[offset..])?;
    match captures.get(1)?.as_str().to_ascii_lowercase().as_str() {
        "单" | "單" | "odd" => Some(Parity::Odd),
        _ => Some(Parity::Even),
    }
}

fn declared_weeks(text: &str) -> Option<Vec<u32>> {
    let captures = DECLARED_WEEKS_RE.captures(text)?;
    let pattern = captures.get(1)?;
    let weeks = expand_with_parity(pattern.as_str(), parity_at(text, pattern.end()));
    (!weeks.is_empty()).then_some(weeks)
}

fn suffixed_weeks(text: &str) -> Option<Vec<u32>> {
    SUFFIXED_WEEKS_RE.captures_iter(text).find_map(|captures| {
        let whole = captures.get(0)?;
        let weeks = expand_with_parity(captures.get(1)?.as_str(), parity_at(text, whole.end()));
        (!weeks.is_empty()).then_some(weeks)
    })
}

fn bare_range_weeks(text: &str) -> Option<Vec<u32>> {
    let without_sections = PAREN_SECTIONS_RE.replace_all(text, " ");
    let without_sections = LABELED_SECTIONS_RE.replace_all(&without_sections, " ");
    BARE_RANGE_RE.captures_iter(&without_sections).find_map(|captures| {
        let start = captures.get(1)?.as_str();
        let end = captures.get(2)?.as_str();
        let weeks = expand_weeks(&format!("{start}-{end}"));
        (!weeks.is_empty()).then_some(weeks)
    })
}

/// Weeks declared anywhere in `text`, by the same cascade used for blocks.
pub(crate) fn extract_weeks(text: &str) -> Vec<u32> {
    first_match(WEEK_STRATEGIES, text).unwrap_or_default()
}

pub(crate) fn online_group_location(text: &str) -> Option<String> {
    let captures = ONLINE_GROUP_RE.captures(text)?;
    Some(format!("Online {}", captures.get(1)?.as_str()))
}

fn venue_location(text: &str) -> Option<String> {
    let captures = VENUE_RE.captures_iter(text).last()?;
    non_empty(captures.get(1)?.as_str())
}

fn labeled_location(text: &str) -> Option<String> {
    let captures = AREA_LABEL_RE
        .captures(text)
        .or_else(|| CAMPUS_LABEL_RE.captures(text))?;
    non_empty(cut_at_next_label(captures.get(1)?.as_str()))
}

fn campus_area_location(text: &str) -> Option<String> {
    let captures = CAMPUS_AREA_SPAN_RE.captures(text)?;
    let span = captures.get(1)?.as_str();
    non_empty(&span.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Removes whitespace that sits between two Han characters.
pub(crate) fn join_cjk_gaps(text: &str) -> String {
    let chars = text.chars().collect::<Vec<_>>();
    let mut out = String::with_capacity(text.len());
    let mut index = 0;
    while index < chars.len() {
        let ch = chars[index];
        if ch.is_whitespace() && out.chars().next_back().is_some_and(is_han) {
            let mut next = index;
            while next < chars.len() && chars[next].is_whitespace() {
                next += 1;
            }
            if next < chars.len() && is_han(chars[next]) {
                index = next;
                continue;
            }
        }
        out.push(ch);
        index += 1;
    }
    out
}

pub(crate) fn normalize_location(location: &str) -> String {
    if !location.starts_with("Online") && (location.contains("未排") || location.contains("未定"))
    {
        return UNSCHEDULED_LOCATION.to_string();
    }
    join_cjk_gaps(location.trim())
}

fn labeled_teacher(view: &BlockView<'_>) -> Option<String> {
    let (index, captures) = view
        .lines
        .iter()
        .enumerate()
        .find_map(|(index, line)| TEACHER_LABEL_RE.captures(line).map(|c| (index, c)))?;
    let value = captures.get(1).map_or("", |value| value.as_str());
    let value = cut_at_next_label(value.split('|').next().unwrap_or_default())
        .trim_matches(|ch: char| ch == '/' || ch.is_whitespace());

    let mut names = Vec::new();
    if !value.is_empty() {
        names.push(value.to_string());
    }
    names.extend(
        view.lines[index + 1..]
            .iter()
            .take(2)
            .take_while(|line| view.vocab.names.is_name_line(line))
            .map(|line| (*line).to_string()),
    );
    non_empty(&names.join(", "))
}

fn piped_teacher(view: &BlockView<'_>) -> Option<String> {
    let line = view.lines.iter().rev().find(|line| line.contains('|'))?;
    let (_, tail) = line.rsplit_once('|')?;
    let tail = tail.trim();
    if is_meta_line(tail) {
        return None;
    }
    non_empty(tail)
}

fn last_name_line(view: &BlockView<'_>) -> Option<String> {
    view.lines[view.marker_line + 1..]
        .iter()
        .rev()
        .find(|line| view.vocab.names.is_name_line(line))
        .map(|line| (*line).to_string())
}

fn strip_teacher_from_name(name: &str, teacher: &str) -> String {
    if teacher.is_empty() || !name.contains(teacher) {
        return name.to_string();
    }
    let stripped = name
        .replace(teacher, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let stripped = stripped.trim_matches(|ch: char| matches!(ch, '|' | '/' | ',' | '，' | ' '));
    if stripped.is_empty() {
        name.to_string()
    } else {
        stripped.to_string()
    }
}

/// Parses one course block. Returns `None` when the block has no marker glyph.
///
/// `section_fallback` supplies periods for blocks that do not declare their
/// own sections; the caller fills in the day.
pub(crate) fn parse_block(
    block: &str,
    section_fallback: &[u32],
    vocab: &Vocabulary,
    markers: &MarkerSet,
) -> Option<ParsedCourse> {
    let view = BlockView::new(block, vocab, markers)?;
    let text = view.text();

    let teacher = TEACHER_STRATEGIES
        .iter()
        .find_map(|strategy| strategy(&view));
    let name = NAME_STRATEGIES
        .iter()
        .find_map(|strategy| strategy(&view))
        .map(|name| strip_time_prefix(&name))
        .map(|name| match &teacher {
            Some(teacher) => strip_teacher_from_name(&name, teacher),
            None => name,
        })
        .filter(|name| !name.is_empty());

    let periods =
        first_match(PERIOD_STRATEGIES, &text).unwrap_or_else(|| section_fallback.to_vec());
    let weeks = extract_weeks(&text);
    let location = first_match(LOCATION_STRATEGIES, &text).map(|value| normalize_location(&value));

    Some(ParsedCourse {
        name,
        day: None,
        periods,
        weeks,
        location,
        teacher,
        course_type: markers
            .label(view.glyph, vocab.chinese)
            .map(str::to_string),
        type_char: Some(view.glyph.to_string()),
        raw: block.trim().to_string(),
        outside: false,
    })
}

#[cfg(test)]
mod tests {
    use crate::fields::{is_meta_line, join_cjk_gaps, normalize_location, parse_block};
    use crate::language::Vocabulary;
    use crate::options::MarkerSet;

    fn english() -> Vocabulary {
        Vocabulary::select(false)
    }

    fn chinese() -> Vocabulary {
        Vocabulary::select(true)
    }

    #[test]
    fn parses_single_line_english_block() {
        let course = parse_block(
            "△Intro to CS (1-2 Section) Week=1-3 @RoomA | Prof. Lee",
            &[],
            &english(),
            &MarkerSet::default(),
        )
        .expect("block has a marker");

        assert_eq!(course.name.as_deref(), Some("Intro to CS"));
        assert_eq!(course.periods, vec![1, 2]);
        assert_eq!(course.weeks, vec![1, 2, 3]);
        assert_eq!(course.location.as_deref(), Some("RoomA"));
        assert_eq!(course.teacher.as_deref(), Some("Prof. Lee"));
        assert_eq!(course.course_type.as_deref(), Some("Theory"));
        assert_eq!(course.type_char.as_deref(), Some("△"));
    }

    #[test]
    fn parses_multi_line_chinese_block() {
        let block = "高等数学★\n(1-2节)1-16周\n校区:南校区 场地:教学楼A101\n教师:张三";
        let course =
            parse_block(block, &[], &chinese(), &MarkerSet::default()).expect("marker present");

        assert_eq!(course.name.as_deref(), Some("高等数学"));
        assert_eq!(course.periods, vec![1, 2]);
        assert_eq!(course.weeks, (1..=16).collect::<Vec<_>>());
        assert_eq!(course.location.as_deref(), Some("教学楼A101"));
        assert_eq!(course.teacher.as_deref(), Some("张三"));
        assert_eq!(course.course_type.as_deref(), Some("技术"));
    }

    #[test]
    fn teacher_label_extends_over_name_lines() {
        let block = "线性代数◆\n(3-4节)1-8周(单)\n地点:未排\n教师:\n李四\n王五";
        let course =
            parse_block(block, &[], &chinese(), &MarkerSet::default()).expect("marker present");

        assert_eq!(course.teacher.as_deref(), Some("李四, 王五"));
        assert_eq!(course.weeks, vec![1, 3, 5, 7]);
        assert_eq!(course.location.as_deref(), Some("Unscheduled"));
    }

    #[test]
    fn falls_back_to_row_sections_and_bare_ranges() {
        let course = parse_block(
            "Morning Physics Lab ■ 3-6",
            &[5, 6],
            &english(),
            &MarkerSet::default(),
        )
        .expect("marker present");

        assert_eq!(course.name.as_deref(), Some("Physics Lab"));
        assert_eq!(course.periods, vec![5, 6]);
        assert_eq!(course.weeks, vec![3, 4, 5, 6]);
        assert_eq!(course.course_type.as_deref(), Some("Experiment"));
    }

    #[test]
    fn week_declarations_stop_at_line_breaks() {
        let course = parse_block(
            "△Statics Week=10-12\n2 Hall B",
            &[],
            &english(),
            &MarkerSet::default(),
        )
        .expect("marker present");
        assert_eq!(course.weeks, vec![10, 11, 12]);
    }

    #[test]
    fn oversized_section_ranges_are_ignored() {
        let course = parse_block(
            "△Intro (1-3000000 Section) Week=1-3",
            &[],
            &english(),
            &MarkerSet::default(),
        )
        .expect("marker present");

        assert!(course.periods.is_empty());
        assert_eq!(course.weeks, vec![1, 2, 3]);
    }

    #[test]
    fn extracts_online_group_and_combined_campus_span() {
        let online = parse_block(
            "△Ethics Week:1-4 QQ群:123456789",
            &[],
            &english(),
            &MarkerSet::default(),
        )
        .expect("marker present");
        assert_eq!(online.location.as_deref(), Some("Online 123456789"));

        let span = parse_block(
            "△Statics (1-2 Section)\nCampus/Area: North\nHall 3 /Teachers: Dr. Wu",
            &[],
            &english(),
            &MarkerSet::default(),
        )
        .expect("marker present");
        assert_eq!(span.location.as_deref(), Some("North Hall 3"));
        assert_eq!(span.teacher.as_deref(), Some("Dr. Wu"));
    }

    #[test]
    fn last_name_line_is_used_without_labels() {
        let course = parse_block(
            "△Statics (1-2 Section)\nWeek=1-2\nMary Jane Smith",
            &[],
            &english(),
            &MarkerSet::default(),
        )
        .expect("marker present");
        assert_eq!(course.teacher.as_deref(), Some("Mary Jane Smith"));
    }

    #[test]
    fn returns_none_without_marker() {
        assert!(parse_block("Lunch break", &[], &english(), &MarkerSet::default()).is_none());
    }

    #[test]
    fn classifies_meta_lines() {
        assert!(is_meta_line("(1-2节)1-16周"));
        assert!(is_meta_line("Week=1-3"));
        assert!(is_meta_line("教师:张三"));
        assert!(is_meta_line("Campus/Area: North"));
        assert!(!is_meta_line("高等数学"));
        assert!(!is_meta_line("Intro to CS"));
    }

    #[test]
    fn rejoins_cjk_split_by_spaces() {
        assert_eq!(join_cjk_gaps("教学 楼 A101"), "教学楼 A101");
        assert_eq!(normalize_location("待定 未定"), "Unscheduled");
    }
}
