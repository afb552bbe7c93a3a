use crate::model::Weekday;

const CHINESE_LAYOUT_KEYWORDS: &[&str] = &[
    "课表",
    "課表",
    "学号",
    "學號",
    "教师",
    "教師",
    "星期一",
    "星期二",
    "星期三",
    "星期四",
    "星期五",
    "星期六",
    "星期日",
    "星期天",
];

pub(crate) fn detect_chinese(text: &str) -> bool {
    CHINESE_LAYOUT_KEYWORDS
        .iter()
        .any(|keyword| text.contains(keyword))
}

pub(crate) fn is_han(ch: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&ch)
        || ('\u{3400}'..='\u{4DBF}').contains(&ch)
        || ('\u{F900}'..='\u{FAFF}').contains(&ch)
}

/// Decides whether a line or token looks like a person's name in one layout.
pub(crate) trait NameMatcher: Sync {
    fn is_name_line(&self, line: &str) -> bool;

    /// A name-shaped token at the very start of `text`, if any.
    fn leading_name(&self, text: &str) -> Option<String>;
}

pub(crate) struct CjkNames;

const CJK_SCHEDULE_KEYWORDS: &[&str] = &[
    "周", "週", "节", "節", "校区", "校區", "场地", "場地", "地点", "教室", "课", "課", "楼", "星期",
    "学期", "学年", "考试", "未排",
];

impl NameMatcher for CjkNames {
    fn is_name_line(&self, line: &str) -> bool {
        let line = line.trim();
        if CJK_SCHEDULE_KEYWORDS
            .iter()
            .any(|keyword| line.contains(keyword))
        {
            return false;
        }

        let mut han = 0_usize;
        for ch in line.chars() {
            if is_han(ch) {
                han += 1;
            } else if !matches!(ch, '·' | ',' | '，' | '、' | ' ' | '\u{3000}') {
                return false;
            }
        }
        (2..=16).contains(&han)
    }

    fn leading_name(&self, text: &str) -> Option<String> {
        let candidate = text
            .trim_start()
            .chars()
            .take_while(|ch| is_han(*ch) || *ch == '·')
            .collect::<String>();
        let count = candidate.chars().count();
        ((2..=4).contains(&count) && self.is_name_line(&candidate)).then_some(candidate)
    }
}

pub(crate) struct LatinNames;

const LATIN_JARGON: &[&str] = &[
    "lab",
    "labs",
    "lecture",
    "theory",
    "practice",
    "practical",
    "technical",
    "experiment",
    "week",
    "weeks",
    "section",
    "sections",
    "period",
    "periods",
    "campus",
    "area",
    "room",
    "building",
    "hall",
    "online",
    "course",
    "courses",
    "intro",
    "introduction",
    "advanced",
    "principles",
    "fundamentals",
    "engineering",
    "design",
    "analysis",
    "management",
    "seminar",
    "project",
    "training",
    "field",
    "teacher",
    "teachers",
    "notes",
    "remarks",
    "data",
    "structures",
    "systems",
    "computer",
    "science",
    "programming",
    "mathematics",
    "calculus",
    "physics",
    "chemistry",
    "english",
    "chinese",
    "language",
    "economics",
    "statistics",
    "networks",
    "database",
    "unscheduled",
    "schedule",
];

fn is_latin_name_token(token: &str) -> bool {
    let mut chars = token.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_uppercase() {
        return false;
    }
    if !token
        .chars()
        .all(|ch| ch.is_ascii_alphabetic() || matches!(ch, '.' | '\'' | '-'))
    {
        return false;
    }

    let bare = token.trim_end_matches('.').to_ascii_lowercase();
    !LATIN_JARGON.contains(&bare.as_str()) && Weekday::from_label(&bare).is_none()
}

impl NameMatcher for LatinNames {
    fn is_name_line(&self, line: &str) -> bool {
        let tokens = line.split_whitespace().collect::<Vec<_>>();
        (2..=4).contains(&tokens.len()) && tokens.iter().all(|token| is_latin_name_token(token))
    }

    fn leading_name(&self, text: &str) -> Option<String> {
        let tokens = text
            .split_whitespace()
            .take_while(|token| is_latin_name_token(token))
            .take(4)
            .collect::<Vec<_>>();
        let candidate = tokens.join(" ");
        self.is_name_line(&candidate).then_some(candidate)
    }
}

static CJK_NAMES: CjkNames = CjkNames;
static LATIN_NAMES: LatinNames = LatinNames;

/// Language-dependent pieces of the extraction, chosen once per document.
#[derive(Clone, Copy)]
pub(crate) struct Vocabulary {
    pub chinese: bool,
    pub names: &'static dyn NameMatcher,
}

impl Vocabulary {
    pub(crate) fn select(chinese: bool) -> Self {
        let names: &'static dyn NameMatcher = if chinese { &CJK_NAMES } else { &LATIN_NAMES };
        Self { chinese, names }
    }
}

impl std::fmt::Debug for Vocabulary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vocabulary")
            .field("chinese", &self.chinese)
            .finish_non_exhaustive()
    }
}
