use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize, Serializer};

/// One positioned text fragment as produced by the extraction layer.
///
/// `y` grows downwards: a run with a larger `y` sits lower on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

impl TextRun {
    #[must_use]
    pub fn new(text: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRuns {
    pub page_number: u32,
    pub runs: Vec<TextRun>,
}

/// Runs sharing one vertical bucket, ordered left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub y: f32,
    pub runs: Vec<TextRun>,
}

impl Line {
    #[must_use]
    pub fn text(&self) -> String {
        self.runs
            .iter()
            .map(|run| run.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageLines {
    pub page_number: u32,
    pub lines: Vec<Line>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub const ALL: [Self; 7] = [
        Self::Mon,
        Self::Tue,
        Self::Wed,
        Self::Thu,
        Self::Fri,
        Self::Sat,
        Self::Sun,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mon => "Mon",
            Self::Tue => "Tue",
            Self::Wed => "Wed",
            Self::Thu => "Thu",
            Self::Fri => "Fri",
            Self::Sat => "Sat",
            Self::Sun => "Sun",
        }
    }

    /// Parses a bare day label: `Mon`, `Monday`, `星期一`, `周一`, `週一`.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }

        for prefix in ["星期", "周", "週", "礼拜", "禮拜"] {
            if let Some(rest) = label.strip_prefix(prefix) {
                let mut chars = rest.chars();
                let day = chars.next().and_then(Self::from_cjk_numeral)?;
                return chars.next().is_none().then_some(day);
            }
        }

        let lowered = label.trim_end_matches('.').to_ascii_lowercase();
        let full_names = [
            "monday",
            "tuesday",
            "wednesday",
            "thursday",
            "friday",
            "saturday",
            "sunday",
        ];
        Self::ALL
            .into_iter()
            .zip(full_names)
            .find(|(day, full)| lowered == day.as_str().to_ascii_lowercase() || lowered == *full)
            .map(|(day, _)| day)
    }

    fn from_cjk_numeral(ch: char) -> Option<Self> {
        match ch {
            '一' => Some(Self::Mon),
            '二' => Some(Self::Tue),
            '三' => Some(Self::Wed),
            '四' => Some(Self::Thu),
            '五' => Some(Self::Fri),
            '六' => Some(Self::Sat),
            '日' | '天' => Some(Self::Sun),
            _ => None,
        }
    }
}

impl Display for Weekday {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCourse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<Weekday>,
    pub periods: Vec<u32>,
    pub weeks: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub course_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_char: Option<String>,
    pub raw: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub outside: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseSummary {
    pub name: Option<String>,
    pub day: Option<Weekday>,
    pub weeks: Vec<u32>,
    pub location: Option<String>,
    pub teacher: Option<String>,
    #[serde(rename = "type")]
    pub course_type: Option<String>,
}

/// Coarse 4-week display window. Orders numerically with `Unscheduled` last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MonthBucket {
    Month(u32),
    Unscheduled,
}

impl Display for MonthBucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Month(index) => write!(f, "Month {index}"),
            Self::Unscheduled => f.write_str("Unscheduled"),
        }
    }
}

impl Serialize for MonthBucket {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub courses: Vec<ParsedCourse>,
    pub student: StudentInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    pub is_chinese: bool,
    pub table_by_month: BTreeMap<MonthBucket, Vec<CourseSummary>>,
}
