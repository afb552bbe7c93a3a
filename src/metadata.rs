use std::sync::LazyLock;

use regex::Regex;

use crate::model::StudentInfo;

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("hardcoded metadata regex is valid")
}

static STUDENT_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)(?:学号|學號|student\s*(?:id|no\.?|number))\s*[:：]?\s*([A-Za-z]*\d[A-Za-z0-9]*)")
});

static STUDENT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(?i)(?:姓名|\bname)\s*[:：]\s*([^\n|,，;；]+)"));

static NEXT_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    regex(
        r"(?i)\s*(?:学号|學號|班级|班級|专业|專業|学院|學院|学期|學期|student\s*(?:id|no)|class|major|college|term|semester)\b",
    )
});

static TITLE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| regex(r"([\p{Han}·]{2,8}?)的?(?:课表|課表|课程表|課程表)"));

static TERM_DASHED_RE: LazyLock<Regex> =
    LazyLock::new(|| regex(r"(\d{4})\s*-\s*(\d{4})\s*-\s*(\d)(?:\D|$)"));

static TERM_CJK_RE: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(\d{4})\s*[-－至]\s*(\d{4})\s*(?:学年|學年)\s*第?\s*([一二三123])\s*(?:学期|學期)")
});

static TERM_ENGLISH_RE: LazyLock<Regex> = LazyLock::new(|| {
    regex(r"(?i)(\d{4})\s*-\s*(\d{4})\s*(?:academic\s+year)?\s*,?\s*(?:semester|term)\s*(\d)")
});

const GENERIC_TITLE_WORDS: &[&str] = &["学生", "學生", "个人", "個人", "班级", "班級", "本学期", "本學期"];

fn student_id(text: &str) -> Option<String> {
    STUDENT_ID_RE
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
}

fn labeled_name(text: &str) -> Option<String> {
    let captures = STUDENT_NAME_RE.captures(text)?;
    let value = captures.get(1)?.as_str();
    let value = NEXT_LABEL_RE
        .find(value)
        .map_or(value, |found| &value[..found.start()])
        .trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn title_name(text: &str) -> Option<String> {
    TITLE_NAME_RE
        .captures_iter(text)
        .filter_map(|captures| captures.get(1))
        .map(|name| name.as_str())
        .find(|name| !GENERIC_TITLE_WORDS.contains(name))
        .map(str::to_string)
}

pub(crate) fn extract_student(text: &str) -> StudentInfo {
    StudentInfo {
        id: student_id(text),
        name: labeled_name(text).or_else(|| title_name(text)),
    }
}

fn semester_digit(token: &str) -> Option<char> {
    match token {
        "一" | "1" => Some('1'),
        "二" | "2" => Some('2'),
        "三" | "3" => Some('3'),
        other => other.chars().next().filter(char::is_ascii_digit),
    }
}

/// Academic term normalized to `YYYY-YYYY-N`.
pub(crate) fn extract_term(text: &str) -> Option<String> {
    [&*TERM_CJK_RE, &*TERM_ENGLISH_RE, &*TERM_DASHED_RE]
        .into_iter()
        .find_map(|pattern| {
            let captures = pattern.captures(text)?;
            let start = captures.get(1)?.as_str();
            let end = captures.get(2)?.as_str();
            let semester = semester_digit(captures.get(3)?.as_str())?;
            Some(format!("{start}-{end}-{semester}"))
        })
}
