//! Cleanup applied to the combined grid, fallback and outside course list.

use std::collections::HashMap;

use crate::model::{ParsedCourse, Weekday};

const NOISE_NAMES: &[&str] = &[
    "period",
    "section",
    "time period",
    "notes",
    "remarks",
    "theory",
    "technical",
    "practice",
    "experiment",
    "时间段",
    "時間段",
    "节次",
    "節次",
    "备注",
    "備註",
    "理论",
    "技术",
    "实践",
    "实验",
    "上午",
    "下午",
    "晚上",
];

/// Fills missing teachers from sibling records of the same course, first by
/// name, day and periods, then by name and day alone.
fn backfill_teachers(courses: &mut [ParsedCourse]) {
    let mut by_slot: HashMap<(String, Option<Weekday>, Vec<u32>), String> = HashMap::new();
    let mut by_day: HashMap<(String, Option<Weekday>), String> = HashMap::new();
    for course in courses.iter() {
        if let (Some(name), Some(teacher)) = (&course.name, &course.teacher) {
            by_slot
                .entry((name.clone(), course.day, course.periods.clone()))
                .or_insert_with(|| teacher.clone());
            by_day
                .entry((name.clone(), course.day))
                .or_insert_with(|| teacher.clone());
        }
    }

    for course in courses.iter_mut().filter(|course| course.teacher.is_none()) {
        let Some(name) = course.name.clone() else {
            continue;
        };
        course.teacher = by_slot
            .get(&(name.clone(), course.day, course.periods.clone()))
            .or_else(|| by_day.get(&(name, course.day)))
            .cloned();
    }
}

fn named_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}

/// Decodes HTML-style entity escapes left behind by some extraction services.
pub(crate) fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let decoded = tail
            .find(';')
            .filter(|end| *end <= 10)
            .and_then(|end| named_entity(&tail[1..end]).map(|ch| (ch, end)));
        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_course_entities(course: &mut ParsedCourse) {
    for field in [&mut course.name, &mut course.teacher, &mut course.location]
        .into_iter()
        .flatten()
    {
        *field = decode_entities(field);
    }
    course.raw = decode_entities(&course.raw);
}

fn is_fragment_name(name: &str) -> bool {
    let name = name.trim();
    let lowered = name.to_lowercase();
    lowered.starts_with("and ")
        || ["&", "和", "与", "與", "及", "-", "－", "—"]
            .iter()
            .any(|prefix| name.starts_with(prefix))
        || name.chars().count() <= 2
        || name.chars().next().is_some_and(char::is_lowercase)
}

/// Joins outside-table fragments split by a stray `;` back into the entry
/// they belong to.
fn merge_outside_fragments(courses: Vec<ParsedCourse>) -> Vec<ParsedCourse> {
    let mut merged: Vec<ParsedCourse> = Vec::with_capacity(courses.len());
    for course in courses {
        let fragment_name = course
            .name
            .as_deref()
            .filter(|name| course.outside && is_fragment_name(name));
        if let (Some(fragment), Some(previous)) = (fragment_name, merged.last_mut())
            && previous.outside
        {
            let joined = format!("{} {fragment}", previous.name.as_deref().unwrap_or_default());
            previous.name = Some(joined.trim().to_string());
            previous.raw = format!("{}; {}", previous.raw, course.raw);
            if previous.weeks.is_empty() {
                previous.weeks = course.weeks;
            }
            previous.teacher = previous.teacher.take().or(course.teacher);
            previous.location = previous.location.take().or(course.location);
            continue;
        }
        merged.push(course);
    }
    merged
}

fn is_noise(course: &ParsedCourse) -> bool {
    let Some(name) = course.name.as_deref().map(str::trim) else {
        return true;
    };
    if name.is_empty() || name.starts_with([':', '：']) {
        return true;
    }
    if NOISE_NAMES.contains(&name.to_lowercase().as_str()) || Weekday::from_label(name).is_some() {
        return true;
    }
    name.chars().count() <= 2
        && course.teacher.is_none()
        && course.location.is_none()
        && course.course_type.is_none()
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn postprocess(mut courses: Vec<ParsedCourse>) -> Vec<ParsedCourse> {
    backfill_teachers(&mut courses);
    courses.iter_mut().for_each(decode_course_entities);

    let mut courses = merge_outside_fragments(courses);
    courses.retain(|course| !is_noise(course));
    for course in &mut courses {
        for field in [&mut course.name, &mut course.teacher, &mut course.location]
            .into_iter()
            .flatten()
        {
            *field = collapse_whitespace(field);
        }
    }
    courses
}
