use std::collections::{BTreeMap, BTreeSet};

use crate::model::{CourseSummary, MonthBucket, ParsedCourse};

/// Four-week month a teaching week falls into. An approximation for display,
/// not an academic calendar computation.
pub(crate) fn month_of_week(week: u32) -> u32 {
    week.saturating_sub(1) / 4 + 1
}

fn summarize(course: &ParsedCourse) -> CourseSummary {
    CourseSummary {
        name: course.name.clone(),
        day: course.day,
        weeks: course.weeks.clone(),
        location: course.location.clone(),
        teacher: course.teacher.clone(),
        course_type: course.course_type.clone(),
    }
}

/// Lists every course under each month its weeks touch; courses without
/// weeks go to the unscheduled bucket.
pub(crate) fn group_by_month(courses: &[ParsedCourse]) -> BTreeMap<MonthBucket, Vec<CourseSummary>> {
    let mut table: BTreeMap<MonthBucket, Vec<CourseSummary>> = BTreeMap::new();
    for course in courses {
        let buckets = if course.weeks.is_empty() {
            BTreeSet::from([MonthBucket::Unscheduled])
        } else {
            course
                .weeks
                .iter()
                .map(|week| MonthBucket::Month(month_of_week(*week)))
                .collect()
        };
        for bucket in buckets {
            table.entry(bucket).or_default().push(summarize(course));
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use crate::model::{MonthBucket, ParsedCourse};
    use crate::month::{group_by_month, month_of_week};

    #[test]
    fn weeks_map_to_four_week_months() {
        assert_eq!(month_of_week(1), 1);
        assert_eq!(month_of_week(4), 1);
        assert_eq!(month_of_week(5), 2);
        assert_eq!(month_of_week(9), 3);
    }

    #[test]
    fn groups_courses_by_month_with_unscheduled_last() {
        let spread = ParsedCourse {
            name: Some("Ethics".to_string()),
            weeks: vec![1, 5, 9],
            ..ParsedCourse::default()
        };
        let floating = ParsedCourse {
            name: Some("Seminar".to_string()),
            ..ParsedCourse::default()
        };

        let table = group_by_month(&[spread, floating]);
        let labels = table.keys().map(ToString::to_string).collect::<Vec<_>>();
        assert_eq!(labels, vec!["Month 1", "Month 2", "Month 3", "Unscheduled"]);
        assert_eq!(table[&MonthBucket::Month(2)][0].name.as_deref(), Some("Ethics"));
        assert_eq!(table[&MonthBucket::Unscheduled][0].weeks, Vec::<u32>::new());
    }
}
