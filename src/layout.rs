use crate::model::{Line, PageLines, PageRuns, TextRun};

/// Buckets a page's runs into lines.
///
/// A run joins the first existing line whose `y` lies within `tolerance`.
/// Lines are returned top to bottom whatever order the runs arrived in, and
/// each line's runs are sorted left to right.
pub(crate) fn group_lines(runs: &[TextRun], tolerance: f32) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();

    for run in runs {
        if run.text.trim().is_empty() {
            continue;
        }

        match lines
            .iter_mut()
            .find(|line| (line.y - run.y).abs() <= tolerance)
        {
            Some(line) => line.runs.push(run.clone()),
            None => lines.push(Line {
                y: run.y,
                runs: vec![run.clone()],
            }),
        }
    }

    for line in &mut lines {
        line.runs.sort_by(|left, right| left.x.total_cmp(&right.x));
    }
    lines.sort_by(|upper, lower| upper.y.total_cmp(&lower.y));

    lines
}

pub(crate) fn group_pages(pages: &[PageRuns], tolerance: f32) -> Vec<PageLines> {
    pages
        .iter()
        .map(|page| PageLines {
            page_number: page.page_number,
            lines: group_lines(&page.runs, tolerance),
        })
        .collect()
}

/// Every line of the document in reading order.
pub(crate) fn document_lines(pages: &[PageLines]) -> impl Iterator<Item = &Line> {
    pages.iter().flat_map(|page| page.lines.iter())
}

#[cfg(test)]
mod tests {
    use crate::layout::group_lines;
    use crate::model::TextRun;

    #[test]
    fn groups_runs_within_tolerance_and_sorts_by_x() {
        let runs = vec![
            TextRun::new("B", 50.0, 100.0),
            TextRun::new("A", 10.0, 101.5),
            TextRun::new("C", 10.0, 120.0),
            TextRun::new("  ", 30.0, 120.0),
        ];

        let lines = group_lines(&runs, 2.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(), "A B");
        assert_eq!(lines[1].text(), "C");
        assert_eq!(lines[1].runs.len(), 1);
    }

    #[test]
    fn orders_lines_top_to_bottom_for_column_major_runs() {
        let runs = vec![
            TextRun::new("1-2", 10.0, 30.0),
            TextRun::new("3-4", 10.0, 60.0),
            TextRun::new("#B", 100.0, 30.0),
            TextRun::new("Week=7-8", 100.0, 45.0),
        ];

        let lines = group_lines(&runs, 2.0);
        let texts = lines.iter().map(|line| line.text()).collect::<Vec<_>>();
        assert_eq!(texts, vec!["1-2 #B", "Week=7-8", "3-4"]);
    }
}
