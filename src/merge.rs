use std::collections::HashMap;

use crate::header::{FIRST_DAY_COLUMN, PERIOD_COLUMN, SECTION_COLUMN};
use crate::table_parse::Row;
use crate::weeks::expand_sections;

fn is_blank(row: &Row, column: usize) -> bool {
    row.get(column).is_none_or(|cell| cell.trim().is_empty())
}

fn is_continuation(row: &Row) -> bool {
    is_blank(row, PERIOD_COLUMN) && is_blank(row, SECTION_COLUMN)
}

/// Folds wrapped continuation rows back into the rows they overflowed from.
///
/// A continuation row has neither a period label nor a section number. Each
/// of its day fragments is appended to the nearest earlier row (at most
/// `window` rows back) that last held text in the same column. Rows left
/// without any day text are dropped.
pub(crate) fn merge_continuation_rows(rows: Vec<Row>, window: usize) -> Vec<Row> {
    let mut merged: Vec<Row> = Vec::with_capacity(rows.len());
    let mut last_filled: HashMap<usize, usize> = HashMap::new();

    for mut row in rows {
        if is_continuation(&row) {
            for column in FIRST_DAY_COLUMN..row.len() {
                let fragment = row[column].trim().to_string();
                if fragment.is_empty() {
                    continue;
                }
                let Some(&target) = last_filled.get(&column) else {
                    continue;
                };
                if merged.len() - target > window {
                    continue;
                }
                let cell = &mut merged[target][column];
                cell.push('\n');
                cell.push_str(&fragment);
                row[column].clear();
            }

            if (FIRST_DAY_COLUMN..row.len()).all(|column| is_blank(&row, column)) {
                continue;
            }
        }

        let index = merged.len();
        for column in FIRST_DAY_COLUMN..row.len() {
            if !is_blank(&row, column) {
                last_filled.insert(column, index);
            }
        }
        merged.push(row);
    }

    merged
}

/// Periods implied by a row's section column, else its period-label column.
pub(crate) fn row_sections(row: &Row) -> Vec<u32> {
    [SECTION_COLUMN, PERIOD_COLUMN]
        .into_iter()
        .filter_map(|column| row.get(column))
        .map(|cell| expand_sections(cell))
        .find(|sections| !sections.is_empty())
        .unwrap_or_default()
}
