//! Rendering of execution outcomes as text for the answer stage.

use crate::db::QueryResult;
use crate::query::ExecutionOutcome;

/// Rendered text for a statement that described no result set.
pub const NO_RECORDS_MESSAGE: &str = "Query ran successfully, no record found";

/// Renders an outcome: `Error: <message>`, the no-record message, or a pipe
/// table.
pub fn render(outcome: &ExecutionOutcome) -> String {
    match outcome {
        ExecutionOutcome::Failed(message) => format!("Error: {}", message),
        ExecutionOutcome::NoRecords => NO_RECORDS_MESSAGE.to_string(),
        ExecutionOutcome::Rows(result) => render_table(result),
    }
}

/// Renders a result set as a header row, a separator row, and one line per row.
///
/// Cells missing from a short row render as empty strings.
pub fn render_table(result: &QueryResult) -> String {
    let header = format!("| {} |", result.column_names().join(" | "));
    let separator = format!("| {} |", vec!["---"; result.columns.len()].join(" | "));

    let mut lines = Vec::with_capacity(result.rows.len() + 2);
    lines.push(header);
    lines.push(separator);

    for row in &result.rows {
        let cells: Vec<String> = (0..result.columns.len())
            .map(|i| row.get(i).map(|v| v.to_display_string()).unwrap_or_default())
            .collect();
        lines.push(format!("| {} |", cells.join(" | ")));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ColumnInfo, Value};
    use pretty_assertions::assert_eq;

    fn columns() -> Vec<ColumnInfo> {
        vec![
            ColumnInfo::new("country_name", "text"),
            ColumnInfo::new("life_ladder", "float8"),
        ]
    }

    #[test]
    fn test_render_rows() {
        let result = QueryResult::with_data(
            columns(),
            vec![
                vec![Value::from("Vietnam"), Value::Float(6.27)],
                vec![Value::from("Finland"), Value::Null],
            ],
        );

        assert_eq!(
            render(&ExecutionOutcome::Rows(result)),
            "| country_name | life_ladder |\n\
             | --- | --- |\n\
             | Vietnam | 6.27 |\n\
             | Finland | NULL |"
        );
    }

    #[test]
    fn test_render_zero_rows_keeps_header() {
        let result = QueryResult::with_data(columns(), vec![]);
        let rendered = render(&ExecutionOutcome::Rows(result));

        assert_eq!(rendered, "| country_name | life_ladder |\n| --- | --- |");
        assert_eq!(rendered.lines().count(), 2);
    }

    #[test]
    fn test_render_short_row_pads_with_empty_cells() {
        let result = QueryResult::with_data(columns(), vec![vec![Value::from("Chad")]]);
        assert_eq!(
            render_table(&result).lines().last(),
            Some("| Chad |  |")
        );
    }

    #[test]
    fn test_render_error_and_no_records() {
        assert_eq!(
            render(&ExecutionOutcome::Failed("No query provided".to_string())),
            "Error: No query provided"
        );
        assert_eq!(
            render(&ExecutionOutcome::NoRecords),
            "Query ran successfully, no record found"
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let outcome = ExecutionOutcome::Rows(QueryResult::with_data(
            columns(),
            vec![vec![Value::from("Peru"), Value::Float(5.5)]],
        ));
        assert_eq!(render(&outcome), render(&outcome));
    }
}
