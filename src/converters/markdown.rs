//! Markdown rendering of structured tables.
//!
//! Tables are linearized row-major as GitHub-style pipe tables. The first row
//! is used as the header row, followed by a `|---|` separator.

use crate::elements::TableContent;

/// Lay the table out on a grid, expanding column and row spans into empty cells.
fn to_grid(table: &TableContent) -> Vec<Vec<String>> {
    // rows still covered by a rowspan, per grid column
    let mut covered: Vec<usize> = Vec::new();
    let mut grid = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let mut out: Vec<String> = Vec::new();
        let mut col = 0;
        let mut cells = row.cells.iter();

        loop {
            if covered.get(col).is_some_and(|&c| c > 0) {
                covered[col] -= 1;
                out.push(String::new());
                col += 1;
                continue;
            }
            let Some(cell) = cells.next() else { break };
            for k in 0..cell.colspan.max(1) {
                out.push(if k == 0 { cell.text.clone() } else { String::new() });
                if covered.len() <= col {
                    covered.resize(col + 1, 0);
                }
                covered[col] = cell.rowspan.max(1) - 1;
                col += 1;
            }
        }

        if let Some(last) = covered.iter().rposition(|&c| c > 0) {
            while col <= last {
                if covered[col] > 0 {
                    covered[col] -= 1;
                }
                out.push(String::new());
                col += 1;
            }
        }

        grid.push(out);
    }

    grid
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\n', '\r'], " ")
}

/// Convert a table to markdown.
///
/// Returns an empty string for a table without rows.
///
/// # Examples
///
/// ```
/// use table_context::elements::{TableCellContent, TableContent, TableRowContent};
/// use table_context::converters::table_to_markdown;
///
/// let mut table = TableContent::new();
/// table.add_row(TableRowContent::header(vec![
///     TableCellContent::header("Item"),
///     TableCellContent::header("Qty"),
/// ]));
/// table.add_row(TableRowContent::new(vec![
///     TableCellContent::new("Bolt"),
///     TableCellContent::new("12"),
/// ]));
///
/// assert_eq!(
///     table_to_markdown(&table),
///     "| Item | Qty |\n|---|---|\n| Bolt | 12 |\n"
/// );
/// ```
pub fn table_to_markdown(table: &TableContent) -> String {
    let grid = to_grid(table);
    let col_count = grid.iter().map(Vec::len).max().unwrap_or(0);
    if col_count == 0 {
        return String::new();
    }

    let mut markdown = String::new();
    if let Some(caption) = &table.caption {
        markdown.push_str(caption);
        markdown.push_str("\n\n");
    }

    for (row_idx, row) in grid.iter().enumerate() {
        markdown.push('|');
        for col_idx in 0..col_count {
            let cell_text = row.get(col_idx).map(|t| escape_cell(t)).unwrap_or_default();
            if cell_text.is_empty() {
                markdown.push_str("  |");
            } else {
                markdown.push_str(&format!(" {} |", cell_text));
            }
        }
        markdown.push('\n');

        // Add header separator after first row
        if row_idx == 0 {
            markdown.push('|');
            for _ in 0..col_count {
                markdown.push_str("---|");
            }
            markdown.push('\n');
        }
    }

    markdown
}
