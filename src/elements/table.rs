//! Structured table content recovered from table-structure artifacts.

/// Table content element.
///
/// Represents a table with rows and cells as described by the structure
/// detector's markup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableContent {
    /// Table rows
    pub rows: Vec<TableRowContent>,
    /// Optional table caption
    pub caption: Option<String>,
}

impl TableContent {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row to the table.
    pub fn add_row(&mut self, row: TableRowContent) {
        self.rows.push(row);
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns, counting spans, of the widest row.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.span_width()).max().unwrap_or(0)
    }

    /// Get a cell at the specified row and cell position.
    pub fn get_cell(&self, row: usize, col: usize) -> Option<&TableCellContent> {
        self.rows.get(row).and_then(|r| r.cells.get(col))
    }

    /// Check if the table has a header row.
    pub fn has_header(&self) -> bool {
        self.rows.first().is_some_and(|r| r.is_header)
    }

    /// Check if the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A row in a table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRowContent {
    /// Cells in this row
    pub cells: Vec<TableCellContent>,
    /// Whether this is a header row
    pub is_header: bool,
}

impl TableRowContent {
    /// Create a new row with cells.
    pub fn new(cells: Vec<TableCellContent>) -> Self {
        Self {
            cells,
            ..Default::default()
        }
    }

    /// Create a header row with cells.
    pub fn header(cells: Vec<TableCellContent>) -> Self {
        Self {
            cells,
            is_header: true,
        }
    }

    /// Add a cell to the row.
    pub fn add_cell(&mut self, cell: TableCellContent) {
        self.cells.push(cell);
    }

    /// Number of grid columns this row covers.
    pub fn span_width(&self) -> usize {
        self.cells.iter().map(|c| c.colspan.max(1)).sum()
    }
}

/// A cell in a table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableCellContent {
    /// Cell text content
    pub text: String,
    /// Number of columns this cell spans
    pub colspan: usize,
    /// Number of rows this cell spans
    pub rowspan: usize,
    /// Whether this is a header cell
    pub is_header: bool,
}

impl Default for TableCellContent {
    fn default() -> Self {
        Self {
            text: String::new(),
            colspan: 1,
            rowspan: 1,
            is_header: false,
        }
    }
}

impl TableCellContent {
    /// Create a new cell with text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Create a header cell with text.
    pub fn header(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_header: true,
            ..Default::default()
        }
    }

    /// Set column span.
    pub fn with_colspan(mut self, colspan: usize) -> Self {
        self.colspan = colspan.max(1);
        self
    }

    /// Set row span.
    pub fn with_rowspan(mut self, rowspan: usize) -> Self {
        self.rowspan = rowspan.max(1);
        self
    }
}
