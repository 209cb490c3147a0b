//! Content elements recovered from detector artifacts.

mod table;

pub use table::{TableCellContent, TableContent, TableRowContent};
