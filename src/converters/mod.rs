//! Conversion of detected table structure into linear text.
//!
//! The structure detector writes one HTML table per detected table region.
//! This module parses that markup into [`TableContent`](crate::elements::TableContent),
//! renders it as a markdown pipe table and swaps it into the matching table
//! segment.

mod html_table;
mod markdown;
mod table_renderer;

pub use html_table::parse_html_table;
pub use markdown::table_to_markdown;
pub use table_renderer::{RenderStats, TableRenderer};
