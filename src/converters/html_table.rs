//! Parser for the HTML table markup written by the structure detector.
//!
//! The markup is close to XHTML (`<table><thead><tr><th>..</th></tr></thead>
//! <tbody>..</tbody></table>`) but is not guaranteed to be well formed, so the
//! reader runs with end-name checks disabled and tolerates unclosed cells,
//! rows and void elements such as `<br>`.

use lazy_static::lazy_static;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Reader;
use regex::Regex;

use crate::elements::{TableCellContent, TableContent, TableRowContent};
use crate::error::{Error, Result};

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Cell being filled while its end tag has not been seen yet.
#[derive(Debug)]
struct OpenCell {
    cell: TableCellContent,
    text: String,
}

#[derive(Debug, Default)]
struct TableBuilder {
    table: TableContent,
    row: Option<TableRowContent>,
    cell: Option<OpenCell>,
    caption: Option<String>,
    in_thead: bool,
}

impl TableBuilder {
    fn open_row(&mut self) {
        self.close_row();
        self.row = Some(TableRowContent::default());
    }

    fn open_cell(&mut self, start: &BytesStart<'_>, is_th: bool) {
        self.close_cell();
        if self.row.is_none() {
            self.row = Some(TableRowContent::default());
        }

        let mut cell = TableCellContent {
            is_header: is_th || self.in_thead,
            ..Default::default()
        };
        for attr in start.html_attributes().flatten() {
            let value = attr.unescape_value().unwrap_or_default();
            let span = value.trim().parse::<usize>().unwrap_or(1);
            match attr.key.as_ref().to_ascii_lowercase().as_slice() {
                b"colspan" => cell = cell.with_colspan(span),
                b"rowspan" => cell = cell.with_rowspan(span),
                _ => {},
            }
        }
        self.cell = Some(OpenCell {
            cell,
            text: String::new(),
        });
    }

    fn push_text(&mut self, text: &str) {
        if let Some(open) = self.cell.as_mut() {
            open.text.push_str(text);
            open.text.push(' ');
        } else if let Some(caption) = self.caption.as_mut() {
            caption.push_str(text);
            caption.push(' ');
        }
    }

    fn close_cell(&mut self) {
        if let Some(OpenCell { mut cell, text }) = self.cell.take() {
            cell.text = collapse_whitespace(&text);
            self.row.get_or_insert_with(TableRowContent::default).add_cell(cell);
        }
    }

    fn close_row(&mut self) {
        self.close_cell();
        if let Some(mut row) = self.row.take() {
            if row.cells.is_empty() {
                return;
            }
            row.is_header = self.in_thead || row.cells.iter().all(|c| c.is_header);
            self.table.add_row(row);
        }
    }

    fn close_caption(&mut self) {
        if let Some(caption) = self.caption.take() {
            let caption = collapse_whitespace(&caption);
            if !caption.is_empty() {
                self.table.caption = Some(caption);
            }
        }
    }

    fn finish(mut self) -> TableContent {
        self.close_row();
        self.close_caption();
        self.table
    }
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

fn decode_text(text: &BytesText<'_>) -> String {
    match text.unescape() {
        Ok(decoded) => decoded.into_owned(),
        // HTML entities such as &nbsp; are not XML entities
        Err(_) => String::from_utf8_lossy(text)
            .replace("&nbsp;", " ")
            .replace("&#160;", " "),
    }
}

fn tag_name(start: &BytesStart<'_>) -> Vec<u8> {
    start.local_name().as_ref().to_ascii_lowercase()
}

/// Parse HTML table markup into a [`TableContent`].
///
/// Returns [`Error::TableMarkup`] when the markup cannot be tokenized. A
/// document without any `<tr>`/`<td>` yields an empty table.
///
/// # Examples
///
/// ```
/// use table_context::converters::parse_html_table;
///
/// let table = parse_html_table(
///     "<table><tr><th>Item</th><th>Qty</th></tr><tr><td>Bolt</td><td>12</td></tr></table>",
/// )
/// .unwrap();
/// assert_eq!(table.row_count(), 2);
/// assert!(table.has_header());
/// ```
pub fn parse_html_table(markup: &str) -> Result<TableContent> {
    let mut reader = Reader::from_str(markup);
    reader.trim_text(true);
    reader.check_end_names(false);

    let mut builder = TableBuilder::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match tag_name(&e).as_slice() {
                b"thead" => builder.in_thead = true,
                b"tbody" | b"tfoot" => builder.in_thead = false,
                b"tr" => builder.open_row(),
                b"td" => builder.open_cell(&e, false),
                b"th" => builder.open_cell(&e, true),
                b"br" => builder.push_text(" "),
                b"caption" => builder.caption = Some(String::new()),
                _ => {},
            },
            Ok(Event::Empty(e)) => match tag_name(&e).as_slice() {
                b"td" => {
                    builder.open_cell(&e, false);
                    builder.close_cell();
                },
                b"th" => {
                    builder.open_cell(&e, true);
                    builder.close_cell();
                },
                b"br" => builder.push_text(" "),
                _ => {},
            },
            Ok(Event::Text(e)) => {
                let text = decode_text(&e);
                builder.push_text(&text);
            },
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                builder.push_text(&text);
            },
            Ok(Event::End(e)) => match e.local_name().as_ref().to_ascii_lowercase().as_slice() {
                b"td" | b"th" => builder.close_cell(),
                b"tr" => builder.close_row(),
                b"thead" => {
                    builder.close_row();
                    builder.in_thead = false;
                },
                b"caption" => builder.close_caption(),
                _ => {},
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::TableMarkup(format!(
                    "at byte {}: {}",
                    reader.buffer_position(),
                    e
                )));
            },
            _ => {},
        }
    }

    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thead_and_tbody() {
        let html = r#"<table>
            <thead><tr><th>Item</th><th>Unit price</th></tr></thead>
            <tbody>
                <tr><td>Bolt M8</td><td>0.12</td></tr>
                <tr><td>Nut M8</td><td>0.05</td></tr>
            </tbody>
        </table>"#;
        let table = parse_html_table(html).unwrap();
        assert_eq!(table.row_count(), 3);
        assert!(table.rows[0].is_header);
        assert!(!table.rows[1].is_header);
        assert_eq!(table.get_cell(2, 0).unwrap().text, "Nut M8");
        assert_eq!(table.get_cell(0, 1).unwrap().text, "Unit price");
    }

    #[test]
    fn test_whitespace_and_line_breaks_collapse() {
        let html = "<table><tr><td>  Delivery\n   condition <br/> Rev J </td></tr></table>";
        let table = parse_html_table(html).unwrap();
        assert_eq!(table.get_cell(0, 0).unwrap().text, "Delivery condition Rev J");
    }

    #[test]
    fn test_spans_are_read() {
        let html = r#"<table><tr><td colspan="2" rowspan=3>wide</td></tr></table>"#;
        let table = parse_html_table(html).unwrap();
        let cell = table.get_cell(0, 0).unwrap();
        assert_eq!(cell.colspan, 2);
        assert_eq!(cell.rowspan, 3);
    }

    #[test]
    fn test_unclosed_cells_and_rows() {
        let html = "<table><tr><td>a<td>b<tr><td>c</table>";
        let table = parse_html_table(html).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0].cells.len(), 2);
        assert_eq!(table.get_cell(0, 1).unwrap().text, "b");
        assert_eq!(table.get_cell(1, 0).unwrap().text, "c");
    }

    #[test]
    fn test_entities() {
        let html = "<table><tr><td>A &amp; B</td><td>x&nbsp;y</td></tr></table>";
        let table = parse_html_table(html).unwrap();
        assert_eq!(table.get_cell(0, 0).unwrap().text, "A & B");
        assert_eq!(table.get_cell(0, 1).unwrap().text, "x y");
    }

    #[test]
    fn test_empty_cells_are_kept() {
        let html = "<table><tr><td>a</td><td></td><td/></tr></table>";
        let table = parse_html_table(html).unwrap();
        assert_eq!(table.rows[0].cells.len(), 3);
        assert_eq!(table.get_cell(0, 1).unwrap().text, "");
    }

    #[test]
    fn test_caption() {
        let html = "<table><caption>Table 3: Tolerances</caption><tr><td>1</td></tr></table>";
        let table = parse_html_table(html).unwrap();
        assert_eq!(table.caption.as_deref(), Some("Table 3: Tolerances"));
    }

    #[test]
    fn test_no_rows() {
        let table = parse_html_table("<div>nothing here</div>").unwrap();
        assert!(table.is_empty());
    }
}
