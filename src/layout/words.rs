//! Build text lines from word geometry.
//!
//! The rasterization step writes one word list per page, in the pixel space
//! of the rendered page image, tagged with the block and line they belong
//! to. Grouping words by `(block_num, line_num)` recovers the lines the
//! segmenter needs.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::Result;
use crate::geometry::{BBox, DpiScale, PageSize};
use crate::layout::{DocumentLayout, PageLayout, TextLine};

/// One word as written by the rasterization step.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WordBox {
    /// `[x0, y0, x1, y1]` in page-image pixels
    pub bbox: [f64; 4],
    /// Word text
    pub text: String,
    /// Text block number
    #[serde(default)]
    pub block_num: u32,
    /// Line number within the block
    #[serde(default)]
    pub line_num: u32,
}

/// Group words into lines and map them into native page units.
///
/// Lines keep the order in which their first word appears.
pub fn lines_from_words(
    page_index: usize,
    words: &[WordBox],
    size: PageSize,
    dpi: f64,
) -> Result<PageLayout> {
    let scale = DpiScale::for_page(page_index, size, dpi)?;

    let mut grouped: IndexMap<(u32, u32), (BBox, Vec<&str>)> = IndexMap::new();
    for word in words {
        let bbox = BBox::from_array(word.bbox);
        grouped
            .entry((word.block_num, word.line_num))
            .and_modify(|(line_box, texts)| {
                *line_box = line_box.union(&bbox);
                texts.push(&word.text);
            })
            .or_insert_with(|| (bbox, vec![word.text.as_str()]));
    }

    let lines = grouped
        .into_values()
        .map(|(bbox, texts)| TextLine::new(scale.to_native(&bbox), texts.join(" ")))
        .collect();

    Ok(PageLayout::new(size, lines))
}

/// Word geometry of one page plus its native size.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WordPage {
    /// Native page width
    pub width: f64,
    /// Native page height
    pub height: f64,
    /// Words in extraction order
    #[serde(default)]
    pub words: Vec<WordBox>,
}

/// Word geometry of a whole document, pages in order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WordDocument {
    /// Pages; the position in this list is the page index
    pub pages: Vec<WordPage>,
}

impl WordDocument {
    /// Load a word geometry JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Build the line layout of every page.
    ///
    /// A page whose geometry cannot be rescaled keeps its size and no lines,
    /// so segmentation reports it as skipped instead of failing the document.
    pub fn to_layout(&self, dpi: f64) -> DocumentLayout {
        let pages = self
            .pages
            .iter()
            .enumerate()
            .map(|(page_index, page)| {
                let size = PageSize::new(page.width, page.height);
                lines_from_words(page_index, &page.words, size, dpi).unwrap_or_else(|e| {
                    log::warn!("{}, page has no lines", e);
                    PageLayout::new(size, Vec::new())
                })
            })
            .collect();
        DocumentLayout::new(pages)
    }
}
