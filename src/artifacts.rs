//! Deterministic names of the per-page artifacts written by the detectors.
//!
//! ```text
//! <detection_dir>/<prefix>_page<N>_objects.json      table regions of page N
//! <structure_dir>/<prefix>_page<N>_<T>_0.html        structure of table T on page N
//! ```

use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Folder names like `Contracts) 2024` are cut at the first `)`.
    static ref FOLDER_SUFFIX: Regex = Regex::new(r"\).*$").unwrap();
}

/// Where the artifacts of one document live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    /// Directory holding `*_objects.json` detection files
    pub detection_dir: PathBuf,
    /// Directory holding `*.html` table structure files
    pub structure_dir: PathBuf,
    /// Document prefix shared by all artifact names
    pub prefix: String,
}

impl ArtifactLayout {
    /// Create an artifact layout.
    pub fn new(
        detection_dir: impl Into<PathBuf>,
        structure_dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            detection_dir: detection_dir.into(),
            structure_dir: structure_dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Path of the table-region detection artifact for a page.
    pub fn detection_path(&self, page_index: usize) -> PathBuf {
        self.detection_dir
            .join(format!("{}_page{}_objects.json", self.prefix, page_index))
    }

    /// Path of the table-structure artifact for a table on a page.
    pub fn structure_path(&self, page_index: usize, table_ordinal: usize) -> PathBuf {
        self.structure_dir.join(format!(
            "{}_page{}_{}_0.html",
            self.prefix, page_index, table_ordinal
        ))
    }
}

/// Derive the document prefix `<folder>_<pdf stem>` from a PDF path.
///
/// # Examples
///
/// ```
/// use table_context::artifacts::document_prefix;
///
/// assert_eq!(document_prefix("output/Delivery condition.pdf"), "output_Delivery condition");
/// assert_eq!(document_prefix("in/Specs) v2/sheet.pdf"), "Specs_sheet");
/// ```
pub fn document_prefix(pdf_path: impl AsRef<Path>) -> String {
    let path = pdf_path.as_ref();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let folder = path
        .parent()
        .and_then(|p| p.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let folder = FOLDER_SUFFIX.replace(&folder, "");

    if folder.is_empty() {
        stem
    } else {
        format!("{folder}_{stem}")
    }
}
