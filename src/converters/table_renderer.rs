//! Replace the raw text of table segments with their rendered structure.

use std::path::Path;

use crate::artifacts::ArtifactLayout;
use crate::converters::{parse_html_table, table_to_markdown};
use crate::error::{Error, Result};
use crate::layout::Segment;

/// How many table segments were rendered and how many kept their raw text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct RenderStats {
    /// Segments whose content was replaced by a markdown table
    pub rendered: usize,
    /// Segments left with the raw line text
    pub fallback: usize,
}

/// Renders table segments from their structure artifacts.
#[derive(Debug, Clone)]
pub struct TableRenderer<'a> {
    artifacts: &'a ArtifactLayout,
}

impl<'a> TableRenderer<'a> {
    /// Create a renderer reading structure artifacts from `artifacts`.
    pub fn new(artifacts: &'a ArtifactLayout) -> Self {
        Self { artifacts }
    }

    /// Load and render the structure artifact of one table.
    ///
    /// Returns [`Error::MissingArtifact`] if the file does not exist and
    /// [`Error::TableMarkup`] if it holds no rows.
    pub fn render_table(&self, page_index: usize, table_ordinal: usize) -> Result<String> {
        let path = self.artifacts.structure_path(page_index, table_ordinal);
        let markup = read_artifact(&path)?;
        let table = parse_html_table(&markup)?;
        if table.is_empty() {
            return Err(Error::TableMarkup(format!("{} holds no rows", path.display())));
        }
        Ok(table_to_markdown(&table))
    }

    /// Rewrite every table segment whose structure artifact is usable.
    ///
    /// Text segments are left alone. Rendering always starts from the
    /// artifact, so running it twice yields the same content.
    pub fn render_segments(&self, segments: &mut [Segment]) -> RenderStats {
        let mut stats = RenderStats::default();

        for segment in segments.iter_mut().filter(|s| s.is_table()) {
            let Some(ordinal) = segment.table_ordinal else {
                stats.fallback += 1;
                continue;
            };

            match self.render_table(segment.page_index, ordinal) {
                Ok(rendered) => {
                    segment.content = rendered;
                    stats.rendered += 1;
                },
                Err(Error::MissingArtifact(path)) => {
                    log::debug!(
                        "Page {} table {}: {} not found, keeping raw text",
                        segment.page_index,
                        ordinal,
                        path.display()
                    );
                    stats.fallback += 1;
                },
                Err(e) => {
                    log::warn!(
                        "Page {} table {}: {}, keeping raw text",
                        segment.page_index,
                        ordinal,
                        e
                    );
                    stats.fallback += 1;
                },
            }
        }

        stats
    }
}

fn read_artifact(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(markup) => Ok(markup),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(Error::MissingArtifact(path.to_path_buf()))
        },
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn layout(dir: &TempDir) -> ArtifactLayout {
        ArtifactLayout::new(dir.path(), dir.path(), "docs_report")
    }

    #[test]
    fn test_renders_and_falls_back() {
        let dir = TempDir::new().unwrap();
        let artifacts = layout(&dir);
        std::fs::write(
            artifacts.structure_path(0, 0),
            "<table><tr><th>Qty</th></tr><tr><td>4</td></tr></table>",
        )
        .unwrap();

        let mut segments = vec![
            Segment::text(0, "intro "),
            Segment::table(0, 0, "Qty 4 "),
            Segment::table(0, 1, "raw second "),
        ];
        let stats = TableRenderer::new(&artifacts).render_segments(&mut segments);

        assert_eq!(stats, RenderStats { rendered: 1, fallback: 1 });
        assert_eq!(segments[0].content, "intro ");
        assert_eq!(segments[1].content, "| Qty |\n|---|\n| 4 |\n");
        assert_eq!(segments[2].content, "raw second ");
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let artifacts = layout(&dir);
        std::fs::write(artifacts.structure_path(2, 0), "<table><tr><td>x</td></tr></table>")
            .unwrap();

        let mut segments = vec![Segment::table(2, 0, "x ")];
        let renderer = TableRenderer::new(&artifacts);
        renderer.render_segments(&mut segments);
        let first = segments[0].content.clone();
        renderer.render_segments(&mut segments);
        assert_eq!(segments[0].content, first);
    }

    #[test]
    fn test_empty_markup_keeps_raw_text() {
        let dir = TempDir::new().unwrap();
        let artifacts = layout(&dir);
        std::fs::write(artifacts.structure_path(0, 0), "<table></table>").unwrap();

        let mut segments = vec![Segment::table(0, 0, "A1 A2 ")];
        let stats = TableRenderer::new(&artifacts).render_segments(&mut segments);
        assert_eq!(stats.fallback, 1);
        assert_eq!(segments[0].content, "A1 A2 ");
    }

    #[test]
    fn test_missing_artifact_error() {
        let dir = TempDir::new().unwrap();
        let artifacts = layout(&dir);
        let err = TableRenderer::new(&artifacts).render_table(5, 3).unwrap_err();
        assert!(matches!(err, Error::MissingArtifact(_)));
    }
}
