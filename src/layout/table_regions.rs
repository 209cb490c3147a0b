//! Detected table regions per page.
//!
//! The detector writes one JSON array per page. Each entry carries a `bbox`
//! in the pixel space of the page image it was run on; other keys such as
//! `label` or `score` may be present and are ignored here.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::geometry::{BBox, DpiScale};

/// One entry of a detection artifact.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DetectedObject {
    /// `[x0, y0, x1, y1]` in detector pixels
    pub bbox: [f64; 4],
    /// Detector label, if any
    #[serde(default)]
    pub label: Option<String>,
    /// Detector confidence, if any
    #[serde(default)]
    pub score: Option<f64>,
}

/// A table bounding box in native page units.
///
/// Only lives while its page is being segmented.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableRegion {
    /// Region box in native units
    pub bbox: BBox,
}

impl TableRegion {
    /// Whether a line box lies entirely inside this region.
    pub fn contains(&self, line: &BBox) -> bool {
        self.bbox.contains(line)
    }
}

/// Read the detection artifact at `path`.
///
/// Returns [`Error::MissingArtifact`] when the file does not exist so callers
/// can decide to skip the page.
pub fn load_detected_objects(path: &Path) -> Result<Vec<DetectedObject>> {
    if !path.exists() {
        return Err(Error::MissingArtifact(path.to_path_buf()));
    }
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

/// Turn raw detections into native-space regions sorted by their top edge.
///
/// The sort only makes the order deterministic; containment is checked
/// against every region independently. A box without a finite, positive
/// width and height makes the whole page degenerate.
pub fn regions_from_objects(
    page: usize,
    objects: &[DetectedObject],
    scale: &DpiScale,
) -> Result<Vec<TableRegion>> {
    let mut boxes = Vec::with_capacity(objects.len());
    for (i, object) in objects.iter().enumerate() {
        let bbox = BBox::from_array(object.bbox);
        let (width, height) = (bbox.width(), bbox.height());
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(Error::DegenerateGeometry {
                page,
                reason: format!("table box {} is {} x {}", i, width, height),
            });
        }
        boxes.push(bbox);
    }
    boxes.sort_by(|a, b| a.top.total_cmp(&b.top));
    Ok(boxes
        .iter()
        .map(|b| TableRegion {
            bbox: scale.to_native(b),
        })
        .collect())
}
