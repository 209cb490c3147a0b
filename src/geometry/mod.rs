//! Geometric primitives for layout segmentation.
//!
//! Bounding boxes follow the text-extraction convention: the origin is the
//! top-left corner of the page, `top < bottom`, and all values are in native
//! PDF units (points) unless a function says otherwise.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Points per inch in native PDF space.
pub const POINTS_PER_INCH: f64 = 72.0;

/// Default rendering resolution of the table detector input images.
pub const DEFAULT_DPI: f64 = 300.0;

/// An axis-aligned bounding box given by its corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    /// Left edge
    pub x0: f64,
    /// Top edge
    pub top: f64,
    /// Right edge
    pub x1: f64,
    /// Bottom edge
    pub bottom: f64,
}

impl BBox {
    /// Create a bounding box from its four edges.
    ///
    /// # Examples
    ///
    /// ```
    /// use table_context::geometry::BBox;
    ///
    /// let bbox = BBox::new(10.0, 20.0, 110.0, 70.0);
    /// assert_eq!(bbox.width(), 100.0);
    /// assert_eq!(bbox.height(), 50.0);
    /// ```
    pub fn new(x0: f64, top: f64, x1: f64, bottom: f64) -> Self {
        Self { x0, top, x1, bottom }
    }

    /// Build a box from the `[x0, y0, x1, y1]` array used by detection artifacts.
    pub fn from_array(coords: [f64; 4]) -> Self {
        Self::new(coords[0], coords[1], coords[2], coords[3])
    }

    /// Width of the box.
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Height of the box.
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Area of the box; zero or negative for degenerate boxes.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Check whether `inner` lies entirely inside this box on both axes.
    ///
    /// Edges may touch. There is no overlap tolerance: a box that straddles
    /// any edge is not contained.
    ///
    /// # Examples
    ///
    /// ```
    /// use table_context::geometry::BBox;
    ///
    /// let table = BBox::new(0.0, 100.0, 500.0, 300.0);
    /// assert!(table.contains(&BBox::new(10.0, 120.0, 200.0, 130.0)));
    /// assert!(!table.contains(&BBox::new(10.0, 95.0, 200.0, 105.0)));
    /// ```
    pub fn contains(&self, inner: &BBox) -> bool {
        inner.x0 >= self.x0
            && inner.x1 <= self.x1
            && inner.top >= self.top
            && inner.bottom <= self.bottom
    }

    /// Smallest box covering both boxes.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox::new(
            self.x0.min(other.x0),
            self.top.min(other.top),
            self.x1.max(other.x1),
            self.bottom.max(other.bottom),
        )
    }

    /// Divide every coordinate by the per-axis scale factors.
    pub fn unscale(&self, scale_x: f64, scale_y: f64) -> BBox {
        BBox::new(
            self.x0 / scale_x,
            self.top / scale_y,
            self.x1 / scale_x,
            self.bottom / scale_y,
        )
    }
}

/// Native page dimensions in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    /// Page width
    pub width: f64,
    /// Page height
    pub height: f64,
}

impl PageSize {
    /// Create a page size.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Maps detector pixel coordinates back into native page units.
///
/// The detector saw the page rasterized at `dpi`, so a native dimension `d`
/// became `d * dpi / 72` pixels. The per-axis factor is therefore
/// `(dpi / 72) * d / d`, which is `dpi / 72` for any non-zero dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DpiScale {
    scale_x: f64,
    scale_y: f64,
}

impl DpiScale {
    /// Compute the scale for one page.
    ///
    /// Fails with [`Error::DegenerateGeometry`] when either page dimension or
    /// the resolution is zero, negative or not finite.
    pub fn for_page(page: usize, size: PageSize, dpi: f64) -> Result<Self> {
        let degenerate = |reason: String| Error::DegenerateGeometry { page, reason };

        if !(dpi.is_finite() && dpi > 0.0) {
            return Err(degenerate(format!("resolution must be positive, got {dpi}")));
        }
        if !(size.width.is_finite() && size.width > 0.0) {
            return Err(degenerate(format!("page width is {}", size.width)));
        }
        if !(size.height.is_finite() && size.height > 0.0) {
            return Err(degenerate(format!("page height is {}", size.height)));
        }

        let pixels_per_point = dpi / POINTS_PER_INCH;
        let pixel_width = size.width * pixels_per_point;
        let pixel_height = size.height * pixels_per_point;

        Ok(Self {
            scale_x: pixel_width / size.width,
            scale_y: pixel_height / size.height,
        })
    }

    /// Horizontal pixels per native unit.
    pub fn scale_x(&self) -> f64 {
        self.scale_x
    }

    /// Vertical pixels per native unit.
    pub fn scale_y(&self) -> f64 {
        self.scale_y
    }

    /// Map a detector-space box to native units.
    pub fn to_native(&self, bbox: &BBox) -> BBox {
        bbox.unscale(self.scale_x, self.scale_y)
    }
}

/// Rescale one pixel-space box into native units.
///
/// # Examples
///
/// ```
/// use table_context::geometry::{rescale_to_native, BBox, PageSize};
///
/// let native = rescale_to_native(
///     0,
///     &BBox::new(300.0, 600.0, 1200.0, 1500.0),
///     PageSize::new(612.0, 792.0),
///     300.0,
/// )
/// .unwrap();
/// assert!((native.x0 - 72.0).abs() < 1e-9);
/// assert!((native.bottom - 360.0).abs() < 1e-9);
/// ```
pub fn rescale_to_native(page: usize, bbox: &BBox, size: PageSize, dpi: f64) -> Result<BBox> {
    Ok(DpiScale::for_page(page, size, dpi)?.to_native(bbox))
}
