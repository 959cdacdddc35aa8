//! CSS-pixel geometry for the selection hole and its four dimming masks.

/// Logical point in viewport (client) coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Visible viewport size.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CssRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl CssRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Bounding box of two corners, in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Clip to the viewport; a rectangle fully outside collapses onto its edge.
    pub fn clamp_to(&self, viewport: Viewport) -> Self {
        let left = self.left.clamp(0.0, viewport.width);
        let top = self.top.clamp(0.0, viewport.height);
        let right = self.right().clamp(left, viewport.width);
        let bottom = self.bottom().clamp(top, viewport.height);
        Self {
            left,
            top,
            width: right - left,
            height: bottom - top,
        }
    }

    /// True when the two rectangles share a region of positive area.
    pub fn overlaps(&self, other: &CssRect) -> bool {
        self.left < other.right()
            && other.left < self.right()
            && self.top < other.bottom()
            && other.top < self.bottom()
    }
}

/// The four masks that dim everything except the hole.
///
/// `top` and `bottom` span the full viewport width; `left` and `right`
/// cover only the hole's height band.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MaskLayout {
    pub top: CssRect,
    pub left: CssRect,
    pub right: CssRect,
    pub bottom: CssRect,
}

impl MaskLayout {
    pub fn around(hole: CssRect, viewport: Viewport) -> Self {
        let vw = viewport.width;
        let vh = viewport.height;

        Self {
            top: CssRect::new(0.0, 0.0, vw, hole.top.max(0.0)),
            left: CssRect::new(0.0, hole.top, hole.left.max(0.0), hole.height),
            right: CssRect::new(
                hole.right(),
                hole.top,
                (vw - hole.right()).max(0.0),
                hole.height,
            ),
            bottom: CssRect::new(0.0, hole.bottom(), vw, (vh - hole.bottom()).max(0.0)),
        }
    }

    pub fn masks(&self) -> [CssRect; 4] {
        [self.top, self.left, self.right, self.bottom]
    }
}
