/// Axis-aligned rectangle in PDF user space (origin bottom-left, y grows upward).
///
/// - `left`: smallest x
/// - `bottom`: smallest y
/// - `right`: largest x
/// - `top`: largest y
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

impl Rect {
    pub fn new(left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }

    /// Smallest rectangle containing all the given points.
    ///
    /// Returns `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut iter = points.into_iter();
        let (x, y) = iter.next()?;
        let (mut x0, mut y0, mut x1, mut y1) = (x, y, x, y);
        for (x, y) in iter {
            x0 = x0.min(x);
            y0 = y0.min(y);
            x1 = x1.max(x);
            y1 = y1.max(y);
        }
        Some(Self::new(x0 as f32, y0 as f32, x1 as f32, y1 as f32))
    }

    /// Width of the rectangle (may be zero or negative for degenerate input).
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Height of the rectangle (may be zero or negative for degenerate input).
    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    /// Vertical midline.
    pub fn mid_y(&self) -> f32 {
        (self.bottom + self.top) / 2.0
    }

    /// True when `y` lies within `[bottom, top]`.
    pub fn contains_y(&self, y: f32) -> bool {
        y >= self.bottom && y <= self.top
    }

    /// Compute the union of two rectangles.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            left: self.left.min(other.left),
            bottom: self.bottom.min(other.bottom),
            right: self.right.max(other.right),
            top: self.top.max(other.top),
        }
    }
}

/// 2D affine transformation matrix `[a b c d e f]`.
///
/// Maps a point as `x' = a*x + c*y + e`, `y' = b*x + d*y + f`, the layout
/// used by the `cm` and `Tm` operators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Build from a 6-element slice; `None` unless exactly six values are given.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match values {
            [a, b, c, d, e, f] => Some(Self::new(*a, *b, *c, *d, *e, *f)),
            _ => None,
        }
    }

    /// Returns `self × other`: the result applies `self` first, then `other`.
    pub fn concat(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Equivalent uniform scale factor.
    ///
    /// Averages the absolute diagonal terms; when the diagonal collapses
    /// (rotated by ±90°), the anti-diagonal terms are averaged instead.
    pub fn scale_factor(&self) -> f64 {
        let diagonal = (self.a.abs() + self.d.abs()) / 2.0;
        if diagonal > 1e-6 {
            diagonal
        } else {
            (self.b.abs() + self.c.abs()) / 2.0
        }
    }

    pub fn to_array(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }
}
