//! Geometric primitives shared across the interpreter.
//!
//! Matrices use the PDF row-vector convention: a point (x, y) is mapped to
//! (ax + cy + e, bx + dy + f), and `mult_matrix(m1, m0)` produces the
//! transform that applies `m1` first, then `m0`.

/// A 2D point (x, y).
pub type Point = (f64, f64);

/// A rectangle (x0, y0, x1, y1), lower-left to upper-right.
pub type Rect = (f64, f64, f64, f64);

/// A 6-element affine transformation matrix (a, b, c, d, e, f).
pub type Matrix = (f64, f64, f64, f64, f64, f64);

/// The four corners of a transformed rectangle, in path order.
pub type Quad = [Point; 4];

/// Identity transformation matrix.
pub const MATRIX_IDENTITY: Matrix = (1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

/// Multiplies two matrices: applies `m1` first, then `m0`.
pub fn mult_matrix(m1: Matrix, m0: Matrix) -> Matrix {
    let (a1, b1, c1, d1, e1, f1) = m1;
    let (a0, b0, c0, d0, e0, f0) = m0;
    (
        a0 * a1 + c0 * b1,
        b0 * a1 + d0 * b1,
        a0 * c1 + c0 * d1,
        b0 * c1 + d0 * d1,
        a0 * e1 + c0 * f1 + e0,
        b0 * e1 + d0 * f1 + f0,
    )
}

/// Builds a pure translation matrix.
pub const fn translation_matrix(tx: f64, ty: f64) -> Matrix {
    (1.0, 0.0, 0.0, 1.0, tx, ty)
}

/// Builds a pure scaling matrix.
pub const fn scaling_matrix(sx: f64, sy: f64) -> Matrix {
    (sx, 0.0, 0.0, sy, 0.0, 0.0)
}

/// Translates `m` by (x, y) in its own source coordinate system.
///
/// The translation is applied before the matrix, so this moves the origin of
/// `m` rather than shifting the transformed output.
pub fn translate_matrix(m: Matrix, v: Point) -> Matrix {
    let (a, b, c, d, e, f) = m;
    let (x, y) = v;
    (a, b, c, d, x * a + y * c + e, x * b + y * d + f)
}

/// Applies a matrix to a point.
pub fn apply_matrix_pt(m: Matrix, v: Point) -> Point {
    let (a, b, c, d, e, f) = m;
    let (x, y) = v;
    (a * x + c * y + e, b * x + d * y + f)
}

/// Applies a matrix to a vector, ignoring the translation part.
pub fn apply_matrix_norm(m: Matrix, v: Point) -> Point {
    let (a, b, c, d, _e, _f) = m;
    let (p, q) = v;
    (a * p + c * q, b * p + d * q)
}

/// Applies a matrix to a rectangle and returns the axis-aligned bounds of
/// the transformed corners.
pub fn apply_matrix_rect(m: Matrix, rect: Rect) -> Rect {
    let [p0, p1, p2, p3] = transform_rect(m, rect);
    let xs = [p0.0, p1.0, p2.0, p3.0];
    let ys = [p0.1, p1.1, p2.1, p3.1];
    let mut bounds = (xs[0], ys[0], xs[0], ys[0]);
    for i in 1..4 {
        bounds.0 = bounds.0.min(xs[i]);
        bounds.1 = bounds.1.min(ys[i]);
        bounds.2 = bounds.2.max(xs[i]);
        bounds.3 = bounds.3.max(ys[i]);
    }
    bounds
}

/// Transforms the four corners of a rectangle, preserving their order.
pub fn transform_rect(m: Matrix, rect: Rect) -> Quad {
    let (x0, y0, x1, y1) = rect;
    [
        apply_matrix_pt(m, (x0, y0)),
        apply_matrix_pt(m, (x1, y0)),
        apply_matrix_pt(m, (x1, y1)),
        apply_matrix_pt(m, (x0, y1)),
    ]
}

/// Corners of an untransformed rectangle.
pub fn rect_quad(rect: Rect) -> Quad {
    transform_rect(MATRIX_IDENTITY, rect)
}

/// Rectangle width; negative when the corners are swapped.
pub fn rect_width(rect: Rect) -> f64 {
    rect.2 - rect.0
}

/// Rectangle height; negative when the corners are swapped.
pub fn rect_height(rect: Rect) -> f64 {
    rect.3 - rect.1
}
