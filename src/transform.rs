//! Affine 2D transforms.
//!
//! [`Transform`] stores the six coefficients of a 2D affine matrix
//!
//! ```text
//! | a  c  tx |
//! | b  d  ty |
//! | 0  0  1  |
//! ```
//!
//! so a point maps as `x' = a·x + c·y + tx`, `y' = b·x + d·y + ty`.

use lyon::math::{vector, Angle};

type Matrix = lyon::math::Transform;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform(Matrix);

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self(Matrix::identity())
    }

    pub fn new(a: f32, b: f32, c: f32, d: f32, tx: f32, ty: f32) -> Self {
        Self(Matrix::new(a, b, c, d, tx, ty))
    }

    pub fn translation(tx: f32, ty: f32) -> Self {
        Self(Matrix::translation(tx, ty))
    }

    /// Maps canvas pixels `[0,width]×[0,height]` onto clip space `[-1,1]²`, flipping y.
    pub fn projection(width: f32, height: f32) -> Self {
        let a = 2.0 / width;
        let d = -2.0 / height;
        Self::new(a, 0.0, 0.0, d, -1.0, 1.0)
    }

    /// Returns `[a, b, c, d, tx, ty]`.
    pub fn coefficients(&self) -> [f32; 6] {
        [
            self.0.m11, self.0.m12, self.0.m21, self.0.m22, self.0.m31, self.0.m32,
        ]
    }

    pub fn is_identity(&self) -> bool {
        self.0 == Matrix::identity()
    }

    /// Returns the transform that applies `self` first and then `other`.
    pub fn then(&self, other: &Transform) -> Self {
        Self(self.0.then(&other.0))
    }

    /// Prepends a translation, as `CanvasRenderingContext2D.translate` does.
    pub fn translate(&mut self, tx: f32, ty: f32) {
        self.0 = self.0.pre_translate(vector(tx, ty));
    }

    pub fn then_translate(mut self, tx: f32, ty: f32) -> Self {
        self.translate(tx, ty);
        self
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.0 = self.0.pre_scale(sx, sy);
    }

    pub fn then_scale(mut self, sx: f32, sy: f32) -> Self {
        self.scale(sx, sy);
        self
    }

    /// Prepends a clockwise (in y-down canvas space) rotation.
    pub fn rotate(&mut self, radians: f32) {
        self.0 = self.0.pre_rotate(Angle::radians(radians));
    }

    pub fn then_rotate(mut self, radians: f32) -> Self {
        self.rotate(radians);
        self
    }

    /// Prepends `other`, as `CanvasRenderingContext2D.transform` does.
    pub fn multiply(&mut self, other: &Transform) {
        self.0 = other.0.then(&self.0);
    }

    pub fn invert(&self) -> Option<Self> {
        self.0.inverse().map(Self)
    }

    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        let point = self.0.transform_point(lyon::math::point(x, y));
        (point.x, point.y)
    }

    /// Exports the 3×3 matrix. With `transpose` the layout is column-major, ready for a
    /// `mat3` uniform; without it the rows come first.
    pub fn to_array(&self, transpose: bool) -> [f32; 9] {
        let [a, b, c, d, tx, ty] = self.coefficients();
        if transpose {
            [a, b, 0.0, c, d, 0.0, tx, ty, 1.0]
        } else {
            [a, c, tx, b, d, ty, 0.0, 0.0, 1.0]
        }
    }

    /// Column-major 4×4 embedding of the affine matrix for `mat4x4<f32>` uniforms.
    pub fn to_mat4(&self) -> [[f32; 4]; 4] {
        let [a, b, c, d, tx, ty] = self.coefficients();
        [
            [a, b, 0.0, 0.0],
            [c, d, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [tx, ty, 0.0, 1.0],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point_eq(actual: (f32, f32), expected: (f32, f32)) {
        assert!(
            (actual.0 - expected.0).abs() < 1e-4 && (actual.1 - expected.1).abs() < 1e-4,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn projection_maps_canvas_corners_to_clip_space() {
        let projection = Transform::projection(100.0, 50.0);
        assert_point_eq(projection.transform_point(0.0, 0.0), (-1.0, 1.0));
        assert_point_eq(projection.transform_point(100.0, 50.0), (1.0, -1.0));
        assert_point_eq(projection.transform_point(50.0, 25.0), (0.0, 0.0));
        assert_eq!(
            projection.coefficients(),
            [0.02, 0.0, 0.0, -0.04, -1.0, 1.0]
        );
    }

    #[test]
    fn then_applies_left_operand_first() {
        let scale_then_move = Transform::identity()
            .then_scale(2.0, 2.0)
            .then(&Transform::translation(10.0, 0.0));
        assert_point_eq(scale_then_move.transform_point(1.0, 1.0), (12.0, 2.0));
    }

    #[test]
    fn canvas_style_operations_prepend() {
        // translate(10, 0) then scale(2, 2): points are scaled first, then moved.
        let mut transform = Transform::identity();
        transform.translate(10.0, 0.0);
        transform.scale(2.0, 2.0);
        assert_point_eq(transform.transform_point(1.0, 1.0), (12.0, 2.0));

        let mut rotated = Transform::identity();
        rotated.rotate(std::f32::consts::FRAC_PI_2);
        assert_point_eq(rotated.transform_point(1.0, 0.0), (0.0, 1.0));
    }

    #[test]
    fn multiply_matches_canvas_transform() {
        let mut transform = Transform::translation(5.0, 5.0);
        transform.multiply(&Transform::new(2.0, 0.0, 0.0, 3.0, 1.0, 1.0));
        assert_point_eq(transform.transform_point(1.0, 1.0), (8.0, 9.0));
    }

    #[test]
    fn invert_round_trips_points() {
        let transform = Transform::new(2.0, 0.5, -0.25, 1.5, 7.0, -3.0);
        let inverse = transform.invert().expect("matrix is invertible");
        let mapped = transform.transform_point(3.0, 4.0);
        assert_point_eq(inverse.transform_point(mapped.0, mapped.1), (3.0, 4.0));

        assert!(Transform::new(1.0, 2.0, 2.0, 4.0, 0.0, 0.0)
            .invert()
            .is_none());
    }

    #[test]
    fn array_exports() {
        let transform = Transform::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        assert_eq!(
            transform.to_array(true),
            [1.0, 2.0, 0.0, 3.0, 4.0, 0.0, 5.0, 6.0, 1.0]
        );
        assert_eq!(
            transform.to_array(false),
            [1.0, 3.0, 5.0, 2.0, 4.0, 6.0, 0.0, 0.0, 1.0]
        );
        assert_eq!(transform.to_mat4()[3], [5.0, 6.0, 0.0, 1.0]);
        assert!(Transform::default().is_identity());
    }
}
