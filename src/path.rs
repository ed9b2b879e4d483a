//! Subpath accumulation for the canvas path API.
//!
//! A [`Path`] holds an ordered list of open [`Subpath`]s. Points are stored in untransformed
//! canvas coordinates; the canvas transform is applied at draw time.

use std::f64::consts::TAU;

use lyon::math::{point, Point};
use smallvec::SmallVec;

use crate::error::CanvasError;
use crate::util::all_finite;

/// One contiguous, open run of points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subpath {
    points: Vec<Point>,
}

impl Subpath {
    pub fn starting_at(at: Point) -> Self {
        Self { points: vec![at] }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn first(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<Point> {
        self.points.last().copied()
    }

    fn push(&mut self, at: Point) {
        self.points.push(at);
    }
}

#[derive(Debug, Clone, Default)]
pub struct Path {
    subpaths: SmallVec<[Subpath; 2]>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subpaths(&self) -> &[Subpath] {
        &self.subpaths
    }

    /// True when no subpath holds a point.
    pub fn is_empty(&self) -> bool {
        self.subpaths.iter().all(Subpath::is_empty)
    }

    pub fn point_count(&self) -> usize {
        self.subpaths.iter().map(Subpath::len).sum()
    }

    /// Discards every subpath.
    pub fn begin_path(&mut self) {
        self.subpaths.clear();
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        if !all_finite(&[x, y]) {
            return;
        }
        self.subpaths.push(Subpath::starting_at(point(x, y)));
    }

    /// Appends a point to the last subpath.
    ///
    /// Without a current subpath the point starts a new one, so the call behaves like
    /// `move_to`.
    pub fn line_to(&mut self, x: f32, y: f32) {
        if !all_finite(&[x, y]) {
            return;
        }
        self.push_point(point(x, y));
    }

    /// Closes the last subpath by repeating its first point, then starts a new subpath there.
    pub fn close_path(&mut self) {
        let Some(first) = self.subpaths.last().and_then(Subpath::first) else {
            return;
        };
        self.push_point(first);
        self.subpaths.push(Subpath::starting_at(first));
    }

    /// Adds a closed rectangle subpath followed by a new subpath at `(x, y)`.
    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        if !all_finite(&[x, y, width, height]) {
            return;
        }
        let origin = point(x, y);
        self.subpaths.push(Subpath {
            points: vec![
                origin,
                point(x + width, y),
                point(x + width, y + height),
                point(x, y + height),
                origin,
            ],
        });
        self.subpaths.push(Subpath::starting_at(origin));
    }

    /// Flattens a circular arc into the current subpath.
    ///
    /// Non-finite arguments make the call a no-op. A negative radius is an
    /// [`CanvasError::InvalidArgument`]. Angles are in radians, measured clockwise in canvas
    /// space. The angle handling reproduces the established wrap-around behavior, including
    /// the reconciliation `end = 2π − end` for anticlockwise sweeps whose end lies after the
    /// start.
    pub fn arc(
        &mut self,
        x: f32,
        y: f32,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
        anticlockwise: bool,
    ) -> Result<(), CanvasError> {
        if !all_finite(&[x, y, radius, start_angle, end_angle]) {
            return Ok(());
        }

        if radius < 0.0 {
            return Err(CanvasError::InvalidArgument(format!(
                "The radius provided ({radius}) is negative."
            )));
        }

        if start_angle == end_angle {
            return Ok(());
        }

        let (cx, cy, radius) = (x as f64, y as f64, radius as f64);
        let mut start = start_angle as f64;
        let mut end = end_angle as f64;

        let segments = (30.0 * radius.sqrt()).floor() as u32;
        let full_circle = (start - end).abs() >= TAU;

        start %= TAU;
        end %= TAU;

        if full_circle {
            if anticlockwise {
                start += TAU;
            } else {
                end += TAU;
            }
        }

        if start < 0.0 || end < 0.0 {
            start += TAU;
            end += TAU;
        }

        if anticlockwise && end > start {
            end = TAU - end;
        }

        let mut delta = (end - start).abs() / segments.max(1) as f64;
        if anticlockwise {
            delta = -delta;
        }

        if self.subpaths.is_empty() {
            self.subpaths.push(Subpath::default());
        }

        for step in 0..=segments {
            let angle = start + step as f64 * delta;
            let px = cx + radius * angle.cos();
            let py = cy + radius * angle.sin();
            self.push_point(point(px as f32, py as f32));
        }

        Ok(())
    }

    fn push_point(&mut self, at: Point) {
        match self.subpaths.last_mut() {
            Some(subpath) => subpath.push(at),
            None => self.subpaths.push(Subpath::starting_at(at)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn approx(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
    }

    #[test]
    fn begin_path_discards_everything() {
        let mut path = Path::new();
        path.move_to(1.0, 2.0);
        path.line_to(3.0, 4.0);
        path.rect(0.0, 0.0, 5.0, 5.0);
        path.begin_path();
        assert!(path.subpaths().is_empty());
        assert!(path.is_empty());
    }

    #[test]
    fn move_to_starts_new_subpath() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0);
        path.line_to(10.0, 0.0);
        path.move_to(5.0, 5.0);
        assert_eq!(path.subpaths().len(), 2);
        assert_eq!(path.subpaths()[1].points(), &[point(5.0, 5.0)]);
    }

    #[test]
    fn line_to_without_subpath_acts_like_move_to() {
        let mut path = Path::new();
        path.line_to(7.0, 8.0);
        assert_eq!(path.subpaths().len(), 1);
        assert_eq!(path.subpaths()[0].points(), &[point(7.0, 8.0)]);

        path.line_to(9.0, 8.0);
        assert_eq!(path.subpaths()[0].len(), 2);
    }

    #[test]
    fn non_finite_points_are_ignored() {
        let mut path = Path::new();
        path.move_to(f32::NAN, 0.0);
        assert!(path.subpaths().is_empty());
        path.move_to(0.0, 0.0);
        path.line_to(f32::INFINITY, 1.0);
        path.rect(0.0, 0.0, f32::NEG_INFINITY, 1.0);
        assert_eq!(path.point_count(), 1);
    }

    #[test]
    fn close_path_repeats_first_point() {
        let mut path = Path::new();
        path.close_path();
        assert!(path.subpaths().is_empty());

        path.move_to(0.0, 0.0);
        path.line_to(10.0, 0.0);
        path.line_to(10.0, 10.0);
        path.close_path();
        assert_eq!(path.subpaths()[0].last(), Some(point(0.0, 0.0)));
        assert_eq!(path.subpaths()[1].points(), &[point(0.0, 0.0)]);
    }

    #[test]
    fn rect_adds_closed_subpath() {
        let mut path = Path::new();
        path.rect(1.0, 2.0, 3.0, 4.0);
        assert_eq!(
            path.subpaths()[0].points(),
            &[
                point(1.0, 2.0),
                point(4.0, 2.0),
                point(4.0, 6.0),
                point(1.0, 6.0),
                point(1.0, 2.0)
            ]
        );
        assert_eq!(path.subpaths()[1].points(), &[point(1.0, 2.0)]);
    }

    #[test]
    fn arc_with_equal_angles_adds_nothing() {
        for anticlockwise in [false, true] {
            let mut path = Path::new();
            path.move_to(0.0, 0.0);
            path.arc(50.0, 25.0, 10.0, 1.0, 1.0, anticlockwise).unwrap();
            assert_eq!(path.point_count(), 1);

            let mut empty = Path::new();
            empty.arc(50.0, 25.0, 10.0, 0.0, 0.0, anticlockwise).unwrap();
            assert!(empty.subpaths().is_empty());
        }
    }

    #[test]
    fn negative_radius_is_rejected() {
        let mut path = Path::new();
        let error = path.arc(0.0, 0.0, -1.0, 0.0, 0.0, true).unwrap_err();
        match error {
            CanvasError::InvalidArgument(message) => {
                assert_eq!(message, "The radius provided (-1) is negative.")
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(path.subpaths().is_empty());
    }

    #[test]
    fn non_finite_arc_arguments_are_ignored() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0);
        let (inf, nan) = (f32::INFINITY, f32::NAN);
        let cases = [
            (inf, 0.0, 50.0, 0.0, 2.0 * PI),
            (-inf, 0.0, 50.0, 0.0, 2.0 * PI),
            (nan, 0.0, 50.0, 0.0, 2.0 * PI),
            (0.0, inf, 50.0, 0.0, 2.0 * PI),
            (0.0, 0.0, inf, 0.0, 2.0 * PI),
            (0.0, 0.0, 50.0, nan, 2.0 * PI),
            (0.0, 0.0, 50.0, 0.0, -inf),
            // Non-finite wins over the negative radius check.
            (0.0, 0.0, -inf, 0.0, 2.0 * PI),
        ];
        for (x, y, r, start, end) in cases {
            assert!(path.arc(x, y, r, start, end, true).is_ok());
        }
        assert_eq!(path.point_count(), 1);
    }

    #[test]
    fn arc_on_empty_path_does_not_lead_with_a_segment() {
        let mut path = Path::new();
        path.arc(0.0, 0.0, 4.0, 0.0, PI / 2.0, false).unwrap();
        let subpath = &path.subpaths()[0];
        // floor(30 * sqrt(4)) = 60 segments, 61 points
        assert_eq!(subpath.len(), 61);
        assert!(approx(subpath.points()[0], point(4.0, 0.0)));
        assert!(approx(subpath.last().unwrap(), point(0.0, 4.0)));
    }

    #[test]
    fn arc_after_existing_point_connects_to_it() {
        let mut path = Path::new();
        path.move_to(-10.0, 0.0);
        path.arc(0.0, 0.0, 4.0, 0.0, PI / 2.0, false).unwrap();
        let subpath = &path.subpaths()[0];
        assert_eq!(subpath.len(), 62);
        assert_eq!(subpath.points()[0], point(-10.0, 0.0));
        assert!(approx(subpath.points()[1], point(4.0, 0.0)));
    }

    #[test]
    fn zero_radius_arc_emits_its_center() {
        let mut path = Path::new();
        path.move_to(0.0, 25.0);
        path.arc(200.0, 25.0, 0.0, 0.0, PI, true).unwrap();
        assert_eq!(path.subpaths()[0].points(), &[point(0.0, 25.0), point(200.0, 25.0)]);
    }

    #[test]
    fn full_sweep_covers_the_whole_circle() {
        for anticlockwise in [false, true] {
            let mut path = Path::new();
            path.arc(0.0, 0.0, 9.0, 0.0, 2.0 * PI + 0.001, anticlockwise)
                .unwrap();
            let points = path.subpaths()[0].points();
            // Every quadrant receives points.
            assert!(points.iter().any(|p| p.x > 8.0));
            assert!(points.iter().any(|p| p.x < -8.0));
            assert!(points.iter().any(|p| p.y > 8.0));
            assert!(points.iter().any(|p| p.y < -8.0));
            let (first, last) = (points[0], *points.last().unwrap());
            assert!((first - last).length() < 0.1);
        }
    }

    #[test]
    fn anticlockwise_reconciliation_is_preserved() {
        // start 0, end π/2 anticlockwise: end becomes 2π − π/2 and the sweep runs backwards
        // from 0 to -3π/2, ending at the bottom of the circle.
        let mut path = Path::new();
        path.arc(0.0, 0.0, 1.0, 0.0, PI / 2.0, true).unwrap();
        let points = path.subpaths()[0].points();
        assert_eq!(points.len(), 31);
        assert!(approx(points[0], point(1.0, 0.0)));
        assert!(points[15].x < 0.0 && points[15].y < 0.0);
        assert!(approx(*points.last().unwrap(), point(0.0, 1.0)));
    }

    #[test]
    fn negative_angles_are_shifted_into_range() {
        // -π/2 → π/2 clockwise becomes 3π/2 → 5π/2.
        let mut path = Path::new();
        path.arc(0.0, 0.0, 1.0, -PI / 2.0, PI / 2.0, false).unwrap();
        let points = path.subpaths()[0].points();
        assert!(approx(points[0], point(0.0, -1.0)));
        assert!(approx(*points.last().unwrap(), point(0.0, 1.0)));
        assert!(points.iter().all(|p| p.x > -1e-3));
    }
}
