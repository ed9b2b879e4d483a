//! Conversion of canvas shapes into GPU-ready triangle meshes.
//!
//! Fills use a fan around the first vertex, which is exact for convex outlines and for the
//! rectangles and arcs the canvas produces most. Strokes extrude one quad per segment with
//! no joins or caps, so thick strokes show gaps and overlaps at corners.

use lyon::math::{point, Point, Vector};
use tracing::debug;

use crate::path::Path;
use crate::stroke::Stroke;
use crate::vertex::{PrimitiveVertex, Vertex};
use crate::Color;

/// Primitive assembly for a vertex run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    TriangleStrip,
    TriangleFan,
    TriangleList,
}

impl Topology {
    /// Number of triangles `vertex_count` vertices assemble into.
    pub fn triangle_count(&self, vertex_count: usize) -> usize {
        match self {
            Topology::TriangleStrip | Topology::TriangleFan => vertex_count.saturating_sub(2),
            Topology::TriangleList => vertex_count / 3,
        }
    }

    /// Vertex indices of triangle `triangle`.
    pub fn triangle_indices(&self, triangle: usize) -> [usize; 3] {
        match self {
            Topology::TriangleStrip => [triangle, triangle + 1, triangle + 2],
            Topology::TriangleFan => [0, triangle + 1, triangle + 2],
            Topology::TriangleList => [triangle * 3, triangle * 3 + 1, triangle * 3 + 2],
        }
    }
}

/// CPU-side vertex data plus its topology. Immutable once uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh<V = PrimitiveVertex> {
    pub vertices: Vec<V>,
    pub topology: Topology,
}

impl<V: Vertex> Mesh<V> {
    pub fn new(vertices: Vec<V>, topology: Topology) -> Self {
        Self { vertices, topology }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Topology::TriangleList)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.topology.triangle_count(self.vertices.len())
    }

    /// True when the mesh assembles no triangle.
    pub fn is_empty(&self) -> bool {
        self.triangle_count() == 0
    }

    pub fn triangles(&self) -> impl Iterator<Item = [V; 3]> + '_ {
        (0..self.triangle_count()).map(move |triangle| {
            let [a, b, c] = self.topology.triangle_indices(triangle);
            [self.vertices[a], self.vertices[b], self.vertices[c]]
        })
    }

    /// Re-expresses the mesh as an independent triangle list.
    pub fn into_triangle_list(self) -> Self {
        if self.topology == Topology::TriangleList {
            return self;
        }
        let vertices = self.triangles().flatten().collect();
        Self::new(vertices, Topology::TriangleList)
    }

    /// Merges `other` into `self`. Meshes with different topologies are flattened to lists.
    pub fn append(&mut self, other: Mesh<V>) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = other;
            return;
        }
        let mut merged = std::mem::replace(self, Mesh::empty()).into_triangle_list();
        merged.vertices.extend(other.into_triangle_list().vertices);
        *self = merged;
    }
}

/// How a shape is painted. Exactly one of fill or stroke per tessellation request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    Fill { color: Color, alpha: f32 },
    Stroke(Stroke),
}

impl Paint {
    pub fn fill(color: Color) -> Self {
        Paint::Fill { color, alpha: 1.0 }
    }

    pub fn color(&self) -> Color {
        match self {
            Paint::Fill { color, .. } => *color,
            Paint::Stroke(stroke) => stroke.color,
        }
    }

    pub fn alpha(&self) -> f32 {
        match self {
            Paint::Fill { alpha, .. } => *alpha,
            Paint::Stroke(stroke) => stroke.alpha,
        }
    }
}

/// A finalized shape ready for tessellation.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rectangle {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Polygon { points: Vec<Point> },
}

impl Shape {
    pub fn rect(x: f32, y: f32, width: f32, height: f32) -> Self {
        Shape::Rectangle {
            x,
            y,
            width,
            height,
        }
    }

    pub fn polygon(points: impl Into<Vec<Point>>) -> Self {
        Shape::Polygon {
            points: points.into(),
        }
    }

    pub fn tessellate(&self, paint: &Paint) -> Mesh {
        match (self, paint) {
            (
                Shape::Rectangle {
                    x,
                    y,
                    width,
                    height,
                },
                Paint::Fill { .. },
            ) => fill_rectangle(*x, *y, *width, *height),
            (
                Shape::Rectangle {
                    x,
                    y,
                    width,
                    height,
                },
                Paint::Stroke(stroke),
            ) => stroke_rectangle(*x, *y, *width, *height, stroke),
            (Shape::Polygon { points }, Paint::Fill { .. }) => fill_polygon(points),
            (Shape::Polygon { points }, Paint::Stroke(stroke)) => stroke_polyline(points, stroke),
        }
    }
}

/// Tessellates every subpath of `path` into one mesh.
pub fn tessellate_path(path: &Path, paint: &Paint) -> Mesh {
    let mut mesh = Mesh::empty();
    for subpath in path.subpaths() {
        let shape = Shape::polygon(subpath.points());
        mesh.append(shape.tessellate(paint));
    }
    debug!(
        subpaths = path.subpaths().len(),
        vertices = mesh.vertex_count(),
        "tessellated path"
    );
    mesh
}

fn fill_rectangle(x: f32, y: f32, width: f32, height: f32) -> Mesh {
    Mesh::new(
        vec![
            PrimitiveVertex::new(x, y),
            PrimitiveVertex::new(x + width, y),
            PrimitiveVertex::new(x, y + height),
            PrimitiveVertex::new(x + width, y + height),
        ],
        Topology::TriangleStrip,
    )
}

fn stroke_rectangle(x: f32, y: f32, width: f32, height: f32, stroke: &Stroke) -> Mesh {
    if stroke.is_empty() || (width == 0.0 && height == 0.0) {
        return Mesh::empty();
    }

    let (left, right) = (x.min(x + width), x.max(x + width));
    let (top, bottom) = (y.min(y + height), y.max(y + height));
    let half = stroke.half_width();

    let mut vertices = Vec::with_capacity(24);
    // top, bottom, left, right
    push_quad(
        &mut vertices,
        (left - half, top - half),
        (right + half, top + half),
    );
    push_quad(
        &mut vertices,
        (left - half, bottom - half),
        (right + half, bottom + half),
    );
    push_quad(
        &mut vertices,
        (left - half, top - half),
        (left + half, bottom + half),
    );
    push_quad(
        &mut vertices,
        (right - half, top - half),
        (right + half, bottom + half),
    );
    Mesh::new(vertices, Topology::TriangleList)
}

fn push_quad(vertices: &mut Vec<PrimitiveVertex>, min: (f32, f32), max: (f32, f32)) {
    let top_left = PrimitiveVertex::new(min.0, min.1);
    let top_right = PrimitiveVertex::new(max.0, min.1);
    let bottom_left = PrimitiveVertex::new(min.0, max.1);
    let bottom_right = PrimitiveVertex::new(max.0, max.1);
    vertices.extend_from_slice(&[
        top_left,
        top_right,
        bottom_left,
        bottom_left,
        top_right,
        bottom_right,
    ]);
}

fn fill_polygon(points: &[Point]) -> Mesh {
    if points.len() < 3 {
        return Mesh::empty();
    }
    let vertices = points
        .iter()
        .map(|p| PrimitiveVertex::new(p.x, p.y))
        .collect();
    Mesh::new(vertices, Topology::TriangleFan)
}

fn stroke_polyline(points: &[Point], stroke: &Stroke) -> Mesh {
    if stroke.is_empty() || points.len() < 2 {
        return Mesh::empty();
    }

    let half = stroke.half_width();
    let mut vertices = Vec::with_capacity((points.len() - 1) * 6);
    for segment in points.windows(2) {
        let (from, to) = (segment[0], segment[1]);
        let direction: Vector = to - from;
        let length = direction.length();
        if length == 0.0 || !length.is_finite() {
            continue;
        }
        let normal = Vector::new(-direction.y, direction.x) * (half / length);

        let from_outer = from + normal;
        let from_inner = from - normal;
        let to_outer = to + normal;
        let to_inner = to - normal;
        vertices.extend(
            [from_outer, from_inner, to_outer, to_outer, from_inner, to_inner]
                .iter()
                .map(|p| PrimitiveVertex::new(p.x, p.y)),
        );
    }
    Mesh::new(vertices, Topology::TriangleList)
}

/// Signed area of a triangle, positive when clockwise in y-down space.
pub(crate) fn signed_area(a: [f32; 2], b: [f32; 2], c: [f32; 2]) -> f32 {
    let ab = point(b[0], b[1]) - point(a[0], a[1]);
    let ac = point(c[0], c[1]) - point(a[0], a[1]);
    ab.cross(ac) * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covered_area(mesh: &Mesh) -> f32 {
        mesh.triangles()
            .map(|[a, b, c]| signed_area(a.position, b.position, c.position).abs())
            .sum()
    }

    #[test]
    fn filled_rectangle_is_a_four_vertex_strip() {
        let mesh = Shape::rect(10.0, 20.0, 30.0, 40.0).tessellate(&Paint::fill(Color::BLACK));
        assert_eq!(mesh.topology, Topology::TriangleStrip);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert!((covered_area(&mesh) - 1200.0).abs() < 1e-3);
    }

    #[test]
    fn stroked_rectangle_emits_four_border_quads() {
        let stroke = Stroke::new(4.0, Color::BLACK);
        let mesh = Shape::rect(0.0, 0.0, 20.0, 10.0).tessellate(&Paint::Stroke(stroke));
        assert_eq!(mesh.topology, Topology::TriangleList);
        assert_eq!(mesh.vertex_count(), 24);

        // Horizontal quads span the full width plus the stroke overhang.
        let top: Vec<_> = mesh.vertices[..6].iter().map(|v| v.position).collect();
        assert!(top.contains(&[-2.0, -2.0]));
        assert!(top.contains(&[22.0, 2.0]));
        // 2 × (24 × 4) + 2 × (4 × 14)
        assert!((covered_area(&mesh) - 304.0).abs() < 1e-3);
    }

    #[test]
    fn stroked_rectangle_normalizes_negative_sizes() {
        let stroke = Stroke::new(2.0, Color::BLACK);
        let positive = Shape::rect(0.0, 0.0, 10.0, 10.0).tessellate(&Paint::Stroke(stroke));
        let negative = Shape::rect(10.0, 10.0, -10.0, -10.0).tessellate(&Paint::Stroke(stroke));
        assert_eq!(positive, negative);
    }

    #[test]
    fn degenerate_polygons_produce_nothing() {
        let fill = Paint::fill(Color::BLACK);
        assert!(Shape::polygon(vec![]).tessellate(&fill).is_empty());
        assert!(Shape::polygon(vec![point(1.0, 1.0), point(2.0, 2.0)])
            .tessellate(&fill)
            .is_empty());

        let stroke = Paint::Stroke(Stroke::new(5.0, Color::BLACK));
        assert!(Shape::polygon(vec![point(1.0, 1.0)])
            .tessellate(&stroke)
            .is_empty());
        assert!(Shape::polygon(vec![point(1.0, 1.0), point(1.0, 1.0)])
            .tessellate(&stroke)
            .is_empty());
    }

    #[test]
    fn filled_polygon_fans_around_first_vertex() {
        let square = vec![
            point(0.0, 0.0),
            point(10.0, 0.0),
            point(10.0, 10.0),
            point(0.0, 10.0),
        ];
        let mesh = Shape::polygon(square).tessellate(&Paint::fill(Color::BLACK));
        assert_eq!(mesh.topology, Topology::TriangleFan);
        assert_eq!(mesh.triangle_count(), 2);
        for [pivot, _, _] in mesh.triangles() {
            assert_eq!(pivot.position, [0.0, 0.0]);
        }
        assert!((covered_area(&mesh) - 100.0).abs() < 1e-3);
    }

    #[test]
    fn stroke_extrudes_one_quad_per_segment() {
        let line = vec![point(0.0, 0.0), point(10.0, 0.0), point(10.0, 10.0)];
        let mesh = Shape::polygon(line).tessellate(&Paint::Stroke(Stroke::new(2.0, Color::BLACK)));
        assert_eq!(mesh.vertex_count(), 12);
        assert!((covered_area(&mesh) - 40.0).abs() < 1e-3);

        let ys: Vec<f32> = mesh.vertices[..6].iter().map(|v| v.position[1]).collect();
        assert!(ys.iter().all(|y| (y.abs() - 1.0).abs() < 1e-6));
    }

    #[test]
    fn zero_length_segments_are_skipped() {
        let line = vec![point(0.0, 0.0), point(0.0, 0.0), point(4.0, 0.0)];
        let mesh = Shape::polygon(line).tessellate(&Paint::Stroke(Stroke::new(2.0, Color::BLACK)));
        assert_eq!(mesh.vertex_count(), 6);
    }

    #[test]
    fn path_with_several_subpaths_merges_into_a_list() {
        let mut path = Path::new();
        path.rect(0.0, 0.0, 10.0, 10.0);
        path.rect(20.0, 0.0, 10.0, 10.0);
        let mesh = tessellate_path(&path, &Paint::fill(Color::BLACK));
        assert_eq!(mesh.topology, Topology::TriangleList);
        assert!((covered_area(&mesh) - 200.0).abs() < 1e-3);
    }

    #[test]
    fn single_subpath_keeps_fan_topology() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0);
        path.line_to(10.0, 0.0);
        path.line_to(0.0, 10.0);
        let mesh = tessellate_path(&path, &Paint::fill(Color::BLACK));
        assert_eq!(mesh.topology, Topology::TriangleFan);
    }

    #[test]
    fn empty_path_tessellates_to_nothing() {
        let path = Path::new();
        assert!(tessellate_path(&path, &Paint::fill(Color::BLACK)).is_empty());
    }

    #[test]
    fn strip_and_fan_flatten_to_lists() {
        let strip = Shape::rect(0.0, 0.0, 1.0, 1.0)
            .tessellate(&Paint::fill(Color::BLACK))
            .into_triangle_list();
        assert_eq!(strip.vertex_count(), 6);
        assert_eq!(strip.vertices[3].position, [1.0, 0.0]);
    }
}
