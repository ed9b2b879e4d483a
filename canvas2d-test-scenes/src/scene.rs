//! Canvas conformance scenes.
//!
//! Each scene draws on a fresh canvas and returns the pixels it expects. Most follow the HTML
//! canvas conformance suite: a 100×50 canvas where green means pass and red means fail.
//! Points that fall in the gaps between unmitered stroke quads are not asserted.

use std::f32::consts::PI;

use canvas2d::{Canvas, CanvasError, GpuDevice};

use crate::expectations::PixelExpectation;

pub const CANVAS_WIDTH: u32 = 100;
pub const CANVAS_HEIGHT: u32 = 50;

const CORNERS: [(u32, u32); 4] = [(1, 1), (98, 1), (1, 48), (98, 48)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scene {
    FillRectBasic,
    FillRectGrid,
    StrokeRectBasic,
    ClearRectBasic,
    ClearRectPartial,
    PathRectBasic,
    PathInitial,
    PathBeginPath,
    PathMoveToBasic,
    PathMoveToNewSubpath,
    ArcEmpty,
    ArcNonEmpty,
    ArcEnd,
    ArcDefault,
    ArcAngle1,
    ArcAngle2,
    ArcAngle3,
    ArcAngle4,
    ArcAngle5,
    ArcAngle6,
    ArcZero1,
    ArcZero2,
    ArcTwoPiE1,
    ArcTwoPiE2,
    ArcTwoPiE3,
    ArcTwoPiE4,
    ArcShape1,
    ArcShape2,
    ArcShape3,
    ArcShape4,
    ArcShape5,
    ArcSelfIntersect1,
    ArcSelfIntersect2,
    ArcZeroRadius,
    ArcNonFinite,
    MdnArcExample,
    LineWidthBasic,
}

impl Scene {
    pub const ALL: &'static [Scene] = &[
        Scene::FillRectBasic,
        Scene::FillRectGrid,
        Scene::StrokeRectBasic,
        Scene::ClearRectBasic,
        Scene::ClearRectPartial,
        Scene::PathRectBasic,
        Scene::PathInitial,
        Scene::PathBeginPath,
        Scene::PathMoveToBasic,
        Scene::PathMoveToNewSubpath,
        Scene::ArcEmpty,
        Scene::ArcNonEmpty,
        Scene::ArcEnd,
        Scene::ArcDefault,
        Scene::ArcAngle1,
        Scene::ArcAngle2,
        Scene::ArcAngle3,
        Scene::ArcAngle4,
        Scene::ArcAngle5,
        Scene::ArcAngle6,
        Scene::ArcZero1,
        Scene::ArcZero2,
        Scene::ArcTwoPiE1,
        Scene::ArcTwoPiE2,
        Scene::ArcTwoPiE3,
        Scene::ArcTwoPiE4,
        Scene::ArcShape1,
        Scene::ArcShape2,
        Scene::ArcShape3,
        Scene::ArcShape4,
        Scene::ArcShape5,
        Scene::ArcSelfIntersect1,
        Scene::ArcSelfIntersect2,
        Scene::ArcZeroRadius,
        Scene::ArcNonFinite,
        Scene::MdnArcExample,
        Scene::LineWidthBasic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scene::FillRectBasic => "2d.fillRect.basic",
            Scene::FillRectGrid => "2d.fillRect.grid",
            Scene::StrokeRectBasic => "2d.strokeRect.basic",
            Scene::ClearRectBasic => "2d.clearRect.basic",
            Scene::ClearRectPartial => "2d.clearRect.partial",
            Scene::PathRectBasic => "2d.path.rect.basic",
            Scene::PathInitial => "2d.path.initial",
            Scene::PathBeginPath => "2d.path.beginPath",
            Scene::PathMoveToBasic => "2d.path.moveTo.basic",
            Scene::PathMoveToNewSubpath => "2d.path.moveTo.newsubpath",
            Scene::ArcEmpty => "2d.path.arc.empty",
            Scene::ArcNonEmpty => "2d.path.arc.nonempty",
            Scene::ArcEnd => "2d.path.arc.end",
            Scene::ArcDefault => "2d.path.arc.default",
            Scene::ArcAngle1 => "2d.path.arc.angle.1",
            Scene::ArcAngle2 => "2d.path.arc.angle.2",
            Scene::ArcAngle3 => "2d.path.arc.angle.3",
            Scene::ArcAngle4 => "2d.path.arc.angle.4",
            Scene::ArcAngle5 => "2d.path.arc.angle.5",
            Scene::ArcAngle6 => "2d.path.arc.angle.6",
            Scene::ArcZero1 => "2d.path.arc.zero.1",
            Scene::ArcZero2 => "2d.path.arc.zero.2",
            Scene::ArcTwoPiE1 => "2d.path.arc.twopie.1",
            Scene::ArcTwoPiE2 => "2d.path.arc.twopie.2",
            Scene::ArcTwoPiE3 => "2d.path.arc.twopie.3",
            Scene::ArcTwoPiE4 => "2d.path.arc.twopie.4",
            Scene::ArcShape1 => "2d.path.arc.shape.1",
            Scene::ArcShape2 => "2d.path.arc.shape.2",
            Scene::ArcShape3 => "2d.path.arc.shape.3",
            Scene::ArcShape4 => "2d.path.arc.shape.4",
            Scene::ArcShape5 => "2d.path.arc.shape.5",
            Scene::ArcSelfIntersect1 => "2d.path.arc.selfintersect.1",
            Scene::ArcSelfIntersect2 => "2d.path.arc.selfintersect.2",
            Scene::ArcZeroRadius => "2d.path.arc.zeroradius",
            Scene::ArcNonFinite => "2d.path.arc.nonfinite",
            Scene::MdnArcExample => "mdn.arc",
            Scene::LineWidthBasic => "2d.line.width.basic",
        }
    }

    /// Logical canvas size the scene is drawn at.
    pub fn size(&self) -> (u32, u32) {
        match self {
            Scene::FillRectGrid => (150, 150),
            Scene::MdnArcExample => (150, 200),
            _ => (CANVAS_WIDTH, CANVAS_HEIGHT),
        }
    }

    /// Draws the scene and returns what the framebuffer should hold afterwards.
    pub fn draw<D: GpuDevice>(
        &self,
        ctx: &mut Canvas<D>,
    ) -> Result<Vec<PixelExpectation>, CanvasError> {
        match self {
            Scene::FillRectBasic => fill_rect_basic(ctx),
            Scene::FillRectGrid => fill_rect_grid(ctx),
            Scene::StrokeRectBasic => stroke_rect_basic(ctx),
            Scene::ClearRectBasic => clear_rect_basic(ctx),
            Scene::ClearRectPartial => clear_rect_partial(ctx),
            Scene::PathRectBasic => path_rect_basic(ctx),
            Scene::PathInitial => path_initial(ctx),
            Scene::PathBeginPath => path_begin_path(ctx),
            Scene::PathMoveToBasic => path_move_to_basic(ctx),
            Scene::PathMoveToNewSubpath => path_move_to_new_subpath(ctx),
            Scene::ArcEmpty => arc_empty(ctx),
            Scene::ArcNonEmpty => arc_non_empty(ctx),
            Scene::ArcEnd => arc_end(ctx),
            Scene::ArcDefault => pie_outside_canvas(ctx, -PI, PI / 2.0, false),
            Scene::ArcAngle1 => pie_outside_canvas(ctx, PI / 2.0, -PI, true),
            Scene::ArcAngle2 => pie_outside_canvas(ctx, -3.0 * PI / 2.0, -PI, true),
            Scene::ArcAngle3 => pie_outside_canvas(ctx, (512.0 + 0.5) * PI, (1024.0 - 1.0) * PI, true),
            Scene::ArcAngle4 => full_disc(ctx, (512.0 + 0.5) * PI, (1024.0 - 1.0) * PI, false),
            Scene::ArcAngle5 => pie_outside_canvas(ctx, (1024.0 - 1.0) * PI, (512.0 + 0.5) * PI, false),
            Scene::ArcAngle6 => full_disc(ctx, (1024.0 - 1.0) * PI, (512.0 + 0.5) * PI, true),
            Scene::ArcZero1 => thick_arc_absent(ctx, 0.0, true),
            Scene::ArcZero2 => thick_arc_absent(ctx, 0.0, false),
            Scene::ArcTwoPiE1 => thick_arc_absent(ctx, 2.0 * PI - 1e-4, true),
            Scene::ArcTwoPiE2 => thick_arc_present(ctx, 2.0 * PI - 1e-4, false),
            Scene::ArcTwoPiE3 => thick_arc_present(ctx, 2.0 * PI + 1e-4, true),
            Scene::ArcTwoPiE4 => thick_arc_present(ctx, 2.0 * PI + 1e-4, false),
            Scene::ArcShape1 => arc_shape_1(ctx),
            Scene::ArcShape2 => arc_shape_2(ctx),
            Scene::ArcShape3 => arc_shape_3(ctx),
            Scene::ArcShape4 => arc_shape_4(ctx),
            Scene::ArcShape5 => arc_shape_5(ctx),
            Scene::ArcSelfIntersect1 => arc_self_intersect_1(ctx),
            Scene::ArcSelfIntersect2 => arc_self_intersect_2(ctx),
            Scene::ArcZeroRadius => arc_zero_radius(ctx),
            Scene::ArcNonFinite => arc_non_finite(ctx),
            Scene::MdnArcExample => mdn_arc_example(ctx),
            Scene::LineWidthBasic => line_width_basic(ctx),
        }
    }
}

fn background<D: GpuDevice>(ctx: &mut Canvas<D>, style: &str) -> Result<(), CanvasError> {
    ctx.set_fill_style(style)?;
    ctx.fill_rect(0.0, 0.0, CANVAS_WIDTH as f32, CANVAS_HEIGHT as f32)
}

fn green_corners(label: &'static str) -> Vec<PixelExpectation> {
    CORNERS
        .iter()
        .map(|&(x, y)| PixelExpectation::green(x, y, label))
        .collect()
}

// ── Rectangles ───────────────────────────────────────────────────────────────

fn fill_rect_basic<D: GpuDevice>(
    ctx: &mut Canvas<D>,
) -> Result<Vec<PixelExpectation>, CanvasError> {
    ctx.set_fill_style("#0f0")?;
    ctx.fill_rect(0.0, 0.0, 100.0, 50.0)?;
    Ok(vec![PixelExpectation::green(50, 25, "filled")])
}

/// Red-green gradient of 6×6 cells, each drawn with its own `rgb()` style.
fn fill_rect_grid<D: GpuDevice>(
    ctx: &mut Canvas<D>,
) -> Result<Vec<PixelExpectation>, CanvasError> {
    let mut expectations = Vec::new();
    for i in 0..6u32 {
        for j in 0..6u32 {
            let r = (255.0 - 42.5 * i as f32).floor() as u8;
            let g = (255.0 - 42.5 * j as f32).floor() as u8;
            ctx.set_fill_style(&format!("rgb({r},{g},0)"))?;
            ctx.fill_rect(j as f32 * 25.0, i as f32 * 25.0, 25.0, 25.0)?;
            expectations.push(
                PixelExpectation::opaque(j * 25 + 12, i * 25 + 12, r, g, 0, "grid cell")
                    .with_tolerance(1),
            );
        }
    }
    Ok(expectations)
}

fn stroke_rect_basic<D: GpuDevice>(
    ctx: &mut Canvas<D>,
) -> Result<Vec<PixelExpectation>, CanvasError> {
    ctx.set_stroke_style("#0f0")?;
    ctx.set_line_width(50.0);
    ctx.stroke_rect(25.0, 24.0, 50.0, 2.0)?;
    Ok(vec![PixelExpectation::green(50, 25, "stroked")])
}

fn clear_rect_basic<D: GpuDevice>(
    ctx: &mut Canvas<D>,
) -> Result<Vec<PixelExpectation>, CanvasError> {
    background(ctx, "#f00")?;
    ctx.clear_rect(0.0, 0.0, 100.0, 50.0);
    Ok(vec![PixelExpectation::transparent(50, 25, "cleared")])
}

fn clear_rect_partial<D: GpuDevice>(
    ctx: &mut Canvas<D>,
) -> Result<Vec<PixelExpectation>, CanvasError> {
    background(ctx, "#0f0")?;
    ctx.clear_rect(0.0, 0.0, 50.0, 50.0);
    Ok(vec![
        PixelExpectation::transparent(25, 25, "cleared half"),
        PixelExpectation::transparent(49, 25, "cleared edge"),
        PixelExpectation::green(50, 25, "kept edge"),
        PixelExpectation::green(75, 25, "kept half"),
    ])
}

// ── Paths ────────────────────────────────────────────────────────────────────

fn path_rect_basic<D: GpuDevice>(
    ctx: &mut Canvas<D>,
) -> Result<Vec<PixelExpectation>, CanvasError> {
    background(ctx, "#f00")?;
    ctx.set_fill_style("#0f0")?;
    ctx.rect(0.0, 0.0, 100.0, 50.0);
    ctx.fill()?;
    Ok(vec![PixelExpectation::green(50, 25, "rect path")])
}

/// `close_path` with no subpaths does nothing, so the fill draws nothing.
fn path_initial<D: GpuDevice>(
    ctx: &mut Canvas<D>,
) -> Result<Vec<PixelExpectation>, CanvasError> {
    background(ctx, "#0f0")?;
    ctx.close_path();
    ctx.set_fill_style("#f00")?;
    ctx.fill()?;
    Ok(vec![PixelExpectation::green(50, 25, "nothing filled")])
}

fn path_begin_path<D: GpuDevice>(
    ctx: &mut Canvas<D>,
) -> Result<Vec<PixelExpectation>, CanvasError> {
    background(ctx, "#0f0")?;
    ctx.rect(0.0, 0.0, 100.0, 50.0);
    ctx.begin_path();
    ctx.set_fill_style("#f00")?;
    ctx.fill()?;
    Ok(vec![PixelExpectation::green(50, 25, "path discarded")])
}

fn path_move_to_basic<D: GpuDevice>(
    ctx: &mut Canvas<D>,
) -> Result<Vec<PixelExpectation>, CanvasError> {
    background(ctx, "#f00")?;
    ctx.rect(0.0, 0.0, 10.0, 50.0);
    ctx.move_to(100.0, 0.0);
    ctx.line_to(10.0, 0.0);
    ctx.line_to(10.0, 50.0);
    ctx.line_to(100.0, 50.0);
    ctx.set_fill_style("#0f0")?;
    ctx.fill()?;
    Ok(vec![
        PixelExpectation::green(90, 25, "second subpath"),
        PixelExpectation::green(5, 25, "rect subpath"),
    ])
}

fn path_move_to_new_subpath<D: GpuDevice>(
    ctx: &mut Canvas<D>,
) -> Result<Vec<PixelExpectation>, CanvasError> {
    background(ctx, "#0f0")?;
    ctx.begin_path();
    ctx.move_to(0.0, 0.0);
    ctx.move_to(100.0, 0.0);
    ctx.move_to(100.0, 50.0);
    ctx.move_to(0.0, 50.0);
    ctx.set_fill_style("#f00")?;
    ctx.fill()?;
    Ok(vec![PixelExpectation::green(50, 25, "single points fill nothing")])
}

// ── Arcs ─────────────────────────────────────────────────────────────────────

/// On an empty path the arc does not connect to anything.
fn arc_empty<D: GpuDevice>(ctx: &mut Canvas<D>) -> Result<Vec<PixelExpectation>, CanvasError> {
    background(ctx, "#0f0")?;
    ctx.set_line_width(50.0);
    ctx.set_stroke_style("#f00")?;
    ctx.begin_path();
    ctx.arc(200.0, 25.0, 5.0, 0.0, 2.0 * PI, true)?;
    ctx.stroke()?;
    Ok(vec![PixelExpectation::green(50, 25, "no leading segment")])
}

/// After an existing point the arc is joined to it by a straight segment.
fn arc_non_empty<D: GpuDevice>(
    ctx: &mut Canvas<D>,
) -> Result<Vec<PixelExpectation>, CanvasError> {
    background(ctx, "#f00")?;
    ctx.set_line_width(50.0);
    ctx.set_stroke_style("#0f0")?;
    ctx.begin_path();
    ctx.move_to(0.0, 25.0);
    ctx.arc(200.0, 25.0, 5.0, 0.0, 2.0 * PI, true)?;
    ctx.stroke()?;
    Ok(vec![PixelExpectation::green(50, 25, "leading segment")])
}

/// The arc's end point is where the next `line_to` continues from.
fn arc_end<D: GpuDevice>(ctx: &mut Canvas<D>) -> Result<Vec<PixelExpectation>, CanvasError> {
    background(ctx, "#f00")?;
    ctx.set_line_width(50.0);
    ctx.set_stroke_style("#0f0")?;
    ctx.begin_path();
    ctx.move_to(-100.0, 0.0);
    ctx.arc(-100.0, 0.0, 25.0, -PI / 2.0, PI / 2.0, true)?;
    ctx.line_to(100.0, 25.0);
    ctx.stroke()?;
    Ok(vec![PixelExpectation::green(50, 25, "segment after arc")])
}

/// A red pie centered on the top-right corner whose sweep must leave the canvas untouched.
fn pie_outside_canvas<D: GpuDevice>(
    ctx: &mut Canvas<D>,
    start: f32,
    end: f32,
    anticlockwise: bool,
) -> Result<Vec<PixelExpectation>, CanvasError> {
    background(ctx, "#0f0")?;
    ctx.set_fill_style("#f00")?;
    ctx.begin_path();
    ctx.move_to(100.0, 0.0);
    ctx.arc(100.0, 0.0, 150.0, start, end, anticlockwise)?;
    ctx.fill()?;
    Ok(vec![PixelExpectation::green(50, 25, "outside the sweep")])
}

/// A green disc that must cover the whole canvas.
fn full_disc<D: GpuDevice>(
    ctx: &mut Canvas<D>,
    start: f32,
    end: f32,
    anticlockwise: bool,
) -> Result<Vec<PixelExpectation>, CanvasError> {
    background(ctx, "#f00")?;
    ctx.set_fill_style("#0f0")?;
    ctx.begin_path();
    ctx.move_to(50.0, 25.0);
    ctx.arc(50.0, 25.0, 60.0, start, end, anticlockwise)?;
    ctx.fill()?;
    Ok(green_corners("full circle"))
}

/// A thick red stroke of an arc that must not be drawn.
fn thick_arc_absent<D: GpuDevice>(
    ctx: &mut Canvas<D>,
    end: f32,
    anticlockwise: bool,
) -> Result<Vec<PixelExpectation>, CanvasError> {
    background(ctx, "#0f0")?;
    ctx.set_stroke_style("#f00")?;
    ctx.set_line_width(100.0);
    ctx.begin_path();
    ctx.arc(50.0, 25.0, 50.0, 0.0, end, anticlockwise)?;
    ctx.stroke()?;
    Ok(vec![PixelExpectation::green(50, 20, "no arc")])
}

/// A thick green stroke of a (nearly) full circle.
fn thick_arc_present<D: GpuDevice>(
    ctx: &mut Canvas<D>,
    end: f32,
    anticlockwise: bool,
) -> Result<Vec<PixelExpectation>, CanvasError> {
    background(ctx, "#f00")?;
    ctx.set_stroke_style("#0f0")?;
    ctx.set_line_width(100.0);
    ctx.begin_path();
    ctx.arc(50.0, 25.0, 50.0, 0.0, end, anticlockwise)?;
    ctx.stroke()?;
    Ok(vec![PixelExpectation::green(50, 20, "full arc")])
}

/// Clockwise from 0 to π stays in the bottom half, below the canvas.
fn arc_shape_1<D: GpuDevice>(ctx: &mut Canvas<D>) -> Result<Vec<PixelExpectation>, CanvasError> {
    background(ctx, "#0f0")?;
    ctx.set_line_width(50.0);
    ctx.set_stroke_style("#f00")?;
    ctx.begin_path();
    ctx.arc(50.0, 50.0, 50.0, 0.0, PI, false)?;
    ctx.stroke()?;
    let mut expectations = green_corners("wrong half");
    expectations.push(PixelExpectation::green(50, 25, "wrong half"));
    expectations.push(PixelExpectation::green(20, 48, "wrong half"));
    Ok(expectations)
}

/// Anticlockwise from 0 to π sweeps the top half, over the canvas.
fn arc_shape_2<D: GpuDevice>(ctx: &mut Canvas<D>) -> Result<Vec<PixelExpectation>, CanvasError> {
    background(ctx, "#f00")?;
    ctx.set_line_width(100.0);
    ctx.set_stroke_style("#0f0")?;
    ctx.begin_path();
    ctx.arc(50.0, 50.0, 50.0, 0.0, PI, true)?;
    ctx.stroke()?;
    Ok(vec![
        PixelExpectation::green(50, 25, "right half"),
        PixelExpectation::green(25, 30, "right half"),
        PixelExpectation::green(75, 30, "right half"),
        PixelExpectation::green(50, 10, "right half"),
    ])
}

fn arc_shape_3<D: GpuDevice>(ctx: &mut Canvas<D>) -> Result<Vec<PixelExpectation>, CanvasError> {
    background(ctx, "#0f0")?;
    ctx.set_line_width(100.0);
    ctx.set_stroke_style("#f00")?;
    ctx.begin_path();
    ctx.arc(0.0, 50.0, 50.0, 0.0, -PI / 2.0, false)?;
    ctx.stroke()?;
    let mut expectations = green_corners("wrong quadrant");
    expectations.push(PixelExpectation::green(50, 25, "wrong quadrant"));
    Ok(expectations)
}

fn arc_shape_4<D: GpuDevice>(ctx: &mut Canvas<D>) -> Result<Vec<PixelExpectation>, CanvasError> {
    background(ctx, "#f00")?;
    ctx.set_line_width(150.0);
    ctx.set_stroke_style("#0f0")?;
    ctx.begin_path();
    ctx.arc(-50.0, 50.0, 100.0, 0.0, -PI / 2.0, true)?;
    ctx.stroke()?;
    Ok(vec![
        PixelExpectation::green(1, 1, "right quadrant"),
        PixelExpectation::green(1, 48, "right quadrant"),
        PixelExpectation::green(30, 25, "right quadrant"),
    ])
}

/// Sweeping 0 to 5π far to the right must not reach the canvas.
fn arc_shape_5<D: GpuDevice>(ctx: &mut Canvas<D>) -> Result<Vec<PixelExpectation>, CanvasError> {
    background(ctx, "#0f0")?;
    ctx.set_line_width(200.0);
    ctx.set_stroke_style("#f00")?;
    ctx.begin_path();
    ctx.arc(300.0, 0.0, 100.0, 0.0, 5.0 * PI, false)?;
    ctx.stroke()?;
    let mut expectations = green_corners("off canvas");
    expectations.push(PixelExpectation::green(50, 25, "off canvas"));
    Ok(expectations)
}

/// A line width larger than the diameter still stays on the arc's side of the center.
fn arc_self_intersect_1<D: GpuDevice>(
    ctx: &mut Canvas<D>,
) -> Result<Vec<PixelExpectation>, CanvasError> {
    background(ctx, "#0f0")?;
    ctx.set_line_width(200.0);
    ctx.set_stroke_style("#f00")?;
    ctx.begin_path();
    ctx.arc(100.0, 50.0, 25.0, 0.0, -PI / 2.0, true)?;
    ctx.stroke()?;
    ctx.begin_path();
    ctx.arc(0.0, 0.0, 25.0, 0.0, -PI / 2.0, true)?;
    ctx.stroke()?;
    Ok(vec![
        PixelExpectation::green(1, 1, "self intersect"),
        PixelExpectation::green(50, 25, "self intersect"),
    ])
}

/// A stroke much wider than its radius still covers the canvas from both corners.
fn arc_self_intersect_2<D: GpuDevice>(
    ctx: &mut Canvas<D>,
) -> Result<Vec<PixelExpectation>, CanvasError> {
    background(ctx, "#f00")?;
    ctx.set_line_width(180.0);
    ctx.set_stroke_style("#0f0")?;
    ctx.begin_path();
    ctx.arc(-50.0, 50.0, 25.0, 0.0, -PI / 2.0, true)?;
    ctx.stroke()?;
    ctx.begin_path();
    ctx.arc(100.0, 0.0, 25.0, 0.0, -PI / 2.0, true)?;
    ctx.stroke()?;
    Ok(vec![
        PixelExpectation::green(50, 25, "center"),
        PixelExpectation::green(90, 10, "near the top right arc"),
        PixelExpectation::green(97, 1, "top right corner"),
        PixelExpectation::green(97, 2, "top right corner"),
        PixelExpectation::green(97, 3, "top right corner"),
        PixelExpectation::green(2, 48, "bottom left corner"),
    ])
}

/// A zero radius arc collapses to its start point and still gets a leading segment.
fn arc_zero_radius<D: GpuDevice>(
    ctx: &mut Canvas<D>,
) -> Result<Vec<PixelExpectation>, CanvasError> {
    background(ctx, "#f00")?;
    ctx.set_line_width(50.0);
    ctx.set_stroke_style("#0f0")?;
    ctx.begin_path();
    ctx.move_to(0.0, 25.0);
    ctx.arc(200.0, 25.0, 0.0, 0.0, PI, true)?;
    ctx.stroke()?;
    Ok(vec![PixelExpectation::green(50, 25, "segment to start point")])
}

/// Arcs with any non-finite argument are skipped without touching the path.
fn arc_non_finite<D: GpuDevice>(
    ctx: &mut Canvas<D>,
) -> Result<Vec<PixelExpectation>, CanvasError> {
    const INF: f32 = f32::INFINITY;
    const NAN: f32 = f32::NAN;
    const TWO_PI: f32 = 2.0 * PI;

    background(ctx, "#f00")?;
    ctx.move_to(0.0, 0.0);
    ctx.line_to(100.0, 0.0);
    let arguments: [[f32; 5]; 15] = [
        [INF, 0.0, 50.0, 0.0, TWO_PI],
        [-INF, 0.0, 50.0, 0.0, TWO_PI],
        [NAN, 0.0, 50.0, 0.0, TWO_PI],
        [0.0, INF, 50.0, 0.0, TWO_PI],
        [0.0, -INF, 50.0, 0.0, TWO_PI],
        [0.0, NAN, 50.0, 0.0, TWO_PI],
        [0.0, 0.0, INF, 0.0, TWO_PI],
        [0.0, 0.0, -INF, 0.0, TWO_PI],
        [0.0, 0.0, NAN, 0.0, TWO_PI],
        [0.0, 0.0, 50.0, INF, TWO_PI],
        [0.0, 0.0, 50.0, -INF, TWO_PI],
        [0.0, 0.0, 50.0, NAN, TWO_PI],
        [0.0, 0.0, 50.0, 0.0, INF],
        [0.0, 0.0, 50.0, 0.0, -INF],
        [INF, INF, INF, INF, INF],
    ];
    for [x, y, radius, start, end] in arguments {
        ctx.arc(x, y, radius, start, end, true)?;
    }
    ctx.line_to(100.0, 50.0);
    ctx.line_to(0.0, 50.0);
    ctx.set_fill_style("#0f0")?;
    ctx.fill()?;
    Ok(vec![
        PixelExpectation::green(50, 25, "arcs ignored"),
        PixelExpectation::green(90, 45, "arcs ignored"),
    ])
}

/// The MDN `arc()` example: four rows of three arcs, stroked then filled, clockwise then
/// anticlockwise, ending at π, 3π/2 and 2π.
fn mdn_arc_example<D: GpuDevice>(
    ctx: &mut Canvas<D>,
) -> Result<Vec<PixelExpectation>, CanvasError> {
    for i in 0..4 {
        for j in 0..3 {
            ctx.begin_path();
            let x = 25.0 + j as f32 * 50.0;
            let y = 25.0 + i as f32 * 50.0;
            let end_angle = PI + (PI * j as f32) / 2.0;
            ctx.arc(x, y, 20.0, 0.0, end_angle, i % 2 == 1)?;
            if i > 1 {
                ctx.fill()?;
            } else {
                ctx.stroke()?;
            }
        }
    }
    Ok(vec![
        // Row 2 fills clockwise, so the half circle ending at π hangs below its center.
        PixelExpectation::opaque(25, 135, 0, 0, 0, "clockwise half"),
        PixelExpectation::transparent(25, 115, "clockwise half"),
        // Row 3 fills anticlockwise, the same half circle sits above its center.
        PixelExpectation::opaque(25, 165, 0, 0, 0, "anticlockwise half"),
        PixelExpectation::transparent(25, 185, "anticlockwise half"),
        PixelExpectation::opaque(125, 125, 0, 0, 0, "full circle"),
        PixelExpectation::transparent(50, 50, "between arcs"),
    ])
}

// ── Line width ───────────────────────────────────────────────────────────────

fn line_width_basic<D: GpuDevice>(
    ctx: &mut Canvas<D>,
) -> Result<Vec<PixelExpectation>, CanvasError> {
    background(ctx, "#0f0")?;
    ctx.set_line_width(20.0);

    // A green line over a red box: the line is not too thin.
    ctx.set_fill_style("#f00")?;
    ctx.set_stroke_style("#0f0")?;
    ctx.fill_rect(15.0, 15.0, 20.0, 20.0)?;
    ctx.begin_path();
    ctx.move_to(25.0, 15.0);
    ctx.line_to(25.0, 35.0);
    ctx.stroke()?;

    // A green box over a red line: the line is not too thick.
    ctx.set_fill_style("#0f0")?;
    ctx.set_stroke_style("#f00")?;
    ctx.begin_path();
    ctx.move_to(75.0, 15.0);
    ctx.line_to(75.0, 35.0);
    ctx.stroke()?;
    ctx.fill_rect(65.0, 15.0, 20.0, 20.0)?;

    Ok([14, 15, 16, 25, 34, 35, 36, 64, 65, 66, 75, 84, 85, 86]
        .into_iter()
        .map(|x| PixelExpectation::green(x, 25, "line width"))
        .collect())
}
