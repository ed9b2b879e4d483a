/// Visual regression tests for the canvas.
///
/// Every conformance scene is drawn on a fresh canvas and checked at specific pixels. Scenes
/// always run on the software rasterizer; they also run on wgpu when an adapter exists.
/// Failing frames are written to `target/visual-failures/` for inspection.
///
/// Run with:   cargo test --test visual_regression
use std::path::PathBuf;

use canvas2d::{Canvas, CanvasConfig, GpuDevice, SoftwareDevice, WgpuDevice};
use canvas2d_test_scenes::{check_pixels, Scene};
use futures::executor::block_on;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn dump_png(device_name: &str, scene: Scene, width: u32, height: u32, pixels: &[u8]) {
    let directory = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("target/visual-failures");
    if std::fs::create_dir_all(&directory).is_err() {
        return;
    }
    let path = directory.join(format!("{}-{device_name}.png", scene.name()));
    if let Some(image) = image::RgbaImage::from_raw(width, height, pixels.to_vec()) {
        if let Err(error) = image.save(&path) {
            eprintln!("could not write {}: {error}", path.display());
        }
    }
}

/// Draws `scene` and returns the failed expectations.
fn run_scene<D: GpuDevice>(device_name: &str, device: D, scene: Scene) -> Vec<String> {
    let (width, height) = scene.size();
    let mut canvas = Canvas::new(device, CanvasConfig::new(width, height))
        .unwrap_or_else(|error| panic!("[{}] canvas: {error}", scene.name()));
    let expectations = scene
        .draw(&mut canvas)
        .unwrap_or_else(|error| panic!("[{}] draw: {error}", scene.name()));
    let pixels = canvas
        .read_pixels()
        .unwrap_or_else(|error| panic!("[{}] readback: {error}", scene.name()));

    let failures = check_pixels(&pixels, width, height, &expectations);
    if !failures.is_empty() {
        dump_png(device_name, scene, width, height, &pixels);
    }
    failures
        .into_iter()
        .map(|failure| format!("{} ({device_name}): {failure}", scene.name()))
        .collect()
}

fn assert_no_failures(failures: Vec<String>) {
    if !failures.is_empty() {
        let message = format!(
            "{} pixel expectation(s) failed:\n{}",
            failures.len(),
            failures.join("\n"),
        );
        panic!("{message}");
    }
}

#[test]
fn scenes_on_software_device() {
    init_logging();
    let mut failures = Vec::new();
    for &scene in Scene::ALL {
        let (width, height) = scene.size();
        let device = SoftwareDevice::new(width, height).expect("non-zero scene size");
        failures.extend(run_scene("software", device, scene));
    }
    assert_no_failures(failures);
}

#[test]
fn scenes_on_wgpu_device() {
    init_logging();
    let mut failures = Vec::new();
    for &scene in Scene::ALL {
        let (width, height) = scene.size();
        let Some(device) = block_on(WgpuDevice::try_new_headless(width, height)) else {
            eprintln!("skipping wgpu scenes: no adapter available");
            return;
        };
        failures.extend(run_scene("wgpu", device, scene));
    }
    assert_no_failures(failures);
}

/// Regression test: a canvas with nothing drawn reads back fully transparent.
#[test]
fn empty_canvas_is_transparent() {
    init_logging();
    let device = SoftwareDevice::new(100, 50).unwrap();
    let mut canvas = Canvas::new(device, CanvasConfig::new(100, 50)).unwrap();
    let pixels = canvas.read_pixels().unwrap();
    assert_eq!(pixels.len(), 100 * 50 * 4);
    assert!(pixels.iter().all(|&channel| channel == 0));
}

/// Regression test: the scale factor maps logical coordinates onto more device pixels.
#[test]
fn scaled_canvas_draws_in_logical_pixels() {
    init_logging();
    let device = SoftwareDevice::new(200, 100).unwrap();
    let config = CanvasConfig::new(100, 50).with_scale(2.0);
    let mut canvas = Canvas::new(device, config).unwrap();
    canvas.set_fill_style("#0f0").unwrap();
    canvas.fill_rect(50.0, 0.0, 50.0, 50.0).unwrap();

    let pixels = canvas.read_pixels().unwrap();
    let failures = check_pixels(
        &pixels,
        200,
        100,
        &[
            canvas2d_test_scenes::PixelExpectation::green(150, 50, "right half"),
            canvas2d_test_scenes::PixelExpectation::green(100, 99, "right half edge"),
            canvas2d_test_scenes::PixelExpectation::transparent(99, 50, "left half"),
        ],
    );
    assert_no_failures(failures);
}
