pub mod expectations;
pub mod scene;

pub use expectations::{check_pixels, PixelExpectation};
pub use scene::{Scene, CANVAS_HEIGHT, CANVAS_WIDTH};
