//! Viewport and 2D stage camera
//!
//! Screen space is pixels with y growing downward; the stage plane is world
//! units with y growing upward. The orthographic camera maps between the two
//! with a uniform zoom around the viewport center.

use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// Viewport dimensions and display density
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Size in physical pixels
    pub size: Size,
    /// Device pixel ratio of the display
    pub pixel_ratio: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            size: Size::new(1280.0, 720.0),
            pixel_ratio: 1.0,
        }
    }
}

impl Viewport {
    /// Create a viewport
    pub fn new(size: Size, pixel_ratio: f64) -> Self {
        Self { size, pixel_ratio }
    }
}

/// Orthographic camera over the 2D stage plane
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrthographicCamera {
    /// World point shown at the viewport center
    pub center: Point,
    /// Pixels per world unit
    pub zoom: f64,
}

impl Default for OrthographicCamera {
    fn default() -> Self {
        Self {
            center: Point::ORIGIN,
            zoom: 1.0,
        }
    }
}

impl OrthographicCamera {
    /// Inverse-project a screen position onto the stage plane
    pub fn screen_to_world(&self, screen: Point, viewport: &Viewport) -> Point {
        Point::new(
            self.center.x + (screen.x - viewport.size.width / 2.0) / self.zoom,
            self.center.y - (screen.y - viewport.size.height / 2.0) / self.zoom,
        )
    }

    /// Project a stage-plane position to screen pixels
    pub fn world_to_screen(&self, world: Point, viewport: &Viewport) -> Point {
        Point::new(
            (world.x - self.center.x) * self.zoom + viewport.size.width / 2.0,
            (self.center.y - world.y) * self.zoom + viewport.size.height / 2.0,
        )
    }
}
