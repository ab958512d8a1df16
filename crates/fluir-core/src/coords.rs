//! Coordinate transform between model units and canvas pixels.
//!
//! The Program Model is integer-addressed in model units. The canvas works in
//! pixels: `pixels = units * zoom * scalar`, where `zoom` is the user's
//! bounded zoom factor and `scalar` is the fixed [`ZOOM_SCALAR`]. Going back
//! to the model always rounds to whole units.

use serde::{Deserialize, Serialize};

use crate::error::CoordError;
use crate::model::Location;

/// Pixels per model unit at zoom 1.0.
pub const ZOOM_SCALAR: f64 = 10.0;

/// Height of a function's header strip, in model units.
pub const HEADER_HEIGHT: i32 = 4;

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;
pub const DEFAULT_ZOOM: f64 = 1.0;

/// A point in canvas pixel space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A size in canvas pixel space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Axis-aligned rectangle in canvas pixel space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    pub position: Point,
    pub size: Size,
}

impl PixelRect {
    /// Clamps `point` so a box of `size` placed there stays inside `self`.
    pub fn clamp_box(&self, point: Point, size: Size) -> Point {
        let max_x = self.position.x + (self.size.width - size.width).max(0.0);
        let max_y = self.position.y + (self.size.height - size.height).max(0.0);
        Point {
            x: point.x.clamp(self.position.x, max_x),
            y: point.y.clamp(self.position.y, max_y),
        }
    }
}

/// A displacement in canvas pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelDelta {
    pub dx: f64,
    pub dy: f64,
}

/// A displacement in whole model units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelDelta {
    pub dx: i32,
    pub dy: i32,
}

impl ModelDelta {
    pub fn is_zero(&self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}

/// The bounded zoom factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Zoom(f64);

impl Zoom {
    /// Creates a zoom factor, clamped into `[MIN_ZOOM, MAX_ZOOM]`.
    pub fn new(value: f64) -> Result<Self, CoordError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(CoordError::InvalidZoom { value });
        }
        Ok(Zoom(value.clamp(MIN_ZOOM, MAX_ZOOM)))
    }

    pub fn factor(self) -> f64 {
        self.0
    }

    /// Multiplies by `step`, stopping at `MAX_ZOOM`.
    pub fn zoom_in(self, step: f64) -> Result<Self, CoordError> {
        let step = check_step(step)?;
        Ok(Zoom((self.0 * step).min(MAX_ZOOM)))
    }

    /// Divides by `step`, stopping at `MIN_ZOOM`.
    pub fn zoom_out(self, step: f64) -> Result<Self, CoordError> {
        let step = check_step(step)?;
        Ok(Zoom((self.0 / step).max(MIN_ZOOM)))
    }

    /// Pixels per model unit at this zoom with the standard scalar.
    pub fn pixels_per_unit(self) -> f64 {
        self.0 * ZOOM_SCALAR
    }
}

impl Default for Zoom {
    fn default() -> Self {
        Zoom(DEFAULT_ZOOM)
    }
}

impl TryFrom<f64> for Zoom {
    type Error = CoordError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Zoom::new(value)
    }
}

impl From<Zoom> for f64 {
    fn from(zoom: Zoom) -> f64 {
        zoom.0
    }
}

fn check_step(step: f64) -> Result<f64, CoordError> {
    if !step.is_finite() || step <= 1.0 {
        return Err(CoordError::InvalidStep { value: step });
    }
    Ok(step)
}

/// Location in model units to a pixel rectangle.
pub fn to_canvas(location: &Location, zoom: Zoom, scalar: f64) -> PixelRect {
    let k = zoom.factor() * scalar;
    PixelRect {
        position: Point {
            x: f64::from(location.x) * k,
            y: f64::from(location.y) * k,
        },
        size: Size {
            width: f64::from(location.width) * k,
            height: f64::from(location.height) * k,
        },
    }
}

pub fn to_canvas_delta(delta: ModelDelta, zoom: Zoom, scalar: f64) -> PixelDelta {
    let k = zoom.factor() * scalar;
    PixelDelta {
        dx: f64::from(delta.dx) * k,
        dy: f64::from(delta.dy) * k,
    }
}

/// Pixel displacement back to model units, rounded to the nearest unit.
pub fn to_model_delta(delta: PixelDelta, zoom: Zoom, scalar: f64) -> ModelDelta {
    let k = zoom.factor() * scalar;
    ModelDelta {
        dx: round_units(delta.dx / k),
        dy: round_units(delta.dy / k),
    }
}

/// Pixel size back to whole model units.
pub fn to_model_size(size: Size, zoom: Zoom, scalar: f64) -> (i32, i32) {
    let k = zoom.factor() * scalar;
    (round_units(size.width / k), round_units(size.height / k))
}

/// Pixel point back to whole model units.
pub fn to_model_point(point: Point, zoom: Zoom, scalar: f64) -> (i32, i32) {
    let k = zoom.factor() * scalar;
    (round_units(point.x / k), round_units(point.y / k))
}

fn round_units(value: f64) -> i32 {
    // `as` saturates for out-of-range floats and maps NaN to 0.
    value.round() as i32
}

// ---------------------------------------------------------------------------
// Size limits
// ---------------------------------------------------------------------------

/// Lower and optional upper bound on one dimension, in model units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limit {
    pub min: f64,
    pub max: Option<f64>,
}

impl Limit {
    /// Clamps into the limit, then truncates toward zero.
    pub fn clamp(&self, value: f64) -> i32 {
        let upper = self.max.unwrap_or(f64::INFINITY);
        value.max(self.min).min(upper).trunc() as i32
    }
}

/// Width and height limits of a node kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeLimit {
    pub width: Limit,
    pub height: Limit,
}

impl SizeLimit {
    /// Default size of a freshly added node of this kind.
    pub fn default_size(&self) -> (i32, i32) {
        (self.width.clamp(0.0), self.height.clamp(0.0))
    }
}

pub const CONSTANT_LIMIT: SizeLimit = SizeLimit {
    width: Limit {
        min: 12.0,
        max: None,
    },
    height: Limit {
        min: 5.0,
        max: Some(5.0),
    },
};

pub const OPERATOR_LIMIT: SizeLimit = SizeLimit {
    width: Limit {
        min: 6.0,
        max: Some(6.0),
    },
    height: Limit {
        min: 5.0,
        max: Some(5.0),
    },
};
