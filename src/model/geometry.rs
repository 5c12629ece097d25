//! Geometry primitives shared by page queries and coordinate mapping.

use serde::{Deserialize, Serialize};

/// A point in device coordinates (pixels).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position
    pub x: i32,

    /// Vertical position
    pub y: i32,
}

impl Point {
    /// Create a new point.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Integer page or viewport dimensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    /// Width in pixels
    pub width: i32,

    /// Height in pixels
    pub height: i32,
}

impl Size {
    /// Create a new size.
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle with floating-point edges.
///
/// Used for glyph bounding boxes, link bounds and mapped page regions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub left: f32,

    /// Top edge
    pub top: f32,

    /// Right edge
    pub right: f32,

    /// Bottom edge
    pub bottom: f32,
}

impl Rect {
    /// Create a new rectangle.
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Rectangle width (may be negative if not normalized).
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Rectangle height (may be negative if not normalized).
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Return an equivalent rectangle with `left <= right` and
    /// `top <= bottom`.
    ///
    /// Mapping a rectangle through a rotated viewport can swap edge
    /// correspondence; callers that need a well-formed rectangle normalize
    /// after mapping both corners independently.
    pub fn normalized(&self) -> Self {
        Self {
            left: self.left.min(self.right),
            top: self.top.min(self.bottom),
            right: self.left.max(self.right),
            bottom: self.top.max(self.bottom),
        }
    }
}

/// A rectangular display area in device coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Top-left corner of the display area
    pub origin: Point,

    /// Size of the display area
    pub size: Size,
}

impl Viewport {
    /// Create a new viewport.
    pub fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    /// Viewport anchored at the device origin.
    pub fn at_origin(width: i32, height: i32) -> Self {
        Self {
            origin: Point::default(),
            size: Size::new(width, height),
        }
    }
}

/// Page orientation for coordinate mapping, in clockwise quarter turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    /// No rotation
    #[default]
    None,
    /// Rotated 90 degrees clockwise
    Clockwise90,
    /// Rotated 180 degrees
    Clockwise180,
    /// Rotated 270 degrees clockwise
    Clockwise270,
}

impl Rotation {
    /// Quarter-turn count as understood by the native engine (0..=3).
    pub fn quarter_turns(self) -> i32 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise90 => 1,
            Rotation::Clockwise180 => 2,
            Rotation::Clockwise270 => 3,
        }
    }
}
