//! Pixel Geometry
//!
//! Integer rectangles and points in layout (pixel) coordinates.

use serde::{Deserialize, Serialize};

/// A point in layout coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle. `x2`/`y2` are exclusive edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    /// Create a rectangle from position and size
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Create a rectangle from its edges
    pub fn from_edges(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self::new(x1, y1, x2 - x1, y2 - y1)
    }

    /// A rectangle is valid when it has a positive area
    pub fn is_valid(&self) -> bool {
        self.w > 0 && self.h > 0
    }

    /// Right edge (exclusive)
    pub fn x2(&self) -> i32 {
        self.x + self.w
    }

    /// Bottom edge (exclusive)
    pub fn y2(&self) -> i32 {
        self.y + self.h
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2, self.y + self.h / 2)
    }

    /// Check if a point lies inside the rectangle
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.x2() && point.y >= self.y && point.y < self.y2()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges() {
        let rect = Rect::new(55, 5, 50, 40);
        assert_eq!(rect.x2(), 105);
        assert_eq!(rect.y2(), 45);
        assert_eq!(rect.center(), Point::new(80, 25));
        assert!(rect.is_valid());
        assert!(!Rect::new(0, 0, 0, 10).is_valid());
    }

    #[test]
    fn test_contains_is_half_open() {
        let rect = Rect::new(0, 0, 10, 10);
        assert!(rect.contains(Point::new(0, 0)));
        assert!(rect.contains(Point::new(9, 9)));
        assert!(!rect.contains(Point::new(10, 5)));
    }
}
