//! Shared window state
//!
//! Plain rectangle arithmetic used by every layout component.

/// Window geometry (absolute root coordinates unless stated otherwise)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// One past the last column.
    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    /// One past the last row.
    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    /// Inclusive containment: the last pixel column and row count as inside.
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x
            && x <= self.x + self.width as i32 - 1
            && y >= self.y
            && y <= self.y + self.height as i32 - 1
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width as i32 / 2, self.y + self.height as i32 / 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges() {
        let g = Geometry::new(10, 20, 100, 50);
        assert_eq!(g.right(), 110);
        assert_eq!(g.bottom(), 70);
        assert_eq!(g.center(), (60, 45));
    }

    #[test]
    fn test_contains_point_is_inclusive_of_last_pixel() {
        let g = Geometry::new(0, 0, 100, 100);
        assert!(g.contains_point(0, 0));
        assert!(g.contains_point(99, 99));
        assert!(!g.contains_point(100, 50));
        assert!(!g.contains_point(-1, 50));
    }
}
