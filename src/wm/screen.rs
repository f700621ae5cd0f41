//! Screen Module
//!
//! Maps points to the physical monitor containing them. The monitor list is
//! queried once at startup and never changes afterwards.

use anyhow::Result;
use tracing::{debug, info};

use crate::shared::Geometry;
use crate::wm::backend::WindowSystem;
use crate::wm::WindowManager;

/// Monitor/Output device information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Monitor {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub name: String,
    pub primary: bool,
}

impl Monitor {
    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.x, self.y, self.width, self.height)
    }
}

/// Ordered monitor list; never empty.
#[derive(Debug, Clone)]
pub struct ScreenLocator {
    monitors: Vec<Monitor>,
}

impl ScreenLocator {
    /// Falls back to one monitor covering the display when none were found.
    pub fn new(monitors: Vec<Monitor>, display_size: (u32, u32)) -> Self {
        if monitors.is_empty() {
            info!(
                "No monitors reported, using the whole {}x{} display",
                display_size.0, display_size.1
            );
            return Self {
                monitors: vec![Monitor {
                    x: 0,
                    y: 0,
                    width: display_size.0,
                    height: display_size.1,
                    name: "default".to_string(),
                    primary: true,
                }],
            };
        }

        for monitor in &monitors {
            debug!(
                "Monitor {}: {}x{}+{}+{}{}",
                monitor.name,
                monitor.width,
                monitor.height,
                monitor.x,
                monitor.y,
                if monitor.primary { " (primary)" } else { "" }
            );
        }
        Self { monitors }
    }

    pub fn monitors(&self) -> &[Monitor] {
        &self.monitors
    }

    /// First monitor containing the point, else the first monitor.
    pub fn find_screen(&self, x: i32, y: i32) -> &Monitor {
        self.monitors
            .iter()
            .find(|m| m.geometry().contains_point(x, y))
            .unwrap_or(&self.monitors[0])
    }
}

impl<W: WindowSystem> WindowManager<W> {
    /// Monitor under the pointer.
    pub fn current_screen(&self) -> Result<Monitor> {
        let (x, y) = self.backend.query_pointer()?;
        Ok(self.screens.find_screen(x, y).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(name: &str, x: i32, y: i32, width: u32, height: u32) -> Monitor {
        Monitor { x, y, width, height, name: name.to_string(), primary: false }
    }

    fn dual_head() -> ScreenLocator {
        ScreenLocator::new(
            vec![monitor("left", 0, 0, 1920, 1080), monitor("right", 1920, 0, 1280, 1024)],
            (3200, 1080),
        )
    }

    #[test]
    fn test_find_screen_picks_containing_monitor() {
        let screens = dual_head();
        assert_eq!(screens.find_screen(100, 100).name, "left");
        assert_eq!(screens.find_screen(2000, 500).name, "right");
    }

    #[test]
    fn test_find_screen_last_pixel_belongs_to_monitor() {
        let screens = dual_head();
        assert_eq!(screens.find_screen(1919, 1079).name, "left");
        assert_eq!(screens.find_screen(1920, 0).name, "right");
    }

    #[test]
    fn test_find_screen_falls_back_to_first() {
        let screens = dual_head();
        assert_eq!(screens.find_screen(5000, 5000).name, "left");
        assert_eq!(screens.find_screen(2000, 1050).name, "left");
    }

    #[test]
    fn test_empty_list_gets_synthetic_monitor() {
        let screens = ScreenLocator::new(Vec::new(), (1024, 768));
        assert_eq!(screens.monitors().len(), 1);
        assert_eq!(screens.find_screen(10, 10).geometry(), Geometry::new(0, 0, 1024, 768));
    }
}
