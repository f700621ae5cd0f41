//! Placement Module
//!
//! Initial placement of new clients and the greedy "fill the free space"
//! layout.

use anyhow::Result;
use tracing::{debug, trace};

use crate::shared::Geometry;
use crate::wm::backend::{Window, WindowSystem};
use crate::wm::WindowManager;

/// Closed-interval overlap of `[s1, e1]` and `[s2, e2]`.
pub fn spans_overlap(s1: i32, e1: i32, s2: i32, e2: i32) -> bool {
    (s2 <= s1 && s1 <= e2)
        || (s2 <= e1 && e1 <= e2)
        || (s1 <= s2 && s2 <= e1)
        || (s1 <= e2 && e2 <= e1)
}

/// Bounds left for `target` once `siblings` are pushed against.
pub fn fill_bounds(target: Geometry, area: Geometry, siblings: &[Geometry]) -> (i32, i32, i32, i32) {
    let (mut min_x, mut max_x) = (area.x, area.right());
    let (mut min_y, mut max_y) = (area.y, area.bottom());

    for s in siblings {
        if spans_overlap(target.x, target.right(), s.x, s.right()) {
            if s.y >= target.bottom() {
                max_y = max_y.min(s.y);
            } else if s.bottom() <= target.y {
                min_y = min_y.max(s.bottom());
            }
        }
        if spans_overlap(target.y, target.bottom(), s.y, s.bottom()) {
            if s.x >= target.right() {
                max_x = max_x.min(s.x);
            } else if s.right() <= target.x {
                min_x = min_x.max(s.right());
            }
        }
    }
    (min_x, max_x, min_y, max_y)
}

impl<W: WindowSystem> WindowManager<W> {
    /// A third of the pointer's monitor, centered on the pointer and kept on
    /// that monitor.
    pub fn initial_placement(&self) -> Result<Geometry> {
        let (px, py) = self.backend.query_pointer()?;
        let m = self.screens.find_screen(px, py).geometry();
        let (width, height) = (m.width / 3, m.height / 3);

        let x = (px - width as i32 / 2).clamp(m.x, m.right() - width as i32);
        let y = (py - height as i32 / 2).clamp(m.y, m.bottom() - height as i32);
        Ok(Geometry::new(x, y, width, height))
    }

    /// Grows a client into the free space around it on its monitor.
    pub fn fill(&mut self, handle: Window) -> Result<()> {
        let Some(client) = self.registry.get(handle) else {
            return Ok(());
        };
        let (window, target, desktop) = (client.window, client.geometry(), client.desktop);
        trace!(
            "Fill {} from ({}, {})-({}, {})",
            window,
            client.x(),
            client.y(),
            client.right(),
            client.bottom()
        );
        let (cx, cy) = target.center();
        let area = self.screens.find_screen(cx, cy).geometry();

        let siblings: Vec<Geometry> = self
            .registry
            .iter()
            .filter(|c| c.window != window && c.is_mapped() && c.desktop.shares_desktop(desktop))
            .map(|c| c.geometry())
            .collect();

        let (min_x, max_x, min_y, max_y) = fill_bounds(target, area, &siblings);
        let m = self.config.behavior.fill_margin as i32;
        let rect = Geometry::new(
            min_x + m,
            min_y + m,
            (max_x - min_x - 2 * m).max(0) as u32,
            (max_y - min_y - 2 * m).max(0) as u32,
        );
        debug!("Filling {} into {:?}", window, rect);
        self.move_resize(window, rect)?;
        Ok(())
    }
}
