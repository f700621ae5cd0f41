//! Workspace Module
//!
//! Virtual desktops as bitmasks. A client belongs to every desktop whose bit
//! is set in its mask; the current desktop is a mask too, usually one bit.
//! Frames are mapped or unmapped whenever either side changes.

use anyhow::Result;
use std::ops::BitXor;
use tracing::{debug, info, warn};

use crate::wm::backend::{Prop, Window, WindowSystem};
use crate::wm::WindowManager;

/// Desktop membership bitmask; bit `i` means desktop `i + 1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DesktopMask(pub u32);

impl DesktopMask {
    /// Visible on every desktop
    pub const STICKY: DesktopMask = DesktopMask(u32::MAX);

    pub fn single(index: u32) -> Self {
        DesktopMask(1u32.checked_shl(index).unwrap_or(0))
    }

    /// Every desktop among the first `count`.
    pub fn all(count: u32) -> Self {
        DesktopMask(Self::span(count).0)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn is_sticky(self) -> bool {
        self == Self::STICKY
    }

    pub fn is_visible_on(self, current: DesktopMask) -> bool {
        self.is_sticky() || self.0 & current.0 != 0
    }

    pub fn shares_desktop(self, other: DesktopMask) -> bool {
        self.0 & other.0 != 0
    }

    /// Zero-based indices of member desktops among the first `count`.
    pub fn indices(self, count: u32) -> impl Iterator<Item = u32> {
        (0..count.min(32)).filter(move |i| self.0 & (1 << i) != 0)
    }

    /// Rotates towards higher desktops within `count` bits.
    pub fn rotate_up(self, count: u32) -> Self {
        let (all, count) = Self::span(count);
        let bits = self.0 & all;
        DesktopMask(((bits << 1) | (bits >> (count - 1))) & all)
    }

    /// Rotates towards lower desktops within `count` bits.
    pub fn rotate_down(self, count: u32) -> Self {
        let (all, count) = Self::span(count);
        let bits = self.0 & all;
        DesktopMask(((bits >> 1) | (bits << (count - 1))) & all)
    }

    fn span(count: u32) -> (u32, u32) {
        let count = count.clamp(1, 32);
        let all = if count == 32 { u32::MAX } else { (1 << count) - 1 };
        (all, count)
    }
}

impl BitXor for DesktopMask {
    type Output = DesktopMask;

    fn bitxor(self, rhs: DesktopMask) -> DesktopMask {
        DesktopMask(self.0 ^ rhs.0)
    }
}

impl<W: WindowSystem> WindowManager<W> {
    pub fn current_desktop(&self) -> DesktopMask {
        self.current_desktop
    }

    /// Switches the current desktop mask and publishes it on the root.
    pub fn set_desktop(&mut self, mask: DesktopMask) -> Result<()> {
        info!("Switching to desktop mask {:#x}", mask.bits());
        self.current_desktop = mask;
        self.apply_visibility()?;
        let root = self.backend.root();
        self.backend.set_cardinals(root, Prop::CurrentDesktop, &[mask.bits()])?;
        Ok(())
    }

    /// Changes one client's membership and re-runs the visibility pass.
    pub fn set_client_desktop(&mut self, handle: Window, mask: DesktopMask) -> Result<()> {
        let Some(client) = self.registry.get_mut(handle) else {
            return Ok(());
        };
        debug!("Client {} now on desktop mask {:#x}", client.window, mask.bits());
        client.desktop = mask;
        let window = client.window;

        self.apply_visibility()?;
        self.backend.set_cardinals(window, Prop::Desktop, &[mask.bits()])?;
        self.redraw(window)
    }

    pub fn flip_desktop(&mut self, mask: DesktopMask) -> Result<()> {
        self.set_desktop(self.current_desktop ^ mask)
    }

    pub fn flip_client_desktop(&mut self, handle: Window, mask: DesktopMask) -> Result<()> {
        let Some(client) = self.registry.get(handle) else {
            return Ok(());
        };
        let flipped = client.desktop ^ mask;
        self.set_client_desktop(handle, flipped)
    }

    /// Sticky clients go back to the current desktop; others become sticky.
    pub fn toggle_sticky(&mut self, handle: Window) -> Result<()> {
        let Some(client) = self.registry.get(handle) else {
            return Ok(());
        };
        let mask = if client.desktop.is_sticky() {
            self.current_desktop
        } else {
            DesktopMask::STICKY
        };
        self.set_client_desktop(handle, mask)
    }

    pub fn next_desktop(&mut self) -> Result<()> {
        let count = self.config.behavior.desktop_count;
        self.set_desktop(self.current_desktop().rotate_up(count))
    }

    pub fn prev_desktop(&mut self) -> Result<()> {
        let count = self.config.behavior.desktop_count;
        self.set_desktop(self.current_desktop().rotate_down(count))
    }

    /// `number` counts from 1.
    pub fn desktop_by_number(&self, number: u32) -> Option<DesktopMask> {
        if number == 0 || number > self.config.behavior.desktop_count {
            warn!("No desktop number {}", number);
            return None;
        }
        Some(DesktopMask::single(number - 1))
    }

    /// Maps the frames that belong on screen and unmaps the rest.
    pub(crate) fn apply_visibility(&mut self) -> Result<()> {
        let current = self.current_desktop;
        let frames: Vec<(Window, bool)> = self
            .registry
            .iter()
            .map(|c| (c.frame, c.is_mapped() && c.desktop.is_visible_on(current)))
            .collect();

        for (frame, visible) in frames {
            if visible {
                self.backend.map_window(frame)?;
            } else {
                self.backend.unmap_window(frame)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Geometry;
    use crate::wm::testing::{manager, map_client, FakeDisplay};

    #[test]
    fn test_sticky_visible_everywhere() {
        for current in [0, 1, 2, 0x100, 0x1ff, u32::MAX] {
            assert!(DesktopMask::STICKY.is_visible_on(DesktopMask(current)));
        }
        assert!(!DesktopMask(0b10).is_visible_on(DesktopMask(0b01)));
        assert!(DesktopMask(0b11).is_visible_on(DesktopMask(0b10)));
    }

    #[test]
    fn test_rotation_wraps_within_count() {
        assert_eq!(DesktopMask::single(8).rotate_up(9), DesktopMask::single(0));
        assert_eq!(DesktopMask::single(0).rotate_down(9), DesktopMask::single(8));
        assert_eq!(DesktopMask::single(3).rotate_up(9), DesktopMask::single(4));
        assert_eq!(DesktopMask::single(0).rotate_down(4), DesktopMask::single(3));
    }

    #[test]
    fn test_indices() {
        let found: Vec<u32> = DesktopMask(0b1010_0001).indices(9).collect();
        assert_eq!(found, vec![0, 5, 7]);
    }

    #[test]
    fn test_set_desktop_hides_and_shows_frames() {
        let mut wm = manager();
        let a = map_client(&mut wm, 10, Geometry::new(100, 100, 200, 200));
        let b = map_client(&mut wm, 20, Geometry::new(400, 100, 200, 200));
        wm.set_client_desktop(b, DesktopMask::single(1)).unwrap();
        let (fa, fb) = (wm.backend.frame_of(a), wm.backend.frame_of(b));
        assert!(wm.backend.is_mapped(fa));
        assert!(!wm.backend.is_mapped(fb));

        wm.set_desktop(DesktopMask::single(1)).unwrap();
        assert!(!wm.backend.is_mapped(fa));
        assert!(wm.backend.is_mapped(fb));
        assert_eq!(
            wm.backend.property(wm.backend.root(), Prop::CurrentDesktop),
            Some(vec![0b10])
        );
        assert_eq!(wm.backend.property(b, Prop::Desktop), Some(vec![0b10]));
    }

    #[test]
    fn test_set_desktop_is_idempotent() {
        let mut wm = manager();
        let a = map_client(&mut wm, 10, Geometry::new(0, 0, 100, 100));
        let b = map_client(&mut wm, 20, Geometry::new(0, 0, 100, 100));
        let c = map_client(&mut wm, 30, Geometry::new(0, 0, 100, 100));
        wm.set_client_desktop(b, DesktopMask(0b110)).unwrap();
        wm.set_client_desktop(c, DesktopMask::STICKY).unwrap();

        let visible = |wm: &WindowManager<FakeDisplay>| {
            [a, b, c].map(|w| wm.backend.is_mapped(wm.backend.frame_of(w)))
        };
        wm.set_desktop(DesktopMask(0b100)).unwrap();
        let once = visible(&wm);
        wm.set_desktop(DesktopMask(0b100)).unwrap();
        assert_eq!(visible(&wm), once);
        assert_eq!(once, [false, true, true]);
    }

    #[test]
    fn test_sticky_client_survives_every_switch() {
        let mut wm = manager();
        let a = map_client(&mut wm, 10, Geometry::new(0, 0, 100, 100));
        wm.toggle_sticky(a).unwrap();
        assert!(wm.registry.get(a).unwrap().desktop.is_sticky());
        for mask in [0, 1, 0b10, 0x100, 0b1_0101] {
            wm.set_desktop(DesktopMask(mask)).unwrap();
            assert!(wm.backend.is_mapped(wm.backend.frame_of(a)));
        }
        wm.toggle_sticky(a).unwrap();
        assert_eq!(wm.registry.get(a).unwrap().desktop, DesktopMask(0b1_0101));
    }

    #[test]
    fn test_unmapped_client_stays_hidden() {
        let mut wm = manager();
        let a = map_client(&mut wm, 10, Geometry::new(0, 0, 100, 100));
        wm.unmap_notify(a).unwrap();
        wm.set_desktop(DesktopMask::single(0)).unwrap();
        assert!(!wm.backend.is_mapped(wm.backend.frame_of(a)));
    }

    #[test]
    fn test_flip_wrappers_xor() {
        let mut wm = manager();
        let a = map_client(&mut wm, 10, Geometry::new(0, 0, 100, 100));
        wm.flip_desktop(DesktopMask::single(2)).unwrap();
        assert_eq!(wm.current_desktop(), DesktopMask(0b101));
        wm.flip_client_desktop(a, DesktopMask::single(3)).unwrap();
        assert_eq!(wm.registry.get(a).unwrap().desktop, DesktopMask(0b1001));
        wm.flip_client_desktop(a, DesktopMask::single(0)).unwrap();
        assert_eq!(wm.registry.get(a).unwrap().desktop, DesktopMask(0b1000));
    }
}
