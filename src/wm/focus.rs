//! Focus Module
//!
//! Tracks the single focused client. Nothing else writes the focus pointer.

use anyhow::Result;
use tracing::debug;

use crate::wm::backend::{Prop, Window, WindowSystem};
use crate::wm::WindowManager;

impl<W: WindowSystem> WindowManager<W> {
    pub fn focused(&self) -> Option<Window> {
        self.focused
    }

    pub fn is_focused(&self, handle: Window) -> bool {
        self.focused.is_some() && self.focused == self.registry.key_of(handle)
    }

    /// Gives input focus to `target` if it is a viewable client, otherwise
    /// to `fallback` when one is given.
    pub fn focus(&mut self, target: Option<Window>, fallback: Option<Window>) -> Result<()> {
        let root = self.backend.root();

        if let Some(key) = target.and_then(|handle| self.registry.key_of(handle)) {
            if !self.backend.is_viewable(key)? {
                debug!("Not focusing {}: not viewable", key);
                return Ok(());
            }
            if self.focused != Some(key) {
                self.unfocus_current()?;
            }
            let Some(frame) = self.registry.get(key).map(|c| c.frame) else {
                return Ok(());
            };

            self.backend.set_input_focus(key)?;
            self.backend.raise_window(frame)?;
            self.backend.release_focus_click(frame)?;
            self.focused = Some(key);
            self.draw_frame(key, true)?;
            self.backend.set_cardinals(root, Prop::ActiveWindow, &[key])?;
            debug!("Focused {}", key);
        } else if let Some(window) = fallback {
            self.unfocus_current()?;
            self.backend.set_input_focus(window)?;
            self.backend.set_cardinals(root, Prop::ActiveWindow, &[0])?;
            debug!("Focus fell back to {}", window);
        }
        Ok(())
    }

    /// Drops the focus pointer if it refers to `key`, e.g. when that client
    /// unmaps or goes away.
    pub(crate) fn forget_focus(&mut self, key: Window) {
        if self.focused == Some(key) {
            self.focused = None;
        }
    }

    /// Redraws a client in the style matching its focus state.
    pub(crate) fn redraw(&mut self, handle: Window) -> Result<()> {
        let active = self.is_focused(handle);
        self.draw_frame(handle, active)
    }

    fn unfocus_current(&mut self) -> Result<()> {
        let Some(previous) = self.focused.take() else {
            return Ok(());
        };
        let Some(frame) = self.registry.get(previous).map(|c| c.frame) else {
            return Ok(());
        };
        self.draw_frame(previous, false)?;
        self.backend.grab_focus_click(frame)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::shared::Geometry;
    use crate::wm::backend::{Prop, WindowSystem};
    use crate::wm::testing::{manager, map_client, Request};

    #[test]
    fn test_focus_moves_between_clients() {
        let mut wm = manager();
        let a = map_client(&mut wm, 10, Geometry::new(0, 0, 100, 100));
        let b = map_client(&mut wm, 20, Geometry::new(200, 0, 100, 100));
        let (fa, fb) = (wm.backend.frame_of(a), wm.backend.frame_of(b));

        wm.focus(Some(fa), None).unwrap();
        assert_eq!(wm.focused(), Some(a));
        assert!(wm.is_focused(fa));

        wm.backend.requests.clear();
        wm.focus(Some(b), None).unwrap();
        assert_eq!(wm.focused(), Some(b));
        assert!(!wm.is_focused(a));
        assert!(wm.backend.requests.contains(&Request::GrabClick(fa)));
        assert!(wm.backend.requests.contains(&Request::ReleaseClick(fb)));
        assert!(wm.backend.requests.contains(&Request::InputFocus(b)));
        assert_eq!(
            wm.backend.property(wm.backend.root(), Prop::ActiveWindow),
            Some(vec![b])
        );
    }

    #[test]
    fn test_focusing_hidden_client_keeps_previous() {
        let mut wm = manager();
        let a = map_client(&mut wm, 10, Geometry::new(0, 0, 100, 100));
        let hidden = wm.find_or_create(20, true).unwrap().unwrap();
        wm.focus(Some(a), None).unwrap();

        wm.backend.requests.clear();
        wm.focus(Some(hidden), None).unwrap();
        assert_eq!(wm.focused(), Some(a));
        assert!(wm.backend.requests.is_empty());
    }

    #[test]
    fn test_at_most_one_focused() {
        let mut wm = manager();
        let clients: Vec<_> = (1..=4)
            .map(|i| map_client(&mut wm, i * 10, Geometry::new(0, 0, 100, 100)))
            .collect();
        for &target in clients.iter().chain(clients.iter().rev()) {
            wm.focus(Some(target), None).unwrap();
            let focused = clients.iter().filter(|&&c| wm.is_focused(c)).count();
            assert_eq!(focused, 1);
        }
    }

    #[test]
    fn test_fallback_clears_focus() {
        let mut wm = manager();
        let a = map_client(&mut wm, 10, Geometry::new(0, 0, 100, 100));
        wm.focus(Some(a), None).unwrap();
        let root = wm.backend.root();
        wm.focus(Some(root), Some(root)).unwrap();
        assert_eq!(wm.focused(), None);
        assert_eq!(wm.backend.requests.last(), Some(&Request::SetProp(root, Prop::ActiveWindow, vec![0])));

        // nothing to focus at all
        wm.backend.requests.clear();
        wm.focus(None, None).unwrap();
        assert!(wm.backend.requests.is_empty());
    }
}
