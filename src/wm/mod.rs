//! Window Manager Module
//!
//! [`WindowManager`] is the context every operation runs against. Each
//! component module (registry, decorations, focus, workspaces, ...) adds an
//! `impl` block for the operations it owns; all server traffic goes through
//! the [`WindowSystem`] it is generic over.

pub mod backend;
pub mod client;
pub mod client_flags;
pub mod decorations;
pub mod events;
pub mod ewmh;
pub mod focus;
pub mod hints;
pub mod keyboard;
pub mod launcher;
pub mod moveresize;
pub mod placement;
pub mod registry;
pub mod screen;
pub mod workspace;
pub mod x11;

#[cfg(test)]
pub mod testing;

use anyhow::Result;
use tracing::{debug, info};

use crate::config::Config;
use crate::wm::backend::{ExistingWindow, Prop, Window, WindowSystem, WM_STATE_NORMAL};
use crate::wm::client_flags::ClientFlags;
use crate::wm::keyboard::{build_bindings, Binding, MOD_SUPER};
use crate::wm::launcher::Launcher;
use crate::wm::moveresize::DragSession;
use crate::wm::registry::ClientRegistry;
use crate::wm::screen::ScreenLocator;
use crate::wm::workspace::DesktopMask;

pub struct WindowManager<W> {
    pub backend: W,
    pub config: Config,
    pub screens: ScreenLocator,
    pub registry: ClientRegistry,
    pub bindings: Vec<Binding>,
    /// Active move or resize, if any
    pub drag: Option<DragSession>,
    /// Content window of the focused client
    focused: Option<Window>,
    current_desktop: DesktopMask,
    launcher: Launcher,
    running: bool,
}

impl<W: WindowSystem> WindowManager<W> {
    /// Sets up desktops, bindings and grabs on top of a connected backend.
    pub fn new(mut backend: W, config: Config) -> Result<Self> {
        let screens = ScreenLocator::new(backend.monitors()?, backend.display_size());
        let root = backend.root();
        let count = config.behavior.desktop_count;

        // keep the desktop a previous manager left behind, if it still exists
        let valid = DesktopMask::all(count).bits();
        let current_desktop = backend
            .get_cardinals(root, Prop::CurrentDesktop)?
            .and_then(|values| values.first().copied())
            .filter(|&bits| bits != 0 && bits & valid == bits)
            .map(DesktopMask)
            .unwrap_or(DesktopMask::single(0));

        backend.set_cardinals(root, Prop::NumberOfDesktops, &[count])?;
        backend.set_cardinals(root, Prop::CurrentDesktop, &[current_desktop.bits()])?;

        let bindings = build_bindings(&config);
        for binding in &bindings {
            backend.grab_key(binding.key)?;
        }
        backend.grab_modifier_buttons(MOD_SUPER)?;

        info!(
            "Window manager ready: {} desktops, {} bindings, {} monitors",
            count,
            bindings.len(),
            screens.monitors().len()
        );

        Ok(Self {
            backend,
            config,
            screens,
            registry: ClientRegistry::new(),
            bindings,
            drag: None,
            focused: None,
            current_desktop,
            launcher: Launcher::new(),
            running: true,
        })
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Collects launched programs that have exited.
    pub fn reap_children(&mut self) {
        self.launcher.reap();
    }

    /// Takes over the windows that were already on screen at startup,
    /// keeping their geometry.
    pub fn adopt_existing_windows(&mut self) -> Result<()> {
        let existing = self.backend.existing_windows()?;
        let mut adopted = 0;

        for ExistingWindow { window, geometry } in existing {
            if self.registry.contains(window) {
                continue;
            }
            let key = self.manage(window, geometry, true)?;
            if let Some(client) = self.registry.get_mut(key) {
                client.flags.insert(ClientFlags::MAPPED);
            }
            self.move_resize(key, geometry)?;
            self.backend.set_border_width(key, 0)?;
            self.backend.set_cardinals(key, Prop::WmState, &[WM_STATE_NORMAL, 0])?;
            adopted += 1;
        }

        self.apply_visibility()?;
        info!("Adopted {} existing windows", adopted);
        Ok(())
    }

    /// Hands every client back to the root window and drops the frames.
    pub fn shutdown(&mut self) -> Result<()> {
        if !self.registry.is_empty() {
            info!("Releasing {} clients", self.registry.len());
        }
        if self.drag.take().is_some() {
            self.backend.ungrab_pointer()?;
        }
        for window in self.registry.windows() {
            let Some(client) = self.registry.remove(window) else {
                continue;
            };
            debug!("Releasing {}", client.window);
            self.backend.reparent_to_root(client.window, (client.x(), client.y()))?;
            self.backend.destroy_window(client.frame)?;
        }
        self.focused = None;
        self.backend.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Geometry;
    use crate::wm::screen::Monitor;
    use crate::wm::testing::{manager, FakeDisplay, Request};

    fn test_monitor() -> Monitor {
        Monitor { x: 0, y: 0, width: 1000, height: 1000, name: "test".into(), primary: true }
    }

    #[test]
    fn test_new_publishes_desktops_and_grabs() {
        let mut display = FakeDisplay::new(vec![test_monitor()]);
        display.props.insert((display.root(), Prop::CurrentDesktop), vec![0b100]);
        let wm = WindowManager::new(display, Config::default()).unwrap();
        let root = wm.backend.root();

        assert_eq!(wm.current_desktop(), DesktopMask(0b100));
        assert_eq!(wm.backend.property(root, Prop::NumberOfDesktops), Some(vec![9]));
        assert!(wm.backend.requests.contains(&Request::GrabButtons(MOD_SUPER)));
        let grabbed = wm.backend.requests.iter().filter(|r| matches!(r, Request::GrabKey(_))).count();
        assert_eq!(grabbed, wm.bindings.len());
    }

    #[test]
    fn test_out_of_range_current_desktop_is_reset() {
        let mut display = FakeDisplay::new(vec![test_monitor()]);
        display.props.insert((display.root(), Prop::CurrentDesktop), vec![1 << 20]);
        let wm = WindowManager::new(display, Config::default()).unwrap();
        assert_eq!(wm.current_desktop(), DesktopMask::single(0));
    }

    #[test]
    fn test_adopt_keeps_geometry_and_skips_reparent_unmap() {
        let mut wm = manager();
        wm.backend.existing.push(ExistingWindow { window: 10, geometry: Geometry::new(40, 50, 300, 200) });
        wm.adopt_existing_windows().unwrap();

        let client = wm.registry.get(10).unwrap();
        assert_eq!(client.geometry(), Geometry::new(40, 50, 300, 200));
        assert!(client.is_mapped());
        assert!(wm.backend.is_mapped(wm.backend.frame_of(10)));

        wm.unmap_notify(10).unwrap();
        assert!(wm.registry.get(10).unwrap().is_mapped());
    }

    #[test]
    fn test_shutdown_reparents_to_root() {
        let mut wm = manager();
        let w = crate::wm::testing::map_client(&mut wm, 10, Geometry::new(40, 50, 300, 200));
        let frame = wm.backend.frame_of(w);
        wm.shutdown().unwrap();

        assert!(wm.registry.is_empty());
        assert!(wm.backend.requests.contains(&Request::ReparentToRoot(w, (40, 50))));
        assert!(wm.backend.requests.contains(&Request::Destroy(frame)));
    }
}
