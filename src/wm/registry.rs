//! Client registry
//!
//! Owns every managed [`Client`]. Each client is reachable through two
//! keys, its frame and its content window; both resolve to the same entry.

use anyhow::Result;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::shared::Geometry;
use crate::wm::backend::{Prop, Window, WindowSystem};
use crate::wm::client::{Client, UNTITLED};
use crate::wm::client_flags::ClientFlags;
use crate::wm::hints;
use crate::wm::workspace::DesktopMask;
use crate::wm::WindowManager;

/// Two-key client map
#[derive(Debug, Default)]
pub struct ClientRegistry {
    /// Keyed by content window
    clients: BTreeMap<Window, Client>,
    /// Frame window -> content window
    frames: HashMap<Window, Window>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves either key to the client's content window.
    pub fn key_of(&self, handle: Window) -> Option<Window> {
        if self.clients.contains_key(&handle) {
            Some(handle)
        } else {
            self.frames.get(&handle).copied()
        }
    }

    pub fn contains(&self, handle: Window) -> bool {
        self.key_of(handle).is_some()
    }

    pub fn get(&self, handle: Window) -> Option<&Client> {
        self.key_of(handle).and_then(|key| self.clients.get(&key))
    }

    pub fn get_mut(&mut self, handle: Window) -> Option<&mut Client> {
        let key = self.key_of(handle)?;
        self.clients.get_mut(&key)
    }

    pub fn insert(&mut self, client: Client) {
        self.frames.insert(client.frame, client.window);
        self.clients.insert(client.window, client);
    }

    /// Removes both keys; `None` if the handle was not registered.
    pub fn remove(&mut self, handle: Window) -> Option<Client> {
        let key = self.key_of(handle)?;
        let client = self.clients.remove(&key)?;
        self.frames.remove(&client.frame);
        Some(client)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Client> {
        self.clients.values()
    }

    pub fn windows(&self) -> Vec<Window> {
        self.clients.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl<W: WindowSystem> WindowManager<W> {
    /// Looks up a client by either key, managing the window when `create`
    /// is set and it is not known yet. Returns the content window.
    pub fn find_or_create(&mut self, handle: Window, create: bool) -> Result<Option<Window>> {
        if let Some(key) = self.registry.key_of(handle) {
            return Ok(Some(key));
        }
        if !create {
            return Ok(None);
        }
        let geometry = self.initial_placement()?;
        self.manage(handle, geometry, false).map(Some)
    }

    /// Wraps `window` in a frame and registers it.
    pub(crate) fn manage(&mut self, window: Window, geometry: Geometry, viewable: bool) -> Result<Window> {
        let decor = &self.config.decorations;
        let inset = (decor.border_width as i32, decor.title_height as i32);

        let kind = self.backend.window_kind(window)?;
        let undecorated = match hints::read_motif_hints(&self.backend, window)?
            .and_then(|m| m.wants_decorations())
        {
            Some(wants) => !wants,
            None => kind.starts_undecorated(),
        };
        let constraints = hints::read_size_constraints(&self.backend, window)?;
        let desktop = self
            .backend
            .get_cardinals(window, Prop::Desktop)?
            .and_then(|values| values.first().copied())
            .filter(|&bits| bits != 0)
            .map(DesktopMask)
            .unwrap_or(self.current_desktop);
        let title = self.read_title(window)?;

        let frame = self.backend.create_frame(window, inset)?;

        let mut client = Client::new(frame, window, geometry, desktop);
        client.kind = kind;
        client.constraints = constraints;
        client.title = title;
        client.flags.set(ClientFlags::UNDECORATED, undecorated);
        if viewable {
            // reparenting a viewable window unmaps it once
            client.pending_unmaps = 1;
        }
        self.registry.insert(client);

        self.backend.set_cardinals(window, Prop::Desktop, &[desktop.bits()])?;
        self.backend.grab_focus_click(frame)?;

        info!(
            "Managing window {} in frame {} ({:?}, desktop {:#x}{})",
            window,
            frame,
            kind,
            desktop.bits(),
            if undecorated { ", undecorated" } else { "" }
        );
        Ok(window)
    }

    /// Forgets a client and destroys its frame. Unknown handles are ignored.
    pub fn destroy(&mut self, handle: Window) -> Result<()> {
        let Some(client) = self.registry.remove(handle) else {
            return Ok(());
        };
        debug!("Destroying frame {} of window {}", client.frame, client.window);

        self.forget_focus(client.window);
        if self.drag.is_some_and(|drag| drag.client == client.window) {
            self.drag = None;
            self.backend.ungrab_pointer()?;
        }
        self.backend.destroy_window(client.frame)?;
        info!("Unmanaged window {}", client.window);
        Ok(())
    }

    /// `_NET_WM_NAME`, then `WM_NAME`, then a placeholder.
    pub(crate) fn read_title(&self, window: Window) -> Result<String> {
        for prop in [Prop::NetWmName, Prop::WmName] {
            if let Some(title) = self.backend.get_text(window, prop)? {
                if !title.is_empty() {
                    return Ok(title);
                }
            }
        }
        Ok(UNTITLED.to_string())
    }
}
