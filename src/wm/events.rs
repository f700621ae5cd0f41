//! Events Module
//!
//! Server notifications arrive as [`WmEvent`]s. An [`EventTable`] routes each
//! one through the chain of handlers registered for its [`EventKind`]; a
//! handler returning `false` stops the rest of its chain.

use anyhow::Result;
use std::collections::HashMap;
use tracing::{debug, trace};

use crate::config::FocusPolicy;
use crate::shared::Geometry;
use crate::wm::backend::{Prop, Window, WindowSystem, WM_STATE_NORMAL, WM_STATE_WITHDRAWN};
use crate::wm::client_flags::ClientFlags;
use crate::wm::hints;
use crate::wm::WindowManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    /// Window the event was reported on
    pub window: Window,
    /// Child of `window` under the pointer, or 0
    pub child: Window,
    pub button: u8,
    pub state: u16,
    pub root_x: i32,
    pub root_y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionEvent {
    pub root_x: i32,
    pub root_y: i32,
}

/// Only the fields the client actually asked to change are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfigureRequest {
    pub window: Window,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub keysym: u32,
    pub state: u16,
    pub child: Window,
    pub root_x: i32,
    pub root_y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyEvent {
    pub window: Window,
    /// `None` for properties the manager does not track
    pub prop: Option<Prop>,
}

/// A server notification, already decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WmEvent {
    ButtonPress(ButtonEvent),
    ButtonRelease(ButtonEvent),
    Motion(MotionEvent),
    ConfigureRequest(ConfigureRequest),
    MapRequest(Window),
    Unmap(Window),
    Destroy(Window),
    Enter(Window),
    PropertyChanged(PropertyEvent),
    /// Last expose of a series
    Expose(Window),
    KeyPress(KeyEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ButtonPress,
    ButtonRelease,
    Motion,
    ConfigureRequest,
    MapRequest,
    Unmap,
    Destroy,
    Enter,
    PropertyChanged,
    Expose,
    KeyPress,
}

impl WmEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WmEvent::ButtonPress(_) => EventKind::ButtonPress,
            WmEvent::ButtonRelease(_) => EventKind::ButtonRelease,
            WmEvent::Motion(_) => EventKind::Motion,
            WmEvent::ConfigureRequest(_) => EventKind::ConfigureRequest,
            WmEvent::MapRequest(_) => EventKind::MapRequest,
            WmEvent::Unmap(_) => EventKind::Unmap,
            WmEvent::Destroy(_) => EventKind::Destroy,
            WmEvent::Enter(_) => EventKind::Enter,
            WmEvent::PropertyChanged(_) => EventKind::PropertyChanged,
            WmEvent::Expose(_) => EventKind::Expose,
            WmEvent::KeyPress(_) => EventKind::KeyPress,
        }
    }
}

/// Handler signature; `Ok(false)` stops the chain.
pub type Callback<W, E> = fn(&mut WindowManager<W>, &E) -> Result<bool>;

/// A handler tagged with the kind of event it accepts
pub enum Handler<W> {
    ButtonPress(Callback<W, ButtonEvent>),
    ButtonRelease(Callback<W, ButtonEvent>),
    Motion(Callback<W, MotionEvent>),
    ConfigureRequest(Callback<W, ConfigureRequest>),
    MapRequest(Callback<W, Window>),
    Unmap(Callback<W, Window>),
    Destroy(Callback<W, Window>),
    Enter(Callback<W, Window>),
    PropertyChanged(Callback<W, PropertyEvent>),
    Expose(Callback<W, Window>),
    KeyPress(Callback<W, KeyEvent>),
}

impl<W> Clone for Handler<W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<W> Copy for Handler<W> {}

impl<W> Handler<W> {
    pub fn kind(&self) -> EventKind {
        match self {
            Handler::ButtonPress(_) => EventKind::ButtonPress,
            Handler::ButtonRelease(_) => EventKind::ButtonRelease,
            Handler::Motion(_) => EventKind::Motion,
            Handler::ConfigureRequest(_) => EventKind::ConfigureRequest,
            Handler::MapRequest(_) => EventKind::MapRequest,
            Handler::Unmap(_) => EventKind::Unmap,
            Handler::Destroy(_) => EventKind::Destroy,
            Handler::Enter(_) => EventKind::Enter,
            Handler::PropertyChanged(_) => EventKind::PropertyChanged,
            Handler::Expose(_) => EventKind::Expose,
            Handler::KeyPress(_) => EventKind::KeyPress,
        }
    }
}

/// Handler chains keyed by event kind
pub struct EventTable<W> {
    chains: HashMap<EventKind, Vec<Handler<W>>>,
}

impl<W> Default for EventTable<W> {
    fn default() -> Self {
        Self { chains: HashMap::new() }
    }
}

impl<W: WindowSystem> EventTable<W> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The manager's own handlers, one per event kind.
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.listen(Handler::ButtonPress(on_button_press));
        table.listen(Handler::ButtonRelease(on_button_release));
        table.listen(Handler::Motion(on_motion));
        table.listen(Handler::ConfigureRequest(on_configure_request));
        table.listen(Handler::MapRequest(on_map_request));
        table.listen(Handler::Unmap(on_unmap));
        table.listen(Handler::Destroy(on_destroy));
        table.listen(Handler::Enter(on_enter));
        table.listen(Handler::PropertyChanged(on_property));
        table.listen(Handler::Expose(on_expose));
        table.listen(Handler::KeyPress(on_key_press));
        table
    }

    /// Appends to the chain for the handler's kind.
    pub fn listen(&mut self, handler: Handler<W>) {
        self.chains.entry(handler.kind()).or_default().push(handler);
    }

    pub fn dispatch(&self, wm: &mut WindowManager<W>, event: &WmEvent) -> Result<()> {
        let Some(chain) = self.chains.get(&event.kind()) else {
            trace!("No handler for {:?}", event.kind());
            return Ok(());
        };
        for handler in chain {
            let keep_going = match (*handler, event) {
                (Handler::ButtonPress(f), WmEvent::ButtonPress(e)) => f(wm, e)?,
                (Handler::ButtonRelease(f), WmEvent::ButtonRelease(e)) => f(wm, e)?,
                (Handler::Motion(f), WmEvent::Motion(e)) => f(wm, e)?,
                (Handler::ConfigureRequest(f), WmEvent::ConfigureRequest(e)) => f(wm, e)?,
                (Handler::MapRequest(f), WmEvent::MapRequest(w)) => f(wm, w)?,
                (Handler::Unmap(f), WmEvent::Unmap(w)) => f(wm, w)?,
                (Handler::Destroy(f), WmEvent::Destroy(w)) => f(wm, w)?,
                (Handler::Enter(f), WmEvent::Enter(w)) => f(wm, w)?,
                (Handler::PropertyChanged(f), WmEvent::PropertyChanged(e)) => f(wm, e)?,
                (Handler::Expose(f), WmEvent::Expose(w)) => f(wm, w)?,
                (Handler::KeyPress(f), WmEvent::KeyPress(e)) => f(wm, e)?,
                _ => true,
            };
            if !keep_going {
                break;
            }
        }
        Ok(())
    }
}

fn on_button_press<W: WindowSystem>(wm: &mut WindowManager<W>, e: &ButtonEvent) -> Result<bool> {
    wm.button_press(e)?;
    Ok(true)
}

fn on_button_release<W: WindowSystem>(wm: &mut WindowManager<W>, e: &ButtonEvent) -> Result<bool> {
    wm.button_release(e)?;
    Ok(true)
}

fn on_motion<W: WindowSystem>(wm: &mut WindowManager<W>, e: &MotionEvent) -> Result<bool> {
    wm.motion(e)?;
    Ok(true)
}

fn on_configure_request<W: WindowSystem>(wm: &mut WindowManager<W>, e: &ConfigureRequest) -> Result<bool> {
    wm.configure_request(e)?;
    Ok(true)
}

fn on_map_request<W: WindowSystem>(wm: &mut WindowManager<W>, window: &Window) -> Result<bool> {
    wm.map_request(*window)?;
    Ok(true)
}

fn on_unmap<W: WindowSystem>(wm: &mut WindowManager<W>, window: &Window) -> Result<bool> {
    wm.unmap_notify(*window)?;
    Ok(true)
}

fn on_destroy<W: WindowSystem>(wm: &mut WindowManager<W>, window: &Window) -> Result<bool> {
    wm.destroy_notify(*window)?;
    Ok(true)
}

fn on_enter<W: WindowSystem>(wm: &mut WindowManager<W>, window: &Window) -> Result<bool> {
    wm.enter(*window)?;
    Ok(true)
}

fn on_property<W: WindowSystem>(wm: &mut WindowManager<W>, e: &PropertyEvent) -> Result<bool> {
    wm.property_changed(e)?;
    Ok(true)
}

fn on_expose<W: WindowSystem>(wm: &mut WindowManager<W>, window: &Window) -> Result<bool> {
    wm.redraw(*window)?;
    Ok(true)
}

fn on_key_press<W: WindowSystem>(wm: &mut WindowManager<W>, e: &KeyEvent) -> Result<bool> {
    wm.key_press(e)?;
    Ok(true)
}

/// Pulls events from the backend, collapsing runs of motion into the last
/// one. The event that ends a run is held back for the next call.
#[derive(Debug, Default)]
pub struct EventPump {
    held: Option<WmEvent>,
}

impl EventPump {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next<W: WindowSystem>(&mut self, backend: &mut W) -> Result<Option<WmEvent>> {
        let event = match self.held.take() {
            Some(event) => event,
            None => match backend.poll_event()? {
                Some(event) => event,
                None => return Ok(None),
            },
        };
        let WmEvent::Motion(mut latest) = event else {
            return Ok(Some(event));
        };

        while let Some(next) = backend.poll_event()? {
            match next {
                WmEvent::Motion(motion) => latest = motion,
                other => {
                    self.held = Some(other);
                    break;
                }
            }
        }
        Ok(Some(WmEvent::Motion(latest)))
    }
}

impl<W: WindowSystem> WindowManager<W> {
    pub fn map_request(&mut self, window: Window) -> Result<()> {
        let Some(key) = self.find_or_create(window, true)? else {
            return Ok(());
        };
        let Some(client) = self.registry.get_mut(key) else {
            return Ok(());
        };
        client.flags.insert(ClientFlags::MAPPED);
        let (frame, geometry) = (client.frame, client.geometry());
        let visible = client.desktop.is_visible_on(self.current_desktop);

        self.move_resize(key, geometry)?;
        self.backend.set_border_width(key, 0)?;
        self.backend.map_window(key)?;
        if visible {
            self.backend.map_window(frame)?;
        }
        self.backend.set_cardinals(key, Prop::WmState, &[WM_STATE_NORMAL, 0])?;
        self.update_name(key)?;
        debug!("Mapped {} (visible: {})", key, visible);
        Ok(())
    }

    /// Only unmaps of content windows count; frame unmaps are our own doing.
    pub fn unmap_notify(&mut self, window: Window) -> Result<()> {
        if self.registry.key_of(window) != Some(window) {
            return Ok(());
        }
        let Some(client) = self.registry.get_mut(window) else {
            return Ok(());
        };
        if client.pending_unmaps > 0 {
            client.pending_unmaps -= 1;
            trace!("Skipping unmap of {} caused by reparenting", window);
            return Ok(());
        }
        client.flags.remove(ClientFlags::MAPPED);
        let frame = client.frame;

        self.backend.unmap_window(frame)?;
        self.backend.set_cardinals(window, Prop::WmState, &[WM_STATE_WITHDRAWN, 0])?;
        self.forget_focus(window);
        debug!("Unmapped {}", window);
        Ok(())
    }

    pub fn destroy_notify(&mut self, window: Window) -> Result<()> {
        if self.registry.key_of(window) == Some(window) {
            self.destroy(window)?;
        }
        Ok(())
    }

    /// Applies the requested fields. A full position request made relative
    /// to one monitor is carried over to the monitor under the pointer.
    pub fn configure_request(&mut self, request: &ConfigureRequest) -> Result<()> {
        let Some(key) = self.find_or_create(request.window, true)? else {
            return Ok(());
        };
        let Some(client) = self.registry.get(key) else {
            return Ok(());
        };
        let mut geometry = Geometry::new(client.x(), client.y(), client.width(), client.height());

        match (request.x, request.y) {
            (Some(x), Some(y)) => {
                let from = self.screens.find_screen(x, y).geometry();
                let to = self.current_screen()?.geometry();
                geometry.x = x - from.x + to.x;
                geometry.y = y - from.y + to.y;
            }
            (x, y) => {
                geometry.x = x.unwrap_or(geometry.x);
                geometry.y = y.unwrap_or(geometry.y);
            }
        }
        geometry.width = request.width.unwrap_or(geometry.width);
        geometry.height = request.height.unwrap_or(geometry.height);

        debug!("Configure request for {}: {:?}", key, geometry);
        self.move_resize(key, geometry)?;
        self.backend.set_border_width(key, 0)?;
        Ok(())
    }

    pub fn enter(&mut self, window: Window) -> Result<()> {
        if self.config.behavior.focus_policy != FocusPolicy::FocusFollowsMouse || self.drag.is_some() {
            return Ok(());
        }
        self.focus(Some(window), Some(window))
    }

    pub fn property_changed(&mut self, event: &PropertyEvent) -> Result<()> {
        match event.prop {
            Some(Prop::WmName | Prop::NetWmName) => self.update_name(event.window),
            Some(Prop::NormalHints) => {
                if self.registry.key_of(event.window) == Some(event.window) {
                    let constraints = hints::read_size_constraints(&self.backend, event.window)?;
                    if let Some(client) = self.registry.get_mut(event.window) {
                        client.constraints = constraints;
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
