//! Window system seam
//!
//! Everything the manager asks of the display server goes through
//! [`WindowSystem`]. The X11 implementation lives in [`super::x11`]; tests
//! drive the same code through an in-memory recorder.
//!
//! Requests are fire-and-forget: a method only fails when the connection
//! itself fails. Protocol errors caused by a request (a window vanished
//! under us, say) come back later as error events and are logged there.

use anyhow::Result;

use crate::shared::Geometry;
use crate::wm::events::WmEvent;
use crate::wm::keyboard::KeySpec;
use crate::wm::screen::Monitor;

/// Server-side window handle
pub type Window = u32;

/// Properties the manager reads or writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prop {
    /// ICCCM `WM_STATE`
    WmState,
    /// ICCCM `WM_NORMAL_HINTS`
    NormalHints,
    /// ICCCM `WM_NAME`
    WmName,
    /// `_NET_WM_NAME`
    NetWmName,
    /// `_NET_WM_DESKTOP`, holding a desktop mask
    Desktop,
    /// `_NET_CURRENT_DESKTOP` on the root, holding a desktop mask
    CurrentDesktop,
    /// `_NET_NUMBER_OF_DESKTOPS` on the root
    NumberOfDesktops,
    /// `_NET_ACTIVE_WINDOW` on the root
    ActiveWindow,
    /// `_NET_FRAME_EXTENTS`: left, right, top, bottom
    FrameExtents,
    /// `_MOTIF_WM_HINTS`
    MotifHints,
}

/// ICCCM `WM_STATE` values
pub const WM_STATE_WITHDRAWN: u32 = 0;
pub const WM_STATE_NORMAL: u32 = 1;

/// Coarse classification of `_NET_WM_WINDOW_TYPE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowKind {
    #[default]
    Normal,
    Dialog,
    Dock,
    Desktop,
    Splash,
    Notification,
    Tooltip,
    Menu,
}

impl WindowKind {
    /// Kinds that never get a frame.
    pub fn starts_undecorated(self) -> bool {
        matches!(
            self,
            WindowKind::Dock
                | WindowKind::Desktop
                | WindowKind::Splash
                | WindowKind::Notification
                | WindowKind::Tooltip
                | WindowKind::Menu
        )
    }
}

/// Pointer cursors, indexed for resizing by `4 + hf + 3 * vf`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorShape {
    TopLeft,
    Top,
    TopRight,
    Left,
    Circle,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
    Move,
    Normal,
}

impl CursorShape {
    pub const RESIZE: [CursorShape; 9] = [
        CursorShape::TopLeft,
        CursorShape::Top,
        CursorShape::TopRight,
        CursorShape::Left,
        CursorShape::Circle,
        CursorShape::Right,
        CursorShape::BottomLeft,
        CursorShape::Bottom,
        CursorShape::BottomRight,
    ];

    /// Glyph in the core `cursor` font.
    pub fn glyph(self) -> u16 {
        match self {
            CursorShape::TopLeft => 134,
            CursorShape::Top => 138,
            CursorShape::TopRight => 136,
            CursorShape::Left => 70,
            CursorShape::Circle => 24,
            CursorShape::Right => 96,
            CursorShape::BottomLeft => 12,
            CursorShape::Bottom => 16,
            CursorShape::BottomRight => 14,
            CursorShape::Move => 52,
            CursorShape::Normal => 68,
        }
    }
}

/// A top-level window found at startup that should be adopted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExistingWindow {
    pub window: Window,
    pub geometry: Geometry,
}

/// Collaborator interface consumed by the window manager core.
pub trait WindowSystem {
    fn root(&self) -> Window;

    /// Size of the whole root window.
    fn display_size(&self) -> (u32, u32);

    /// Physical monitors, queried once at startup. May be empty.
    fn monitors(&self) -> Result<Vec<Monitor>>;

    /// Viewable, non-override-redirect children of the root.
    fn existing_windows(&self) -> Result<Vec<ExistingWindow>>;

    /// Creates a frame, adds `content` to the save set, reparents it into the
    /// frame at `inset` and selects the events the manager needs on both.
    fn create_frame(&mut self, content: Window, inset: (i32, i32)) -> Result<Window>;

    /// Reparents `content` back to the root at `position` (used on shutdown).
    fn reparent_to_root(&mut self, content: Window, position: (i32, i32)) -> Result<()>;

    fn destroy_window(&mut self, window: Window) -> Result<()>;
    fn move_resize_window(&mut self, window: Window, geometry: Geometry) -> Result<()>;
    fn set_border_width(&mut self, window: Window, width: u32) -> Result<()>;
    fn map_window(&mut self, window: Window) -> Result<()>;
    fn unmap_window(&mut self, window: Window) -> Result<()>;
    fn raise_window(&mut self, window: Window) -> Result<()>;
    fn lower_window(&mut self, window: Window) -> Result<()>;

    /// Whether the window's map state is viewable. A missing window is not.
    fn is_viewable(&self, window: Window) -> Result<bool>;

    /// Tells `window` its absolute geometry with a synthetic ConfigureNotify.
    fn send_configure_notify(&mut self, window: Window, geometry: Geometry) -> Result<()>;

    fn set_input_focus(&mut self, window: Window) -> Result<()>;

    /// Politely asks the client to close (WM_DELETE_WINDOW), killing it if
    /// it does not take part in that protocol.
    fn close_window(&mut self, window: Window) -> Result<()>;

    /// Disconnects the owning client.
    fn kill_client(&mut self, window: Window) -> Result<()>;

    /// Pointer position in root coordinates.
    fn query_pointer(&self) -> Result<(i32, i32)>;

    /// Grabs the pointer exclusively for a drag.
    fn grab_pointer(&mut self, cursor: CursorShape) -> Result<()>;
    fn ungrab_pointer(&mut self) -> Result<()>;

    /// Arms a synchronous button-1 grab on `frame` so that a click on an
    /// inactive client reaches the manager first.
    fn grab_focus_click(&mut self, frame: Window) -> Result<()>;
    fn release_focus_click(&mut self, frame: Window) -> Result<()>;

    /// Lets a frozen click continue to the application.
    fn replay_pointer(&mut self) -> Result<()>;

    /// Grabs a key combination on the root, whatever the lock modifiers.
    fn grab_key(&mut self, key: KeySpec) -> Result<()>;

    /// Grabs every button pressed with `modifiers` on the root.
    fn grab_modifier_buttons(&mut self, modifiers: u16) -> Result<()>;

    fn get_cardinals(&self, window: Window, prop: Prop) -> Result<Option<Vec<u32>>>;
    fn set_cardinals(&mut self, window: Window, prop: Prop, values: &[u32]) -> Result<()>;

    /// Reads `prop` as text (`WM_NAME`, `_NET_WM_NAME`).
    fn get_text(&self, window: Window, prop: Prop) -> Result<Option<String>>;

    fn window_kind(&self, window: Window) -> Result<WindowKind>;

    fn fill_rectangle(&mut self, window: Window, color: u32, area: Geometry) -> Result<()>;
    fn draw_line(&mut self, window: Window, color: u32, from: (i32, i32), to: (i32, i32)) -> Result<()>;
    fn draw_text(&mut self, window: Window, color: u32, background: u32, origin: (i32, i32), text: &str) -> Result<()>;
    fn text_width(&self, text: &str) -> Result<u32>;
    fn font_ascent(&self) -> u32;

    /// Next queued event, if any, without blocking.
    fn poll_event(&mut self) -> Result<Option<WmEvent>>;

    fn flush(&mut self) -> Result<()>;
}
