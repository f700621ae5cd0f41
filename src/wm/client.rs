//! Managed client state

use crate::shared::Geometry;
use crate::wm::backend::{Window, WindowKind};
use crate::wm::client_flags::ClientFlags;
use crate::wm::hints::SizeConstraints;
use crate::wm::screen::Monitor;
use crate::wm::workspace::DesktopMask;

pub const UNTITLED: &str = "Untitled Window";

/// A managed top-level window and the frame wrapped around it
#[derive(Debug, Clone)]
pub struct Client {
    /// Frame window created by the manager
    pub frame: Window,

    /// The application's own window, reparented into `frame`
    pub window: Window,

    // Content rectangle in root coordinates; right/bottom follow every change.
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    right: i32,
    bottom: i32,

    pub flags: ClientFlags,

    /// Monitor being filled while fullscreen
    pub fullscreen: Option<Monitor>,

    pub desktop: DesktopMask,

    pub title: String,

    pub constraints: SizeConstraints,

    pub kind: WindowKind,

    /// Unmap notifications caused by our own reparenting, to be skipped
    pub pending_unmaps: u32,

    /// Last value written to `_NET_FRAME_EXTENTS`
    pub frame_extents: Option<[u32; 4]>,
}

impl Client {
    pub fn new(frame: Window, window: Window, geometry: Geometry, desktop: DesktopMask) -> Self {
        let mut client = Self {
            frame,
            window,
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            right: 0,
            bottom: 0,
            flags: ClientFlags::empty(),
            fullscreen: None,
            desktop,
            title: UNTITLED.to_string(),
            constraints: SizeConstraints::default(),
            kind: WindowKind::Normal,
            pending_unmaps: 0,
            frame_extents: None,
        };
        client.set_geometry(geometry);
        client
    }

    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.x, self.y, self.width, self.height)
    }

    pub fn set_geometry(&mut self, geometry: Geometry) {
        self.x = geometry.x;
        self.y = geometry.y;
        self.width = geometry.width;
        self.height = geometry.height;
        self.right = geometry.right();
        self.bottom = geometry.bottom();
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn right(&self) -> i32 {
        self.right
    }

    pub fn bottom(&self) -> i32 {
        self.bottom
    }

    pub fn is_mapped(&self) -> bool {
        self.flags.contains(ClientFlags::MAPPED)
    }

    pub fn is_undecorated(&self) -> bool {
        self.flags.contains(ClientFlags::UNDECORATED)
    }

    pub fn is_shaded(&self) -> bool {
        self.flags.contains(ClientFlags::SHADED)
    }

    /// Whether the frame currently shows a title strip and borders.
    pub fn has_chrome(&self) -> bool {
        self.fullscreen.is_none() && !self.is_undecorated()
    }
}
