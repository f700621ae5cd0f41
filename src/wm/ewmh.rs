//! EWMH (Extended Window Manager Hints) implementation
//!
//! Interned atoms and the property plumbing the X11 backend needs to speak
//! ICCCM and EWMH to clients, panels and pagers.

use anyhow::Result;
use tracing::debug;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{ClientMessageEvent, *};
use x11rb::wrapper::ConnectionExt as _;

use crate::wm::backend::{Prop, WindowKind};

/// Holds all interned atoms
#[derive(Debug)]
pub struct Atoms {
    pub net_supported: Atom,
    pub net_supporting_wm_check: Atom,
    pub net_number_of_desktops: Atom,
    pub net_current_desktop: Atom,
    pub net_active_window: Atom,
    pub net_wm_name: Atom,
    pub net_wm_desktop: Atom,
    pub net_frame_extents: Atom,
    pub net_wm_window_type: Atom,
    pub net_wm_window_type_normal: Atom,
    pub net_wm_window_type_dialog: Atom,
    pub net_wm_window_type_dock: Atom,
    pub net_wm_window_type_desktop: Atom,
    pub net_wm_window_type_splash: Atom,
    pub net_wm_window_type_notification: Atom,
    pub net_wm_window_type_tooltip: Atom,
    pub net_wm_window_type_menu: Atom,
    pub net_wm_window_type_dropdown_menu: Atom,
    pub net_wm_window_type_popup_menu: Atom,
    pub wm_protocols: Atom,
    pub wm_delete_window: Atom,
    pub wm_state: Atom,
    pub utf8_string: Atom,
    pub motif_wm_hints: Atom,
}

impl Atoms {
    /// Intern all required atoms
    pub fn new<C: Connection>(conn: &C) -> Result<Self> {
        let intern = |name: &str| -> Result<Atom> {
            Ok(conn.intern_atom(false, name.as_bytes())?.reply()?.atom)
        };

        Ok(Self {
            net_supported: intern("_NET_SUPPORTED")?,
            net_supporting_wm_check: intern("_NET_SUPPORTING_WM_CHECK")?,
            net_number_of_desktops: intern("_NET_NUMBER_OF_DESKTOPS")?,
            net_current_desktop: intern("_NET_CURRENT_DESKTOP")?,
            net_active_window: intern("_NET_ACTIVE_WINDOW")?,
            net_wm_name: intern("_NET_WM_NAME")?,
            net_wm_desktop: intern("_NET_WM_DESKTOP")?,
            net_frame_extents: intern("_NET_FRAME_EXTENTS")?,
            net_wm_window_type: intern("_NET_WM_WINDOW_TYPE")?,
            net_wm_window_type_normal: intern("_NET_WM_WINDOW_TYPE_NORMAL")?,
            net_wm_window_type_dialog: intern("_NET_WM_WINDOW_TYPE_DIALOG")?,
            net_wm_window_type_dock: intern("_NET_WM_WINDOW_TYPE_DOCK")?,
            net_wm_window_type_desktop: intern("_NET_WM_WINDOW_TYPE_DESKTOP")?,
            net_wm_window_type_splash: intern("_NET_WM_WINDOW_TYPE_SPLASH")?,
            net_wm_window_type_notification: intern("_NET_WM_WINDOW_TYPE_NOTIFICATION")?,
            net_wm_window_type_tooltip: intern("_NET_WM_WINDOW_TYPE_TOOLTIP")?,
            net_wm_window_type_menu: intern("_NET_WM_WINDOW_TYPE_MENU")?,
            net_wm_window_type_dropdown_menu: intern("_NET_WM_WINDOW_TYPE_DROPDOWN_MENU")?,
            net_wm_window_type_popup_menu: intern("_NET_WM_WINDOW_TYPE_POPUP_MENU")?,
            wm_protocols: intern("WM_PROTOCOLS")?,
            wm_delete_window: intern("WM_DELETE_WINDOW")?,
            wm_state: intern("WM_STATE")?,
            utf8_string: intern("UTF8_STRING")?,
            motif_wm_hints: intern("_MOTIF_WM_HINTS")?,
        })
    }

    /// Property name atom for `prop`.
    pub fn atom(&self, prop: Prop) -> Atom {
        match prop {
            Prop::WmState => self.wm_state,
            Prop::NormalHints => AtomEnum::WM_NORMAL_HINTS.into(),
            Prop::WmName => AtomEnum::WM_NAME.into(),
            Prop::NetWmName => self.net_wm_name,
            Prop::Desktop => self.net_wm_desktop,
            Prop::CurrentDesktop => self.net_current_desktop,
            Prop::NumberOfDesktops => self.net_number_of_desktops,
            Prop::ActiveWindow => self.net_active_window,
            Prop::FrameExtents => self.net_frame_extents,
            Prop::MotifHints => self.motif_wm_hints,
        }
    }

    /// Type written along with `prop`.
    pub fn type_of(&self, prop: Prop) -> Atom {
        match prop {
            Prop::WmState => self.wm_state,
            Prop::NormalHints => AtomEnum::WM_SIZE_HINTS.into(),
            Prop::WmName => AtomEnum::STRING.into(),
            Prop::NetWmName => self.utf8_string,
            Prop::ActiveWindow => AtomEnum::WINDOW.into(),
            Prop::MotifHints => self.motif_wm_hints,
            Prop::Desktop | Prop::CurrentDesktop | Prop::NumberOfDesktops | Prop::FrameExtents => {
                AtomEnum::CARDINAL.into()
            }
        }
    }

    /// Reverse of [`Atoms::atom`], for property notifications.
    pub fn prop_of(&self, atom: Atom) -> Option<Prop> {
        const ALL: [Prop; 10] = [
            Prop::WmState,
            Prop::NormalHints,
            Prop::WmName,
            Prop::NetWmName,
            Prop::Desktop,
            Prop::CurrentDesktop,
            Prop::NumberOfDesktops,
            Prop::ActiveWindow,
            Prop::FrameExtents,
            Prop::MotifHints,
        ];
        ALL.into_iter().find(|&prop| self.atom(prop) == atom)
    }

    /// Advertise what we support on the root window
    pub fn setup_supported<C: Connection>(&self, conn: &C, root: Window) -> Result<()> {
        let supported = [
            self.net_supported,
            self.net_supporting_wm_check,
            self.net_number_of_desktops,
            self.net_current_desktop,
            self.net_active_window,
            self.net_wm_name,
            self.net_wm_desktop,
            self.net_frame_extents,
            self.net_wm_window_type,
            self.net_wm_window_type_normal,
            self.net_wm_window_type_dialog,
            self.net_wm_window_type_dock,
            self.net_wm_window_type_desktop,
            self.net_wm_window_type_splash,
            self.net_wm_window_type_notification,
            self.net_wm_window_type_tooltip,
            self.net_wm_window_type_menu,
        ];

        conn.change_property32(PropMode::REPLACE, root, self.net_supported, AtomEnum::ATOM, &supported)?;
        Ok(())
    }

    /// Point `_NET_SUPPORTING_WM_CHECK` at `owner` and name it.
    pub fn setup_wm_check<C: Connection>(&self, conn: &C, root: Window, owner: Window, name: &str) -> Result<()> {
        for window in [root, owner] {
            conn.change_property32(
                PropMode::REPLACE,
                window,
                self.net_supporting_wm_check,
                AtomEnum::WINDOW,
                &[owner],
            )?;
        }
        conn.change_property8(PropMode::REPLACE, owner, self.net_wm_name, self.utf8_string, name.as_bytes())?;
        Ok(())
    }

    /// Check if window supports WM_DELETE_WINDOW protocol
    pub fn supports_delete_protocol<C: Connection>(&self, conn: &C, window: Window) -> Result<bool> {
        if let Ok(reply) = conn
            .get_property(false, window, self.wm_protocols, AtomEnum::ATOM, 0, 1024)?
            .reply()
        {
            if let Some(mut value32) = reply.value32() {
                return Ok(value32.any(|atom| atom == self.wm_delete_window));
            }
        }
        Ok(false)
    }

    /// Send WM_DELETE_WINDOW message to close a window gracefully
    pub fn send_delete_window<C: Connection>(&self, conn: &C, window: Window) -> Result<()> {
        let event = ClientMessageEvent::new(
            32,
            window,
            self.wm_protocols,
            [self.wm_delete_window, x11rb::CURRENT_TIME, 0, 0, 0],
        );
        if let Err(e) = conn.send_event(false, window, EventMask::NO_EVENT, event) {
            // already gone is as good as closed
            debug!("Failed to send WM_DELETE_WINDOW to {}: {}", window, e);
        }
        Ok(())
    }

    /// First recognised `_NET_WM_WINDOW_TYPE` entry.
    pub fn get_window_kind<C: Connection>(&self, conn: &C, window: Window) -> Result<WindowKind> {
        let Ok(reply) = conn
            .get_property(false, window, self.net_wm_window_type, AtomEnum::ATOM, 0, 64)?
            .reply()
        else {
            return Ok(WindowKind::Normal);
        };
        let Some(types) = reply.value32() else {
            return Ok(WindowKind::Normal);
        };
        for atom in types {
            if let Some(kind) = self.classify(atom) {
                return Ok(kind);
            }
        }
        Ok(WindowKind::Normal)
    }

    fn classify(&self, atom: Atom) -> Option<WindowKind> {
        let kind = if atom == self.net_wm_window_type_normal {
            WindowKind::Normal
        } else if atom == self.net_wm_window_type_dialog {
            WindowKind::Dialog
        } else if atom == self.net_wm_window_type_dock {
            WindowKind::Dock
        } else if atom == self.net_wm_window_type_desktop {
            WindowKind::Desktop
        } else if atom == self.net_wm_window_type_splash {
            WindowKind::Splash
        } else if atom == self.net_wm_window_type_notification {
            WindowKind::Notification
        } else if atom == self.net_wm_window_type_tooltip {
            WindowKind::Tooltip
        } else if atom == self.net_wm_window_type_menu
            || atom == self.net_wm_window_type_dropdown_menu
            || atom == self.net_wm_window_type_popup_menu
        {
            WindowKind::Menu
        } else {
            return None;
        };
        Some(kind)
    }
}
