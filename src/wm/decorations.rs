//! Window decorations and geometry for Admiral
//!
//! `move_resize` is the only place a client's frame and content windows are
//! positioned. Layout is a pure function of the content rectangle and the
//! client's mode, so it can be checked without a server.

use anyhow::Result;
use tracing::{debug, trace};

use crate::config::DecorationConfig;
use crate::shared::Geometry;
use crate::wm::backend::{Prop, Window, WindowSystem};
use crate::wm::client::Client;
use crate::wm::client_flags::ClientFlags;
use crate::wm::workspace::DesktopMask;
use crate::wm::WindowManager;

/// Space between the title text and the frame edge
const TEXT_PADDING: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameMode {
    Normal,
    Undecorated,
    Shaded,
    Fullscreen,
}

impl FrameMode {
    pub fn of(client: &Client) -> Self {
        if client.fullscreen.is_some() {
            FrameMode::Fullscreen
        } else if client.is_undecorated() {
            FrameMode::Undecorated
        } else if client.is_shaded() {
            FrameMode::Shaded
        } else {
            FrameMode::Normal
        }
    }
}

/// Where the frame goes and where the content sits inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    /// Frame rectangle in root coordinates
    pub frame: Geometry,
    /// Content rectangle relative to the frame
    pub content: Geometry,
    /// X border width of the frame window
    pub border: u32,
    /// left, right, top, bottom
    pub extents: [u32; 4],
}

impl FrameLayout {
    /// `rect` is the absolute content rectangle.
    pub fn compute(rect: Geometry, mode: FrameMode, decor: &DecorationConfig) -> Self {
        let b = decor.border_width;
        let t = decor.title_height;
        let inner = Geometry::new(b as i32, t as i32, rect.width, rect.height);

        match mode {
            FrameMode::Fullscreen | FrameMode::Undecorated => Self {
                frame: rect,
                content: Geometry::new(0, 0, rect.width, rect.height),
                border: 0,
                extents: [0; 4],
            },
            FrameMode::Shaded => Self {
                frame: Geometry::new(rect.x - b as i32, rect.y - t as i32, rect.width + 2 * b, t),
                content: inner,
                border: decor.frame_border,
                extents: [b, b, t, b],
            },
            FrameMode::Normal => Self {
                frame: Geometry::new(
                    rect.x - b as i32,
                    rect.y - t as i32,
                    rect.width + 2 * b,
                    rect.height + t + b,
                ),
                content: inner,
                border: decor.frame_border,
                extents: [b, b, t, b],
            },
        }
    }
}

/// `*` for sticky, otherwise the member desktop numbers.
pub fn desktop_indicator(mask: DesktopMask, count: u32) -> String {
    if mask.is_sticky() {
        return "*".to_string();
    }
    mask.indices(count)
        .map(|i| (i + 1).to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Longest prefix of `title` no wider than `room` pixels.
fn fit_title<W: WindowSystem>(backend: &W, title: &str, room: u32) -> Result<String> {
    if backend.text_width(title)? <= room {
        return Ok(title.to_string());
    }
    // byte offset just past each character; the last one is the whole title
    let ends: Vec<usize> = title.char_indices().map(|(i, c)| i + c.len_utf8()).collect();
    let (mut lo, mut hi) = (0, ends.len() - 1);
    while lo < hi {
        let mid = (lo + hi + 1) / 2;
        if backend.text_width(&title[..ends[mid - 1]])? <= room {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    let cut = if lo == 0 { 0 } else { ends[lo - 1] };
    Ok(title[..cut].to_string())
}

impl<W: WindowSystem> WindowManager<W> {
    /// Places a client. Returns the content rectangle that was applied, or
    /// `None` when the handle is not a client.
    pub fn move_resize(&mut self, handle: Window, requested: Geometry) -> Result<Option<Geometry>> {
        let decor = &self.config.decorations;
        let Some(client) = self.registry.get_mut(handle) else {
            return Ok(None);
        };

        let rect = match &client.fullscreen {
            Some(monitor) => monitor.geometry(),
            None => {
                let (width, height) =
                    client.constraints.clamp(requested.width, requested.height, decor.min_size);
                Geometry::new(requested.x, requested.y, width, height)
            }
        };
        let layout = FrameLayout::compute(rect, FrameMode::of(client), decor);

        self.backend.move_resize_window(client.frame, layout.frame)?;
        self.backend.set_border_width(client.frame, layout.border)?;
        self.backend.move_resize_window(client.window, layout.content)?;
        self.backend.send_configure_notify(client.window, rect)?;

        // While fullscreen the stored rectangle is the one to restore.
        if client.fullscreen.is_none() {
            client.set_geometry(rect);
        }
        if client.frame_extents != Some(layout.extents) {
            client.frame_extents = Some(layout.extents);
            self.backend.set_cardinals(client.window, Prop::FrameExtents, &layout.extents)?;
        }

        trace!("Placed {} at {:?} (frame {:?})", client.window, rect, layout.frame);
        Ok(Some(rect))
    }

    /// Redraws the frame chrome. Frameless clients are left alone.
    pub fn draw_frame(&mut self, handle: Window, active: bool) -> Result<()> {
        let Some(client) = self.registry.get(handle) else {
            return Ok(());
        };
        if !client.has_chrome() {
            return Ok(());
        }

        let decor = &self.config.decorations;
        let colors = &self.config.colors;
        let layout = FrameLayout::compute(client.geometry(), FrameMode::of(client), decor);
        let frame = client.frame;
        let (w, h) = (layout.frame.width as i32, layout.frame.height as i32);
        let fill = if active { colors.active } else { colors.inactive };

        self.backend.fill_rectangle(frame, fill, Geometry::new(0, 0, layout.frame.width, layout.frame.height))?;

        // raised bevel around the frame
        self.backend.draw_line(frame, colors.bevel_light, (0, 0), (w - 1, 0))?;
        self.backend.draw_line(frame, colors.bevel_light, (0, 0), (0, h - 1))?;
        self.backend.draw_line(frame, colors.bevel_dark, (0, h - 1), (w - 1, h - 1))?;
        self.backend.draw_line(frame, colors.bevel_dark, (w - 1, 0), (w - 1, h - 1))?;

        // sunken bevel around the content
        if !client.is_shaded() {
            let c = layout.content;
            let (l, t, r, b) = (c.x - 1, c.y - 1, c.right(), c.bottom());
            self.backend.draw_line(frame, colors.bevel_dark, (l, t), (r, t))?;
            self.backend.draw_line(frame, colors.bevel_dark, (l, t), (l, b))?;
            self.backend.draw_line(frame, colors.bevel_light, (l, b), (r, b))?;
            self.backend.draw_line(frame, colors.bevel_light, (r, t), (r, b))?;
        }

        let ascent = self.backend.font_ascent() as i32;
        let baseline = (decor.title_height as i32 + ascent) / 2;
        let edge = decor.border_width as i32 + TEXT_PADDING;

        let indicator = desktop_indicator(client.desktop, self.config.behavior.desktop_count);
        let indicator_x = w - edge - self.backend.text_width(&indicator)? as i32;
        self.backend.draw_text(frame, colors.text, fill, (indicator_x, baseline), &indicator)?;

        let room = (indicator_x - TEXT_PADDING * 2 - edge).max(0) as u32;
        let title = fit_title(&self.backend, &client.title, room)?;
        self.backend.draw_text(frame, colors.text, fill, (edge, baseline), &title)?;
        Ok(())
    }

    /// Re-reads the title and redraws.
    pub fn update_name(&mut self, handle: Window) -> Result<()> {
        let Some(window) = self.registry.key_of(handle) else {
            return Ok(());
        };
        let title = self.read_title(window)?;
        if let Some(client) = self.registry.get_mut(window) {
            debug!("Window {} title: {:?}", window, title);
            client.title = title;
        }
        self.redraw(window)
    }

    /// Fills the monitor containing `point`, or restores the saved rectangle.
    pub fn toggle_fullscreen(&mut self, handle: Window, point: (i32, i32)) -> Result<()> {
        let monitor = self.screens.find_screen(point.0, point.1).clone();
        let Some(client) = self.registry.get_mut(handle) else {
            return Ok(());
        };
        client.fullscreen = match client.fullscreen {
            Some(_) => None,
            None => Some(monitor),
        };
        let (window, frame, geometry) = (client.window, client.frame, client.geometry());
        debug!("Window {} fullscreen: {}", window, client.fullscreen.is_some());

        self.move_resize(window, geometry)?;
        self.backend.raise_window(frame)?;
        self.redraw(window)
    }

    pub fn toggle_shade(&mut self, handle: Window) -> Result<()> {
        self.toggle_flag(handle, ClientFlags::SHADED)
    }

    pub fn toggle_decorations(&mut self, handle: Window) -> Result<()> {
        self.toggle_flag(handle, ClientFlags::UNDECORATED)
    }

    fn toggle_flag(&mut self, handle: Window, flag: ClientFlags) -> Result<()> {
        let Some(client) = self.registry.get_mut(handle) else {
            return Ok(());
        };
        client.flags.toggle(flag);
        let (window, geometry) = (client.window, client.geometry());
        self.move_resize(window, geometry)?;
        self.redraw(window)
    }
}
