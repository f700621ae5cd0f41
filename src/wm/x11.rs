//! X11 backend
//!
//! Implements [`WindowSystem`] on an x11rb connection: becoming the window
//! manager, frame creation, drawing with the core font and translating
//! server events into [`WmEvent`]s.

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};
use x11rb::connection::Connection;
use x11rb::errors::{ConnectionError, ReplyError};
use x11rb::protocol::randr::ConnectionExt as _;
use x11rb::protocol::xproto::*;
use x11rb::protocol::{ErrorKind, Event};
use x11rb::rust_connection::RustConnection;
use x11rb::{COPY_DEPTH_FROM_PARENT, CURRENT_TIME, NONE};

use crate::config::{Config, FrameColors};
use crate::shared::Geometry;
use crate::wm::backend::{CursorShape, ExistingWindow, Prop, Window, WindowKind, WindowSystem};
use crate::wm::events::{ButtonEvent, ConfigureRequest, KeyEvent, MotionEvent, PropertyEvent, WmEvent};
use crate::wm::ewmh::Atoms;
use crate::wm::keyboard::KeySpec;
use crate::wm::screen::Monitor;

const WM_NAME: &str = "admiral";
const FALLBACK_FONT: &str = "fixed";
const REPLACE_TIMEOUT: Duration = Duration::from_secs(15);

/// Caps Lock and Num Lock, grabbed in every combination
const LOCK_MASKS: [u16; 4] = [0, 1 << 1, 1 << 4, (1 << 1) | (1 << 4)];

fn frame_events() -> EventMask {
    EventMask::BUTTON_PRESS
        | EventMask::BUTTON_RELEASE
        | EventMask::EXPOSURE
        | EventMask::ENTER_WINDOW
        | EventMask::SUBSTRUCTURE_NOTIFY
        | EventMask::SUBSTRUCTURE_REDIRECT
}

pub struct X11Backend {
    conn: RustConnection,
    root: Window,
    size: (u32, u32),
    atoms: Atoms,
    /// Holds the `WM_S<n>` selection for as long as we run
    owner: Window,
    gc: Gcontext,
    font: Font,
    ascent: u32,
    cursors: HashMap<CursorShape, Cursor>,
    keymap: HashMap<Keycode, u32>,
    colors: FrameColors,
}

impl X11Backend {
    /// Connects to `$DISPLAY` and takes over window management on its
    /// default screen.
    pub fn connect(config: &Config, replace: bool) -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to X server")?;
        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;
        let size = (u32::from(screen.width_in_pixels), u32::from(screen.height_in_pixels));
        info!("Connected to X server, screen {}, root window {}", screen_num, root);

        let owner = become_wm(&conn, screen_num, root, replace)?;

        let atoms = Atoms::new(&conn)?;
        atoms.setup_supported(&conn, root)?;
        atoms.setup_wm_check(&conn, root, owner, WM_NAME)?;

        let cursors = create_cursors(&conn)?;
        let (font, ascent) = open_font(&conn, &config.decorations.font)?;

        let gc = conn.generate_id()?;
        conn.create_gc(
            gc,
            root,
            &CreateGCAux::new()
                .font(font)
                .foreground(config.colors.text)
                .graphics_exposures(0),
        )?;

        let keymap = load_keymap(&conn)?;

        conn.change_window_attributes(
            root,
            &ChangeWindowAttributesAux::new()
                .cursor(cursors[&CursorShape::Normal])
                .background_pixel(config.colors.root_background),
        )?;
        conn.clear_area(false, root, 0, 0, 0, 0)?;
        conn.flush()?;

        info!("Successfully became window manager");
        Ok(Self {
            conn,
            root,
            size,
            atoms,
            owner,
            gc,
            font,
            ascent,
            cursors,
            keymap,
            colors: config.colors.clone(),
        })
    }

    /// Connection socket, for readiness polling.
    pub fn raw_fd(&self) -> RawFd {
        self.conn.stream().as_raw_fd()
    }

    fn keycode_of(&self, keysym: u32) -> Option<Keycode> {
        self.keymap
            .iter()
            .filter(|&(_, &sym)| sym == keysym)
            .map(|(&code, _)| code)
            .min()
    }

    fn set_colors(&self, foreground: u32, background: Option<u32>) -> Result<()> {
        let mut aux = ChangeGCAux::new().foreground(foreground);
        if let Some(background) = background {
            aux = aux.background(background);
        }
        self.conn.change_gc(self.gc, &aux)?;
        Ok(())
    }

    fn get_property(&self, window: Window, prop: Prop) -> Result<Option<GetPropertyReply>> {
        let atom = self.atoms.atom(prop);
        let cookie = self.conn.get_property(false, window, atom, AtomEnum::ANY, 0, 1024)?;
        match cookie.reply() {
            Ok(reply) if reply.type_ == u32::from(AtomEnum::NONE) => Ok(None),
            Ok(reply) => Ok(Some(reply)),
            Err(ReplyError::X11Error(e)) => {
                trace!("Reading {:?} of {} failed: {:?}", prop, window, e.error_kind);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn translate(&mut self, event: Event) -> Option<WmEvent> {
        let translated = match event {
            Event::ButtonPress(e) => WmEvent::ButtonPress(button_event(&e)),
            Event::ButtonRelease(e) => WmEvent::ButtonRelease(button_event(&e)),
            Event::MotionNotify(e) => WmEvent::Motion(MotionEvent {
                root_x: i32::from(e.root_x),
                root_y: i32::from(e.root_y),
            }),
            Event::ConfigureRequest(e) => {
                let has = |flag: ConfigWindow| e.value_mask.contains(flag);
                WmEvent::ConfigureRequest(ConfigureRequest {
                    window: e.window,
                    x: has(ConfigWindow::X).then_some(i32::from(e.x)),
                    y: has(ConfigWindow::Y).then_some(i32::from(e.y)),
                    width: has(ConfigWindow::WIDTH).then_some(u32::from(e.width)),
                    height: has(ConfigWindow::HEIGHT).then_some(u32::from(e.height)),
                })
            }
            Event::MapRequest(e) => WmEvent::MapRequest(e.window),
            Event::UnmapNotify(e) => WmEvent::Unmap(e.window),
            Event::DestroyNotify(e) => WmEvent::Destroy(e.window),
            Event::EnterNotify(e) if e.mode == NotifyMode::NORMAL => WmEvent::Enter(e.event),
            Event::PropertyNotify(e) => {
                let prop = self.atoms.prop_of(e.atom)?;
                WmEvent::PropertyChanged(PropertyEvent { window: e.window, prop: Some(prop) })
            }
            Event::Expose(e) if e.count == 0 => WmEvent::Expose(e.window),
            Event::KeyPress(e) => WmEvent::KeyPress(KeyEvent {
                keysym: self.keymap.get(&e.detail).copied().unwrap_or(0),
                state: u16::from(e.state),
                child: e.child,
                root_x: i32::from(e.root_x),
                root_y: i32::from(e.root_y),
            }),
            Event::MappingNotify(e) => {
                if e.request == Mapping::KEYBOARD {
                    match load_keymap(&self.conn) {
                        Ok(keymap) => self.keymap = keymap,
                        Err(err) => warn!("Failed to reload keyboard mapping: {:#}", err),
                    }
                }
                return None;
            }
            Event::Error(e) => {
                match e.error_kind {
                    // windows vanish between our request and the server's turn
                    ErrorKind::Window | ErrorKind::Drawable | ErrorKind::Match => {
                        trace!("X error {:?} from request {}", e.error_kind, e.major_opcode)
                    }
                    _ => warn!(
                        "X error {:?} (request {}.{}, value {:#x})",
                        e.error_kind, e.major_opcode, e.minor_opcode, e.bad_value
                    ),
                }
                return None;
            }
            _ => return None,
        };
        Some(translated)
    }
}

fn button_event(e: &ButtonPressEvent) -> ButtonEvent {
    ButtonEvent {
        window: e.event,
        child: e.child,
        button: e.detail,
        state: u16::from(e.state),
        root_x: i32::from(e.root_x),
        root_y: i32::from(e.root_y),
    }
}

/// Takes the `WM_S<n>` selection and redirects the root's substructure.
/// With `replace`, waits for the previous owner to let go.
fn become_wm(conn: &RustConnection, screen_num: usize, root: Window, replace: bool) -> Result<Window> {
    let screen = &conn.setup().roots[screen_num];
    let selection = conn
        .intern_atom(false, format!("WM_S{}", screen_num).as_bytes())?
        .reply()
        .context("Failed to intern WM selection atom")?
        .atom;

    let previous = conn
        .get_selection_owner(selection)?
        .reply()
        .context("Failed to get current WM selection owner")?
        .owner;
    if previous != NONE {
        if !replace {
            bail!(
                "Another window manager is already running (window 0x{:x}). \
                Use --replace to attempt to replace it.",
                previous
            );
        }
        info!("Existing WM detected (window 0x{:x}), attempting replace...", previous);
        conn.change_window_attributes(
            previous,
            &ChangeWindowAttributesAux::new().event_mask(EventMask::STRUCTURE_NOTIFY),
        )?;
    }

    let owner = conn.generate_id()?;
    conn.create_window(
        screen.root_depth,
        owner,
        root,
        -1000,
        -1000,
        1,
        1,
        0,
        WindowClass::INPUT_OUTPUT,
        0,
        &CreateWindowAux::new().override_redirect(1),
    )?;
    conn.set_selection_owner(owner, selection, CURRENT_TIME)?
        .check()
        .context("Failed to set WM selection owner")?;
    let now_owner = conn.get_selection_owner(selection)?.reply()?.owner;
    if now_owner != owner {
        bail!("Failed to acquire WM selection ownership (expected 0x{:x}, got 0x{:x})", owner, now_owner);
    }

    if previous != NONE {
        info!("Waiting for previous WM to exit...");
        let start = Instant::now();
        loop {
            if conn.get_window_attributes(previous)?.reply().is_err() {
                info!("Previous WM exited");
                break;
            }
            if start.elapsed() >= REPLACE_TIMEOUT {
                warn!("Timeout waiting for previous WM to exit, proceeding anyway");
                break;
            }
            std::thread::sleep(Duration::from_millis(100));
        }
    }

    conn.change_window_attributes(
        root,
        &ChangeWindowAttributesAux::new()
            .event_mask(EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY),
    )?
    .check()
    .context("Failed to select events on root window - is another WM running?")?;

    debug!("WM selection held by 0x{:x}", owner);
    Ok(owner)
}

fn create_cursors(conn: &RustConnection) -> Result<HashMap<CursorShape, Cursor>> {
    let font = conn.generate_id()?;
    conn.open_font(font, b"cursor")?
        .check()
        .context("Failed to open cursor font")?;

    let shapes = CursorShape::RESIZE.into_iter().chain([CursorShape::Move, CursorShape::Normal]);
    let mut cursors = HashMap::new();
    for shape in shapes {
        let cursor = conn.generate_id()?;
        let glyph = shape.glyph();
        conn.create_glyph_cursor(cursor, font, font, glyph, glyph + 1, 0, 0, 0, 0xffff, 0xffff, 0xffff)?;
        cursors.insert(shape, cursor);
    }
    conn.close_font(font)?;
    Ok(cursors)
}

/// Opens `name`, falling back to the server's `fixed` font.
fn open_font(conn: &RustConnection, name: &str) -> Result<(Font, u32)> {
    for candidate in [name, FALLBACK_FONT] {
        let font = conn.generate_id()?;
        match conn.open_font(font, candidate.as_bytes())?.check() {
            Ok(()) => {
                let info = conn.query_font(font)?.reply()?;
                debug!("Using font {:?} (ascent {})", candidate, info.font_ascent);
                return Ok((font, info.font_ascent.max(0) as u32));
            }
            Err(e) => warn!("Failed to open font {:?}: {}", candidate, e),
        }
    }
    bail!("No usable font (tried {:?} and {:?})", name, FALLBACK_FONT)
}

/// First keysym of every keycode.
fn load_keymap(conn: &RustConnection) -> Result<HashMap<Keycode, u32>> {
    let setup = conn.setup();
    let (min, max) = (setup.min_keycode, setup.max_keycode);
    let reply = conn
        .get_keyboard_mapping(min, max - min + 1)?
        .reply()
        .context("Failed to read keyboard mapping")?;
    let per_keycode = usize::from(reply.keysyms_per_keycode).max(1);

    let keymap = reply
        .keysyms
        .chunks(per_keycode)
        .enumerate()
        .filter_map(|(i, syms)| {
            let sym = *syms.first()?;
            (sym != 0).then_some((min.wrapping_add(i as u8), sym))
        })
        .collect();
    Ok(keymap)
}

fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .take(255)
        .collect()
}

impl WindowSystem for X11Backend {
    fn root(&self) -> Window {
        self.root
    }

    fn display_size(&self) -> (u32, u32) {
        self.size
    }

    fn monitors(&self) -> Result<Vec<Monitor>> {
        let cookie = match self.conn.randr_get_monitors(self.root, true) {
            Ok(cookie) => cookie,
            Err(ConnectionError::UnsupportedExtension) => {
                warn!("RandR is not available");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        let reply = match cookie.reply() {
            Ok(reply) => reply,
            Err(ReplyError::X11Error(e)) => {
                warn!("RandR monitor query failed: {:?}", e.error_kind);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut monitors = Vec::with_capacity(reply.monitors.len());
        for info in reply.monitors {
            let name = match self.conn.get_atom_name(info.name)?.reply() {
                Ok(name) => String::from_utf8_lossy(&name.name).into_owned(),
                Err(_) => format!("monitor-{}", monitors.len()),
            };
            monitors.push(Monitor {
                x: i32::from(info.x),
                y: i32::from(info.y),
                width: u32::from(info.width),
                height: u32::from(info.height),
                name,
                primary: info.primary,
            });
        }
        Ok(monitors)
    }

    fn existing_windows(&self) -> Result<Vec<ExistingWindow>> {
        let tree = self.conn.query_tree(self.root)?.reply()?;
        let mut existing = Vec::new();
        for window in tree.children {
            if window == self.owner {
                continue;
            }
            let Ok(attrs) = self.conn.get_window_attributes(window)?.reply() else {
                continue;
            };
            if attrs.override_redirect || attrs.map_state != MapState::VIEWABLE {
                continue;
            }
            let Ok(geom) = self.conn.get_geometry(window)?.reply() else {
                continue;
            };
            existing.push(ExistingWindow {
                window,
                geometry: Geometry::new(
                    i32::from(geom.x),
                    i32::from(geom.y),
                    u32::from(geom.width),
                    u32::from(geom.height),
                ),
            });
        }
        Ok(existing)
    }

    fn create_frame(&mut self, content: Window, inset: (i32, i32)) -> Result<Window> {
        let frame = self.conn.generate_id()?;
        self.conn.create_window(
            COPY_DEPTH_FROM_PARENT,
            frame,
            self.root,
            0,
            0,
            1,
            1,
            0,
            WindowClass::INPUT_OUTPUT,
            0,
            &CreateWindowAux::new()
                .event_mask(frame_events())
                .background_pixel(self.colors.inactive)
                .border_pixel(self.colors.frame_border)
                .cursor(self.cursors[&CursorShape::Normal]),
        )?;
        self.conn.change_save_set(SetMode::INSERT, content)?;
        self.conn.reparent_window(content, frame, inset.0 as i16, inset.1 as i16)?;
        self.conn.change_window_attributes(
            content,
            &ChangeWindowAttributesAux::new().event_mask(EventMask::PROPERTY_CHANGE),
        )?;
        trace!("Created frame {} for {}", frame, content);
        Ok(frame)
    }

    fn reparent_to_root(&mut self, content: Window, position: (i32, i32)) -> Result<()> {
        self.conn.reparent_window(content, self.root, position.0 as i16, position.1 as i16)?;
        self.conn.change_save_set(SetMode::DELETE, content)?;
        Ok(())
    }

    fn destroy_window(&mut self, window: Window) -> Result<()> {
        self.conn.destroy_window(window)?;
        Ok(())
    }

    fn move_resize_window(&mut self, window: Window, geometry: Geometry) -> Result<()> {
        self.conn.configure_window(
            window,
            &ConfigureWindowAux::new()
                .x(geometry.x)
                .y(geometry.y)
                .width(geometry.width.max(1))
                .height(geometry.height.max(1)),
        )?;
        Ok(())
    }

    fn set_border_width(&mut self, window: Window, width: u32) -> Result<()> {
        self.conn
            .configure_window(window, &ConfigureWindowAux::new().border_width(width))?;
        Ok(())
    }

    fn map_window(&mut self, window: Window) -> Result<()> {
        self.conn.map_window(window)?;
        Ok(())
    }

    fn unmap_window(&mut self, window: Window) -> Result<()> {
        self.conn.unmap_window(window)?;
        Ok(())
    }

    fn raise_window(&mut self, window: Window) -> Result<()> {
        self.conn
            .configure_window(window, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))?;
        Ok(())
    }

    fn lower_window(&mut self, window: Window) -> Result<()> {
        self.conn
            .configure_window(window, &ConfigureWindowAux::new().stack_mode(StackMode::BELOW))?;
        Ok(())
    }

    fn is_viewable(&self, window: Window) -> Result<bool> {
        match self.conn.get_window_attributes(window)?.reply() {
            Ok(attrs) => Ok(attrs.map_state == MapState::VIEWABLE),
            Err(ReplyError::X11Error(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn send_configure_notify(&mut self, window: Window, geometry: Geometry) -> Result<()> {
        let event = ConfigureNotifyEvent {
            response_type: CONFIGURE_NOTIFY_EVENT,
            sequence: 0,
            event: window,
            window,
            above_sibling: NONE,
            x: geometry.x as i16,
            y: geometry.y as i16,
            width: geometry.width as u16,
            height: geometry.height as u16,
            border_width: 0,
            override_redirect: false,
        };
        self.conn.send_event(false, window, EventMask::STRUCTURE_NOTIFY, event)?;
        Ok(())
    }

    fn set_input_focus(&mut self, window: Window) -> Result<()> {
        self.conn.set_input_focus(InputFocus::POINTER_ROOT, window, CURRENT_TIME)?;
        Ok(())
    }

    fn close_window(&mut self, window: Window) -> Result<()> {
        if self.atoms.supports_delete_protocol(&self.conn, window)? {
            debug!("Asking {} to close", window);
            self.atoms.send_delete_window(&self.conn, window)
        } else {
            debug!("{} does not speak WM_DELETE_WINDOW, killing it", window);
            self.kill_client(window)
        }
    }

    fn kill_client(&mut self, window: Window) -> Result<()> {
        self.conn.kill_client(window)?;
        Ok(())
    }

    fn query_pointer(&self) -> Result<(i32, i32)> {
        let reply = self.conn.query_pointer(self.root)?.reply()?;
        Ok((i32::from(reply.root_x), i32::from(reply.root_y)))
    }

    fn grab_pointer(&mut self, cursor: CursorShape) -> Result<()> {
        let reply = self
            .conn
            .grab_pointer(
                false,
                self.root,
                EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                NONE,
                self.cursors[&cursor],
                CURRENT_TIME,
            )?
            .reply()?;
        if reply.status != GrabStatus::SUCCESS {
            warn!("Pointer grab failed: {:?}", reply.status);
        }
        Ok(())
    }

    fn ungrab_pointer(&mut self) -> Result<()> {
        self.conn.ungrab_pointer(CURRENT_TIME)?;
        Ok(())
    }

    fn grab_focus_click(&mut self, frame: Window) -> Result<()> {
        self.conn.grab_button(
            false,
            frame,
            EventMask::BUTTON_PRESS,
            GrabMode::SYNC,
            GrabMode::ASYNC,
            NONE,
            NONE,
            ButtonIndex::M1,
            ModMask::ANY,
        )?;
        Ok(())
    }

    fn release_focus_click(&mut self, frame: Window) -> Result<()> {
        self.conn.ungrab_button(ButtonIndex::M1, frame, ModMask::ANY)?;
        Ok(())
    }

    fn replay_pointer(&mut self) -> Result<()> {
        self.conn.allow_events(Allow::REPLAY_POINTER, CURRENT_TIME)?;
        Ok(())
    }

    fn grab_key(&mut self, key: KeySpec) -> Result<()> {
        let Some(keycode) = self.keycode_of(key.keysym) else {
            warn!("No keycode for keysym {:#x}, binding disabled", key.keysym);
            return Ok(());
        };
        for lock in LOCK_MASKS {
            self.conn.grab_key(
                true,
                self.root,
                ModMask::from(key.modifiers | lock),
                keycode,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
            )?;
        }
        Ok(())
    }

    fn grab_modifier_buttons(&mut self, modifiers: u16) -> Result<()> {
        for lock in LOCK_MASKS {
            self.conn.grab_button(
                false,
                self.root,
                EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                NONE,
                NONE,
                ButtonIndex::ANY,
                ModMask::from(modifiers | lock),
            )?;
        }
        Ok(())
    }

    fn get_cardinals(&self, window: Window, prop: Prop) -> Result<Option<Vec<u32>>> {
        let values = self
            .get_property(window, prop)?
            .and_then(|reply| reply.value32().map(|values| values.collect()));
        Ok(values)
    }

    fn set_cardinals(&mut self, window: Window, prop: Prop, values: &[u32]) -> Result<()> {
        use x11rb::wrapper::ConnectionExt as _;
        self.conn.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms.atom(prop),
            self.atoms.type_of(prop),
            values,
        )?;
        Ok(())
    }

    fn get_text(&self, window: Window, prop: Prop) -> Result<Option<String>> {
        let text = self.get_property(window, prop)?.filter(|reply| reply.format == 8).map(|reply| {
            let value = String::from_utf8_lossy(&reply.value);
            value.trim_end_matches('\0').to_string()
        });
        Ok(text)
    }

    fn window_kind(&self, window: Window) -> Result<WindowKind> {
        self.atoms.get_window_kind(&self.conn, window)
    }

    fn fill_rectangle(&mut self, window: Window, color: u32, area: Geometry) -> Result<()> {
        self.set_colors(color, None)?;
        self.conn.poly_fill_rectangle(
            window,
            self.gc,
            &[Rectangle {
                x: area.x as i16,
                y: area.y as i16,
                width: area.width as u16,
                height: area.height as u16,
            }],
        )?;
        Ok(())
    }

    fn draw_line(&mut self, window: Window, color: u32, from: (i32, i32), to: (i32, i32)) -> Result<()> {
        self.set_colors(color, None)?;
        self.conn.poly_line(
            CoordMode::ORIGIN,
            window,
            self.gc,
            &[
                Point { x: from.0 as i16, y: from.1 as i16 },
                Point { x: to.0 as i16, y: to.1 as i16 },
            ],
        )?;
        Ok(())
    }

    fn draw_text(&mut self, window: Window, color: u32, background: u32, origin: (i32, i32), text: &str) -> Result<()> {
        self.set_colors(color, Some(background))?;
        self.conn
            .image_text8(window, self.gc, origin.0 as i16, origin.1 as i16, &latin1(text))?;
        Ok(())
    }

    fn text_width(&self, text: &str) -> Result<u32> {
        let chars: Vec<Char2b> = latin1(text).into_iter().map(|b| Char2b { byte1: 0, byte2: b }).collect();
        let reply = self.conn.query_text_extents(self.font, &chars)?.reply()?;
        Ok(reply.overall_width.max(0) as u32)
    }

    fn font_ascent(&self) -> u32 {
        self.ascent
    }

    fn poll_event(&mut self) -> Result<Option<WmEvent>> {
        while let Some(event) = self.conn.poll_for_event()? {
            if let Some(translated) = self.translate(event) {
                return Ok(Some(translated));
            }
        }
        Ok(None)
    }

    fn flush(&mut self) -> Result<()> {
        self.conn.flush()?;
        Ok(())
    }
}
