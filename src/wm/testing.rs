//! In-memory display used by the unit tests. Records every request and
//! answers queries from plain maps the tests can seed.

use anyhow::Result;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::config::Config;
use crate::shared::Geometry;
use crate::wm::backend::{CursorShape, ExistingWindow, Prop, Window, WindowKind, WindowSystem};
use crate::wm::events::WmEvent;
use crate::wm::keyboard::KeySpec;
use crate::wm::screen::Monitor;
use crate::wm::WindowManager;

const ROOT: Window = 1;
const FIRST_FRAME: Window = 0x1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    CreateFrame(Window, Window),
    ReparentToRoot(Window, (i32, i32)),
    Destroy(Window),
    MoveResize(Window, Geometry),
    Border(Window, u32),
    Map(Window),
    Unmap(Window),
    Raise(Window),
    Lower(Window),
    ConfigureNotify(Window, Geometry),
    InputFocus(Window),
    Close(Window),
    Kill(Window),
    GrabPointer(CursorShape),
    UngrabPointer,
    GrabClick(Window),
    ReleaseClick(Window),
    Replay,
    GrabKey(KeySpec),
    GrabButtons(u16),
    SetProp(Window, Prop, Vec<u32>),
    Fill(Window, u32, Geometry),
    Line(Window, u32, (i32, i32), (i32, i32)),
    Text(Window, String),
}

#[derive(Debug, Default)]
pub struct FakeDisplay {
    pub requests: Vec<Request>,
    pub props: HashMap<(Window, Prop), Vec<u32>>,
    pub titles: HashMap<(Window, Prop), String>,
    pub kinds: HashMap<Window, WindowKind>,
    pub monitors: Vec<Monitor>,
    pub pointer: (i32, i32),
    pub events: VecDeque<WmEvent>,
    pub existing: Vec<ExistingWindow>,
    mapped: HashSet<Window>,
    /// content -> frame
    frames: HashMap<Window, Window>,
    next_frame: Window,
}

impl FakeDisplay {
    pub fn new(monitors: Vec<Monitor>) -> Self {
        Self { monitors, next_frame: FIRST_FRAME, ..Default::default() }
    }

    pub fn frame_of(&self, content: Window) -> Window {
        self.frames.get(&content).copied().unwrap_or_default()
    }

    pub fn is_mapped(&self, window: Window) -> bool {
        self.mapped.contains(&window)
    }

    pub fn property(&self, window: Window, prop: Prop) -> Option<Vec<u32>> {
        self.props.get(&(window, prop)).cloned()
    }

    /// Geometry of the most recent move/resize of `window`.
    pub fn last_geometry(&self, window: Window) -> Option<Geometry> {
        self.requests.iter().rev().find_map(|r| match r {
            Request::MoveResize(w, g) if *w == window => Some(*g),
            _ => None,
        })
    }

    fn record(&mut self, request: Request) -> Result<()> {
        self.requests.push(request);
        Ok(())
    }
}

impl WindowSystem for FakeDisplay {
    fn root(&self) -> Window {
        ROOT
    }

    fn display_size(&self) -> (u32, u32) {
        (1000, 1000)
    }

    fn monitors(&self) -> Result<Vec<Monitor>> {
        Ok(self.monitors.clone())
    }

    fn existing_windows(&self) -> Result<Vec<ExistingWindow>> {
        Ok(self.existing.clone())
    }

    fn create_frame(&mut self, content: Window, _inset: (i32, i32)) -> Result<Window> {
        let frame = self.next_frame;
        self.next_frame += 1;
        self.frames.insert(content, frame);
        self.record(Request::CreateFrame(content, frame))?;
        Ok(frame)
    }

    fn reparent_to_root(&mut self, content: Window, position: (i32, i32)) -> Result<()> {
        self.frames.remove(&content);
        self.record(Request::ReparentToRoot(content, position))
    }

    fn destroy_window(&mut self, window: Window) -> Result<()> {
        self.mapped.remove(&window);
        self.record(Request::Destroy(window))
    }

    fn move_resize_window(&mut self, window: Window, geometry: Geometry) -> Result<()> {
        self.record(Request::MoveResize(window, geometry))
    }

    fn set_border_width(&mut self, window: Window, width: u32) -> Result<()> {
        self.record(Request::Border(window, width))
    }

    fn map_window(&mut self, window: Window) -> Result<()> {
        self.mapped.insert(window);
        self.record(Request::Map(window))
    }

    fn unmap_window(&mut self, window: Window) -> Result<()> {
        self.mapped.remove(&window);
        self.record(Request::Unmap(window))
    }

    fn raise_window(&mut self, window: Window) -> Result<()> {
        self.record(Request::Raise(window))
    }

    fn lower_window(&mut self, window: Window) -> Result<()> {
        self.record(Request::Lower(window))
    }

    /// Viewable means mapped with a mapped frame.
    fn is_viewable(&self, window: Window) -> Result<bool> {
        let frame_mapped = self.frames.get(&window).is_none_or(|frame| self.mapped.contains(frame));
        Ok(self.mapped.contains(&window) && frame_mapped)
    }

    fn send_configure_notify(&mut self, window: Window, geometry: Geometry) -> Result<()> {
        self.record(Request::ConfigureNotify(window, geometry))
    }

    fn set_input_focus(&mut self, window: Window) -> Result<()> {
        self.record(Request::InputFocus(window))
    }

    fn close_window(&mut self, window: Window) -> Result<()> {
        self.record(Request::Close(window))
    }

    fn kill_client(&mut self, window: Window) -> Result<()> {
        self.record(Request::Kill(window))
    }

    fn query_pointer(&self) -> Result<(i32, i32)> {
        Ok(self.pointer)
    }

    fn grab_pointer(&mut self, cursor: CursorShape) -> Result<()> {
        self.record(Request::GrabPointer(cursor))
    }

    fn ungrab_pointer(&mut self) -> Result<()> {
        self.record(Request::UngrabPointer)
    }

    fn grab_focus_click(&mut self, frame: Window) -> Result<()> {
        self.record(Request::GrabClick(frame))
    }

    fn release_focus_click(&mut self, frame: Window) -> Result<()> {
        self.record(Request::ReleaseClick(frame))
    }

    fn replay_pointer(&mut self) -> Result<()> {
        self.record(Request::Replay)
    }

    fn grab_key(&mut self, key: KeySpec) -> Result<()> {
        self.record(Request::GrabKey(key))
    }

    fn grab_modifier_buttons(&mut self, modifiers: u16) -> Result<()> {
        self.record(Request::GrabButtons(modifiers))
    }

    fn get_cardinals(&self, window: Window, prop: Prop) -> Result<Option<Vec<u32>>> {
        Ok(self.property(window, prop))
    }

    fn set_cardinals(&mut self, window: Window, prop: Prop, values: &[u32]) -> Result<()> {
        self.props.insert((window, prop), values.to_vec());
        self.record(Request::SetProp(window, prop, values.to_vec()))
    }

    fn get_text(&self, window: Window, prop: Prop) -> Result<Option<String>> {
        Ok(self.titles.get(&(window, prop)).cloned())
    }

    fn window_kind(&self, window: Window) -> Result<WindowKind> {
        Ok(self.kinds.get(&window).copied().unwrap_or_default())
    }

    fn fill_rectangle(&mut self, window: Window, color: u32, area: Geometry) -> Result<()> {
        self.record(Request::Fill(window, color, area))
    }

    fn draw_line(&mut self, window: Window, color: u32, from: (i32, i32), to: (i32, i32)) -> Result<()> {
        self.record(Request::Line(window, color, from, to))
    }

    fn draw_text(&mut self, window: Window, _color: u32, _background: u32, _origin: (i32, i32), text: &str) -> Result<()> {
        self.record(Request::Text(window, text.to_string()))
    }

    /// Six pixels per character.
    fn text_width(&self, text: &str) -> Result<u32> {
        Ok(text.chars().count() as u32 * 6)
    }

    fn font_ascent(&self) -> u32 {
        10
    }

    fn poll_event(&mut self) -> Result<Option<WmEvent>> {
        Ok(self.events.pop_front())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A manager over one 1000x1000 monitor with the request log cleared.
pub fn manager() -> WindowManager<FakeDisplay> {
    manager_with_monitors(vec![Monitor {
        x: 0,
        y: 0,
        width: 1000,
        height: 1000,
        name: "test".into(),
        primary: true,
    }])
}

pub fn manager_with_monitors(monitors: Vec<Monitor>) -> WindowManager<FakeDisplay> {
    let mut wm = WindowManager::new(FakeDisplay::new(monitors), Config::default()).unwrap();
    wm.backend.requests.clear();
    wm
}

/// Maps `window` the way a client would and moves it to `geometry`.
pub fn map_client(wm: &mut WindowManager<FakeDisplay>, window: Window, geometry: Geometry) -> Window {
    wm.map_request(window).unwrap();
    wm.move_resize(window, geometry).unwrap();
    window
}
