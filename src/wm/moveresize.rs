//! MoveResize Module
//!
//! Interactive move and resize driven by modifier+button drags.
//!
//! Idle until a modified press lands on a client. Button 1 starts a move,
//! button 3 a resize from the edge or corner nearest the press. Motion
//! reshapes the client relative to the anchor; releasing the button that
//! started the drag ends it.

use anyhow::Result;
use tracing::{debug, trace};

use crate::shared::Geometry;
use crate::wm::backend::{CursorShape, Window, WindowSystem};
use crate::wm::events::{ButtonEvent, MotionEvent};
use crate::wm::hints::SizeConstraints;
use crate::wm::keyboard::{clean_modifiers, MOD_SHIFT, MOD_SUPER};
use crate::wm::WindowManager;

pub const BUTTON_PRIMARY: u8 = 1;
pub const BUTTON_MIDDLE: u8 = 2;
pub const BUTTON_SECONDARY: u8 = 3;
pub const BUTTON_WHEEL_UP: u8 = 4;
pub const BUTTON_WHEEL_DOWN: u8 = 5;

/// Which edges a resize drags; each factor is -1, 0 or 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Direction {
    pub hf: i32,
    pub vf: i32,
}

impl Direction {
    /// Splits each axis of `rect` into thirds around the press point.
    pub fn from_press(rect: Geometry, x: i32, y: i32) -> Self {
        Self {
            hf: factor(x - rect.x, rect.width),
            vf: factor(y - rect.y, rect.height),
        }
    }

    pub fn cursor(self) -> CursorShape {
        CursorShape::RESIZE[(4 + self.hf + 3 * self.vf) as usize]
    }
}

fn factor(offset: i32, extent: u32) -> i32 {
    if extent == 0 {
        return 0;
    }
    (3 * offset / extent as i32 - 1).clamp(-1, 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    Move,
    Resize(Direction),
}

/// An in-progress drag, bound to the button that started it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    pub client: Window,
    pub button: u8,
    pub anchor: (i32, i32),
    pub start: Geometry,
    pub kind: DragKind,
}

impl DragSession {
    /// Rectangle for the pointer at `(x, y)`.
    pub fn target(&self, x: i32, y: i32, floor: u32, constraints: &SizeConstraints) -> Geometry {
        let dx = x - self.anchor.0;
        let dy = y - self.anchor.1;
        let s = self.start;

        match self.kind {
            DragKind::Move => Geometry::new(s.x + dx, s.y + dy, s.width, s.height),
            DragKind::Resize(dir) => {
                let raw_w = stretch(s.width, dx, dir.hf);
                let raw_h = stretch(s.height, dy, dir.vf);
                let (w, h) = constraints.snap(raw_w, raw_h);
                let (w, h) = constraints.clamp(w, h, floor);
                // the far edge stays put when the near edge is dragged
                let x = if dir.hf < 0 { s.right() - w as i32 } else { s.x };
                let y = if dir.vf < 0 { s.bottom() - h as i32 } else { s.y };
                Geometry::new(x, y, w, h)
            }
        }
    }
}

fn stretch(length: u32, delta: i32, factor: i32) -> u32 {
    let length = length as i32;
    let stretched = match factor {
        f if f < 0 => length - delta,
        f if f > 0 => length + delta,
        _ => length,
    };
    stretched.max(0) as u32
}

impl<W: WindowSystem> WindowManager<W> {
    pub fn button_press(&mut self, event: &ButtonEvent) -> Result<()> {
        if clean_modifiers(event.state) & MOD_SUPER != 0 {
            self.modified_press(event)
        } else {
            self.click_to_focus(event)
        }
    }

    fn modified_press(&mut self, event: &ButtonEvent) -> Result<()> {
        let target = if event.child != 0 { event.child } else { event.window };
        let Some(client) = self.registry.get(target) else {
            return Ok(());
        };
        let (window, frame, geometry) = (client.window, client.frame, client.geometry());
        let pointer = (event.root_x, event.root_y);

        match event.button {
            BUTTON_PRIMARY | BUTTON_SECONDARY if self.drag.is_some() => {
                trace!("Ignoring press of button {} during a drag", event.button);
            }
            BUTTON_PRIMARY => {
                self.backend.grab_pointer(CursorShape::Move)?;
                self.drag = Some(DragSession {
                    client: window,
                    button: event.button,
                    anchor: pointer,
                    start: geometry,
                    kind: DragKind::Move,
                });
                debug!("Moving {}", window);
            }
            BUTTON_SECONDARY => {
                let direction = Direction::from_press(geometry, pointer.0, pointer.1);
                self.backend.grab_pointer(direction.cursor())?;
                self.drag = Some(DragSession {
                    client: window,
                    button: event.button,
                    anchor: pointer,
                    start: geometry,
                    kind: DragKind::Resize(direction),
                });
                debug!("Resizing {} ({}, {})", window, direction.hf, direction.vf);
            }
            BUTTON_MIDDLE if clean_modifiers(event.state) & MOD_SHIFT != 0 => {
                self.backend.lower_window(frame)?;
            }
            BUTTON_MIDDLE | BUTTON_WHEEL_DOWN => self.backend.raise_window(frame)?,
            BUTTON_WHEEL_UP => self.backend.lower_window(frame)?,
            _ => {}
        }
        Ok(())
    }

    /// A plain click on a frame we hold a grab on: focus, then let the click
    /// through to the application.
    fn click_to_focus(&mut self, event: &ButtonEvent) -> Result<()> {
        if self.registry.contains(event.window) {
            self.focus(Some(event.window), None)?;
        }
        self.backend.replay_pointer()
    }

    pub fn motion(&mut self, event: &MotionEvent) -> Result<()> {
        let Some(drag) = self.drag else {
            return Ok(());
        };
        let Some(client) = self.registry.get(drag.client) else {
            return Ok(());
        };
        let target = drag.target(
            event.root_x,
            event.root_y,
            self.config.decorations.min_size,
            &client.constraints,
        );
        self.move_resize(drag.client, target)?;
        Ok(())
    }

    pub fn button_release(&mut self, event: &ButtonEvent) -> Result<()> {
        match self.drag {
            Some(drag) if drag.button == event.button => {
                self.drag = None;
                self.backend.ungrab_pointer()?;
                debug!("Drag of {} finished", drag.client);
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wm::testing::{manager, map_client, Request};

    fn press(window: Window, child: Window, button: u8, state: u16, x: i32, y: i32) -> ButtonEvent {
        ButtonEvent { window, child, button, state, root_x: x, root_y: y }
    }

    fn drag_client() -> (WindowManager<crate::wm::testing::FakeDisplay>, Window, Window) {
        let mut wm = manager();
        let w = map_client(&mut wm, 10, Geometry::new(100, 100, 300, 200));
        let frame = wm.backend.frame_of(w);
        (wm, w, frame)
    }

    #[test]
    fn test_direction_zones() {
        let rect = Geometry::new(100, 100, 300, 200);
        assert_eq!(Direction::from_press(rect, 250, 100), Direction { hf: 0, vf: -1 });
        assert_eq!(Direction::from_press(rect, 101, 101), Direction { hf: -1, vf: -1 });
        assert_eq!(Direction::from_press(rect, 399, 299), Direction { hf: 1, vf: 1 });
        assert_eq!(Direction::from_press(rect, 250, 200), Direction { hf: 0, vf: 0 });
        // presses on the title strip count as the top edge
        assert_eq!(Direction::from_press(rect, 250, 85).vf, -1);
        assert_eq!(Direction { hf: 0, vf: -1 }.cursor(), CursorShape::Top);
        assert_eq!(Direction { hf: 0, vf: 0 }.cursor(), CursorShape::Circle);
        assert_eq!(Direction { hf: 1, vf: 1 }.cursor(), CursorShape::BottomRight);
    }

    #[test]
    fn test_top_edge_resize_moves_only_y() {
        let (mut wm, w, frame) = drag_client();
        wm.button_press(&press(wm.backend.root(), frame, 3, MOD_SUPER, 250, 100)).unwrap();
        assert!(wm.backend.requests.contains(&Request::GrabPointer(CursorShape::Top)));

        wm.motion(&MotionEvent { root_x: 260, root_y: 130 }).unwrap();
        assert_eq!(wm.registry.get(w).unwrap().geometry(), Geometry::new(100, 130, 300, 170));

        wm.motion(&MotionEvent { root_x: 240, root_y: 60 }).unwrap();
        assert_eq!(wm.registry.get(w).unwrap().geometry(), Geometry::new(100, 60, 300, 240));
    }

    #[test]
    fn test_resize_is_floored_with_far_edge_fixed() {
        let (mut wm, w, frame) = drag_client();
        wm.button_press(&press(wm.backend.root(), frame, 3, MOD_SUPER, 101, 101)).unwrap();
        wm.motion(&MotionEvent { root_x: 500, root_y: 101 }).unwrap();
        let g = wm.registry.get(w).unwrap().geometry();
        assert_eq!(g.width, 15);
        assert_eq!(g.right(), 400);
        assert_eq!(g.height, 200);
    }

    #[test]
    fn test_near_edge_resize_respects_min_width_hint() {
        let (mut wm, w, frame) = drag_client();
        wm.registry.get_mut(w).unwrap().constraints =
            SizeConstraints { min_width: 200, ..SizeConstraints::default() };
        wm.button_press(&press(wm.backend.root(), frame, 3, MOD_SUPER, 101, 200)).unwrap();
        wm.motion(&MotionEvent { root_x: 351, root_y: 200 }).unwrap();

        let g = wm.registry.get(w).unwrap().geometry();
        assert_eq!(g, Geometry::new(200, 100, 200, 200));
        assert_eq!(g.right(), 400);
    }

    #[test]
    fn test_far_edge_resize_grows_size_only() {
        let (mut wm, w, frame) = drag_client();
        wm.button_press(&press(wm.backend.root(), frame, 3, MOD_SUPER, 399, 299)).unwrap();
        wm.motion(&MotionEvent { root_x: 419, root_y: 309 }).unwrap();
        assert_eq!(wm.registry.get(w).unwrap().geometry(), Geometry::new(100, 100, 320, 210));
    }

    #[test]
    fn test_move_follows_pointer() {
        let (mut wm, w, frame) = drag_client();
        wm.button_press(&press(wm.backend.root(), frame, 1, MOD_SUPER, 150, 150)).unwrap();
        wm.motion(&MotionEvent { root_x: 100, root_y: 170 }).unwrap();
        assert_eq!(wm.registry.get(w).unwrap().geometry(), Geometry::new(50, 120, 300, 200));
    }

    #[test]
    fn test_release_of_other_button_keeps_session() {
        let (mut wm, w, frame) = drag_client();
        wm.button_press(&press(wm.backend.root(), frame, 1, MOD_SUPER, 150, 150)).unwrap();
        wm.button_release(&press(wm.backend.root(), frame, 3, MOD_SUPER, 150, 150)).unwrap();
        assert!(wm.drag.is_some());

        wm.button_release(&press(wm.backend.root(), frame, 1, MOD_SUPER, 150, 150)).unwrap();
        assert!(wm.drag.is_none());
        assert_eq!(wm.backend.requests.last(), Some(&Request::UngrabPointer));

        // motion after release changes nothing
        wm.motion(&MotionEvent { root_x: 0, root_y: 0 }).unwrap();
        assert_eq!(wm.registry.get(w).unwrap().geometry(), Geometry::new(100, 100, 300, 200));
    }

    #[test]
    fn test_destroyed_client_ends_drag() {
        let (mut wm, w, frame) = drag_client();
        wm.button_press(&press(wm.backend.root(), frame, 1, MOD_SUPER, 150, 150)).unwrap();
        wm.destroy(w).unwrap();
        assert!(wm.drag.is_none());
        wm.motion(&MotionEvent { root_x: 10, root_y: 10 }).unwrap();
    }

    #[test]
    fn test_plain_click_focuses_and_replays() {
        let (mut wm, w, frame) = drag_client();
        wm.button_press(&press(frame, w, 1, 0, 150, 150)).unwrap();
        assert_eq!(wm.focused(), Some(w));
        assert_eq!(wm.backend.requests.last(), Some(&Request::Replay));
        assert!(wm.drag.is_none());
    }

    #[test]
    fn test_middle_button_raises_and_lowers() {
        let (mut wm, _, frame) = drag_client();
        let root = wm.backend.root();
        wm.button_press(&press(root, frame, 2, MOD_SUPER, 150, 150)).unwrap();
        assert_eq!(wm.backend.requests.last(), Some(&Request::Raise(frame)));
        wm.button_press(&press(root, frame, 2, MOD_SUPER | MOD_SHIFT, 150, 150)).unwrap();
        assert_eq!(wm.backend.requests.last(), Some(&Request::Lower(frame)));
    }
}
