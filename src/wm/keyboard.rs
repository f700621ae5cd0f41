//! Keyboard Module
//!
//! Key binding specs (`"M-S-c"`), the actions they trigger and the key-press
//! handler that runs them.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::wm::backend::{Window, WindowSystem};
use crate::wm::events::KeyEvent;
use crate::wm::WindowManager;

pub const MOD_SHIFT: u16 = 1 << 0;
pub const MOD_CONTROL: u16 = 1 << 2;
/// Mod1, usually Alt
pub const MOD_ALT: u16 = 1 << 3;
/// Mod4, usually Super; the window manager's own modifier
pub const MOD_SUPER: u16 = 1 << 6;

/// Strips lock-style modifiers (Caps Lock, Num Lock) from an event state.
pub fn clean_modifiers(state: u16) -> u16 {
    state & (MOD_SHIFT | MOD_CONTROL | MOD_ALT | MOD_SUPER)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeySpecError {
    #[error("empty key binding")]
    Empty,
    #[error("unknown modifier `{0}` in `{1}`")]
    UnknownModifier(char, String),
    #[error("unknown key name `{0}`")]
    UnknownKey(String),
}

/// A key plus the exact modifiers that must be held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub modifiers: u16,
    pub keysym: u32,
}

impl FromStr for KeySpec {
    type Err = KeySpecError;

    /// `[S-][C-][A-][M-]<keysym name>`
    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let mut rest = spec;
        let mut modifiers = 0;
        while rest.len() > 2 && rest.as_bytes()[1] == b'-' {
            modifiers |= match rest.as_bytes()[0] {
                b'S' => MOD_SHIFT,
                b'C' => MOD_CONTROL,
                b'A' => MOD_ALT,
                b'M' => MOD_SUPER,
                other => return Err(KeySpecError::UnknownModifier(other as char, spec.to_string())),
            };
            rest = &rest[2..];
        }
        if rest.is_empty() {
            return Err(KeySpecError::Empty);
        }
        let keysym = keysym_from_name(rest).ok_or_else(|| KeySpecError::UnknownKey(rest.to_string()))?;
        Ok(Self { modifiers, keysym })
    }
}

/// Keysym value for the names used in bindings.
pub fn keysym_from_name(name: &str) -> Option<u32> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphanumeric() {
            return Some(c as u32);
        }
    }
    if let Some(n) = name.strip_prefix('F').and_then(|n| n.parse::<u32>().ok()) {
        if (1..=24).contains(&n) {
            return Some(0xffbe + n - 1);
        }
    }
    let sym = match name {
        "space" => 0x0020,
        "comma" => 0x002c,
        "minus" => 0x002d,
        "period" => 0x002e,
        "slash" => 0x002f,
        "semicolon" => 0x003b,
        "equal" => 0x003d,
        "BackSpace" => 0xff08,
        "Tab" => 0xff09,
        "Return" => 0xff0d,
        "Escape" => 0xff1b,
        "Home" => 0xff50,
        "Left" => 0xff51,
        "Up" => 0xff52,
        "Right" => 0xff53,
        "Down" => 0xff54,
        "Prior" | "Page_Up" => 0xff55,
        "Next" | "Page_Down" => 0xff56,
        "End" => 0xff57,
        "Print" => 0xff61,
        "Delete" => 0xffff,
        _ => return None,
    };
    Some(sym)
}

/// What a key binding does. Desktop numbers count from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ViewDesktop(u32),
    SendToDesktop(u32),
    FlipDesktop(u32),
    FlipClientDesktop(u32),
    NextDesktop,
    PrevDesktop,
    /// `$TERMINAL`, or the configured terminal
    Terminal,
    Spawn(String),
    Close,
    Kill,
    Quit,
    ToggleFullscreen,
    ToggleShade,
    ToggleDecorations,
    ToggleSticky,
    Fill,
    Raise,
    Lower,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub key: KeySpec,
    pub action: Action,
}

/// Parses the configured bindings, plus the per-desktop digit bindings.
/// Invalid specs are logged and skipped.
pub fn build_bindings(config: &Config) -> Vec<Binding> {
    let mut bindings = Vec::new();

    if config.keybindings.desktop_bindings {
        for number in 1..=config.behavior.desktop_count.min(9) {
            let digit = keysym_from_name(&number.to_string()).unwrap_or(0);
            let mut add = |modifiers, action| {
                bindings.push(Binding { key: KeySpec { modifiers: MOD_SUPER | modifiers, keysym: digit }, action })
            };
            add(0, Action::ViewDesktop(number));
            add(MOD_SHIFT, Action::SendToDesktop(number));
            add(MOD_CONTROL, Action::FlipDesktop(number));
            add(MOD_CONTROL | MOD_SHIFT, Action::FlipClientDesktop(number));
        }
    }

    for (spec, action) in &config.keybindings.bindings {
        match spec.parse::<KeySpec>() {
            Ok(key) => {
                bindings.retain(|b: &Binding| b.key != key);
                bindings.push(Binding { key, action: action.clone() });
            }
            Err(e) => warn!("Skipping key binding {:?}: {}", spec, e),
        }
    }
    debug!("{} key bindings", bindings.len());
    bindings
}

impl<W: WindowSystem> WindowManager<W> {
    pub fn key_press(&mut self, event: &KeyEvent) -> Result<()> {
        let pressed = KeySpec { modifiers: clean_modifiers(event.state), keysym: event.keysym };
        let Some(action) = self.bindings.iter().find(|b| b.key == pressed).map(|b| b.action.clone()) else {
            return Ok(());
        };
        let target = self.registry.key_of(event.child).or(self.focused());
        debug!("Key {:?} -> {:?} (client {:?})", pressed, action, target);
        self.perform(action, target, (event.root_x, event.root_y))
    }

    /// Runs a bound action. Client actions without a client do nothing.
    pub fn perform(&mut self, action: Action, target: Option<Window>, pointer: (i32, i32)) -> Result<()> {
        match action {
            Action::ViewDesktop(n) => {
                if let Some(mask) = self.desktop_by_number(n) {
                    self.set_desktop(mask)?;
                }
            }
            Action::FlipDesktop(n) => {
                if let Some(mask) = self.desktop_by_number(n) {
                    self.flip_desktop(mask)?;
                }
            }
            Action::NextDesktop => self.next_desktop()?,
            Action::PrevDesktop => self.prev_desktop()?,
            Action::Terminal => {
                let terminal = std::env::var("TERMINAL")
                    .unwrap_or_else(|_| self.config.keybindings.terminal.clone());
                self.spawn(&terminal);
            }
            Action::Spawn(command) => self.spawn(&command),
            Action::Quit => {
                info!("Quit requested");
                self.running = false;
            }
            client_action => {
                let Some(window) = target else {
                    return Ok(());
                };
                self.perform_on_client(client_action, window, pointer)?;
            }
        }
        Ok(())
    }

    fn perform_on_client(&mut self, action: Action, window: Window, pointer: (i32, i32)) -> Result<()> {
        let Some(frame) = self.registry.get(window).map(|c| c.frame) else {
            return Ok(());
        };
        match action {
            Action::SendToDesktop(n) => {
                if let Some(mask) = self.desktop_by_number(n) {
                    self.set_client_desktop(window, mask)?;
                }
            }
            Action::FlipClientDesktop(n) => {
                if let Some(mask) = self.desktop_by_number(n) {
                    self.flip_client_desktop(window, mask)?;
                }
            }
            Action::Close => self.backend.close_window(window)?,
            Action::Kill => {
                self.backend.kill_client(window)?;
                self.destroy(window)?;
            }
            Action::ToggleFullscreen => self.toggle_fullscreen(window, pointer)?,
            Action::ToggleShade => self.toggle_shade(window)?,
            Action::ToggleDecorations => self.toggle_decorations(window)?,
            Action::ToggleSticky => self.toggle_sticky(window)?,
            Action::Fill => self.fill(window)?,
            Action::Raise => self.backend.raise_window(frame)?,
            Action::Lower => self.backend.lower_window(frame)?,
            other => debug!("{:?} does not act on a client", other),
        }
        Ok(())
    }

    fn spawn(&mut self, command: &str) {
        if let Err(e) = self.launcher.spawn(command) {
            warn!("Failed to launch {:?}: {:#}", command, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Geometry;
    use crate::wm::testing::{manager, map_client, Request};
    use crate::wm::workspace::DesktopMask;

    fn key(spec: &str) -> KeySpec {
        spec.parse().unwrap()
    }

    fn press(spec: &str, child: Window) -> KeyEvent {
        let k = key(spec);
        KeyEvent { keysym: k.keysym, state: k.modifiers, child, root_x: 10, root_y: 10 }
    }

    #[test]
    fn test_parse_specs() {
        assert_eq!(key("M-1"), KeySpec { modifiers: MOD_SUPER, keysym: 0x31 });
        assert_eq!(key("M-C-S-9"), KeySpec { modifiers: MOD_SUPER | MOD_CONTROL | MOD_SHIFT, keysym: 0x39 });
        assert_eq!(key("A-Tab"), KeySpec { modifiers: MOD_ALT, keysym: 0xff09 });
        assert_eq!(key("M-Prior").keysym, 0xff55);
        assert_eq!(key("M-F12").keysym, 0xffc9);
        assert_eq!(key("c"), KeySpec { modifiers: 0, keysym: 0x63 });
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<KeySpec>(), Err(KeySpecError::Empty));
        assert_eq!(
            "X-a".parse::<KeySpec>(),
            Err(KeySpecError::UnknownModifier('X', "X-a".to_string()))
        );
        assert_eq!("M-Hyper".parse::<KeySpec>(), Err(KeySpecError::UnknownKey("Hyper".to_string())));
    }

    #[test]
    fn test_lock_modifiers_are_ignored() {
        let caps_and_num_lock = (1 << 1) | (1 << 4);
        assert_eq!(clean_modifiers(MOD_SUPER | caps_and_num_lock), MOD_SUPER);
    }

    #[test]
    fn test_desktop_bindings_follow_desktop_count() {
        let mut config = Config::default();
        config.behavior.desktop_count = 4;
        let bindings = build_bindings(&config);
        assert!(bindings.contains(&Binding { key: key("M-4"), action: Action::ViewDesktop(4) }));
        assert!(!bindings.iter().any(|b| b.key == key("M-5")));
        assert!(bindings.contains(&Binding { key: key("M-C-S-2"), action: Action::FlipClientDesktop(2) }));
        assert!(bindings.contains(&Binding { key: key("M-m"), action: Action::Fill }));
    }

    #[test]
    fn test_key_press_switches_desktop() {
        let mut wm = manager();
        wm.key_press(&press("M-3", 0)).unwrap();
        assert_eq!(wm.current_desktop(), DesktopMask::single(2));
        wm.key_press(&press("M-period", 0)).unwrap();
        assert_eq!(wm.current_desktop(), DesktopMask::single(3));
        wm.key_press(&press("M-C-1", 0)).unwrap();
        assert_eq!(wm.current_desktop(), DesktopMask(0b1001));
    }

    #[test]
    fn test_key_press_acts_on_client_under_pointer() {
        let mut wm = manager();
        let w = map_client(&mut wm, 10, Geometry::new(0, 0, 100, 100));
        let frame = wm.backend.frame_of(w);
        wm.key_press(&press("M-S-2", frame)).unwrap();
        assert_eq!(wm.registry.get(w).unwrap().desktop, DesktopMask::single(1));

        wm.key_press(&press("M-c", frame)).unwrap();
        assert_eq!(wm.backend.requests.last(), Some(&Request::Close(w)));

        wm.key_press(&press("M-S-c", frame)).unwrap();
        assert!(wm.backend.requests.contains(&Request::Kill(w)));
        assert!(wm.registry.get(w).is_none());
    }

    #[test]
    fn test_key_press_falls_back_to_focused_client() {
        let mut wm = manager();
        let w = map_client(&mut wm, 10, Geometry::new(0, 0, 100, 100));
        wm.focus(Some(w), None).unwrap();
        wm.key_press(&press("M-c", 0)).unwrap();
        assert_eq!(wm.backend.requests.last(), Some(&Request::Close(w)));
    }

    #[test]
    fn test_unbound_key_and_missing_client_are_ignored() {
        let mut wm = manager();
        wm.key_press(&press("M-z", 0)).unwrap();
        wm.key_press(&press("M-m", 0)).unwrap();
        assert!(wm.backend.requests.is_empty());
        wm.key_press(&press("M-q", 0)).unwrap();
        assert!(!wm.is_running());
    }
}
