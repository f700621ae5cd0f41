//! Hints Module
//!
//! Size hints (`WM_NORMAL_HINTS`) and Motif decoration hints. Absent or
//! short properties are never an error; they fall back to permissive
//! defaults.

use anyhow::Result;
use tracing::debug;

use crate::wm::backend::{Prop, Window, WindowSystem};

const P_MIN_SIZE: u32 = 1 << 4;
const P_MAX_SIZE: u32 = 1 << 5;
const P_RESIZE_INC: u32 = 1 << 8;
const P_BASE_SIZE: u32 = 1 << 9;

/// Largest size a client may ask for when it states no maximum.
pub const UNBOUNDED: u32 = 10000;

/// Size hints (XSizeHints equivalent); only the fields the manager uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeHints {
    pub flags: u32,
    pub min_width: u32,
    pub min_height: u32,
    pub max_width: u32,
    pub max_height: u32,
    pub width_inc: u32,
    pub height_inc: u32,
    pub base_width: u32,
    pub base_height: u32,
}

impl SizeHints {
    /// Parses the 18 CARD32 values of `WM_NORMAL_HINTS`.
    pub fn from_values(values: &[u32]) -> Option<Self> {
        if values.len() < 17 {
            return None;
        }
        Some(Self {
            flags: values[0],
            min_width: values[5],
            min_height: values[6],
            max_width: values[7],
            max_height: values[8],
            width_inc: values[9],
            height_inc: values[10],
            base_width: values[15],
            base_height: values[16],
        })
    }
}

/// Per-client size limits after defaults are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeConstraints {
    pub min_width: u32,
    pub min_height: u32,
    pub max_width: u32,
    pub max_height: u32,
    pub base_width: u32,
    pub base_height: u32,
    pub width_inc: u32,
    pub height_inc: u32,
}

impl Default for SizeConstraints {
    fn default() -> Self {
        Self {
            min_width: 0,
            min_height: 0,
            max_width: UNBOUNDED,
            max_height: UNBOUNDED,
            base_width: 0,
            base_height: 0,
            width_inc: 1,
            height_inc: 1,
        }
    }
}

/// Hint fields are INT32 on the wire; negative values count as unset.
fn hint_value(raw: u32) -> Option<u32> {
    i32::try_from(raw).ok().map(|value| (value as u32).min(UNBOUNDED))
}

impl SizeConstraints {
    pub fn from_hints(hints: Option<SizeHints>) -> Self {
        let mut c = Self::default();
        let Some(h) = hints else {
            return c;
        };

        if h.flags & P_MIN_SIZE != 0 {
            c.min_width = hint_value(h.min_width).unwrap_or(0);
            c.min_height = hint_value(h.min_height).unwrap_or(0);
        }
        if h.flags & P_MAX_SIZE != 0 {
            // zero means "no limit" in practice
            if let Some(width) = hint_value(h.max_width).filter(|&v| v > 0) {
                c.max_width = width;
            }
            if let Some(height) = hint_value(h.max_height).filter(|&v| v > 0) {
                c.max_height = height;
            }
        }
        if h.flags & P_BASE_SIZE != 0 {
            c.base_width = hint_value(h.base_width).unwrap_or(0);
            c.base_height = hint_value(h.base_height).unwrap_or(0);
        } else {
            c.base_width = c.min_width;
            c.base_height = c.min_height;
        }
        if h.flags & P_RESIZE_INC != 0 {
            c.width_inc = hint_value(h.width_inc).unwrap_or(1).max(1);
            c.height_inc = hint_value(h.height_inc).unwrap_or(1).max(1);
        }
        c
    }

    /// Clamps to `[max(floor, min), max]`; the lower bound wins on conflict.
    pub fn clamp(&self, width: u32, height: u32, floor: u32) -> (u32, u32) {
        let lo_w = floor.max(self.min_width).min(UNBOUNDED);
        let lo_h = floor.max(self.min_height).min(UNBOUNDED);
        (
            width.min(self.max_width).max(lo_w),
            height.min(self.max_height).max(lo_h),
        )
    }

    /// Rounds a size down onto the `base + n * inc` grid.
    pub fn snap(&self, width: u32, height: u32) -> (u32, u32) {
        let snap = |value: u32, base: u32, inc: u32| {
            if value <= base || inc <= 1 {
                value
            } else {
                base + (value - base) / inc * inc
            }
        };
        (
            snap(width, self.base_width, self.width_inc),
            snap(height, self.base_height, self.height_inc),
        )
    }
}

/// MWM (Motif Window Manager) hints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotifWmHints {
    pub flags: u32,
    pub functions: u32,
    pub decorations: u32,
}

impl MotifWmHints {
    pub const MWM_HINTS_DECORATIONS: u32 = 1 << 1;
    pub const MWM_DECOR_ALL: u32 = 1 << 0;
    pub const MWM_DECOR_BORDER: u32 = 1 << 1;
    pub const MWM_DECOR_TITLE: u32 = 1 << 3;

    pub fn from_values(values: &[u32]) -> Option<Self> {
        if values.len() < 3 {
            return None;
        }
        Some(Self { flags: values[0], functions: values[1], decorations: values[2] })
    }

    /// `Some(false)` when the client explicitly asked for no chrome.
    pub fn wants_decorations(&self) -> Option<bool> {
        if self.flags & Self::MWM_HINTS_DECORATIONS == 0 {
            return None;
        }
        let wanted = Self::MWM_DECOR_ALL | Self::MWM_DECOR_BORDER | Self::MWM_DECOR_TITLE;
        Some(self.decorations & wanted != 0)
    }
}

pub fn read_size_constraints<W: WindowSystem>(backend: &W, window: Window) -> Result<SizeConstraints> {
    let hints = backend
        .get_cardinals(window, Prop::NormalHints)?
        .and_then(|values| SizeHints::from_values(&values));
    let constraints = SizeConstraints::from_hints(hints);
    debug!("Size constraints for {}: {:?}", window, constraints);
    Ok(constraints)
}

pub fn read_motif_hints<W: WindowSystem>(backend: &W, window: Window) -> Result<Option<MotifWmHints>> {
    Ok(backend
        .get_cardinals(window, Prop::MotifHints)?
        .and_then(|values| MotifWmHints::from_values(&values)))
}
