//! Types shared by the window manager modules.

pub mod window_state;

pub use window_state::Geometry;
