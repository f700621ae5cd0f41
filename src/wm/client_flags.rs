//! Client Flags
//!
//! Bitfield flags for per-client mode state.

use bitflags::bitflags;

bitflags! {
    /// Mode flags that steer frame layout and visibility
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ClientFlags: u32 {
        /// No frame chrome; frame and content share a rectangle
        const UNDECORATED = 1 << 0;
        /// Frame collapsed to the title strip
        const SHADED      = 1 << 1;
        /// The client asked to be shown (map request seen, no unmap since)
        const MAPPED      = 1 << 2;
    }
}
