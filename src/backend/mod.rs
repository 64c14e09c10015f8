//! Backend abstraction over the display server session.
//!
//! The resolver and the fade engine only talk to the display server through
//! the `BacklightBackend` trait: screen-root enumeration, output
//! enumeration, backlight property reads, range metadata queries and
//! batched property writes. The real implementation speaks RandR over an
//! x11rb connection; tests use a deterministic in-memory implementation.

use anyhow::Result;
use x11rb::protocol::xproto::Atom;

pub mod x11;

#[cfg(any(test, feature = "testing-support"))]
pub mod fake;

pub use x11::X11Backend;

/// Narrow interface over the session and its resize-and-rotate extension.
///
/// Method errors are transport-level failures and propagate; a property
/// that merely doesn't match the expected shape is reported as `None` so
/// callers can skip the output silently.
pub trait BacklightBackend {
    /// Backlight atoms known to this session, in preference order.
    ///
    /// Interned once at session open; empty only for test doubles, since a
    /// real session fails to open when no backlight atom exists.
    fn candidate_atoms(&self) -> &[Atom];

    /// Every screen root known to the session.
    fn screen_roots(&self) -> Vec<u32>;

    /// Output resources attached to one screen root.
    fn outputs(&mut self, root: u32) -> Result<Vec<u32>>;

    /// Read the current backlight level of `output` under `atom`.
    ///
    /// Returns `Ok(None)` when the property exists but is not an
    /// integer-typed, single-item, 32-bit value (or is absent entirely).
    fn current_level(&mut self, output: u32, atom: Atom) -> Result<Option<i32>>;

    /// Query the declared valid range of the backlight property.
    ///
    /// Returns `Ok(None)` unless the server reports a bounded two-element
    /// range.
    fn level_range(&mut self, output: u32, atom: Atom) -> Result<Option<(i32, i32)>>;

    /// Queue a backlight property write. Not visible until `flush`.
    fn set_level(&mut self, output: u32, atom: Atom, value: i32) -> Result<()>;

    /// Flush queued writes to the server.
    fn flush(&mut self) -> Result<()>;
}
