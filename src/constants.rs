//! Application constants and default values for backlightr.

/// Property atom names probed on each output, in preference order. The
/// mixed-case name is what current drivers advertise; the upper-case name
/// is the legacy spelling some older drivers still use.
pub const BACKLIGHT_ATOM_NAMES: [&str; 2] = ["Backlight", "BACKLIGHT"];

/// Default frames per second for fades.
pub const DEFAULT_FPS: f64 = 30.0;

/// Default fade time in milliseconds.
pub const DEFAULT_FADE_TIME_MS: f64 = 200.0;

/// Upper bound on the fade time in milliseconds (24 hours). Keeps the
/// parsed value inside the domain `Duration::from_secs_f64` accepts.
pub const MAX_FADE_TIME_MS: f64 = 86_400_000.0;

/// Minimum RandR version the output-property mechanism needs.
pub const REQUIRED_RANDR_VERSION: (u32, u32) = (1, 2);
