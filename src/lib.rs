//! # backlightr
//!
//! Gets or sets display backlight brightness through the X11 RandR
//! extension's output-property mechanism, fading smoothly to the requested
//! level with time-paced property writes.
//!
//! ## Architecture
//!
//! - **args**: Command-line parsing into strongly-typed parameters
//! - **backend**: The `BacklightBackend` seam over the X session (x11rb
//!   RandR implementation plus an in-memory fake for tests)
//! - **constants**: Atom names and fade defaults
//! - **fade**: Target computation and the time-paced fade loop
//! - **output**: Output identifiers, brightness ranges and output filters
//! - **report**: Stdout formatting of readings and results
//! - **request**: The `[prefix][number][suffix]` brightness expression
//! - **resolver**: Discovery and validation of backlight-capable outputs

pub mod args;
pub mod backend;
pub mod constants;
pub mod fade;
pub mod output;
pub mod report;
pub mod request;
pub mod resolver;

// Re-export important types for easier access
pub use backend::{BacklightBackend, X11Backend};
pub use fade::{FadePlan, FadeTiming, compute_targets, fade, fade_filtered};
pub use output::{BrightnessRange, OutputFilter, OutputId, OutputSelector};
pub use request::BrightnessRequest;
pub use resolver::{ReadingSet, resolve};
