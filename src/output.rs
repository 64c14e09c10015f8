//! Data model for backlight-capable display outputs.
//!
//! An output is addressed by the pair of its screen root and its RandR
//! output handle; both are opaque server-assigned identifiers that are only
//! valid for the lifetime of the session that produced them.

use std::collections::HashSet;

use anyhow::{Context, Result, bail};

/// Identifies one display output: (screen root, RandR output handle).
///
/// Used purely as a map key; ordering gives deterministic report output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OutputId {
    pub screen: u32,
    pub output: u32,
}

/// The declared backlight range of an output together with its current
/// level, all in the property's native units.
///
/// The resolver only emits ranges satisfying `min <= current <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrightnessRange {
    pub min: i32,
    pub current: i32,
    pub max: i32,
}

impl BrightnessRange {
    /// Convert a native-unit value to a percentage of this range.
    pub fn percent_of(&self, value: i32) -> f64 {
        (value - self.min) as f64 * 100.0 / (self.max - self.min) as f64
    }

    /// Percentage corresponding to the current level.
    pub fn current_percent(&self) -> f64 {
        self.percent_of(self.current)
    }
}

/// One user-supplied output constraint, parsed from `SCREEN:OUTPUT` where
/// either side may be left empty to match anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSelector {
    pub screen: Option<u32>,
    pub output: Option<u32>,
}

impl OutputSelector {
    /// Parse a selector in the forms `S`, `S:`, `S:O` or `:O`.
    ///
    /// A bare number selects every output on that screen. `:` alone (both
    /// sides empty) is rejected.
    pub fn parse(spec: &str) -> Result<Self> {
        let Some((screen, output)) = spec.split_once(':') else {
            let screen = parse_handle(spec)?;
            return Ok(Self {
                screen: Some(screen),
                output: None,
            });
        };
        match (screen.is_empty(), output.is_empty()) {
            (true, true) => bail!("empty output selector: {spec:?}"),
            (false, true) => Ok(Self {
                screen: Some(parse_handle(screen)?),
                output: None,
            }),
            (true, false) => Ok(Self {
                screen: None,
                output: Some(parse_handle(output)?),
            }),
            (false, false) => Ok(Self {
                screen: Some(parse_handle(screen)?),
                output: Some(parse_handle(output)?),
            }),
        }
    }
}

fn parse_handle(s: &str) -> Result<u32> {
    s.parse::<u32>()
        .with_context(|| format!("invalid output selector component: {s:?}"))
}

/// A set of output constraints. An empty filter matches every output; a
/// non-empty filter matches an output when it hits an exact pair, its
/// screen appears as a screen-only wildcard, or its output handle appears
/// as an output-only wildcard.
#[derive(Debug, Clone, Default)]
pub struct OutputFilter {
    exact: HashSet<(u32, u32)>,
    screens: HashSet<u32>,
    outputs: HashSet<u32>,
}

impl OutputFilter {
    pub fn from_selectors(selectors: &[OutputSelector]) -> Self {
        let mut filter = Self::default();
        for sel in selectors {
            match (sel.screen, sel.output) {
                (Some(s), Some(o)) => {
                    filter.exact.insert((s, o));
                }
                (Some(s), None) => {
                    filter.screens.insert(s);
                }
                (None, Some(o)) => {
                    filter.outputs.insert(o);
                }
                (None, None) => {}
            }
        }
        filter
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.screens.is_empty() && self.outputs.is_empty()
    }

    pub fn matches(&self, screen: u32, output: u32) -> bool {
        if self.is_empty() {
            return true;
        }
        self.exact.contains(&(screen, output))
            || self.screens.contains(&screen)
            || self.outputs.contains(&output)
    }
}
