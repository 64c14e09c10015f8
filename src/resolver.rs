//! Property resolver: discovers backlight-capable outputs and reads their
//! current brightness.
//!
//! For each output the resolver probes the known backlight atoms in
//! preference order until one yields an integer-typed, single-item, 32-bit
//! reading, then queries the property's declared range. Outputs that fail
//! any shape check are skipped silently. The first atom that works is
//! reused for every remaining output of the invocation — an observed
//! driver-level assumption carried over from the original tool, not a
//! protocol guarantee.

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use log::debug;
use x11rb::protocol::xproto::Atom;

use crate::backend::BacklightBackend;
use crate::output::{BrightnessRange, OutputFilter, OutputId};

/// The readings of one resolve call: a brightness range per validated
/// output, plus the atom every entry was read from.
///
/// Built fresh per invocation and never mutated by the fade engine, which
/// produces a separate target mapping instead.
#[derive(Debug, Clone, Default)]
pub struct ReadingSet {
    entries: BTreeMap<OutputId, BrightnessRange>,
    atom: Option<Atom>,
}

impl ReadingSet {
    /// Assemble a reading set directly, mainly for tests and callers that
    /// already hold validated readings.
    pub fn new(atom: Option<Atom>) -> Self {
        Self {
            entries: BTreeMap::new(),
            atom,
        }
    }

    pub fn insert(&mut self, id: OutputId, range: BrightnessRange) {
        self.entries.insert(id, range);
    }

    pub fn get(&self, id: &OutputId) -> Option<&BrightnessRange> {
        self.entries.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OutputId, &BrightnessRange)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The atom all entries were read from; `None` iff the set is empty.
    pub fn atom(&self) -> Option<Atom> {
        self.atom
    }
}

/// Enumerate all outputs matching `filter` and return validated backlight
/// readings for them.
///
/// Every returned entry satisfies `min <= current <= max`. Outputs with an
/// unreadable or wrongly-shaped property, malformed range metadata or an
/// out-of-range current value are omitted, never errors; transport
/// failures during enumeration propagate.
pub fn resolve(
    backend: &mut dyn BacklightBackend,
    filter: &OutputFilter,
) -> Result<ReadingSet> {
    let candidates = backend.candidate_atoms().to_vec();
    if candidates.is_empty() {
        bail!("no backlight property atoms are known to this session");
    }

    // Resolved at most once per invocation, then reused for all outputs.
    let mut chosen: Option<Atom> = None;
    let mut readings = ReadingSet::new(None);

    for root in backend.screen_roots() {
        for output in backend.outputs(root)? {
            if !filter.matches(root, output) {
                continue;
            }
            let current = match chosen {
                Some(atom) => backend.current_level(output, atom)?,
                None => {
                    let mut found = None;
                    for &atom in &candidates {
                        if let Some(value) = backend.current_level(output, atom)? {
                            debug!("using backlight atom {atom} from output {output}");
                            chosen = Some(atom);
                            found = Some(value);
                            break;
                        }
                    }
                    found
                }
            };
            let (Some(current), Some(atom)) = (current, chosen) else {
                debug!("output {output}: no usable backlight property, skipping");
                continue;
            };
            let Some((min, max)) = backend.level_range(output, atom)? else {
                debug!("output {output}: malformed backlight range metadata, skipping");
                continue;
            };
            if min >= max {
                debug!("output {output}: degenerate backlight range [{min}, {max}], skipping");
                continue;
            }
            if !(min <= current && current <= max) {
                debug!("output {output}: current {current} outside [{min}, {max}], skipping");
                continue;
            }
            readings.insert(
                OutputId {
                    screen: root,
                    output,
                },
                BrightnessRange { min, current, max },
            );
        }
    }

    readings.atom = chosen;
    Ok(readings)
}
