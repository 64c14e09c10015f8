//! In-memory backend for tests.
//!
//! Simulates a session with a fixed set of outputs and records every write
//! and flush, so tests can assert on batching, ordering and terminal
//! values without a display server.

use anyhow::{Result, bail};
use x11rb::protocol::xproto::Atom;

use crate::backend::BacklightBackend;

/// One simulated output and the atoms its backlight property answers to.
#[derive(Debug, Clone)]
pub struct FakeOutput {
    pub screen: u32,
    pub output: u32,
    /// Atoms under which the property reads back as a valid backlight.
    pub atoms: Vec<Atom>,
    pub current: i32,
    /// Declared valid range; `None` simulates malformed range metadata.
    pub range: Option<(i32, i32)>,
}

/// Deterministic `BacklightBackend` recording all protocol traffic.
#[derive(Debug, Default)]
pub struct FakeBackend {
    candidates: Vec<Atom>,
    outputs: Vec<FakeOutput>,
    /// Every queued write in order: (output, atom, value).
    pub writes: Vec<(u32, Atom, i32)>,
    /// Number of flushes issued.
    pub flushes: usize,
    /// When set, the next `set_level` fails like a broken transport.
    pub fail_writes: bool,
}

impl FakeBackend {
    pub fn new(candidates: Vec<Atom>) -> Self {
        Self {
            candidates,
            ..Self::default()
        }
    }

    pub fn push_output(&mut self, output: FakeOutput) {
        self.outputs.push(output);
    }

    /// Value of the last write issued against `output`, if any.
    pub fn last_write_for(&self, output: u32) -> Option<i32> {
        self.writes
            .iter()
            .rev()
            .find(|(o, _, _)| *o == output)
            .map(|&(_, _, v)| v)
    }

    fn find(&self, output: u32) -> Option<&FakeOutput> {
        self.outputs.iter().find(|o| o.output == output)
    }
}

impl BacklightBackend for FakeBackend {
    fn candidate_atoms(&self) -> &[Atom] {
        &self.candidates
    }

    fn screen_roots(&self) -> Vec<u32> {
        let mut roots = Vec::new();
        for o in &self.outputs {
            if !roots.contains(&o.screen) {
                roots.push(o.screen);
            }
        }
        roots
    }

    fn outputs(&mut self, root: u32) -> Result<Vec<u32>> {
        Ok(self
            .outputs
            .iter()
            .filter(|o| o.screen == root)
            .map(|o| o.output)
            .collect())
    }

    fn current_level(&mut self, output: u32, atom: Atom) -> Result<Option<i32>> {
        Ok(self
            .find(output)
            .filter(|o| o.atoms.contains(&atom))
            .map(|o| o.current))
    }

    fn level_range(&mut self, output: u32, atom: Atom) -> Result<Option<(i32, i32)>> {
        Ok(self
            .find(output)
            .filter(|o| o.atoms.contains(&atom))
            .and_then(|o| o.range))
    }

    fn set_level(&mut self, output: u32, atom: Atom, value: i32) -> Result<()> {
        if self.fail_writes {
            bail!("simulated transport failure writing output {output}");
        }
        self.writes.push((output, atom, value));
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }
}
