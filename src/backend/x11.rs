//! RandR implementation of the backlight backend.

use anyhow::{Context, Result, bail};
use log::debug;
use x11rb::connection::{Connection, RequestConnection};
use x11rb::protocol::randr::{self, ConnectionExt as _};
use x11rb::protocol::xproto::{Atom, AtomEnum, ConnectionExt as _, PropMode};
use x11rb::rust_connection::RustConnection;

use crate::backend::BacklightBackend;
use crate::constants::{BACKLIGHT_ATOM_NAMES, REQUIRED_RANDR_VERSION};

/// An open X session with the RandR extension and the interned backlight
/// atoms.
pub struct X11Backend {
    conn: RustConnection,
    roots: Vec<u32>,
    candidates: Vec<Atom>,
}

impl X11Backend {
    /// Connect to the given display (or `$DISPLAY` when `None`), verify the
    /// RandR extension and intern the backlight atoms.
    ///
    /// Fails hard when neither backlight atom exists on the server: no
    /// driver on this session has ever exposed a backlight property, so no
    /// later per-output probing can succeed.
    pub fn connect(display: Option<&str>) -> Result<Self> {
        let (conn, _screen_num) =
            RustConnection::connect(display).context("failed to connect to X display")?;
        if conn
            .extension_information(randr::X11_EXTENSION_NAME)?
            .is_none()
        {
            bail!("RandR extension unsupported by the X server");
        }
        let (major, minor) = REQUIRED_RANDR_VERSION;
        let version = conn
            .randr_query_version(major, minor)?
            .reply()
            .context("RandR version query failed")?;
        debug!(
            "connected, RandR {}.{}",
            version.major_version, version.minor_version
        );

        let mut candidates = Vec::new();
        for name in BACKLIGHT_ATOM_NAMES {
            let atom = conn.intern_atom(true, name.as_bytes())?.reply()?.atom;
            if atom != x11rb::NONE {
                debug!("backlight atom {name:?} = {atom}");
                candidates.push(atom);
            }
        }
        if candidates.is_empty() {
            bail!("no outputs have a backlight property");
        }

        let roots = conn.setup().roots.iter().map(|screen| screen.root).collect();
        Ok(Self {
            conn,
            roots,
            candidates,
        })
    }
}

impl BacklightBackend for X11Backend {
    fn candidate_atoms(&self) -> &[Atom] {
        &self.candidates
    }

    fn screen_roots(&self) -> Vec<u32> {
        self.roots.clone()
    }

    fn outputs(&mut self, root: u32) -> Result<Vec<u32>> {
        let resources = self
            .conn
            .randr_get_screen_resources(root)?
            .reply()
            .with_context(|| format!("failed to query screen resources of root {root}"))?;
        Ok(resources.outputs)
    }

    fn current_level(&mut self, output: u32, atom: Atom) -> Result<Option<i32>> {
        // Type filter 0 = AnyPropertyType; the shape check below is what
        // decides whether the property counts as a backlight.
        let reply = self
            .conn
            .randr_get_output_property(output, atom, 0u32, 0, 4, false, false)?
            .reply()
            .with_context(|| format!("failed to read backlight property of output {output}"))?;
        if reply.type_ != Atom::from(AtomEnum::INTEGER)
            || reply.num_items != 1
            || reply.format != 32
        {
            return Ok(None);
        }
        let Some(bytes) = reply.data.get(0..4).and_then(|b| <[u8; 4]>::try_from(b).ok())
        else {
            return Ok(None);
        };
        Ok(Some(i32::from_ne_bytes(bytes)))
    }

    fn level_range(&mut self, output: u32, atom: Atom) -> Result<Option<(i32, i32)>> {
        // Outputs without queryable property metadata are skipped, not
        // errors, so a failed reply maps to None here.
        let Ok(reply) = self.conn.randr_query_output_property(output, atom)?.reply() else {
            return Ok(None);
        };
        if !reply.range || reply.valid_values.len() != 2 {
            return Ok(None);
        }
        Ok(Some((reply.valid_values[0], reply.valid_values[1])))
    }

    fn set_level(&mut self, output: u32, atom: Atom, value: i32) -> Result<()> {
        self.conn
            .randr_change_output_property(
                output,
                atom,
                Atom::from(AtomEnum::INTEGER),
                32,
                PropMode::REPLACE,
                1,
                &value.to_ne_bytes(),
            )
            .with_context(|| format!("failed to write backlight level of output {output}"))?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.conn.flush().context("failed to flush X connection")?;
        Ok(())
    }
}
