//------------ binary snapshot primitives --------------------------------------
//
// Shared little-endian, length-prefixed encode/decode helpers used by every
// level of the snapshot format (§4.8): `Terminal`, `Vector`, `Head`, `Index`
// and the top-level `Hexastore` each read and write their own magic byte and
// fields through these.

use std::io::{self, Read, Write};

use crate::errors::PersistError;

/// Caps a length prefix read from an untrusted stream before it is used to
/// size a `Vec::with_capacity` / `try_reserve` call.
const MAX_RESERVE: usize = 64 * 1024 * 1024;

pub fn write_magic<W: Write>(w: &mut W, magic: u8) -> io::Result<()> {
    w.write_all(&[magic])
}

pub fn read_magic<R: Read>(
    r: &mut R,
    expected: u8,
    context: &'static str,
) -> Result<(), PersistError> {
    let mut buf = [0u8; 1];
    if r.read_exact(&mut buf).is_err() {
        return Err(PersistError::ShortRead { context });
    }
    if buf[0] != expected {
        return Err(PersistError::BadMagic {
            expected,
            found: buf[0],
            context,
        });
    }
    Ok(())
}

pub fn write_u32<W: Write>(w: &mut W, v: u32) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

pub fn read_u32<R: Read>(r: &mut R, context: &'static str) -> Result<u32, PersistError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)
        .map_err(|_| PersistError::ShortRead { context })?;
    Ok(u32::from_le_bytes(buf))
}

pub fn write_u64<W: Write>(w: &mut W, v: u64) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

pub fn read_u64<R: Read>(r: &mut R, context: &'static str) -> Result<u64, PersistError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)
        .map_err(|_| PersistError::ShortRead { context })?;
    Ok(u64::from_le_bytes(buf))
}

/// `NodeId`s are stored on disk as `u64` (§4.8). Stored triples are always
/// positive, so the round trip through `i64` never loses information.
pub fn write_node_id<W: Write>(w: &mut W, v: crate::node::NodeId) -> io::Result<()> {
    write_u64(w, v as u64)
}

pub fn read_node_id<R: Read>(
    r: &mut R,
    context: &'static str,
) -> Result<crate::node::NodeId, PersistError> {
    Ok(read_u64(r, context)? as i64)
}

/// Checks a stream-supplied length prefix before it is used to size an
/// allocation (§7, `AllocationFailed`).
pub fn checked_capacity(len: u32) -> Result<usize, PersistError> {
    let len = len as usize;
    if len > MAX_RESERVE {
        return Err(PersistError::AllocationFailed { requested: len });
    }
    Ok(len)
}
