//! IPS32 writer — serializes one collection's enabled binary patches into
//! the IPS32 patch container.
//!
//! Layout: a 5-byte `"IPS32"` header, one record per content entry
//! (`offset` as 4 bytes big-endian, `size` as 2 bytes big-endian, then
//! `size` data bytes), and a 4-byte `"EEOF"` footer. Record sizes are
//! 16-bit in this format, so values of 65536+ bytes silently wrap — a
//! known limitation of the container, preserved here.

use std::io::{self, Write};

use crate::model::{PatchCollection, PatchType};

const IPS32_HEADER_MAGIC: &[u8] = b"IPS32";
const IPS32_FOOTER_MAGIC: &[u8] = b"EEOF";

/// Write the IPS32 container for one collection.
///
/// Only enabled [`PatchType::Binary`] patches are emitted; disabled,
/// heap-typed, and cheat-typed patches contribute no bytes at all.
pub fn write_ips<W: Write>(collection: &PatchCollection, out: &mut W) -> io::Result<()> {
    out.write_all(IPS32_HEADER_MAGIC)?;
    for patch in &collection.patches {
        if patch.kind != PatchType::Binary || !patch.enabled {
            continue;
        }
        for content in &patch.contents {
            out.write_all(&content.offset.to_be_bytes())?;
            out.write_all(&(content.value.len() as u16).to_be_bytes())?;
            out.write_all(&content.value)?;
        }
    }
    out.write_all(IPS32_FOOTER_MAGIC)
}
