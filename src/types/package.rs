//! The package record stored per [`Pid`](crate::types::Pid) slot.

use crate::types::ids::StrId;
use crate::types::status::StatusFlags;

/// A single row of the package table (SPEC_FULL §3 "Package (pid)").
///
/// All string-valued fields are interned ids into the owning [`Pkgs`]'s
/// string pool; dereference them with `Pkgs::string`.
///
/// Epoch is accepted by [`Pkgs::set`](crate::pkgs::Pkgs::set) but not stored
/// here — it never factors into package identity or display, only into
/// dependency matching (where it lives on the [`DepId`](crate::types::DepId)
/// tuple instead). `original_source/pkg.c`'s `pkgs_set` does the same
/// (`/* p->epoch = epoch */` is commented out there).
///
/// [`Pkgs`]: crate::pkgs::Pkgs
#[derive(Clone, Copy, Debug, Default)]
pub struct Package {
    /// Interned package name.
    pub name: StrId,
    /// Interned version string.
    pub version: StrId,
    /// Interned release string.
    pub release: StrId,
    /// Interned architecture string (may be the empty string's id).
    pub arch: StrId,
    /// Which repository this package came from.
    pub repo: u32,
    /// Installed size in kilobytes.
    pub size_kb: u32,
    /// Derived + user-set status bits.
    pub status: StatusFlags,
}

/// Byte width of one packed [`Package`] record, as stored by
/// [`crate::store::varint_array::VarIntArray::with_fixed_width`].
pub const RECORD_WIDTH: usize = 26;

impl Package {
    /// What: is this package "as good as gone" (`DELETE` or `DELETED`)?
    #[must_use]
    pub fn is_alldel(&self) -> bool {
        self.status.intersects(StatusFlags::ALLDEL)
    }

    /// What: pack into the fixed-width record layout used by the package
    /// table (SPEC_FULL §4.1: "fixed mode ... used for the package table").
    #[must_use]
    pub fn to_record(self) -> [u8; RECORD_WIDTH] {
        let mut buf = [0u8; RECORD_WIDTH];
        buf[0..4].copy_from_slice(&self.name.0.to_le_bytes());
        buf[4..8].copy_from_slice(&self.version.0.to_le_bytes());
        buf[8..12].copy_from_slice(&self.release.0.to_le_bytes());
        buf[12..16].copy_from_slice(&self.arch.0.to_le_bytes());
        buf[16..20].copy_from_slice(&self.repo.to_le_bytes());
        buf[20..24].copy_from_slice(&self.size_kb.to_le_bytes());
        buf[24..26].copy_from_slice(&self.status.bits().to_le_bytes());
        buf
    }

    /// What: unpack a record written by [`Package::to_record`].
    #[must_use]
    pub fn from_record(buf: &[u8]) -> Self {
        let u32_at = |lo: usize| u32::from_le_bytes(buf[lo..lo + 4].try_into().expect("record slice"));
        Self {
            name: StrId(u32_at(0)),
            version: StrId(u32_at(4)),
            release: StrId(u32_at(8)),
            arch: StrId(u32_at(12)),
            repo: u32_at(16),
            size_kb: u32_at(20),
            status: StatusFlags::from_bits(u16::from_le_bytes(buf[24..26].try_into().expect("record slice"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_roundtrips() {
        let p = Package {
            name: StrId(3),
            version: StrId(9),
            release: StrId(1),
            arch: StrId(0),
            repo: 2,
            size_kb: 4096,
            status: StatusFlags::INSTALLED | StatusFlags::LEAF,
        };
        let back = Package::from_record(&p.to_record());
        assert_eq!(back.name, p.name);
        assert_eq!(back.size_kb, p.size_kb);
        assert_eq!(back.status.bits(), p.status.bits());
    }
}
