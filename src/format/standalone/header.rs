//! Domain view of a standalone archive's header and entry table: the fixed
//! wire records, decoded into the shape the rest of the crate works with.

use super::wire::{
    StandaloneEntry20Wire, StandaloneEntry24Wire, StandaloneHeaderWire, FLAG_WIDE_ENTRY,
    KNOWN_MAGICS,
};
use crate::error::{Error, Result};
use crate::format::binutil::read_le;
use crate::format::pathutil;
use log::warn;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// One entry's fixed fields plus its decoded path. The payload bytes are
/// not held here; callers seek the archive at `data_offset` to read them.
#[derive(Debug, Clone)]
pub struct StandaloneEntry {
    pub ident: u32,
    pub decoded_path: String,
    pub data_offset: u32,
    pub data_size: u32,
}

#[derive(Debug, Clone)]
pub struct StandaloneHeader {
    pub magic: [u8; 12],
    pub flags: u32,
    pub entries: Vec<StandaloneEntry>,
}

impl StandaloneHeader {
    pub fn wide_entries(&self) -> bool {
        self.flags & FLAG_WIDE_ENTRY != 0
    }

    /// Reads the 32-byte header and every entry record (not the bodies or
    /// the decoded path strings) from `reader`, which must be positioned at
    /// the start of the file.
    pub fn load<R: Read + Seek>(reader: &mut R, path: &Path) -> Result<Self> {
        let wire: StandaloneHeaderWire = read_le(reader).map_err(|e| Error::io(path, e))?;
        if !KNOWN_MAGICS.iter().any(|known| **known == wire.magic) {
            warn!(
                "{}: unrecognized standalone archive magic {:?}",
                path.display(),
                String::from_utf8_lossy(&wire.magic)
            );
        }

        let wide = wire.flags & FLAG_WIDE_ENTRY != 0;
        let mut entries = Vec::with_capacity(wire.entry_count as usize);
        for _ in 0..wire.entry_count {
            let (ident, path_offset, data_offset, data_size) = if wide {
                let entry: StandaloneEntry24Wire = read_le(reader).map_err(|e| Error::io(path, e))?;
                (entry.ident, entry.path_offset, entry.data_offset, entry.data_size)
            } else {
                let entry: StandaloneEntry20Wire = read_le(reader).map_err(|e| Error::io(path, e))?;
                (entry.ident, entry.path_offset, entry.data_offset, entry.data_size)
            };

            let resume = reader.stream_position().map_err(|e| Error::io(path, e))?;
            reader
                .seek(SeekFrom::Start(u64::from(path_offset)))
                .map_err(|e| Error::io(path, e))?;
            let decoded_path =
                pathutil::read_sjis_cstring(reader).map_err(|e| Error::io(path, e))?;
            reader
                .seek(SeekFrom::Start(resume))
                .map_err(|e| Error::io(path, e))?;

            entries.push(StandaloneEntry {
                ident,
                decoded_path,
                data_offset,
                data_size,
            });
        }

        Ok(Self {
            magic: wire.magic,
            flags: wire.flags,
            entries,
        })
    }
}

pub fn default_magic() -> [u8; 12] {
    *KNOWN_MAGICS[0]
}
