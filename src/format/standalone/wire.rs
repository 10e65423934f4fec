//! Fixed-layout wire structs for the standalone archive container.

use bincode::{Decode, Encode};

/// Flag bit selecting the 24-byte entry variant (`unk2` trailer present).
pub const FLAG_WIDE_ENTRY: u32 = 0x04;

/// The builder's default flag combination: `0x04 | 0x10 | 0x20 | 0x40`.
pub const DEFAULT_FLAGS: u32 = 0x74;

/// `StandaloneEntry.unk1` is always this constant.
pub const ENTRY_UNK1: u32 = 0x40;

/// Known 12-byte format tags, NUL-padded, taken verbatim from
/// `sieglib/bnd.py`'s `KNOWN_MAGICS` list. The builder uses the first
/// (`BND307D7R6`) as its default; an archive with an unrecognized tag is
/// still loaded, just logged.
pub const KNOWN_MAGICS: &[&[u8; 12]] = &[
    b"BND307D7R6\0\0",
    b"BND307C15R17",
    b"BND307F31W13",
    b"BND307J12L31",
    b"BND307K31N36",
    b"BND307M13L29",
    b"BND308C1N50\0",
    b"BND308J17V46",
    b"BND309G17X51",
    b"BND310B20L16",
    b"BND310I2N48\0",
];

#[derive(Debug, Clone, Decode, Encode)]
pub struct StandaloneHeaderWire {
    pub magic: [u8; 12],
    pub flags: u32,
    pub entry_count: u32,
    pub data_offset: u32,
    pub zero1: u32,
    pub zero2: u32,
}

#[derive(Debug, Clone, Decode, Encode)]
pub struct StandaloneEntry20Wire {
    pub unk1: u32,
    pub data_size: u32,
    pub data_offset: u32,
    pub ident: u32,
    pub path_offset: u32,
}

#[derive(Debug, Clone, Decode, Encode)]
pub struct StandaloneEntry24Wire {
    pub unk1: u32,
    pub data_size: u32,
    pub data_offset: u32,
    pub ident: u32,
    pub path_offset: u32,
    pub unk2: u32,
}
