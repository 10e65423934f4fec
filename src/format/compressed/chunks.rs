//! The four fixed-size chunk headers that make up a compressed package, as
//! raw wire structs. All fields are big-endian; see `format::binutil::BE`.

use bincode::{Decode, Encode};

pub const DCX_MAGIC: u32 = 0x4443_5800; // "DCX\0"
pub const DCX_CONST_UNK1: u32 = 0x0001_0000;

pub const DCS_MAGIC: u32 = 0x4443_5300; // "DCS\0"
pub const DCP_MAGIC: u32 = 0x4443_5000; // "DCP\0"
pub const DCA_MAGIC: u32 = 0x4443_4100; // "DCA\0"

pub const DCP_METHOD_DFLT: [u8; 4] = *b"DFLT";
pub const DCP_CONST_UNK1: u32 = 0x0900_0000;
pub const DCP_CONST_VERSION: u32 = 0x0001_0100;

pub const DCA_CONST_DATA_OFFSET: u32 = 0x8;

/// 24 bytes: magic, constant, dcs_offset, dcp_offset, unk2, unk3.
#[derive(Debug, Decode, Encode)]
pub struct DcxHeader {
    pub magic: u32,
    pub unk1: u32,
    pub dcs_offset: u32,
    pub dcp_offset: u32,
    pub unk2: u32,
    pub unk3: u32,
}

/// 12 bytes: magic, uncompressed_size, compressed_size.
#[derive(Debug, Decode, Encode)]
pub struct DcsChunk {
    pub magic: u32,
    pub uncompressed_size: u32,
    pub compressed_size: u32,
}

/// 32 bytes: magic, 4-byte method tag, dca_offset, then five constants.
#[derive(Debug, Decode, Encode)]
pub struct DcpChunk {
    pub magic: u32,
    pub method: [u8; 4],
    pub dca_offset: u32,
    pub unk1: u32,
    pub unk2: u32,
    pub unk3: u32,
    pub unk4: u32,
    pub unk5: u32,
}

/// 8 bytes: magic, data_offset.
#[derive(Debug, Decode, Encode)]
pub struct DcaChunk {
    pub magic: u32,
    pub data_offset: u32,
}
