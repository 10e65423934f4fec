//! Shared bincode plumbing for the crate's fixed-layout wire structs.
//!
//! Every on-disk record in this crate is a fixed-size run of integers (no
//! bincode length prefixes, no varint encoding), so every codec shares the
//! same two `bincode` configurations: little-endian for the external header
//! and standalone archive, big-endian for the compressed package chunks.

use bincode::config::{BigEndian, Configuration as BincodeConfig, Fixint, LittleEndian};
use bincode::error::{DecodeError, EncodeError};
use bincode::{Decode, Encode};
use std::io::{self, Read, Write};

pub type LeConfig = BincodeConfig<LittleEndian, Fixint>;
pub type BeConfig = BincodeConfig<BigEndian, Fixint>;

pub const LE: LeConfig = bincode::config::standard()
    .with_little_endian()
    .with_fixed_int_encoding();

pub const BE: BeConfig = bincode::config::standard()
    .with_big_endian()
    .with_fixed_int_encoding();

fn decode_err(err: DecodeError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err.to_string())
}

fn encode_err(err: EncodeError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err.to_string())
}

pub fn read_le<D: Decode<()>, R: Read>(reader: &mut R) -> io::Result<D> {
    bincode::decode_from_std_read::<D, LeConfig, R>(reader, LE).map_err(decode_err)
}

pub fn write_le<E: Encode, W: Write>(writer: &mut W, value: &E) -> io::Result<()> {
    bincode::encode_into_std_write::<&E, LeConfig, W>(value, writer, LE)
        .map(|_| ())
        .map_err(encode_err)
}

pub fn read_be<D: Decode<()>, R: Read>(reader: &mut R) -> io::Result<D> {
    bincode::decode_from_std_read::<D, BeConfig, R>(reader, BE).map_err(decode_err)
}

pub fn write_be<E: Encode, W: Write>(writer: &mut W, value: &E) -> io::Result<()> {
    bincode::encode_into_std_write::<&E, BeConfig, W>(value, writer, BE)
        .map(|_| ())
        .map_err(encode_err)
}
