//! The single-file deflate wrapper ("DCX" family): four fixed chunks
//! (`DCX`/`DCS`/`DCP`/`DCA`) followed by a raw deflate stream.

use super::chunks::{
    DcaChunk, DcpChunk, DcsChunk, DcxHeader, DCA_CONST_DATA_OFFSET, DCA_MAGIC, DCP_CONST_UNK1,
    DCP_CONST_VERSION, DCP_MAGIC, DCP_METHOD_DFLT, DCS_MAGIC, DCX_CONST_UNK1, DCX_MAGIC,
};
use crate::error::{Error, Result};
use crate::format::binutil::{read_be, write_be};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// A fully decoded compressed package: just the inflated payload bytes, plus
/// the size bookkeeping needed to re-derive a byte-plausible wrapper.
#[derive(Debug, Clone)]
pub struct CompressedPackage {
    payload: Vec<u8>,
}

impl CompressedPackage {
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    pub fn from_payload(payload: Vec<u8>) -> Self {
        Self { payload }
    }

    /// Decodes a compressed package from any seekable reader.
    pub fn decode<R: Read + Seek>(reader: &mut R, path: &Path) -> Result<Self> {
        reader
            .seek(SeekFrom::Start(0))
            .map_err(|e| Error::io(path, e))?;
        let header: DcxHeader = read_be(reader).map_err(|e| Error::io(path, e))?;
        if header.magic != DCX_MAGIC {
            return Err(Error::invalid_magic(
                path,
                "DCX\\0",
                format!("{:#x}", header.magic),
            ));
        }
        if header.unk1 != DCX_CONST_UNK1 {
            return Err(Error::structurally_inconsistent(
                path,
                format!("unexpected DCX.unk1 {:#x}", header.unk1),
            ));
        }

        reader
            .seek(SeekFrom::Start(u64::from(header.dcs_offset)))
            .map_err(|e| Error::io(path, e))?;
        let sizes: DcsChunk = read_be(reader).map_err(|e| Error::io(path, e))?;
        if sizes.magic != DCS_MAGIC {
            return Err(Error::invalid_magic(
                path,
                "DCS\\0",
                format!("{:#x}", sizes.magic),
            ));
        }

        reader
            .seek(SeekFrom::Start(u64::from(header.dcp_offset)))
            .map_err(|e| Error::io(path, e))?;
        let parameters: DcpChunk = read_be(reader).map_err(|e| Error::io(path, e))?;
        if parameters.method != DCP_METHOD_DFLT {
            return Err(Error::structurally_inconsistent(
                path,
                format!("unsupported DCP method {:?}", parameters.method),
            ));
        }

        let dca_offset = u64::from(header.dcp_offset) + u64::from(parameters.dca_offset);
        reader
            .seek(SeekFrom::Start(dca_offset))
            .map_err(|e| Error::io(path, e))?;
        let container: DcaChunk = read_be(reader).map_err(|e| Error::io(path, e))?;

        let data_offset = dca_offset + u64::from(container.data_offset);
        reader
            .seek(SeekFrom::Start(data_offset))
            .map_err(|e| Error::io(path, e))?;
        let mut compressed = vec![0u8; sizes.compressed_size as usize];
        reader
            .read_exact(&mut compressed)
            .map_err(|e| Error::io(path, e))?;

        let mut decoder = ZlibDecoder::new(compressed.as_slice());
        let mut payload = Vec::with_capacity(sizes.uncompressed_size as usize);
        decoder.read_to_end(&mut payload)?;

        if payload.len() as u32 != sizes.uncompressed_size {
            return Err(Error::structurally_inconsistent(
                path,
                format!(
                    "decompressed {} bytes, DCS promised {}",
                    payload.len(),
                    sizes.uncompressed_size
                ),
            ));
        }

        Ok(Self { payload })
    }

    /// Compresses `payload` at level 9 and writes the four-chunk wrapper.
    /// `path` is used only to label plain I/O failures on `writer`; the
    /// zlib compression itself still reports through `CodecFailure`.
    pub fn encode<W: Write>(&self, writer: &mut W, path: &Path) -> Result<()> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(9));
        encoder.write_all(&self.payload)?;
        let compressed = encoder.finish()?;

        let dcs_offset = 24u32;
        let dcp_offset = dcs_offset + 12;

        write_be(
            writer,
            &DcxHeader {
                magic: DCX_MAGIC,
                unk1: DCX_CONST_UNK1,
                dcs_offset,
                dcp_offset,
                unk2: dcp_offset,
                unk3: dcp_offset + 0x8,
            },
        )
        .map_err(|e| Error::io(path, e))?;
        write_be(
            writer,
            &DcsChunk {
                magic: DCS_MAGIC,
                uncompressed_size: self.payload.len() as u32,
                compressed_size: compressed.len() as u32,
            },
        )
        .map_err(|e| Error::io(path, e))?;
        write_be(
            writer,
            &DcpChunk {
                magic: DCP_MAGIC,
                method: DCP_METHOD_DFLT,
                dca_offset: 32,
                unk1: DCP_CONST_UNK1,
                unk2: 0,
                unk3: 0,
                unk4: 0,
                unk5: DCP_CONST_VERSION,
            },
        )
        .map_err(|e| Error::io(path, e))?;
        write_be(
            writer,
            &DcaChunk {
                magic: DCA_MAGIC,
                data_offset: DCA_CONST_DATA_OFFSET,
            },
        )
        .map_err(|e| Error::io(path, e))?;
        writer.write_all(&compressed).map_err(|e| Error::io(path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn round_trips_short_payload() {
        let original = b"The quick brown fox".to_vec();
        let package = CompressedPackage::from_payload(original.clone());

        let mut buf = Vec::new();
        package.encode(&mut buf, Path::new("test.dcx")).unwrap();

        assert_eq!(&buf[0..4], &DCX_MAGIC.to_be_bytes());
        assert!(buf.windows(4).any(|w| w == b"DFLT"));

        let mut cursor = Cursor::new(buf);
        let decoded = CompressedPackage::decode(&mut cursor, Path::new("test.dcx")).unwrap();
        assert_eq!(decoded.payload(), original.as_slice());
    }

    #[test]
    fn rejects_bad_magic() {
        let mut cursor = Cursor::new(vec![0u8; 64]);
        assert!(CompressedPackage::decode(&mut cursor, Path::new("bad.dcx")).is_err());
    }

    #[test]
    fn empty_payload_round_trips() {
        let package = CompressedPackage::from_payload(Vec::new());
        let mut buf = Vec::new();
        package.encode(&mut buf, Path::new("empty.dcx")).unwrap();
        let mut cursor = Cursor::new(buf);
        let decoded = CompressedPackage::decode(&mut cursor, Path::new("empty.dcx")).unwrap();
        assert!(decoded.payload().is_empty());
    }
}
