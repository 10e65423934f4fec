//! The bulk payload file: a seekable byte store with 16-byte alignment
//! discipline between entries.

use super::wire::PAYLOAD_MAGIC;
use crate::error::{Error, Result};
use crate::format::pathutil::{align_up, write_padding};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

pub struct ExternalPayload {
    file: File,
    path: PathBuf,
}

impl ExternalPayload {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::options()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| Error::io(&path, e))?;
        Ok(Self { file, path })
    }

    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| Error::io(&path, e))?;
        let mut payload = Self { file, path };
        payload.init_empty()?;
        Ok(payload)
    }

    /// Writes the fixed 16-byte payload magic header at offset 0.
    pub fn init_empty(&mut self) -> Result<()> {
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|e| Error::io(&self.path, e))?;
        self.file
            .write_all(PAYLOAD_MAGIC)
            .map_err(|e| Error::io(&self.path, e))?;
        Ok(())
    }

    /// Reads exactly `size` bytes at `offset`, or reports a read error.
    pub fn read_at(&mut self, offset: u64, size: u32) -> Result<Vec<u8>> {
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(|e| Error::io(&self.path, e))?;
        let mut buf = vec![0u8; size as usize];
        self.file
            .read_exact(&mut buf)
            .map_err(|e| Error::io(&self.path, e))?;
        Ok(buf)
    }

    /// Appends `bytes` at the current end of the file, then pads to the next
    /// 16-byte boundary. Returns `(start_offset, written_length)`.
    pub fn append(&mut self, bytes: &[u8]) -> Result<(u64, u32)> {
        let start_offset = self
            .file
            .seek(SeekFrom::End(0))
            .map_err(|e| Error::io(&self.path, e))?;
        self.file
            .write_all(bytes)
            .map_err(|e| Error::io(&self.path, e))?;

        let end_offset = start_offset + bytes.len() as u64;
        let padded_end = align_up(end_offset, 16);
        let pad_len = (padded_end - end_offset) as usize;
        write_padding(&mut self.file, pad_len).map_err(|e| Error::io(&self.path, e))?;

        Ok((start_offset, bytes.len() as u32))
    }

    pub fn len(&mut self) -> Result<u64> {
        self.file
            .seek(SeekFrom::End(0))
            .map_err(|e| Error::io(&self.path, e))
    }
}
