//! Parses and emits the external composed header: records pointing at
//! contiguous runs of data entries.

use super::wire::{
    DataEntryWire, HeaderWire, RecordWire, DEFAULT_UNK1, DEFAULT_UNK2, HEADER_MAGIC,
    INNER_HEADER_MAGIC,
};
use crate::error::{Error, Result};
use crate::format::binutil::{read_le, write_le};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// The smallest descriptor in an external header: one slice of the bulk payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataEntry {
    pub key: u32,
    pub size: u32,
    pub offset: u32,
    pub unk: u32,
}

/// A group of data entries; the partitioning unit of the index.
#[derive(Debug, Clone, Default)]
pub struct Record {
    pub entries: Vec<DataEntry>,
}

/// The external composed header: `records → data entries`.
#[derive(Debug, Clone)]
pub struct ExternalHeader {
    pub unk1: u32,
    pub unk2: u32,
    pub records: Vec<Record>,
}

impl ExternalHeader {
    /// A fresh, empty header with the defaults the original tool-chain used
    /// when building one from scratch.
    pub fn new() -> Self {
        Self {
            unk1: DEFAULT_UNK1,
            unk2: DEFAULT_UNK2,
            records: Vec::new(),
        }
    }

    /// Builder operation: appends an empty record, returning its index.
    pub fn push_record(&mut self) -> usize {
        self.records.push(Record::default());
        self.records.len() - 1
    }

    /// Builder operation: appends `entry` to the end of `record_index`'s
    /// entry list, preserving the order entries were appended in.
    pub fn push_entry(&mut self, record_index: usize, entry: DataEntry) {
        self.records[record_index].entries.push(entry);
    }

    pub fn load<R: Read + Seek>(reader: &mut R, path: &Path) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let header: HeaderWire = read_le(reader)?;
        if header.magic != HEADER_MAGIC && header.magic != INNER_HEADER_MAGIC {
            return Err(Error::invalid_magic(
                path,
                "BHD5",
                format!("{:#x}", header.magic),
            ));
        }

        reader.seek(SeekFrom::Start(u64::from(header.records_offset)))?;
        let mut record_wires = Vec::with_capacity(header.num_records as usize);
        for _ in 0..header.num_records {
            record_wires.push(read_le::<RecordWire, _>(reader)?);
        }

        let mut records = Vec::with_capacity(record_wires.len());
        let mut total_entries = 0u64;
        for record_wire in record_wires {
            reader.seek(SeekFrom::Start(u64::from(record_wire.entries_offset)))?;
            let mut entries = Vec::with_capacity(record_wire.entry_count as usize);
            for _ in 0..record_wire.entry_count {
                let wire: DataEntryWire = read_le(reader)?;
                entries.push(DataEntry {
                    key: wire.key,
                    size: wire.size,
                    offset: wire.offset,
                    unk: wire.unk,
                });
            }
            total_entries += entries.len() as u64;
            records.push(Record { entries });
        }

        let expected_size = u64::from(HeaderWire::SIZE)
            + u64::from(RecordWire::SIZE) * records.len() as u64
            + u64::from(DataEntryWire::SIZE) * total_entries;
        if u64::from(header.file_size) != expected_size {
            return Err(Error::structurally_inconsistent(
                path,
                format!(
                    "header claims file_size {} but records+entries total {}",
                    header.file_size, expected_size
                ),
            ));
        }

        Ok(Self {
            unk1: header.unk1,
            unk2: header.unk2,
            records,
        })
    }

    /// Lays out the header, then all record descriptors back-to-back, then
    /// entries grouped by record, recomputing every offset from scratch.
    pub fn save<W: Write>(&self, writer: &mut W) -> Result<()> {
        let records_offset = HeaderWire::SIZE;
        let entries_start = records_offset + RecordWire::SIZE * self.records.len() as u32;

        let mut entries_offset = entries_start;
        let mut record_wires = Vec::with_capacity(self.records.len());
        for record in &self.records {
            record_wires.push(RecordWire {
                entry_count: record.entries.len() as u32,
                entries_offset,
            });
            entries_offset += DataEntryWire::SIZE * record.entries.len() as u32;
        }

        let total_entries: u64 = self.records.iter().map(|r| r.entries.len() as u64).sum();
        let file_size = u64::from(HeaderWire::SIZE)
            + u64::from(RecordWire::SIZE) * self.records.len() as u64
            + u64::from(DataEntryWire::SIZE) * total_entries;

        write_le(
            writer,
            &HeaderWire {
                magic: HEADER_MAGIC,
                unk1: self.unk1,
                unk2: self.unk2,
                file_size: file_size as u32,
                num_records: self.records.len() as u32,
                records_offset,
            },
        )?;

        for wire in &record_wires {
            write_le(writer, wire)?;
        }

        for record in &self.records {
            for entry in &record.entries {
                write_le(
                    writer,
                    &DataEntryWire {
                        key: entry.key,
                        size: entry.size,
                        offset: entry.offset,
                        unk: entry.unk,
                    },
                )?;
            }
        }

        Ok(())
    }
}

impl Default for ExternalHeader {
    fn default() -> Self {
        Self::new()
    }
}
