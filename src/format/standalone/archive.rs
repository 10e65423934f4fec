//! Single-file standalone archive: load + extract, and a builder that packs
//! a fresh one from `(real_path, virtual_path)` contributions.

use super::header::{default_magic, StandaloneHeader};
use super::wire::{
    StandaloneEntry24Wire, StandaloneHeaderWire, DEFAULT_FLAGS, ENTRY_UNK1, FLAG_WIDE_ENTRY,
};
use crate::error::{Error, Result};
use crate::format::binutil::write_le;
use crate::format::pathutil::{self, align_up, write_padding, write_sjis_cstring};
use crate::manifest::{BndManifest, EntryManifest};
use log::{info, warn};
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub struct StandaloneArchive {
    file: File,
    header: StandaloneHeader,
}

impl StandaloneArchive {
    pub fn load(path: &Path) -> Result<Self> {
        let mut file = File::open(path).map_err(|e| Error::io(path, e))?;
        let header = StandaloneHeader::load(&mut file, path)?;
        Ok(Self { file, header })
    }

    pub fn header(&self) -> &StandaloneHeader {
        &self.header
    }

    /// Extracts every entry, writing each one's bytes under whichever of
    /// `output_dir` or the archive's own directory its path (absolute vs.
    /// relative) and `force_output_dir` resolve to, plus a per-entry
    /// `<file>.json` sidecar and one archive-level `bnd.json` recording the
    /// magic and flags so a later reimport can rebuild the header.
    pub fn extract_all(
        &mut self,
        archive_path: &Path,
        output_dir: &Path,
        force_output_dir: bool,
    ) -> Result<Vec<PathBuf>> {
        let archive_dir = archive_path.parent().unwrap_or_else(|| Path::new("."));
        let mut written = Vec::with_capacity(self.header.entries.len());

        for entry in self.header.entries.clone() {
            let is_absolute = pathutil::is_virtual_absolute(&entry.decoded_path);
            let relative = pathutil::rewrite_archive_path(&entry.decoded_path);

            let target_dir = if is_absolute || force_output_dir {
                output_dir
            } else {
                archive_dir
            };
            let target_path = target_dir.join(&relative);

            if let Some(parent) = target_path.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
            make_room_for(&target_path)?;

            self.file
                .seek(SeekFrom::Start(u64::from(entry.data_offset)))
                .map_err(|e| Error::io(archive_path, e))?;
            let mut body = vec![0u8; entry.data_size as usize];
            self.file
                .read_exact(&mut body)
                .map_err(|e| Error::io(archive_path, e))?;
            fs::write(&target_path, &body).map_err(|e| Error::io(&target_path, e))?;

            EntryManifest {
                ident: entry.ident,
                path: entry.decoded_path.clone(),
            }
            .save(&target_path)?;

            info!("extracted {}", target_path.display());
            written.push(target_path);
        }

        let manifest_dir = if force_output_dir { output_dir } else { archive_dir };
        BndManifest {
            magic: String::from_utf8_lossy(&self.header.magic)
                .trim_end_matches('\0')
                .to_string(),
            flags: self.header.flags,
        }
        .save(manifest_dir)?;

        Ok(written)
    }

    /// Rebuilds a standalone archive from a tree previously written by
    /// `extract_all`: walks `tree_dir` for files carrying an `<file>.json`
    /// `EntryManifest` sidecar, preserving each entry's original ident and
    /// decoded path, and restores the magic/flags from `bnd.json`. Files
    /// with no sidecar (not part of the original archive) are skipped with
    /// a warning rather than aborting the whole rebuild.
    pub fn rebuild_from_tree(tree_dir: &Path, output_path: &Path) -> Result<()> {
        let bnd_manifest = BndManifest::load(tree_dir)
            .map_err(|_| Error::ManifestMissing(tree_dir.to_path_buf()))?;

        let mut magic = [0u8; 12];
        let magic_bytes = bnd_manifest.magic.as_bytes();
        let len = magic_bytes.len().min(12);
        magic[..len].copy_from_slice(&magic_bytes[..len]);

        let mut builder = StandaloneBuilder::new()
            .with_magic(magic)
            .with_flags(bnd_manifest.flags);

        for dir_entry in WalkDir::new(tree_dir).into_iter().filter_map(|e| e.ok()) {
            if !dir_entry.file_type().is_file() {
                continue;
            }
            let path = dir_entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                continue;
            }

            match EntryManifest::load(path) {
                Ok(entry) => builder.add_with_ident(path, entry.path, entry.ident),
                Err(e) => warn!("skipping {}: {e}", path.display()),
            }
        }

        builder.write(output_path)
    }
}

/// Renames an existing file at `path` to `path.old_<n>` (lowest
/// non-colliding `n`) so a fresh write at `path` never clobbers it.
fn make_room_for(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let mut n = 0u32;
    loop {
        let mut candidate = path.as_os_str().to_owned();
        candidate.push(format!(".old_{n}"));
        let candidate = PathBuf::from(candidate);
        if !candidate.exists() {
            fs::rename(path, &candidate).map_err(|e| Error::io(path, e))?;
            return Ok(());
        }
        n += 1;
    }
}

/// A contributed file awaiting assignment of an ident and final offsets.
struct Contribution {
    real_path: PathBuf,
    virtual_path: String,
    ident: Option<u32>,
}

/// Packs a fresh standalone archive from registered `(real_path,
/// virtual_path)` pairs. Always writes the 24-byte entry variant; see
/// spec's non-goal on the 20-byte variant.
#[derive(Default)]
pub struct StandaloneBuilder {
    contributions: Vec<Contribution>,
    magic: Option<[u8; 12]>,
    flags: u32,
}

impl StandaloneBuilder {
    pub fn new() -> Self {
        Self {
            contributions: Vec::new(),
            magic: None,
            flags: DEFAULT_FLAGS,
        }
    }

    pub fn with_magic(mut self, magic: [u8; 12]) -> Self {
        self.magic = Some(magic);
        self
    }

    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    pub fn add(&mut self, real_path: impl Into<PathBuf>, virtual_path: impl Into<String>) {
        self.contributions.push(Contribution {
            real_path: real_path.into(),
            virtual_path: virtual_path.into(),
            ident: None,
        });
    }

    /// Like `add`, but preserves a specific ident instead of letting `write`
    /// assign one by registration order — used when rebuilding an archive
    /// from a previously extracted tree, where idents are part of the
    /// original byte layout.
    pub fn add_with_ident(
        &mut self,
        real_path: impl Into<PathBuf>,
        virtual_path: impl Into<String>,
        ident: u32,
    ) {
        self.contributions.push(Contribution {
            real_path: real_path.into(),
            virtual_path: virtual_path.into(),
            ident: Some(ident),
        });
    }

    /// Assigns monotonically increasing idents (starting at 0, in
    /// registration order) and writes header, entries, strings block and
    /// files block to `output_path`.
    pub fn write(&self, output_path: &Path) -> Result<()> {
        let flags = self.flags | FLAG_WIDE_ENTRY;
        let magic = self.magic.unwrap_or_else(default_magic);

        let header_size = 32u64;
        let entry_size = 24u64;
        let entries_size = entry_size * self.contributions.len() as u64;

        let mut strings_section = Vec::new();
        let mut string_offsets = Vec::with_capacity(self.contributions.len());
        for contribution in &self.contributions {
            string_offsets.push(strings_section.len() as u32);
            write_sjis_cstring(&mut strings_section, &contribution.virtual_path)
                .map_err(|e| Error::io(&contribution.real_path, e))?;
        }
        let strings_start = header_size + entries_size;
        let strings_len = align_up(strings_section.len() as u64, 16);

        let data_start = strings_start + strings_len;

        let mut file_bodies = Vec::with_capacity(self.contributions.len());
        let mut data_offsets = Vec::with_capacity(self.contributions.len());
        let mut cursor = data_start;
        for contribution in &self.contributions {
            let body =
                fs::read(&contribution.real_path).map_err(|e| Error::io(&contribution.real_path, e))?;
            data_offsets.push(cursor as u32);
            cursor += align_up(body.len() as u64, 16);
            file_bodies.push(body);
        }

        let mut out = File::create(output_path).map_err(|e| Error::io(output_path, e))?;

        write_le(
            &mut out,
            &StandaloneHeaderWire {
                magic,
                flags,
                entry_count: self.contributions.len() as u32,
                data_offset: data_start as u32,
                zero1: 0,
                zero2: 0,
            },
        )
        .map_err(|e| Error::io(output_path, e))?;

        for (index, contribution) in self.contributions.iter().enumerate() {
            let data_size = file_bodies[index].len() as u32;
            write_le(
                &mut out,
                &StandaloneEntry24Wire {
                    unk1: ENTRY_UNK1,
                    data_size,
                    data_offset: data_offsets[index],
                    ident: contribution.ident.unwrap_or(index as u32),
                    path_offset: strings_start as u32 + string_offsets[index],
                    unk2: data_size,
                },
            )
            .map_err(|e| Error::io(output_path, e))?;
        }

        out.write_all(&strings_section)
            .map_err(|e| Error::io(output_path, e))?;
        write_padding(
            &mut out,
            (strings_len - strings_section.len() as u64) as usize,
        )
        .map_err(|e| Error::io(output_path, e))?;

        for body in &file_bodies {
            out.write_all(body).map_err(|e| Error::io(output_path, e))?;
            write_padding(&mut out, (align_up(body.len() as u64, 16) - body.len() as u64) as usize)
                .map_err(|e| Error::io(output_path, e))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn builds_then_loads_round_trip() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("a.txt");
        fs::write(&source, b"hello").unwrap();

        let mut builder = StandaloneBuilder::new();
        builder.add(&source, "chr\\c0000.anibnd");

        let archive_path = dir.path().join("out.bnd");
        builder.write(&archive_path).unwrap();

        let mut archive = StandaloneArchive::load(&archive_path).unwrap();
        assert!(archive.header().wide_entries());
        assert_eq!(archive.header().entries.len(), 1);
        assert_eq!(archive.header().entries[0].decoded_path, "chr\\c0000.anibnd");

        let output_dir = dir.path().join("extracted");
        let written = archive
            .extract_all(&archive_path, &output_dir, true)
            .unwrap();
        assert_eq!(written.len(), 1);
        let content = fs::read_to_string(&written[0]).unwrap();
        assert_eq!(content, "hello");
    }

    #[test]
    fn scenario_d_absolute_path_extracts_under_drive_folder() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("common.emevd");
        fs::write(&source, b"evt").unwrap();

        let mut builder = StandaloneBuilder::new();
        builder.add(&source, "N:\\FRPG\\data\\event\\common.emevd");
        let archive_path = dir.path().join("out.bnd");
        builder.write(&archive_path).unwrap();

        let mut archive = StandaloneArchive::load(&archive_path).unwrap();
        let output_dir = dir.path().join("output");
        archive
            .extract_all(&archive_path, &output_dir, true)
            .unwrap();

        assert!(output_dir
            .join("N/FRPG/data/event/common.emevd")
            .exists());
    }

    #[test]
    fn extraction_conflict_renames_existing_file() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("a.txt");
        fs::write(&source, b"new").unwrap();

        let mut builder = StandaloneBuilder::new();
        builder.add(&source, "a.txt");
        let archive_path = dir.path().join("out.bnd");
        builder.write(&archive_path).unwrap();

        let output_dir = dir.path().join("output");
        fs::create_dir_all(&output_dir).unwrap();
        fs::write(output_dir.join("a.txt"), b"old").unwrap();

        let mut archive = StandaloneArchive::load(&archive_path).unwrap();
        archive
            .extract_all(&archive_path, &output_dir, true)
            .unwrap();

        assert_eq!(fs::read_to_string(output_dir.join("a.txt")).unwrap(), "new");
        assert_eq!(
            fs::read_to_string(output_dir.join("a.txt.old_0")).unwrap(),
            "old"
        );
    }

    #[test]
    fn rebuilds_from_extracted_tree_round_trip() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.bin");
        fs::write(&a, b"hello").unwrap();
        fs::write(&b, b"world!!").unwrap();

        let mut builder = StandaloneBuilder::new();
        builder.add_with_ident(&a, "chr\\c0000.anibnd", 3);
        builder.add_with_ident(&b, "chr\\c0001.anibnd", 7);
        let archive_path = dir.path().join("out.bnd");
        builder.write(&archive_path).unwrap();

        let mut archive = StandaloneArchive::load(&archive_path).unwrap();
        let extracted_dir = dir.path().join("extracted");
        archive
            .extract_all(&archive_path, &extracted_dir, true)
            .unwrap();

        let rebuilt_path = dir.path().join("rebuilt.bnd");
        StandaloneArchive::rebuild_from_tree(&extracted_dir, &rebuilt_path).unwrap();

        let rebuilt = StandaloneArchive::load(&rebuilt_path).unwrap();
        assert_eq!(rebuilt.header().magic, archive.header().magic);
        assert_eq!(rebuilt.header().flags, archive.header().flags);
        assert_eq!(rebuilt.header().entries.len(), 2);

        let mut by_ident: Vec<_> = rebuilt.header().entries.iter().collect();
        by_ident.sort_by_key(|e| e.ident);
        assert_eq!(by_ident[0].ident, 3);
        assert_eq!(by_ident[0].decoded_path, "chr\\c0000.anibnd");
        assert_eq!(by_ident[1].ident, 7);
        assert_eq!(by_ident[1].decoded_path, "chr\\c0001.anibnd");
    }
}
