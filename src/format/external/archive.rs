//! Pairs an [`ExternalHeader`] with an [`ExternalPayload`] and provides the
//! export/import surface that rebuilds a tree from an archive and back.

use super::header::{DataEntry, ExternalHeader};
use super::payload::ExternalPayload;
use crate::error::{Error, Result};
use crate::filelist::Filelist;
use crate::format::compressed::CompressedPackage;
use crate::format::type_prober::TypeProber;
use crate::hash::PathHasher;
use crate::manifest::{DecompressedManifest, RecordsManifest};
use log::{info, warn};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub struct ExternalArchive {
    header: ExternalHeader,
    payload: ExternalPayload,
}

impl ExternalArchive {
    pub fn load(header_path: &Path, payload_path: &Path) -> Result<Self> {
        let mut header_file = fs::File::open(header_path).map_err(|e| Error::io(header_path, e))?;
        let header = ExternalHeader::load(&mut header_file, header_path)?;
        let payload = ExternalPayload::open(payload_path)?;
        Ok(Self { header, payload })
    }

    pub fn header(&self) -> &ExternalHeader {
        &self.header
    }

    /// The payload path conventionally derived from a header path by
    /// substituting its extension.
    pub fn sibling_payload_path(header_path: &Path) -> PathBuf {
        header_path.with_extension("bdt")
    }

    /// Export flow: every entry of every record, in order, resolved via the
    /// filelist (falling back to a probed hex name), written under
    /// `output_dir`, with the chosen relative path recorded per record so a
    /// later reimport can rebuild the header's partitioning.
    pub fn export_all(
        &mut self,
        output_dir: &Path,
        filelist: Option<&Filelist>,
        decompress: bool,
    ) -> Result<()> {
        fs::create_dir_all(output_dir).map_err(|e| Error::io(output_dir, e))?;

        // Names the filelist already claims, so decompress-on-export can
        // detect a collision before clobbering an expected file.
        let expected_names: HashSet<&str> = filelist
            .map(|fl| {
                fl.all_values()
                    .map(|v| v.trim_start_matches(['/', '\\']))
                    .collect()
            })
            .unwrap_or_default();

        let mut records_manifest = RecordsManifest {
            records: Vec::with_capacity(self.header.records.len()),
        };
        let mut decompressed_manifest = DecompressedManifest::default();

        for record in &self.header.records {
            let mut record_paths = Vec::with_capacity(record.entries.len());
            for entry in &record.entries {
                match self.export_entry(
                    entry,
                    output_dir,
                    filelist,
                    decompress,
                    &expected_names,
                    &mut decompressed_manifest,
                ) {
                    Ok(relative_path) => record_paths.push(relative_path),
                    Err(e) => warn!("skipping entry {:08X}: {e}", entry.key),
                }
            }
            records_manifest.records.push(record_paths);
        }

        records_manifest.save(output_dir)?;
        if decompress {
            decompressed_manifest.save(output_dir)?;
        }
        Ok(())
    }

    fn export_entry(
        &mut self,
        entry: &DataEntry,
        output_dir: &Path,
        filelist: Option<&Filelist>,
        decompress: bool,
        expected_names: &HashSet<&str>,
        decompressed_manifest: &mut DecompressedManifest,
    ) -> Result<String> {
        let bytes = self.payload.read_at(u64::from(entry.offset), entry.size)?;
        if bytes.len() as u32 != entry.size {
            return Err(Error::structurally_inconsistent(
                output_dir,
                format!(
                    "short read for key {:08X}: wanted {} got {}",
                    entry.key,
                    entry.size,
                    bytes.len()
                ),
            ));
        }

        let resolved = filelist.and_then(|fl| fl.resolve(entry.key));
        let relative_path = match resolved {
            Some(name) => name.trim_start_matches(['/', '\\']).to_string(),
            None => format!("file_{}.{}", PathHasher::hex(entry.key), TypeProber::probe(&bytes)),
        };

        let output_path = output_dir.join(&relative_path);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::write(&output_path, &bytes).map_err(|e| Error::io(&output_path, e))?;
        info!("extracted {relative_path}");

        if decompress && output_path.extension().is_some_and(|e| e == "dcx") {
            let inflated_relative = relative_path.trim_end_matches(".dcx").to_string();
            if expected_names.contains(inflated_relative.as_str()) {
                warn!(
                    "not decompressing {relative_path}: {inflated_relative} is claimed by another entry"
                );
                return Ok(relative_path);
            }
            let inflated_path = output_path.with_extension("");
            match self.try_decompress(&output_path, &inflated_path) {
                Ok(()) => {
                    decompressed_manifest.paths.push(inflated_relative.clone());
                    return Ok(inflated_relative);
                }
                Err(e) => warn!("failed to decompress {relative_path}: {e}"),
            }
        }

        Ok(relative_path)
    }

    fn try_decompress(&self, compressed_path: &Path, inflated_path: &Path) -> Result<()> {
        let mut file = fs::File::open(compressed_path).map_err(|e| Error::io(compressed_path, e))?;
        let package = CompressedPackage::decode(&mut file, compressed_path)?;
        drop(file);
        fs::write(inflated_path, package.payload()).map_err(|e| Error::io(inflated_path, e))?;
        fs::remove_file(compressed_path).map_err(|e| Error::io(compressed_path, e))?;
        Ok(())
    }

    /// Import flow: rebuild a header + payload pair from `data_dir`,
    /// consulting `records.json` (required) and `decompressed.json`
    /// (optional) to recover the grouping an extracted tree alone can't
    /// express.
    pub fn import(header_path: &Path, payload_path: &Path, data_dir: &Path) -> Result<()> {
        let records_manifest = RecordsManifest::load(data_dir)
            .map_err(|_| Error::ManifestMissing(data_dir.to_path_buf()))?;
        let decompressed_manifest = DecompressedManifest::load(data_dir)?;

        let mut path_to_record: HashMap<String, usize> = HashMap::new();
        for (index, paths) in records_manifest.records.iter().enumerate() {
            for path in paths {
                path_to_record.insert(path.clone(), index);
            }
        }

        let mut header = ExternalHeader::new();
        for _ in &records_manifest.records {
            header.push_record();
        }

        let mut payload = ExternalPayload::create(payload_path)?;

        for dir_entry in WalkDir::new(data_dir).into_iter().filter_map(|e| e.ok()) {
            if !dir_entry.file_type().is_file() {
                continue;
            }
            let path = dir_entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                continue;
            }

            if let Err(e) = Self::import_one_file(
                &mut header,
                &mut payload,
                data_dir,
                path,
                &decompressed_manifest,
                &path_to_record,
            ) {
                warn!("skipping {}: {e}", path.display());
            }
        }

        let mut header_file = fs::File::create(header_path).map_err(|e| Error::io(header_path, e))?;
        header.save(&mut header_file)?;
        Ok(())
    }

    fn import_one_file(
        header: &mut ExternalHeader,
        payload: &mut ExternalPayload,
        data_dir: &Path,
        path: &Path,
        decompressed_manifest: &DecompressedManifest,
        path_to_record: &HashMap<String, usize>,
    ) -> Result<()> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::structurally_inconsistent(path, "non-utf8 file name"))?;

        // `record_path` is always the exact, slash-free string `export_entry`
        // wrote into records.json: either the fallback `file_{hex}.{ext}`
        // file name itself, or the archive-relative path with no leading
        // separator. The virtual path fed to `PathHasher` is a separate,
        // leading-slash form used only to recompute the original key.
        let (record_path, key) = if let Some(key) = unnamed_fallback_key(file_name) {
            (file_name.to_string(), key)
        } else {
            let relative = path
                .strip_prefix(data_dir)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");
            let virtual_path = format!("/{relative}");
            let key = PathHasher::hash(&virtual_path);
            (relative, key)
        };

        let mut source_path = path.to_path_buf();
        let mut compressed_temp: Option<PathBuf> = None;
        if decompressed_manifest.contains(&record_path) {
            let mut dcx_name = path.as_os_str().to_owned();
            dcx_name.push(".dcx");
            let dcx_path = PathBuf::from(dcx_name);
            let raw = fs::read(path).map_err(|e| Error::io(path, e))?;
            let package = CompressedPackage::from_payload(raw);
            let mut dcx_file = fs::File::create(&dcx_path).map_err(|e| Error::io(&dcx_path, e))?;
            package.encode(&mut dcx_file, &dcx_path)?;
            compressed_temp = Some(dcx_path.clone());
            source_path = dcx_path;
        }

        let bytes = fs::read(&source_path).map_err(|e| Error::io(&source_path, e))?;
        let (offset, size) = payload.append(&bytes)?;

        if let Some(temp) = compressed_temp {
            let _ = fs::remove_file(temp);
        }

        let record_index = path_to_record.get(&record_path).copied().ok_or_else(|| {
            Error::structurally_inconsistent(
                path,
                format!("'{record_path}' is not listed in any record of records.json"),
            )
        })?;

        header.push_entry(
            record_index,
            DataEntry {
                key,
                size,
                offset: offset as u32,
                unk: 0,
            },
        );
        Ok(())
    }
}

/// Recognizes `export_entry`'s own unnamed-fallback naming convention,
/// `file_{8-digit-uppercase-hex}.{ext}`, returning the original key when
/// `file_name` matches it.
fn unnamed_fallback_key(file_name: &str) -> Option<u32> {
    let hex = file_name.strip_prefix("file_")?;
    let hex = hex.split('.').next().unwrap_or(hex);
    if hex.len() == 8 && hex.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_lowercase()) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        None
    }
}
