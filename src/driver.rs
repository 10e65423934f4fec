//! Drives multi-archive operations over a whole working tree: the
//! five-phase cascading extraction and the batch reimport of the four
//! numbered external archives.
//!
//! Each phase walks the tree once and continues past individual failures;
//! the driver never aborts a run over one bad file.

use crate::error::{Error, Result};
use crate::filelist::Filelist;
use crate::format::compressed::CompressedPackage;
use crate::format::external::ExternalArchive;
use crate::format::standalone::StandaloneArchive;
use crate::format::type_prober::TypeProber;
use log::{info, warn};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Where the four numbered external archives are unpacked to within a full
/// extraction's output directory.
pub const INTERROOT: &str = "N/FRPG/data/INTERROOT_win32";

const EXTERNAL_ARCHIVE_COUNT: u32 = 4;

pub struct ExtractionDriver;

impl ExtractionDriver {
    /// external extract -> inflate -> unpack standalone (twice) -> unpack
    /// internal composed -> inflate again. `filelist_override`, when set,
    /// is used for all four archives instead of each one's default
    /// `dvdbnd{k}.hashmap.json` in `resources_dir`.
    pub fn full_extraction(
        data_dir: &Path,
        resources_dir: &Path,
        output_dir: &Path,
        filelist_override: Option<&Path>,
    ) -> Result<()> {
        let tree_root = output_dir.join(INTERROOT);
        fs::create_dir_all(&tree_root).map_err(|e| Error::io(&tree_root, e))?;

        Self::extract_external_archives(data_dir, resources_dir, &tree_root, filelist_override)?;
        Self::inflate_tree(&tree_root);
        Self::unpack_standalone_archives(&tree_root);
        Self::unpack_standalone_archives(&tree_root);
        Self::unpack_internal_archives(&tree_root);
        Self::inflate_tree(&tree_root);
        Ok(())
    }

    fn extract_external_archives(
        data_dir: &Path,
        resources_dir: &Path,
        tree_root: &Path,
        filelist_override: Option<&Path>,
    ) -> Result<()> {
        for ident in 0..EXTERNAL_ARCHIVE_COUNT {
            let header_path = data_dir.join(format!("dvdbnd{ident}.bhd5"));
            let payload_path = data_dir.join(format!("dvdbnd{ident}.bdt"));
            if !header_path.is_file() {
                warn!("no external archive at {}", header_path.display());
                continue;
            }

            let filelist_path = match filelist_override {
                Some(path) => path.to_path_buf(),
                None => Filelist::default_path(resources_dir, ident),
            };
            let filelist = if filelist_path.is_file() {
                match Filelist::load(&filelist_path) {
                    Ok(fl) => Some(fl),
                    Err(e) => {
                        warn!("failed to load filelist {}: {e}", filelist_path.display());
                        None
                    }
                }
            } else {
                None
            };

            match ExternalArchive::load(&header_path, &payload_path) {
                Ok(mut archive) => {
                    if let Err(e) = archive.export_all(tree_root, filelist.as_ref(), true) {
                        warn!("failed to export {}: {e}", header_path.display());
                    }
                }
                Err(e) => warn!("failed to load {}: {e}", header_path.display()),
            }
        }
        Ok(())
    }

    /// Decompresses every `.dcx` file under `dir` in place, removing the
    /// original and giving the inflated file a probed extension when
    /// stripping `.dcx` leaves it with none.
    fn inflate_tree(dir: &Path) {
        let candidates = files_ending_with(dir, "dcx");
        for path in candidates {
            if let Err(e) = Self::inflate_one(&path) {
                warn!("failed to inflate {}: {e}", path.display());
            }
        }
    }

    fn inflate_one(path: &Path) -> Result<()> {
        let mut file = File::open(path).map_err(|e| Error::io(path, e))?;
        let package = CompressedPackage::decode(&mut file, path)?;
        drop(file);
        let payload = package.into_payload();

        let mut inflated_path = path.with_extension("");
        fs::write(&inflated_path, &payload).map_err(|e| Error::io(&inflated_path, e))?;
        fs::remove_file(path).map_err(|e| Error::io(path, e))?;

        if inflated_path.extension().is_none() {
            let ext = TypeProber::probe(&payload);
            let renamed = inflated_path.with_extension(ext);
            fs::rename(&inflated_path, &renamed).map_err(|e| Error::io(&renamed, e))?;
            inflated_path = renamed;
        }
        info!("inflated {} -> {}", path.display(), inflated_path.display());
        Ok(())
    }

    /// Unpacks every file whose name ends in `bnd` under `dir`, in place,
    /// removing the archive on success. Called twice per full extraction
    /// since standalone archives can nest one level.
    fn unpack_standalone_archives(dir: &Path) {
        for path in files_ending_with(dir, "bnd") {
            match StandaloneArchive::load(&path) {
                Ok(mut archive) => match archive.extract_all(&path, dir, true) {
                    Ok(_) => {
                        if let Err(e) = fs::remove_file(&path) {
                            warn!("failed to remove {}: {e}", path.display());
                        }
                    }
                    Err(e) => warn!("failed to unpack {}: {e}", path.display()),
                },
                Err(e) => warn!("{} is not a standalone archive: {e}", path.display()),
            }
        }
    }

    /// Unpacks every header/payload pair located beside each other under
    /// `dir` (payload files whose name ends in `bdt`), with the
    /// `.chrtpfbdt` special case: the header lives in a subdirectory named
    /// after the payload's stem.
    fn unpack_internal_archives(dir: &Path) {
        for payload_path in files_ending_with(dir, "bdt") {
            let header_path = internal_header_path(&payload_path);
            if !header_path.is_file() {
                warn!("no header found for {}", payload_path.display());
                continue;
            }

            match ExternalArchive::load(&header_path, &payload_path) {
                Ok(mut archive) => {
                    let target_dir = payload_path.parent().unwrap_or(dir);
                    match archive.export_all(target_dir, None, false) {
                        Ok(()) => {
                            let _ = fs::remove_file(&payload_path);
                            let _ = fs::remove_file(&header_path);
                        }
                        Err(e) => warn!("failed to unpack {}: {e}", payload_path.display()),
                    }
                }
                Err(e) => warn!(
                    "{} is not an internal composed archive: {e}",
                    payload_path.display()
                ),
            }
        }
    }
}

/// The BHF header path for an internal composed payload: `foo.bdt` ->
/// `foo.bhd` beside it; `foo.chrtpfbdt` -> `foo/foo.chrtpfbhd` in a subdir
/// named after the payload's stem.
fn internal_header_path(payload_path: &Path) -> PathBuf {
    let dir = payload_path.parent().unwrap_or_else(|| Path::new("."));
    let stem = payload_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let ext = payload_path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    let dotted = format!(".{ext}");
    let prefix = if dotted.len() > 3 {
        &dotted[..dotted.len() - 3]
    } else {
        "."
    };
    let header_name = format!("{stem}{prefix}bhd");

    if ext == "chrtpfbdt" {
        dir.join(stem).join(header_name)
    } else {
        dir.join(header_name)
    }
}

/// Lists every regular file under `dir` whose name ends in `suffix`
/// (matching the original tool-chain's bare `str.endswith` checks, not a
/// dotted-extension comparison).
fn files_ending_with(dir: &Path, suffix: &str) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(suffix))
        })
        .collect()
}

/// Rebuilds the four numbered external archives from a tree of four
/// subdirectories named `0`..`3`, each holding a previously extracted (or
/// hand-authored) archive's contents plus its manifest sidecars.
pub struct ReimportDriver;

impl ReimportDriver {
    pub fn rebuild_all(data_dir: &Path, output_dir: &Path) -> Result<()> {
        fs::create_dir_all(output_dir).map_err(|e| Error::io(output_dir, e))?;

        for ident in 0..EXTERNAL_ARCHIVE_COUNT {
            let subdir = data_dir.join(ident.to_string());
            if !subdir.is_dir() {
                warn!("no subdirectory '{ident}' under {}", data_dir.display());
                continue;
            }

            let header_path = output_dir.join(format!("dvdbnd{ident}.bhd5"));
            let payload_path = output_dir.join(format!("dvdbnd{ident}.bdt"));
            if let Err(e) = ExternalArchive::import(&header_path, &payload_path, &subdir) {
                warn!("failed to rebuild archive {ident}: {e}");
            } else {
                info!("rebuilt {}", header_path.display());
            }
        }
        Ok(())
    }
}
