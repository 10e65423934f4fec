use crate::driver::{ExtractionDriver, ReimportDriver};
use crate::error::{Error, Result};
use crate::filelist::Filelist;
use crate::format::external::ExternalArchive;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

/// Flat flag surface for the external archive tool-chain; no subcommands.
#[derive(Debug, Parser)]
#[command(
    name = "dvdbnd",
    version,
    about = "Unpacks, repacks and inflates the archive containers of a certain action-RPG"
)]
pub struct Cli {
    /// Export a single external archive pair given the header path; the
    /// payload path is derived by substituting the extension.
    #[arg(short = 'e', value_name = "HEADER")]
    pub export_one: Option<PathBuf>,

    /// Export all four numbered archive pairs found in this directory,
    /// running the full cascading extraction (inflate, unpack standalone,
    /// unpack internal composed archives).
    #[arg(short = 'E', value_name = "DIR")]
    pub export_all: Option<PathBuf>,

    /// Override the filelist used for key -> name resolution.
    #[arg(short = 'l', value_name = "PATH")]
    pub filelist: Option<PathBuf>,

    /// Build a single external archive from this directory.
    #[arg(short = 'i', value_name = "DIR")]
    pub import_one: Option<PathBuf>,

    /// Rebuild all four numbered archives from a tree of four
    /// subdirectories named `0`..`3`.
    #[arg(short = 'I', value_name = "DIR")]
    pub import_all: Option<PathBuf>,

    /// Output directory.
    #[arg(short = 'o', value_name = "PATH")]
    pub output: PathBuf,
}

pub fn run(cli: Cli) -> Result<()> {
    if let Some(header_path) = &cli.export_one {
        return export_one(header_path, cli.filelist.as_deref(), &cli.output);
    }
    if let Some(dir) = &cli.export_all {
        return ExtractionDriver::full_extraction(dir, dir, &cli.output, cli.filelist.as_deref());
    }
    if let Some(dir) = &cli.import_one {
        return import_one(dir, &cli.output);
    }
    if let Some(dir) = &cli.import_all {
        return ReimportDriver::rebuild_all(dir, &cli.output);
    }

    Err(Error::from(
        "no operation selected: one of -e, -E, -i, -I is required",
    ))
}

fn export_one(header_path: &Path, filelist_path: Option<&Path>, output: &Path) -> Result<()> {
    let payload_path = ExternalArchive::sibling_payload_path(header_path);
    let filelist = filelist_path.map(Filelist::load).transpose()?;

    let mut archive = ExternalArchive::load(header_path, &payload_path)?;
    archive.export_all(output, filelist.as_ref(), true)
}

fn import_one(dir: &Path, output: &Path) -> Result<()> {
    fs::create_dir_all(output).map_err(|e| Error::io(output, e))?;
    let stem = dir.file_name().and_then(|n| n.to_str()).unwrap_or("archive");
    let header_path = output.join(format!("{stem}.bhd5"));
    let payload_path = output.join(format!("{stem}.bdt"));
    ExternalArchive::import(&header_path, &payload_path, dir)
}
