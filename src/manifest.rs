//! JSON sidecars persisted alongside an extraction tree so that a later
//! reimport can rebuild byte-comparable archives. Extraction is otherwise
//! lossy: record grouping, entry idents and the compressed-or-not
//! distinction cannot be recovered from the tree alone.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const RECORDS_FILE: &str = "records.json";
pub const DECOMPRESSED_FILE: &str = "decompressed.json";
pub const BND_FILE: &str = "bnd.json";

/// Maps each external header record index to the ordered list of relative
/// entry paths it owned.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RecordsManifest {
    pub records: Vec<Vec<String>>,
}

impl RecordsManifest {
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(RECORDS_FILE);
        let data = fs::read_to_string(&path).map_err(|e| crate::error::Error::io(&path, e))?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        let path = dir.join(RECORDS_FILE);
        let data = serde_json::to_string_pretty(self)?;
        fs::write(&path, data).map_err(|e| crate::error::Error::io(&path, e))
    }
}

/// Flat list of relative paths (without their `.dcx` extension) whose
/// originals were compressed payloads.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DecompressedManifest {
    pub paths: Vec<String>,
}

impl DecompressedManifest {
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(DECOMPRESSED_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path).map_err(|e| crate::error::Error::io(&path, e))?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        let path = dir.join(DECOMPRESSED_FILE);
        let data = serde_json::to_string_pretty(self)?;
        fs::write(&path, data).map_err(|e| crate::error::Error::io(&path, e))
    }

    pub fn contains(&self, relative_path: &str) -> bool {
        self.paths.iter().any(|p| p == relative_path)
    }
}

/// Per standalone entry: the stable ident plus the decoded virtual path,
/// persisted as `<extracted-file>.json`.
#[derive(Debug, Serialize, Deserialize)]
pub struct EntryManifest {
    pub ident: u32,
    pub path: String,
}

impl EntryManifest {
    pub fn sidecar_path(entry_path: &Path) -> PathBuf {
        let mut name = entry_path.as_os_str().to_owned();
        name.push(".json");
        PathBuf::from(name)
    }

    pub fn load(entry_path: &Path) -> Result<Self> {
        let sidecar = Self::sidecar_path(entry_path);
        let data = fs::read_to_string(&sidecar).map_err(|e| crate::error::Error::io(&sidecar, e))?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, entry_path: &Path) -> Result<()> {
        let sidecar = Self::sidecar_path(entry_path);
        let data = serde_json::to_string_pretty(self)?;
        fs::write(&sidecar, data).map_err(|e| crate::error::Error::io(&sidecar, e))
    }
}

/// Per standalone archive: the header magic and flags, persisted as
/// `<extraction-dir>/bnd.json`.
#[derive(Debug, Serialize, Deserialize)]
pub struct BndManifest {
    pub magic: String,
    pub flags: u32,
}

impl BndManifest {
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(BND_FILE);
        let data = fs::read_to_string(&path).map_err(|e| crate::error::Error::io(&path, e))?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        let path = dir.join(BND_FILE);
        let data = serde_json::to_string_pretty(self)?;
        fs::write(&path, data).map_err(|e| crate::error::Error::io(&path, e))
    }
}
