//! JSON mapping of `PathKey` (as 8-digit uppercase hex) to the relative
//! virtual path it hashes from, used to recover names on export.

use crate::error::Result;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, Clone)]
pub struct Filelist {
    by_key: HashMap<u32, String>,
}

impl Filelist {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| crate::error::Error::io(path, e))?;
        let raw: HashMap<String, String> = serde_json::from_str(&data)?;
        let mut by_key = HashMap::with_capacity(raw.len());
        for (key, value) in raw {
            let parsed = u32::from_str_radix(&key, 16).map_err(|_| {
                crate::error::Error::structurally_inconsistent(
                    path,
                    format!("filelist key '{key}' is not 8-digit hex"),
                )
            })?;
            by_key.insert(parsed, value);
        }
        Ok(Self { by_key })
    }

    /// The default resource path for archive index `k`:
    /// `<resources>/dvdbnd{k}.hashmap.json`.
    pub fn default_path(resources_dir: &Path, index: u32) -> std::path::PathBuf {
        resources_dir.join(format!("dvdbnd{index}.hashmap.json"))
    }

    pub fn resolve(&self, key: u32) -> Option<&str> {
        self.by_key.get(&key).map(String::as_str)
    }

    /// All relative paths this filelist claims, used to detect decompress-on-export
    /// collisions before an inflated file would overwrite an expected name.
    pub fn all_values(&self) -> impl Iterator<Item = &str> {
        self.by_key.values().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn resolves_known_key() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"F8630FB1": "/a/b.txt"}}"#).unwrap();
        let filelist = Filelist::load(file.path()).unwrap();
        assert_eq!(filelist.resolve(0xF863_0FB1), Some("/a/b.txt"));
    }

    #[test]
    fn unknown_key_resolves_to_none() {
        let filelist = Filelist::default();
        assert_eq!(filelist.resolve(0xDEAD_BEEF), None);
    }
}
