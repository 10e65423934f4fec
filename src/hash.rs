//! Name-hash function mapping virtual paths to the 32-bit keys used in the
//! external archive header.

/// Computes the 32-bit key used to identify an entry in an `ExternalHeader`
/// without it carrying its own name.
///
/// `h = h*37 + byte` over the lowercased path, reduced mod 2^32. There is no
/// seed or salt; the same string always hashes to the same key.
pub struct PathHasher;

impl PathHasher {
    pub fn hash(path: &str) -> u32 {
        let lowered = path.to_lowercase();
        let mut hash: u32 = 0;
        for byte in lowered.bytes() {
            hash = hash.wrapping_mul(37).wrapping_add(u32::from(byte));
        }
        hash
    }

    /// The 8-digit uppercase hex form used as a fallback file name when a
    /// key has no filelist entry.
    pub fn hex(key: u32) -> String {
        format!("{key:08X}")
    }
}

#[cfg(test)]
mod tests {
    use super::PathHasher;

    #[test]
    fn hash_is_deterministic() {
        let path = "/chr/c1000.anibnd.dcx";
        assert_eq!(PathHasher::hash(path), PathHasher::hash(path));
    }

    #[test]
    fn known_vector() {
        assert_eq!(PathHasher::hash("/chr/c0000.anibnd.dcx"), 0xF863_0FB1);
    }

    #[test]
    fn empty_string_hashes_to_zero() {
        assert_eq!(PathHasher::hash(""), 0);
    }

    #[test]
    fn hex_form() {
        assert_eq!(PathHasher::hex(0xF863_0FB1), "F8630FB1");
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(
            PathHasher::hash("/CHR/C0000.ANIBND.DCX"),
            PathHasher::hash("/chr/c0000.anibnd.dcx")
        );
    }
}
