//! A closed mapping from four-byte magics to a canonical lowercase
//! extension, used only to pick a filename when a file's own name is
//! unknown. Never invent an extension outside this table.

const MAGICS: &[(&[u8; 4], &str)] = &[
    (b"BDF3", "bdt"),
    (b"BHD5", "bhd5"),
    (b"BHF3", "bhf"),
    (b"DCX\0", "dcx"),
    (b"BND3", "bnd"),
    (b"FEV1", "fev"),
    (b"FSB4", "fsb"),
    (b"BJBO", "bjbo"),
    (b"DFPN", "nfd"),
    (b"EDF\0", "emedf"),
    (b"ELD\0", "emeld"),
    (b"EVD\0", "emevd"),
];

pub struct TypeProber;

impl TypeProber {
    /// Guesses a canonical lowercase extension from the first four bytes of
    /// a file. Returns `"xxx"` when the magic is not in the known set or
    /// there aren't four bytes to look at.
    pub fn probe(bytes: &[u8]) -> &'static str {
        if bytes.len() < 4 {
            return "xxx";
        }
        let magic: [u8; 4] = [bytes[0], bytes[1], bytes[2], bytes[3]];
        MAGICS
            .iter()
            .find(|(known, _)| **known == magic)
            .map(|(_, ext)| *ext)
            .unwrap_or("xxx")
    }
}

#[cfg(test)]
mod tests {
    use super::TypeProber;

    #[test]
    fn probes_known_magic() {
        assert_eq!(TypeProber::probe(b"BND3rest"), "bnd");
        assert_eq!(TypeProber::probe(b"DCX\0rest"), "dcx");
    }

    #[test]
    fn probes_game_table_magics() {
        assert_eq!(TypeProber::probe(b"DFPNrest"), "nfd");
        assert_eq!(TypeProber::probe(b"EDF\0rest"), "emedf");
        assert_eq!(TypeProber::probe(b"ELD\0rest"), "emeld");
        assert_eq!(TypeProber::probe(b"EVD\0rest"), "emevd");
    }

    #[test]
    fn unknown_magic_falls_back_to_xxx() {
        assert_eq!(TypeProber::probe(b"ZZZZ"), "xxx");
    }

    #[test]
    fn short_input_falls_back_to_xxx() {
        assert_eq!(TypeProber::probe(b"BN"), "xxx");
    }
}
