//! Path encoding and alignment helpers shared by the standalone archive and
//! the bulk payload codecs.

use std::io::{self, Read, Write};

/// The fixed absolute prefix used by the game for in-archive absolute paths,
/// e.g. `N:\FRPG\data\event\common.emevd`. Kept for documentation purposes;
/// path rewriting below keys only on the drive letter, not this whole
/// prefix, per the extraction scenario it must reproduce exactly.
pub const VIRTUAL_ROOT: &str = "N:\\FRPG\\data";

/// Reads bytes up to (and consuming) a NUL terminator, then decodes them as
/// shift-JIS. Falls back to a lossy decode on malformed bytes, since the
/// corpus of real paths is overwhelmingly ASCII in practice and aborting the
/// whole extraction over one bad byte is not worth it.
pub fn read_sjis_cstring<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut bytes = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        reader.read_exact(&mut byte)?;
        if byte[0] == 0 {
            break;
        }
        bytes.push(byte[0]);
    }
    let (decoded, _, _) = encoding_rs::SHIFT_JIS.decode(&bytes);
    Ok(decoded.into_owned())
}

/// Encodes `s` as shift-JIS and writes it NUL-terminated. Used when
/// rebuilding a standalone archive's strings block; must reproduce the exact
/// bytes the game expects, so no lossy fallback is offered here.
pub fn write_sjis_cstring<W: Write>(writer: &mut W, s: &str) -> io::Result<()> {
    let (encoded, _, had_errors) = encoding_rs::SHIFT_JIS.encode(s);
    if had_errors {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("path '{s}' cannot be represented in shift-JIS"),
        ));
    }
    writer.write_all(&encoded)?;
    writer.write_all(&[0])
}

/// True if the decoded in-archive path is an absolute Windows-style path
/// (`<drive>:\...`), as opposed to one relative to the archive's own
/// location on disk.
pub fn is_virtual_absolute(decoded: &str) -> bool {
    decoded.as_bytes().get(1) == Some(&b':')
}

/// Rewrites a decoded in-archive path into a relative, joinable,
/// host-separator path safe to nest under an output directory.
///
/// An absolute path's drive letter becomes a top-level folder and the rest
/// of the path is kept intact with separators flipped, e.g.
/// `N:\FRPG\data\event\common.emevd` -> `N/FRPG/data/event/common.emevd`. A
/// relative path just has its separators flipped and any leading separator
/// stripped.
pub fn rewrite_archive_path(decoded: &str) -> String {
    if is_virtual_absolute(decoded) {
        let drive = &decoded[..1];
        let rest = decoded[2..].replace('\\', "/");
        format!("{drive}/{}", rest.trim_start_matches('/'))
    } else {
        decoded.replace('\\', "/").trim_start_matches('/').to_string()
    }
}

/// Reverses [`rewrite_archive_path`] for an absolute entry: splits off the
/// leading drive-letter folder and flips separators back to Windows form.
pub fn restore_virtual_absolute(relative: &str) -> String {
    let (drive, rest) = relative.split_once('/').unwrap_or((relative, ""));
    format!("{drive}:\\{}", rest.replace('/', "\\"))
}

pub fn write_padding<W: Write>(writer: &mut W, len: usize) -> io::Result<()> {
    if len == 0 {
        return Ok(());
    }
    writer.write_all(&vec![0u8; len])
}

/// Rounds `value` up to the next multiple of `alignment`.
pub fn align_up(value: u64, alignment: u64) -> u64 {
    let remainder = value % alignment;
    if remainder == 0 {
        value
    } else {
        value + (alignment - remainder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrite_absolute_path_keeps_drive_relative_remainder() {
        let decoded = "N:\\FRPG\\data\\event\\common.emevd";
        assert!(is_virtual_absolute(decoded));
        assert_eq!(
            rewrite_archive_path(decoded),
            "N/FRPG/data/event/common.emevd"
        );
    }

    #[test]
    fn rewrite_relative_path() {
        let decoded = "chr\\c0000.anibnd";
        assert!(!is_virtual_absolute(decoded));
        assert_eq!(rewrite_archive_path(decoded), "chr/c0000.anibnd");
    }

    #[test]
    fn align_up_rounds_correctly() {
        assert_eq!(align_up(0, 16), 0);
        assert_eq!(align_up(1, 16), 16);
        assert_eq!(align_up(16, 16), 16);
        assert_eq!(align_up(17, 16), 32);
    }

    #[test]
    fn restore_round_trips_separators() {
        let relative = "N/FRPG/data/event/common.emevd";
        assert_eq!(
            restore_virtual_absolute(relative),
            "N:\\FRPG\\data\\event\\common.emevd"
        );
    }
}
