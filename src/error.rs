use std::path::PathBuf;

/// The error taxonomy used throughout the codec stack.
///
/// Variants map directly onto the fatal/non-fatal split described by the
/// project's error handling design: `InvalidMagic`, `StructurallyInconsistent`,
/// `IoFailure` and `CodecFailure` are always fatal for the file being
/// processed. `NameResolutionMiss` and `ExtractionConflict` are recoverable
/// and are constructed but not necessarily propagated by callers that know
/// how to fall back. `ManifestMissing` is fatal for the archive currently
/// being reimported, but drivers keep going on other archives.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid magic in {path}: expected {expected:?}, found {found:?}")]
    InvalidMagic {
        path: PathBuf,
        expected: &'static str,
        found: String,
    },

    #[error("{path}: {reason}")]
    StructurallyInconsistent { path: PathBuf, reason: String },

    #[error("io error on {path}: {source}")]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("zlib codec error: {0}")]
    CodecFailure(#[from] std::io::Error),

    #[error("no filelist entry for key {key:08X}")]
    NameResolutionMiss { key: u32 },

    #[error("extraction target already exists: {0}")]
    ExtractionConflict(PathBuf),

    #[error("manifest missing for archive at {0}")]
    ManifestMissing(PathBuf),

    #[error("{0}")]
    Message(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoFailure {
            path: path.into(),
            source,
        }
    }

    pub fn structurally_inconsistent(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::StructurallyInconsistent {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_magic(
        path: impl Into<PathBuf>,
        expected: &'static str,
        found: impl Into<String>,
    ) -> Self {
        Self::InvalidMagic {
            path: path.into(),
            expected,
            found: found.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Message(format!("manifest json error: {source}"))
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Self::Message(value.to_string())
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
