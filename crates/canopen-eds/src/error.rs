// crates/canopen-eds/src/error.rs

use alloc::fmt;
use alloc::string::String;

/// Errors that abort an EDS/DCF operation.
///
/// Field-level data problems found while parsing are *not* reported through
/// this type. They are recovered locally and returned as plain messages
/// alongside the parsed `ObjectDictionary`.
#[derive(Debug)]
pub enum EdsError {
    /// The file could not be read or written.
    #[cfg(feature = "std")]
    Io(std::io::Error),

    /// A section of the file has no `[...]` header line.
    MissingHeader {
        /// 1-based position of the offending section in the file.
        section: usize,
    },

    /// A section header is not a known EDS/DCF section name.
    UnknownHeader { header: String },

    /// A mutation of the object dictionary was rejected
    /// (duplicate index/subindex, invalid copy target, ...).
    Dictionary(String),

    /// An error occurred while formatting output text.
    FmtError(fmt::Error),
}

impl EdsError {
    /// Shorthand for building the uniform dictionary error.
    pub(crate) fn dictionary(message: impl Into<String>) -> Self {
        EdsError::Dictionary(message.into())
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for EdsError {
    fn from(e: std::io::Error) -> Self {
        EdsError::Io(e)
    }
}

impl From<fmt::Error> for EdsError {
    fn from(e: fmt::Error) -> Self {
        EdsError::FmtError(e)
    }
}

impl fmt::Display for EdsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "std")]
            EdsError::Io(e) => write!(f, "I/O error: {}", e),
            EdsError::MissingHeader { section } => {
                write!(f, "Section {} has no [header] line", section)
            }
            EdsError::UnknownHeader { header } => write!(f, "Unknown section header: {}", header),
            EdsError::Dictionary(msg) => write!(f, "Object dictionary error: {}", msg),
            EdsError::FmtError(e) => write!(f, "Formatting error: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EdsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EdsError::Io(e) => Some(e),
            _ => None,
        }
    }
}
