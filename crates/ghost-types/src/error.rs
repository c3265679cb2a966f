use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Shared error type for the data-model layer.
///
/// Parsing functions in this crate never return `Error` for malformed
/// input: frontmatter and knowledge metadata degrade to defaults per
/// the parser-failure contract. `Error` only covers IO and (de)serialization
/// failures surfaced by callers in `ghost-core` / `ghost-store` / `ghost-sync`.
#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Json(serde_json::Error),
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "IO error: {err}"),
            Error::Json(err) => write!(f, "JSON error: {err}"),
            Error::Config(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::Config(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}
