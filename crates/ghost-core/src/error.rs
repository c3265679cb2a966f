use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Json(serde_json::Error),
    Toml(toml::de::Error),
    Config(String),
    /// An SCM subprocess call could not be completed at all (spawn failure
    /// or timeout). A missing branch/note/remote is `None`, not this.
    Scm(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "IO error: {err}"),
            Error::Json(err) => write!(f, "JSON error: {err}"),
            Error::Toml(err) => write!(f, "TOML error: {err}"),
            Error::Config(msg) => write!(f, "Configuration error: {msg}"),
            Error::Scm(msg) => write!(f, "SCM error: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::Toml(err) => Some(err),
            Error::Config(_) | Error::Scm(_) => None,
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

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Toml(err)
    }
}

impl From<ghost_types::Error> for Error {
    fn from(err: ghost_types::Error) -> Self {
        match err {
            ghost_types::Error::Io(e) => Error::Io(e),
            ghost_types::Error::Json(e) => Error::Json(e),
            ghost_types::Error::Config(m) => Error::Config(m),
        }
    }
}
