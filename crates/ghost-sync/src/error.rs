use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Json(serde_json::Error),
    Store(ghost_store::Error),
    Core(ghost_core::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "IO error: {err}"),
            Error::Json(err) => write!(f, "JSON error: {err}"),
            Error::Store(err) => write!(f, "{err}"),
            Error::Core(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            Error::Store(err) => Some(err),
            Error::Core(err) => Some(err),
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

impl From<ghost_store::Error> for Error {
    fn from(err: ghost_store::Error) -> Self {
        Error::Store(err)
    }
}

impl From<ghost_core::Error> for Error {
    fn from(err: ghost_core::Error) -> Self {
        Error::Core(err)
    }
}
