pub mod config;
pub mod error;
pub mod paths;
pub mod redact;
pub mod scm;

pub use error::{Error, Result};
pub use redact::Redactor;
pub use scm::ScmAdapter;
