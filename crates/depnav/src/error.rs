//! Tool-level setup errors.
//!
//! Everything past setup is recovered locally and recorded as data (per-file
//! error text, project error counter); only failures to even get started,
//! like a bad `-C` directory, surface as a hard error with exit status 1.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Can't change into directory {dir}: {source}")]
    ChangeDir {
        dir: String,
        #[source]
        source: std::io::Error,
    },
}
