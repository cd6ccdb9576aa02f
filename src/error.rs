use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Not a recognized dump format: {0:}")]
    FormatMismatch(String),

    #[error("Input ends in the middle of a record: {0:}")]
    Truncated(String),

    #[error("Named signal '{0:}' not found")]
    UnknownSignal(String),

    #[error("Signal '{name:}' redeclared with width {declared:}, but its node has width {existing:}")]
    AliasConflict {
        name: String,
        declared: u32,
        existing: u32,
    },

    #[error("Don't know how to load '{0:}'")]
    UnknownFileFormat(String),

    #[error("The given text '{0:}' can not be interpreted as a timescale.")]
    InvalidTimescale(String),

    #[error("Import aborted")]
    Aborted,
}

pub type Result<T> = std::result::Result<T, Error>;
