use std::io;
use thiserror::Error;

/// Fatal engine errors. These are never shown to a single statement's
/// caller — they propagate to `main`, which logs them and terminates the
/// process. Any data not yet flushed is lost; see the durability contract
/// in the design notes.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("unable to open database file {path}: {source}")]
    Open { path: String, source: io::Error },

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("Db file is not a whole number of pages. Corrupt file.")]
    CorruptFile,

    #[error("Tried to fetch page number out of bounds. {0} > {1}")]
    PageOutOfBounds(usize, usize),

    #[error("Tried to flush null page.")]
    FlushEmptySlot,
}

/// Recoverable errors raised while turning an input line into a
/// `Statement`. The REPL prints the matching message from the external
/// contract and continues reading the next line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrepareError {
    #[error("Syntax error. Could not parse statement.")]
    SyntaxError,
    #[error("ID must be positive.")]
    NegativeId,
    #[error("String is too long.")]
    StringTooLong,
    #[error("Unrecognized keyword at start of '{0}'.")]
    UnrecognizedStatement(String),
}

/// Recoverable errors raised while executing an already-prepared
/// statement against the table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecuteError {
    #[error("Error: Duplicate key.")]
    DuplicateKey,
    #[error("Error: Table full.")]
    TableFull,
}
