use crate::prelude::*;

/// Everything that can go wrong while reading a scan file or its settings sidecar
#[derive(Debug, thiserror::Error, From)]
pub enum ParseError {
    #[error("could not read scan file: {0}")]
    Io(std::io::Error),
    #[error("Error parsing scan file header: {0}")]
    Header(Header),
    #[error("Error parsing scan file records: {0}")]
    Records(Records),
    #[error("Error parsing settings file: {0}")]
    Settings(Settings),
}

#[derive(Debug, thiserror::Error, From)]
pub enum Header {
    #[error("the file is empty")]
    #[from(ignore)]
    Empty,
    #[error("{0}")]
    MalformedLine(MalformedLine),
    #[error("{0}")]
    MissingColumnName(MissingColumnName),
}

#[derive(Debug, thiserror::Error, From)]
pub enum Records {
    #[error("{0}")]
    MalformedValue(MalformedValue),
    #[error("{0}")]
    RaggedRow(RaggedRow),
}

#[derive(Debug, thiserror::Error, From)]
pub enum Settings {
    #[error("{0}")]
    MalformedLine(MalformedLine),
    #[error("{0}")]
    OrphanParameter(OrphanParameter),
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "line {line}: could not parse `{content}` ({reason})")]
pub struct MalformedLine {
    line: usize,
    content: String,
    reason: &'static str,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "line {line}: a `size` entry appeared before any `name` entry")]
pub struct MissingColumnName {
    line: usize,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "line {line}, column {column}: `{token}` is not a number")]
pub struct MalformedValue {
    line: usize,
    column: usize,
    token: String,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "line {line}: expected {expected} values, got {actual}")]
pub struct RaggedRow {
    line: usize,
    expected: usize,
    actual: usize,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "line {line}: parameter `{parameter}` does not belong to any instrument")]
pub struct OrphanParameter {
    line: usize,
    parameter: String,
}
