//! Error handling for the mir2pnml CLI.
//!
//! This module provides a structured error type using `thiserror`, wrapping
//! the library's own [`mir2pnml_core::ParseError`] alongside I/O, XML, and
//! JSON failures the CLI itself can hit.

use thiserror::Error;

/// Top-level error type for the mir2pnml CLI.
#[derive(Error, Debug)]
pub enum Mir2PnmlError {
    /// The input file could not be read.
    #[error("failed to read MIR input: {0}")]
    Io(#[from] std::io::Error),

    /// The MIR text could not be parsed into functions.
    #[error("parse error: {0}")]
    Parse(#[from] mir2pnml_core::ParseError),

    /// The net could not be serialized to PNML.
    #[error("PNML serialization failed: {0}")]
    Pnml(#[from] quick_xml::Error),

    /// The net could not be serialized to JSON.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// No functions were recovered from the MIR input.
    #[error("no functions found in MIR input")]
    EmptyInput,

    /// The requested entry function is not present in the parsed input.
    #[error("entry function '{0}' not found in MIR input")]
    EntryFnNotFound(String),
}

pub type Result<T> = std::result::Result<T, Mir2PnmlError>;
