//! Readers for Office Open XML packages.
//!
//! The parser turns a `.docx` zip into the in-memory `WordDocument` model,
//! keeping every part it does not interpret as raw bytes.

pub mod docx;

pub use docx::{DocxParseError, DocxParser};
