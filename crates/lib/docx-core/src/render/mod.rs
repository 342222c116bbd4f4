//! Output formats for a [`WordDocument`](crate::document::WordDocument).
//!
//! `docx` writes the package back out; `html`, `markdown` and `text` produce
//! read-only exports.

pub mod docx;
pub mod html;
pub mod markdown;
pub mod text;
mod xml;

use std::{error::Error, fmt};

pub use docx_store::ExportFormat;

use crate::document::{ListKind, PackagePart, Paragraph, WordDocument, package};

pub use html::html;
pub use markdown::markdown;
pub use text::text;

/// Error type for rendering failures.
#[derive(Debug)]
pub enum RenderError {
    Package(String),
    UnsupportedFormat(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Package(message) => write!(f, "failed to write package: {message}"),
            Self::UnsupportedFormat(format) => write!(
                f,
                "Unsupported export format: {format}. Supported formats: {}",
                ExportFormat::ALL
                    .iter()
                    .map(|format| format.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

impl Error for RenderError {}

impl From<zip::result::ZipError> for RenderError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Package(err.to_string())
    }
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        Self::Package(err.to_string())
    }
}

/// Parses a format name, accepting the common aliases (`md`, `txt`, `htm`).
///
/// # Errors
/// Returns `RenderError::UnsupportedFormat` for anything else, including
/// `pdf` and `rtf`.
pub fn parse_format(value: &str) -> Result<ExportFormat, RenderError> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "md" => Ok(ExportFormat::Markdown),
        "txt" | "plain" => Ok(ExportFormat::Text),
        "htm" => Ok(ExportFormat::Html),
        other => other
            .parse()
            .map_err(|_| RenderError::UnsupportedFormat(value.trim().to_string())),
    }
}

/// Renders a document in `format`.
///
/// # Errors
/// Returns `RenderError::Package` if a `.docx` package cannot be written.
pub fn render(
    doc: &WordDocument,
    format: ExportFormat,
    include_styles: bool,
) -> Result<Vec<u8>, RenderError> {
    Ok(match format {
        ExportFormat::Docx => docx::write(doc)?,
        ExportFormat::Html => html(doc, include_styles).into_bytes(),
        ExportFormat::Markdown => markdown(doc).into_bytes(),
        ExportFormat::Text => text(doc).into_bytes(),
    })
}

/// List kind and level of a list paragraph.
pub(crate) fn list_membership(doc: &WordDocument, paragraph: &Paragraph) -> Option<(ListKind, u8)> {
    let reference = paragraph.format.numbering?;
    Some((doc.numbering.kind_of(reference.num_id, reference.level), reference.level))
}

/// Part name and content of the image behind a drawing relationship.
pub(crate) fn image_part<'a>(doc: &'a WordDocument, rel_id: &str) -> Option<(String, &'a PackagePart)> {
    let rel = doc.relationship(rel_id).filter(|rel| !rel.external)?;
    let part_name = package::resolve_target("word", &rel.target);
    let part = doc.parts.get(&part_name)?;
    Some((part_name, part))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_formats() {
        assert_eq!(parse_format("MD").unwrap(), ExportFormat::Markdown);
        assert_eq!(parse_format(" txt").unwrap(), ExportFormat::Text);
        assert_eq!(parse_format("docx").unwrap(), ExportFormat::Docx);
        let err = parse_format("pdf").unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedFormat(_)));
        assert_eq!(
            err.to_string(),
            "Unsupported export format: pdf. Supported formats: html, markdown, text, docx"
        );
    }

    #[test]
    fn renders_text_exports_as_utf8() {
        let mut doc = WordDocument::new();
        doc.add_paragraph("Grüße", None, None).unwrap();
        let bytes = render(&doc, ExportFormat::Text, false).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "Grüße");
    }
}
