//! Editing operations over [`WordDocument`](crate::document::WordDocument).
//!
//! Each submodule adds an `impl WordDocument` block for one area of the
//! document. Indexes are zero-based; paragraph indexes count top-level body
//! paragraphs only.

pub mod comments;
pub mod info;
pub mod layout;
pub mod lists;
pub mod media;
pub mod navigation;
pub mod styles;
pub mod tables;
pub mod text;

use std::{error::Error, fmt};

use serde::{Deserialize, Serialize};

use crate::document::{RunFormat, VerticalAlign};

pub use comments::CommentInfo;
pub use info::{CharacterCount, DocumentStructure};
pub use layout::{HeaderFooterInfo, SectionInfo};
pub use lists::ListItemInfo;
pub use media::{ImageFormat, ImageInfo, ImageInsert};
pub use navigation::{BookmarkInfo, HeadingInfo, HyperlinkInfo};
pub use styles::{StyleInfo, StyleSpec};
pub use tables::{CellRange, TableInfo};
pub use text::{ParagraphFormatting, ParagraphInfo, ParagraphUpdate, RunInfo, TextMatch};

pub const MIN_FONT_SIZE: f64 = 6.0;
pub const MAX_FONT_SIZE: f64 = 144.0;

pub const HIGHLIGHT_COLORS: &[&str] = &[
    "yellow",
    "green",
    "cyan",
    "magenta",
    "blue",
    "red",
    "darkBlue",
    "darkCyan",
    "darkGreen",
    "darkMagenta",
    "darkRed",
    "darkYellow",
    "darkGray",
    "lightGray",
    "black",
    "white",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
    InvalidArgument(String),
    NotFound(String),
    AlreadyExists(String),
}

impl DocumentError {
    #[must_use]
    pub const fn out_of_range(what: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { what, index, len }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexOutOfRange { what, index, len } => {
                if *len == 0 {
                    write!(f, "{what} index {index} out of range (none present)")
                } else {
                    write!(f, "{what} index {index} out of range (0-{})", len - 1)
                }
            }
            Self::InvalidArgument(message) | Self::NotFound(message) | Self::AlreadyExists(message) => {
                f.write_str(message)
            }
        }
    }
}

impl Error for DocumentError {}

pub type DocumentResult<T> = Result<T, DocumentError>;

/// Caller-facing character formatting. Sizes are in points and colors are
/// six-digit hex values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextFormat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strike: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superscript: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscript: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

impl TextFormat {
    /// Validates the request and converts it to run properties.
    ///
    /// # Errors
    /// Returns `DocumentError::InvalidArgument` for out-of-range sizes,
    /// malformed colors, unknown highlight names or conflicting
    /// superscript/subscript flags.
    pub fn to_run_format(&self) -> DocumentResult<RunFormat> {
        if self.superscript == Some(true) && self.subscript == Some(true) {
            return Err(DocumentError::invalid(
                "Text cannot be both superscript and subscript",
            ));
        }
        let vertical_align = match (self.superscript, self.subscript) {
            (Some(true), _) => Some(VerticalAlign::Superscript),
            (_, Some(true)) => Some(VerticalAlign::Subscript),
            (Some(false), _) | (_, Some(false)) => Some(VerticalAlign::Baseline),
            _ => None,
        };
        Ok(RunFormat {
            style: self.style.clone(),
            bold: self.bold,
            italic: self.italic,
            underline: self
                .underline
                .map(|on| if on { "single" } else { "none" }.to_string()),
            strike: self.strike,
            font: self.font_name.clone(),
            size: self.font_size.map(font_size_to_half_points).transpose()?,
            color: self.color.as_deref().map(normalize_color).transpose()?,
            highlight: self.highlight.as_deref().map(normalize_highlight).transpose()?,
            vertical_align,
        })
    }
}

/// Converts a point size to half-points after range checking.
///
/// # Errors
/// Returns `DocumentError::InvalidArgument` outside 6-144 pt.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn font_size_to_half_points(points: f64) -> DocumentResult<u32> {
    if !points.is_finite() || !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&points) {
        return Err(DocumentError::invalid(format!(
            "Font size must be between {MIN_FONT_SIZE} and {MAX_FONT_SIZE} points"
        )));
    }
    Ok((points * 2.0).round() as u32)
}

/// Normalizes `#RRGGBB` or `RRGGBB` to upper-case `RRGGBB`.
///
/// # Errors
/// Returns `DocumentError::InvalidArgument` for anything else.
pub fn normalize_color(value: &str) -> DocumentResult<String> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() == 6 && hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        Ok(hex.to_ascii_uppercase())
    } else {
        Err(DocumentError::invalid(format!(
            "Invalid color: {value}. Use a six-digit hex value such as FF0000"
        )))
    }
}

/// Maps a highlight name to Word's canonical spelling.
///
/// # Errors
/// Returns `DocumentError::InvalidArgument` for unknown names.
pub fn normalize_highlight(value: &str) -> DocumentResult<String> {
    let wanted: String = value
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, '_' | ' ' | '-'))
        .collect();
    HIGHLIGHT_COLORS
        .iter()
        .find(|name| name.eq_ignore_ascii_case(&wanted))
        .map(|name| (*name).to_string())
        .ok_or_else(|| {
            DocumentError::invalid(format!(
                "Invalid highlight color: {value}. Use one of {}",
                HIGHLIGHT_COLORS.join(", ")
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_format_conversion() {
        let format = TextFormat {
            bold: Some(true),
            underline: Some(true),
            font_size: Some(12.5),
            color: Some("#ff0000".to_string()),
            highlight: Some("dark_blue".to_string()),
            superscript: Some(true),
            ..TextFormat::default()
        }
        .to_run_format()
        .unwrap();
        assert_eq!(format.size, Some(25));
        assert_eq!(format.color.as_deref(), Some("FF0000"));
        assert_eq!(format.highlight.as_deref(), Some("darkBlue"));
        assert_eq!(format.underline.as_deref(), Some("single"));
        assert_eq!(format.vertical_align, Some(VerticalAlign::Superscript));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(font_size_to_half_points(200.0).is_err());
        assert!(normalize_color("red").is_err());
        assert!(normalize_highlight("orange").is_err());
        let conflicting = TextFormat {
            superscript: Some(true),
            subscript: Some(true),
            ..TextFormat::default()
        };
        assert!(conflicting.to_run_format().is_err());
    }

    #[test]
    fn out_of_range_messages() {
        assert_eq!(
            DocumentError::out_of_range("Table", 3, 2).to_string(),
            "Table index 3 out of range (0-1)"
        );
        assert_eq!(
            DocumentError::out_of_range("Image", 0, 0).to_string(),
            "Image index 0 out of range (none present)"
        );
    }
}
