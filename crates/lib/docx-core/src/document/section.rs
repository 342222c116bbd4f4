use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Block;
use crate::editor::DocumentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl FromStr for Orientation {
    type Err = DocumentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "portrait" => Ok(Self::Portrait),
            "landscape" => Ok(Self::Landscape),
            _ => Err(DocumentError::InvalidArgument(format!(
                "Invalid orientation: {value}. Use portrait or landscape"
            ))),
        }
    }
}

/// Named paper sizes. Dimensions are portrait, in twips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSize {
    Letter,
    A4,
    Legal,
    A3,
}

impl PageSize {
    #[must_use]
    pub const fn dimensions(self) -> (u32, u32) {
        match self {
            Self::Letter => (12_240, 15_840),
            Self::A4 => (11_906, 16_838),
            Self::Legal => (12_240, 20_160),
            Self::A3 => (16_838, 23_811),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Letter => "letter",
            Self::A4 => "a4",
            Self::Legal => "legal",
            Self::A3 => "a3",
        }
    }

    /// Matches portrait or landscape dimensions within a small tolerance.
    #[must_use]
    pub fn detect(width: u32, height: u32) -> Option<Self> {
        let (short, long) = if width <= height {
            (width, height)
        } else {
            (height, width)
        };
        [Self::Letter, Self::A4, Self::Legal, Self::A3]
            .into_iter()
            .find(|size| {
                let (w, h) = size.dimensions();
                short.abs_diff(w) <= 20 && long.abs_diff(h) <= 20
            })
    }
}

impl FromStr for PageSize {
    type Err = DocumentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "letter" => Ok(Self::Letter),
            "a4" => Ok(Self::A4),
            "legal" => Ok(Self::Legal),
            "a3" => Ok(Self::A3),
            _ => Err(DocumentError::InvalidArgument(format!(
                "Unsupported page size: {value}. Use letter, a4, legal or a3"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionStart {
    Continuous,
    NextPage,
    EvenPage,
    OddPage,
    NextColumn,
}

impl SectionStart {
    #[must_use]
    pub const fn as_xml(self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::NextPage => "nextPage",
            Self::EvenPage => "evenPage",
            Self::OddPage => "oddPage",
            Self::NextColumn => "nextColumn",
        }
    }

    #[must_use]
    pub fn from_xml(value: &str) -> Option<Self> {
        match value {
            "continuous" => Some(Self::Continuous),
            "nextPage" | "next_page" => Some(Self::NextPage),
            "evenPage" | "even_page" => Some(Self::EvenPage),
            "oddPage" | "odd_page" => Some(Self::OddPage),
            "nextColumn" | "next_column" => Some(Self::NextColumn),
            _ => None,
        }
    }
}

impl FromStr for SectionStart {
    type Err = DocumentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_xml(value.trim()).ok_or_else(|| {
            DocumentError::InvalidArgument(format!(
                "Invalid section start: {value}. Use continuous, next_page, even_page, odd_page or next_column"
            ))
        })
    }
}

/// Which pages a header or footer applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderFooterType {
    Default,
    First,
    Even,
}

impl HeaderFooterType {
    #[must_use]
    pub const fn as_xml(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::First => "first",
            Self::Even => "even",
        }
    }

    #[must_use]
    pub fn from_xml(value: &str) -> Option<Self> {
        match value {
            "default" => Some(Self::Default),
            "first" => Some(Self::First),
            "even" => Some(Self::Even),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderFooterKind {
    Header,
    Footer,
}

impl fmt::Display for HeaderFooterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Header => "header",
            Self::Footer => "footer",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderFooterRef {
    pub kind: HeaderFooterType,
    pub rel_id: String,
}

/// A header or footer part and its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderFooter {
    pub rel_id: String,
    pub part_name: String,
    pub kind: HeaderFooterKind,
    pub blocks: Vec<Block>,
}

/// Page margins in twips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMargins {
    pub top: i32,
    pub right: u32,
    pub bottom: i32,
    pub left: u32,
    pub header: u32,
    pub footer: u32,
    pub gutter: u32,
}

impl Default for PageMargins {
    fn default() -> Self {
        Self {
            top: 1440,
            right: 1440,
            bottom: 1440,
            left: 1440,
            header: 720,
            footer: 720,
            gutter: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionProperties {
    pub page_width: u32,
    pub page_height: u32,
    pub orientation: Orientation,
    pub margins: PageMargins,
    pub headers: Vec<HeaderFooterRef>,
    pub footers: Vec<HeaderFooterRef>,
    pub start: Option<SectionStart>,
    pub title_page: bool,
    pub columns: Option<u32>,
}

impl Default for SectionProperties {
    fn default() -> Self {
        let (page_width, page_height) = PageSize::Letter.dimensions();
        Self {
            page_width,
            page_height,
            orientation: Orientation::Portrait,
            margins: PageMargins::default(),
            headers: Vec::new(),
            footers: Vec::new(),
            start: None,
            title_page: false,
            columns: None,
        }
    }
}

impl SectionProperties {
    #[must_use]
    pub fn refs(&self, kind: HeaderFooterKind) -> &[HeaderFooterRef] {
        match kind {
            HeaderFooterKind::Header => &self.headers,
            HeaderFooterKind::Footer => &self.footers,
        }
    }

    pub fn refs_mut(&mut self, kind: HeaderFooterKind) -> &mut Vec<HeaderFooterRef> {
        match kind {
            HeaderFooterKind::Header => &mut self.headers,
            HeaderFooterKind::Footer => &mut self.footers,
        }
    }

    /// Relationship id of the default header or footer.
    #[must_use]
    pub fn default_ref(&self, kind: HeaderFooterKind) -> Option<&str> {
        self.refs(kind)
            .iter()
            .find(|reference| reference.kind == HeaderFooterType::Default)
            .map(|reference| reference.rel_id.as_str())
    }

    #[must_use]
    pub fn page_size(&self) -> Option<PageSize> {
        PageSize::detect(self.page_width, self.page_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_sizes_in_either_orientation() {
        assert_eq!(PageSize::detect(12_240, 15_840), Some(PageSize::Letter));
        assert_eq!(PageSize::detect(16_838, 11_906), Some(PageSize::A4));
        assert_eq!(PageSize::detect(1000, 1000), None);
    }

    #[test]
    fn parses_user_values() {
        assert_eq!("A4".parse::<PageSize>().unwrap(), PageSize::A4);
        assert_eq!("next_page".parse::<SectionStart>().unwrap(), SectionStart::NextPage);
        assert!("tabloid".parse::<PageSize>().is_err());
    }
}
