use serde::{Deserialize, Serialize};

use super::{DocumentError, DocumentResult};
use crate::document::{
    Alignment,
    Block,
    FieldCharKind,
    HeaderFooter,
    HeaderFooterKind,
    HeaderFooterRef,
    HeaderFooterType,
    Orientation,
    PageSize,
    Paragraph,
    Run,
    RunContent,
    RunFormat,
    SectionProperties,
    SectionStart,
    WordDocument,
    inches_to_twips,
    package,
    twips_to_inches,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SectionInfo {
    pub index: usize,
    pub page_width: f64,
    pub page_height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<PageSize>,
    pub orientation: Orientation,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub header_distance: f64,
    pub footer_distance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<SectionStart>,
    pub different_first_page: bool,
    pub has_header: bool,
    pub has_footer: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeaderFooterInfo {
    pub section_index: usize,
    pub kind: HeaderFooterKind,
    pub header_type: HeaderFooterType,
    pub text: String,
    /// True when the content comes from an earlier section.
    pub inherited: bool,
}

#[allow(clippy::cast_precision_loss)]
fn signed_inches(twips: i32) -> f64 {
    f64::from(twips) / crate::document::TWIPS_PER_INCH
}

fn margin_twips(label: &str, inches: f64) -> DocumentResult<u32> {
    if !inches.is_finite() || inches < 0.0 {
        return Err(DocumentError::invalid(format!("{label} margin must be a non-negative number")));
    }
    Ok(inches_to_twips(inches))
}

fn text_blocks(text: &str, alignment: Option<Alignment>) -> Vec<Block> {
    text.split('\n')
        .map(|line| {
            let mut paragraph = Paragraph::new(line);
            paragraph.format.alignment = alignment;
            Block::Paragraph(paragraph)
        })
        .collect()
}

fn blocks_text(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(|block| match block {
            Block::Paragraph(paragraph) => paragraph.text(),
            Block::Table(table) => table
                .rows_as_text()
                .iter()
                .map(|row| row.join("\t"))
                .collect::<Vec<_>>()
                .join("\n"),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn field_run(content: RunContent) -> Run {
    Run {
        format: RunFormat::default(),
        content: vec![content],
    }
}

/// A paragraph holding `prefix` and a PAGE field.
fn page_number_paragraph(alignment: Alignment, prefix: &str) -> Paragraph {
    let mut paragraph = Paragraph::new(prefix);
    paragraph.format.alignment = Some(alignment);
    for content in [
        RunContent::FieldChar(FieldCharKind::Begin),
        RunContent::InstrText(" PAGE ".to_string()),
        RunContent::FieldChar(FieldCharKind::Separate),
        RunContent::Text("1".to_string()),
        RunContent::FieldChar(FieldCharKind::End),
    ] {
        paragraph.push_run(field_run(content));
    }
    paragraph
}

impl WordDocument {
    /// Sections in order. Paragraph-level section breaks come first; the
    /// body's final section properties are last.
    fn section_props(&self) -> Vec<&SectionProperties> {
        self.all_section_breaks()
            .chain(std::iter::once(&self.section))
            .collect()
    }

    fn all_section_breaks(&self) -> impl Iterator<Item = &SectionProperties> {
        self.paragraphs()
            .filter_map(|paragraph| paragraph.format.section.as_deref())
    }

    #[must_use]
    pub fn section_count(&self) -> usize {
        self.all_section_breaks().count() + 1
    }

    fn section_props_at(&self, index: usize) -> DocumentResult<&SectionProperties> {
        let sections = self.section_props();
        let count = sections.len();
        sections
            .into_iter()
            .nth(index)
            .ok_or_else(|| DocumentError::out_of_range("Section", index, count))
    }

    fn section_props_mut(&mut self, index: usize) -> DocumentResult<&mut SectionProperties> {
        let count = self.section_count();
        if index + 1 == count {
            return Ok(&mut self.section);
        }
        self.body
            .iter_mut()
            .filter_map(|block| match block {
                Block::Paragraph(paragraph) => paragraph.format.section.as_deref_mut(),
                Block::Table(_) => None,
            })
            .nth(index)
            .ok_or_else(|| DocumentError::out_of_range("Section", index, count))
    }

    fn describe_section(&self, index: usize, section: &SectionProperties) -> SectionInfo {
        SectionInfo {
            index,
            page_width: twips_to_inches(section.page_width),
            page_height: twips_to_inches(section.page_height),
            page_size: section.page_size(),
            orientation: section.orientation,
            margin_top: signed_inches(section.margins.top),
            margin_bottom: signed_inches(section.margins.bottom),
            margin_left: twips_to_inches(section.margins.left),
            margin_right: twips_to_inches(section.margins.right),
            header_distance: twips_to_inches(section.margins.header),
            footer_distance: twips_to_inches(section.margins.footer),
            start: section.start,
            different_first_page: section.title_page,
            has_header: self.resolve_header_footer(index, HeaderFooterKind::Header, HeaderFooterType::Default).is_some(),
            has_footer: self.resolve_header_footer(index, HeaderFooterKind::Footer, HeaderFooterType::Default).is_some(),
        }
    }

    #[must_use]
    pub fn sections(&self) -> Vec<SectionInfo> {
        self.section_props()
            .into_iter()
            .enumerate()
            .map(|(index, section)| self.describe_section(index, section))
            .collect()
    }

    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` for an unknown section.
    pub fn section_info(&self, index: usize) -> DocumentResult<SectionInfo> {
        let section = self.section_props_at(index)?;
        Ok(self.describe_section(index, section))
    }

    /// Sets page margins in inches. Absent values are unchanged.
    ///
    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` or `DocumentError::InvalidArgument`
    /// for negative margins.
    pub fn set_margins(
        &mut self,
        index: usize,
        top: Option<f64>,
        bottom: Option<f64>,
        left: Option<f64>,
        right: Option<f64>,
    ) -> DocumentResult<SectionInfo> {
        let top = top.map(|value| margin_twips("Top", value)).transpose()?;
        let bottom = bottom.map(|value| margin_twips("Bottom", value)).transpose()?;
        let left = left.map(|value| margin_twips("Left", value)).transpose()?;
        let right = right.map(|value| margin_twips("Right", value)).transpose()?;
        let section = self.section_props_mut(index)?;
        if let Some(top) = top {
            section.margins.top = i32::try_from(top).unwrap_or(i32::MAX);
        }
        if let Some(bottom) = bottom {
            section.margins.bottom = i32::try_from(bottom).unwrap_or(i32::MAX);
        }
        if let Some(left) = left {
            section.margins.left = left;
        }
        if let Some(right) = right {
            section.margins.right = right;
        }
        self.section_info(index)
    }

    /// Changes orientation, swapping page width and height when it flips.
    ///
    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` for an unknown section.
    pub fn set_orientation(&mut self, index: usize, orientation: Orientation) -> DocumentResult<SectionInfo> {
        let section = self.section_props_mut(index)?;
        if section.orientation != orientation {
            std::mem::swap(&mut section.page_width, &mut section.page_height);
            section.orientation = orientation;
        }
        self.section_info(index)
    }

    /// Applies a named paper size in the section's current orientation.
    ///
    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` for an unknown section.
    pub fn set_page_size(&mut self, index: usize, size: PageSize) -> DocumentResult<SectionInfo> {
        let section = self.section_props_mut(index)?;
        let (width, height) = size.dimensions();
        (section.page_width, section.page_height) = match section.orientation {
            Orientation::Portrait => (width, height),
            Orientation::Landscape => (height, width),
        };
        self.section_info(index)
    }

    /// Starts a new section at the end of the document. The current final
    /// section is closed by a paragraph carrying its properties. Returns the
    /// new section index.
    pub fn add_section(&mut self, start: SectionStart) -> usize {
        let mut closing = Paragraph::default();
        closing.format.section = Some(Box::new(self.section.clone()));
        self.body.push(Block::Paragraph(closing));
        self.section.start = Some(start);
        self.section.headers.clear();
        self.section.footers.clear();
        self.section.title_page = false;
        self.section_count() - 1
    }

    /// Header or footer in effect for a section: its own reference or the
    /// nearest earlier section's. Returns the section index it came from.
    fn resolve_header_footer(
        &self,
        index: usize,
        kind: HeaderFooterKind,
        header_type: HeaderFooterType,
    ) -> Option<(usize, &HeaderFooter)> {
        let sections = self.section_props();
        (0..=index.min(sections.len().saturating_sub(1))).rev().find_map(|position| {
            sections[position]
                .refs(kind)
                .iter()
                .find(|reference| reference.kind == header_type)
                .and_then(|reference| self.header_footer(&reference.rel_id))
                .map(|part| (position, part))
        })
    }

    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` for an unknown section.
    pub fn header_footer_info(
        &self,
        index: usize,
        kind: HeaderFooterKind,
        header_type: HeaderFooterType,
    ) -> DocumentResult<Option<HeaderFooterInfo>> {
        self.section_props_at(index)?;
        Ok(self
            .resolve_header_footer(index, kind, header_type)
            .map(|(source, part)| HeaderFooterInfo {
                section_index: index,
                kind,
                header_type,
                text: blocks_text(&part.blocks),
                inherited: source != index,
            }))
    }

    /// Replaces the section's own header or footer content, creating the
    /// part when the section has none.
    ///
    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` for an unknown section.
    pub fn set_header_footer(
        &mut self,
        index: usize,
        kind: HeaderFooterKind,
        header_type: HeaderFooterType,
        blocks: Vec<Block>,
    ) -> DocumentResult<()> {
        let existing = self
            .section_props_at(index)?
            .refs(kind)
            .iter()
            .find(|reference| reference.kind == header_type)
            .map(|reference| reference.rel_id.clone())
            .filter(|rel_id| self.header_footer(rel_id).is_some());
        if let Some(rel_id) = existing {
            if let Some(part) = self.header_footer_mut(&rel_id) {
                part.blocks = blocks;
            }
            return Ok(());
        }

        let (stem, rel_type) = match kind {
            HeaderFooterKind::Header => ("header", package::REL_HEADER),
            HeaderFooterKind::Footer => ("footer", package::REL_FOOTER),
        };
        let part_name = self.unused_part_name("word", stem, "xml");
        let rel_id = self.add_relationship(rel_type, &package::word_relative(&part_name), false);
        self.headers_footers.push(HeaderFooter {
            rel_id: rel_id.clone(),
            part_name,
            kind,
            blocks,
        });
        let section = self.section_props_mut(index)?;
        let refs = section.refs_mut(kind);
        refs.retain(|reference| reference.kind != header_type);
        refs.push(HeaderFooterRef {
            kind: header_type,
            rel_id,
        });
        if header_type == HeaderFooterType::First {
            section.title_page = true;
        }
        Ok(())
    }

    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` for an unknown section.
    pub fn set_header(&mut self, index: usize, text: &str, header_type: HeaderFooterType) -> DocumentResult<()> {
        self.set_header_footer(index, HeaderFooterKind::Header, header_type, text_blocks(text, None))
    }

    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` for an unknown section.
    pub fn set_footer(&mut self, index: usize, text: &str, header_type: HeaderFooterType) -> DocumentResult<()> {
        self.set_header_footer(index, HeaderFooterKind::Footer, header_type, text_blocks(text, None))
    }

    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` for an unknown section.
    pub fn header(&self, index: usize) -> DocumentResult<Option<HeaderFooterInfo>> {
        self.header_footer_info(index, HeaderFooterKind::Header, HeaderFooterType::Default)
    }

    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` for an unknown section.
    pub fn footer(&self, index: usize) -> DocumentResult<Option<HeaderFooterInfo>> {
        self.header_footer_info(index, HeaderFooterKind::Footer, HeaderFooterType::Default)
    }

    /// Writes "Page N" with a PAGE field into the section's default header
    /// or footer, replacing its content.
    ///
    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` for an unknown section.
    pub fn add_page_numbers(&mut self, index: usize, alignment: Alignment, position: HeaderFooterKind) -> DocumentResult<()> {
        let paragraph = page_number_paragraph(alignment, "Page ");
        self.set_header_footer(index, position, HeaderFooterType::Default, vec![Block::Paragraph(paragraph)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_document_has_one_letter_section() {
        let doc = WordDocument::new();
        let sections = doc.sections();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].page_size, Some(PageSize::Letter));
        assert!((sections[0].margin_left - 1.0).abs() < f64::EPSILON);
        assert!(doc.section_info(1).is_err());
    }

    #[test]
    fn orientation_swaps_dimensions() {
        let mut doc = WordDocument::new();
        let info = doc.set_orientation(0, Orientation::Landscape).unwrap();
        assert!((info.page_width - 11.0).abs() < f64::EPSILON);
        let info = doc.set_page_size(0, PageSize::A4).unwrap();
        assert_eq!(info.page_size, Some(PageSize::A4));
        assert!(info.page_width > info.page_height);
    }

    #[test]
    fn margins_validate() {
        let mut doc = WordDocument::new();
        let info = doc.set_margins(0, Some(0.5), None, Some(1.25), None).unwrap();
        assert!((info.margin_top - 0.5).abs() < f64::EPSILON);
        assert!((info.margin_left - 1.25).abs() < f64::EPSILON);
        assert!(doc.set_margins(0, Some(-1.0), None, None, None).is_err());
    }

    #[test]
    fn sections_and_inherited_headers() {
        let mut doc = WordDocument::new();
        doc.add_paragraph("first", None, None).unwrap();
        doc.set_header(0, "Report", HeaderFooterType::Default).unwrap();
        let second = doc.add_section(SectionStart::NextPage);
        assert_eq!(second, 1);
        assert_eq!(doc.section_count(), 2);
        let inherited = doc.header(1).unwrap().unwrap();
        assert!(inherited.inherited);
        assert_eq!(inherited.text, "Report");
        doc.set_header(1, "Appendix", HeaderFooterType::Default).unwrap();
        assert_eq!(doc.header(0).unwrap().unwrap().text, "Report");
        assert_eq!(doc.header(1).unwrap().unwrap().text, "Appendix");
        assert_eq!(doc.headers_footers.len(), 2);
        assert!(doc.footer(0).unwrap().is_none());
    }

    #[test]
    fn page_numbers_use_a_page_field() {
        let mut doc = WordDocument::new();
        doc.add_page_numbers(0, Alignment::Center, HeaderFooterKind::Footer).unwrap();
        let footer = doc.footer(0).unwrap().unwrap();
        assert_eq!(footer.text, "Page 1");
        let part = &doc.headers_footers[0];
        assert_eq!(part.part_name, "word/footer1.xml");
        let Block::Paragraph(paragraph) = &part.blocks[0] else {
            panic!("expected paragraph");
        };
        assert!(paragraph.runs().any(|run| run
            .content
            .iter()
            .any(|item| matches!(item, RunContent::InstrText(instr) if instr.trim() == "PAGE"))));
    }
}
