//! In-memory WordprocessingML package model.
//!
//! `WordDocument` holds the parts the editor understands (body, styles,
//! numbering, comments, headers and footers, core properties) as typed values
//! and keeps every other package part as opaque bytes so it survives a
//! load/save cycle.

pub mod numbering;
pub mod package;
pub mod paragraph;
pub mod properties;
pub mod section;
pub mod styles;
pub mod table;

use std::collections::BTreeMap;

pub use numbering::{ListKind, NumberFormat, Numbering, NumberingLevel, MAX_LIST_LEVEL};
pub use package::{PackagePart, Relationship};
pub use paragraph::{
    Alignment,
    BreakKind,
    Drawing,
    FieldCharKind,
    Hyperlink,
    Indentation,
    Inline,
    NumberingRef,
    Paragraph,
    ParagraphFormat,
    Run,
    RunContent,
    RunFormat,
    SimpleField,
    Spacing,
    VerticalAlign,
};
pub use properties::{CoreProperties, DocComment};
pub use section::{
    HeaderFooter,
    HeaderFooterKind,
    HeaderFooterRef,
    HeaderFooterType,
    Orientation,
    PageMargins,
    PageSize,
    SectionProperties,
    SectionStart,
};
pub use styles::{StyleDefinition, StyleType, Styles};
pub use table::{Table, TableCell, TableRow, VMerge};

use crate::editor::DocumentError;

pub const TWIPS_PER_INCH: f64 = 1440.0;
pub const EMU_PER_INCH: f64 = 914_400.0;
pub const EMU_PER_PIXEL: u64 = 9525;

/// Converts inches to twips, saturating at the `u32` range.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn inches_to_twips(inches: f64) -> u32 {
    (inches * TWIPS_PER_INCH).round().clamp(0.0, f64::from(u32::MAX)) as u32
}

#[must_use]
pub fn twips_to_inches(twips: u32) -> f64 {
    f64::from(twips) / TWIPS_PER_INCH
}

#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn inches_to_emu(inches: f64) -> u64 {
    (inches * EMU_PER_INCH).round().max(0.0) as u64
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn emu_to_inches(emu: u64) -> f64 {
    emu as f64 / EMU_PER_INCH
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordDocument {
    pub body: Vec<Block>,
    /// Properties of the final section (`w:body/w:sectPr`).
    pub section: SectionProperties,
    pub styles: Styles,
    pub numbering: Numbering,
    pub comments: Vec<DocComment>,
    pub headers_footers: Vec<HeaderFooter>,
    pub core: CoreProperties,
    /// Relationships of the main document part.
    pub relationships: Vec<Relationship>,
    /// Parts the model does not interpret, keyed by part name.
    pub parts: BTreeMap<String, PackagePart>,
}

impl Default for WordDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl WordDocument {
    /// Creates a blank Letter-portrait document with the built-in styles.
    #[must_use]
    pub fn new() -> Self {
        Self {
            body: Vec::new(),
            section: SectionProperties::default(),
            styles: styles::builtin_styles(),
            numbering: Numbering::default(),
            comments: Vec::new(),
            headers_footers: Vec::new(),
            core: CoreProperties::default(),
            relationships: vec![Relationship {
                id: "rId1".to_string(),
                rel_type: package::REL_STYLES.to_string(),
                target: "styles.xml".to_string(),
                external: false,
            }],
            parts: BTreeMap::new(),
        }
    }

    /// Top-level body paragraphs in order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.body.iter().filter_map(|block| match block {
            Block::Paragraph(paragraph) => Some(paragraph),
            Block::Table(_) => None,
        })
    }

    #[must_use]
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs().count()
    }

    /// Top-level tables in order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.body.iter().filter_map(|block| match block {
            Block::Table(table) => Some(table),
            Block::Paragraph(_) => None,
        })
    }

    #[must_use]
    pub fn table_count(&self) -> usize {
        self.tables().count()
    }

    /// Body index of the `index`-th top-level paragraph.
    ///
    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` when no such paragraph exists.
    pub fn paragraph_block_index(&self, index: usize) -> Result<usize, DocumentError> {
        self.body
            .iter()
            .enumerate()
            .filter(|(_, block)| matches!(block, Block::Paragraph(_)))
            .nth(index)
            .map(|(position, _)| position)
            .ok_or_else(|| DocumentError::out_of_range("Paragraph", index, self.paragraph_count()))
    }

    /// Body index of the `index`-th top-level table.
    ///
    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` when no such table exists.
    pub fn table_block_index(&self, index: usize) -> Result<usize, DocumentError> {
        self.body
            .iter()
            .enumerate()
            .filter(|(_, block)| matches!(block, Block::Table(_)))
            .nth(index)
            .map(|(position, _)| position)
            .ok_or_else(|| DocumentError::out_of_range("Table", index, self.table_count()))
    }

    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` when no such paragraph exists.
    pub fn paragraph(&self, index: usize) -> Result<&Paragraph, DocumentError> {
        let position = self.paragraph_block_index(index)?;
        match self.body.get(position) {
            Some(Block::Paragraph(paragraph)) => Ok(paragraph),
            _ => Err(DocumentError::out_of_range("Paragraph", index, self.paragraph_count())),
        }
    }

    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` when no such paragraph exists.
    pub fn paragraph_mut(&mut self, index: usize) -> Result<&mut Paragraph, DocumentError> {
        let count = self.paragraph_count();
        let position = self.paragraph_block_index(index)?;
        match self.body.get_mut(position) {
            Some(Block::Paragraph(paragraph)) => Ok(paragraph),
            _ => Err(DocumentError::out_of_range("Paragraph", index, count)),
        }
    }

    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` when no such table exists.
    pub fn table(&self, index: usize) -> Result<&Table, DocumentError> {
        let position = self.table_block_index(index)?;
        match self.body.get(position) {
            Some(Block::Table(table)) => Ok(table),
            _ => Err(DocumentError::out_of_range("Table", index, self.table_count())),
        }
    }

    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` when no such table exists.
    pub fn table_mut(&mut self, index: usize) -> Result<&mut Table, DocumentError> {
        let count = self.table_count();
        let position = self.table_block_index(index)?;
        match self.body.get_mut(position) {
            Some(Block::Table(table)) => Ok(table),
            _ => Err(DocumentError::out_of_range("Table", index, count)),
        }
    }

    /// Every paragraph in the body, including those nested in tables.
    #[must_use]
    pub fn all_paragraphs(&self) -> Vec<&Paragraph> {
        let mut out = Vec::new();
        collect_paragraphs(&self.body, &mut out);
        out
    }

    /// Visits every paragraph in the body, including those nested in tables.
    pub fn for_each_paragraph_mut(&mut self, visit: &mut impl FnMut(&mut Paragraph)) {
        visit_paragraphs_mut(&mut self.body, visit);
    }

    /// Heading level of a paragraph from its style or outline level.
    /// `Some(0)` marks a Title paragraph.
    #[must_use]
    pub fn heading_level(&self, paragraph: &Paragraph) -> Option<u8> {
        if let Some(style_id) = paragraph.format.style.as_deref() {
            if let Some(style) = self.styles.find(style_id) {
                if let Some(level) = style.heading_level() {
                    return Some(level);
                }
                if let Some(outline) = style.paragraph.outline_level
                    && outline < 9
                {
                    return Some(outline + 1);
                }
            } else if let Some(level) = styles::heading_level_from_name(style_id) {
                return Some(level);
            }
        }
        paragraph
            .format
            .outline_level
            .filter(|outline| *outline < 9)
            .map(|outline| outline + 1)
    }

    /// Relationship by id.
    #[must_use]
    pub fn relationship(&self, id: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|rel| rel.id == id)
    }

    /// Adds a relationship and returns its fresh id.
    pub fn add_relationship(&mut self, rel_type: &str, target: &str, external: bool) -> String {
        let id = self.next_relationship_id();
        self.relationships.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            external,
        });
        id
    }

    /// Returns the id of the first relationship of `rel_type`, adding one
    /// pointing at `target` when absent.
    pub fn ensure_relationship(&mut self, rel_type: &str, target: &str) -> String {
        if let Some(existing) = self.relationships.iter().find(|rel| rel.rel_type == rel_type) {
            return existing.id.clone();
        }
        self.add_relationship(rel_type, target, false)
    }

    pub fn remove_relationship(&mut self, id: &str) -> Option<Relationship> {
        let position = self.relationships.iter().position(|rel| rel.id == id)?;
        Some(self.relationships.remove(position))
    }

    fn next_relationship_id(&self) -> String {
        let next = self
            .relationships
            .iter()
            .filter_map(|rel| rel.id.strip_prefix("rId")?.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        format!("rId{next}")
    }

    /// Allocates a part name like `word/media/image3.png` that is not taken.
    #[must_use]
    pub fn unused_part_name(&self, dir: &str, stem: &str, extension: &str) -> String {
        let mut counter = 1;
        loop {
            let candidate = format!("{dir}/{stem}{counter}.{extension}");
            let taken = self.parts.contains_key(&candidate)
                || self
                    .headers_footers
                    .iter()
                    .any(|part| part.part_name == candidate);
            if !taken {
                return candidate;
            }
            counter += 1;
        }
    }

    /// Next free id for bookmarks.
    #[must_use]
    pub fn next_bookmark_id(&self) -> u32 {
        let mut max = None;
        self.visit_inlines(&mut |inline| {
            if let Inline::BookmarkStart { id, .. } = inline {
                max = Some(max.map_or(*id, |current: u32| current.max(*id)));
            }
        });
        max.map_or(0, |id| id + 1)
    }

    /// Next free id for comments.
    #[must_use]
    pub fn next_comment_id(&self) -> u32 {
        self.comments
            .iter()
            .map(|comment| comment.id + 1)
            .max()
            .unwrap_or(0)
    }

    /// Next free `wp:docPr` id for drawings.
    #[must_use]
    pub fn next_drawing_id(&self) -> u32 {
        let mut max = 0;
        for paragraph in self.all_paragraphs() {
            for drawing in paragraph.drawings() {
                max = max.max(drawing.id);
            }
        }
        for part in &self.headers_footers {
            let mut nested = Vec::new();
            collect_paragraphs(&part.blocks, &mut nested);
            for paragraph in nested {
                for drawing in paragraph.drawings() {
                    max = max.max(drawing.id);
                }
            }
        }
        max + 1
    }

    /// Visits every inline of every body paragraph, including table cells.
    pub fn visit_inlines(&self, visit: &mut impl FnMut(&Inline)) {
        for paragraph in self.all_paragraphs() {
            for inline in &paragraph.inlines {
                visit(inline);
            }
        }
    }

    /// Header or footer part by relationship id.
    #[must_use]
    pub fn header_footer(&self, rel_id: &str) -> Option<&HeaderFooter> {
        self.headers_footers.iter().find(|part| part.rel_id == rel_id)
    }

    pub fn header_footer_mut(&mut self, rel_id: &str) -> Option<&mut HeaderFooter> {
        self.headers_footers.iter_mut().find(|part| part.rel_id == rel_id)
    }
}

fn collect_paragraphs<'a>(blocks: &'a [Block], out: &mut Vec<&'a Paragraph>) {
    for block in blocks {
        match block {
            Block::Paragraph(paragraph) => out.push(paragraph),
            Block::Table(table) => {
                for row in &table.rows {
                    for cell in &row.cells {
                        collect_paragraphs(&cell.blocks, out);
                    }
                }
            }
        }
    }
}

fn visit_paragraphs_mut(blocks: &mut [Block], visit: &mut impl FnMut(&mut Paragraph)) {
    for block in blocks {
        match block {
            Block::Paragraph(paragraph) => visit(paragraph),
            Block::Table(table) => {
                for row in &mut table.rows {
                    for cell in &mut row.cells {
                        visit_paragraphs_mut(&mut cell.blocks, visit);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_document_has_styles_and_letter_page() {
        let doc = WordDocument::new();
        assert!(doc.body.is_empty());
        assert!(doc.styles.find("Normal").is_some());
        assert!(doc.styles.find("Heading9").is_some());
        assert_eq!(doc.section.page_size(), Some(PageSize::Letter));
        assert_eq!(doc.section.margins.left, 1440);
    }

    #[test]
    fn paragraph_indexes_skip_tables() {
        let mut doc = WordDocument::new();
        doc.body.push(Block::Paragraph(Paragraph::new("one")));
        doc.body.push(Block::Table(Table::new(1, 1, 1000)));
        doc.body.push(Block::Paragraph(Paragraph::new("two")));
        assert_eq!(doc.paragraph_block_index(1).unwrap(), 2);
        assert_eq!(doc.paragraph(1).unwrap().text(), "two");
        assert_eq!(doc.table_block_index(0).unwrap(), 1);
        let err = doc.paragraph(2).unwrap_err();
        assert_eq!(err.to_string(), "Paragraph index 2 out of range (0-1)");
        assert_eq!(doc.all_paragraphs().len(), 3);
    }

    #[test]
    fn relationship_ids_increase() {
        let mut doc = WordDocument::new();
        let id = doc.add_relationship(package::REL_HYPERLINK, "https://example.com", true);
        assert_eq!(id, "rId2");
        assert_eq!(doc.ensure_relationship(package::REL_STYLES, "styles.xml"), "rId1");
        assert!(doc.remove_relationship(&id).is_some());
    }

    #[test]
    fn heading_level_uses_style_chain() {
        let doc = WordDocument::new();
        assert_eq!(doc.heading_level(&Paragraph::with_style("x", "Heading3")), Some(3));
        assert_eq!(doc.heading_level(&Paragraph::with_style("x", "Title")), Some(0));
        assert_eq!(doc.heading_level(&Paragraph::new("x")), None);
    }

    #[test]
    fn unit_conversions() {
        assert_eq!(inches_to_twips(1.5), 2160);
        assert_eq!(inches_to_emu(1.0), 914_400);
        assert!((twips_to_inches(720) - 0.5).abs() < f64::EPSILON);
    }
}
