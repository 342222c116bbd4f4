use serde::{Deserialize, Serialize};

use super::{DocumentError, DocumentResult};
use crate::document::{
    ListKind,
    MAX_LIST_LEVEL,
    NumberFormat,
    NumberingRef,
    Paragraph,
    WordDocument,
    package,
};

const LIST_STYLE: &str = "ListParagraph";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListItemInfo {
    pub paragraph_index: usize,
    pub text: String,
    pub level: u8,
    pub kind: ListKind,
    pub num_id: u32,
}

fn check_level(level: u8) -> DocumentResult<()> {
    if level > MAX_LIST_LEVEL {
        return Err(DocumentError::invalid(format!(
            "List level must be between 0 and {MAX_LIST_LEVEL}"
        )));
    }
    Ok(())
}

fn not_a_list_item(index: usize) -> DocumentError {
    DocumentError::invalid(format!("Paragraph {index} is not a list item"))
}

impl WordDocument {
    fn new_list(&mut self, kind: ListKind, format: Option<NumberFormat>) -> u32 {
        self.ensure_relationship(package::REL_NUMBERING, "numbering.xml");
        self.numbering.add_list(kind, format)
    }

    fn list_paragraph(&mut self, text: &str, num_id: u32, level: u8) -> Paragraph {
        self.ensure_builtin_style(LIST_STYLE);
        let mut paragraph = Paragraph::with_style(text, LIST_STYLE);
        paragraph.format.numbering = Some(NumberingRef { num_id, level });
        paragraph
    }

    /// Appends one list paragraph per item, all sharing a new numbering
    /// instance. Returns their paragraph indexes.
    ///
    /// # Errors
    /// Returns `DocumentError::InvalidArgument` for an empty item list.
    pub fn create_list(
        &mut self,
        items: &[String],
        kind: ListKind,
        format: Option<NumberFormat>,
    ) -> DocumentResult<Vec<usize>> {
        if items.is_empty() {
            return Err(DocumentError::invalid("A list needs at least one item"));
        }
        let num_id = self.new_list(kind, format);
        let mut indexes = Vec::with_capacity(items.len());
        for item in items {
            let paragraph = self.list_paragraph(item, num_id, 0);
            self.body.push(crate::document::Block::Paragraph(paragraph));
            indexes.push(self.paragraph_count() - 1);
        }
        Ok(indexes)
    }

    /// Appends a list item, continuing the list of the last paragraph when it
    /// is a list of the same kind.
    ///
    /// # Errors
    /// Returns `DocumentError::InvalidArgument` for levels above 8.
    pub fn add_list_item(&mut self, text: &str, kind: ListKind, level: u8) -> DocumentResult<usize> {
        check_level(level)?;
        let continued = self
            .paragraphs()
            .last()
            .and_then(|paragraph| paragraph.format.numbering)
            .filter(|reference| self.numbering.kind_of(reference.num_id, 0) == kind);
        let num_id = match continued {
            Some(reference) => reference.num_id,
            None => self.new_list(kind, None),
        };
        let paragraph = self.list_paragraph(text, num_id, level);
        self.body.push(crate::document::Block::Paragraph(paragraph));
        Ok(self.paragraph_count() - 1)
    }

    /// Turns a paragraph into a level-0 list item. It joins the list of the
    /// preceding paragraph when that list has the same kind.
    ///
    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` for an unknown paragraph.
    pub fn convert_to_list(&mut self, index: usize, kind: ListKind) -> DocumentResult<u32> {
        self.paragraph(index)?;
        let previous = index
            .checked_sub(1)
            .and_then(|previous| self.paragraph(previous).ok())
            .and_then(|paragraph| paragraph.format.numbering)
            .filter(|reference| self.numbering.kind_of(reference.num_id, 0) == kind);
        let num_id = match previous {
            Some(reference) => reference.num_id,
            None => self.new_list(kind, None),
        };
        self.ensure_builtin_style(LIST_STYLE);
        let paragraph = self.paragraph_mut(index)?;
        paragraph.format.numbering = Some(NumberingRef { num_id, level: 0 });
        if paragraph.format.style.is_none() {
            paragraph.format.style = Some(LIST_STYLE.to_string());
        }
        Ok(num_id)
    }

    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` for an unknown paragraph.
    pub fn remove_list_formatting(&mut self, index: usize) -> DocumentResult<()> {
        let paragraph = self.paragraph_mut(index)?;
        paragraph.format.numbering = None;
        if paragraph.format.style.as_deref() == Some(LIST_STYLE) {
            paragraph.format.style = None;
        }
        Ok(())
    }

    /// The contiguous run of list paragraphs starting at `start`.
    ///
    /// # Errors
    /// Returns `DocumentError::InvalidArgument` when `start` is not a list item.
    pub fn list_items(&self, start: usize) -> DocumentResult<Vec<ListItemInfo>> {
        if !self.paragraph(start)?.is_list_item() {
            return Err(not_a_list_item(start));
        }
        Ok(self
            .paragraphs()
            .enumerate()
            .skip(start)
            .map_while(|(index, paragraph)| {
                let reference = paragraph.format.numbering?;
                Some(ListItemInfo {
                    paragraph_index: index,
                    text: paragraph.text(),
                    level: reference.level,
                    kind: self.numbering.kind_of(reference.num_id, reference.level),
                    num_id: reference.num_id,
                })
            })
            .collect())
    }

    /// Every list paragraph in the document.
    #[must_use]
    pub fn all_list_items(&self) -> Vec<ListItemInfo> {
        self.paragraphs()
            .enumerate()
            .filter_map(|(index, paragraph)| {
                let reference = paragraph.format.numbering?;
                Some(ListItemInfo {
                    paragraph_index: index,
                    text: paragraph.text(),
                    level: reference.level,
                    kind: self.numbering.kind_of(reference.num_id, reference.level),
                    num_id: reference.num_id,
                })
            })
            .collect()
    }

    /// Moves a list item one level deeper, clamped at level 8. Returns the
    /// new level.
    ///
    /// # Errors
    /// Returns `DocumentError::InvalidArgument` when the paragraph is not a
    /// list item.
    pub fn indent_list_item(&mut self, index: usize) -> DocumentResult<u8> {
        self.shift_list_level(index, |level| (level + 1).min(MAX_LIST_LEVEL))
    }

    /// Moves a list item one level up, clamped at level 0.
    ///
    /// # Errors
    /// Returns `DocumentError::InvalidArgument` when the paragraph is not a
    /// list item.
    pub fn outdent_list_item(&mut self, index: usize) -> DocumentResult<u8> {
        self.shift_list_level(index, |level| level.saturating_sub(1))
    }

    /// # Errors
    /// Returns `DocumentError::InvalidArgument` for levels above 8 or
    /// non-list paragraphs.
    pub fn set_list_level(&mut self, index: usize, level: u8) -> DocumentResult<u8> {
        check_level(level)?;
        self.shift_list_level(index, |_| level)
    }

    fn shift_list_level(&mut self, index: usize, shift: impl FnOnce(u8) -> u8) -> DocumentResult<u8> {
        let paragraph = self.paragraph_mut(index)?;
        let reference = paragraph
            .format
            .numbering
            .as_mut()
            .ok_or_else(|| not_a_list_item(index))?;
        reference.level = shift(reference.level);
        Ok(reference.level)
    }

    /// Switches the whole list containing paragraph `index` to `kind` by
    /// pointing its items at a new numbering instance. Returns the number of
    /// paragraphs changed.
    ///
    /// # Errors
    /// Returns `DocumentError::InvalidArgument` when the paragraph is not a
    /// list item.
    pub fn change_list_type(&mut self, index: usize, kind: ListKind) -> DocumentResult<usize> {
        let old = self
            .paragraph(index)?
            .format
            .numbering
            .ok_or_else(|| not_a_list_item(index))?;
        if self.numbering.kind_of(old.num_id, 0) == kind {
            return Ok(0);
        }
        let num_id = self.new_list(kind, None);
        let mut changed = 0;
        self.for_each_paragraph_mut(&mut |paragraph: &mut Paragraph| {
            if let Some(reference) = paragraph.format.numbering.as_mut()
                && reference.num_id == old.num_id
            {
                reference.num_id = num_id;
                changed += 1;
            }
        });
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn create_list_shares_numbering() {
        let mut doc = WordDocument::new();
        doc.add_paragraph("intro", None, None).unwrap();
        let indexes = doc
            .create_list(&items(&["a", "b", "c"]), ListKind::Numbered, Some(NumberFormat::UpperRoman))
            .unwrap();
        assert_eq!(indexes, vec![1, 2, 3]);
        let listed = doc.list_items(1).unwrap();
        assert_eq!(listed.len(), 3);
        assert!(listed.iter().all(|item| item.num_id == listed[0].num_id));
        assert_eq!(listed[0].kind, ListKind::Numbered);
        assert!(doc.list_items(0).is_err());
        assert!(doc.create_list(&[], ListKind::Bullet, None).is_err());
    }

    #[test]
    fn add_list_item_continues_same_kind() {
        let mut doc = WordDocument::new();
        let first = doc.add_list_item("one", ListKind::Bullet, 0).unwrap();
        let second = doc.add_list_item("two", ListKind::Bullet, 1).unwrap();
        let third = doc.add_list_item("three", ListKind::Numbered, 0).unwrap();
        let num = |index: usize| doc.paragraph(index).unwrap().format.numbering.unwrap().num_id;
        assert_eq!(num(first), num(second));
        assert_ne!(num(second), num(third));
        assert!(doc.add_list_item("deep", ListKind::Bullet, 9).is_err());
    }

    #[test]
    fn indent_and_outdent_clamp() {
        let mut doc = WordDocument::new();
        doc.add_list_item("x", ListKind::Bullet, 8).unwrap();
        assert_eq!(doc.indent_list_item(0).unwrap(), 8);
        assert_eq!(doc.outdent_list_item(0).unwrap(), 7);
        doc.remove_list_formatting(0).unwrap();
        assert!(doc.indent_list_item(0).is_err());
        assert!(doc.paragraph(0).unwrap().format.style.is_none());
    }

    #[test]
    fn convert_and_change_type() {
        let mut doc = WordDocument::new();
        doc.add_paragraph("a", None, None).unwrap();
        doc.add_paragraph("b", None, None).unwrap();
        let first = doc.convert_to_list(0, ListKind::Bullet).unwrap();
        let second = doc.convert_to_list(1, ListKind::Bullet).unwrap();
        assert_eq!(first, second);
        assert_eq!(doc.change_list_type(0, ListKind::Numbered).unwrap(), 2);
        assert_eq!(doc.all_list_items()[1].kind, ListKind::Numbered);
        assert_eq!(doc.change_list_type(0, ListKind::Numbered).unwrap(), 0);
    }
}
