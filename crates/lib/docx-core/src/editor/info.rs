use serde::{Deserialize, Serialize};

use crate::document::{Block, CoreProperties, WordDocument};

/// Element counts of a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentStructure {
    pub paragraphs: usize,
    pub tables: usize,
    pub sections: usize,
    pub styles: usize,
    pub images: usize,
    pub comments: usize,
    pub headings: usize,
    pub list_items: usize,
    pub bookmarks: usize,
    pub hyperlinks: usize,
    pub words: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CharacterCount {
    pub with_spaces: usize,
    pub without_spaces: usize,
    pub words: usize,
    pub paragraphs: usize,
}

fn push_blocks(blocks: &[Block], lines: &mut Vec<String>) {
    for block in blocks {
        match block {
            Block::Paragraph(paragraph) => lines.push(paragraph.text()),
            Block::Table(table) => {
                for row in table.rows_as_text() {
                    lines.push(row.join("\t"));
                }
            }
        }
    }
}

impl WordDocument {
    /// Body text: one line per paragraph, table rows as tab-separated lines.
    #[must_use]
    pub fn all_text(&self) -> String {
        let mut lines = Vec::new();
        push_blocks(&self.body, &mut lines);
        lines.join("\n")
    }

    #[must_use]
    pub fn word_count(&self) -> usize {
        self.all_text().split_whitespace().count()
    }

    #[must_use]
    pub fn character_count(&self) -> CharacterCount {
        let text = self.all_text();
        CharacterCount {
            with_spaces: text.chars().filter(|ch| *ch != '\n').count(),
            without_spaces: text.chars().filter(|ch| !ch.is_whitespace()).count(),
            words: text.split_whitespace().count(),
            paragraphs: self.paragraph_count(),
        }
    }

    #[must_use]
    pub fn structure(&self) -> DocumentStructure {
        DocumentStructure {
            paragraphs: self.paragraph_count(),
            tables: self.table_count(),
            sections: self.section_count(),
            styles: self.styles.definitions.len(),
            images: self.image_count(),
            comments: self.comments.len(),
            headings: self.headings().len(),
            list_items: self.paragraphs().filter(|paragraph| paragraph.is_list_item()).count(),
            bookmarks: self.bookmarks().len(),
            hyperlinks: self.hyperlinks().len(),
            words: self.word_count(),
        }
    }

    #[must_use]
    pub const fn metadata(&self) -> &CoreProperties {
        &self.core
    }

    /// Overlays the set fields of `patch` onto the core properties.
    pub fn set_metadata(&mut self, patch: &CoreProperties) -> &CoreProperties {
        self.core.apply(patch);
        &self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_include_tables() {
        let mut doc = WordDocument::new();
        doc.add_heading("Title here", 1).unwrap();
        doc.add_paragraph("one two three", None, None).unwrap();
        let data = vec![vec!["a b".to_string(), "c".to_string()]];
        doc.add_table(1, 2, None, Some(&data), None).unwrap();
        assert_eq!(doc.all_text(), "Title here\none two three\na b\tc");
        assert_eq!(doc.word_count(), 8);
        let structure = doc.structure();
        assert_eq!(structure.paragraphs, 2);
        assert_eq!(structure.tables, 1);
        assert_eq!(structure.headings, 1);
        assert_eq!(structure.sections, 1);
        let chars = doc.character_count();
        assert_eq!(chars.without_spaces, 23);
        assert_eq!(chars.with_spaces, 28);
        assert_eq!(chars.paragraphs, 2);
    }

    #[test]
    fn metadata_patch() {
        let mut doc = WordDocument::new();
        doc.set_metadata(&CoreProperties {
            title: Some("Plan".to_string()),
            ..CoreProperties::default()
        });
        assert_eq!(doc.metadata().title.as_deref(), Some("Plan"));
    }
}
