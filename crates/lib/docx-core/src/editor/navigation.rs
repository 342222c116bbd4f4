use serde::{Deserialize, Serialize};

use super::{DocumentError, DocumentResult};
use crate::document::{
    Block,
    FieldCharKind,
    Hyperlink,
    Inline,
    Paragraph,
    Run,
    RunContent,
    RunFormat,
    WordDocument,
    package,
};

const TOC_PLACEHOLDER: &str = "Right-click to update table of contents.";
const MAX_BOOKMARK_NAME: usize = 40;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeadingInfo {
    pub paragraph_index: usize,
    pub level: u8,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookmarkInfo {
    pub id: u32,
    pub name: String,
    /// `None` for bookmarks inside tables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph_index: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HyperlinkInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph_index: Option<usize>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
}

fn validate_bookmark_name(name: &str) -> DocumentResult<()> {
    let mut chars = name.chars();
    let starts_well = chars.next().is_some_and(|first| first.is_alphabetic() || first == '_');
    if !starts_well
        || name.chars().count() > MAX_BOOKMARK_NAME
        || !name.chars().all(|ch| ch.is_alphanumeric() || ch == '_')
    {
        return Err(DocumentError::invalid(format!(
            "Invalid bookmark name: {name}. Use up to {MAX_BOOKMARK_NAME} letters, digits or underscores, starting with a letter"
        )));
    }
    Ok(())
}

/// Paragraphs paired with their top-level index; `None` inside tables.
fn indexed_paragraphs(blocks: &[Block]) -> Vec<(Option<usize>, &Paragraph)> {
    let mut out = Vec::new();
    let mut index = 0;
    for block in blocks {
        match block {
            Block::Paragraph(paragraph) => {
                out.push((Some(index), paragraph));
                index += 1;
            }
            Block::Table(table) => {
                for row in &table.rows {
                    for cell in &row.cells {
                        out.extend(
                            indexed_paragraphs(&cell.blocks)
                                .into_iter()
                                .map(|(_, paragraph)| (None, paragraph)),
                        );
                    }
                }
            }
        }
    }
    out
}

fn field_run(content: RunContent) -> Run {
    Run {
        format: RunFormat::default(),
        content: vec![content],
    }
}

impl WordDocument {
    /// Inserts an optional title and a TOC field at the start of the body.
    /// Returns the index of the field paragraph.
    ///
    /// # Errors
    /// Returns `DocumentError::InvalidArgument` for `max_level` outside 1..=9.
    pub fn add_table_of_contents(&mut self, title: Option<&str>, max_level: u8) -> DocumentResult<usize> {
        if !(1..=9).contains(&max_level) {
            return Err(DocumentError::invalid("TOC max level must be between 1 and 9"));
        }
        let mut field = Paragraph::default();
        for content in [
            RunContent::FieldChar(FieldCharKind::Begin),
            RunContent::InstrText(format!(" TOC \\o \"1-{max_level}\" \\h \\z \\u ")),
            RunContent::FieldChar(FieldCharKind::Separate),
            RunContent::Text(TOC_PLACEHOLDER.to_string()),
            RunContent::FieldChar(FieldCharKind::End),
        ] {
            field.push_run(field_run(content));
        }
        self.body.insert(0, Block::Paragraph(field));
        if let Some(title) = title.filter(|title| !title.is_empty()) {
            self.ensure_builtin_style("TOCHeading");
            self.body.insert(0, Block::Paragraph(Paragraph::with_style(title, "TOCHeading")));
            return Ok(1);
        }
        Ok(0)
    }

    /// Heading paragraphs, including the Title (level 0).
    #[must_use]
    pub fn headings(&self) -> Vec<HeadingInfo> {
        self.paragraphs()
            .enumerate()
            .filter_map(|(paragraph_index, paragraph)| {
                let level = self.heading_level(paragraph)?;
                Some(HeadingInfo {
                    paragraph_index,
                    level,
                    text: paragraph.text(),
                    style: paragraph.format.style.clone(),
                })
            })
            .collect()
    }

    /// Bookmarks the whole content of a paragraph. Returns the bookmark id.
    ///
    /// # Errors
    /// Returns `DocumentError::AlreadyExists` for a duplicate name and
    /// `DocumentError::InvalidArgument` for an invalid one.
    pub fn add_bookmark(&mut self, index: usize, name: &str) -> DocumentResult<u32> {
        validate_bookmark_name(name)?;
        self.paragraph(index)?;
        if self.bookmarks().iter().any(|bookmark| bookmark.name == name) {
            return Err(DocumentError::AlreadyExists(format!("Bookmark already exists: {name}")));
        }
        let id = self.next_bookmark_id();
        let paragraph = self.paragraph_mut(index)?;
        paragraph.inlines.insert(
            0,
            Inline::BookmarkStart {
                id,
                name: name.to_string(),
            },
        );
        paragraph.inlines.push(Inline::BookmarkEnd { id });
        Ok(id)
    }

    #[must_use]
    pub fn bookmarks(&self) -> Vec<BookmarkInfo> {
        indexed_paragraphs(&self.body)
            .into_iter()
            .flat_map(|(paragraph_index, paragraph)| {
                paragraph.inlines.iter().filter_map(move |inline| match inline {
                    Inline::BookmarkStart { id, name } if !name.starts_with("_GoBack") => Some(BookmarkInfo {
                        id: *id,
                        name: name.clone(),
                        paragraph_index,
                    }),
                    _ => None,
                })
            })
            .collect()
    }

    /// Removes a bookmark's start and end markers.
    ///
    /// # Errors
    /// Returns `DocumentError::NotFound` for an unknown bookmark.
    pub fn delete_bookmark(&mut self, name: &str) -> DocumentResult<()> {
        let id = self
            .bookmarks()
            .into_iter()
            .find(|bookmark| bookmark.name == name)
            .map(|bookmark| bookmark.id)
            .ok_or_else(|| DocumentError::NotFound(format!("Bookmark not found: {name}")))?;
        self.for_each_paragraph_mut(&mut |paragraph: &mut Paragraph| {
            paragraph.inlines.retain(|inline| {
                !matches!(
                    inline,
                    Inline::BookmarkStart { id: start, .. } | Inline::BookmarkEnd { id: start } if *start == id
                )
            });
        });
        Ok(())
    }

    fn push_link(&mut self, index: usize, link: Hyperlink) -> DocumentResult<()> {
        self.paragraph_mut(index)?.inlines.push(Inline::Hyperlink(link));
        Ok(())
    }

    fn link_run(&mut self, text: &str) -> Run {
        self.ensure_builtin_style("Hyperlink");
        Run::with_format(
            text,
            RunFormat {
                style: Some("Hyperlink".to_string()),
                ..RunFormat::default()
            },
        )
    }

    /// Appends an external hyperlink to a paragraph.
    ///
    /// # Errors
    /// Returns `DocumentError::InvalidArgument` for empty text or URL.
    pub fn add_hyperlink(&mut self, index: usize, text: &str, url: &str) -> DocumentResult<()> {
        if text.is_empty() || url.trim().is_empty() {
            return Err(DocumentError::invalid("Hyperlink text and URL are required"));
        }
        self.paragraph(index)?;
        let rel_id = self.add_relationship(package::REL_HYPERLINK, url.trim(), true);
        let run = self.link_run(text);
        self.push_link(
            index,
            Hyperlink {
                rel_id: Some(rel_id),
                anchor: None,
                runs: vec![run],
            },
        )
    }

    /// Appends a link to a bookmark in this document.
    ///
    /// # Errors
    /// Returns `DocumentError::NotFound` when the bookmark does not exist.
    pub fn add_internal_link(&mut self, index: usize, text: &str, bookmark: &str) -> DocumentResult<()> {
        if text.is_empty() {
            return Err(DocumentError::invalid("Hyperlink text is required"));
        }
        self.paragraph(index)?;
        if !self.bookmarks().iter().any(|existing| existing.name == bookmark) {
            return Err(DocumentError::NotFound(format!("Bookmark not found: {bookmark}")));
        }
        let run = self.link_run(text);
        self.push_link(
            index,
            Hyperlink {
                rel_id: None,
                anchor: Some(bookmark.to_string()),
                runs: vec![run],
            },
        )
    }

    #[must_use]
    pub fn hyperlinks(&self) -> Vec<HyperlinkInfo> {
        indexed_paragraphs(&self.body)
            .into_iter()
            .flat_map(|(paragraph_index, paragraph)| {
                paragraph.inlines.iter().filter_map(move |inline| match inline {
                    Inline::Hyperlink(link) => Some(HyperlinkInfo {
                        paragraph_index,
                        text: link.runs.iter().map(Run::text).collect(),
                        url: link
                            .rel_id
                            .as_deref()
                            .and_then(|rel_id| self.relationship(rel_id))
                            .map(|rel| rel.target.clone()),
                        anchor: link.anchor.clone(),
                    }),
                    _ => None,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outline() -> WordDocument {
        let mut doc = WordDocument::new();
        doc.add_heading("Guide", 0).unwrap();
        doc.add_heading("Setup", 1).unwrap();
        doc.add_paragraph("Install it.", None, None).unwrap();
        doc.add_heading("Details", 2).unwrap();
        doc
    }

    #[test]
    fn lists_headings_with_levels() {
        let doc = outline();
        let levels: Vec<u8> = doc.headings().iter().map(|heading| heading.level).collect();
        assert_eq!(levels, vec![0, 1, 2]);
    }

    #[test]
    fn toc_goes_first() {
        let mut doc = outline();
        assert!(doc.add_table_of_contents(None, 0).is_err());
        let index = doc.add_table_of_contents(Some("Contents"), 3).unwrap();
        assert_eq!(index, 1);
        assert_eq!(doc.paragraph(0).unwrap().text(), "Contents");
        let field = doc.paragraph(1).unwrap();
        assert!(field.runs().any(|run| run
            .content
            .iter()
            .any(|item| matches!(item, RunContent::InstrText(instr) if instr.contains("1-3")))));
    }

    #[test]
    fn bookmarks_are_unique_and_removable() {
        let mut doc = outline();
        doc.add_bookmark(1, "setup").unwrap();
        assert!(matches!(doc.add_bookmark(2, "setup"), Err(DocumentError::AlreadyExists(_))));
        assert!(doc.add_bookmark(2, "has space").is_err());
        assert_eq!(doc.bookmarks()[0].paragraph_index, Some(1));
        doc.delete_bookmark("setup").unwrap();
        assert!(doc.bookmarks().is_empty());
        assert_eq!(
            doc.delete_bookmark("setup").unwrap_err().to_string(),
            "Bookmark not found: setup"
        );
    }

    #[test]
    fn hyperlinks_external_and_internal() {
        let mut doc = outline();
        doc.add_hyperlink(2, " docs", "https://example.com/docs").unwrap();
        assert!(doc.add_internal_link(2, "see setup", "setup").is_err());
        doc.add_bookmark(1, "setup").unwrap();
        doc.add_internal_link(2, " (setup)", "setup").unwrap();
        let links = doc.hyperlinks();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].url.as_deref(), Some("https://example.com/docs"));
        assert_eq!(links[1].anchor.as_deref(), Some("setup"));
        assert_eq!(doc.paragraph(2).unwrap().text(), "Install it. docs (setup)");
    }
}
