use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::{DocumentError, DocumentResult};
use crate::document::{
    DocComment,
    Inline,
    Paragraph,
    Run,
    RunContent,
    RunFormat,
    WordDocument,
    package,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommentInfo {
    pub id: u32,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initials: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub text: String,
    /// Top-level paragraph the comment is anchored to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph_index: Option<usize>,
}

fn initials_of(author: &str) -> String {
    author
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

fn comment_not_found(id: u32) -> DocumentError {
    DocumentError::NotFound(format!("Comment not found: {id}"))
}

fn anchors(paragraph: &Paragraph, id: u32) -> bool {
    paragraph.inlines.iter().any(|inline| match inline {
        Inline::CommentRangeStart(start) => *start == id,
        Inline::Run(run) => run
            .content
            .iter()
            .any(|item| matches!(item, RunContent::CommentReference(reference) if *reference == id)),
        _ => false,
    })
}

impl WordDocument {
    fn describe_comment(&self, comment: &DocComment) -> CommentInfo {
        CommentInfo {
            id: comment.id,
            author: comment.author.clone(),
            initials: comment.initials.clone(),
            date: comment.date.clone(),
            text: comment.text(),
            paragraph_index: self.paragraphs().position(|paragraph| anchors(paragraph, comment.id)),
        }
    }

    /// Anchors a comment around the whole content of a paragraph. Returns
    /// the comment id.
    ///
    /// # Errors
    /// Returns `DocumentError::InvalidArgument` for an empty author or text.
    pub fn add_comment(
        &mut self,
        index: usize,
        author: &str,
        text: &str,
        initials: Option<&str>,
    ) -> DocumentResult<u32> {
        if author.trim().is_empty() {
            return Err(DocumentError::invalid("Comment author is required"));
        }
        if text.trim().is_empty() {
            return Err(DocumentError::invalid("Comment text is required"));
        }
        self.paragraph(index)?;
        let id = self.next_comment_id();
        self.ensure_relationship(package::REL_COMMENTS, "comments.xml");
        self.comments.push(DocComment {
            id,
            author: author.trim().to_string(),
            initials: Some(initials.map_or_else(|| initials_of(author), ToString::to_string)),
            date: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
            paragraphs: text.split('\n').map(Paragraph::new).collect(),
        });
        let paragraph = self.paragraph_mut(index)?;
        paragraph.inlines.insert(0, Inline::CommentRangeStart(id));
        paragraph.inlines.push(Inline::CommentRangeEnd(id));
        paragraph.inlines.push(Inline::Run(Run {
            format: RunFormat::default(),
            content: vec![RunContent::CommentReference(id)],
        }));
        Ok(id)
    }

    #[must_use]
    pub fn comments_list(&self) -> Vec<CommentInfo> {
        self.comments
            .iter()
            .map(|comment| self.describe_comment(comment))
            .collect()
    }

    /// # Errors
    /// Returns `DocumentError::NotFound` for an unknown comment id.
    pub fn comment(&self, id: u32) -> DocumentResult<CommentInfo> {
        self.comments
            .iter()
            .find(|comment| comment.id == id)
            .map(|comment| self.describe_comment(comment))
            .ok_or_else(|| comment_not_found(id))
    }

    /// # Errors
    /// Returns `DocumentError::NotFound` for an unknown comment id.
    pub fn update_comment_text(&mut self, id: u32, text: &str) -> DocumentResult<()> {
        if text.trim().is_empty() {
            return Err(DocumentError::invalid("Comment text is required"));
        }
        let comment = self
            .comments
            .iter_mut()
            .find(|comment| comment.id == id)
            .ok_or_else(|| comment_not_found(id))?;
        comment.paragraphs = text.split('\n').map(Paragraph::new).collect();
        Ok(())
    }

    /// Removes a comment together with its range markers and reference run.
    ///
    /// # Errors
    /// Returns `DocumentError::NotFound` for an unknown comment id.
    pub fn remove_comment(&mut self, id: u32) -> DocumentResult<()> {
        let position = self
            .comments
            .iter()
            .position(|comment| comment.id == id)
            .ok_or_else(|| comment_not_found(id))?;
        self.comments.remove(position);
        let is_reference = |item: &RunContent| matches!(item, RunContent::CommentReference(reference) if *reference == id);
        self.for_each_paragraph_mut(&mut |paragraph: &mut Paragraph| {
            paragraph.inlines.retain(|inline| match inline {
                Inline::CommentRangeStart(marker) | Inline::CommentRangeEnd(marker) => *marker != id,
                Inline::Run(run) => !(run.content.len() == 1 && is_reference(&run.content[0])),
                _ => true,
            });
            for run in paragraph.runs_mut() {
                run.content.retain(|item| !is_reference(item));
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_list_comments() {
        let mut doc = WordDocument::new();
        doc.add_paragraph("first", None, None).unwrap();
        doc.add_paragraph("second", None, None).unwrap();
        let id = doc.add_comment(1, "Ada Lovelace", "Check this", None).unwrap();
        assert_eq!(id, 0);
        let info = doc.comment(id).unwrap();
        assert_eq!(info.initials.as_deref(), Some("AL"));
        assert_eq!(info.paragraph_index, Some(1));
        assert_eq!(info.text, "Check this");
        assert_eq!(doc.paragraph(1).unwrap().text(), "second");
        assert!(doc.relationships.iter().any(|rel| rel.rel_type == package::REL_COMMENTS));
        assert!(doc.add_comment(0, "", "x", None).is_err());
    }

    #[test]
    fn update_and_remove() {
        let mut doc = WordDocument::new();
        doc.add_paragraph("body", None, None).unwrap();
        let id = doc.add_comment(0, "Bo", "old", Some("B")).unwrap();
        doc.update_comment_text(id, "new").unwrap();
        assert_eq!(doc.comments_list()[0].text, "new");
        doc.remove_comment(id).unwrap();
        assert!(doc.comments.is_empty());
        let paragraph = doc.paragraph(0).unwrap();
        assert_eq!(paragraph.inlines.len(), 1);
        assert!(matches!(doc.comment(id), Err(DocumentError::NotFound(_))));
        assert!(doc.remove_comment(id).is_err());
    }
}
