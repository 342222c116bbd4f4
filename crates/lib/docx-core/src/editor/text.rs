use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::{DocumentError, DocumentResult, TextFormat};
use crate::document::{
    Alignment,
    Block,
    BreakKind,
    ListKind,
    Paragraph,
    Run,
    RunContent,
    RunFormat,
    VerticalAlign,
    WordDocument,
};

/// Formatting and text of a single run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunInfo {
    pub index: usize,
    pub text: String,
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
    #[serde(default)]
    pub superscript: bool,
    #[serde(default)]
    pub subscript: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

impl RunInfo {
    fn from_run(index: usize, run: &Run) -> Self {
        let format = &run.format;
        Self {
            index,
            text: run.text(),
            bold: format.bold,
            italic: format.italic,
            underline: format.underline.as_ref().map(|_| format.is_underlined()),
            strike: format.strike,
            font_name: format.font.clone(),
            font_size: format.size.map(|half| f64::from(half) / 2.0),
            color: format.color.clone(),
            highlight: format.highlight.clone(),
            superscript: format.vertical_align == Some(VerticalAlign::Superscript),
            subscript: format.vertical_align == Some(VerticalAlign::Subscript),
            style: format.style.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParagraphInfo {
    pub index: usize,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_kind: Option<ListKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runs: Vec<RunInfo>,
}

/// Partial update of a paragraph. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParagraphUpdate {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub alignment: Option<Alignment>,
}

/// Paragraph-level layout. Spacing is in points, indents in inches and
/// `line_spacing` is a multiple of single spacing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParagraphFormatting {
    #[serde(default)]
    pub alignment: Option<Alignment>,
    #[serde(default)]
    pub space_before: Option<f64>,
    #[serde(default)]
    pub space_after: Option<f64>,
    #[serde(default)]
    pub line_spacing: Option<f64>,
    #[serde(default)]
    pub left_indent: Option<f64>,
    #[serde(default)]
    pub right_indent: Option<f64>,
    #[serde(default)]
    pub first_line_indent: Option<f64>,
    #[serde(default)]
    pub keep_with_next: Option<bool>,
    #[serde(default)]
    pub page_break_before: Option<bool>,
}

/// A search hit. Offsets and lengths count characters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextMatch {
    pub paragraph_index: usize,
    pub offset: usize,
    pub length: usize,
    pub text: String,
}

impl WordDocument {
    fn describe_paragraph(&self, index: usize, paragraph: &Paragraph, with_runs: bool) -> ParagraphInfo {
        let style_name = paragraph
            .format
            .style
            .as_deref()
            .and_then(|style| self.styles.find(style))
            .map(|style| style.name.clone());
        let numbering = paragraph.format.numbering;
        ParagraphInfo {
            index,
            text: paragraph.text(),
            style: paragraph.format.style.clone(),
            style_name,
            alignment: paragraph.format.alignment,
            heading_level: self.heading_level(paragraph),
            list_kind: numbering.map(|reference| self.numbering.kind_of(reference.num_id, reference.level)),
            list_level: numbering.map(|reference| reference.level),
            runs: if with_runs {
                paragraph
                    .runs()
                    .enumerate()
                    .map(|(run_index, run)| RunInfo::from_run(run_index, run))
                    .collect()
            } else {
                Vec::new()
            },
        }
    }

    /// Paragraph text, style and runs.
    ///
    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` for an unknown paragraph.
    pub fn paragraph_info(&self, index: usize) -> DocumentResult<ParagraphInfo> {
        let paragraph = self.paragraph(index)?;
        Ok(self.describe_paragraph(index, paragraph, true))
    }

    /// Summaries of every top-level paragraph, without run detail.
    #[must_use]
    pub fn paragraph_infos(&self) -> Vec<ParagraphInfo> {
        self.paragraphs()
            .enumerate()
            .map(|(index, paragraph)| self.describe_paragraph(index, paragraph, false))
            .collect()
    }

    fn build_paragraph(
        &mut self,
        text: &str,
        style: Option<&str>,
        alignment: Option<Alignment>,
    ) -> DocumentResult<Paragraph> {
        let mut paragraph = Paragraph::new(text);
        if let Some(style) = style {
            paragraph.format.style = Some(self.resolve_paragraph_style(style)?);
        }
        paragraph.format.alignment = alignment;
        Ok(paragraph)
    }

    /// Appends a paragraph and returns its index.
    ///
    /// # Errors
    /// Returns `DocumentError::NotFound` for an unknown style.
    pub fn add_paragraph(
        &mut self,
        text: &str,
        style: Option<&str>,
        alignment: Option<Alignment>,
    ) -> DocumentResult<usize> {
        let paragraph = self.build_paragraph(text, style, alignment)?;
        self.body.push(Block::Paragraph(paragraph));
        Ok(self.paragraph_count() - 1)
    }

    /// Inserts a paragraph before paragraph `index`; `index == count` appends.
    ///
    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` past the end or
    /// `DocumentError::NotFound` for an unknown style.
    pub fn insert_paragraph(
        &mut self,
        index: usize,
        text: &str,
        style: Option<&str>,
        alignment: Option<Alignment>,
    ) -> DocumentResult<usize> {
        let count = self.paragraph_count();
        if index > count {
            return Err(DocumentError::out_of_range("Paragraph", index, count + 1));
        }
        let paragraph = self.build_paragraph(text, style, alignment)?;
        if index == count {
            self.body.push(Block::Paragraph(paragraph));
        } else {
            let position = self.paragraph_block_index(index)?;
            self.body.insert(position, Block::Paragraph(paragraph));
        }
        Ok(index)
    }

    /// Inserts a paragraph directly after paragraph `index`.
    ///
    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` for an unknown paragraph.
    pub fn insert_paragraph_after(&mut self, index: usize, paragraph: Paragraph) -> DocumentResult<usize> {
        let position = self.paragraph_block_index(index)?;
        self.body.insert(position + 1, Block::Paragraph(paragraph));
        Ok(index + 1)
    }

    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` or `DocumentError::NotFound`
    /// for an unknown style.
    pub fn update_paragraph(&mut self, index: usize, update: &ParagraphUpdate) -> DocumentResult<()> {
        let style = match update.style.as_deref() {
            Some(style) => Some(self.resolve_paragraph_style(style)?),
            None => None,
        };
        let paragraph = self.paragraph_mut(index)?;
        if let Some(text) = update.text.as_deref() {
            paragraph.set_text(text);
        }
        if let Some(style) = style {
            paragraph.format.style = Some(style);
        }
        if let Some(alignment) = update.alignment {
            paragraph.format.alignment = Some(alignment);
        }
        Ok(())
    }

    /// Removes a paragraph and returns its text. A section break carried by
    /// the paragraph moves to the previous paragraph.
    ///
    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` for an unknown paragraph.
    pub fn delete_paragraph(&mut self, index: usize) -> DocumentResult<String> {
        let position = self.paragraph_block_index(index)?;
        let Block::Paragraph(removed) = self.body.remove(position) else {
            return Err(DocumentError::out_of_range("Paragraph", index, self.paragraph_count()));
        };
        if let Some(section) = removed.format.section.clone() {
            let previous = self.body[..position].iter_mut().rev().find_map(|block| match block {
                Block::Paragraph(paragraph) => Some(paragraph),
                Block::Table(_) => None,
            });
            if let Some(previous) = previous
                && previous.format.section.is_none()
            {
                previous.format.section = Some(section);
            }
        }
        Ok(removed.text())
    }

    /// Appends a heading. Level 0 uses the Title style.
    ///
    /// # Errors
    /// Returns `DocumentError::InvalidArgument` for levels above 9.
    pub fn add_heading(&mut self, text: &str, level: u8) -> DocumentResult<usize> {
        if level > 9 {
            return Err(DocumentError::invalid("Heading level must be between 0 and 9"));
        }
        let style_id = if level == 0 {
            "Title".to_string()
        } else {
            format!("Heading{level}")
        };
        self.ensure_builtin_style(&style_id);
        self.add_paragraph(text, Some(&style_id), None)
    }

    /// Appends a run to a paragraph and returns the run index.
    ///
    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` or invalid formatting errors.
    pub fn add_run(&mut self, index: usize, text: &str, format: &TextFormat) -> DocumentResult<usize> {
        let run_format = format.to_run_format()?;
        let paragraph = self.paragraph_mut(index)?;
        paragraph.push_run(Run::with_format(text, run_format));
        Ok(paragraph.runs().count() - 1)
    }

    /// Merges formatting into an existing run.
    ///
    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` for unknown paragraphs or runs.
    pub fn format_run(&mut self, index: usize, run_index: usize, format: &TextFormat) -> DocumentResult<()> {
        let run_format = format.to_run_format()?;
        let paragraph = self.paragraph_mut(index)?;
        let count = paragraph.runs().count();
        let run = paragraph
            .runs_mut()
            .nth(run_index)
            .ok_or_else(|| DocumentError::out_of_range("Run", run_index, count))?;
        run.format.merge(&run_format);
        Ok(())
    }

    /// Applies formatting to every run of a paragraph.
    ///
    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` or invalid formatting errors.
    pub fn format_paragraph_text(&mut self, index: usize, format: &TextFormat) -> DocumentResult<usize> {
        let run_format = format.to_run_format()?;
        let paragraph = self.paragraph_mut(index)?;
        let mut touched = 0;
        for run in paragraph.runs_mut() {
            run.format.merge(&run_format);
            touched += 1;
        }
        Ok(touched)
    }

    /// Applies formatting to the characters in `start..end` of a paragraph.
    ///
    /// # Errors
    /// Returns `DocumentError::InvalidArgument` for an empty or out-of-bounds
    /// range.
    pub fn format_text_range(
        &mut self,
        index: usize,
        start: usize,
        end: usize,
        format: &TextFormat,
    ) -> DocumentResult<usize> {
        let run_format = format.to_run_format()?;
        let paragraph = self.paragraph_mut(index)?;
        let len = paragraph.char_len();
        if start >= end || end > len {
            return Err(DocumentError::invalid(format!(
                "Invalid text range {start}-{end} for paragraph of length {len}"
            )));
        }
        Ok(paragraph.format_range(start, end, |target| target.merge(&run_format)))
    }

    /// Sets paragraph layout properties.
    ///
    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` or `DocumentError::InvalidArgument`
    /// for negative spacing.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn format_paragraph(&mut self, index: usize, formatting: &ParagraphFormatting) -> DocumentResult<()> {
        for (name, value) in [
            ("space_before", formatting.space_before),
            ("space_after", formatting.space_after),
            ("line_spacing", formatting.line_spacing),
        ] {
            if value.is_some_and(|value| !value.is_finite() || value < 0.0) {
                return Err(DocumentError::invalid(format!("{name} must be a non-negative number")));
            }
        }
        let paragraph = self.paragraph_mut(index)?;
        let format = &mut paragraph.format;
        if let Some(alignment) = formatting.alignment {
            format.alignment = Some(alignment);
        }
        if let Some(points) = formatting.space_before {
            format.spacing.before = Some((points * 20.0).round() as u32);
        }
        if let Some(points) = formatting.space_after {
            format.spacing.after = Some((points * 20.0).round() as u32);
        }
        if let Some(multiple) = formatting.line_spacing {
            format.spacing.line = Some((multiple * 240.0).round() as u32);
        }
        if let Some(inches) = formatting.left_indent {
            format.indent.left = Some(signed_twips(inches));
        }
        if let Some(inches) = formatting.right_indent {
            format.indent.right = Some(signed_twips(inches));
        }
        if let Some(inches) = formatting.first_line_indent {
            if inches < 0.0 {
                format.indent.hanging = Some(signed_twips(-inches));
                format.indent.first_line = None;
            } else {
                format.indent.first_line = Some(signed_twips(inches));
                format.indent.hanging = None;
            }
        }
        if let Some(keep) = formatting.keep_with_next {
            format.keep_next = keep;
        }
        if let Some(page_break) = formatting.page_break_before {
            format.page_break_before = page_break;
        }
        Ok(())
    }

    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` for an unknown paragraph.
    pub fn set_alignment(&mut self, index: usize, alignment: Alignment) -> DocumentResult<()> {
        self.paragraph_mut(index)?.format.alignment = Some(alignment);
        Ok(())
    }

    /// Inserts text at a character offset inside a paragraph.
    ///
    /// # Errors
    /// Returns `DocumentError::InvalidArgument` when the offset is past the
    /// end of the paragraph.
    pub fn insert_text(
        &mut self,
        index: usize,
        offset: usize,
        text: &str,
        format: Option<&TextFormat>,
    ) -> DocumentResult<()> {
        let run_format: Option<RunFormat> = format.map(TextFormat::to_run_format).transpose()?;
        let paragraph = self.paragraph_mut(index)?;
        let len = paragraph.char_len();
        if offset > len {
            return Err(DocumentError::invalid(format!(
                "Offset {offset} is beyond paragraph length {len}"
            )));
        }
        paragraph.insert_text_at(offset, text, run_format.as_ref());
        Ok(())
    }

    /// Appends a paragraph holding a page break and returns its index.
    pub fn add_page_break(&mut self) -> usize {
        let mut paragraph = Paragraph::default();
        paragraph.push_run(Run {
            format: RunFormat::default(),
            content: vec![RunContent::Break(BreakKind::Page)],
        });
        self.body.push(Block::Paragraph(paragraph));
        self.paragraph_count() - 1
    }

    /// Literal search over top-level paragraphs.
    ///
    /// # Errors
    /// Returns `DocumentError::InvalidArgument` for an empty query.
    pub fn find_text(&self, query: &str, case_sensitive: bool, whole_word: bool) -> DocumentResult<Vec<TextMatch>> {
        let regex = literal_regex(query, case_sensitive)?;
        Ok(self.search_paragraphs(&regex, whole_word))
    }

    /// Regular-expression search over top-level paragraphs.
    ///
    /// # Errors
    /// Returns `DocumentError::InvalidArgument` for an invalid pattern.
    pub fn regex_search(&self, pattern: &str, case_sensitive: bool) -> DocumentResult<Vec<TextMatch>> {
        let regex = pattern_regex(pattern, case_sensitive)?;
        Ok(self.search_paragraphs(&regex, false))
    }

    /// Regular-expression replacement over body paragraphs, including table
    /// cells. `replacement` may refer to capture groups as `$1` or `$name`.
    /// Empty matches are skipped. Returns the number of replacements.
    ///
    /// # Errors
    /// Returns `DocumentError::InvalidArgument` for an empty or invalid
    /// pattern.
    pub fn regex_replace(
        &mut self,
        pattern: &str,
        replacement: &str,
        case_sensitive: bool,
    ) -> DocumentResult<usize> {
        let regex = pattern_regex(pattern, case_sensitive)?;
        let mut count = 0;
        self.for_each_paragraph_mut(&mut |paragraph: &mut Paragraph| {
            let text = paragraph.text();
            let mut edits = Vec::new();
            for captures in regex.captures_iter(&text) {
                let Some(found) = captures.get(0) else {
                    continue;
                };
                if found.as_str().is_empty() {
                    continue;
                }
                let mut expanded = String::new();
                captures.expand(replacement, &mut expanded);
                let offset = text[..found.start()].chars().count();
                edits.push((offset, found.as_str().chars().count(), expanded));
            }
            for (offset, length, expanded) in edits.iter().rev() {
                paragraph.replace_range(*offset, offset + length, expanded);
            }
            count += edits.len();
        });
        Ok(count)
    }

    fn search_paragraphs(&self, regex: &Regex, whole_word: bool) -> Vec<TextMatch> {
        let mut hits = Vec::new();
        for (paragraph_index, paragraph) in self.paragraphs().enumerate() {
            let text = paragraph.text();
            for (offset, length, matched) in match_spans(&text, regex, whole_word) {
                hits.push(TextMatch {
                    paragraph_index,
                    offset,
                    length,
                    text: matched,
                });
            }
        }
        hits
    }

    /// Replaces every occurrence in body paragraphs, including table cells.
    /// Returns the number of replacements.
    ///
    /// # Errors
    /// Returns `DocumentError::InvalidArgument` for an empty search string.
    pub fn replace_text(
        &mut self,
        find: &str,
        replace: &str,
        case_sensitive: bool,
        whole_word: bool,
    ) -> DocumentResult<usize> {
        let regex = literal_regex(find, case_sensitive)?;
        let mut count = 0;
        self.for_each_paragraph_mut(&mut |paragraph: &mut Paragraph| {
            let text = paragraph.text();
            let spans = match_spans(&text, &regex, whole_word);
            for (offset, length, _) in spans.iter().rev() {
                paragraph.replace_range(*offset, offset + length, replace);
            }
            count += spans.len();
        });
        Ok(count)
    }

    /// Highlights every occurrence in body paragraphs and returns the count.
    ///
    /// # Errors
    /// Returns `DocumentError::InvalidArgument` for an empty query or an
    /// unknown highlight color.
    pub fn highlight_text(&mut self, query: &str, color: &str, case_sensitive: bool) -> DocumentResult<usize> {
        let color = super::normalize_highlight(color)?;
        let regex = literal_regex(query, case_sensitive)?;
        let mut count = 0;
        self.for_each_paragraph_mut(&mut |paragraph: &mut Paragraph| {
            let text = paragraph.text();
            let spans = match_spans(&text, &regex, false);
            for (offset, length, _) in spans.iter().rev() {
                paragraph.format_range(*offset, offset + length, |format| {
                    format.highlight = Some(color.clone());
                });
            }
            count += spans.len();
        });
        Ok(count)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn signed_twips(inches: f64) -> i32 {
    (inches * crate::document::TWIPS_PER_INCH)
        .round()
        .clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}

fn pattern_regex(pattern: &str, case_sensitive: bool) -> DocumentResult<Regex> {
    if pattern.is_empty() {
        return Err(DocumentError::invalid("Search pattern cannot be empty"));
    }
    RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|err| DocumentError::invalid(format!("Invalid regex pattern: {err}")))
}

fn literal_regex(query: &str, case_sensitive: bool) -> DocumentResult<Regex> {
    if query.is_empty() {
        return Err(DocumentError::invalid("Search text cannot be empty"));
    }
    RegexBuilder::new(&regex::escape(query))
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|err| DocumentError::invalid(err.to_string()))
}

/// Matches as `(char_offset, char_length, text)`. Whole-word matching
/// requires non-alphanumeric neighbours.
fn match_spans(text: &str, regex: &Regex, whole_word: bool) -> Vec<(usize, usize, String)> {
    regex
        .find_iter(text)
        .filter(|found| !found.as_str().is_empty())
        .filter(|found| {
            !whole_word || {
                let before = text[..found.start()].chars().next_back();
                let after = text[found.end()..].chars().next();
                !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
            }
        })
        .map(|found| {
            let offset = text[..found.start()].chars().count();
            let matched = found.as_str().to_string();
            (offset, matched.chars().count(), matched)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WordDocument {
        let mut doc = WordDocument::new();
        doc.add_paragraph("The cat sat on the mat.", None, None).unwrap();
        doc.add_paragraph("Concatenate cats", None, None).unwrap();
        doc
    }

    #[test]
    fn insert_paragraph_at_end_appends() {
        let mut doc = sample();
        assert_eq!(doc.insert_paragraph(2, "tail", None, None).unwrap(), 2);
        assert_eq!(doc.insert_paragraph(0, "head", None, None).unwrap(), 0);
        assert_eq!(doc.paragraph(0).unwrap().text(), "head");
        assert_eq!(doc.paragraph(3).unwrap().text(), "tail");
        assert!(doc.insert_paragraph(9, "x", None, None).is_err());
    }

    #[test]
    fn update_and_delete() {
        let mut doc = sample();
        doc.update_paragraph(
            0,
            &ParagraphUpdate {
                text: Some("Changed".to_string()),
                style: Some("Heading 1".to_string()),
                alignment: Some(Alignment::Center),
            },
        )
        .unwrap();
        let info = doc.paragraph_info(0).unwrap();
        assert_eq!(info.text, "Changed");
        assert_eq!(info.style.as_deref(), Some("Heading1"));
        assert_eq!(info.heading_level, Some(1));
        assert_eq!(doc.delete_paragraph(1).unwrap(), "Concatenate cats");
        assert_eq!(doc.paragraph_count(), 1);
    }

    #[test]
    fn unknown_style_is_rejected() {
        let mut doc = WordDocument::new();
        let err = doc.add_paragraph("x", Some("Fancy"), None).unwrap_err();
        assert!(matches!(err, DocumentError::NotFound(_)));
    }

    #[test]
    fn headings_validate_level() {
        let mut doc = WordDocument::new();
        doc.add_heading("Report", 0).unwrap();
        doc.add_heading("Intro", 2).unwrap();
        assert!(doc.add_heading("Too deep", 10).is_err());
        assert_eq!(doc.paragraph_info(0).unwrap().heading_level, Some(0));
        assert_eq!(doc.paragraph_info(1).unwrap().style.as_deref(), Some("Heading2"));
    }

    #[test]
    fn find_respects_case_and_word_boundaries() {
        let doc = sample();
        assert_eq!(doc.find_text("cat", false, false).unwrap().len(), 3);
        let whole = doc.find_text("cat", false, true).unwrap();
        assert_eq!(whole.len(), 1);
        assert_eq!(whole[0].offset, 4);
        assert_eq!(doc.find_text("Cat", true, false).unwrap().len(), 0);
        assert!(doc.find_text("", false, false).is_err());
    }

    #[test]
    fn replace_counts_and_rewrites() {
        let mut doc = sample();
        let count = doc.replace_text("cat", "dog", false, true).unwrap();
        assert_eq!(count, 1);
        assert_eq!(doc.paragraph(0).unwrap().text(), "The dog sat on the mat.");
        assert_eq!(doc.paragraph(1).unwrap().text(), "Concatenate cats");
    }

    #[test]
    fn regex_search_reports_offsets() {
        let doc = sample();
        let hits = doc.regex_search(r"\b\w{3}\.", true).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "mat.");
        assert!(doc.regex_search("(", true).is_err());
    }

    #[test]
    fn regex_replace_expands_groups() {
        let mut doc = WordDocument::new();
        doc.add_paragraph("Due 2024-03-09 and 2025-12-31", None, None).unwrap();
        let count = doc
            .regex_replace(r"(\d{4})-(\d{2})-(\d{2})", "$3/$2/$1", true)
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(doc.paragraph(0).unwrap().text(), "Due 09/03/2024 and 31/12/2025");
        assert_eq!(doc.regex_replace("x*", "y", true).unwrap(), 0);
        assert!(doc.regex_replace("[", "y", true).is_err());
    }

    #[test]
    fn replace_text_keeps_page_break_before_heading() {
        let mut doc = WordDocument::new();
        let mut paragraph = Paragraph::default();
        paragraph.push_run(Run {
            format: RunFormat::default(),
            content: vec![
                RunContent::Break(BreakKind::Page),
                RunContent::Text("Chapter One".to_string()),
            ],
        });
        doc.body.push(Block::Paragraph(paragraph));
        assert_eq!(doc.replace_text("Chapter One", "Chapter 1", false, false).unwrap(), 1);
        let paragraph = doc.paragraph(0).unwrap();
        assert_eq!(paragraph.text(), "Chapter 1");
        let breaks = paragraph
            .runs()
            .flat_map(|run| run.content.iter())
            .filter(|item| matches!(item, RunContent::Break(BreakKind::Page)))
            .count();
        assert_eq!(breaks, 1);
    }

    #[test]
    fn insert_text_with_format() {
        let mut doc = sample();
        let bold = TextFormat {
            bold: Some(true),
            ..TextFormat::default()
        };
        doc.insert_text(0, 4, "black ", Some(&bold)).unwrap();
        let info = doc.paragraph_info(0).unwrap();
        assert_eq!(info.text, "The black cat sat on the mat.");
        assert_eq!(info.runs.iter().filter(|run| run.bold == Some(true)).count(), 1);
        assert!(doc.insert_text(0, 999, "x", None).is_err());
    }

    #[test]
    fn highlight_marks_runs() {
        let mut doc = sample();
        let count = doc.highlight_text("mat", "yellow", false).unwrap();
        assert_eq!(count, 1);
        let info = doc.paragraph_info(0).unwrap();
        let highlighted: Vec<&str> = info
            .runs
            .iter()
            .filter(|run| run.highlight.is_some())
            .map(|run| run.text.as_str())
            .collect();
        assert_eq!(highlighted, vec!["mat"]);
    }

    #[test]
    fn paragraph_formatting_converts_units() {
        let mut doc = sample();
        doc.format_paragraph(
            0,
            &ParagraphFormatting {
                space_after: Some(12.0),
                line_spacing: Some(1.5),
                first_line_indent: Some(-0.25),
                ..ParagraphFormatting::default()
            },
        )
        .unwrap();
        let format = &doc.paragraph(0).unwrap().format;
        assert_eq!(format.spacing.after, Some(240));
        assert_eq!(format.spacing.line, Some(360));
        assert_eq!(format.indent.hanging, Some(360));
    }
}
