use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::section::SectionProperties;
use crate::editor::DocumentError;

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
    Distribute,
}

impl Alignment {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Justify => "justify",
            Self::Distribute => "distribute",
        }
    }

    #[must_use]
    pub const fn as_xml(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Justify => "both",
            Self::Distribute => "distribute",
        }
    }

    #[must_use]
    pub fn from_xml(value: &str) -> Option<Self> {
        match value {
            "left" | "start" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" | "end" => Some(Self::Right),
            "both" | "justify" => Some(Self::Justify),
            "distribute" => Some(Self::Distribute),
            _ => None,
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Alignment {
    type Err = DocumentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_xml(value.trim().to_ascii_lowercase().as_str()).ok_or_else(|| {
            DocumentError::InvalidArgument(format!(
                "Invalid alignment: {value}. Use left, center, right, justify or distribute"
            ))
        })
    }
}

/// Superscript or subscript placement of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalAlign {
    Baseline,
    Superscript,
    Subscript,
}

impl VerticalAlign {
    #[must_use]
    pub const fn as_xml(self) -> &'static str {
        match self {
            Self::Baseline => "baseline",
            Self::Superscript => "superscript",
            Self::Subscript => "subscript",
        }
    }

    #[must_use]
    pub fn from_xml(value: &str) -> Option<Self> {
        match value {
            "baseline" => Some(Self::Baseline),
            "superscript" => Some(Self::Superscript),
            "subscript" => Some(Self::Subscript),
            _ => None,
        }
    }
}

/// Character formatting. `None` means inherited from the style chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunFormat {
    pub style: Option<String>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<String>,
    pub strike: Option<bool>,
    pub font: Option<String>,
    /// Size in half-points.
    pub size: Option<u32>,
    pub color: Option<String>,
    pub highlight: Option<String>,
    pub vertical_align: Option<VerticalAlign>,
}

impl RunFormat {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overlays every property set on `other`.
    pub fn merge(&mut self, other: &Self) {
        if other.style.is_some() {
            self.style.clone_from(&other.style);
        }
        if other.bold.is_some() {
            self.bold = other.bold;
        }
        if other.italic.is_some() {
            self.italic = other.italic;
        }
        if other.underline.is_some() {
            self.underline.clone_from(&other.underline);
        }
        if other.strike.is_some() {
            self.strike = other.strike;
        }
        if other.font.is_some() {
            self.font.clone_from(&other.font);
        }
        if other.size.is_some() {
            self.size = other.size;
        }
        if other.color.is_some() {
            self.color.clone_from(&other.color);
        }
        if other.highlight.is_some() {
            self.highlight.clone_from(&other.highlight);
        }
        if other.vertical_align.is_some() {
            self.vertical_align = other.vertical_align;
        }
    }

    #[must_use]
    pub fn is_underlined(&self) -> bool {
        self.underline.as_deref().is_some_and(|value| value != "none")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakKind {
    Line,
    Page,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCharKind {
    Begin,
    Separate,
    End,
}

/// Inline picture placed in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drawing {
    pub rel_id: String,
    pub width_emu: u64,
    pub height_emu: u64,
    pub id: u32,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunContent {
    Text(String),
    Tab,
    Break(BreakKind),
    Drawing(Drawing),
    FieldChar(FieldCharKind),
    InstrText(String),
    CommentReference(u32),
}

impl RunContent {
    /// Converts plain text into run content, mapping tabs and newlines.
    #[must_use]
    pub fn from_text(text: &str) -> Vec<Self> {
        let mut content = Vec::new();
        let mut buffer = String::new();
        for ch in text.chars() {
            match ch {
                '\t' | '\n' => {
                    if !buffer.is_empty() {
                        content.push(Self::Text(std::mem::take(&mut buffer)));
                    }
                    content.push(if ch == '\t' {
                        Self::Tab
                    } else {
                        Self::Break(BreakKind::Line)
                    });
                }
                '\r' => {}
                _ => buffer.push(ch),
            }
        }
        if !buffer.is_empty() {
            content.push(Self::Text(buffer));
        }
        content
    }

    /// Number of characters this item contributes to the paragraph text.
    #[must_use]
    pub fn char_len(&self) -> usize {
        match self {
            Self::Text(text) => text.chars().count(),
            Self::Tab | Self::Break(BreakKind::Line) => 1,
            _ => 0,
        }
    }

    /// Text, tabs and line breaks. Everything else is zero-width.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_) | Self::Tab | Self::Break(BreakKind::Line))
    }

    fn push_text(&self, out: &mut String) {
        match self {
            Self::Text(text) => out.push_str(text),
            Self::Tab => out.push('\t'),
            Self::Break(BreakKind::Line) => out.push('\n'),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Run {
    pub format: RunFormat,
    pub content: Vec<RunContent>,
}

impl Run {
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            format: RunFormat::default(),
            content: RunContent::from_text(text),
        }
    }

    #[must_use]
    pub fn with_format(text: &str, format: RunFormat) -> Self {
        Self {
            format,
            content: RunContent::from_text(text),
        }
    }

    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        for item in &self.content {
            item.push_text(&mut out);
        }
        out
    }

    #[must_use]
    pub fn char_len(&self) -> usize {
        self.content.iter().map(RunContent::char_len).sum()
    }

    pub fn drawings(&self) -> impl Iterator<Item = &Drawing> {
        self.content.iter().filter_map(|item| match item {
            RunContent::Drawing(drawing) => Some(drawing),
            _ => None,
        })
    }

    /// Drops text content and keeps breaks, drawings, fields and comment
    /// references. Returns the position the text started at.
    fn strip_text(&mut self) -> usize {
        let at = self
            .content
            .iter()
            .position(RunContent::is_text)
            .unwrap_or(self.content.len());
        self.content.retain(|item| !item.is_text());
        at
    }

    /// Splits the run at a character offset, returning the tail with the
    /// same formatting.
    #[must_use]
    pub fn split_off(&mut self, offset: usize) -> Self {
        let mut pos = 0;
        for index in 0..self.content.len() {
            let len = self.content[index].char_len();
            if pos >= offset {
                let tail = self.content.split_off(index);
                return Self {
                    format: self.format.clone(),
                    content: tail,
                };
            }
            if pos + len > offset {
                let mut tail = self.content.split_off(index + 1);
                if let RunContent::Text(text) = &mut self.content[index] {
                    let byte = char_to_byte(text, offset - pos);
                    let rest = text.split_off(byte);
                    tail.insert(0, RunContent::Text(rest));
                }
                return Self {
                    format: self.format.clone(),
                    content: tail,
                };
            }
            pos += len;
        }
        Self {
            format: self.format.clone(),
            content: Vec::new(),
        }
    }
}

/// Hyperlink wrapping one or more runs. External links carry a relationship
/// id; internal links carry a bookmark anchor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hyperlink {
    pub rel_id: Option<String>,
    pub anchor: Option<String>,
    pub runs: Vec<Run>,
}

/// `w:fldSimple` field with its cached result runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimpleField {
    pub instr: String,
    pub runs: Vec<Run>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Run(Run),
    Hyperlink(Hyperlink),
    Field(SimpleField),
    BookmarkStart { id: u32, name: String },
    BookmarkEnd { id: u32 },
    CommentRangeStart(u32),
    CommentRangeEnd(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberingRef {
    pub num_id: u32,
    pub level: u8,
}

/// Indentation in twips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Indentation {
    pub left: Option<i32>,
    pub right: Option<i32>,
    pub first_line: Option<i32>,
    pub hanging: Option<i32>,
}

impl Indentation {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.left.is_none()
            && self.right.is_none()
            && self.first_line.is_none()
            && self.hanging.is_none()
    }
}

/// Spacing in twips; `line` is in 240ths of a line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Spacing {
    pub before: Option<u32>,
    pub after: Option<u32>,
    pub line: Option<u32>,
}

impl Spacing {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.before.is_none() && self.after.is_none() && self.line.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParagraphFormat {
    pub style: Option<String>,
    pub alignment: Option<Alignment>,
    pub numbering: Option<NumberingRef>,
    pub indent: Indentation,
    pub spacing: Spacing,
    pub keep_next: bool,
    pub keep_lines: bool,
    pub page_break_before: bool,
    pub outline_level: Option<u8>,
    /// Section break carried by the last paragraph of a section.
    pub section: Option<Box<SectionProperties>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunLoc {
    Top(usize),
    Nested(usize, usize),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub format: ParagraphFormat,
    pub inlines: Vec<Inline>,
}

impl Paragraph {
    #[must_use]
    pub fn new(text: &str) -> Self {
        let mut paragraph = Self::default();
        if !text.is_empty() {
            paragraph.inlines.push(Inline::Run(Run::new(text)));
        }
        paragraph
    }

    #[must_use]
    pub fn with_style(text: &str, style: &str) -> Self {
        let mut paragraph = Self::new(text);
        paragraph.format.style = Some(style.to_string());
        paragraph
    }

    /// Visible text: runs, hyperlinks and field results. Tabs map to `\t`
    /// and line breaks to `\n`.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::new();
        for run in self.runs() {
            for item in &run.content {
                item.push_text(&mut out);
            }
        }
        out
    }

    #[must_use]
    pub fn char_len(&self) -> usize {
        self.runs().map(Run::char_len).sum()
    }

    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.inlines.iter().flat_map(|inline| match inline {
            Inline::Run(run) => std::slice::from_ref(run).iter(),
            Inline::Hyperlink(link) => link.runs.iter(),
            Inline::Field(field) => field.runs.iter(),
            _ => Default::default(),
        })
    }

    pub fn runs_mut(&mut self) -> impl Iterator<Item = &mut Run> {
        self.inlines.iter_mut().flat_map(|inline| match inline {
            Inline::Run(run) => std::slice::from_mut(run).iter_mut(),
            Inline::Hyperlink(link) => link.runs.iter_mut(),
            Inline::Field(field) => field.runs.iter_mut(),
            _ => Default::default(),
        })
    }

    pub fn drawings(&self) -> impl Iterator<Item = &Drawing> {
        self.runs().flat_map(Run::drawings)
    }

    /// Removes runs, hyperlinks and fields. Bookmarks and comment anchors stay.
    pub fn clear_content(&mut self) {
        self.inlines.retain(|inline| {
            !matches!(
                inline,
                Inline::Run(_) | Inline::Hyperlink(_) | Inline::Field(_)
            )
        });
    }

    /// Appends a run, placing it before a trailing comment range end so the
    /// comment keeps covering the paragraph.
    pub fn push_run(&mut self, run: Run) {
        let position = self
            .inlines
            .iter()
            .rposition(|inline| {
                matches!(
                    inline,
                    Inline::Run(_) | Inline::Hyperlink(_) | Inline::Field(_) | Inline::CommentRangeStart(_) | Inline::BookmarkStart { .. }
                )
            })
            .map_or(0, |index| index + 1);
        self.inlines.insert(position, Inline::Run(run));
    }

    /// Replaces the visible content with a single run, keeping the first
    /// run's formatting.
    pub fn set_text(&mut self, text: &str) {
        let format = self.runs().next().map(|run| run.format.clone()).unwrap_or_default();
        self.clear_content();
        if !text.is_empty() {
            self.push_run(Run::with_format(text, format));
        }
    }

    #[must_use]
    pub fn is_list_item(&self) -> bool {
        self.format.numbering.is_some()
    }

    fn run_locs(&self) -> Vec<RunLoc> {
        let mut locs = Vec::new();
        for (index, inline) in self.inlines.iter().enumerate() {
            match inline {
                Inline::Run(_) => locs.push(RunLoc::Top(index)),
                Inline::Hyperlink(link) => {
                    locs.extend((0..link.runs.len()).map(|inner| RunLoc::Nested(index, inner)));
                }
                Inline::Field(field) => {
                    locs.extend((0..field.runs.len()).map(|inner| RunLoc::Nested(index, inner)));
                }
                _ => {}
            }
        }
        locs
    }

    fn nested_runs_mut(&mut self, index: usize) -> Option<&mut Vec<Run>> {
        match self.inlines.get_mut(index)? {
            Inline::Hyperlink(link) => Some(&mut link.runs),
            Inline::Field(field) => Some(&mut field.runs),
            _ => None,
        }
    }

    fn run_at(&self, loc: RunLoc) -> Option<&Run> {
        match loc {
            RunLoc::Top(index) => match self.inlines.get(index)? {
                Inline::Run(run) => Some(run),
                _ => None,
            },
            RunLoc::Nested(index, inner) => match self.inlines.get(index)? {
                Inline::Hyperlink(link) => link.runs.get(inner),
                Inline::Field(field) => field.runs.get(inner),
                _ => None,
            },
        }
    }

    fn run_at_mut(&mut self, loc: RunLoc) -> Option<&mut Run> {
        match loc {
            RunLoc::Top(index) => match self.inlines.get_mut(index)? {
                Inline::Run(run) => Some(run),
                _ => None,
            },
            RunLoc::Nested(index, inner) => self.nested_runs_mut(index)?.get_mut(inner),
        }
    }

    fn insert_run_at(&mut self, loc: RunLoc, after: bool, run: Run) {
        let shift = usize::from(after);
        match loc {
            RunLoc::Top(index) => self.inlines.insert(index + shift, Inline::Run(run)),
            RunLoc::Nested(index, inner) => {
                if let Some(runs) = self.nested_runs_mut(index) {
                    runs.insert(inner + shift, run);
                }
            }
        }
    }

    fn remove_run_at(&mut self, loc: RunLoc) {
        match loc {
            RunLoc::Top(index) => {
                self.inlines.remove(index);
            }
            RunLoc::Nested(index, inner) => {
                if let Some(runs) = self.nested_runs_mut(index) {
                    runs.remove(inner);
                }
            }
        }
    }

    /// Runs with their starting character offset and length.
    fn run_spans(&self) -> Vec<(RunLoc, usize, usize)> {
        let mut pos = 0;
        let mut spans = Vec::new();
        for loc in self.run_locs() {
            let len = self.run_at(loc).map_or(0, Run::char_len);
            spans.push((loc, pos, len));
            pos += len;
        }
        spans
    }

    /// Ensures a run boundary exists at `offset`.
    fn split_at(&mut self, offset: usize) {
        for (loc, start, len) in self.run_spans() {
            if offset > start && offset < start + len {
                let tail = self.run_at_mut(loc).map(|run| run.split_off(offset - start));
                if let Some(tail) = tail {
                    self.insert_run_at(loc, true, tail);
                }
                return;
            }
        }
    }

    fn covered_runs(&mut self, start: usize, end: usize) -> Vec<RunLoc> {
        self.split_at(start);
        self.split_at(end);
        self.run_spans()
            .into_iter()
            .filter(|(_, run_start, len)| *len > 0 && *run_start >= start && run_start + len <= end)
            .map(|(loc, _, _)| loc)
            .collect()
    }

    /// Inserts text at a character offset. Without an explicit format the
    /// new run inherits the formatting of the run it touches.
    pub fn insert_text_at(&mut self, offset: usize, text: &str, format: Option<&RunFormat>) {
        if text.is_empty() {
            return;
        }
        self.split_at(offset);
        let spans = self.run_spans();
        let before = spans
            .iter()
            .rev()
            .find(|(_, start, len)| *len > 0 && start + len == offset)
            .map(|(loc, _, _)| (*loc, true));
        let anchor = before.or_else(|| {
            spans
                .iter()
                .find(|(_, start, _)| *start == offset)
                .map(|(loc, _, _)| (*loc, false))
        });
        match anchor {
            Some((loc, after)) => {
                let inherited = self
                    .run_at(loc)
                    .map(|run| run.format.clone())
                    .unwrap_or_default();
                let run_format = format.cloned().unwrap_or(inherited);
                self.insert_run_at(loc, after, Run::with_format(text, run_format));
            }
            None => self.push_run(Run::with_format(text, format.cloned().unwrap_or_default())),
        }
    }

    /// Replaces the characters in `start..end` with `text`, keeping the
    /// formatting of the first affected run. Matches may span runs.
    /// Zero-width content inside the range (page breaks, drawings, field
    /// characters, comment references) stays in place.
    pub fn replace_range(&mut self, start: usize, end: usize, text: &str) {
        let covered = self.covered_runs(start, end);
        let Some((first, rest)) = covered.split_first() else {
            self.insert_text_at(start, text, None);
            return;
        };
        for loc in rest.iter().rev() {
            let emptied = self.run_at_mut(*loc).is_some_and(|run| {
                run.strip_text();
                run.content.is_empty()
            });
            if emptied {
                self.remove_run_at(*loc);
            }
        }
        let emptied = self.run_at_mut(*first).is_some_and(|run| {
            let at = run.strip_text();
            run.content.splice(at..at, RunContent::from_text(text));
            run.content.is_empty()
        });
        if emptied {
            self.remove_run_at(*first);
        }
    }

    /// Applies `apply` to the formatting of every run inside `start..end`,
    /// splitting runs at the boundaries. Returns the number of runs touched.
    pub fn format_range(
        &mut self,
        start: usize,
        end: usize,
        mut apply: impl FnMut(&mut RunFormat),
    ) -> usize {
        let covered = self.covered_runs(start, end);
        for loc in &covered {
            if let Some(run) = self.run_at_mut(*loc) {
                apply(&mut run.format);
            }
        }
        covered.len()
    }
}

/// Byte index of the `chars`-th character, or the string length past the end.
#[must_use]
pub fn char_to_byte(text: &str, chars: usize) -> usize {
    text.char_indices().nth(chars).map_or(text.len(), |(byte, _)| byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn styled(text: &str, bold: bool) -> Run {
        Run::with_format(
            text,
            RunFormat {
                bold: Some(bold),
                ..RunFormat::default()
            },
        )
    }

    fn two_runs() -> Paragraph {
        let mut paragraph = Paragraph::default();
        paragraph.push_run(styled("Hello ", true));
        paragraph.push_run(styled("world", false));
        paragraph
    }

    #[test]
    fn text_maps_tabs_and_breaks() {
        let paragraph = Paragraph::new("a\tb\nc");
        assert_eq!(paragraph.text(), "a\tb\nc");
        assert_eq!(paragraph.char_len(), 5);
    }

    #[test]
    fn split_keeps_formatting() {
        let mut run = styled("abcdef", true);
        let tail = run.split_off(2);
        assert_eq!(run.text(), "ab");
        assert_eq!(tail.text(), "cdef");
        assert_eq!(tail.format.bold, Some(true));
    }

    #[test]
    fn replace_across_runs_keeps_first_format() {
        let mut paragraph = two_runs();
        paragraph.replace_range(4, 8, "X");
        assert_eq!(paragraph.text(), "HellXrld");
        let bold: Vec<Option<bool>> = paragraph.runs().map(|run| run.format.bold).collect();
        assert_eq!(bold, vec![Some(true), Some(true), Some(false)]);
    }

    #[test]
    fn replace_with_empty_removes_text() {
        let mut paragraph = two_runs();
        paragraph.replace_range(0, 6, "");
        assert_eq!(paragraph.text(), "world");
    }

    #[test]
    fn replace_keeps_page_break_in_same_run() {
        let mut paragraph = Paragraph::default();
        paragraph.push_run(Run {
            format: RunFormat::default(),
            content: vec![
                RunContent::Break(BreakKind::Page),
                RunContent::Text("Chapter One".to_string()),
            ],
        });
        paragraph.replace_range(0, 11, "Chapter 1");
        assert_eq!(paragraph.text(), "Chapter 1");
        let run = paragraph.runs().next().unwrap();
        assert_eq!(
            run.content,
            vec![
                RunContent::Break(BreakKind::Page),
                RunContent::Text("Chapter 1".to_string()),
            ]
        );
    }

    #[test]
    fn replace_keeps_drawing_inside_range() {
        let drawing = Drawing {
            rel_id: "rId5".to_string(),
            width_emu: 914_400,
            height_emu: 914_400,
            id: 1,
            name: "Picture 1".to_string(),
            description: None,
        };
        let mut paragraph = Paragraph::default();
        paragraph.push_run(Run {
            format: RunFormat::default(),
            content: vec![
                RunContent::Text("ab".to_string()),
                RunContent::Drawing(drawing.clone()),
                RunContent::Text("cd".to_string()),
            ],
        });
        paragraph.replace_range(1, 3, "X");
        assert_eq!(paragraph.text(), "aXd");
        assert_eq!(paragraph.drawings().collect::<Vec<_>>(), vec![&drawing]);

        paragraph.replace_range(0, 3, "");
        assert_eq!(paragraph.text(), "");
        assert_eq!(paragraph.drawings().count(), 1);
    }

    #[test]
    fn insert_inherits_neighbour_format() {
        let mut paragraph = two_runs();
        paragraph.insert_text_at(6, "big ", None);
        assert_eq!(paragraph.text(), "Hello big world");
        let inserted = paragraph.runs().find(|run| run.text() == "big ").unwrap();
        assert_eq!(inserted.format.bold, Some(true));
    }

    #[test]
    fn insert_into_empty_paragraph() {
        let mut paragraph = Paragraph::default();
        paragraph.insert_text_at(0, "first", None);
        assert_eq!(paragraph.text(), "first");
    }

    #[test]
    fn format_range_splits_runs() {
        let mut paragraph = Paragraph::new("abcdef");
        let touched = paragraph.format_range(1, 3, |format| format.italic = Some(true));
        assert_eq!(touched, 1);
        let italic: Vec<(String, Option<bool>)> = paragraph
            .runs()
            .map(|run| (run.text(), run.format.italic))
            .collect();
        assert_eq!(
            italic,
            vec![
                ("a".to_string(), None),
                ("bc".to_string(), Some(true)),
                ("def".to_string(), None)
            ]
        );
    }

    #[test]
    fn hyperlink_runs_count_toward_text() {
        let mut paragraph = Paragraph::new("see ");
        paragraph.inlines.push(Inline::Hyperlink(Hyperlink {
            rel_id: Some("rId9".to_string()),
            anchor: None,
            runs: vec![Run::new("docs")],
        }));
        assert_eq!(paragraph.text(), "see docs");
        paragraph.replace_range(4, 8, "site");
        assert_eq!(paragraph.text(), "see site");
        assert!(matches!(paragraph.inlines[1], Inline::Hyperlink(_)));
    }

    #[test]
    fn alignment_parses_names() {
        assert_eq!("Justify".parse::<Alignment>().unwrap(), Alignment::Justify);
        assert_eq!(Alignment::Justify.as_xml(), "both");
        assert!("middle".parse::<Alignment>().is_err());
    }
}
