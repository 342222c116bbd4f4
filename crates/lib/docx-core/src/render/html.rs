use std::fmt::Write as _;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use super::{image_part, list_membership};
use crate::document::{
    Alignment,
    Block,
    BreakKind,
    Drawing,
    Inline,
    ListKind,
    Paragraph,
    Run,
    RunContent,
    RunFormat,
    Table,
    VMerge,
    VerticalAlign,
    WordDocument,
    emu_to_inches,
};

const STYLESHEET: &str = "body { font-family: Calibri, Arial, sans-serif; line-height: 1.4; margin: 2em; }
table { border-collapse: collapse; margin: 1em 0; }
td, th { border: 1px solid #999; padding: 4px 8px; vertical-align: top; }
h1.title { font-size: 2.2em; }
";

/// Renders the body as a standalone HTML page. With `include_styles` the
/// page carries a small stylesheet and inline run and alignment styles.
#[must_use]
pub fn html(doc: &WordDocument, include_styles: bool) -> String {
    let mut renderer = HtmlRenderer {
        doc,
        include_styles,
        out: String::new(),
    };
    let title = doc.core.title.as_deref().unwrap_or("Document");
    renderer.out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(renderer.out, "<title>{}</title>", escape(title));
    if include_styles {
        let _ = write!(renderer.out, "<style>\n{STYLESHEET}</style>\n");
    }
    renderer.out.push_str("</head>\n<body>\n");
    renderer.blocks(&doc.body);
    renderer.out.push_str("</body>\n</html>\n");
    renderer.out
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const fn list_tag(kind: ListKind) -> &'static str {
    match kind {
        ListKind::Bullet => "ul",
        ListKind::Numbered => "ol",
    }
}

const fn css_alignment(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
        Alignment::Justify | Alignment::Distribute => "justify",
    }
}

struct HtmlRenderer<'a> {
    doc: &'a WordDocument,
    include_styles: bool,
    out: String,
}

impl HtmlRenderer<'_> {
    fn blocks(&mut self, blocks: &[Block]) {
        let mut lists: Vec<ListKind> = Vec::new();
        for block in blocks {
            match block {
                Block::Paragraph(paragraph) => {
                    if let Some((kind, level)) = list_membership(self.doc, paragraph) {
                        self.enter_list(&mut lists, kind, usize::from(level) + 1);
                        self.out.push_str("<li>");
                        self.inlines(paragraph);
                        self.out.push_str("</li>\n");
                    } else {
                        self.close_lists(&mut lists, 0);
                        self.paragraph(paragraph);
                    }
                }
                Block::Table(table) => {
                    self.close_lists(&mut lists, 0);
                    self.table(table);
                }
            }
        }
        self.close_lists(&mut lists, 0);
    }

    fn enter_list(&mut self, lists: &mut Vec<ListKind>, kind: ListKind, depth: usize) {
        self.close_lists(lists, depth);
        if lists.len() == depth && lists.last() != Some(&kind) {
            self.close_lists(lists, depth - 1);
        }
        while lists.len() < depth {
            lists.push(kind);
            let _ = writeln!(self.out, "<{}>", list_tag(kind));
        }
    }

    fn close_lists(&mut self, lists: &mut Vec<ListKind>, depth: usize) {
        while lists.len() > depth {
            if let Some(kind) = lists.pop() {
                let _ = writeln!(self.out, "</{}>", list_tag(kind));
            }
        }
    }

    fn paragraph(&mut self, paragraph: &Paragraph) {
        let level = self.doc.heading_level(paragraph);
        let tag = match level {
            Some(level) => format!("h{}", level.clamp(1, 6)),
            None => "p".to_string(),
        };
        self.out.push('<');
        self.out.push_str(&tag);
        if level == Some(0) {
            self.out.push_str(" class=\"title\"");
        }
        if self.include_styles
            && let Some(alignment) = paragraph.format.alignment
        {
            let _ = write!(self.out, " style=\"text-align: {}\"", css_alignment(alignment));
        }
        self.out.push('>');
        self.inlines(paragraph);
        let _ = writeln!(self.out, "</{tag}>");
    }

    fn inlines(&mut self, paragraph: &Paragraph) {
        for inline in &paragraph.inlines {
            match inline {
                Inline::Run(run) => self.run(run),
                Inline::Hyperlink(link) => {
                    let href = link
                        .rel_id
                        .as_deref()
                        .and_then(|rel_id| self.doc.relationship(rel_id))
                        .map(|rel| rel.target.clone())
                        .or_else(|| link.anchor.as_ref().map(|anchor| format!("#{anchor}")));
                    match href {
                        Some(href) => {
                            let _ = write!(self.out, "<a href=\"{}\">", escape(&href));
                        }
                        None => self.out.push_str("<a>"),
                    }
                    for run in &link.runs {
                        self.run(run);
                    }
                    self.out.push_str("</a>");
                }
                Inline::Field(field) => {
                    for run in &field.runs {
                        self.run(run);
                    }
                }
                Inline::BookmarkStart { name, .. } if !name.starts_with('_') => {
                    let _ = write!(self.out, "<a id=\"{}\"></a>", escape(name));
                }
                _ => {}
            }
        }
    }

    fn run(&mut self, run: &Run) {
        let mut content = String::new();
        for item in &run.content {
            match item {
                RunContent::Text(text) => content.push_str(&escape(text)),
                RunContent::Tab => content.push('\t'),
                RunContent::Break(BreakKind::Line | BreakKind::Page) => content.push_str("<br>"),
                RunContent::Drawing(drawing) => content.push_str(&self.image(drawing)),
                _ => {}
            }
        }
        if content.is_empty() {
            return;
        }
        let wrapped = self.wrap(&run.format, content);
        self.out.push_str(&wrapped);
    }

    fn wrap(&self, format: &RunFormat, mut content: String) -> String {
        let tags = [
            (format.vertical_align == Some(VerticalAlign::Superscript), "sup"),
            (format.vertical_align == Some(VerticalAlign::Subscript), "sub"),
            (format.strike == Some(true), "s"),
            (format.is_underlined(), "u"),
            (format.italic == Some(true), "em"),
            (format.bold == Some(true), "strong"),
        ];
        for (enabled, tag) in tags {
            if enabled {
                content = format!("<{tag}>{content}</{tag}>");
            }
        }
        if self.include_styles {
            let mut css = Vec::new();
            if let Some(font) = &format.font {
                css.push(format!("font-family: '{}'", escape(font)));
            }
            if let Some(size) = format.size {
                css.push(format!("font-size: {}pt", f64::from(size) / 2.0));
            }
            if let Some(color) = &format.color {
                css.push(format!("color: #{}", escape(color)));
            }
            if let Some(highlight) = &format.highlight {
                css.push(format!("background-color: {}", escape(highlight)));
            }
            if !css.is_empty() {
                content = format!("<span style=\"{}\">{content}</span>", css.join("; "));
            }
        }
        content
    }

    #[allow(clippy::cast_possible_truncation)]
    fn image(&self, drawing: &Drawing) -> String {
        let width = (emu_to_inches(drawing.width_emu) * 96.0).round() as i64;
        let height = (emu_to_inches(drawing.height_emu) * 96.0).round() as i64;
        let alt = escape(drawing.description.as_deref().unwrap_or(&drawing.name));
        match image_part(self.doc, &drawing.rel_id) {
            Some((_, part)) => format!(
                "<img src=\"data:{};base64,{}\" alt=\"{alt}\" width=\"{width}\" height=\"{height}\">",
                part.content_type.as_deref().unwrap_or("application/octet-stream"),
                STANDARD.encode(&part.data)
            ),
            None => format!("<img alt=\"{alt}\" width=\"{width}\" height=\"{height}\">"),
        }
    }

    fn table(&mut self, table: &Table) {
        self.out.push_str("<table>\n");
        for (row_index, row) in table.rows.iter().enumerate() {
            self.out.push_str("<tr>");
            let tag = if row.header { "th" } else { "td" };
            for (cell_index, cell) in row.cells.iter().enumerate() {
                if cell.v_merge == Some(VMerge::Continue) {
                    continue;
                }
                let _ = write!(self.out, "<{tag}");
                if cell.grid_span > 1 {
                    let _ = write!(self.out, " colspan=\"{}\"", cell.grid_span);
                }
                let rows = rowspan(table, row_index, row.column_of_cell(cell_index));
                if rows > 1 {
                    let _ = write!(self.out, " rowspan=\"{rows}\"");
                }
                self.out.push('>');
                let mut first = true;
                for block in &cell.blocks {
                    match block {
                        Block::Paragraph(paragraph) => {
                            if !first {
                                self.out.push_str("<br>");
                            }
                            self.inlines(paragraph);
                        }
                        Block::Table(nested) => self.table(nested),
                    }
                    first = false;
                }
                let _ = write!(self.out, "</{tag}>");
            }
            self.out.push_str("</tr>\n");
        }
        self.out.push_str("</table>\n");
    }
}

/// Rows covered by a vertically merged cell starting at `row`.
fn rowspan(table: &Table, row: usize, col: usize) -> usize {
    let continued = table
        .rows
        .iter()
        .skip(row + 1)
        .take_while(|next| {
            next.cell_index_for_column(col)
                .filter(|index| next.column_of_cell(*index) == col)
                .and_then(|index| next.cells.get(index))
                .is_some_and(|cell| cell.v_merge == Some(VMerge::Continue))
        })
        .count();
    continued + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{CellRange, TextFormat};

    #[test]
    fn headings_lists_and_escaping() {
        let mut doc = WordDocument::new();
        doc.add_heading("Intro", 1).unwrap();
        doc.add_paragraph("a < b & c", None, None).unwrap();
        doc.create_list(&["one".to_string(), "two".to_string()], ListKind::Bullet, None)
            .unwrap();
        doc.add_list_item("nested", ListKind::Bullet, 1).unwrap();
        doc.add_paragraph("after", None, None).unwrap();
        let out = html(&doc, false);
        assert!(out.contains("<h1>Intro</h1>"));
        assert!(out.contains("<p>a &lt; b &amp; c</p>"));
        assert!(out.contains("<ul>\n<li>one</li>\n<li>two</li>\n<ul>\n<li>nested</li>\n</ul>\n</ul>\n<p>after</p>"));
        assert!(!out.contains("<style>"));
    }

    #[test]
    fn run_formatting_and_styles() {
        let mut doc = WordDocument::new();
        doc.add_paragraph("plain ", None, Some(Alignment::Center)).unwrap();
        doc.add_run(
            0,
            "loud",
            &TextFormat {
                bold: Some(true),
                italic: Some(true),
                color: Some("FF0000".to_string()),
                ..TextFormat::default()
            },
        )
        .unwrap();
        assert!(html(&doc, false).contains("<p>plain <strong><em>loud</em></strong></p>"));
        let styled = html(&doc, true);
        assert!(styled.contains("<style>"));
        assert!(styled.contains("style=\"text-align: center\""));
        assert!(styled.contains("<span style=\"color: #FF0000\"><strong><em>loud</em></strong></span>"));
    }

    #[test]
    fn tables_with_spans() {
        let mut doc = WordDocument::new();
        let data = vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["c".to_string(), "d".to_string()],
        ];
        doc.add_table(2, 2, None, Some(&data), None).unwrap();
        doc.merge_cells(
            0,
            CellRange {
                start_row: 0,
                start_col: 0,
                end_row: 1,
                end_col: 0,
            },
        )
        .unwrap();
        let out = html(&doc, false);
        assert!(out.contains("<td rowspan=\"2\">"));
        assert_eq!(out.matches("<td").count(), 3);
    }

    #[test]
    fn hyperlinks_point_at_targets() {
        let mut doc = WordDocument::new();
        doc.add_paragraph("see ", None, None).unwrap();
        doc.add_hyperlink(0, "docs", "https://example.com/?a=1&b=2").unwrap();
        assert!(html(&doc, false).contains("<a href=\"https://example.com/?a=1&amp;b=2\">docs</a>"));
    }
}
