use super::{image_part, list_membership};
use crate::document::{
    Block, BreakKind, Inline, ListKind, Paragraph, Run, RunContent, Table, WordDocument,
};

/// Renders the body as CommonMark with pipe tables.
#[must_use]
pub fn markdown(doc: &WordDocument) -> String {
    let mut chunks: Vec<String> = Vec::new();
    let mut list: Vec<String> = Vec::new();
    for block in &doc.body {
        match block {
            Block::Paragraph(paragraph) => {
                if let Some((kind, level)) = list_membership(doc, paragraph) {
                    let marker = match kind {
                        ListKind::Bullet => "-",
                        ListKind::Numbered => "1.",
                    };
                    list.push(format!(
                        "{}{marker} {}",
                        "  ".repeat(usize::from(level)),
                        inline_text(doc, paragraph)
                    ));
                    continue;
                }
                flush_list(&mut list, &mut chunks);
                let content = inline_text(doc, paragraph);
                match doc.heading_level(paragraph) {
                    Some(level) => chunks.push(format!(
                        "{} {content}",
                        "#".repeat(usize::from(level.clamp(1, 6)))
                    )),
                    None if content.trim().is_empty() => {}
                    None => chunks.push(content),
                }
            }
            Block::Table(table) => {
                flush_list(&mut list, &mut chunks);
                chunks.push(table_markdown(doc, table));
            }
        }
    }
    flush_list(&mut list, &mut chunks);
    let mut out = chunks.join("\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn flush_list(list: &mut Vec<String>, chunks: &mut Vec<String>) {
    if !list.is_empty() {
        chunks.push(list.join("\n"));
        list.clear();
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '*' | '_' | '`' | '[' | ']' | '<' | '>' | '|') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Wraps `text` in `marker`, keeping surrounding whitespace outside so the
/// emphasis still parses.
fn emphasize(text: &str, marker: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return text.to_string();
    }
    let start = text.len() - text.trim_start().len();
    let end = start + trimmed.len();
    format!("{}{marker}{trimmed}{marker}{}", &text[..start], &text[end..])
}

fn run_markdown(doc: &WordDocument, run: &Run) -> String {
    let mut text = String::new();
    let mut images = String::new();
    for item in &run.content {
        match item {
            RunContent::Text(value) => text.push_str(&escape(value)),
            RunContent::Tab => text.push('\t'),
            RunContent::Break(BreakKind::Line) => text.push_str("  \n"),
            RunContent::Break(_) => text.push('\n'),
            RunContent::Drawing(drawing) => {
                let alt = drawing.description.as_deref().unwrap_or(&drawing.name);
                let target = image_part(doc, &drawing.rel_id)
                    .map(|(part_name, _)| part_name)
                    .unwrap_or_default();
                images.push_str(&format!("![{}]({target})", escape(alt)));
            }
            _ => {}
        }
    }
    let format = &run.format;
    if format.strike == Some(true) {
        text = emphasize(&text, "~~");
    }
    match (format.bold == Some(true), format.italic == Some(true)) {
        (true, true) => text = emphasize(&text, "***"),
        (true, false) => text = emphasize(&text, "**"),
        (false, true) => text = emphasize(&text, "*"),
        (false, false) => {}
    }
    text + &images
}

fn runs_markdown(doc: &WordDocument, runs: &[Run]) -> String {
    runs.iter().map(|run| run_markdown(doc, run)).collect()
}

fn inline_text(doc: &WordDocument, paragraph: &Paragraph) -> String {
    let mut out = String::new();
    for inline in &paragraph.inlines {
        match inline {
            Inline::Run(run) => out.push_str(&run_markdown(doc, run)),
            Inline::Hyperlink(link) => {
                let label = runs_markdown(doc, &link.runs);
                let target = link
                    .rel_id
                    .as_deref()
                    .and_then(|rel_id| doc.relationship(rel_id))
                    .map(|rel| rel.target.clone())
                    .or_else(|| link.anchor.as_ref().map(|anchor| format!("#{anchor}")));
                match target {
                    Some(target) => out.push_str(&format!("[{label}]({target})")),
                    None => out.push_str(&label),
                }
            }
            Inline::Field(field) => out.push_str(&runs_markdown(doc, &field.runs)),
            _ => {}
        }
    }
    out
}

fn table_markdown(doc: &WordDocument, table: &Table) -> String {
    let columns = table.column_count().max(1);
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| {
            (0..columns)
                .map(|col| {
                    row.cell_index_for_column(col)
                        .and_then(|index| row.cells.get(index))
                        .map(|cell| {
                            cell.paragraphs()
                                .map(|paragraph| inline_text(doc, paragraph))
                                .collect::<Vec<_>>()
                                .join("<br>")
                        })
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();
    let line = |cells: &[String]| format!("| {} |", cells.join(" | "));
    let mut lines = Vec::with_capacity(rows.len() + 1);
    let empty = vec![String::new(); columns];
    let header = rows.first().unwrap_or(&empty);
    lines.push(line(header));
    lines.push(line(&vec!["---".to_string(); columns]));
    for row in rows.iter().skip(1) {
        lines.push(line(row));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::TextFormat;

    #[test]
    fn headings_paragraphs_and_lists() {
        let mut doc = WordDocument::new();
        doc.add_heading("Guide", 0).unwrap();
        doc.add_heading("Steps", 2).unwrap();
        doc.add_paragraph("Use *care*", None, None).unwrap();
        doc.create_list(&["first".to_string()], ListKind::Numbered, None).unwrap();
        doc.add_list_item("inner", ListKind::Numbered, 1).unwrap();
        doc.create_list(&["dot".to_string()], ListKind::Bullet, None).unwrap();
        assert_eq!(
            markdown(&doc),
            "# Guide\n\n## Steps\n\nUse \\*care\\*\n\n1. first\n  1. inner\n- dot\n"
        );
    }

    #[test]
    fn emphasis_keeps_spaces_outside() {
        let mut doc = WordDocument::new();
        doc.add_paragraph("a", None, None).unwrap();
        let bold = TextFormat {
            bold: Some(true),
            ..TextFormat::default()
        };
        doc.add_run(0, " bold ", &bold).unwrap();
        doc.add_run(
            0,
            "both",
            &TextFormat {
                bold: Some(true),
                italic: Some(true),
                ..TextFormat::default()
            },
        )
        .unwrap();
        assert_eq!(markdown(&doc), "a **bold** ***both***\n");
    }

    #[test]
    fn pipe_tables_and_links() {
        let mut doc = WordDocument::new();
        let data = vec![
            vec!["Name".to_string(), "Qty".to_string()],
            vec!["a|b".to_string(), "2".to_string()],
        ];
        doc.add_table(2, 2, None, Some(&data), None).unwrap();
        doc.add_paragraph("go to ", None, None).unwrap();
        doc.add_hyperlink(0, "site", "https://example.com").unwrap();
        assert_eq!(
            markdown(&doc),
            "| Name | Qty |\n| --- | --- |\n| a\\|b | 2 |\n\ngo to [site](https://example.com)\n"
        );
    }
}
