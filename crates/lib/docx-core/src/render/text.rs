use crate::document::WordDocument;

/// Plain text: one line per paragraph, table rows as tab-separated lines.
#[must_use]
pub fn text(doc: &WordDocument) -> String {
    doc.all_text()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_become_tab_separated_rows() {
        let mut doc = WordDocument::new();
        doc.add_paragraph("intro", None, None).unwrap();
        let data = vec![
            vec!["a".to_string(), "b".to_string()],
            vec!["c".to_string(), "d".to_string()],
        ];
        doc.add_table(2, 2, None, Some(&data), None).unwrap();
        assert_eq!(text(&doc), "intro\na\tb\nc\td");
    }
}
