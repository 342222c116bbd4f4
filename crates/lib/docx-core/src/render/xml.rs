use std::fmt::Write as _;

/// Minimal streaming XML writer for the package parts.
pub struct XmlWriter {
    out: String,
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlWriter {
    pub fn new() -> Self {
        Self {
            out: String::from("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n"),
        }
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) {
        self.out.push('<');
        self.out.push_str(name);
        for (key, value) in attrs {
            let _ = write!(self.out, " {key}=\"{}\"", escape(value, true));
        }
    }

    pub fn open(&mut self, name: &str, attrs: &[(&str, &str)]) {
        self.start(name, attrs);
        self.out.push('>');
    }

    pub fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) {
        self.start(name, attrs);
        self.out.push_str("/>");
    }

    pub fn close(&mut self, name: &str) {
        let _ = write!(self.out, "</{name}>");
    }

    /// `<name w:val="value"/>`.
    pub fn val(&mut self, name: &str, value: impl ToString) {
        self.empty(name, &[("w:val", &value.to_string())]);
    }

    pub fn text(&mut self, text: &str) {
        self.out.push_str(&escape(text, false));
    }

    pub fn element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) {
        self.open(name, attrs);
        self.text(text);
        self.close(name);
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// False for characters XML 1.0 cannot carry at all.
const fn is_allowed(ch: char) -> bool {
    !matches!(ch, '\u{0}'..='\u{8}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}')
}

pub fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars().filter(|ch| is_allowed(*ch)) {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\n' if attribute => out.push_str("&#10;"),
            '\t' if attribute => out.push_str("&#9;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_and_drops_control_chars() {
        assert_eq!(escape("a<b & \"c\"\u{1}", false), "a&lt;b &amp; \"c\"");
        assert_eq!(escape("say \"hi\"", true), "say &quot;hi&quot;");
    }

    #[test]
    fn writes_nested_elements() {
        let mut writer = XmlWriter::new();
        writer.open("w:p", &[]);
        writer.val("w:jc", "center");
        writer.element("w:t", &[("xml:space", "preserve")], "x & y");
        writer.close("w:p");
        let xml = writer.finish();
        assert!(xml.ends_with(
            "<w:p><w:jc w:val=\"center\"/><w:t xml:space=\"preserve\">x &amp; y</w:t></w:p>"
        ));
    }
}
