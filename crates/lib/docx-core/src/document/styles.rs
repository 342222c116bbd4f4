use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::paragraph::{ParagraphFormat, RunFormat, Spacing};
use crate::editor::DocumentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleType {
    Paragraph,
    Character,
    Table,
    Numbering,
}

impl StyleType {
    #[must_use]
    pub const fn as_xml(self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Character => "character",
            Self::Table => "table",
            Self::Numbering => "numbering",
        }
    }
}

impl fmt::Display for StyleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_xml())
    }
}

impl FromStr for StyleType {
    type Err = DocumentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "paragraph" => Ok(Self::Paragraph),
            "character" => Ok(Self::Character),
            "table" => Ok(Self::Table),
            "numbering" | "list" => Ok(Self::Numbering),
            _ => Err(DocumentError::InvalidArgument(format!(
                "Invalid style type: {value}. Use paragraph, character, table or numbering"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleDefinition {
    pub style_id: String,
    pub name: String,
    pub style_type: StyleType,
    pub based_on: Option<String>,
    pub next: Option<String>,
    pub link: Option<String>,
    pub custom: bool,
    pub is_default: bool,
    pub ui_priority: Option<u32>,
    pub quick_format: bool,
    pub hidden: bool,
    pub paragraph: ParagraphFormat,
    pub run: RunFormat,
    /// Table border style, for table styles only.
    pub table_borders: Option<String>,
}

impl StyleDefinition {
    #[must_use]
    pub fn new(style_id: &str, name: &str, style_type: StyleType) -> Self {
        Self {
            style_id: style_id.to_string(),
            name: name.to_string(),
            style_type,
            based_on: None,
            next: None,
            link: None,
            custom: false,
            is_default: false,
            ui_priority: None,
            quick_format: false,
            hidden: false,
            paragraph: ParagraphFormat::default(),
            run: RunFormat::default(),
            table_borders: None,
        }
    }

    /// Heading level encoded by the style name or id, `0` for Title.
    #[must_use]
    pub fn heading_level(&self) -> Option<u8> {
        heading_level_from_name(&self.name).or_else(|| heading_level_from_name(&self.style_id))
    }
}

/// Parses names like `heading 2`, `Heading2` or `Title`.
#[must_use]
pub fn heading_level_from_name(name: &str) -> Option<u8> {
    let lower = name.trim().to_ascii_lowercase();
    if lower == "title" {
        return Some(0);
    }
    let rest = lower.strip_prefix("heading")?.trim();
    let level: u8 = rest.parse().ok()?;
    (1..=9).contains(&level).then_some(level)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Styles {
    pub default_run: RunFormat,
    pub default_paragraph: ParagraphFormat,
    pub definitions: Vec<StyleDefinition>,
}

impl Styles {
    /// Finds a style by id, then by name, ignoring case.
    #[must_use]
    pub fn find(&self, name_or_id: &str) -> Option<&StyleDefinition> {
        self.position(name_or_id).and_then(|index| self.definitions.get(index))
    }

    pub fn find_mut(&mut self, name_or_id: &str) -> Option<&mut StyleDefinition> {
        let index = self.position(name_or_id)?;
        self.definitions.get_mut(index)
    }

    #[must_use]
    pub fn position(&self, name_or_id: &str) -> Option<usize> {
        let needle = name_or_id.trim();
        self.definitions
            .iter()
            .position(|style| style.style_id == needle)
            .or_else(|| {
                self.definitions.iter().position(|style| {
                    style.name.eq_ignore_ascii_case(needle)
                        || style.style_id.eq_ignore_ascii_case(needle)
                })
            })
    }

    /// Default style of a type, for example `Normal` for paragraphs.
    #[must_use]
    pub fn default_for(&self, style_type: StyleType) -> Option<&StyleDefinition> {
        self.definitions
            .iter()
            .find(|style| style.style_type == style_type && style.is_default)
    }

    /// Generates a style id from a display name the way Word does: spaces
    /// and punctuation dropped.
    #[must_use]
    pub fn id_for_name(&self, name: &str) -> String {
        let base: String = name.chars().filter(|ch| ch.is_alphanumeric()).collect();
        let base = if base.is_empty() { "Style".to_string() } else { base };
        let mut candidate = base.clone();
        let mut counter = 1;
        while self.definitions.iter().any(|style| style.style_id == candidate) {
            counter += 1;
            candidate = format!("{base}{counter}");
        }
        candidate
    }
}

/// Styles present in a blank document.
#[must_use]
pub fn builtin_styles() -> Styles {
    let mut definitions = Vec::new();

    let mut normal = StyleDefinition::new("Normal", "Normal", StyleType::Paragraph);
    normal.is_default = true;
    normal.quick_format = true;
    definitions.push(normal);

    let mut default_font =
        StyleDefinition::new("DefaultParagraphFont", "Default Paragraph Font", StyleType::Character);
    default_font.is_default = true;
    default_font.ui_priority = Some(1);
    default_font.hidden = true;
    definitions.push(default_font);

    let mut table_normal = StyleDefinition::new("TableNormal", "Normal Table", StyleType::Table);
    table_normal.is_default = true;
    table_normal.hidden = true;
    definitions.push(table_normal);

    let mut title = paragraph_style("Title", "Title", 10);
    title.run.size = Some(56);
    title.paragraph.spacing.after = Some(80);
    definitions.push(title);

    let mut subtitle = paragraph_style("Subtitle", "Subtitle", 11);
    subtitle.run.size = Some(28);
    subtitle.run.color = Some("595959".to_string());
    definitions.push(subtitle);

    for level in 1..=9u8 {
        let mut heading =
            paragraph_style(&format!("Heading{level}"), &format!("heading {level}"), 9);
        heading.paragraph.keep_next = true;
        heading.paragraph.outline_level = Some(level - 1);
        heading.paragraph.spacing = Spacing {
            before: Some(if level == 1 { 360 } else { 160 }),
            after: Some(80),
            line: None,
        };
        heading.run.bold = Some(level <= 3);
        heading.run.color = Some("2F5496".to_string());
        heading.run.size = Some(match level {
            1 => 32,
            2 => 28,
            3 => 24,
            _ => 22,
        });
        definitions.push(heading);
    }

    let mut list_paragraph = paragraph_style("ListParagraph", "List Paragraph", 34);
    list_paragraph.paragraph.indent.left = Some(720);
    definitions.push(list_paragraph);

    let mut quote = paragraph_style("Quote", "Quote", 29);
    quote.run.italic = Some(true);
    quote.paragraph.alignment = Some(super::Alignment::Center);
    definitions.push(quote);

    let mut table_grid = StyleDefinition::new("TableGrid", "Table Grid", StyleType::Table);
    table_grid.based_on = Some("TableNormal".to_string());
    table_grid.ui_priority = Some(39);
    table_grid.table_borders = Some("single".to_string());
    definitions.push(table_grid);

    let mut hyperlink = StyleDefinition::new("Hyperlink", "Hyperlink", StyleType::Character);
    hyperlink.based_on = Some("DefaultParagraphFont".to_string());
    hyperlink.ui_priority = Some(99);
    hyperlink.run.color = Some("0563C1".to_string());
    hyperlink.run.underline = Some("single".to_string());
    definitions.push(hyperlink);

    let mut toc_heading = paragraph_style("TOCHeading", "TOC Heading", 39);
    toc_heading.based_on = Some("Heading1".to_string());
    toc_heading.paragraph.outline_level = None;
    definitions.push(toc_heading);

    Styles {
        default_run: RunFormat {
            font: Some("Calibri".to_string()),
            size: Some(22),
            ..RunFormat::default()
        },
        default_paragraph: ParagraphFormat {
            spacing: Spacing {
                before: None,
                after: Some(160),
                line: Some(259),
            },
            ..ParagraphFormat::default()
        },
        definitions,
    }
}

fn paragraph_style(style_id: &str, name: &str, priority: u32) -> StyleDefinition {
    let mut style = StyleDefinition::new(style_id, name, StyleType::Paragraph);
    style.based_on = Some("Normal".to_string());
    style.next = Some("Normal".to_string());
    style.ui_priority = Some(priority);
    style.quick_format = true;
    style
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_levels_from_names() {
        assert_eq!(heading_level_from_name("Heading 3"), Some(3));
        assert_eq!(heading_level_from_name("heading1"), Some(1));
        assert_eq!(heading_level_from_name("Title"), Some(0));
        assert_eq!(heading_level_from_name("Heading 10"), None);
        assert_eq!(heading_level_from_name("Normal"), None);
    }

    #[test]
    fn lookup_by_name_or_id() {
        let styles = builtin_styles();
        assert_eq!(styles.find("Heading2").map(|s| s.name.as_str()), Some("heading 2"));
        assert_eq!(styles.find("heading 2").map(|s| s.style_id.as_str()), Some("Heading2"));
        assert_eq!(styles.find("list paragraph").map(|s| s.style_id.as_str()), Some("ListParagraph"));
        assert!(styles.find("Missing").is_none());
    }

    #[test]
    fn generated_ids_are_unique() {
        let styles = builtin_styles();
        assert_eq!(styles.id_for_name("My Style"), "MyStyle");
        assert_eq!(styles.id_for_name("Heading 1"), "Heading12");
    }
}
