use serde::{Deserialize, Serialize};

use super::Paragraph;

/// Core package properties (`docProps/core.xml`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

impl CoreProperties {
    /// Overlays every property set on `patch`.
    pub fn apply(&mut self, patch: &Self) {
        macro_rules! overlay {
            ($($field:ident),+) => {
                $(
                    if patch.$field.is_some() {
                        self.$field.clone_from(&patch.$field);
                    }
                )+
            };
        }
        overlay!(
            title,
            subject,
            author,
            keywords,
            comments,
            category,
            content_status,
            language,
            last_modified_by,
            revision,
            created,
            modified
        );
    }
}

/// A comment stored in `word/comments.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocComment {
    pub id: u32,
    pub author: String,
    pub initials: Option<String>,
    pub date: Option<String>,
    pub paragraphs: Vec<Paragraph>,
}

impl DocComment {
    #[must_use]
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_only_overwrites_present_fields() {
        let mut core = CoreProperties {
            title: Some("Old".to_string()),
            author: Some("Ana".to_string()),
            ..CoreProperties::default()
        };
        core.apply(&CoreProperties {
            title: Some("New".to_string()),
            revision: Some(3),
            ..CoreProperties::default()
        });
        assert_eq!(core.title.as_deref(), Some("New"));
        assert_eq!(core.author.as_deref(), Some("Ana"));
        assert_eq!(core.revision, Some(3));
    }
}
