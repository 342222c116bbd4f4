use serde::{Deserialize, Serialize};

use super::{DocumentError, DocumentResult, TextFormat};
use crate::document::{
    Alignment,
    Block,
    StyleDefinition,
    StyleType,
    WordDocument,
    styles::builtin_styles,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StyleInfo {
    pub style_id: String,
    pub name: String,
    pub style_type: StyleType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub based_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    pub builtin: bool,
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
}

impl From<&StyleDefinition> for StyleInfo {
    fn from(style: &StyleDefinition) -> Self {
        Self {
            style_id: style.style_id.clone(),
            name: style.name.clone(),
            style_type: style.style_type,
            based_on: style.based_on.clone(),
            next: style.next.clone(),
            builtin: !style.custom,
            is_default: style.is_default,
            heading_level: style.heading_level(),
            font_name: style.run.font.clone(),
            font_size: style.run.size.map(|half| f64::from(half) / 2.0),
            bold: style.run.bold,
            italic: style.run.italic,
            color: style.run.color.clone(),
            alignment: style.paragraph.alignment,
        }
    }
}

/// Definition of a custom style, or changes to an existing one. For updates
/// an empty `name` keeps the current name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub style_type: Option<StyleType>,
    #[serde(default)]
    pub based_on: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub format: TextFormat,
    #[serde(default)]
    pub alignment: Option<Alignment>,
    /// Points.
    #[serde(default)]
    pub space_before: Option<f64>,
    /// Points.
    #[serde(default)]
    pub space_after: Option<f64>,
}

impl StyleSpec {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn apply_to(&self, style: &mut StyleDefinition) -> DocumentResult<()> {
        let run = self.format.to_run_format()?;
        style.run.merge(&run);
        if let Some(alignment) = self.alignment {
            style.paragraph.alignment = Some(alignment);
        }
        for (target, points) in [
            (&mut style.paragraph.spacing.before, self.space_before),
            (&mut style.paragraph.spacing.after, self.space_after),
        ] {
            if let Some(points) = points {
                if !points.is_finite() || points < 0.0 {
                    return Err(DocumentError::invalid("Spacing must be a non-negative number"));
                }
                *target = Some((points * 20.0).round() as u32);
            }
        }
        Ok(())
    }
}

fn style_not_found(name: &str) -> DocumentError {
    DocumentError::NotFound(format!("Style not found: {name}"))
}

impl WordDocument {
    /// Styles, optionally filtered by type.
    #[must_use]
    pub fn styles_list(&self, style_type: Option<StyleType>) -> Vec<StyleInfo> {
        self.styles
            .definitions
            .iter()
            .filter(|style| style_type.is_none_or(|wanted| style.style_type == wanted))
            .map(StyleInfo::from)
            .collect()
    }

    /// # Errors
    /// Returns `DocumentError::NotFound` for an unknown style.
    pub fn style_info(&self, name: &str) -> DocumentResult<StyleInfo> {
        self.styles
            .find(name)
            .map(StyleInfo::from)
            .ok_or_else(|| style_not_found(name))
    }

    /// # Errors
    /// Returns `DocumentError::AlreadyExists` when the name or id is taken and
    /// `DocumentError::NotFound` for an unknown `based_on` style.
    pub fn create_style(&mut self, spec: &StyleSpec) -> DocumentResult<StyleInfo> {
        let name = spec.name.trim();
        if name.is_empty() {
            return Err(DocumentError::invalid("Style name cannot be empty"));
        }
        if self.styles.find(name).is_some() {
            return Err(DocumentError::AlreadyExists(format!("Style already exists: {name}")));
        }
        let style_type = spec.style_type.unwrap_or(StyleType::Paragraph);
        let based_on = match spec.based_on.as_deref() {
            Some(parent) => Some(self.lookup_style_id(parent)?),
            None if style_type == StyleType::Paragraph => Some("Normal".to_string()),
            None => None,
        };
        let next = spec
            .next
            .as_deref()
            .map(|next| self.lookup_style_id(next))
            .transpose()?;
        let style_id = self.styles.id_for_name(name);
        let mut style = StyleDefinition::new(&style_id, name, style_type);
        style.custom = true;
        style.quick_format = true;
        style.based_on = based_on;
        style.next = next;
        spec.apply_to(&mut style)?;
        let info = StyleInfo::from(&style);
        self.styles.definitions.push(style);
        Ok(info)
    }

    /// # Errors
    /// Returns `DocumentError::NotFound` for an unknown style or parent, and
    /// `DocumentError::AlreadyExists` when renaming onto a taken name.
    pub fn update_style(&mut self, name: &str, spec: &StyleSpec) -> DocumentResult<StyleInfo> {
        let index = self.styles.position(name).ok_or_else(|| style_not_found(name))?;
        let based_on = spec
            .based_on
            .as_deref()
            .map(|parent| self.lookup_style_id(parent))
            .transpose()?;
        let next = spec
            .next
            .as_deref()
            .map(|next| self.lookup_style_id(next))
            .transpose()?;
        let rename = spec.name.trim();
        if !rename.is_empty()
            && self
                .styles
                .position(rename)
                .is_some_and(|existing| existing != index)
        {
            return Err(DocumentError::AlreadyExists(format!("Style already exists: {rename}")));
        }
        let style = &mut self.styles.definitions[index];
        if based_on.as_deref() == Some(style.style_id.as_str()) {
            return Err(DocumentError::invalid("A style cannot be based on itself"));
        }
        let mut updated = style.clone();
        if !rename.is_empty() {
            updated.name = rename.to_string();
        }
        if based_on.is_some() {
            updated.based_on = based_on;
        }
        if next.is_some() {
            updated.next = next;
        }
        spec.apply_to(&mut updated)?;
        *style = updated;
        Ok(StyleInfo::from(&*style))
    }

    /// Deletes a custom style. Paragraphs and runs using it fall back to the
    /// defaults; styles based on it inherit its parent. Returns the number of
    /// paragraphs that were reset.
    ///
    /// # Errors
    /// Returns `DocumentError::NotFound` or `DocumentError::InvalidArgument`
    /// for built-in styles.
    pub fn delete_style(&mut self, name: &str) -> DocumentResult<usize> {
        let index = self.styles.position(name).ok_or_else(|| style_not_found(name))?;
        if !self.styles.definitions[index].custom {
            return Err(DocumentError::invalid("Cannot delete built-in style"));
        }
        let removed = self.styles.definitions.remove(index);
        for style in &mut self.styles.definitions {
            if style.based_on.as_deref() == Some(removed.style_id.as_str()) {
                style.based_on.clone_from(&removed.based_on);
            }
            if style.next.as_deref() == Some(removed.style_id.as_str()) {
                style.next = None;
            }
        }
        let mut reset = 0;
        let style_id = removed.style_id;
        self.for_each_paragraph_mut(&mut |paragraph: &mut crate::document::Paragraph| {
            if paragraph.format.style.as_deref() == Some(style_id.as_str()) {
                paragraph.format.style = None;
                reset += 1;
            }
            for run in paragraph.runs_mut() {
                if run.format.style.as_deref() == Some(style_id.as_str()) {
                    run.format.style = None;
                }
            }
        });
        for table in self.body.iter_mut().filter_map(|block| match block {
            Block::Table(table) => Some(table),
            Block::Paragraph(_) => None,
        }) {
            if table.style.as_deref() == Some(style_id.as_str()) {
                table.style = None;
            }
        }
        Ok(reset)
    }

    /// Applies a paragraph style to a paragraph, or a character style to all
    /// of its runs.
    ///
    /// # Errors
    /// Returns `DocumentError::NotFound` for an unknown style and
    /// `DocumentError::InvalidArgument` for table or numbering styles.
    pub fn apply_style(&mut self, index: usize, name: &str) -> DocumentResult<()> {
        self.paragraph(index)?;
        let style_id = self.resolve_style(name)?;
        let style_type = self
            .styles
            .find(&style_id)
            .map_or(StyleType::Paragraph, |style| style.style_type);
        let paragraph = self.paragraph_mut(index)?;
        match style_type {
            StyleType::Paragraph => paragraph.format.style = Some(style_id),
            StyleType::Character => {
                for run in paragraph.runs_mut() {
                    run.format.style = Some(style_id.clone());
                }
            }
            StyleType::Table | StyleType::Numbering => {
                return Err(DocumentError::invalid(format!(
                    "Style {name} cannot be applied to a paragraph"
                )));
            }
        }
        Ok(())
    }

    /// Style of a paragraph, or the default paragraph style when none is set.
    ///
    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` for an unknown paragraph.
    pub fn paragraph_style(&self, index: usize) -> DocumentResult<Option<StyleInfo>> {
        let paragraph = self.paragraph(index)?;
        let style = match paragraph.format.style.as_deref() {
            Some(id) => self.styles.find(id),
            None => self.styles.default_for(StyleType::Paragraph),
        };
        Ok(style.map(StyleInfo::from))
    }

    fn lookup_style_id(&self, name: &str) -> DocumentResult<String> {
        self.styles
            .find(name)
            .map(|style| style.style_id.clone())
            .ok_or_else(|| style_not_found(name))
    }

    /// Resolves a style name or id, adding the built-in definition when the
    /// document lacks it.
    pub(crate) fn resolve_style(&mut self, name: &str) -> DocumentResult<String> {
        if let Ok(id) = self.lookup_style_id(name) {
            return Ok(id);
        }
        let builtin = builtin_styles();
        let style = builtin.find(name).ok_or_else(|| style_not_found(name))?;
        let id = style.style_id.clone();
        self.styles.definitions.push(style.clone());
        Ok(id)
    }

    pub(crate) fn resolve_paragraph_style(&mut self, name: &str) -> DocumentResult<String> {
        let id = self.resolve_style(name)?;
        match self.styles.find(&id).map(|style| style.style_type) {
            Some(StyleType::Paragraph) | None => Ok(id),
            Some(_) => Err(DocumentError::invalid(format!("{name} is not a paragraph style"))),
        }
    }

    /// Adds a built-in style definition when the document does not have it.
    pub(crate) fn ensure_builtin_style(&mut self, style_id: &str) {
        if self.styles.find(style_id).is_some() {
            return;
        }
        if let Some(style) = builtin_styles().find(style_id) {
            self.styles.definitions.push(style.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str) -> StyleSpec {
        StyleSpec {
            name: name.to_string(),
            format: TextFormat {
                bold: Some(true),
                font_size: Some(14.0),
                ..TextFormat::default()
            },
            ..StyleSpec::default()
        }
    }

    #[test]
    fn create_rejects_duplicates() {
        let mut doc = WordDocument::new();
        let info = doc.create_style(&spec("Call Out")).unwrap();
        assert_eq!(info.style_id, "CallOut");
        assert_eq!(info.font_size, Some(14.0));
        assert!(!info.builtin);
        let err = doc.create_style(&spec("call out")).unwrap_err();
        assert!(matches!(err, DocumentError::AlreadyExists(_)));
    }

    #[test]
    fn delete_resets_paragraphs_and_protects_builtins() {
        let mut doc = WordDocument::new();
        doc.create_style(&spec("Note")).unwrap();
        doc.add_paragraph("a", Some("Note"), None).unwrap();
        assert_eq!(doc.delete_style("Note").unwrap(), 1);
        assert!(doc.paragraph(0).unwrap().format.style.is_none());
        let err = doc.delete_style("Heading1").unwrap_err();
        assert_eq!(err.to_string(), "Cannot delete built-in style");
        assert!(matches!(doc.delete_style("Nope"), Err(DocumentError::NotFound(_))));
    }

    #[test]
    fn apply_and_read_paragraph_style() {
        let mut doc = WordDocument::new();
        doc.add_paragraph("a", None, None).unwrap();
        assert_eq!(doc.paragraph_style(0).unwrap().unwrap().style_id, "Normal");
        doc.apply_style(0, "quote").unwrap();
        assert_eq!(doc.paragraph_style(0).unwrap().unwrap().style_id, "Quote");
        assert!(doc.apply_style(0, "Missing").is_err());
        assert!(doc.apply_style(0, "Table Grid").is_err());
    }

    #[test]
    fn update_changes_formatting() {
        let mut doc = WordDocument::new();
        let updated = doc
            .update_style(
                "Heading 1",
                &StyleSpec {
                    format: TextFormat {
                        color: Some("#112233".to_string()),
                        ..TextFormat::default()
                    },
                    alignment: Some(Alignment::Center),
                    ..StyleSpec::default()
                },
            )
            .unwrap();
        assert_eq!(updated.color.as_deref(), Some("112233"));
        assert_eq!(updated.alignment, Some(Alignment::Center));
        assert_eq!(doc.styles_list(Some(StyleType::Table)).len(), 2);
    }

    #[test]
    fn builtin_styles_are_restored_on_demand() {
        let mut doc = WordDocument::new();
        doc.styles.definitions.retain(|style| style.style_id != "Heading4");
        doc.add_heading("deep", 4).unwrap();
        assert!(doc.styles.find("Heading4").is_some());
    }
}
