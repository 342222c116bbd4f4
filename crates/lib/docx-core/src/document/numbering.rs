use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::editor::DocumentError;

pub const MAX_LIST_LEVEL: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Bullet,
    Numbered,
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bullet => "bullet",
            Self::Numbered => "numbered",
        })
    }
}

impl FromStr for ListKind {
    type Err = DocumentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bullet" | "bulleted" => Ok(Self::Bullet),
            "numbered" | "number" | "ordered" => Ok(Self::Numbered),
            _ => Err(DocumentError::InvalidArgument(format!(
                "Invalid list type: {value}. Use bullet or numbered"
            ))),
        }
    }
}

/// Number formats offered for numbered lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumberFormat {
    #[serde(rename = "decimal")]
    Decimal,
    #[serde(rename = "lowerLetter")]
    LowerLetter,
    #[serde(rename = "upperLetter")]
    UpperLetter,
    #[serde(rename = "lowerRoman")]
    LowerRoman,
    #[serde(rename = "upperRoman")]
    UpperRoman,
}

impl NumberFormat {
    #[must_use]
    pub const fn as_xml(self) -> &'static str {
        match self {
            Self::Decimal => "decimal",
            Self::LowerLetter => "lowerLetter",
            Self::UpperLetter => "upperLetter",
            Self::LowerRoman => "lowerRoman",
            Self::UpperRoman => "upperRoman",
        }
    }

    #[must_use]
    pub fn from_xml(value: &str) -> Option<Self> {
        match value {
            "decimal" => Some(Self::Decimal),
            "lowerLetter" => Some(Self::LowerLetter),
            "upperLetter" => Some(Self::UpperLetter),
            "lowerRoman" => Some(Self::LowerRoman),
            "upperRoman" => Some(Self::UpperRoman),
            _ => None,
        }
    }

    /// Renders `number` in this format, for text exports.
    #[must_use]
    pub fn render(self, number: u32) -> String {
        match self {
            Self::Decimal => number.to_string(),
            Self::LowerLetter => letters(number),
            Self::UpperLetter => letters(number).to_ascii_uppercase(),
            Self::LowerRoman => roman(number),
            Self::UpperRoman => roman(number).to_ascii_uppercase(),
        }
    }
}

impl FromStr for NumberFormat {
    type Err = DocumentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::from_xml(trimmed)
            .or_else(|| match trimmed.to_ascii_lowercase().as_str() {
                "lower_letter" | "lowerletter" => Some(Self::LowerLetter),
                "upper_letter" | "upperletter" => Some(Self::UpperLetter),
                "lower_roman" | "lowerroman" => Some(Self::LowerRoman),
                "upper_roman" | "upperroman" => Some(Self::UpperRoman),
                _ => None,
            })
            .ok_or_else(|| {
                DocumentError::InvalidArgument(format!(
                    "Invalid number format: {value}. Use decimal, lowerLetter, upperLetter, lowerRoman or upperRoman"
                ))
            })
    }
}

fn letters(number: u32) -> String {
    let mut n = number.max(1);
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        let offset = u8::try_from(n % 26).unwrap_or(0);
        out.push(char::from(b'a' + offset));
        n /= 26;
    }
    out.iter().rev().collect()
}

fn roman(number: u32) -> String {
    const TABLE: [(u32, &str); 13] = [
        (1000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];
    let mut n = number.max(1);
    let mut out = String::new();
    for (value, symbol) in TABLE {
        while n >= value {
            out.push_str(symbol);
            n -= value;
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberingLevel {
    pub level: u8,
    pub start: u32,
    /// Raw `w:numFmt` value, for example `bullet` or `decimal`.
    pub format: String,
    pub text: String,
    pub indent_left: u32,
    pub hanging: u32,
    pub font: Option<String>,
}

impl NumberingLevel {
    #[must_use]
    pub fn kind(&self) -> ListKind {
        if self.format == "bullet" || self.format == "none" {
            ListKind::Bullet
        } else {
            ListKind::Numbered
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbstractNumbering {
    pub id: u32,
    pub multi_level: bool,
    pub levels: Vec<NumberingLevel>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberingInstance {
    pub num_id: u32,
    pub abstract_id: u32,
    /// Restart value applied to level 0.
    pub start_override: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Numbering {
    pub abstract_nums: Vec<AbstractNumbering>,
    pub instances: Vec<NumberingInstance>,
}

const BULLETS: [&str; 3] = ["\u{2022}", "\u{25E6}", "\u{25AA}"];
const NUMBER_CYCLE: [NumberFormat; 3] = [
    NumberFormat::Decimal,
    NumberFormat::LowerLetter,
    NumberFormat::LowerRoman,
];

impl Numbering {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty() && self.abstract_nums.is_empty()
    }

    /// Creates a nine-level list definition and an instance pointing at it.
    /// Returns the new `numId`.
    pub fn add_list(&mut self, kind: ListKind, format: Option<NumberFormat>) -> u32 {
        let abstract_id = self
            .abstract_nums
            .iter()
            .map(|entry| entry.id + 1)
            .max()
            .unwrap_or(0);
        let levels = (0..=MAX_LIST_LEVEL)
            .map(|level| {
                let slot = usize::from(level) % 3;
                let (format_value, text) = match kind {
                    ListKind::Bullet => ("bullet".to_string(), BULLETS[slot].to_string()),
                    ListKind::Numbered => {
                        let fmt = if level == 0 {
                            format.unwrap_or(NumberFormat::Decimal)
                        } else {
                            NUMBER_CYCLE[slot]
                        };
                        (fmt.as_xml().to_string(), format!("%{}.", level + 1))
                    }
                };
                NumberingLevel {
                    level,
                    start: 1,
                    format: format_value,
                    text,
                    indent_left: 720 * (u32::from(level) + 1),
                    hanging: 360,
                    font: None,
                }
            })
            .collect();
        self.abstract_nums.push(AbstractNumbering {
            id: abstract_id,
            multi_level: true,
            levels,
        });
        let num_id = self
            .instances
            .iter()
            .map(|instance| instance.num_id + 1)
            .max()
            .unwrap_or(1);
        self.instances.push(NumberingInstance {
            num_id,
            abstract_id,
            start_override: None,
        });
        num_id
    }

    #[must_use]
    pub fn level(&self, num_id: u32, level: u8) -> Option<&NumberingLevel> {
        let instance = self.instances.iter().find(|instance| instance.num_id == num_id)?;
        let definition = self
            .abstract_nums
            .iter()
            .find(|entry| entry.id == instance.abstract_id)?;
        definition
            .levels
            .iter()
            .find(|entry| entry.level == level)
            .or_else(|| definition.levels.first())
    }

    /// List kind of a numbering instance at a level. Unknown instances are
    /// reported as bullets.
    #[must_use]
    pub fn kind_of(&self, num_id: u32, level: u8) -> ListKind {
        self.level(num_id, level)
            .map_or(ListKind::Bullet, NumberingLevel::kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_list_allocates_fresh_ids() {
        let mut numbering = Numbering::default();
        let bullets = numbering.add_list(ListKind::Bullet, None);
        let numbers = numbering.add_list(ListKind::Numbered, Some(NumberFormat::UpperRoman));
        assert_eq!(bullets, 1);
        assert_eq!(numbers, 2);
        assert_eq!(numbering.kind_of(bullets, 0), ListKind::Bullet);
        assert_eq!(numbering.kind_of(numbers, 4), ListKind::Numbered);
        assert_eq!(numbering.level(numbers, 0).unwrap().format, "upperRoman");
        assert_eq!(numbering.level(numbers, 1).unwrap().format, "lowerLetter");
    }

    #[test]
    fn renders_number_formats() {
        assert_eq!(NumberFormat::LowerLetter.render(28), "ab");
        assert_eq!(NumberFormat::UpperRoman.render(14), "XIV");
        assert_eq!(NumberFormat::Decimal.render(7), "7");
    }
}
