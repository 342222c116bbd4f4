use serde::{Deserialize, Serialize};

use super::{DocumentError, DocumentResult};
use crate::document::{
    Block,
    Drawing,
    EMU_PER_PIXEL,
    PackagePart,
    Paragraph,
    Run,
    RunContent,
    RunFormat,
    WordDocument,
    emu_to_inches,
    inches_to_emu,
    package,
};

pub const MAX_IMAGE_DIMENSION: u32 = 10_000;
/// Widest default rendering, in inches.
pub const MAX_DEFAULT_WIDTH: f64 = 6.0;
const PIXELS_PER_INCH: f64 = 96.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
}

impl ImageFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
        }
    }

    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
        }
    }

    /// Detects the format from magic bytes.
    #[must_use]
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if data.starts_with(&[0xFF, 0xD8]) {
            Some(Self::Jpeg)
        } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if data.starts_with(b"BM") {
            Some(Self::Bmp)
        } else {
            None
        }
    }

    /// Pixel dimensions read from the image header.
    #[must_use]
    pub fn dimensions(self, data: &[u8]) -> Option<(u32, u32)> {
        match self {
            Self::Png => Some((be_u32(data, 16)?, be_u32(data, 20)?)),
            Self::Gif => Some((u32::from(le_u16(data, 6)?), u32::from(le_u16(data, 8)?))),
            Self::Bmp => {
                let width = le_i32(data, 18)?;
                let height = le_i32(data, 22)?;
                Some((width.unsigned_abs(), height.unsigned_abs()))
            }
            Self::Jpeg => jpeg_dimensions(data),
        }
    }
}

fn be_u16(data: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_be_bytes(data.get(at..at + 2)?.try_into().ok()?))
}

fn be_u32(data: &[u8], at: usize) -> Option<u32> {
    Some(u32::from_be_bytes(data.get(at..at + 4)?.try_into().ok()?))
}

fn le_u16(data: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_le_bytes(data.get(at..at + 2)?.try_into().ok()?))
}

fn le_i32(data: &[u8], at: usize) -> Option<i32> {
    Some(i32::from_le_bytes(data.get(at..at + 4)?.try_into().ok()?))
}

fn jpeg_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let mut pos = 2;
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }
        let marker = data[pos + 1];
        match marker {
            0xFF => pos += 1,
            0x01 | 0xD0..=0xD9 => pos += 2,
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                let height = be_u16(data, pos + 5)?;
                let width = be_u16(data, pos + 7)?;
                return Some((u32::from(width), u32::from(height)));
            }
            _ => pos += 2 + usize::from(be_u16(data, pos + 2)?),
        }
    }
    None
}

/// Placement and size of a new image. Sizes are in inches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageInsert {
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    /// Paragraph to append the picture to; a new paragraph when absent.
    #[serde(default)]
    pub paragraph_index: Option<usize>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageInfo {
    pub index: usize,
    /// Top-level paragraph holding the image; `None` inside tables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph_index: Option<usize>,
    pub rel_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub size_bytes: usize,
    pub width: f64,
    pub height: f64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn check_size(label: &str, value: Option<f64>) -> DocumentResult<()> {
    if value.is_some_and(|inches| !inches.is_finite() || inches <= 0.0) {
        return Err(DocumentError::invalid(format!("Image {label} must be positive")));
    }
    Ok(())
}

fn located_drawings(blocks: &[Block]) -> Vec<(Option<usize>, &Drawing)> {
    let mut out = Vec::new();
    let mut paragraph_index = 0;
    for block in blocks {
        match block {
            Block::Paragraph(paragraph) => {
                out.extend(paragraph.drawings().map(|drawing| (Some(paragraph_index), drawing)));
                paragraph_index += 1;
            }
            Block::Table(table) => {
                for row in &table.rows {
                    for cell in &row.cells {
                        out.extend(
                            located_drawings(&cell.blocks)
                                .into_iter()
                                .map(|(_, drawing)| (None, drawing)),
                        );
                    }
                }
            }
        }
    }
    out
}

impl WordDocument {
    fn image_part_name(&self, rel_id: &str) -> Option<String> {
        self.relationship(rel_id)
            .filter(|rel| !rel.external)
            .map(|rel| package::resolve_target("word", &rel.target))
    }

    fn describe_image(&self, index: usize, paragraph_index: Option<usize>, drawing: &Drawing) -> ImageInfo {
        let part_name = self.image_part_name(&drawing.rel_id);
        let part = part_name.as_deref().and_then(|name| self.parts.get(name));
        ImageInfo {
            index,
            paragraph_index,
            rel_id: drawing.rel_id.clone(),
            content_type: part.and_then(|part| part.content_type.clone()),
            size_bytes: part.map_or(0, |part| part.data.len()),
            part_name,
            width: emu_to_inches(drawing.width_emu),
            height: emu_to_inches(drawing.height_emu),
            name: drawing.name.clone(),
            description: drawing.description.clone(),
        }
    }

    /// Inline images in body order, including table cells.
    #[must_use]
    pub fn images(&self) -> Vec<ImageInfo> {
        located_drawings(&self.body)
            .into_iter()
            .enumerate()
            .map(|(index, (paragraph_index, drawing))| self.describe_image(index, paragraph_index, drawing))
            .collect()
    }

    #[must_use]
    pub fn image_count(&self) -> usize {
        located_drawings(&self.body).len()
    }

    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` for an unknown image.
    pub fn image(&self, index: usize) -> DocumentResult<ImageInfo> {
        let drawings = located_drawings(&self.body);
        let (paragraph_index, drawing) = drawings
            .get(index)
            .ok_or_else(|| DocumentError::out_of_range("Image", index, drawings.len()))?;
        Ok(self.describe_image(index, *paragraph_index, drawing))
    }

    /// Raw bytes and content type of an image.
    ///
    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` or `DocumentError::NotFound`
    /// when the media part is missing.
    pub fn image_data(&self, index: usize) -> DocumentResult<(Vec<u8>, Option<String>)> {
        let info = self.image(index)?;
        let part = info
            .part_name
            .as_deref()
            .and_then(|name| self.parts.get(name))
            .ok_or_else(|| DocumentError::NotFound(format!("Image part for {} not found", info.rel_id)))?;
        Ok((part.data.clone(), part.content_type.clone()))
    }

    /// Embeds an image and places it inline. A missing dimension keeps the
    /// aspect ratio; with neither given the image renders at 96 DPI, capped
    /// at six inches wide. Returns the image index.
    ///
    /// # Errors
    /// Returns `DocumentError::InvalidArgument` for unsupported or oversized
    /// images and non-positive sizes.
    #[allow(clippy::cast_precision_loss)]
    pub fn insert_image(&mut self, data: &[u8], options: &ImageInsert) -> DocumentResult<usize> {
        check_size("width", options.width)?;
        check_size("height", options.height)?;
        let format = ImageFormat::sniff(data).ok_or_else(|| {
            DocumentError::invalid("Unsupported image format. Supported formats: png, jpeg, gif, bmp")
        })?;
        let (px_width, px_height) = format
            .dimensions(data)
            .filter(|(width, height)| *width > 0 && *height > 0)
            .ok_or_else(|| DocumentError::invalid("Invalid image data: cannot read dimensions"))?;
        if px_width > MAX_IMAGE_DIMENSION || px_height > MAX_IMAGE_DIMENSION {
            return Err(DocumentError::invalid(format!(
                "Image dimensions exceed maximum ({MAX_IMAGE_DIMENSION}px)"
            )));
        }
        if let Some(index) = options.paragraph_index {
            self.paragraph(index)?;
        }

        let ratio = f64::from(px_height) / f64::from(px_width);
        let (width_emu, height_emu) = match (options.width, options.height) {
            (Some(width), Some(height)) => (inches_to_emu(width), inches_to_emu(height)),
            (Some(width), None) => (inches_to_emu(width), inches_to_emu(width * ratio)),
            (None, Some(height)) => (inches_to_emu(height / ratio), inches_to_emu(height)),
            (None, None) => {
                let natural = f64::from(px_width) / PIXELS_PER_INCH;
                if natural > MAX_DEFAULT_WIDTH {
                    (inches_to_emu(MAX_DEFAULT_WIDTH), inches_to_emu(MAX_DEFAULT_WIDTH * ratio))
                } else {
                    (
                        u64::from(px_width) * EMU_PER_PIXEL,
                        u64::from(px_height) * EMU_PER_PIXEL,
                    )
                }
            }
        };

        let part_name = self.unused_part_name("word/media", "image", format.extension());
        let rel_id = self.add_relationship(package::REL_IMAGE, &package::word_relative(&part_name), false);
        self.parts.insert(
            part_name,
            PackagePart {
                content_type: Some(format.content_type().to_string()),
                data: data.to_vec(),
            },
        );
        let id = self.next_drawing_id();
        let drawing = Drawing {
            rel_id,
            width_emu,
            height_emu,
            id,
            name: format!("Picture {id}"),
            description: options.description.clone(),
        };
        let run = Run {
            format: RunFormat::default(),
            content: vec![RunContent::Drawing(drawing)],
        };
        match options.paragraph_index {
            Some(index) => self.paragraph_mut(index)?.push_run(run),
            None => {
                let mut paragraph = Paragraph::default();
                paragraph.push_run(run);
                self.body.push(Block::Paragraph(paragraph));
            }
        }
        located_drawings(&self.body)
            .iter()
            .position(|(_, drawing)| drawing.id == id)
            .ok_or_else(|| DocumentError::NotFound("Inserted image not found".to_string()))
    }

    /// Visits the `index`-th drawing mutably. Returns false when absent.
    fn with_drawing_mut(&mut self, index: usize, apply: impl FnOnce(&mut Vec<RunContent>, usize)) -> bool {
        let mut seen = 0;
        let mut apply = Some(apply);
        self.for_each_paragraph_mut(&mut |paragraph: &mut Paragraph| {
            for run in paragraph.runs_mut() {
                for position in 0..run.content.len() {
                    if !matches!(run.content[position], RunContent::Drawing(_)) {
                        continue;
                    }
                    if seen == index
                        && let Some(apply) = apply.take()
                    {
                        apply(&mut run.content, position);
                        seen += 1;
                        return;
                    }
                    seen += 1;
                }
            }
        });
        apply.is_none()
    }

    /// Resizes an image. A single dimension keeps the aspect ratio.
    ///
    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` or `DocumentError::InvalidArgument`.
    #[allow(clippy::cast_precision_loss)]
    pub fn resize_image(&mut self, index: usize, width: Option<f64>, height: Option<f64>) -> DocumentResult<ImageInfo> {
        check_size("width", width)?;
        check_size("height", height)?;
        if width.is_none() && height.is_none() {
            return Err(DocumentError::invalid("Provide a width, a height or both"));
        }
        let count = self.image_count();
        let found = self.with_drawing_mut(index, |content, position| {
            if let RunContent::Drawing(drawing) = &mut content[position] {
                let ratio = if drawing.width_emu == 0 {
                    1.0
                } else {
                    drawing.height_emu as f64 / drawing.width_emu as f64
                };
                let (w, h) = match (width, height) {
                    (Some(w), Some(h)) => (w, h),
                    (Some(w), None) => (w, w * ratio),
                    (None, Some(h)) => (h / ratio.max(f64::EPSILON), h),
                    (None, None) => return,
                };
                drawing.width_emu = inches_to_emu(w);
                drawing.height_emu = inches_to_emu(h);
            }
        });
        if !found {
            return Err(DocumentError::out_of_range("Image", index, count));
        }
        self.image(index)
    }

    /// Removes an image. The media part and relationship go when nothing
    /// else references them.
    ///
    /// # Errors
    /// Returns `DocumentError::IndexOutOfRange` for an unknown image.
    pub fn delete_image(&mut self, index: usize) -> DocumentResult<()> {
        let info = self.image(index)?;
        self.with_drawing_mut(index, |content, position| {
            content.remove(position);
        });
        let still_used = located_drawings(&self.body)
            .iter()
            .any(|(_, drawing)| drawing.rel_id == info.rel_id);
        if !still_used {
            self.remove_relationship(&info.rel_id);
            if let Some(part_name) = info.part_name {
                self.parts.remove(&part_name);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal PNG header with the given pixel size.
    pub(crate) fn png(width: u32, height: u32) -> Vec<u8> {
        let mut data = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".to_vec();
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&[8, 2, 0, 0, 0]);
        data
    }

    #[test]
    fn sniffs_headers() {
        assert_eq!(ImageFormat::sniff(&png(10, 20)), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::Png.dimensions(&png(10, 20)), Some((10, 20)));
        let gif = b"GIF89a\x20\x00\x10\x00".to_vec();
        assert_eq!(ImageFormat::Gif.dimensions(&gif), Some((32, 16)));
        let jpeg = vec![
            0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00, 0xFF, 0xC0, 0x00, 0x11, 0x08, 0x00, 0x30,
            0x00, 0x40,
        ];
        assert_eq!(ImageFormat::sniff(&jpeg), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::Jpeg.dimensions(&jpeg), Some((64, 48)));
        assert_eq!(ImageFormat::sniff(b"hello"), None);
    }

    #[test]
    fn insert_defaults_to_96_dpi() {
        let mut doc = WordDocument::new();
        let index = doc.insert_image(&png(192, 96), &ImageInsert::default()).unwrap();
        let info = doc.image(index).unwrap();
        assert!((info.width - 2.0).abs() < 1e-6);
        assert!((info.height - 1.0).abs() < 1e-6);
        assert_eq!(info.content_type.as_deref(), Some("image/png"));
        assert_eq!(info.part_name.as_deref(), Some("word/media/image1.png"));
        assert_eq!(info.paragraph_index, Some(0));
    }

    #[test]
    fn wide_images_are_capped_and_ratio_kept() {
        let mut doc = WordDocument::new();
        doc.insert_image(&png(1920, 960), &ImageInsert::default()).unwrap();
        let info = doc.image(0).unwrap();
        assert!((info.width - 6.0).abs() < 1e-6);
        assert!((info.height - 3.0).abs() < 1e-6);
        let resized = doc.resize_image(0, None, Some(1.5)).unwrap();
        assert!((resized.width - 3.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_bad_input() {
        let mut doc = WordDocument::new();
        assert!(doc.insert_image(b"not an image", &ImageInsert::default()).is_err());
        assert!(doc.insert_image(&png(20_000, 10), &ImageInsert::default()).is_err());
        let options = ImageInsert {
            paragraph_index: Some(3),
            ..ImageInsert::default()
        };
        assert!(doc.insert_image(&png(10, 10), &options).is_err());
        assert!(doc.image(0).is_err());
    }

    #[test]
    fn delete_drops_unreferenced_part() {
        let mut doc = WordDocument::new();
        doc.add_paragraph("caption", None, None).unwrap();
        let options = ImageInsert {
            paragraph_index: Some(0),
            width: Some(1.0),
            ..ImageInsert::default()
        };
        doc.insert_image(&png(10, 10), &options).unwrap();
        assert_eq!(doc.image_count(), 1);
        doc.delete_image(0).unwrap();
        assert_eq!(doc.image_count(), 0);
        assert!(doc.parts.is_empty());
        assert_eq!(doc.paragraph(0).unwrap().text(), "caption");
    }
}
