//! Package-level plumbing: relationships, passthrough parts and part names.

pub const MAIN_DOCUMENT_PART: &str = "word/document.xml";
pub const STYLES_PART: &str = "word/styles.xml";
pub const NUMBERING_PART: &str = "word/numbering.xml";
pub const COMMENTS_PART: &str = "word/comments.xml";
pub const CORE_PROPERTIES_PART: &str = "docProps/core.xml";
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const PACKAGE_RELS_PART: &str = "_rels/.rels";
pub const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";

pub const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub const REL_CORE_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
pub const REL_EXTENDED_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
pub const REL_CUSTOM_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/custom-properties";
pub const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
pub const REL_NUMBERING: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering";
pub const REL_COMMENTS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments";
pub const REL_HEADER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";
pub const REL_FOOTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";
pub const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
pub const REL_HYPERLINK: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";

pub const CT_MAIN_DOCUMENT: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
pub const CT_STYLES: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
pub const CT_NUMBERING: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml";
pub const CT_COMMENTS: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.comments+xml";
pub const CT_HEADER: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml";
pub const CT_FOOTER: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml";
pub const CT_CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
pub const CT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
pub const CT_EXTENDED_PROPERTIES: &str =
    "application/vnd.openxmlformats-officedocument.extended-properties+xml";
pub const CT_CUSTOM_PROPERTIES: &str =
    "application/vnd.openxmlformats-officedocument.custom-properties+xml";

pub const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
pub const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
pub const NS_PACKAGE_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
pub const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
pub const NS_CP: &str = "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";
pub const NS_DC: &str = "http://purl.org/dc/elements/1.1/";
pub const NS_DCTERMS: &str = "http://purl.org/dc/terms/";
pub const NS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const NS_STRICT_W: &str = "http://purl.oclc.org/ooxml/wordprocessingml/main";

/// A relationship from the main document part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

/// A package part the model does not interpret. It is written back verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePart {
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Default content type by file extension, used for media and other
/// passthrough parts that carry no override.
#[must_use]
pub fn content_type_for_extension(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "rels" => Some(CT_RELATIONSHIPS),
        "xml" => Some("application/xml"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        "tif" | "tiff" => Some("image/tiff"),
        "webp" => Some("image/webp"),
        "emf" => Some("image/x-emf"),
        "wmf" => Some("image/x-wmf"),
        "svg" => Some("image/svg+xml"),
        "odttf" => Some("application/vnd.openxmlformats-officedocument.obfuscatedFont"),
        _ => None,
    }
}

/// Resolves a relationship target against the directory of its source part.
///
/// `base_dir` is the source part's directory without a trailing slash, for
/// example `word` for `word/document.xml`.
#[must_use]
pub fn resolve_target(base_dir: &str, target: &str) -> String {
    let target = target.replace('\\', "/");
    if let Some(absolute) = target.strip_prefix('/') {
        return normalize_segments(absolute.split('/').collect());
    }
    let mut segments: Vec<&str> = base_dir.split('/').collect();
    segments.extend(target.split('/'));
    normalize_segments(segments)
}

fn normalize_segments(segments: Vec<&str>) -> String {
    let mut stack: Vec<&str> = Vec::new();
    for segment in segments {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            other => stack.push(other),
        }
    }
    stack.join("/")
}

/// Directory portion of a part name.
#[must_use]
pub fn part_dir(part_name: &str) -> &str {
    part_name.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Relationship part name for a source part.
#[must_use]
pub fn rels_part_for(part_name: &str) -> String {
    match part_name.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part_name}.rels"),
    }
}

/// Target of a part relative to the `word/` directory.
#[must_use]
pub fn word_relative(part_name: &str) -> String {
    part_name
        .strip_prefix("word/")
        .map_or_else(|| format!("/{part_name}"), ToString::to_string)
}

/// Extension of a part name, lower-cased.
#[must_use]
pub fn extension_of(part_name: &str) -> String {
    part_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_and_absolute_targets() {
        assert_eq!(resolve_target("word", "media/image1.png"), "word/media/image1.png");
        assert_eq!(resolve_target("word", "../customXml/item1.xml"), "customXml/item1.xml");
        assert_eq!(resolve_target("word", "/word/styles.xml"), "word/styles.xml");
        assert_eq!(resolve_target("", "word/document.xml"), "word/document.xml");
    }

    #[test]
    fn rels_part_names() {
        assert_eq!(rels_part_for("word/document.xml"), DOCUMENT_RELS_PART);
        assert_eq!(rels_part_for("word/header1.xml"), "word/_rels/header1.xml.rels");
        assert_eq!(word_relative("word/media/a.png"), "media/a.png");
        assert_eq!(word_relative("customXml/a.xml"), "/customXml/a.xml");
    }
}
