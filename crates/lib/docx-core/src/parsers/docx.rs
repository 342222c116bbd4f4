use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::{Cursor, Read};
use std::{error::Error, fmt};

use roxmltree::{Document, Node};
use zip::ZipArchive;

use crate::document::numbering::{AbstractNumbering, NumberingInstance};
use crate::document::package::{
    self,
    NS_A,
    NS_CONTENT_TYPES,
    NS_CP,
    NS_DC,
    NS_DCTERMS,
    NS_PACKAGE_RELS,
    NS_R,
    NS_STRICT_W,
    NS_W,
    NS_WP,
};
use crate::document::{
    Alignment,
    Block,
    BreakKind,
    CoreProperties,
    DocComment,
    Drawing,
    FieldCharKind,
    HeaderFooter,
    HeaderFooterKind,
    HeaderFooterRef,
    HeaderFooterType,
    Hyperlink,
    Indentation,
    Inline,
    Numbering,
    NumberingLevel,
    NumberingRef,
    Orientation,
    PackagePart,
    PageMargins,
    Paragraph,
    ParagraphFormat,
    Relationship,
    Run,
    RunContent,
    RunFormat,
    SectionProperties,
    SectionStart,
    SimpleField,
    Spacing,
    StyleDefinition,
    StyleType,
    Styles,
    Table,
    TableCell,
    TableRow,
    VMerge,
    VerticalAlign,
    WordDocument,
};

/// Upper bound on the total uncompressed size of a package.
pub const MAX_UNCOMPRESSED_BYTES: u64 = 512 * 1024 * 1024;

/// Error type for DOCX package parse failures.
#[derive(Debug)]
pub struct DocxParseError {
    message: String,
}

impl DocxParseError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for DocxParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DOCX parse error: {}", self.message)
    }
}

impl Error for DocxParseError {}

impl From<roxmltree::Error> for DocxParseError {
    fn from(err: roxmltree::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<zip::result::ZipError> for DocxParseError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::new(format!("not a valid zip package: {err}"))
    }
}

impl From<std::io::Error> for DocxParseError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for DocxParseError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::new(format!("part is not valid UTF-8: {err}"))
    }
}

impl From<tokio::task::JoinError> for DocxParseError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::new(err.to_string())
    }
}

/// Reader for WordprocessingML packages.
pub struct DocxParser;

impl DocxParser {
    /// Parses a `.docx` package into a `WordDocument`.
    ///
    /// # Errors
    /// Returns `DocxParseError` if the bytes are not a zip archive, the main
    /// document part is missing, or a modelled part is not well-formed XML.
    pub fn parse(bytes: &[u8]) -> Result<WordDocument, DocxParseError> {
        let entries = read_entries(bytes)?;
        PackageReader::new(entries)?.into_document()
    }

    /// Checks that `bytes` hold a readable package.
    ///
    /// # Errors
    /// Returns the same errors as [`DocxParser::parse`].
    pub fn validate(bytes: &[u8]) -> Result<(), DocxParseError> {
        Self::parse(bytes).map(|_| ())
    }

    /// Parses on the blocking pool.
    ///
    /// # Errors
    /// Returns `DocxParseError` if parsing fails or the task panics.
    pub async fn parse_async(bytes: Vec<u8>) -> Result<WordDocument, DocxParseError> {
        tokio::task::spawn_blocking(move || Self::parse(&bytes)).await?
    }
}

fn read_entries(bytes: &[u8]) -> Result<BTreeMap<String, Vec<u8>>, DocxParseError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = BTreeMap::new();
    let mut total: u64 = 0;
    for index in 0..archive.len() {
        let mut file = archive.by_index(index)?;
        if file.is_dir() {
            continue;
        }
        total = total.saturating_add(file.size());
        if total > MAX_UNCOMPRESSED_BYTES {
            return Err(DocxParseError::new("package is too large when uncompressed"));
        }
        let name = file.name().trim_start_matches('/').replace('\\', "/");
        let mut data = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
        file.read_to_end(&mut data)?;
        entries.insert(name, data);
    }
    Ok(entries)
}

fn xml_text(data: &[u8]) -> Result<String, DocxParseError> {
    let text = String::from_utf8(data.to_vec())?;
    Ok(match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

struct ContentTypes {
    defaults: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl ContentTypes {
    fn parse(xml: Option<&str>) -> Result<Self, DocxParseError> {
        let mut types = Self {
            defaults: HashMap::new(),
            overrides: HashMap::new(),
        };
        let Some(xml) = xml else {
            return Ok(types);
        };
        let doc = Document::parse(xml)?;
        for node in doc.root_element().children().filter(Node::is_element) {
            if node.tag_name().namespace() != Some(NS_CONTENT_TYPES) {
                continue;
            }
            let content_type = node.attribute("ContentType").unwrap_or_default().to_string();
            match node.tag_name().name() {
                "Default" => {
                    if let Some(extension) = node.attribute("Extension") {
                        types.defaults.insert(extension.to_ascii_lowercase(), content_type);
                    }
                }
                "Override" => {
                    if let Some(part) = node.attribute("PartName") {
                        types
                            .overrides
                            .insert(part.trim_start_matches('/').to_string(), content_type);
                    }
                }
                _ => {}
            }
        }
        Ok(types)
    }

    fn content_type_of(&self, part_name: &str) -> Option<String> {
        if let Some(found) = self.overrides.get(part_name) {
            return Some(found.clone());
        }
        let extension = package::extension_of(part_name);
        self.defaults.get(&extension).cloned().or_else(|| {
            package::content_type_for_extension(&extension).map(ToString::to_string)
        })
    }
}

fn parse_relationships(xml: &str) -> Result<Vec<Relationship>, DocxParseError> {
    let doc = Document::parse(xml)?;
    Ok(doc
        .root_element()
        .children()
        .filter(|node| node.has_tag_name((NS_PACKAGE_RELS, "Relationship")))
        .filter_map(|node| {
            Some(Relationship {
                id: node.attribute("Id")?.to_string(),
                rel_type: node.attribute("Type")?.to_string(),
                target: node.attribute("Target")?.to_string(),
                external: node
                    .attribute("TargetMode")
                    .is_some_and(|mode| mode.eq_ignore_ascii_case("external")),
            })
        })
        .collect())
}

struct PackageReader {
    entries: BTreeMap<String, Vec<u8>>,
    content_types: ContentTypes,
    main_part: String,
    core_part: String,
    relationships: Vec<Relationship>,
}

impl PackageReader {
    fn new(entries: BTreeMap<String, Vec<u8>>) -> Result<Self, DocxParseError> {
        let content_types = ContentTypes::parse(
            entries
                .get(package::CONTENT_TYPES_PART)
                .map(|data| xml_text(data))
                .transpose()?
                .as_deref(),
        )?;
        let package_rels = match entries.get(package::PACKAGE_RELS_PART) {
            Some(data) => parse_relationships(&xml_text(data)?)?,
            None => Vec::new(),
        };
        let target_of = |rel_type: &str| {
            package_rels
                .iter()
                .find(|rel| rel.rel_type == rel_type && !rel.external)
                .map(|rel| package::resolve_target("", &rel.target))
        };
        let main_part = target_of(package::REL_OFFICE_DOCUMENT)
            .unwrap_or_else(|| package::MAIN_DOCUMENT_PART.to_string());
        if !entries.contains_key(&main_part) {
            return Err(DocxParseError::new(format!(
                "missing main document part {main_part}"
            )));
        }
        let core_part = target_of(package::REL_CORE_PROPERTIES)
            .unwrap_or_else(|| package::CORE_PROPERTIES_PART.to_string());

        let main_dir = package::part_dir(&main_part).to_string();
        let relationships = match entries.get(&package::rels_part_for(&main_part)) {
            Some(data) => parse_relationships(&xml_text(data)?)?
                .into_iter()
                .map(|mut rel| {
                    if !rel.external {
                        rel.target =
                            package::word_relative(&package::resolve_target(&main_dir, &rel.target));
                    }
                    rel
                })
                .collect(),
            None => Vec::new(),
        };

        Ok(Self {
            entries,
            content_types,
            main_part,
            core_part,
            relationships,
        })
    }

    fn part_for(&self, rel_type: &str) -> Option<String> {
        self.relationships
            .iter()
            .find(|rel| rel.rel_type == rel_type && !rel.external)
            .map(|rel| package::resolve_target("word", &rel.target))
    }

    fn xml(&self, part_name: &str) -> Result<Option<String>, DocxParseError> {
        self.entries.get(part_name).map(|data| xml_text(data)).transpose()
    }

    fn into_document(self) -> Result<WordDocument, DocxParseError> {
        let mut consumed: BTreeSet<String> = [
            package::CONTENT_TYPES_PART.to_string(),
            package::PACKAGE_RELS_PART.to_string(),
            package::rels_part_for(&self.main_part),
            self.main_part.clone(),
        ]
        .into_iter()
        .collect();

        let main_xml = self.xml(&self.main_part)?.unwrap_or_default();
        let (body, section) = parse_main_document(&main_xml)?;

        let styles = match self.part_for(package::REL_STYLES) {
            Some(part) => match self.xml(&part)? {
                Some(xml) => {
                    consumed.insert(part);
                    parse_styles(&xml)?
                }
                None => Styles::default(),
            },
            None => Styles::default(),
        };

        let numbering = match self.part_for(package::REL_NUMBERING) {
            Some(part) => match self.xml(&part)? {
                Some(xml) => {
                    consumed.insert(part);
                    parse_numbering(&xml)?
                }
                None => Numbering::default(),
            },
            None => Numbering::default(),
        };

        let comments = match self.part_for(package::REL_COMMENTS) {
            Some(part) => match self.xml(&part)? {
                Some(xml) => {
                    consumed.insert(part);
                    parse_comments(&xml)?
                }
                None => Vec::new(),
            },
            None => Vec::new(),
        };

        let core = match self.xml(&self.core_part)? {
            Some(xml) => {
                consumed.insert(self.core_part.clone());
                parse_core_properties(&xml)?
            }
            None => CoreProperties::default(),
        };

        let mut headers_footers = Vec::new();
        for rel in self.relationships.iter().filter(|rel| !rel.external) {
            let kind = match rel.rel_type.as_str() {
                package::REL_HEADER => HeaderFooterKind::Header,
                package::REL_FOOTER => HeaderFooterKind::Footer,
                _ => continue,
            };
            let part_name = package::resolve_target("word", &rel.target);
            let Some(xml) = self.xml(&part_name)? else {
                continue;
            };
            let doc = Document::parse(&xml)?;
            headers_footers.push(HeaderFooter {
                rel_id: rel.id.clone(),
                part_name: part_name.clone(),
                kind,
                blocks: parse_blocks(doc.root_element()),
            });
            consumed.insert(part_name);
        }

        let mut parts = BTreeMap::new();
        for (name, data) in self.entries {
            if consumed.contains(&name) {
                continue;
            }
            let content_type = self.content_types.content_type_of(&name);
            parts.insert(name, PackagePart { content_type, data });
        }

        Ok(WordDocument {
            body,
            section,
            styles,
            numbering,
            comments,
            headers_footers,
            core,
            relationships: self.relationships,
            parts,
        })
    }
}

fn parse_main_document(xml: &str) -> Result<(Vec<Block>, SectionProperties), DocxParseError> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();
    if root.tag_name().namespace() == Some(NS_STRICT_W) {
        return Err(DocxParseError::new(
            "Strict Open XML documents are not supported",
        ));
    }
    if !root.has_tag_name((NS_W, "document")) {
        return Err(DocxParseError::new("main part is not a WordprocessingML document"));
    }
    let body = child(root, "body")
        .ok_or_else(|| DocxParseError::new("document has no body"))?;
    let section = child(body, "sectPr").map(parse_section).unwrap_or_default();
    Ok((parse_blocks(body), section))
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|candidate| candidate.has_tag_name((NS_W, name)))
}

fn w_attr<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute((NS_W, name))
}

fn child_val<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    child(node, name).and_then(|found| w_attr(found, "val"))
}

fn number<T: std::str::FromStr>(value: Option<&str>) -> Option<T> {
    value.and_then(|raw| raw.trim().parse().ok())
}

fn on_off(value: Option<&str>) -> bool {
    !matches!(value, Some("0" | "false" | "off"))
}

/// On/off property: `Some(true)` for `<w:b/>`, `Some(false)` for `w:val="0"`.
fn toggle(node: Node<'_, '_>, name: &str) -> Option<bool> {
    child(node, name).map(|found| on_off(w_attr(found, "val")))
}

fn is_w(node: Node<'_, '_>) -> bool {
    node.is_element() && node.tag_name().namespace() == Some(NS_W)
}

fn parse_blocks(parent: Node<'_, '_>) -> Vec<Block> {
    let mut blocks = Vec::new();
    collect_blocks(parent, &mut blocks);
    blocks
}

fn collect_blocks(parent: Node<'_, '_>, blocks: &mut Vec<Block>) {
    for node in parent.children().filter(|node| is_w(*node)) {
        match node.tag_name().name() {
            "p" => blocks.push(Block::Paragraph(parse_paragraph(node))),
            "tbl" => blocks.push(Block::Table(parse_table(node))),
            "sdt" => {
                if let Some(content) = child(node, "sdtContent") {
                    collect_blocks(content, blocks);
                }
            }
            "customXml" | "ins" | "moveTo" => collect_blocks(node, blocks),
            _ => {}
        }
    }
}

fn parse_paragraph(node: Node<'_, '_>) -> Paragraph {
    let format = child(node, "pPr").map(parse_paragraph_format).unwrap_or_default();
    let mut inlines = Vec::new();
    collect_inlines(node, &mut inlines);
    Paragraph { format, inlines }
}

fn parse_paragraph_format(ppr: Node<'_, '_>) -> ParagraphFormat {
    let numbering = child(ppr, "numPr").and_then(|num_pr| {
        let num_id: u32 = number(child_val(num_pr, "numId"))?;
        (num_id != 0).then(|| NumberingRef {
            num_id,
            level: number(child_val(num_pr, "ilvl")).unwrap_or(0),
        })
    });
    let indent = child(ppr, "ind").map_or_else(Indentation::default, |ind| Indentation {
        left: number(w_attr(ind, "left").or_else(|| w_attr(ind, "start"))),
        right: number(w_attr(ind, "right").or_else(|| w_attr(ind, "end"))),
        first_line: number(w_attr(ind, "firstLine")),
        hanging: number(w_attr(ind, "hanging")),
    });
    let spacing = child(ppr, "spacing").map_or_else(Spacing::default, |spacing| Spacing {
        before: number(w_attr(spacing, "before")),
        after: number(w_attr(spacing, "after")),
        line: number(w_attr(spacing, "line")),
    });
    ParagraphFormat {
        style: child_val(ppr, "pStyle").map(ToString::to_string),
        alignment: child_val(ppr, "jc").and_then(Alignment::from_xml),
        numbering,
        indent,
        spacing,
        keep_next: toggle(ppr, "keepNext").unwrap_or(false),
        keep_lines: toggle(ppr, "keepLines").unwrap_or(false),
        page_break_before: toggle(ppr, "pageBreakBefore").unwrap_or(false),
        outline_level: number(child_val(ppr, "outlineLvl")),
        section: child(ppr, "sectPr").map(|sect| Box::new(parse_section(sect))),
    }
}

fn collect_inlines(parent: Node<'_, '_>, inlines: &mut Vec<Inline>) {
    for node in parent.children().filter(|node| is_w(*node)) {
        match node.tag_name().name() {
            "r" => inlines.push(Inline::Run(parse_run(node))),
            "hyperlink" => inlines.push(Inline::Hyperlink(Hyperlink {
                rel_id: node.attribute((NS_R, "id")).map(ToString::to_string),
                anchor: w_attr(node, "anchor").map(ToString::to_string),
                runs: collect_runs(node),
            })),
            "fldSimple" => inlines.push(Inline::Field(SimpleField {
                instr: w_attr(node, "instr").unwrap_or_default().to_string(),
                runs: collect_runs(node),
            })),
            "bookmarkStart" => {
                if let (Some(id), Some(name)) = (number(w_attr(node, "id")), w_attr(node, "name")) {
                    inlines.push(Inline::BookmarkStart {
                        id,
                        name: name.to_string(),
                    });
                }
            }
            "bookmarkEnd" => {
                if let Some(id) = number(w_attr(node, "id")) {
                    inlines.push(Inline::BookmarkEnd { id });
                }
            }
            "commentRangeStart" => {
                if let Some(id) = number(w_attr(node, "id")) {
                    inlines.push(Inline::CommentRangeStart(id));
                }
            }
            "commentRangeEnd" => {
                if let Some(id) = number(w_attr(node, "id")) {
                    inlines.push(Inline::CommentRangeEnd(id));
                }
            }
            "sdt" => {
                if let Some(content) = child(node, "sdtContent") {
                    collect_inlines(content, inlines);
                }
            }
            // Accepted view of tracked changes: insertions stay, deletions go.
            "ins" | "moveTo" | "smartTag" | "customXml" => collect_inlines(node, inlines),
            _ => {}
        }
    }
}

/// Runs of a container, flattening nested links and fields.
fn collect_runs(parent: Node<'_, '_>) -> Vec<Run> {
    let mut inlines = Vec::new();
    collect_inlines(parent, &mut inlines);
    let mut runs = Vec::new();
    for inline in inlines {
        match inline {
            Inline::Run(run) => runs.push(run),
            Inline::Hyperlink(Hyperlink { runs: nested, .. })
            | Inline::Field(SimpleField { runs: nested, .. }) => runs.extend(nested),
            _ => {}
        }
    }
    runs
}

fn parse_run(node: Node<'_, '_>) -> Run {
    let format = child(node, "rPr").map(parse_run_format).unwrap_or_default();
    let mut content = Vec::new();
    for item in node.children().filter(|item| is_w(*item)) {
        match item.tag_name().name() {
            "t" => {
                let text = item.text().unwrap_or_default();
                if !text.is_empty() {
                    content.push(RunContent::Text(text.to_string()));
                }
            }
            "tab" => content.push(RunContent::Tab),
            "br" => content.push(RunContent::Break(match w_attr(item, "type") {
                Some("page") => BreakKind::Page,
                Some("column") => BreakKind::Column,
                _ => BreakKind::Line,
            })),
            "cr" => content.push(RunContent::Break(BreakKind::Line)),
            "noBreakHyphen" => content.push(RunContent::Text("\u{2011}".to_string())),
            "drawing" => {
                if let Some(drawing) = parse_drawing(item) {
                    content.push(RunContent::Drawing(drawing));
                }
            }
            "fldChar" => {
                let kind = match w_attr(item, "fldCharType") {
                    Some("begin") => Some(FieldCharKind::Begin),
                    Some("separate") => Some(FieldCharKind::Separate),
                    Some("end") => Some(FieldCharKind::End),
                    _ => None,
                };
                if let Some(kind) = kind {
                    content.push(RunContent::FieldChar(kind));
                }
            }
            "instrText" => content.push(RunContent::InstrText(
                item.text().unwrap_or_default().to_string(),
            )),
            "commentReference" => {
                if let Some(id) = number(w_attr(item, "id")) {
                    content.push(RunContent::CommentReference(id));
                }
            }
            _ => {}
        }
    }
    Run { format, content }
}

fn parse_run_format(rpr: Node<'_, '_>) -> RunFormat {
    let colour = |name: &str| {
        child_val(rpr, name)
            .filter(|value| !value.eq_ignore_ascii_case("auto") && *value != "none")
            .map(ToString::to_string)
    };
    RunFormat {
        style: child_val(rpr, "rStyle").map(ToString::to_string),
        bold: toggle(rpr, "b"),
        italic: toggle(rpr, "i"),
        underline: child(rpr, "u").map(|u| w_attr(u, "val").unwrap_or("single").to_string()),
        strike: toggle(rpr, "strike"),
        font: child(rpr, "rFonts")
            .and_then(|fonts| w_attr(fonts, "ascii").or_else(|| w_attr(fonts, "hAnsi")))
            .map(ToString::to_string),
        size: number(child_val(rpr, "sz")),
        color: colour("color"),
        highlight: colour("highlight"),
        vertical_align: child_val(rpr, "vertAlign").and_then(VerticalAlign::from_xml),
    }
}

fn parse_drawing(node: Node<'_, '_>) -> Option<Drawing> {
    let container = node.children().find(|candidate| {
        candidate.has_tag_name((NS_WP, "inline")) || candidate.has_tag_name((NS_WP, "anchor"))
    })?;
    let rel_id = container
        .descendants()
        .find(|candidate| candidate.has_tag_name((NS_A, "blip")))
        .and_then(|blip| blip.attribute((NS_R, "embed")))?;
    let extent = container
        .children()
        .find(|candidate| candidate.has_tag_name((NS_WP, "extent")));
    let doc_pr = container
        .children()
        .find(|candidate| candidate.has_tag_name((NS_WP, "docPr")));
    Some(Drawing {
        rel_id: rel_id.to_string(),
        width_emu: number(extent.and_then(|node| node.attribute("cx"))).unwrap_or(0),
        height_emu: number(extent.and_then(|node| node.attribute("cy"))).unwrap_or(0),
        id: number(doc_pr.and_then(|node| node.attribute("id"))).unwrap_or(0),
        name: doc_pr
            .and_then(|node| node.attribute("name"))
            .unwrap_or_default()
            .to_string(),
        description: doc_pr
            .and_then(|node| node.attribute("descr"))
            .filter(|descr| !descr.is_empty())
            .map(ToString::to_string),
    })
}

fn parse_table(node: Node<'_, '_>) -> Table {
    let properties = child(node, "tblPr");
    let grid = child(node, "tblGrid")
        .map(|grid| {
            grid.children()
                .filter(|col| col.has_tag_name((NS_W, "gridCol")))
                .map(|col| number(w_attr(col, "w")).unwrap_or(0))
                .collect()
        })
        .unwrap_or_default();
    let rows = node
        .children()
        .filter(|row| row.has_tag_name((NS_W, "tr")))
        .map(parse_row)
        .collect();
    Table {
        style: properties
            .and_then(|props| child_val(props, "tblStyle"))
            .map(ToString::to_string),
        alignment: properties
            .and_then(|props| child_val(props, "jc"))
            .and_then(Alignment::from_xml),
        borders: properties
            .and_then(|props| child(props, "tblBorders"))
            .and_then(|borders| borders.children().find(|edge| is_w(*edge)))
            .and_then(|edge| w_attr(edge, "val"))
            .map(ToString::to_string),
        grid,
        rows,
    }
}

fn parse_row(node: Node<'_, '_>) -> TableRow {
    let properties = child(node, "trPr");
    let cells = node
        .children()
        .filter(|cell| cell.has_tag_name((NS_W, "tc")))
        .map(parse_cell)
        .collect();
    TableRow {
        cells,
        header: properties
            .and_then(|props| toggle(props, "tblHeader"))
            .unwrap_or(false),
        height: properties.and_then(|props| number(child_val(props, "trHeight"))),
    }
}

fn parse_cell(node: Node<'_, '_>) -> TableCell {
    let properties = child(node, "tcPr");
    let mut blocks = parse_blocks(node);
    if blocks.is_empty() {
        blocks.push(Block::Paragraph(Paragraph::default()));
    }
    TableCell {
        width: properties
            .and_then(|props| child(props, "tcW"))
            .filter(|width| w_attr(*width, "type").is_none_or(|kind| kind == "dxa"))
            .and_then(|width| number(w_attr(width, "w"))),
        grid_span: properties
            .and_then(|props| number(child_val(props, "gridSpan")))
            .unwrap_or(1)
            .max(1),
        v_merge: properties
            .and_then(|props| child(props, "vMerge"))
            .map(|merge| match w_attr(merge, "val") {
                Some("restart") => VMerge::Restart,
                _ => VMerge::Continue,
            }),
        shading: properties
            .and_then(|props| child(props, "shd"))
            .and_then(|shd| w_attr(shd, "fill"))
            .filter(|fill| !fill.eq_ignore_ascii_case("auto"))
            .map(ToString::to_string),
        blocks,
    }
}

fn parse_section(node: Node<'_, '_>) -> SectionProperties {
    let mut section = SectionProperties::default();
    if let Some(size) = child(node, "pgSz") {
        section.page_width = number(w_attr(size, "w")).unwrap_or(section.page_width);
        section.page_height = number(w_attr(size, "h")).unwrap_or(section.page_height);
        section.orientation = match w_attr(size, "orient") {
            Some("landscape") => Orientation::Landscape,
            Some(_) => Orientation::Portrait,
            None if section.page_width > section.page_height => Orientation::Landscape,
            None => Orientation::Portrait,
        };
    }
    if let Some(margins) = child(node, "pgMar") {
        let defaults = PageMargins::default();
        section.margins = PageMargins {
            top: number(w_attr(margins, "top")).unwrap_or(defaults.top),
            right: number(w_attr(margins, "right")).unwrap_or(defaults.right),
            bottom: number(w_attr(margins, "bottom")).unwrap_or(defaults.bottom),
            left: number(w_attr(margins, "left")).unwrap_or(defaults.left),
            header: number(w_attr(margins, "header")).unwrap_or(defaults.header),
            footer: number(w_attr(margins, "footer")).unwrap_or(defaults.footer),
            gutter: number(w_attr(margins, "gutter")).unwrap_or(defaults.gutter),
        };
    }
    for reference in node.children().filter(|item| is_w(*item)) {
        let target = match reference.tag_name().name() {
            "headerReference" => &mut section.headers,
            "footerReference" => &mut section.footers,
            _ => continue,
        };
        let Some(rel_id) = reference.attribute((NS_R, "id")) else {
            continue;
        };
        target.push(HeaderFooterRef {
            kind: w_attr(reference, "type")
                .and_then(HeaderFooterType::from_xml)
                .unwrap_or(HeaderFooterType::Default),
            rel_id: rel_id.to_string(),
        });
    }
    section.start = child_val(node, "type").and_then(SectionStart::from_xml);
    section.title_page = toggle(node, "titlePg").unwrap_or(false);
    section.columns = child(node, "cols")
        .and_then(|cols| number(w_attr(cols, "num")))
        .filter(|count| *count > 1);
    section
}

fn parse_style_type(value: Option<&str>) -> Option<StyleType> {
    match value.unwrap_or("paragraph") {
        "paragraph" => Some(StyleType::Paragraph),
        "character" => Some(StyleType::Character),
        "table" => Some(StyleType::Table),
        "numbering" => Some(StyleType::Numbering),
        _ => None,
    }
}

fn parse_styles(xml: &str) -> Result<Styles, DocxParseError> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();
    let mut styles = Styles::default();
    if let Some(defaults) = child(root, "docDefaults") {
        if let Some(rpr) = child(defaults, "rPrDefault").and_then(|node| child(node, "rPr")) {
            styles.default_run = parse_run_format(rpr);
        }
        if let Some(ppr) = child(defaults, "pPrDefault").and_then(|node| child(node, "pPr")) {
            styles.default_paragraph = parse_paragraph_format(ppr);
        }
    }
    for node in root.children().filter(|node| node.has_tag_name((NS_W, "style"))) {
        let Some(style_type) = parse_style_type(w_attr(node, "type")) else {
            continue;
        };
        let Some(style_id) = w_attr(node, "styleId") else {
            continue;
        };
        let name = child_val(node, "name").unwrap_or(style_id);
        let mut style = StyleDefinition::new(style_id, name, style_type);
        style.is_default = matches!(w_attr(node, "default"), Some("1" | "true" | "on"));
        style.custom = matches!(w_attr(node, "customStyle"), Some("1" | "true" | "on"));
        style.based_on = child_val(node, "basedOn").map(ToString::to_string);
        style.next = child_val(node, "next").map(ToString::to_string);
        style.link = child_val(node, "link").map(ToString::to_string);
        style.ui_priority = number(child_val(node, "uiPriority"));
        style.quick_format = toggle(node, "qFormat").unwrap_or(false);
        style.hidden = toggle(node, "semiHidden").unwrap_or(false);
        if let Some(ppr) = child(node, "pPr") {
            style.paragraph = parse_paragraph_format(ppr);
        }
        if let Some(rpr) = child(node, "rPr") {
            style.run = parse_run_format(rpr);
        }
        style.table_borders = child(node, "tblPr")
            .and_then(|props| child(props, "tblBorders"))
            .and_then(|borders| borders.children().find(|edge| is_w(*edge)))
            .and_then(|edge| w_attr(edge, "val"))
            .map(ToString::to_string);
        styles.definitions.push(style);
    }
    Ok(styles)
}

fn parse_numbering(xml: &str) -> Result<Numbering, DocxParseError> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();
    let mut numbering = Numbering::default();
    for node in root.children().filter(|node| is_w(*node)) {
        match node.tag_name().name() {
            "abstractNum" => {
                let Some(id) = number(w_attr(node, "abstractNumId")) else {
                    continue;
                };
                let levels = node
                    .children()
                    .filter(|lvl| lvl.has_tag_name((NS_W, "lvl")))
                    .filter_map(|lvl| {
                        let level = number(w_attr(lvl, "ilvl"))?;
                        let ind = child(lvl, "pPr").and_then(|ppr| child(ppr, "ind"));
                        Some(NumberingLevel {
                            level,
                            start: number(child_val(lvl, "start")).unwrap_or(1),
                            format: child_val(lvl, "numFmt").unwrap_or("decimal").to_string(),
                            text: child_val(lvl, "lvlText").unwrap_or_default().to_string(),
                            indent_left: number(ind.and_then(|ind| {
                                w_attr(ind, "left").or_else(|| w_attr(ind, "start"))
                            }))
                            .unwrap_or(0),
                            hanging: number(ind.and_then(|ind| w_attr(ind, "hanging"))).unwrap_or(0),
                            font: child(lvl, "rPr")
                                .and_then(|rpr| child(rpr, "rFonts"))
                                .and_then(|fonts| w_attr(fonts, "ascii"))
                                .map(ToString::to_string),
                        })
                    })
                    .collect();
                numbering.abstract_nums.push(AbstractNumbering {
                    id,
                    multi_level: child_val(node, "multiLevelType") != Some("singleLevel"),
                    levels,
                });
            }
            "num" => {
                let (Some(num_id), Some(abstract_id)) = (
                    number(w_attr(node, "numId")),
                    number(child_val(node, "abstractNumId")),
                ) else {
                    continue;
                };
                let start_override = node
                    .children()
                    .filter(|item| item.has_tag_name((NS_W, "lvlOverride")))
                    .find(|item| w_attr(*item, "ilvl") == Some("0"))
                    .and_then(|item| number(child_val(item, "startOverride")));
                numbering.instances.push(NumberingInstance {
                    num_id,
                    abstract_id,
                    start_override,
                });
            }
            _ => {}
        }
    }
    Ok(numbering)
}

fn parse_comments(xml: &str) -> Result<Vec<DocComment>, DocxParseError> {
    let doc = Document::parse(xml)?;
    Ok(doc
        .root_element()
        .children()
        .filter(|node| node.has_tag_name((NS_W, "comment")))
        .filter_map(|node| {
            Some(DocComment {
                id: number(w_attr(node, "id"))?,
                author: w_attr(node, "author").unwrap_or_default().to_string(),
                initials: w_attr(node, "initials").map(ToString::to_string),
                date: w_attr(node, "date").map(ToString::to_string),
                paragraphs: parse_blocks(node)
                    .into_iter()
                    .filter_map(|block| match block {
                        Block::Paragraph(paragraph) => Some(paragraph),
                        Block::Table(_) => None,
                    })
                    .collect(),
            })
        })
        .collect())
}

fn parse_core_properties(xml: &str) -> Result<CoreProperties, DocxParseError> {
    let doc = Document::parse(xml)?;
    let mut core = CoreProperties::default();
    for node in doc.root_element().children().filter(Node::is_element) {
        let Some(value) = node
            .text()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToString::to_string)
        else {
            continue;
        };
        let name = node.tag_name().name();
        match node.tag_name().namespace() {
            Some(NS_DC) => match name {
                "title" => core.title = Some(value),
                "subject" => core.subject = Some(value),
                "creator" => core.author = Some(value),
                "description" => core.comments = Some(value),
                "language" => core.language = Some(value),
                _ => {}
            },
            Some(NS_CP) => match name {
                "keywords" => core.keywords = Some(value),
                "category" => core.category = Some(value),
                "contentStatus" => core.content_status = Some(value),
                "lastModifiedBy" => core.last_modified_by = Some(value),
                "revision" => core.revision = value.parse().ok(),
                _ => {}
            },
            Some(NS_DCTERMS) => match name {
                "created" => core.created = Some(value),
                "modified" => core.modified = Some(value),
                _ => {}
            },
            _ => {}
        }
    }
    Ok(core)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::Write;

    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    use super::*;

    pub(crate) fn package(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in parts {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(data.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/settings.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml"/>
</Types>"#;

    const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
</Relationships>"#;

    const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/settings" Target="settings.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com" TargetMode="External"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" Target="header1.xml"/>
</Relationships>"#;

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <w:body>
    <w:p>
      <w:pPr><w:pStyle w:val="Heading1"/><w:jc w:val="center"/></w:pPr>
      <w:r><w:t>Report</w:t></w:r>
    </w:p>
    <w:p>
      <w:r><w:rPr><w:b/><w:i w:val="0"/><w:sz w:val="28"/><w:color w:val="FF0000"/></w:rPr><w:t xml:space="preserve">Bold </w:t></w:r>
      <w:ins w:id="1" w:author="x"><w:r><w:t>kept</w:t></w:r></w:ins>
      <w:del w:id="2" w:author="x"><w:r><w:delText>gone</w:delText></w:r></w:del>
      <w:hyperlink r:id="rId2"><w:r><w:t xml:space="preserve"> link</w:t></w:r></w:hyperlink>
      <w:bookmarkStart w:id="0" w:name="intro"/><w:bookmarkEnd w:id="0"/>
    </w:p>
    <w:tbl>
      <w:tblPr><w:tblStyle w:val="TableGrid"/></w:tblPr>
      <w:tblGrid><w:gridCol w:w="2000"/><w:gridCol w:w="3000"/></w:tblGrid>
      <w:tr>
        <w:tc><w:tcPr><w:gridSpan w:val="2"/></w:tcPr><w:p><w:r><w:t>wide</w:t></w:r></w:p></w:tc>
      </w:tr>
      <w:tr>
        <w:tc><w:tcPr><w:vMerge w:val="restart"/></w:tcPr><w:p><w:r><w:t>a</w:t></w:r></w:p></w:tc>
        <w:tc><w:p><w:r><w:t>b</w:t></w:r></w:p></w:tc>
      </w:tr>
    </w:tbl>
    <w:p><w:pPr><w:numPr><w:ilvl w:val="1"/><w:numId w:val="3"/></w:numPr></w:pPr><w:r><w:t>item</w:t><w:tab/><w:t>x</w:t></w:r></w:p>
    <w:sectPr>
      <w:headerReference w:type="default" r:id="rId3"/>
      <w:pgSz w:w="15840" w:h="12240" w:orient="landscape"/>
      <w:pgMar w:top="720" w:right="1080" w:bottom="720" w:left="1080" w:header="360" w:footer="360" w:gutter="0"/>
    </w:sectPr>
  </w:body>
</w:document>"#;

    const HEADER: &str = r#"<w:hdr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:p><w:r><w:t>Top</w:t></w:r></w:p></w:hdr>"#;

    const CORE: &str = r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/"><dc:title>Quarterly</dc:title><dc:creator>Ana</dc:creator><cp:revision>4</cp:revision></cp:coreProperties>"#;

    pub(crate) fn sample() -> Vec<u8> {
        package(&[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", PACKAGE_RELS),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS),
            ("word/document.xml", DOCUMENT),
            ("word/header1.xml", HEADER),
            ("word/settings.xml", "<w:settings xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"/>"),
            ("docProps/core.xml", CORE),
        ])
    }

    #[test]
    fn parses_body_blocks() {
        let doc = DocxParser::parse(&sample()).unwrap();
        assert_eq!(doc.paragraph_count(), 3);
        assert_eq!(doc.table_count(), 1);

        let heading = doc.paragraph(0).unwrap();
        assert_eq!(heading.format.style.as_deref(), Some("Heading1"));
        assert_eq!(heading.format.alignment, Some(Alignment::Center));

        let mixed = doc.paragraph(1).unwrap();
        assert_eq!(mixed.text(), "Bold kept link");
        let first = mixed.runs().next().unwrap();
        assert_eq!(first.format.bold, Some(true));
        assert_eq!(first.format.italic, Some(false));
        assert_eq!(first.format.size, Some(28));
        assert_eq!(first.format.color.as_deref(), Some("FF0000"));
        assert!(mixed.inlines.iter().any(|inline| matches!(
            inline,
            Inline::BookmarkStart { name, .. } if name == "intro"
        )));

        let item = doc.paragraph(2).unwrap();
        assert_eq!(item.text(), "item\tx");
        assert_eq!(item.format.numbering, Some(NumberingRef { num_id: 3, level: 1 }));
    }

    #[test]
    fn parses_tables_with_merges() {
        let doc = DocxParser::parse(&sample()).unwrap();
        let table = doc.table(0).unwrap();
        assert_eq!(table.style.as_deref(), Some("TableGrid"));
        assert_eq!(table.grid, vec![2000, 3000]);
        assert_eq!(table.rows[0].cells[0].grid_span, 2);
        assert_eq!(table.rows[1].cells[0].v_merge, Some(VMerge::Restart));
        assert_eq!(table.rows_as_text(), vec![vec!["wide", "wide"], vec!["a", "b"]]);
    }

    #[test]
    fn parses_section_header_and_core() {
        let doc = DocxParser::parse(&sample()).unwrap();
        assert_eq!(doc.section.orientation, Orientation::Landscape);
        assert_eq!(doc.section.page_width, 15_840);
        assert_eq!(doc.section.margins.left, 1080);
        assert_eq!(doc.section.default_ref(HeaderFooterKind::Header), Some("rId3"));
        let header = doc.header_footer("rId3").unwrap();
        assert_eq!(header.part_name, "word/header1.xml");
        assert_eq!(header.kind, HeaderFooterKind::Header);
        assert_eq!(doc.core.title.as_deref(), Some("Quarterly"));
        assert_eq!(doc.core.author.as_deref(), Some("Ana"));
        assert_eq!(doc.core.revision, Some(4));
    }

    #[test]
    fn keeps_unmodelled_parts() {
        let doc = DocxParser::parse(&sample()).unwrap();
        let settings = doc.parts.get("word/settings.xml").unwrap();
        assert_eq!(
            settings.content_type.as_deref(),
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml")
        );
        assert!(!doc.parts.contains_key("word/document.xml"));
        assert!(!doc.parts.contains_key("word/header1.xml"));
        assert_eq!(
            doc.relationship("rId2").map(|rel| rel.target.as_str()),
            Some("https://example.com")
        );
    }

    #[test]
    fn rejects_bad_input() {
        let not_zip = DocxParser::parse(b"plain text").unwrap_err();
        assert!(not_zip.to_string().starts_with("DOCX parse error: not a valid zip package"));

        let empty = package(&[("readme.txt", "hi")]);
        let missing = DocxParser::parse(&empty).unwrap_err();
        assert!(missing.to_string().contains("missing main document part"));

        let broken = package(&[("word/document.xml", "<w:document")]);
        assert!(DocxParser::validate(&broken).is_err());

        let strict = package(&[(
            "word/document.xml",
            r#"<w:document xmlns:w="http://purl.oclc.org/ooxml/wordprocessingml/main"><w:body/></w:document>"#,
        )]);
        assert!(DocxParser::parse(&strict).unwrap_err().to_string().contains("Strict"));
    }

    #[tokio::test]
    async fn parse_async_matches_sync() {
        let bytes = sample();
        let doc = DocxParser::parse_async(bytes.clone()).await.unwrap();
        assert_eq!(doc, DocxParser::parse(&bytes).unwrap());
    }
}
