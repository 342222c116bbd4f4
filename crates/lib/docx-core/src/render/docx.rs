use std::collections::BTreeMap;
use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::RenderError;
use super::xml::XmlWriter;
use crate::document::package::{
    self,
    NS_A,
    NS_CONTENT_TYPES,
    NS_CP,
    NS_DC,
    NS_DCTERMS,
    NS_PACKAGE_RELS,
    NS_PIC,
    NS_R,
    NS_W,
    NS_WP,
    NS_XSI,
};
use crate::document::{
    Block,
    BreakKind,
    CoreProperties,
    Drawing,
    FieldCharKind,
    HeaderFooterKind,
    Inline,
    Numbering,
    Orientation,
    Paragraph,
    ParagraphFormat,
    Relationship,
    Run,
    RunContent,
    RunFormat,
    SectionProperties,
    Styles,
    Table,
    TableCell,
    VMerge,
    WordDocument,
};

const BODY_NAMESPACES: [(&str, &str); 5] = [
    ("xmlns:w", NS_W),
    ("xmlns:r", NS_R),
    ("xmlns:wp", NS_WP),
    ("xmlns:a", NS_A),
    ("xmlns:pic", NS_PIC),
];

/// Serialises a document into a `.docx` package.
///
/// # Errors
/// Returns `RenderError::Package` if the zip archive cannot be written.
pub fn write(doc: &WordDocument) -> Result<Vec<u8>, RenderError> {
    let mut relationships = doc.relationships.clone();
    let styles_part = ensure_part(&mut relationships, package::REL_STYLES, "styles.xml");
    let numbering_part = (!doc.numbering.is_empty()
        || has_relationship(&relationships, package::REL_NUMBERING))
    .then(|| ensure_part(&mut relationships, package::REL_NUMBERING, "numbering.xml"));
    let comments_part = (!doc.comments.is_empty()
        || has_relationship(&relationships, package::REL_COMMENTS))
    .then(|| ensure_part(&mut relationships, package::REL_COMMENTS, "comments.xml"));

    let mut generated: BTreeMap<String, (String, String)> = BTreeMap::new();
    let mut add = |name: String, content_type: &str, xml: String| {
        generated.insert(name, (content_type.to_string(), xml));
    };
    add(
        package::MAIN_DOCUMENT_PART.to_string(),
        package::CT_MAIN_DOCUMENT,
        document_xml(doc),
    );
    add(styles_part, package::CT_STYLES, styles_xml(&doc.styles));
    if let Some(part) = numbering_part {
        add(part, package::CT_NUMBERING, numbering_xml(&doc.numbering));
    }
    if let Some(part) = comments_part {
        add(part, package::CT_COMMENTS, comments_xml(doc));
    }
    for header_footer in &doc.headers_footers {
        if !relationships.iter().any(|rel| rel.id == header_footer.rel_id) {
            continue;
        }
        let (root, content_type) = match header_footer.kind {
            HeaderFooterKind::Header => ("w:hdr", package::CT_HEADER),
            HeaderFooterKind::Footer => ("w:ftr", package::CT_FOOTER),
        };
        add(
            header_footer.part_name.clone(),
            content_type,
            story_xml(root, &header_footer.blocks),
        );
    }
    add(
        package::CORE_PROPERTIES_PART.to_string(),
        package::CT_CORE_PROPERTIES,
        core_xml(&doc.core),
    );
    add(
        package::DOCUMENT_RELS_PART.to_string(),
        package::CT_RELATIONSHIPS,
        relationships_xml(&relationships),
    );
    add(
        package::PACKAGE_RELS_PART.to_string(),
        package::CT_RELATIONSHIPS,
        relationships_xml(&package_relationships(doc)),
    );

    let passthrough: Vec<(&String, &crate::document::PackagePart)> = doc
        .parts
        .iter()
        .filter(|(name, _)| {
            !generated.contains_key(*name) && name.as_str() != package::CONTENT_TYPES_PART
        })
        .collect();

    let content_types = content_types_xml(
        generated
            .iter()
            .map(|(name, (content_type, _))| (name.as_str(), content_type.as_str())),
        passthrough
            .iter()
            .map(|(name, part)| (name.as_str(), part.content_type.as_deref())),
    );

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file(package::CONTENT_TYPES_PART, options)?;
    zip.write_all(content_types.as_bytes())?;
    if let Some((_, xml)) = generated.get(package::PACKAGE_RELS_PART) {
        zip.start_file(package::PACKAGE_RELS_PART, options)?;
        zip.write_all(xml.as_bytes())?;
    }
    for (name, (_, xml)) in &generated {
        if name == package::PACKAGE_RELS_PART {
            continue;
        }
        zip.start_file(name.as_str(), options)?;
        zip.write_all(xml.as_bytes())?;
    }
    for (name, part) in passthrough {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(&part.data)?;
    }
    Ok(zip.finish()?.into_inner())
}

fn has_relationship(relationships: &[Relationship], rel_type: &str) -> bool {
    relationships
        .iter()
        .any(|rel| rel.rel_type == rel_type && !rel.external)
}

/// Part name of the relationship of `rel_type`, adding one when absent.
fn ensure_part(relationships: &mut Vec<Relationship>, rel_type: &str, target: &str) -> String {
    if let Some(existing) = relationships
        .iter()
        .find(|rel| rel.rel_type == rel_type && !rel.external)
    {
        return package::resolve_target("word", &existing.target);
    }
    let mut next = relationships.len() + 1;
    while relationships.iter().any(|rel| rel.id == format!("rId{next}")) {
        next += 1;
    }
    relationships.push(Relationship {
        id: format!("rId{next}"),
        rel_type: rel_type.to_string(),
        target: target.to_string(),
        external: false,
    });
    package::resolve_target("word", target)
}

fn package_relationships(doc: &WordDocument) -> Vec<Relationship> {
    let internal = |id: &str, rel_type: &str, target: &str| Relationship {
        id: id.to_string(),
        rel_type: rel_type.to_string(),
        target: target.to_string(),
        external: false,
    };
    let mut rels = vec![
        internal("rId1", package::REL_OFFICE_DOCUMENT, package::MAIN_DOCUMENT_PART),
        internal("rId2", package::REL_CORE_PROPERTIES, package::CORE_PROPERTIES_PART),
    ];
    if doc.parts.contains_key("docProps/app.xml") {
        rels.push(internal("rId3", package::REL_EXTENDED_PROPERTIES, "docProps/app.xml"));
    }
    if doc.parts.contains_key("docProps/custom.xml") {
        rels.push(internal("rId4", package::REL_CUSTOM_PROPERTIES, "docProps/custom.xml"));
    }
    rels
}

fn relationships_xml(relationships: &[Relationship]) -> String {
    let mut w = XmlWriter::new();
    w.open("Relationships", &[("xmlns", NS_PACKAGE_RELS)]);
    for rel in relationships {
        let mut attrs = vec![
            ("Id", rel.id.as_str()),
            ("Type", rel.rel_type.as_str()),
            ("Target", rel.target.as_str()),
        ];
        if rel.external {
            attrs.push(("TargetMode", "External"));
        }
        w.empty("Relationship", &attrs);
    }
    w.close("Relationships");
    w.finish()
}

fn content_types_xml<'a>(
    generated: impl Iterator<Item = (&'a str, &'a str)>,
    passthrough: impl Iterator<Item = (&'a str, Option<&'a str>)>,
) -> String {
    let mut defaults: BTreeMap<String, String> = BTreeMap::new();
    defaults.insert("rels".to_string(), package::CT_RELATIONSHIPS.to_string());
    defaults.insert("xml".to_string(), "application/xml".to_string());
    let mut overrides: BTreeMap<String, String> = generated
        .filter(|(_, content_type)| *content_type != package::CT_RELATIONSHIPS)
        .map(|(name, content_type)| (name.to_string(), content_type.to_string()))
        .collect();

    for (name, content_type) in passthrough {
        let Some(content_type) = content_type else {
            continue;
        };
        let extension = package::extension_of(name);
        match defaults.get(&extension) {
            Some(existing) if existing == content_type => {}
            None if !extension.is_empty()
                && package::content_type_for_extension(&extension) == Some(content_type) =>
            {
                defaults.insert(extension, content_type.to_string());
            }
            _ => {
                overrides.insert(name.to_string(), content_type.to_string());
            }
        }
    }

    let mut w = XmlWriter::new();
    w.open("Types", &[("xmlns", NS_CONTENT_TYPES)]);
    for (extension, content_type) in &defaults {
        w.empty("Default", &[("Extension", extension), ("ContentType", content_type)]);
    }
    for (name, content_type) in &overrides {
        w.empty(
            "Override",
            &[("PartName", &format!("/{name}")), ("ContentType", content_type)],
        );
    }
    w.close("Types");
    w.finish()
}

fn document_xml(doc: &WordDocument) -> String {
    let mut w = XmlWriter::new();
    w.open("w:document", &BODY_NAMESPACES);
    w.open("w:body", &[]);
    write_blocks(&mut w, &doc.body);
    write_section(&mut w, &doc.section);
    w.close("w:body");
    w.close("w:document");
    w.finish()
}

fn story_xml(root: &str, blocks: &[Block]) -> String {
    let mut w = XmlWriter::new();
    w.open(root, &BODY_NAMESPACES);
    write_blocks(&mut w, blocks);
    if !matches!(blocks.last(), Some(Block::Paragraph(_))) {
        w.empty("w:p", &[]);
    }
    w.close(root);
    w.finish()
}

fn write_blocks(w: &mut XmlWriter, blocks: &[Block]) {
    for block in blocks {
        match block {
            Block::Paragraph(paragraph) => write_paragraph(w, paragraph),
            Block::Table(table) => write_table(w, table),
        }
    }
}

fn write_toggle(w: &mut XmlWriter, name: &str, value: Option<bool>) {
    match value {
        Some(true) => w.empty(name, &[]),
        Some(false) => w.val(name, "0"),
        None => {}
    }
}

fn paragraph_format_is_empty(format: &ParagraphFormat) -> bool {
    *format == ParagraphFormat::default()
}

fn write_paragraph_format(w: &mut XmlWriter, format: &ParagraphFormat) {
    if paragraph_format_is_empty(format) {
        return;
    }
    w.open("w:pPr", &[]);
    if let Some(style) = &format.style {
        w.val("w:pStyle", style);
    }
    if format.keep_next {
        w.empty("w:keepNext", &[]);
    }
    if format.keep_lines {
        w.empty("w:keepLines", &[]);
    }
    if format.page_break_before {
        w.empty("w:pageBreakBefore", &[]);
    }
    if let Some(numbering) = format.numbering {
        w.open("w:numPr", &[]);
        w.val("w:ilvl", numbering.level);
        w.val("w:numId", numbering.num_id);
        w.close("w:numPr");
    }
    if !format.spacing.is_empty() {
        let before = format.spacing.before.map(|value| value.to_string());
        let after = format.spacing.after.map(|value| value.to_string());
        let line = format.spacing.line.map(|value| value.to_string());
        let mut attrs = Vec::new();
        if let Some(before) = &before {
            attrs.push(("w:before", before.as_str()));
        }
        if let Some(after) = &after {
            attrs.push(("w:after", after.as_str()));
        }
        if let Some(line) = &line {
            attrs.push(("w:line", line.as_str()));
            attrs.push(("w:lineRule", "auto"));
        }
        w.empty("w:spacing", &attrs);
    }
    if !format.indent.is_empty() {
        let values: Vec<(&str, String)> = [
            ("w:left", format.indent.left),
            ("w:right", format.indent.right),
            ("w:firstLine", format.indent.first_line),
            ("w:hanging", format.indent.hanging),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|value| (name, value.to_string())))
        .collect();
        let attrs: Vec<(&str, &str)> = values
            .iter()
            .map(|(name, value)| (*name, value.as_str()))
            .collect();
        w.empty("w:ind", &attrs);
    }
    if let Some(alignment) = format.alignment {
        w.val("w:jc", alignment.as_xml());
    }
    if let Some(level) = format.outline_level {
        w.val("w:outlineLvl", level);
    }
    if let Some(section) = &format.section {
        write_section(w, section);
    }
    w.close("w:pPr");
}

fn write_paragraph(w: &mut XmlWriter, paragraph: &Paragraph) {
    w.open("w:p", &[]);
    write_paragraph_format(w, &paragraph.format);
    for inline in &paragraph.inlines {
        match inline {
            Inline::Run(run) => write_run(w, run),
            Inline::Hyperlink(link) => {
                let mut attrs = Vec::new();
                if let Some(rel_id) = &link.rel_id {
                    attrs.push(("r:id", rel_id.as_str()));
                }
                if let Some(anchor) = &link.anchor {
                    attrs.push(("w:anchor", anchor.as_str()));
                }
                w.open("w:hyperlink", &attrs);
                for run in &link.runs {
                    write_run(w, run);
                }
                w.close("w:hyperlink");
            }
            Inline::Field(field) => {
                w.open("w:fldSimple", &[("w:instr", &field.instr)]);
                for run in &field.runs {
                    write_run(w, run);
                }
                w.close("w:fldSimple");
            }
            Inline::BookmarkStart { id, name } => {
                w.empty("w:bookmarkStart", &[("w:id", &id.to_string()), ("w:name", name)]);
            }
            Inline::BookmarkEnd { id } => w.empty("w:bookmarkEnd", &[("w:id", &id.to_string())]),
            Inline::CommentRangeStart(id) => {
                w.empty("w:commentRangeStart", &[("w:id", &id.to_string())]);
            }
            Inline::CommentRangeEnd(id) => {
                w.empty("w:commentRangeEnd", &[("w:id", &id.to_string())]);
            }
        }
    }
    w.close("w:p");
}

fn write_run_format(w: &mut XmlWriter, format: &RunFormat) {
    if format.is_empty() {
        return;
    }
    w.open("w:rPr", &[]);
    if let Some(style) = &format.style {
        w.val("w:rStyle", style);
    }
    if let Some(font) = &format.font {
        w.empty(
            "w:rFonts",
            &[("w:ascii", font), ("w:hAnsi", font), ("w:cs", font)],
        );
    }
    write_toggle(w, "w:b", format.bold);
    write_toggle(w, "w:i", format.italic);
    write_toggle(w, "w:strike", format.strike);
    if let Some(color) = &format.color {
        w.val("w:color", color);
    }
    if let Some(size) = format.size {
        w.val("w:sz", size);
        w.val("w:szCs", size);
    }
    if let Some(highlight) = &format.highlight {
        w.val("w:highlight", highlight);
    }
    if let Some(underline) = &format.underline {
        w.val("w:u", underline);
    }
    if let Some(vertical_align) = format.vertical_align {
        w.val("w:vertAlign", vertical_align.as_xml());
    }
    w.close("w:rPr");
}

fn write_run(w: &mut XmlWriter, run: &Run) {
    w.open("w:r", &[]);
    write_run_format(w, &run.format);
    for item in &run.content {
        match item {
            RunContent::Text(text) => w.element("w:t", &[("xml:space", "preserve")], text),
            RunContent::Tab => w.empty("w:tab", &[]),
            RunContent::Break(BreakKind::Line) => w.empty("w:br", &[]),
            RunContent::Break(BreakKind::Page) => w.empty("w:br", &[("w:type", "page")]),
            RunContent::Break(BreakKind::Column) => w.empty("w:br", &[("w:type", "column")]),
            RunContent::Drawing(drawing) => write_drawing(w, drawing),
            RunContent::FieldChar(kind) => {
                let kind = match kind {
                    FieldCharKind::Begin => "begin",
                    FieldCharKind::Separate => "separate",
                    FieldCharKind::End => "end",
                };
                w.empty("w:fldChar", &[("w:fldCharType", kind)]);
            }
            RunContent::InstrText(instr) => {
                w.element("w:instrText", &[("xml:space", "preserve")], instr);
            }
            RunContent::CommentReference(id) => {
                w.empty("w:commentReference", &[("w:id", &id.to_string())]);
            }
        }
    }
    w.close("w:r");
}

fn write_drawing(w: &mut XmlWriter, drawing: &Drawing) {
    let cx = drawing.width_emu.to_string();
    let cy = drawing.height_emu.to_string();
    let id = drawing.id.to_string();
    w.open("w:drawing", &[]);
    w.open(
        "wp:inline",
        &[("distT", "0"), ("distB", "0"), ("distL", "0"), ("distR", "0")],
    );
    w.empty("wp:extent", &[("cx", &cx), ("cy", &cy)]);
    w.empty("wp:effectExtent", &[("l", "0"), ("t", "0"), ("r", "0"), ("b", "0")]);
    let mut doc_pr = vec![("id", id.as_str()), ("name", drawing.name.as_str())];
    if let Some(description) = &drawing.description {
        doc_pr.push(("descr", description.as_str()));
    }
    w.empty("wp:docPr", &doc_pr);
    w.open("wp:cNvGraphicFramePr", &[]);
    w.empty("a:graphicFrameLocks", &[("noChangeAspect", "1")]);
    w.close("wp:cNvGraphicFramePr");
    w.open("a:graphic", &[]);
    w.open("a:graphicData", &[("uri", NS_PIC)]);
    w.open("pic:pic", &[]);
    w.open("pic:nvPicPr", &[]);
    w.empty("pic:cNvPr", &[("id", "0"), ("name", drawing.name.as_str())]);
    w.empty("pic:cNvPicPr", &[]);
    w.close("pic:nvPicPr");
    w.open("pic:blipFill", &[]);
    w.empty("a:blip", &[("r:embed", drawing.rel_id.as_str())]);
    w.open("a:stretch", &[]);
    w.empty("a:fillRect", &[]);
    w.close("a:stretch");
    w.close("pic:blipFill");
    w.open("pic:spPr", &[]);
    w.open("a:xfrm", &[]);
    w.empty("a:off", &[("x", "0"), ("y", "0")]);
    w.empty("a:ext", &[("cx", &cx), ("cy", &cy)]);
    w.close("a:xfrm");
    w.open("a:prstGeom", &[("prst", "rect")]);
    w.empty("a:avLst", &[]);
    w.close("a:prstGeom");
    w.close("pic:spPr");
    w.close("pic:pic");
    w.close("a:graphicData");
    w.close("a:graphic");
    w.close("wp:inline");
    w.close("w:drawing");
}

fn write_borders(w: &mut XmlWriter, style: &str) {
    w.open("w:tblBorders", &[]);
    for edge in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
        if style == "none" || style == "nil" {
            w.val(edge, style);
        } else {
            w.empty(
                edge,
                &[("w:val", style), ("w:sz", "4"), ("w:space", "0"), ("w:color", "auto")],
            );
        }
    }
    w.close("w:tblBorders");
}

fn write_table(w: &mut XmlWriter, table: &Table) {
    w.open("w:tbl", &[]);
    w.open("w:tblPr", &[]);
    if let Some(style) = &table.style {
        w.val("w:tblStyle", style);
    }
    w.empty("w:tblW", &[("w:w", "0"), ("w:type", "auto")]);
    if let Some(alignment) = table.alignment {
        w.val("w:jc", alignment.as_xml());
    }
    if let Some(borders) = &table.borders {
        write_borders(w, borders);
    }
    w.close("w:tblPr");
    w.open("w:tblGrid", &[]);
    for width in &table.grid {
        w.empty("w:gridCol", &[("w:w", &width.to_string())]);
    }
    w.close("w:tblGrid");
    for row in &table.rows {
        w.open("w:tr", &[]);
        if row.header || row.height.is_some() {
            w.open("w:trPr", &[]);
            if let Some(height) = row.height {
                w.val("w:trHeight", height);
            }
            if row.header {
                w.empty("w:tblHeader", &[]);
            }
            w.close("w:trPr");
        }
        for cell in &row.cells {
            write_cell(w, cell);
        }
        w.close("w:tr");
    }
    w.close("w:tbl");
}

fn write_cell(w: &mut XmlWriter, cell: &TableCell) {
    w.open("w:tc", &[]);
    let has_properties =
        cell.width.is_some() || cell.grid_span > 1 || cell.v_merge.is_some() || cell.shading.is_some();
    if has_properties {
        w.open("w:tcPr", &[]);
        if let Some(width) = cell.width {
            w.empty("w:tcW", &[("w:w", &width.to_string()), ("w:type", "dxa")]);
        }
        if cell.grid_span > 1 {
            w.val("w:gridSpan", cell.grid_span);
        }
        match cell.v_merge {
            Some(VMerge::Restart) => w.val("w:vMerge", "restart"),
            Some(VMerge::Continue) => w.empty("w:vMerge", &[]),
            None => {}
        }
        if let Some(fill) = &cell.shading {
            w.empty("w:shd", &[("w:val", "clear"), ("w:color", "auto"), ("w:fill", fill)]);
        }
        w.close("w:tcPr");
    }
    write_blocks(w, &cell.blocks);
    if !matches!(cell.blocks.last(), Some(Block::Paragraph(_))) {
        w.empty("w:p", &[]);
    }
    w.close("w:tc");
}

fn write_section(w: &mut XmlWriter, section: &SectionProperties) {
    w.open("w:sectPr", &[]);
    for (name, refs) in [
        ("w:headerReference", &section.headers),
        ("w:footerReference", &section.footers),
    ] {
        for reference in refs {
            w.empty(
                name,
                &[("w:type", reference.kind.as_xml()), ("r:id", &reference.rel_id)],
            );
        }
    }
    if let Some(start) = section.start {
        w.val("w:type", start.as_xml());
    }
    let width = section.page_width.to_string();
    let height = section.page_height.to_string();
    let mut size = vec![("w:w", width.as_str()), ("w:h", height.as_str())];
    if section.orientation == Orientation::Landscape {
        size.push(("w:orient", "landscape"));
    }
    w.empty("w:pgSz", &size);
    let margins = section.margins;
    let values = [
        ("w:top", margins.top.to_string()),
        ("w:right", margins.right.to_string()),
        ("w:bottom", margins.bottom.to_string()),
        ("w:left", margins.left.to_string()),
        ("w:header", margins.header.to_string()),
        ("w:footer", margins.footer.to_string()),
        ("w:gutter", margins.gutter.to_string()),
    ];
    let attrs: Vec<(&str, &str)> = values
        .iter()
        .map(|(name, value)| (*name, value.as_str()))
        .collect();
    w.empty("w:pgMar", &attrs);
    match section.columns {
        Some(count) => w.empty("w:cols", &[("w:num", &count.to_string()), ("w:space", "720")]),
        None => w.empty("w:cols", &[("w:space", "720")]),
    }
    if section.title_page {
        w.empty("w:titlePg", &[]);
    }
    w.close("w:sectPr");
}

fn styles_xml(styles: &Styles) -> String {
    let mut w = XmlWriter::new();
    w.open("w:styles", &[("xmlns:w", NS_W), ("xmlns:r", NS_R)]);
    w.open("w:docDefaults", &[]);
    w.open("w:rPrDefault", &[]);
    if styles.default_run.is_empty() {
        w.empty("w:rPr", &[]);
    } else {
        write_run_format(&mut w, &styles.default_run);
    }
    w.close("w:rPrDefault");
    w.open("w:pPrDefault", &[]);
    if paragraph_format_is_empty(&styles.default_paragraph) {
        w.empty("w:pPr", &[]);
    } else {
        write_paragraph_format(&mut w, &styles.default_paragraph);
    }
    w.close("w:pPrDefault");
    w.close("w:docDefaults");
    for style in &styles.definitions {
        let mut attrs = vec![
            ("w:type", style.style_type.as_xml()),
            ("w:styleId", style.style_id.as_str()),
        ];
        if style.is_default {
            attrs.push(("w:default", "1"));
        }
        if style.custom {
            attrs.push(("w:customStyle", "1"));
        }
        w.open("w:style", &attrs);
        w.val("w:name", &style.name);
        if let Some(based_on) = &style.based_on {
            w.val("w:basedOn", based_on);
        }
        if let Some(next) = &style.next {
            w.val("w:next", next);
        }
        if let Some(link) = &style.link {
            w.val("w:link", link);
        }
        if let Some(priority) = style.ui_priority {
            w.val("w:uiPriority", priority);
        }
        if style.hidden {
            w.empty("w:semiHidden", &[]);
        }
        if style.quick_format {
            w.empty("w:qFormat", &[]);
        }
        write_paragraph_format(&mut w, &style.paragraph);
        write_run_format(&mut w, &style.run);
        if let Some(borders) = &style.table_borders {
            w.open("w:tblPr", &[]);
            write_borders(&mut w, borders);
            w.close("w:tblPr");
        }
        w.close("w:style");
    }
    w.close("w:styles");
    w.finish()
}

fn numbering_xml(numbering: &Numbering) -> String {
    let mut w = XmlWriter::new();
    w.open("w:numbering", &[("xmlns:w", NS_W)]);
    for definition in &numbering.abstract_nums {
        w.open("w:abstractNum", &[("w:abstractNumId", &definition.id.to_string())]);
        w.val(
            "w:multiLevelType",
            if definition.multi_level {
                "hybridMultilevel"
            } else {
                "singleLevel"
            },
        );
        for level in &definition.levels {
            w.open("w:lvl", &[("w:ilvl", &level.level.to_string())]);
            w.val("w:start", level.start);
            w.val("w:numFmt", &level.format);
            w.val("w:lvlText", &level.text);
            w.val("w:lvlJc", "left");
            w.open("w:pPr", &[]);
            w.empty(
                "w:ind",
                &[
                    ("w:left", &level.indent_left.to_string()),
                    ("w:hanging", &level.hanging.to_string()),
                ],
            );
            w.close("w:pPr");
            if let Some(font) = &level.font {
                w.open("w:rPr", &[]);
                w.empty(
                    "w:rFonts",
                    &[("w:ascii", font), ("w:hAnsi", font), ("w:hint", "default")],
                );
                w.close("w:rPr");
            }
            w.close("w:lvl");
        }
        w.close("w:abstractNum");
    }
    for instance in &numbering.instances {
        w.open("w:num", &[("w:numId", &instance.num_id.to_string())]);
        w.val("w:abstractNumId", instance.abstract_id);
        if let Some(start) = instance.start_override {
            w.open("w:lvlOverride", &[("w:ilvl", "0")]);
            w.val("w:startOverride", start);
            w.close("w:lvlOverride");
        }
        w.close("w:num");
    }
    w.close("w:numbering");
    w.finish()
}

fn comments_xml(doc: &WordDocument) -> String {
    let mut w = XmlWriter::new();
    w.open("w:comments", &BODY_NAMESPACES);
    for comment in &doc.comments {
        let id = comment.id.to_string();
        let mut attrs = vec![("w:id", id.as_str()), ("w:author", comment.author.as_str())];
        if let Some(date) = &comment.date {
            attrs.push(("w:date", date.as_str()));
        }
        if let Some(initials) = &comment.initials {
            attrs.push(("w:initials", initials.as_str()));
        }
        w.open("w:comment", &attrs);
        if comment.paragraphs.is_empty() {
            w.empty("w:p", &[]);
        }
        for paragraph in &comment.paragraphs {
            write_paragraph(&mut w, paragraph);
        }
        w.close("w:comment");
    }
    w.close("w:comments");
    w.finish()
}

fn core_xml(core: &CoreProperties) -> String {
    let mut w = XmlWriter::new();
    w.open(
        "cp:coreProperties",
        &[
            ("xmlns:cp", NS_CP),
            ("xmlns:dc", NS_DC),
            ("xmlns:dcterms", NS_DCTERMS),
            ("xmlns:xsi", NS_XSI),
        ],
    );
    let revision = core.revision.map(|revision| revision.to_string());
    let plain = [
        ("dc:title", core.title.as_deref()),
        ("dc:subject", core.subject.as_deref()),
        ("dc:creator", core.author.as_deref()),
        ("cp:keywords", core.keywords.as_deref()),
        ("dc:description", core.comments.as_deref()),
        ("cp:lastModifiedBy", core.last_modified_by.as_deref()),
        ("cp:revision", revision.as_deref()),
        ("cp:category", core.category.as_deref()),
        ("cp:contentStatus", core.content_status.as_deref()),
        ("dc:language", core.language.as_deref()),
    ];
    for (name, value) in plain {
        if let Some(value) = value {
            w.element(name, &[], value);
        }
    }
    for (name, value) in [
        ("dcterms:created", core.created.as_deref()),
        ("dcterms:modified", core.modified.as_deref()),
    ] {
        if let Some(value) = value {
            w.element(name, &[("xsi:type", "dcterms:W3CDTF")], value);
        }
    }
    w.close("cp:coreProperties");
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Alignment, HeaderFooterType, ListKind, SectionStart};
    use crate::editor::{ImageInsert, TextFormat};
    use crate::editor::media::tests::png;
    use crate::parsers::DocxParser;
    use crate::parsers::docx::tests::sample;

    fn round_trip(doc: &WordDocument) -> WordDocument {
        DocxParser::parse(&write(doc).unwrap()).unwrap()
    }

    #[test]
    fn blank_document_round_trips() {
        let doc = WordDocument::new();
        assert_eq!(round_trip(&doc), doc);
    }

    #[test]
    fn edited_document_round_trips() {
        let mut doc = WordDocument::new();
        doc.add_heading("Plan", 1).unwrap();
        doc.add_paragraph("Body <text> & more", None, Some(Alignment::Justify))
            .unwrap();
        doc.add_run(
            1,
            " bold",
            &TextFormat {
                bold: Some(true),
                font_size: Some(14.0),
                color: Some("#00ff00".to_string()),
                ..TextFormat::default()
            },
        )
        .unwrap();
        let data = vec![vec!["a".to_string(), "b".to_string()]];
        doc.add_table(2, 2, Some("TableGrid"), Some(&data), None).unwrap();
        doc.create_list(&["one".to_string(), "two".to_string()], ListKind::Numbered, None)
            .unwrap();
        doc.add_comment(0, "Ana", "Looks good", None).unwrap();
        doc.add_bookmark(0, "plan").unwrap();
        doc.add_hyperlink(1, " site", "https://example.com").unwrap();
        doc.set_header(0, "Header text", HeaderFooterType::Default).unwrap();
        doc.add_page_numbers(0, Alignment::Center, HeaderFooterKind::Footer).unwrap();
        doc.insert_image(&png(40, 20), &ImageInsert::default()).unwrap();
        doc.add_section(SectionStart::NextPage);
        doc.core.title = Some("Plan".to_string());

        let reparsed = round_trip(&doc);
        assert_eq!(reparsed, doc);
    }

    #[test]
    fn parsed_package_round_trips() {
        let doc = DocxParser::parse(&sample()).unwrap();
        let reparsed = round_trip(&doc);
        assert_eq!(reparsed.body, doc.body);
        assert_eq!(reparsed.section, doc.section);
        assert_eq!(reparsed.headers_footers, doc.headers_footers);
        assert_eq!(reparsed.core, doc.core);
        assert_eq!(
            reparsed.parts.get("word/settings.xml"),
            doc.parts.get("word/settings.xml")
        );
    }

    #[test]
    fn content_types_cover_media() {
        let mut doc = WordDocument::new();
        doc.insert_image(&png(4, 4), &ImageInsert::default()).unwrap();
        let bytes = write(&doc).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut types = String::new();
        std::io::Read::read_to_string(
            &mut archive.by_name(package::CONTENT_TYPES_PART).unwrap(),
            &mut types,
        )
        .unwrap();
        assert!(types.contains("Extension=\"png\" ContentType=\"image/png\""));
        assert!(types.contains("PartName=\"/word/document.xml\""));
        assert!(!types.contains("PartName=\"/_rels/.rels\""));
    }
}
