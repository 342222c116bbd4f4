//! Read-only MCP resources. Each stored document is exposed as a set of
//! views under `docx://documents/{document_id}/{view}`.

use std::fmt;
use std::str::FromStr;

use docx_core::control::DocumentPage;
use docx_core::document::WordDocument;
use docx_core::store::DocumentQuery;
use docx_store::models::DocumentRecord;
use rmcp::ErrorData;
use rmcp::model::{
    AnnotateAble,
    ListResourceTemplatesResult,
    ListResourcesResult,
    RawResource,
    RawResourceTemplate,
    ReadResourceResult,
    Resource,
    ResourceContents,
};
use serde::Serialize;
use serde_json::json;
use surrealdb::Connection;

use crate::{DocxMcp, helpers};

const URI_PREFIX: &str = "docx://documents/";
const JSON_MIME: &str = "application/json";
const TEXT_MIME: &str = "text/plain";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentView {
    Content,
    Structure,
    Metadata,
    Paragraphs,
    Tables,
    Styles,
    Headings,
    Comments,
    Bookmarks,
}

impl DocumentView {
    pub const ALL: [Self; 9] = [
        Self::Content,
        Self::Structure,
        Self::Metadata,
        Self::Paragraphs,
        Self::Tables,
        Self::Styles,
        Self::Headings,
        Self::Comments,
        Self::Bookmarks,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Structure => "structure",
            Self::Metadata => "metadata",
            Self::Paragraphs => "paragraphs",
            Self::Tables => "tables",
            Self::Styles => "styles",
            Self::Headings => "headings",
            Self::Comments => "comments",
            Self::Bookmarks => "bookmarks",
        }
    }

    const fn mime_type(self) -> &'static str {
        match self {
            Self::Content => TEXT_MIME,
            _ => JSON_MIME,
        }
    }

    const fn describe(self) -> &'static str {
        match self {
            Self::Content => "Plain text of the document body",
            Self::Structure => "Counts of paragraphs, tables, sections, images and comments",
            Self::Metadata => "Stored record and core properties",
            Self::Paragraphs => "Top-level paragraphs with style and alignment",
            Self::Tables => "Tables with their dimensions",
            Self::Styles => "Style definitions",
            Self::Headings => "Heading outline",
            Self::Comments => "Comments anchored in the document",
            Self::Bookmarks => "Bookmarks and the paragraphs they mark",
        }
    }
}

impl fmt::Display for DocumentView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentView {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|view| view.as_str() == value)
            .ok_or_else(|| format!("unknown document view: {value}"))
    }
}

pub fn resource_uri(document_id: &str, view: DocumentView) -> String {
    format!("{URI_PREFIX}{document_id}/{view}")
}

/// Splits a resource URI into its document id and view.
pub fn parse_uri(uri: &str) -> Option<(&str, DocumentView)> {
    let rest = uri.strip_prefix(URI_PREFIX)?;
    let (document_id, view) = rest.split_once('/')?;
    if document_id.is_empty() {
        return None;
    }
    Some((document_id, view.parse().ok()?))
}

fn document_resources(record: &DocumentRecord) -> impl Iterator<Item = Resource> + '_ {
    DocumentView::ALL.into_iter().map(move |view| {
        let mut resource = RawResource::new(
            resource_uri(&record.document_id, view),
            format!("{} ({view})", record.title),
        );
        resource.description = Some(view.describe().to_string());
        resource.mime_type = Some(view.mime_type().to_string());
        resource.no_annotation()
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ErrorData> {
    serde_json::to_string_pretty(value)
        .map_err(|err| ErrorData::internal_error(err.to_string(), None))
}

/// Renders every view except `Metadata`, which also needs the stored record.
fn render_view(doc: &WordDocument, view: DocumentView) -> Result<String, ErrorData> {
    match view {
        DocumentView::Content => Ok(doc.all_text()),
        DocumentView::Structure => to_json(&doc.structure()),
        DocumentView::Metadata => to_json(&doc.core),
        DocumentView::Paragraphs => to_json(&doc.paragraph_infos()),
        DocumentView::Tables => to_json(&doc.table_infos()),
        DocumentView::Styles => to_json(&doc.styles_list(None)),
        DocumentView::Headings => to_json(&doc.headings()),
        DocumentView::Comments => to_json(&doc.comments_list()),
        DocumentView::Bookmarks => to_json(&doc.bookmarks()),
    }
}

impl<C: Connection> DocxMcp<C> {
    /// Lists the views of one page of documents. The cursor is the number of
    /// documents already listed.
    pub(crate) async fn list_document_resources(
        &self,
        cursor: Option<&str>,
    ) -> Result<ListResourcesResult, ErrorData> {
        let skip = match cursor {
            Some(cursor) => cursor
                .parse::<usize>()
                .map_err(|_| helpers::invalid_params(format!("invalid cursor: {cursor}")))?,
            None => 0,
        };
        let DocumentPage {
            items, total, limit, ..
        } = self
            .control
            .list_documents(DocumentQuery::default(), skip, None)
            .await
            .map_err(helpers::map_err)?;
        let next = skip + items.len();
        let resources = items.iter().flat_map(document_resources).collect();
        let mut result = ListResourcesResult::with_all_items(resources);
        if items.len() == limit && next < total {
            result.next_cursor = Some(next.to_string());
        }
        Ok(result)
    }

    pub(crate) fn resource_templates() -> ListResourceTemplatesResult {
        let templates = DocumentView::ALL
            .into_iter()
            .map(|view| {
                RawResourceTemplate {
                    uri_template: format!("{URI_PREFIX}{{document_id}}/{view}"),
                    name: format!("document-{view}"),
                    title: None,
                    description: Some(view.describe().to_string()),
                    mime_type: Some(view.mime_type().to_string()),
                    icons: None,
                }
                .no_annotation()
            })
            .collect();
        ListResourceTemplatesResult::with_all_items(templates)
    }

    pub(crate) async fn read_document_resource(&self, uri: &str) -> Result<ReadResourceResult, ErrorData> {
        let Some((document_id, view)) = parse_uri(uri) else {
            return Err(ErrorData::resource_not_found(
                format!("unknown resource: {uri}"),
                None,
            ));
        };
        let text = if view == DocumentView::Metadata {
            let record = self
                .control
                .get_document(document_id)
                .await
                .map_err(helpers::map_err)?;
            let properties = self.read(document_id, |doc| Ok(doc.core.clone())).await?;
            to_json(&json!({ "document": record, "properties": properties }))?
        } else {
            self.read(document_id, |doc| Ok(render_view(doc, view))).await??
        };
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::TextResourceContents {
                uri: uri.to_string(),
                mime_type: Some(view.mime_type().to_string()),
                text,
                meta: None,
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use docx_core::control::CreateDocumentRequest;
    use rmcp::model::ErrorCode;
    use serde_json::Value;

    use super::*;
    use crate::test_support::build_server;

    #[test]
    fn uris_name_a_document_and_view() {
        let uri = resource_uri("doc-1", DocumentView::Headings);
        assert_eq!(uri, "docx://documents/doc-1/headings");
        assert_eq!(parse_uri(&uri), Some(("doc-1", DocumentView::Headings)));
        assert_eq!(parse_uri("docx://documents/doc-1/pictures"), None);
        assert_eq!(parse_uri("docx://documents//content"), None);
        assert_eq!(parse_uri("file:///tmp/doc-1/content"), None);
    }

    fn text_of(result: &ReadResourceResult) -> &str {
        match &result.contents[0] {
            ResourceContents::TextResourceContents { text, .. } => text,
            ResourceContents::BlobResourceContents { .. } => panic!("expected text contents"),
        }
    }

    #[tokio::test]
    async fn documents_are_listed_and_read_as_resources() {
        let (server, _dir) = build_server("resources").await;
        let record = server
            .control()
            .create_document(CreateDocumentRequest {
                title: "Minutes".to_string(),
                ..Default::default()
            })
            .await
            .expect("create_document should succeed");
        let document_id = record.document_id;
        server
            .edit(&document_id, |doc| {
                doc.add_heading("Attendees", 1)?;
                doc.add_paragraph("Ana, Bo", None, None)
            })
            .await
            .expect("edit should succeed");

        let listed = server
            .list_document_resources(None)
            .await
            .expect("list should succeed");
        assert_eq!(listed.resources.len(), DocumentView::ALL.len());
        assert!(listed.next_cursor.is_none());
        assert!(
            listed
                .resources
                .iter()
                .any(|resource| resource.raw.uri == resource_uri(&document_id, DocumentView::Content))
        );

        let content = server
            .read_document_resource(&resource_uri(&document_id, DocumentView::Content))
            .await
            .expect("content should be readable");
        assert!(text_of(&content).contains("Ana, Bo"));

        let headings = server
            .read_document_resource(&resource_uri(&document_id, DocumentView::Headings))
            .await
            .expect("headings should be readable");
        let headings: Value = serde_json::from_str(text_of(&headings)).expect("headings are JSON");
        assert_eq!(headings[0]["text"], "Attendees");

        let metadata = server
            .read_document_resource(&resource_uri(&document_id, DocumentView::Metadata))
            .await
            .expect("metadata should be readable");
        let metadata: Value = serde_json::from_str(text_of(&metadata)).expect("metadata is JSON");
        assert_eq!(metadata["document"]["title"], "Minutes");

        let templates = DocxMcp::<surrealdb::engine::local::Db>::resource_templates();
        assert_eq!(templates.resource_templates.len(), DocumentView::ALL.len());
        assert_eq!(
            templates.resource_templates[0].raw.uri_template,
            "docx://documents/{document_id}/content"
        );
    }

    #[tokio::test]
    async fn unknown_resources_are_not_found() {
        let (server, _dir) = build_server("resources_missing").await;
        let err = server
            .read_document_resource("docx://documents/nope/content")
            .await
            .expect_err("missing document should fail");
        assert_eq!(err.code, ErrorCode::RESOURCE_NOT_FOUND);
        let err = server
            .read_document_resource("docx://elsewhere")
            .await
            .expect_err("malformed uri should fail");
        assert_eq!(err.code, ErrorCode::RESOURCE_NOT_FOUND);
        let err = server
            .list_document_resources(Some("later"))
            .await
            .expect_err("bad cursor should fail");
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
    }
}
