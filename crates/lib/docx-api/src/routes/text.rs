use axum::Router;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use docx_core::document::Alignment;
use docx_core::editor::{
    ParagraphFormatting,
    ParagraphInfo,
    ParagraphUpdate,
    TextFormat,
    TextMatch,
};
use serde::Deserialize;
use serde_json::{Value, json};
use surrealdb::Connection;

use super::non_blank;
use crate::{ApiError, ApiJson, AppState};

pub(super) fn routes<C>() -> Router<AppState<C>>
where
    C: Connection + Send + Sync + 'static,
{
    Router::new()
        .route(
            "/documents/:document_id/paragraphs",
            get(list_paragraphs::<C>).post(add_paragraph::<C>),
        )
        .route(
            "/documents/:document_id/paragraphs/:index",
            get(get_paragraph::<C>)
                .patch(update_paragraph::<C>)
                .delete(delete_paragraph::<C>),
        )
        .route(
            "/documents/:document_id/paragraphs/:index/runs",
            post(add_run::<C>),
        )
        .route(
            "/documents/:document_id/paragraphs/:index/insert",
            post(insert_text::<C>),
        )
        .route(
            "/documents/:document_id/paragraphs/:index/text-format",
            put(format_text::<C>),
        )
        .route(
            "/documents/:document_id/paragraphs/:index/formatting",
            put(format_paragraph::<C>),
        )
        .route("/documents/:document_id/headings", post(add_heading::<C>))
        .route("/documents/:document_id/page-breaks", post(add_page_break::<C>))
        .route("/documents/:document_id/text", get(get_text::<C>))
        .route("/documents/:document_id/text/find", post(find_text::<C>))
        .route("/documents/:document_id/text/replace", post(replace_text::<C>))
        .route(
            "/documents/:document_id/text/regex-replace",
            post(regex_replace::<C>),
        )
        .route("/documents/:document_id/text/highlight", post(highlight_text::<C>))
}

#[derive(Debug, Deserialize)]
struct AddParagraphBody {
    text: String,
    style: Option<String>,
    alignment: Option<Alignment>,
    /// Insert before this index instead of appending.
    position: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct AddRunBody {
    text: String,
    #[serde(default)]
    format: TextFormat,
}

#[derive(Debug, Deserialize)]
struct InsertTextBody {
    offset: usize,
    text: String,
    format: Option<TextFormat>,
}

/// Formats one run, a character range, or the whole paragraph.
#[derive(Debug, Deserialize)]
struct FormatTextBody {
    #[serde(default)]
    format: TextFormat,
    run_index: Option<usize>,
    start: Option<usize>,
    end: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct HeadingBody {
    text: String,
    #[serde(default = "default_heading_level")]
    level: u8,
}

const fn default_heading_level() -> u8 {
    1
}

#[derive(Debug, Deserialize)]
struct FindBody {
    query: String,
    #[serde(default)]
    case_sensitive: bool,
    #[serde(default)]
    whole_word: bool,
    /// Treat `query` as a regular expression.
    #[serde(default)]
    regex: bool,
}

#[derive(Debug, Deserialize)]
struct ReplaceBody {
    find: String,
    replace: String,
    #[serde(default)]
    case_sensitive: bool,
    #[serde(default)]
    whole_word: bool,
}

#[derive(Debug, Deserialize)]
struct RegexReplaceBody {
    pattern: String,
    /// May refer to capture groups as `$1` or `$name`.
    replacement: String,
    #[serde(default)]
    case_sensitive: bool,
}

#[derive(Debug, Deserialize)]
struct HighlightBody {
    query: String,
    #[serde(default = "default_highlight")]
    color: String,
    #[serde(default)]
    case_sensitive: bool,
}

fn default_highlight() -> String {
    "yellow".to_string()
}

async fn list_paragraphs<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
) -> Result<Json<Vec<ParagraphInfo>>, ApiError> {
    let paragraphs = state
        .read(&document_id, |doc| Ok(doc.paragraph_infos()))
        .await?;
    Ok(Json(paragraphs))
}

async fn add_paragraph<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    ApiJson(body): ApiJson<AddParagraphBody>,
) -> Result<(StatusCode, Json<ParagraphInfo>), ApiError> {
    let style = non_blank(body.style);
    let paragraph = state
        .edit(&document_id, |doc| {
            let index = match body.position {
                Some(position) => {
                    doc.insert_paragraph(position, &body.text, style.as_deref(), body.alignment)?
                }
                None => doc.add_paragraph(&body.text, style.as_deref(), body.alignment)?,
            };
            doc.paragraph_info(index)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(paragraph)))
}

async fn get_paragraph<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, index)): Path<(String, usize)>,
) -> Result<Json<ParagraphInfo>, ApiError> {
    let paragraph = state
        .read(&document_id, |doc| doc.paragraph_info(index))
        .await?;
    Ok(Json(paragraph))
}

async fn update_paragraph<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, index)): Path<(String, usize)>,
    ApiJson(update): ApiJson<ParagraphUpdate>,
) -> Result<Json<ParagraphInfo>, ApiError> {
    let paragraph = state
        .edit(&document_id, |doc| {
            doc.update_paragraph(index, &update)?;
            doc.paragraph_info(index)
        })
        .await?;
    Ok(Json(paragraph))
}

async fn delete_paragraph<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, index)): Path<(String, usize)>,
) -> Result<Json<Value>, ApiError> {
    let text = state
        .edit(&document_id, |doc| doc.delete_paragraph(index))
        .await?;
    Ok(Json(json!({ "deleted_index": index, "text": text })))
}

async fn add_run<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, index)): Path<(String, usize)>,
    ApiJson(body): ApiJson<AddRunBody>,
) -> Result<Json<ParagraphInfo>, ApiError> {
    let paragraph = state
        .edit(&document_id, |doc| {
            doc.add_run(index, &body.text, &body.format)?;
            doc.paragraph_info(index)
        })
        .await?;
    Ok(Json(paragraph))
}

async fn insert_text<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, index)): Path<(String, usize)>,
    ApiJson(body): ApiJson<InsertTextBody>,
) -> Result<Json<ParagraphInfo>, ApiError> {
    let paragraph = state
        .edit(&document_id, |doc| {
            doc.insert_text(index, body.offset, &body.text, body.format.as_ref())?;
            doc.paragraph_info(index)
        })
        .await?;
    Ok(Json(paragraph))
}

async fn format_text<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, index)): Path<(String, usize)>,
    ApiJson(body): ApiJson<FormatTextBody>,
) -> Result<Json<ParagraphInfo>, ApiError> {
    if body.run_index.is_none() && body.start.is_some() != body.end.is_some() {
        return Err(ApiError::bad_request("start and end must be given together"));
    }
    let paragraph = state
        .edit(&document_id, |doc| {
            match (body.run_index, body.start, body.end) {
                (Some(run_index), _, _) => doc.format_run(index, run_index, &body.format)?,
                (None, Some(start), Some(end)) => {
                    doc.format_text_range(index, start, end, &body.format)?;
                }
                _ => {
                    doc.format_paragraph_text(index, &body.format)?;
                }
            }
            doc.paragraph_info(index)
        })
        .await?;
    Ok(Json(paragraph))
}

async fn format_paragraph<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, index)): Path<(String, usize)>,
    ApiJson(formatting): ApiJson<ParagraphFormatting>,
) -> Result<Json<ParagraphInfo>, ApiError> {
    let paragraph = state
        .edit(&document_id, |doc| {
            doc.format_paragraph(index, &formatting)?;
            doc.paragraph_info(index)
        })
        .await?;
    Ok(Json(paragraph))
}

async fn add_heading<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    ApiJson(body): ApiJson<HeadingBody>,
) -> Result<(StatusCode, Json<ParagraphInfo>), ApiError> {
    let paragraph = state
        .edit(&document_id, |doc| {
            let index = doc.add_heading(&body.text, body.level)?;
            doc.paragraph_info(index)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(paragraph)))
}

async fn add_page_break<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let index = state
        .edit(&document_id, |doc| Ok(doc.add_page_break()))
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "paragraph_index": index }))))
}

async fn get_text<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let text = state.read(&document_id, |doc| Ok(doc.all_text())).await?;
    Ok(Json(json!({ "document_id": document_id, "text": text })))
}

async fn find_text<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    ApiJson(body): ApiJson<FindBody>,
) -> Result<Json<Vec<TextMatch>>, ApiError> {
    let matches = state
        .read(&document_id, |doc| {
            if body.regex {
                doc.regex_search(&body.query, body.case_sensitive)
            } else {
                doc.find_text(&body.query, body.case_sensitive, body.whole_word)
            }
        })
        .await?;
    Ok(Json(matches))
}

async fn replace_text<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    ApiJson(body): ApiJson<ReplaceBody>,
) -> Result<Json<Value>, ApiError> {
    let replacements = state
        .edit(&document_id, |doc| {
            doc.replace_text(&body.find, &body.replace, body.case_sensitive, body.whole_word)
        })
        .await?;
    Ok(Json(json!({ "replacements": replacements })))
}

async fn regex_replace<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    ApiJson(body): ApiJson<RegexReplaceBody>,
) -> Result<Json<Value>, ApiError> {
    let replacements = state
        .edit(&document_id, |doc| {
            doc.regex_replace(&body.pattern, &body.replacement, body.case_sensitive)
        })
        .await?;
    Ok(Json(json!({ "replacements": replacements })))
}

async fn highlight_text<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    ApiJson(body): ApiJson<HighlightBody>,
) -> Result<Json<Value>, ApiError> {
    let highlighted = state
        .edit(&document_id, |doc| {
            doc.highlight_text(&body.query, &body.color, body.case_sensitive)
        })
        .await?;
    Ok(Json(json!({ "highlighted": highlighted })))
}
