use axum::Router;
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use docx_core::document::{
    Alignment,
    HeaderFooterKind,
    HeaderFooterType,
    Orientation,
    PageSize,
    SectionStart,
};
use docx_core::editor::{BookmarkInfo, HeaderFooterInfo, HeadingInfo, HyperlinkInfo, SectionInfo};
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
            "/documents/:document_id/sections",
            get(list_sections::<C>).post(add_section::<C>),
        )
        .route(
            "/documents/:document_id/sections/:section",
            get(get_section::<C>).patch(update_section::<C>),
        )
        .route(
            "/documents/:document_id/sections/:section/header",
            get(get_header::<C>).put(set_header::<C>),
        )
        .route(
            "/documents/:document_id/sections/:section/footer",
            get(get_footer::<C>).put(set_footer::<C>),
        )
        .route(
            "/documents/:document_id/sections/:section/page-numbers",
            post(add_page_numbers::<C>),
        )
        .route("/documents/:document_id/outline", get(outline::<C>))
        .route("/documents/:document_id/toc", post(add_table_of_contents::<C>))
        .route(
            "/documents/:document_id/bookmarks",
            get(list_bookmarks::<C>).post(add_bookmark::<C>),
        )
        .route(
            "/documents/:document_id/bookmarks/:name",
            delete(delete_bookmark::<C>),
        )
        .route(
            "/documents/:document_id/hyperlinks",
            get(list_hyperlinks::<C>).post(add_hyperlink::<C>),
        )
}

#[derive(Debug, Deserialize)]
struct AddSectionBody {
    start: Option<SectionStart>,
}

/// Page setup changes. Margins are in inches; absent values are unchanged.
#[derive(Debug, Default, Deserialize)]
struct SectionUpdate {
    orientation: Option<Orientation>,
    page_size: Option<PageSize>,
    top: Option<f64>,
    bottom: Option<f64>,
    left: Option<f64>,
    right: Option<f64>,
}

impl SectionUpdate {
    const fn has_margins(&self) -> bool {
        self.top.is_some() || self.bottom.is_some() || self.left.is_some() || self.right.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct HeaderTypeQuery {
    header_type: Option<HeaderFooterType>,
}

#[derive(Debug, Deserialize)]
struct HeaderFooterBody {
    text: String,
    header_type: Option<HeaderFooterType>,
}

#[derive(Debug, Deserialize)]
struct PageNumbersBody {
    alignment: Option<Alignment>,
    position: Option<HeaderFooterKind>,
}

#[derive(Debug, Deserialize)]
struct TocBody {
    title: Option<String>,
    max_level: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct BookmarkBody {
    paragraph_index: usize,
    name: String,
}

/// A link to a URL or to a bookmark; exactly one target.
#[derive(Debug, Deserialize)]
struct HyperlinkBody {
    paragraph_index: usize,
    text: String,
    url: Option<String>,
    bookmark: Option<String>,
}

async fn list_sections<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
) -> Result<Json<Vec<SectionInfo>>, ApiError> {
    let sections = state.read(&document_id, |doc| Ok(doc.sections())).await?;
    Ok(Json(sections))
}

async fn add_section<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    ApiJson(body): ApiJson<AddSectionBody>,
) -> Result<(StatusCode, Json<SectionInfo>), ApiError> {
    let start = body.start.unwrap_or(SectionStart::NextPage);
    let section = state
        .edit(&document_id, |doc| {
            let index = doc.add_section(start);
            doc.section_info(index)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(section)))
}

async fn get_section<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, section)): Path<(String, usize)>,
) -> Result<Json<SectionInfo>, ApiError> {
    let info = state
        .read(&document_id, |doc| doc.section_info(section))
        .await?;
    Ok(Json(info))
}

async fn update_section<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, section)): Path<(String, usize)>,
    ApiJson(update): ApiJson<SectionUpdate>,
) -> Result<Json<SectionInfo>, ApiError> {
    let info = state
        .edit(&document_id, |doc| {
            if let Some(size) = update.page_size {
                doc.set_page_size(section, size)?;
            }
            if let Some(orientation) = update.orientation {
                doc.set_orientation(section, orientation)?;
            }
            if update.has_margins() {
                doc.set_margins(section, update.top, update.bottom, update.left, update.right)?;
            }
            doc.section_info(section)
        })
        .await?;
    Ok(Json(info))
}

async fn get_header<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, section)): Path<(String, usize)>,
    Query(query): Query<HeaderTypeQuery>,
) -> Result<Json<Option<HeaderFooterInfo>>, ApiError> {
    let header_type = query.header_type.unwrap_or(HeaderFooterType::Default);
    let info = state
        .read(&document_id, |doc| {
            doc.header_footer_info(section, HeaderFooterKind::Header, header_type)
        })
        .await?;
    Ok(Json(info))
}

async fn get_footer<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, section)): Path<(String, usize)>,
    Query(query): Query<HeaderTypeQuery>,
) -> Result<Json<Option<HeaderFooterInfo>>, ApiError> {
    let header_type = query.header_type.unwrap_or(HeaderFooterType::Default);
    let info = state
        .read(&document_id, |doc| {
            doc.header_footer_info(section, HeaderFooterKind::Footer, header_type)
        })
        .await?;
    Ok(Json(info))
}

async fn set_header<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, section)): Path<(String, usize)>,
    ApiJson(body): ApiJson<HeaderFooterBody>,
) -> Result<Json<Option<HeaderFooterInfo>>, ApiError> {
    let header_type = body.header_type.unwrap_or(HeaderFooterType::Default);
    let info = state
        .edit(&document_id, |doc| {
            doc.set_header(section, &body.text, header_type)?;
            doc.header_footer_info(section, HeaderFooterKind::Header, header_type)
        })
        .await?;
    Ok(Json(info))
}

async fn set_footer<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, section)): Path<(String, usize)>,
    ApiJson(body): ApiJson<HeaderFooterBody>,
) -> Result<Json<Option<HeaderFooterInfo>>, ApiError> {
    let header_type = body.header_type.unwrap_or(HeaderFooterType::Default);
    let info = state
        .edit(&document_id, |doc| {
            doc.set_footer(section, &body.text, header_type)?;
            doc.header_footer_info(section, HeaderFooterKind::Footer, header_type)
        })
        .await?;
    Ok(Json(info))
}

async fn add_page_numbers<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, section)): Path<(String, usize)>,
    ApiJson(body): ApiJson<PageNumbersBody>,
) -> Result<Json<Value>, ApiError> {
    let alignment = body.alignment.unwrap_or(Alignment::Center);
    let position = body.position.unwrap_or(HeaderFooterKind::Footer);
    state
        .edit(&document_id, |doc| doc.add_page_numbers(section, alignment, position))
        .await?;
    Ok(Json(json!({
        "section_index": section,
        "position": position,
        "alignment": alignment,
    })))
}

async fn outline<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
) -> Result<Json<Vec<HeadingInfo>>, ApiError> {
    let headings = state.read(&document_id, |doc| Ok(doc.headings())).await?;
    Ok(Json(headings))
}

async fn add_table_of_contents<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    ApiJson(body): ApiJson<TocBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let title = non_blank(body.title);
    let max_level = body.max_level.unwrap_or(3);
    let index = state
        .edit(&document_id, |doc| {
            doc.add_table_of_contents(title.as_deref(), max_level)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "paragraph_index": index }))))
}

async fn list_bookmarks<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
) -> Result<Json<Vec<BookmarkInfo>>, ApiError> {
    let bookmarks = state.read(&document_id, |doc| Ok(doc.bookmarks())).await?;
    Ok(Json(bookmarks))
}

async fn add_bookmark<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    ApiJson(body): ApiJson<BookmarkBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let id = state
        .edit(&document_id, |doc| doc.add_bookmark(body.paragraph_index, &body.name))
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id, "name": body.name }))))
}

async fn delete_bookmark<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, name)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state
        .edit(&document_id, |doc| doc.delete_bookmark(&name))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_hyperlinks<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
) -> Result<Json<Vec<HyperlinkInfo>>, ApiError> {
    let links = state.read(&document_id, |doc| Ok(doc.hyperlinks())).await?;
    Ok(Json(links))
}

async fn add_hyperlink<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    ApiJson(body): ApiJson<HyperlinkBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let index = body.paragraph_index;
    match (non_blank(body.url), non_blank(body.bookmark)) {
        (Some(url), None) => {
            state
                .edit(&document_id, |doc| doc.add_hyperlink(index, &body.text, &url))
                .await?;
        }
        (None, Some(bookmark)) => {
            state
                .edit(&document_id, |doc| {
                    doc.add_internal_link(index, &body.text, &bookmark)
                })
                .await?;
        }
        _ => return Err(ApiError::bad_request("provide exactly one of url or bookmark")),
    }
    Ok((
        StatusCode::CREATED,
        Json(json!({ "paragraph_index": index, "text": body.text })),
    ))
}
