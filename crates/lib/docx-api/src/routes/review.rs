use axum::Router;
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use docx_core::control::{
    AddCommentRequest,
    CommentFilter,
    CommentUpdate,
    ProposeRevisionRequest,
    RevisionBatch,
};
use docx_store::models::{CommentRecord, DocumentRecord, RevisionRecord};
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
            "/documents/:document_id/comments",
            get(list_comments::<C>).post(add_comment::<C>),
        )
        .route(
            "/documents/:document_id/comments/:comment_id",
            get(get_comment::<C>)
                .patch(update_comment::<C>)
                .delete(delete_comment::<C>),
        )
        .route(
            "/documents/:document_id/comments/:comment_id/replies",
            post(reply_to_comment::<C>),
        )
        .route(
            "/documents/:document_id/comments/:comment_id/resolve",
            post(resolve_comment::<C>),
        )
        .route(
            "/documents/:document_id/comments/:comment_id/reopen",
            post(reopen_comment::<C>),
        )
        .route("/documents/:document_id/tracking", put(set_tracking::<C>))
        .route(
            "/documents/:document_id/revisions",
            get(list_revisions::<C>).post(propose_revision::<C>),
        )
        .route(
            "/documents/:document_id/revisions/accept-all",
            post(accept_all_revisions::<C>),
        )
        .route(
            "/documents/:document_id/revisions/reject-all",
            post(reject_all_revisions::<C>),
        )
        .route(
            "/documents/:document_id/revisions/:revision_id",
            get(get_revision::<C>),
        )
        .route(
            "/documents/:document_id/revisions/:revision_id/accept",
            post(accept_revision::<C>),
        )
        .route(
            "/documents/:document_id/revisions/:revision_id/reject",
            post(reject_revision::<C>),
        )
}

#[derive(Debug, Deserialize)]
struct ReplyBody {
    author: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct TrackingBody {
    enabled: bool,
}

#[derive(Debug, Deserialize)]
struct RevisionsQuery {
    #[serde(default)]
    pending_only: bool,
}

/// Reviewer recorded on a decision. The body may be omitted entirely.
#[derive(Debug, Default, Deserialize)]
struct DecisionBody {
    decided_by: Option<String>,
}

async fn list_comments<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    Query(filter): Query<CommentFilter>,
) -> Result<Json<Vec<CommentRecord>>, ApiError> {
    let comments = state
        .run(state.control().list_comments(&document_id, filter))
        .await?;
    Ok(Json(comments))
}

async fn add_comment<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    ApiJson(request): ApiJson<AddCommentRequest>,
) -> Result<(StatusCode, Json<CommentRecord>), ApiError> {
    let comment = state
        .run(state.control().add_comment(&document_id, request))
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn get_comment<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, comment_id)): Path<(String, String)>,
) -> Result<Json<CommentRecord>, ApiError> {
    let comment = state
        .run(state.control().get_comment(&document_id, &comment_id))
        .await?;
    Ok(Json(comment))
}

async fn update_comment<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, comment_id)): Path<(String, String)>,
    ApiJson(update): ApiJson<CommentUpdate>,
) -> Result<Json<CommentRecord>, ApiError> {
    let comment = state
        .run(state.control().update_comment(&document_id, &comment_id, update))
        .await?;
    Ok(Json(comment))
}

async fn delete_comment<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, comment_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let deleted = state
        .run(state.control().delete_comment(&document_id, &comment_id))
        .await?;
    Ok(Json(json!({ "comment_id": comment_id, "deleted": deleted })))
}

async fn reply_to_comment<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, comment_id)): Path<(String, String)>,
    ApiJson(body): ApiJson<ReplyBody>,
) -> Result<(StatusCode, Json<CommentRecord>), ApiError> {
    let reply = state
        .run(state.control().reply_to_comment(
            &document_id,
            &comment_id,
            body.author,
            body.content,
        ))
        .await?;
    Ok((StatusCode::CREATED, Json(reply)))
}

async fn resolve_comment<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, comment_id)): Path<(String, String)>,
) -> Result<Json<CommentRecord>, ApiError> {
    let comment = state
        .run(state.control().resolve_comment(&document_id, &comment_id))
        .await?;
    Ok(Json(comment))
}

async fn reopen_comment<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, comment_id)): Path<(String, String)>,
) -> Result<Json<CommentRecord>, ApiError> {
    let comment = state
        .run(state.control().reopen_comment(&document_id, &comment_id))
        .await?;
    Ok(Json(comment))
}

async fn set_tracking<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    ApiJson(body): ApiJson<TrackingBody>,
) -> Result<Json<DocumentRecord>, ApiError> {
    let record = state
        .run(state.control().set_tracking(&document_id, body.enabled))
        .await?;
    Ok(Json(record))
}

async fn list_revisions<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    Query(query): Query<RevisionsQuery>,
) -> Result<Json<Vec<RevisionRecord>>, ApiError> {
    let revisions = state
        .run(state.control().list_revisions(&document_id, query.pending_only))
        .await?;
    Ok(Json(revisions))
}

async fn propose_revision<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    ApiJson(request): ApiJson<ProposeRevisionRequest>,
) -> Result<(StatusCode, Json<RevisionRecord>), ApiError> {
    let revision = state
        .run(state.control().propose_revision(&document_id, request))
        .await?;
    Ok((StatusCode::CREATED, Json(revision)))
}

async fn get_revision<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, revision_id)): Path<(String, String)>,
) -> Result<Json<RevisionRecord>, ApiError> {
    let revision = state
        .run(state.control().get_revision(&document_id, &revision_id))
        .await?;
    Ok(Json(revision))
}

async fn accept_revision<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, revision_id)): Path<(String, String)>,
    body: Option<ApiJson<DecisionBody>>,
) -> Result<Json<RevisionRecord>, ApiError> {
    let decided_by = decided_by(body);
    let revision = state
        .run(state
            .control()
            .accept_revision(&document_id, &revision_id, decided_by))
        .await?;
    Ok(Json(revision))
}

async fn reject_revision<C: Connection>(
    State(state): State<AppState<C>>,
    Path((document_id, revision_id)): Path<(String, String)>,
    body: Option<ApiJson<DecisionBody>>,
) -> Result<Json<RevisionRecord>, ApiError> {
    let decided_by = decided_by(body);
    let revision = state
        .run(state
            .control()
            .reject_revision(&document_id, &revision_id, decided_by))
        .await?;
    Ok(Json(revision))
}

async fn accept_all_revisions<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    body: Option<ApiJson<DecisionBody>>,
) -> Result<Json<RevisionBatch>, ApiError> {
    let decided_by = decided_by(body);
    let batch = state
        .run(state.control().accept_all_revisions(&document_id, decided_by))
        .await?;
    Ok(Json(batch))
}

async fn reject_all_revisions<C: Connection>(
    State(state): State<AppState<C>>,
    Path(document_id): Path<String>,
    body: Option<ApiJson<DecisionBody>>,
) -> Result<Json<RevisionBatch>, ApiError> {
    let decided_by = decided_by(body);
    let batch = state
        .run(state.control().reject_all_revisions(&document_id, decided_by))
        .await?;
    Ok(Json(batch))
}

fn decided_by(body: Option<ApiJson<DecisionBody>>) -> Option<String> {
    body.and_then(|ApiJson(body)| non_blank(body.decided_by))
}
