use std::time::Duration;

use docx_core::control::{
    AddCommentRequest,
    BatchRequest,
    BatchStep,
    CommentFilter,
    ControlError,
    CreateDocumentRequest,
    CreateTemplateRequest,
    DocumentUpdate,
    DocxControlPlane,
    ProposeRevisionRequest,
};
use docx_core::editor::DocumentError;
use docx_core::render::RenderError;
use docx_core::services::{ExportQueueConfig, JobError};
use docx_core::store::{BlobStore, DocumentQuery, SurrealDocStore};
use docx_store::models::{CommentStatus, DocumentStatus, JobStatus, RevisionAction};
use serde_json::json;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use tempfile::TempDir;

async fn build_control_plane(db_name: &str) -> (DocxControlPlane<Db>, TempDir) {
    let db = Surreal::new::<Mem>(())
        .await
        .expect("failed to create in-memory surrealdb instance");
    db.use_ns("docx")
        .use_db(db_name)
        .await
        .expect("failed to select surrealdb namespace/db");
    let dir = tempfile::tempdir().expect("failed to create blob directory");
    let blobs = BlobStore::open(dir.path())
        .await
        .expect("failed to open blob store");
    (DocxControlPlane::new(SurrealDocStore::new(db), blobs), dir)
}

async fn blank(control: &DocxControlPlane<Db>, title: &str) -> String {
    control
        .create_document(CreateDocumentRequest {
            title: title.to_string(),
            ..CreateDocumentRequest::default()
        })
        .await
        .expect("failed to create document")
        .document_id
}

async fn add_text(control: &DocxControlPlane<Db>, document_id: &str, text: &str) -> usize {
    control
        .edit(document_id, |doc| doc.add_paragraph(text, None, None))
        .await
        .expect("failed to add paragraph")
}

#[tokio::test]
async fn document_lifecycle() {
    let (control, _dir) = build_control_plane("lifecycle").await;
    let document_id = blank(&control, "Quarterly Plan").await;

    let record = control.get_document(&document_id).await.unwrap();
    assert_eq!(record.version, 1);
    assert_eq!(record.status, DocumentStatus::Draft);
    assert_eq!(control.list_versions(&document_id).await.unwrap().len(), 1);

    add_text(&control, &document_id, "Hello World").await;
    let record = control.get_document(&document_id).await.unwrap();
    assert!(record.search_text.contains("hello world"));

    control.close_document(&document_id).await;
    let count = control
        .read(&document_id, |doc| Ok::<_, DocumentError>(doc.paragraph_count()))
        .await
        .unwrap();
    assert_eq!(count, 1);

    let found = control.search_documents("HELLO", None).await.unwrap();
    assert_eq!(found.len(), 1);
    let page = control
        .list_documents(DocumentQuery::default(), 0, Some(10))
        .await
        .unwrap();
    assert_eq!(page.total, 1);

    let updated = control
        .update_document(
            &document_id,
            DocumentUpdate {
                status: Some(DocumentStatus::Approved),
                metadata: Some(json!({ "team": "finance" })),
                ..DocumentUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, DocumentStatus::Approved);
    assert_eq!(updated.metadata, Some(json!({ "team": "finance" })));

    control.delete_document(&document_id).await.unwrap();
    assert!(control.get_document(&document_id).await.unwrap_err().is_not_found());
    assert!(control.list_versions(&document_id).await.unwrap_err().is_not_found());
    let audit = control.list_audit(Some(document_id.as_str()), None).await.unwrap();
    assert!(audit.len() >= 3);
}

#[tokio::test]
async fn failed_edits_leave_the_document_unchanged() {
    let (control, _dir) = build_control_plane("rollback").await;
    let document_id = blank(&control, "Rollback").await;
    add_text(&control, &document_id, "keep me").await;

    let result = control
        .edit(&document_id, |doc| {
            doc.add_paragraph("discard me", None, None)?;
            Err::<(), _>(DocumentError::InvalidArgument("boom".to_string()))
        })
        .await;
    assert!(matches!(result, Err(ControlError::Document(_))));

    let texts = control
        .read(&document_id, |doc| {
            Ok::<_, DocumentError>(doc.paragraphs().map(|paragraph| paragraph.text()).collect::<Vec<_>>())
        })
        .await
        .unwrap();
    assert_eq!(texts, ["keep me"]);

    let out_of_range = control
        .edit(&document_id, |doc| doc.delete_paragraph(5))
        .await
        .unwrap_err();
    assert!(out_of_range.is_client_error());
}

#[tokio::test]
async fn versions_restore_and_compare() {
    let (control, _dir) = build_control_plane("versions").await;
    let document_id = blank(&control, "Versions").await;

    add_text(&control, &document_id, "first").await;
    let v2 = control
        .create_version(&document_id, Some("first draft".to_string()), None)
        .await
        .unwrap();
    assert_eq!(v2.version_number, 2);
    add_text(&control, &document_id, "second").await;
    control.create_version(&document_id, None, None).await.unwrap();

    let comparison = control.compare_versions(&document_id, 2, 3).await.unwrap();
    assert!(!comparison.are_identical);
    assert_eq!(comparison.paragraph_count_diff, 1);
    assert_eq!(comparison.changed_paragraphs, 1);

    let restored = control.restore_version(&document_id, 2, None).await.unwrap();
    assert_eq!(restored.version_number, 4);
    let count = control
        .read(&document_id, |doc| Ok::<_, DocumentError>(doc.paragraph_count()))
        .await
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(control.get_document(&document_id).await.unwrap().version, 4);

    assert!(matches!(
        control.delete_version(&document_id, 4).await,
        Err(ControlError::Conflict(_))
    ));
    control.delete_version(&document_id, 3).await.unwrap();
    let numbers: Vec<u32> = control
        .list_versions(&document_id)
        .await
        .unwrap()
        .iter()
        .map(|version| version.version_number)
        .collect();
    assert_eq!(numbers, [1, 2, 4]);
}

#[tokio::test]
async fn comments_reply_and_cascade() {
    let (control, _dir) = build_control_plane("comments").await;
    let document_id = blank(&control, "Comments").await;
    add_text(&control, &document_id, "Needs review").await;

    let root = control
        .add_comment(
            &document_id,
            AddCommentRequest {
                paragraph_index: 0,
                author: "Ann Lee".to_string(),
                content: "Is this right?".to_string(),
                ..AddCommentRequest::default()
            },
        )
        .await
        .unwrap();
    let reply = control
        .reply_to_comment(&document_id, &root.comment_id, "Bo".to_string(), "Yes".to_string())
        .await
        .unwrap();
    assert_eq!(reply.parent_id.as_deref(), Some(root.comment_id.as_str()));
    assert_eq!(reply.paragraph_index, 0);

    let resolved = control.resolve_comment(&document_id, &root.comment_id).await.unwrap();
    assert_eq!(resolved.status, CommentStatus::Resolved);
    assert!(resolved.resolved_at.is_some());
    let open = control
        .list_comments(
            &document_id,
            CommentFilter {
                status: Some(CommentStatus::Open),
                paragraph_index: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(open.len(), 1);

    let removed = control.delete_comment(&document_id, &root.comment_id).await.unwrap();
    assert_eq!(removed, 2);
    let remaining = control
        .read(&document_id, |doc| Ok::<_, DocumentError>(doc.comments_list().len()))
        .await
        .unwrap();
    assert_eq!(remaining, 0);
    assert!(
        control
            .list_comments(&document_id, CommentFilter::default())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn revisions_need_tracking_and_apply_once() {
    let (control, _dir) = build_control_plane("revisions").await;
    let document_id = blank(&control, "Revisions").await;
    add_text(&control, &document_id, "old text").await;

    let proposal = |action, content: Option<&str>| ProposeRevisionRequest {
        action,
        paragraph_index: 0,
        content: content.map(ToString::to_string),
        author: "editor".to_string(),
    };
    assert!(matches!(
        control
            .propose_revision(&document_id, proposal(RevisionAction::Replace, Some("x")))
            .await,
        Err(ControlError::Conflict(_))
    ));

    control.set_tracking(&document_id, true).await.unwrap();
    let replace = control
        .propose_revision(&document_id, proposal(RevisionAction::Replace, Some("new text")))
        .await
        .unwrap();
    assert_eq!(replace.original_content.as_deref(), Some("old text"));
    control
        .accept_revision(&document_id, &replace.revision_id, Some("lead".to_string()))
        .await
        .unwrap();
    let text = control
        .read(&document_id, |doc| doc.paragraph(0).map(|paragraph| paragraph.text()))
        .await
        .unwrap();
    assert_eq!(text, "new text");
    assert!(matches!(
        control.reject_revision(&document_id, &replace.revision_id, None).await,
        Err(ControlError::Conflict(_))
    ));

    control
        .propose_revision(&document_id, proposal(RevisionAction::Insert, Some(" more")))
        .await
        .unwrap();
    control
        .propose_revision(&document_id, proposal(RevisionAction::Delete, None))
        .await
        .unwrap();
    let batch = control.reject_all_revisions(&document_id, None).await.unwrap();
    assert_eq!(batch.processed.len(), 2);
    assert!(batch.failed.is_empty());
    assert!(control.list_revisions(&document_id, true).await.unwrap().is_empty());
}

#[tokio::test]
async fn exports_inline_and_in_background() {
    let (control, _dir) = build_control_plane("exports").await;
    let document_id = blank(&control, "Exports").await;
    control
        .edit(&document_id, |doc| doc.add_heading("Summary", 1))
        .await
        .unwrap();

    let markdown = control.export_now(&document_id, "md", false).await.unwrap();
    assert_eq!(markdown.as_text(), Some("# Summary\n"));
    assert!(matches!(
        control.export_now(&document_id, "pdf", false).await,
        Err(ControlError::Render(RenderError::UnsupportedFormat(_)))
    ));
    assert!(matches!(
        control.start_export(&document_id, "html", false).await,
        Err(ControlError::Job(JobError::Closed))
    ));

    let control = control.with_export_queue(ExportQueueConfig::default());
    let job = control.start_export(&document_id, "html", true).await.unwrap();
    assert_eq!(job.status, JobStatus::Pending);

    let mut finished = None;
    for _ in 0..200 {
        let current = control.get_export_job(&job.job_id).await.unwrap();
        if matches!(current.status, JobStatus::Completed | JobStatus::Failed) {
            finished = Some(current);
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let finished = finished.expect("export job did not finish");
    assert_eq!(finished.status, JobStatus::Completed, "{:?}", finished.error);

    let (_, output) = control.export_file(&job.job_id).await.unwrap();
    assert!(output.as_text().unwrap().contains("<h1>Summary</h1>"));
    assert_eq!(control.list_export_jobs(&document_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn templates_seed_new_documents() {
    let (control, _dir) = build_control_plane("templates").await;
    let source = blank(&control, "Letterhead").await;
    add_text(&control, &source, "ACME Corp").await;

    let template = control
        .create_template(CreateTemplateRequest {
            name: "Letter".to_string(),
            category: Some("business".to_string()),
            is_public: true,
            document_id: Some(source.clone()),
            ..CreateTemplateRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(control.template_categories().await.unwrap(), ["business"]);
    assert_eq!(control.list_templates(Some("business")).await.unwrap().len(), 1);

    let created = control
        .create_document(CreateDocumentRequest {
            title: "Letter to Bob".to_string(),
            template_id: Some(template.template_id.clone()),
            ..CreateDocumentRequest::default()
        })
        .await
        .unwrap();
    assert!(created.search_text.contains("acme corp"));

    let conflicting = control
        .create_document(CreateDocumentRequest {
            title: "Both".to_string(),
            template_id: Some(template.template_id.clone()),
            content: Some(Vec::new()),
            ..CreateDocumentRequest::default()
        })
        .await;
    assert!(matches!(conflicting, Err(ControlError::InvalidInput(_))));

    control.delete_template(&template.template_id).await.unwrap();
    assert!(control.get_template(&template.template_id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn uploads_are_validated_and_versioned() {
    let (control, _dir) = build_control_plane("uploads").await;
    let rejected = control
        .create_document(CreateDocumentRequest {
            title: "Broken".to_string(),
            content: Some(b"not a zip".to_vec()),
            ..CreateDocumentRequest::default()
        })
        .await;
    assert!(matches!(rejected, Err(ControlError::Parse(_))));

    let source = blank(&control, "Source").await;
    add_text(&control, &source, "uploaded text").await;
    let bytes = control.document_content(&source).await.unwrap();

    let imported = control
        .create_document(CreateDocumentRequest {
            title: "Imported".to_string(),
            content: Some(bytes.clone()),
            ..CreateDocumentRequest::default()
        })
        .await
        .unwrap();
    assert!(imported.search_text.contains("uploaded text"));

    let target = blank(&control, "Target").await;
    add_text(&control, &target, "to be replaced").await;
    let replaced = control
        .replace_content(&target, bytes, Some("ann".to_string()), None)
        .await
        .unwrap();
    assert_eq!(replaced.version, 2);
    let text = control
        .read(&target, |doc| Ok::<_, DocumentError>(doc.all_text()))
        .await
        .unwrap();
    assert_eq!(text, "uploaded text");

    let small = control.clone().with_max_document_bytes(16);
    assert!(matches!(
        small.replace_content(&target, vec![0; 32], None, None).await,
        Err(ControlError::InvalidInput(_))
    ));
}

async fn paragraph_texts(control: &DocxControlPlane<Db>, document_id: &str) -> Vec<String> {
    control
        .read(document_id, |doc| {
            Ok::<_, DocumentError>(doc.paragraphs().map(|paragraph| paragraph.text()).collect())
        })
        .await
        .expect("failed to read paragraphs")
}

#[tokio::test]
async fn concurrent_accepts_apply_a_revision_once() {
    let (control, _dir) = build_control_plane("revision_race").await;
    let document_id = blank(&control, "Race").await;
    add_text(&control, &document_id, "base").await;
    control.set_tracking(&document_id, true).await.unwrap();
    let revision = control
        .propose_revision(
            &document_id,
            ProposeRevisionRequest {
                action: RevisionAction::Insert,
                paragraph_index: 0,
                content: Some("+X".to_string()),
                author: "editor".to_string(),
            },
        )
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        control.accept_revision(&document_id, &revision.revision_id, None),
        control.accept_revision(&document_id, &revision.revision_id, None),
    );
    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|outcome| matches!(outcome, Err(ControlError::Conflict(_))))
    );
    assert_eq!(paragraph_texts(&control, &document_id).await, ["base+X"]);

    control.close_document(&document_id).await;
    assert_eq!(paragraph_texts(&control, &document_id).await, ["base+X"]);
}

#[tokio::test]
async fn abandoned_edits_still_reach_storage() {
    let (control, _dir) = build_control_plane("abandoned_edit").await;
    let document_id = blank(&control, "Abandoned").await;
    add_text(&control, &document_id, "first").await;

    let _ = tokio::time::timeout(
        Duration::ZERO,
        control.edit(&document_id, |doc| doc.add_paragraph("second", None, None)),
    )
    .await;

    let cached = paragraph_texts(&control, &document_id).await;
    assert!(control.close_document(&document_id).await);
    let stored = paragraph_texts(&control, &document_id).await;
    assert_eq!(cached, stored);
    let record = control.get_document(&document_id).await.unwrap();
    assert_eq!(
        record.search_text.contains("second"),
        stored.iter().any(|text| text == "second")
    );
}

#[tokio::test]
async fn documents_in_use_stay_cached() {
    let (control, _dir) = build_control_plane("busy_cache").await;
    let document_id = blank(&control, "Busy").await;
    add_text(&control, &document_id, "first").await;

    let guard = control.lock_document(&document_id).await.unwrap();
    assert!(!control.close_document(&document_id).await);

    let waiting = {
        let control = control.clone();
        let document_id = document_id.clone();
        tokio::spawn(async move {
            control
                .edit(&document_id, |doc| doc.add_paragraph("from a", None, None))
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    control.cache().remove(&document_id).await;
    add_text(&control, &document_id, "from b").await;
    drop(guard);
    waiting.await.unwrap().unwrap();

    assert!(control.close_document(&document_id).await);
    assert_eq!(
        paragraph_texts(&control, &document_id).await,
        ["first", "from b", "from a"]
    );
}

#[tokio::test]
async fn failed_package_writes_keep_the_record() {
    let (control, dir) = build_control_plane("failed_write").await;
    let document_id = blank(&control, "Unwritable").await;
    add_text(&control, &document_id, "kept").await;
    let before = control.get_document(&document_id).await.unwrap();

    std::fs::remove_dir_all(dir.path()).unwrap();
    let failed = control
        .edit(&document_id, |doc| doc.add_paragraph("lost", None, None))
        .await;
    assert!(matches!(failed, Err(ControlError::Store(_))));

    let after = control.get_document(&document_id).await.unwrap();
    assert_eq!(after.file_size, before.file_size);
    assert_eq!(after.search_text, before.search_text);
    assert_eq!(paragraph_texts(&control, &document_id).await, ["kept"]);
}

fn batch_step(operation: &str, params: serde_json::Value) -> BatchStep {
    BatchStep {
        operation: operation.to_string(),
        params,
    }
}

#[tokio::test]
async fn batches_save_once_or_roll_back() {
    let (control, _dir) = build_control_plane("batches").await;
    let document_id = blank(&control, "Batch").await;
    let steps = vec![
        batch_step("add_heading", json!({ "text": "Agenda", "level": 1 })),
        batch_step("add_paragraph", json!({ "text": "Budget 2024-01-31" })),
        batch_step("delete_paragraph", json!({ "index": 42 })),
        batch_step("regex_replace", json!({ "pattern": r"(\d{4})-(\d{2})-(\d{2})", "replacement": "$3.$2.$1" })),
    ];

    let validation = control
        .validate_batch(
            &document_id,
            &BatchRequest {
                operations: steps.clone(),
                stop_on_error: false,
            },
        )
        .await
        .unwrap();
    assert!(!validation.valid);
    assert_eq!(validation.operation_count, 4);
    let invalid: Vec<usize> = validation
        .results
        .iter()
        .filter(|check| !check.valid)
        .map(|check| check.index)
        .collect();
    assert_eq!(invalid, [2]);
    assert!(paragraph_texts(&control, &document_id).await.is_empty());

    let strict = control
        .execute_batch(
            &document_id,
            BatchRequest {
                operations: steps.clone(),
                stop_on_error: true,
            },
        )
        .await
        .unwrap();
    assert!(!strict.success);
    assert!(!strict.saved);
    assert_eq!(strict.results.len(), 2);
    assert!(paragraph_texts(&control, &document_id).await.is_empty());

    let lenient = control
        .execute_batch(
            &document_id,
            BatchRequest {
                operations: steps,
                stop_on_error: false,
            },
        )
        .await
        .unwrap();
    assert!(!lenient.success);
    assert!(lenient.saved);
    assert_eq!(lenient.errors.len(), 1);
    assert_eq!(lenient.errors[0].index, 2);

    control.close_document(&document_id).await;
    assert_eq!(
        paragraph_texts(&control, &document_id).await,
        ["Agenda", "Budget 31.01.2024"]
    );
}
