use std::{error::Error, fmt, sync::Arc};

use docx_store::models::{
    AuditRecord,
    CommentRecord,
    CommentStatus,
    DocumentRecord,
    DocumentStatus,
    ExportJobRecord,
    RevisionRecord,
    RevisionStatus,
    TemplateRecord,
    VersionRecord,
};
use docx_store::schema::{
    TABLE_AUDIT_LOG,
    TABLE_COMMENT,
    TABLE_DOCUMENT,
    TABLE_DOCUMENT_VERSION,
    TABLE_EXPORT_JOB,
    TABLE_REVISION,
    TABLE_TEMPLATE,
    make_version_key,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use surrealdb::{Connection, Surreal};

#[derive(Debug)]
pub enum StoreError {
    Surreal(Box<surrealdb::Error>),
    Io(std::io::Error),
    InvalidInput(String),
    MissingBlob(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Surreal(err) => write!(f, "SurrealDB error: {err}"),
            Self::Io(err) => write!(f, "Blob storage error: {err}"),
            Self::InvalidInput(message) => write!(f, "Invalid input: {message}"),
            Self::MissingBlob(key) => write!(f, "Blob not found: {key}"),
        }
    }
}

impl Error for StoreError {}

impl From<surrealdb::Error> for StoreError {
    fn from(err: surrealdb::Error) -> Self {
        Self::Surreal(Box::new(err))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Filters for document listings. `search` matches the title or extracted
/// text, case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
    pub search: Option<String>,
    pub status: Option<DocumentStatus>,
    pub owner: Option<String>,
}

pub struct SurrealDocStore<C: Connection> {
    db: Arc<Surreal<C>>,
}

impl<C: Connection> Clone for SurrealDocStore<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

impl<C: Connection> SurrealDocStore<C> {
    #[must_use]
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            db: Arc::new(db),
        }
    }

    #[must_use]
    pub const fn from_arc(db: Arc<Surreal<C>>) -> Self {
        Self { db }
    }

    #[must_use]
    pub fn db(&self) -> &Surreal<C> {
        &self.db
    }

    async fn insert<T>(&self, table: &str, key: String, record: T) -> StoreResult<T>
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        ensure_non_empty(&key, "record key")?;
        let created: Option<T> = self.db.create((table, key)).content(record).await?;
        require_record(created, table)
    }

    async fn upsert<T>(&self, table: &str, key: String, record: T) -> StoreResult<T>
    where
        T: Serialize + DeserializeOwned + Clone + 'static,
    {
        ensure_non_empty(&key, "record key")?;
        let fallback = record.clone();
        let stored: Option<T> = self.db.upsert((table, key)).content(record).await?;
        Ok(stored.unwrap_or(fallback))
    }

    async fn fetch<T: DeserializeOwned>(&self, table: &str, key: &str) -> StoreResult<Option<T>> {
        let record: Option<T> = self.db.select((table, key)).await?;
        Ok(record)
    }

    async fn remove<T: DeserializeOwned>(&self, table: &str, key: &str) -> StoreResult<Option<T>> {
        let record: Option<T> = self.db.delete((table, key)).await?;
        Ok(record)
    }

    /// Deletes every row of `table` that belongs to a document.
    async fn remove_for_document(&self, table: &'static str, document_id: &str) -> StoreResult<()> {
        let query = format!("DELETE {table} WHERE document_id = $document_id;");
        self.db
            .query(query)
            .bind(("document_id", document_id.to_string()))
            .await?
            .check()?;
        Ok(())
    }

    /// Creates a document record keyed by its id.
    ///
    /// # Errors
    /// Returns `StoreError` if the id is empty, already taken, or the write fails.
    pub async fn create_document(&self, document: DocumentRecord) -> StoreResult<DocumentRecord> {
        let key = document.document_id.clone();
        self.insert(TABLE_DOCUMENT, key, document).await
    }

    /// Fetches a document by id.
    ///
    /// # Errors
    /// Returns `StoreError` if the database query fails.
    pub async fn get_document(&self, document_id: &str) -> StoreResult<Option<DocumentRecord>> {
        self.fetch(TABLE_DOCUMENT, document_id).await
    }

    /// Replaces a document record.
    ///
    /// # Errors
    /// Returns `StoreError` if validation fails or the database write fails.
    pub async fn update_document(&self, document: DocumentRecord) -> StoreResult<DocumentRecord> {
        let key = document.document_id.clone();
        self.upsert(TABLE_DOCUMENT, key, document).await
    }

    /// Deletes a document record, returning it when it existed.
    ///
    /// # Errors
    /// Returns `StoreError` if the database write fails.
    pub async fn delete_document(&self, document_id: &str) -> StoreResult<Option<DocumentRecord>> {
        self.remove(TABLE_DOCUMENT, document_id).await
    }

    /// Lists documents, most recently updated first.
    ///
    /// # Errors
    /// Returns `StoreError` if the paging is invalid or the database query fails.
    pub async fn list_documents(
        &self,
        filter: &DocumentQuery,
        skip: usize,
        limit: usize,
    ) -> StoreResult<Vec<DocumentRecord>> {
        let limit = limit_to_i64(limit)?;
        let skip = limit_to_i64(skip)?;
        let query = format!(
            "SELECT * FROM document{} ORDER BY updated_at DESC LIMIT $limit START $skip;",
            document_conditions(filter)
        );
        let mut response = bind_document_filter(self.db.query(query), filter)
            .bind(("limit", limit))
            .bind(("skip", skip))
            .await?;
        let records: Vec<DocumentRecord> = response.take(0)?;
        Ok(records)
    }

    /// Counts documents matching a filter.
    ///
    /// # Errors
    /// Returns `StoreError` if the database query fails.
    pub async fn count_documents(&self, filter: &DocumentQuery) -> StoreResult<usize> {
        let query = format!(
            "SELECT count() AS total FROM document{} GROUP ALL;",
            document_conditions(filter)
        );
        let mut response = bind_document_filter(self.db.query(query), filter).await?;
        let rows: Vec<CountRow> = response.take(0)?;
        Ok(rows.first().map_or(0, |row| row.total))
    }

    /// Creates a version snapshot record.
    ///
    /// # Errors
    /// Returns `StoreError` if the version already exists or the write fails.
    pub async fn create_version(&self, version: VersionRecord) -> StoreResult<VersionRecord> {
        let key = make_version_key(&version.document_id, version.version_number);
        self.insert(TABLE_DOCUMENT_VERSION, key, version).await
    }

    /// Fetches one version of a document.
    ///
    /// # Errors
    /// Returns `StoreError` if the database query fails.
    pub async fn get_version(
        &self,
        document_id: &str,
        version_number: u32,
    ) -> StoreResult<Option<VersionRecord>> {
        let key = make_version_key(document_id, version_number);
        self.fetch(TABLE_DOCUMENT_VERSION, &key).await
    }

    /// Lists versions of a document in ascending order.
    ///
    /// # Errors
    /// Returns `StoreError` if the database query fails.
    pub async fn list_versions(&self, document_id: &str) -> StoreResult<Vec<VersionRecord>> {
        let query = "SELECT * FROM document_version WHERE document_id = $document_id ORDER BY version_number ASC;";
        let mut response = self
            .db
            .query(query)
            .bind(("document_id", document_id.to_string()))
            .await?;
        let records: Vec<VersionRecord> = response.take(0)?;
        Ok(records)
    }

    /// Deletes one version record.
    ///
    /// # Errors
    /// Returns `StoreError` if the database write fails.
    pub async fn delete_version(
        &self,
        document_id: &str,
        version_number: u32,
    ) -> StoreResult<Option<VersionRecord>> {
        let key = make_version_key(document_id, version_number);
        self.remove(TABLE_DOCUMENT_VERSION, &key).await
    }

    /// # Errors
    /// Returns `StoreError` if the database write fails.
    pub async fn delete_versions(&self, document_id: &str) -> StoreResult<()> {
        self.remove_for_document(TABLE_DOCUMENT_VERSION, document_id).await
    }

    /// Creates a comment record.
    ///
    /// # Errors
    /// Returns `StoreError` if the database write fails.
    pub async fn create_comment(&self, comment: CommentRecord) -> StoreResult<CommentRecord> {
        let key = comment.comment_id.clone();
        self.insert(TABLE_COMMENT, key, comment).await
    }

    /// # Errors
    /// Returns `StoreError` if the database query fails.
    pub async fn get_comment(&self, comment_id: &str) -> StoreResult<Option<CommentRecord>> {
        self.fetch(TABLE_COMMENT, comment_id).await
    }

    /// # Errors
    /// Returns `StoreError` if the database write fails.
    pub async fn update_comment(&self, comment: CommentRecord) -> StoreResult<CommentRecord> {
        let key = comment.comment_id.clone();
        self.upsert(TABLE_COMMENT, key, comment).await
    }

    /// # Errors
    /// Returns `StoreError` if the database write fails.
    pub async fn delete_comment(&self, comment_id: &str) -> StoreResult<Option<CommentRecord>> {
        self.remove(TABLE_COMMENT, comment_id).await
    }

    /// Lists comments on a document in creation order.
    ///
    /// # Errors
    /// Returns `StoreError` if the database query fails.
    pub async fn list_comments(
        &self,
        document_id: &str,
        status: Option<CommentStatus>,
        paragraph_index: Option<usize>,
    ) -> StoreResult<Vec<CommentRecord>> {
        let mut query = "SELECT * FROM comment WHERE document_id = $document_id".to_string();
        if status.is_some() {
            query.push_str(" AND status = $status");
        }
        if paragraph_index.is_some() {
            query.push_str(" AND paragraph_index = $paragraph_index");
        }
        query.push_str(" ORDER BY created_at ASC;");
        let mut request = self
            .db
            .query(query)
            .bind(("document_id", document_id.to_string()));
        if let Some(status) = status {
            request = request.bind(("status", status.as_str()));
        }
        if let Some(paragraph_index) = paragraph_index {
            request = request.bind(("paragraph_index", limit_to_i64(paragraph_index)?));
        }
        let mut response = request.await?;
        let records: Vec<CommentRecord> = response.take(0)?;
        Ok(records)
    }

    /// # Errors
    /// Returns `StoreError` if the database write fails.
    pub async fn delete_comments(&self, document_id: &str) -> StoreResult<()> {
        self.remove_for_document(TABLE_COMMENT, document_id).await
    }

    /// Creates a revision record.
    ///
    /// # Errors
    /// Returns `StoreError` if the database write fails.
    pub async fn create_revision(&self, revision: RevisionRecord) -> StoreResult<RevisionRecord> {
        let key = revision.revision_id.clone();
        self.insert(TABLE_REVISION, key, revision).await
    }

    /// # Errors
    /// Returns `StoreError` if the database query fails.
    pub async fn get_revision(&self, revision_id: &str) -> StoreResult<Option<RevisionRecord>> {
        self.fetch(TABLE_REVISION, revision_id).await
    }

    /// # Errors
    /// Returns `StoreError` if the database write fails.
    pub async fn update_revision(&self, revision: RevisionRecord) -> StoreResult<RevisionRecord> {
        let key = revision.revision_id.clone();
        self.upsert(TABLE_REVISION, key, revision).await
    }

    /// Lists revisions on a document, oldest first.
    ///
    /// # Errors
    /// Returns `StoreError` if the database query fails.
    pub async fn list_revisions(
        &self,
        document_id: &str,
        status: Option<RevisionStatus>,
    ) -> StoreResult<Vec<RevisionRecord>> {
        let document_id = document_id.to_string();
        let mut response = if let Some(status) = status {
            let query = "SELECT * FROM revision WHERE document_id = $document_id AND status = $status ORDER BY created_at ASC;";
            self.db
                .query(query)
                .bind(("document_id", document_id))
                .bind(("status", status.as_str()))
                .await?
        } else {
            let query = "SELECT * FROM revision WHERE document_id = $document_id ORDER BY created_at ASC;";
            self.db
                .query(query)
                .bind(("document_id", document_id))
                .await?
        };
        let records: Vec<RevisionRecord> = response.take(0)?;
        Ok(records)
    }

    /// # Errors
    /// Returns `StoreError` if the database write fails.
    pub async fn delete_revisions(&self, document_id: &str) -> StoreResult<()> {
        self.remove_for_document(TABLE_REVISION, document_id).await
    }

    /// Creates a template record.
    ///
    /// # Errors
    /// Returns `StoreError` if the database write fails.
    pub async fn create_template(&self, template: TemplateRecord) -> StoreResult<TemplateRecord> {
        let key = template.template_id.clone();
        self.insert(TABLE_TEMPLATE, key, template).await
    }

    /// # Errors
    /// Returns `StoreError` if the database query fails.
    pub async fn get_template(&self, template_id: &str) -> StoreResult<Option<TemplateRecord>> {
        self.fetch(TABLE_TEMPLATE, template_id).await
    }

    /// Lists templates by name, optionally within one category.
    ///
    /// # Errors
    /// Returns `StoreError` if the database query fails.
    pub async fn list_templates(&self, category: Option<&str>) -> StoreResult<Vec<TemplateRecord>> {
        let mut response = if let Some(category) = category {
            let query = "SELECT * FROM template WHERE category = $category ORDER BY name ASC;";
            self.db
                .query(query)
                .bind(("category", category.to_string()))
                .await?
        } else {
            self.db.query("SELECT * FROM template ORDER BY name ASC;").await?
        };
        let records: Vec<TemplateRecord> = response.take(0)?;
        Ok(records)
    }

    /// # Errors
    /// Returns `StoreError` if the database write fails.
    pub async fn delete_template(&self, template_id: &str) -> StoreResult<Option<TemplateRecord>> {
        self.remove(TABLE_TEMPLATE, template_id).await
    }

    /// Creates an export job record.
    ///
    /// # Errors
    /// Returns `StoreError` if the database write fails.
    pub async fn create_export_job(&self, job: ExportJobRecord) -> StoreResult<ExportJobRecord> {
        let key = job.job_id.clone();
        self.insert(TABLE_EXPORT_JOB, key, job).await
    }

    /// # Errors
    /// Returns `StoreError` if the database query fails.
    pub async fn get_export_job(&self, job_id: &str) -> StoreResult<Option<ExportJobRecord>> {
        self.fetch(TABLE_EXPORT_JOB, job_id).await
    }

    /// # Errors
    /// Returns `StoreError` if the database write fails.
    pub async fn update_export_job(&self, job: ExportJobRecord) -> StoreResult<ExportJobRecord> {
        let key = job.job_id.clone();
        self.upsert(TABLE_EXPORT_JOB, key, job).await
    }

    /// # Errors
    /// Returns `StoreError` if the database query fails.
    pub async fn list_export_jobs(&self, document_id: &str) -> StoreResult<Vec<ExportJobRecord>> {
        let query = "SELECT * FROM export_job WHERE document_id = $document_id ORDER BY created_at DESC;";
        let mut response = self
            .db
            .query(query)
            .bind(("document_id", document_id.to_string()))
            .await?;
        let records: Vec<ExportJobRecord> = response.take(0)?;
        Ok(records)
    }

    /// # Errors
    /// Returns `StoreError` if the database write fails.
    pub async fn delete_export_jobs(&self, document_id: &str) -> StoreResult<()> {
        self.remove_for_document(TABLE_EXPORT_JOB, document_id).await
    }

    /// Appends an audit entry.
    ///
    /// # Errors
    /// Returns `StoreError` if the database write fails.
    pub async fn create_audit(&self, entry: AuditRecord) -> StoreResult<AuditRecord> {
        let record: Option<AuditRecord> = self.db.create(TABLE_AUDIT_LOG).content(entry).await?;
        require_record(record, TABLE_AUDIT_LOG)
    }

    /// Lists audit entries, newest first.
    ///
    /// # Errors
    /// Returns `StoreError` if the limit is invalid or the database query fails.
    pub async fn list_audit(
        &self,
        resource_id: Option<&str>,
        limit: usize,
    ) -> StoreResult<Vec<AuditRecord>> {
        let limit = limit_to_i64(limit)?;
        let mut response = if let Some(resource_id) = resource_id {
            let query = "SELECT * FROM audit_log WHERE resource_id = $resource_id ORDER BY created_at DESC LIMIT $limit;";
            self.db
                .query(query)
                .bind(("resource_id", resource_id.to_string()))
                .bind(("limit", limit))
                .await?
        } else {
            let query = "SELECT * FROM audit_log ORDER BY created_at DESC LIMIT $limit;";
            self.db.query(query).bind(("limit", limit)).await?
        };
        let records: Vec<AuditRecord> = response.take(0)?;
        Ok(records)
    }
}

fn document_conditions(filter: &DocumentQuery) -> String {
    let mut conditions = Vec::new();
    if filter.search.as_deref().and_then(normalize_pattern).is_some() {
        conditions.push(
            "(string::contains(string::lowercase(title), $search) OR string::contains(search_text, $search))",
        );
    }
    if filter.status.is_some() {
        conditions.push("status = $status");
    }
    if filter.owner.is_some() {
        conditions.push("owner = $owner");
    }
    if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    }
}

fn bind_document_filter<'r, C: Connection>(
    mut request: surrealdb::method::Query<'r, C>,
    filter: &DocumentQuery,
) -> surrealdb::method::Query<'r, C> {
    if let Some(search) = filter.search.as_deref().and_then(normalize_pattern) {
        request = request.bind(("search", search));
    }
    if let Some(status) = filter.status {
        request = request.bind(("status", status.as_str()));
    }
    if let Some(owner) = &filter.owner {
        request = request.bind(("owner", owner.clone()));
    }
    request
}

fn ensure_non_empty(value: &str, field: &str) -> StoreResult<()> {
    if value.is_empty() {
        return Err(StoreError::InvalidInput(format!("{field} is required")));
    }
    Ok(())
}

fn require_record<T>(record: Option<T>, table: &str) -> StoreResult<T> {
    record.ok_or_else(|| {
        StoreError::InvalidInput(format!(
            "No record returned when creating {table}"
        ))
    })
}

#[derive(serde::Deserialize)]
struct CountRow {
    total: usize,
}

fn normalize_pattern(pattern: &str) -> Option<String> {
    let trimmed = pattern.trim().to_lowercase();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn limit_to_i64(limit: usize) -> StoreResult<i64> {
    i64::try_from(limit).map_err(|_| {
        StoreError::InvalidInput("limit exceeds supported range".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_store::models::{AuditAction, RevisionAction};
    use surrealdb::engine::local::{Db, Mem};

    async fn store() -> SurrealDocStore<Db> {
        let db = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns("docx").use_db("test").await.unwrap();
        SurrealDocStore::new(db)
    }

    fn document(id: &str, title: &str, text: &str, updated_at: &str) -> DocumentRecord {
        DocumentRecord {
            id: None,
            document_id: id.to_string(),
            title: title.to_string(),
            description: None,
            status: DocumentStatus::Draft,
            file_name: format!("{id}.docx"),
            file_size: 10,
            mime_type: docx_store::schema::DOCX_MIME_TYPE.to_string(),
            version: 1,
            tracking_enabled: false,
            owner: None,
            metadata: None,
            search_text: text.to_string(),
            created_at: updated_at.to_string(),
            updated_at: updated_at.to_string(),
        }
    }

    #[tokio::test]
    async fn documents_round_trip_and_page() {
        let store = store().await;
        store
            .create_document(document("a", "Quarterly Report", "revenue grew", "2024-01-01T00:00:00Z"))
            .await
            .unwrap();
        store
            .create_document(document("b", "Memo", "lunch on friday", "2024-01-03T00:00:00Z"))
            .await
            .unwrap();
        store
            .create_document(document("c", "Notes", "report draft", "2024-01-02T00:00:00Z"))
            .await
            .unwrap();

        let duplicate = store
            .create_document(document("a", "Again", "", "2024-01-04T00:00:00Z"))
            .await;
        assert!(duplicate.is_err());

        let all = store
            .list_documents(&DocumentQuery::default(), 0, 10)
            .await
            .unwrap();
        let ids: Vec<_> = all.iter().map(|doc| doc.document_id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "a"]);

        let page = store
            .list_documents(&DocumentQuery::default(), 1, 1)
            .await
            .unwrap();
        assert_eq!(page[0].document_id, "c");

        let filter = DocumentQuery {
            search: Some("REPORT".to_string()),
            ..DocumentQuery::default()
        };
        assert_eq!(store.count_documents(&filter).await.unwrap(), 2);
        assert_eq!(
            store.count_documents(&DocumentQuery::default()).await.unwrap(),
            3
        );

        let mut fetched = store.get_document("a").await.unwrap().unwrap();
        fetched.status = DocumentStatus::Approved;
        store.update_document(fetched).await.unwrap();
        let approved = DocumentQuery {
            status: Some(DocumentStatus::Approved),
            ..DocumentQuery::default()
        };
        assert_eq!(store.count_documents(&approved).await.unwrap(), 1);

        assert!(store.delete_document("a").await.unwrap().is_some());
        assert!(store.get_document("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn versions_are_keyed_per_document() {
        let store = store().await;
        for number in [2, 1, 3] {
            store
                .create_version(VersionRecord {
                    id: None,
                    document_id: "doc".to_string(),
                    version_number: number,
                    file_name: format!("doc.v{number}.docx"),
                    file_size: 1,
                    change_summary: None,
                    created_by: None,
                    created_at: "2024-01-01T00:00:00Z".to_string(),
                })
                .await
                .unwrap();
        }
        let numbers: Vec<u32> = store
            .list_versions("doc")
            .await
            .unwrap()
            .iter()
            .map(|version| version.version_number)
            .collect();
        assert_eq!(numbers, [1, 2, 3]);
        assert!(store.get_version("doc", 2).await.unwrap().is_some());
        store.delete_version("doc", 2).await.unwrap();
        assert!(store.get_version("doc", 2).await.unwrap().is_none());
        store.delete_versions("doc").await.unwrap();
        assert!(store.list_versions("doc").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn comments_and_revisions_filter() {
        let store = store().await;
        for (id, paragraph, status) in [
            ("c1", 0, CommentStatus::Open),
            ("c2", 1, CommentStatus::Resolved),
            ("c3", 1, CommentStatus::Open),
        ] {
            store
                .create_comment(CommentRecord {
                    id: None,
                    comment_id: id.to_string(),
                    document_id: "doc".to_string(),
                    docx_comment_id: 0,
                    author: "ann".to_string(),
                    content: "check".to_string(),
                    status,
                    paragraph_index: paragraph,
                    start_offset: None,
                    end_offset: None,
                    parent_id: None,
                    created_at: format!("2024-01-01T00:00:0{}Z", &id[1..]),
                    updated_at: "2024-01-01T00:00:00Z".to_string(),
                    resolved_at: None,
                })
                .await
                .unwrap();
        }
        let open = store
            .list_comments("doc", Some(CommentStatus::Open), None)
            .await
            .unwrap();
        assert_eq!(open.len(), 2);
        let on_second = store.list_comments("doc", None, Some(1)).await.unwrap();
        assert_eq!(on_second.len(), 2);
        assert_eq!(on_second[0].comment_id, "c2");

        store
            .create_revision(RevisionRecord {
                id: None,
                revision_id: "r1".to_string(),
                document_id: "doc".to_string(),
                author: "bo".to_string(),
                action: RevisionAction::Insert,
                paragraph_index: 0,
                original_content: None,
                new_content: Some("more".to_string()),
                status: RevisionStatus::Pending,
                created_at: "2024-01-01T00:00:00Z".to_string(),
                decided_at: None,
                decided_by: None,
            })
            .await
            .unwrap();
        let pending = store
            .list_revisions("doc", Some(RevisionStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert!(
            store
                .list_revisions("doc", Some(RevisionStatus::Accepted))
                .await
                .unwrap()
                .is_empty()
        );

        store.delete_comments("doc").await.unwrap();
        store.delete_revisions("doc").await.unwrap();
        assert!(store.list_comments("doc", None, None).await.unwrap().is_empty());
        assert!(store.list_revisions("doc", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn audit_entries_are_newest_first() {
        let store = store().await;
        for (second, resource) in [(1, "a"), (2, "b"), (3, "a")] {
            store
                .create_audit(AuditRecord {
                    id: None,
                    action: AuditAction::Update,
                    resource_type: "document".to_string(),
                    resource_id: resource.to_string(),
                    details: None,
                    created_at: format!("2024-01-01T00:00:0{second}Z"),
                })
                .await
                .unwrap();
        }
        let for_a = store.list_audit(Some("a"), 10).await.unwrap();
        assert_eq!(for_a.len(), 2);
        assert_eq!(for_a[0].created_at, "2024-01-01T00:00:03Z");
        assert_eq!(store.list_audit(None, 2).await.unwrap().len(), 2);
    }
}
