//! Storage abstractions the dispatcher sits on top of.
//!
//! §4.9 treats the document store and blob store as abstract — a deployment
//! wires in whatever it has (Mongo, S3, ...). We express that as two small
//! `async_trait`s and ship an in-memory implementation of each, adequate for
//! tests and for a single-process deployment; a real deployment swaps these
//! for implementations backed by `document_store`/`blob_store` config.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use authscope_domain::error::Result;
use authscope_domain::model::{AnalyzerKind, Scan, ScanTag, Task, TaskResult, TaskState, TaskTimestamps};

#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn put_scan(&self, scan: Scan) -> Result<()>;
    async fn get_scan(&self, scan_id: &str) -> Result<Option<Scan>>;
    async fn delete_scan(&self, scan_id: &str) -> Result<()>;

    async fn put_task(&self, task: Task) -> Result<()>;
    async fn get_task(&self, task_id: &str) -> Result<Option<Task>>;
    async fn update_task_state(&self, task_id: &str, state: TaskState, timestamps: TaskTimestamps) -> Result<()>;
    async fn tasks_for_scan(&self, scan_id: &str) -> Result<Vec<Task>>;
    async fn pending_tasks_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<Task>>;
    async fn delete_tasks_for_scan(&self, scan_id: &str) -> Result<usize>;

    async fn put_result(&self, analyzer: AnalyzerKind, result: TaskResult) -> Result<()>;
    async fn get_result(&self, analyzer: AnalyzerKind, task_id: &str) -> Result<Option<TaskResult>>;
    async fn results_for_scan(&self, analyzer: AnalyzerKind, scan_id: &str) -> Result<Vec<TaskResult>>;
    /// Removes every stored result for `scan_id` across all analyzer
    /// collections and returns them, so the caller can walk each for
    /// `BlobReference`s to clean up before the documents are gone.
    async fn delete_results_for_scan(&self, scan_id: &str) -> Result<Vec<TaskResult>>;

    async fn upsert_tag(&self, tag_name: &str, scan_id: &str) -> Result<ScanTag>;
    async fn remove_tag(&self, tag_name: &str, scan_id: &str) -> Result<Option<ScanTag>>;
    async fn get_tag(&self, tag_name: &str) -> Result<Option<ScanTag>>;
}

#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, bucket: &str, object_name: &str, bytes: Vec<u8>) -> Result<()>;
    async fn get(&self, bucket: &str, object_name: &str) -> Result<Option<Vec<u8>>>;
    async fn delete(&self, bucket: &str, object_name: &str) -> Result<bool>;
}

#[derive(Default)]
struct DocumentTables {
    scans: HashMap<String, Scan>,
    tasks: HashMap<String, Task>,
    /// scan_id -> task_ids, so scan-scoped queries don't need a full scan.
    tasks_by_scan: HashMap<String, Vec<String>>,
    results: HashMap<AnalyzerKind, HashMap<String, TaskResult>>,
    tags: HashMap<String, ScanTag>,
}

/// Single-process, in-memory document store. Adequate for tests and for a
/// dispatcher run without a durable backend; state is lost on restart.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    tables: RwLock<DocumentTables>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn put_scan(&self, scan: Scan) -> Result<()> {
        self.tables.write().scans.insert(scan.scan_id.clone(), scan);
        Ok(())
    }

    async fn get_scan(&self, scan_id: &str) -> Result<Option<Scan>> {
        Ok(self.tables.read().scans.get(scan_id).cloned())
    }

    async fn delete_scan(&self, scan_id: &str) -> Result<()> {
        self.tables.write().scans.remove(scan_id);
        Ok(())
    }

    async fn put_task(&self, task: Task) -> Result<()> {
        let mut tables = self.tables.write();
        let task_id = task.task_config.task_id.clone();
        let scan_id = task.scan_config.scan_id.clone();
        tables.tasks_by_scan.entry(scan_id).or_default().push(task_id.clone());
        tables.tasks.insert(task_id, task);
        Ok(())
    }

    async fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
        Ok(self.tables.read().tasks.get(task_id).cloned())
    }

    async fn update_task_state(&self, task_id: &str, state: TaskState, timestamps: TaskTimestamps) -> Result<()> {
        let mut tables = self.tables.write();
        if let Some(task) = tables.tasks.get_mut(task_id) {
            task.task_config.task_state = state;
            task.task_config.timestamps = timestamps;
        }
        Ok(())
    }

    async fn tasks_for_scan(&self, scan_id: &str) -> Result<Vec<Task>> {
        let tables = self.tables.read();
        Ok(tables
            .tasks_by_scan
            .get(scan_id)
            .into_iter()
            .flatten()
            .filter_map(|id| tables.tasks.get(id).cloned())
            .collect())
    }

    async fn pending_tasks_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<Task>> {
        let tables = self.tables.read();
        Ok(tables
            .tasks
            .values()
            .filter(|t| !t.task_config.task_state.is_terminal())
            .filter(|t| t.task_config.timestamps.request_sent.map(|ts| ts < cutoff).unwrap_or(false))
            .cloned()
            .collect())
    }

    async fn delete_tasks_for_scan(&self, scan_id: &str) -> Result<usize> {
        let mut tables = self.tables.write();
        let ids = tables.tasks_by_scan.remove(scan_id).unwrap_or_default();
        for id in &ids {
            tables.tasks.remove(id);
        }
        Ok(ids.len())
    }

    async fn put_result(&self, analyzer: AnalyzerKind, result: TaskResult) -> Result<()> {
        self.tables
            .write()
            .results
            .entry(analyzer)
            .or_default()
            .insert(result.task_id.clone(), result);
        Ok(())
    }

    async fn get_result(&self, analyzer: AnalyzerKind, task_id: &str) -> Result<Option<TaskResult>> {
        Ok(self
            .tables
            .read()
            .results
            .get(&analyzer)
            .and_then(|m| m.get(task_id))
            .cloned())
    }

    async fn results_for_scan(&self, analyzer: AnalyzerKind, scan_id: &str) -> Result<Vec<TaskResult>> {
        Ok(self
            .tables
            .read()
            .results
            .get(&analyzer)
            .into_iter()
            .flat_map(|m| m.values())
            .filter(|r| r.scan_id == scan_id)
            .cloned()
            .collect())
    }

    async fn delete_results_for_scan(&self, scan_id: &str) -> Result<Vec<TaskResult>> {
        let mut tables = self.tables.write();
        let mut removed = Vec::new();
        for per_analyzer in tables.results.values_mut() {
            let matching: Vec<String> = per_analyzer
                .iter()
                .filter(|(_, r)| r.scan_id == scan_id)
                .map(|(id, _)| id.clone())
                .collect();
            for id in matching {
                if let Some(r) = per_analyzer.remove(&id) {
                    removed.push(r);
                }
            }
        }
        Ok(removed)
    }

    async fn upsert_tag(&self, tag_name: &str, scan_id: &str) -> Result<ScanTag> {
        let mut tables = self.tables.write();
        let tag = tables.tags.entry(tag_name.to_string()).or_insert_with(|| ScanTag {
            tag_name: tag_name.to_string(),
            scan_ids: Default::default(),
        });
        tag.scan_ids.insert(scan_id.to_string());
        Ok(tag.clone())
    }

    async fn remove_tag(&self, tag_name: &str, scan_id: &str) -> Result<Option<ScanTag>> {
        let mut tables = self.tables.write();
        match tables.tags.get_mut(tag_name) {
            Some(tag) => {
                tag.scan_ids.remove(scan_id);
                Ok(Some(tag.clone()))
            }
            None => Ok(None),
        }
    }

    async fn get_tag(&self, tag_name: &str) -> Result<Option<ScanTag>> {
        Ok(self.tables.read().tags.get(tag_name).cloned())
    }
}

/// In-memory blob store keyed on `(bucket, object_name)`.
#[derive(Default)]
pub struct InMemoryBlobStore {
    objects: RwLock<HashMap<(String, String), Vec<u8>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, bucket: &str, object_name: &str, bytes: Vec<u8>) -> Result<()> {
        self.objects.write().insert((bucket.to_string(), object_name.to_string()), bytes);
        Ok(())
    }

    async fn get(&self, bucket: &str, object_name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.objects.read().get(&(bucket.to_string(), object_name.to_string())).cloned())
    }

    async fn delete(&self, bucket: &str, object_name: &str) -> Result<bool> {
        Ok(self.objects.write().remove(&(bucket.to_string(), object_name.to_string())).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authscope_domain::model::{ScanConfig, ScanParams, ScanType};

    fn sample_task(scan_id: &str) -> Task {
        Task::new(
            ScanConfig { scan_id: scan_id.into(), scan_type: ScanType::Single, list_id: None, rank: None },
            "example.com",
            AnalyzerKind::LandscapeAnalysis,
            serde_json::json!({}),
        )
    }

    #[tokio::test]
    async fn tasks_for_scan_round_trips() {
        let store = InMemoryDocumentStore::new();
        let task = sample_task("scan-1");
        let task_id = task.task_config.task_id.clone();
        store.put_task(task).await.unwrap();

        let tasks = store.tasks_for_scan("scan-1").await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].task_config.task_id, task_id);
    }

    #[tokio::test]
    async fn delete_scan_removes_tasks_and_results() {
        let store = InMemoryDocumentStore::new();
        let task = sample_task("scan-2");
        let task_id = task.task_config.task_id.clone();
        store.put_task(task).await.unwrap();
        store
            .put_result(
                AnalyzerKind::LandscapeAnalysis,
                TaskResult {
                    task_id: task_id.clone(),
                    scan_id: "scan-2".into(),
                    resolved: authscope_domain::model::ResolvedDomain { reachable: true, domain: None, url: None, error_msg: None },
                    timings: Default::default(),
                    login_page_candidates: Vec::new(),
                    authentication_mechanisms: Default::default(),
                    identity_providers: Vec::new(),
                    metadata_available: Default::default(),
                    metadata_data: Default::default(),
                    exception: None,
                },
            )
            .await
            .unwrap();

        let deleted_tasks = store.delete_tasks_for_scan("scan-2").await.unwrap();
        assert_eq!(deleted_tasks, 1);
        let deleted_results = store.delete_results_for_scan("scan-2").await.unwrap();
        assert_eq!(deleted_results.len(), 1);
        assert!(store.tasks_for_scan("scan-2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn tag_upsert_and_remove() {
        let store = InMemoryDocumentStore::new();
        let tag = store.upsert_tag("latest", "scan-1").await.unwrap();
        assert!(tag.scan_ids.contains("scan-1"));

        store.upsert_tag("latest", "scan-2").await.unwrap();
        let tag = store.get_tag("latest").await.unwrap().unwrap();
        assert_eq!(tag.scan_ids.len(), 2);

        let tag = store.remove_tag("latest", "scan-1").await.unwrap().unwrap();
        assert!(!tag.scan_ids.contains("scan-1"));
    }

    #[tokio::test]
    async fn blob_store_put_get_delete() {
        let blobs = InMemoryBlobStore::new();
        blobs.put("bucket", "obj", vec![1, 2, 3]).await.unwrap();
        assert_eq!(blobs.get("bucket", "obj").await.unwrap(), Some(vec![1, 2, 3]));
        assert!(blobs.delete("bucket", "obj").await.unwrap());
        assert_eq!(blobs.get("bucket", "obj").await.unwrap(), None);
    }
}
