//! Administrative operations on scans and tasks: rescanning a task that came
//! back with an exception, pruning duplicate tasks within a scan, deleting a
//! scan and its artifacts, and tagging scans.
//!
//! Grounded on the domain crate's own `AnalyzerKind`/`TaskState`/`TraceEvent`
//! and on the dedup-by-key pattern `authscope-candidates` uses for candidate
//! dedup (see DESIGN.md).

use std::collections::HashMap;
use std::sync::Arc;

use authscope_domain::error::{Error, Result};
use authscope_domain::model::{AnalyzerKind, ScanTag, Task, TaskResult};
use authscope_domain::trace::TraceEvent;

use crate::broker::BrokerPublish;
use crate::store::{BlobStore, DocumentStore};

pub struct AdminOps {
    pub documents: Arc<dyn DocumentStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub broker: Arc<dyn BrokerPublish>,
    pub reply_base_url: String,
}

impl AdminOps {
    pub(crate) fn reply_url(&self, task_id: &str) -> String {
        format!("{}/v1/tasks/{task_id}/reply", self.reply_base_url.trim_end_matches('/'))
    }

    /// Re-emits a task that previously completed with an exception, as a
    /// fresh task with a new `task_id` but the same scan/domain/analyzer
    /// context. Fails if the source task never ran or did not fail.
    pub async fn rescan_task(&self, source_task_id: &str) -> Result<Task> {
        let source = self
            .documents
            .get_task(source_task_id)
            .await?
            .ok_or_else(|| Error::AdminValidation(format!("task {source_task_id} not found")))?;

        let result = self.documents.get_result(source.analyzer, source_task_id).await?;
        let failed = result.map(|r| r.exception.is_some()).unwrap_or(true);
        if !failed {
            return Err(Error::AdminValidation(format!("task {source_task_id} did not fail; refusing to rescan")));
        }

        let fresh = Task::new(source.scan_config.clone(), source.domain.clone(), source.analyzer, source.analyzer_config.clone());
        let new_task_id = fresh.task_config.task_id.clone();

        self.documents.put_task(fresh.clone()).await?;
        self.broker.publish(fresh.clone(), self.reply_url(&new_task_id)).await?;

        TraceEvent::RescanEmitted { source_task_id: source_task_id.to_string(), new_task_id: new_task_id.clone() }.emit();
        Ok(fresh)
    }

    /// Within one scan's results for `analyzer`, groups by domain and keeps
    /// only the most recently completed task per domain, deleting the rest
    /// (and any blobs they reference). Returns the number of tasks removed.
    pub async fn prune_duplicates(&self, scan_id: &str, analyzer: AnalyzerKind) -> Result<usize> {
        let tasks = self.documents.tasks_for_scan(scan_id).await?;
        let mut by_domain: HashMap<String, Vec<Task>> = HashMap::new();
        for task in tasks.into_iter().filter(|t| t.analyzer == analyzer) {
            by_domain.entry(task.domain.clone()).or_default().push(task);
        }

        let mut removed_total = 0usize;
        for (domain, mut group) in by_domain {
            if group.len() < 2 {
                continue;
            }
            // Latest `request_sent` wins; ties broken by task_id so the
            // choice is deterministic.
            group.sort_by(|a, b| {
                let ts_a = a.task_config.timestamps.request_sent;
                let ts_b = b.task_config.timestamps.request_sent;
                ts_b.cmp(&ts_a).then_with(|| a.task_config.task_id.cmp(&b.task_config.task_id))
            });
            let kept = group.remove(0);
            let removed_count = group.len();

            for stale in &group {
                if let Some(mut result) = self.documents.get_result(analyzer, &stale.task_config.task_id).await? {
                    self.delete_result_blobs(&mut result).await?;
                }
            }

            TraceEvent::DuplicatePruned {
                scan_id: scan_id.to_string(),
                task_id: domain,
                kept: kept.task_config.task_id.clone(),
                removed_count,
            }
            .emit();
            removed_total += removed_count;
        }

        Ok(removed_total)
    }

    /// Deletes a scan, its tasks, and every result and blob they reference.
    pub async fn delete_scan(&self, scan_id: &str) -> Result<usize> {
        let results = self.documents.delete_results_for_scan(scan_id).await?;
        let mut blobs_removed = 0usize;
        for mut result in results {
            blobs_removed += self.delete_result_blobs(&mut result).await?;
        }
        self.documents.delete_tasks_for_scan(scan_id).await?;
        self.documents.delete_scan(scan_id).await?;

        TraceEvent::ScanDeleted { scan_id: scan_id.to_string(), blobs_removed }.emit();
        Ok(blobs_removed)
    }

    /// Walks a result's JSON representation for `BlobReference`s and deletes
    /// the objects they point to, returning how many were removed.
    async fn delete_result_blobs(&self, result: &mut TaskResult) -> Result<usize> {
        let value = serde_json::to_value(&*result)?;
        let mut count = 0usize;
        let mut stack = vec![value];
        while let Some(node) = stack.pop() {
            match node {
                serde_json::Value::Object(map) => {
                    let is_reference = map.get("type").and_then(|v| v.as_str()) == Some("reference");
                    if is_reference {
                        if let Some(data) = map.get("data") {
                            let bucket = data.get("bucket_name").and_then(|v| v.as_str());
                            let object = data.get("object_name").and_then(|v| v.as_str());
                            if let (Some(bucket), Some(object)) = (bucket, object) {
                                if self.blobs.delete(bucket, object).await? {
                                    count += 1;
                                }
                            }
                        }
                        continue;
                    }
                    stack.extend(map.into_values());
                }
                serde_json::Value::Array(items) => stack.extend(items),
                _ => {}
            }
        }
        Ok(count)
    }

    pub async fn add_tag(&self, tag_name: &str, scan_id: &str) -> Result<ScanTag> {
        self.documents.upsert_tag(tag_name, scan_id).await
    }

    pub async fn remove_tag(&self, tag_name: &str, scan_id: &str) -> Result<Option<ScanTag>> {
        self.documents.remove_tag(tag_name, scan_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryBlobStore, InMemoryDocumentStore};
    use authscope_domain::model::{ResolvedDomain, ScanConfig, ScanType};
    use authscope_testing::RecordingBroker;

    fn ops() -> AdminOps {
        AdminOps {
            documents: Arc::new(InMemoryDocumentStore::new()),
            blobs: Arc::new(InMemoryBlobStore::new()),
            broker: Arc::new(RecordingBroker::new()),
            reply_base_url: "http://127.0.0.1:8080".into(),
        }
    }

    fn task(scan_id: &str, domain: &str) -> Task {
        Task::new(
            ScanConfig { scan_id: scan_id.into(), scan_type: ScanType::Single, list_id: None, rank: None },
            domain,
            AnalyzerKind::LandscapeAnalysis,
            serde_json::json!({}),
        )
    }

    fn result_for(task: &Task, exception: Option<&str>) -> TaskResult {
        TaskResult {
            task_id: task.task_config.task_id.clone(),
            scan_id: task.scan_config.scan_id.clone(),
            resolved: ResolvedDomain { reachable: exception.is_none(), domain: Some(task.domain.clone()), url: None, error_msg: exception.map(String::from) },
            timings: Default::default(),
            login_page_candidates: Vec::new(),
            authentication_mechanisms: Default::default(),
            identity_providers: Vec::new(),
            metadata_available: Default::default(),
            metadata_data: Default::default(),
            exception: exception.map(String::from),
        }
    }

    #[tokio::test]
    async fn prune_duplicates_keeps_latest_and_removes_rest() {
        let ops = ops();
        let mut older = task("scan-1", "example.com");
        // Force a deterministic ordering by request_sent.
        older.task_config.timestamps.request_sent = Some(chrono::Utc::now() - chrono::Duration::seconds(60));
        let newer = task("scan-1", "example.com");

        ops.documents.put_task(older.clone()).await.unwrap();
        ops.documents.put_task(newer.clone()).await.unwrap();
        ops.documents.put_result(AnalyzerKind::LandscapeAnalysis, result_for(&older, None)).await.unwrap();
        ops.documents.put_result(AnalyzerKind::LandscapeAnalysis, result_for(&newer, None)).await.unwrap();

        let removed = ops.prune_duplicates("scan-1", AnalyzerKind::LandscapeAnalysis).await.unwrap();
        assert_eq!(removed, 1);
    }

    #[tokio::test]
    async fn rescan_task_refuses_when_source_did_not_fail() {
        let ops = ops();
        let t = task("scan-1", "example.com");
        ops.documents.put_task(t.clone()).await.unwrap();
        ops.documents.put_result(AnalyzerKind::LandscapeAnalysis, result_for(&t, None)).await.unwrap();

        let err = ops.rescan_task(&t.task_config.task_id).await.unwrap_err();
        assert!(matches!(err, Error::AdminValidation(_)));
    }

    #[tokio::test]
    async fn add_and_remove_tag() {
        let ops = ops();
        let tag = ops.add_tag("latest", "scan-1").await.unwrap();
        assert!(tag.scan_ids.contains("scan-1"));
        let tag = ops.remove_tag("latest", "scan-1").await.unwrap().unwrap();
        assert!(!tag.scan_ids.contains("scan-1"));
    }
}
