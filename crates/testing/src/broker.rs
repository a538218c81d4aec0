//! A [`BrokerPublish`] double that records every publish instead of talking
//! to a real AMQP broker — lets handler-level tests (dispatcher API
//! handlers, admin operations) assert on what would have been enqueued
//! without a RabbitMQ instance.

use parking_lot::Mutex;

use authscope_dispatcher::broker::BrokerPublish;
use authscope_domain::error::Result;
use authscope_domain::model::Task;

#[derive(Default)]
pub struct RecordingBroker {
    published: Mutex<Vec<(Task, String)>>,
}

impl RecordingBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks published so far, in publish order, each paired with the
    /// `reply_to` URL it was given.
    pub fn published(&self) -> Vec<(Task, String)> {
        self.published.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.published.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl BrokerPublish for RecordingBroker {
    async fn publish(&self, task: Task, reply_to: String) -> Result<()> {
        self.published.lock().push((task, reply_to));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authscope_domain::model::{AnalyzerKind, ScanConfig, ScanType};

    #[tokio::test]
    async fn records_published_tasks_in_order() {
        let broker = RecordingBroker::new();
        assert!(broker.is_empty());

        let scan_config = ScanConfig { scan_id: "scan-1".into(), scan_type: ScanType::Single, list_id: None, rank: None };
        let first = Task::new(scan_config.clone(), "a.example", AnalyzerKind::LandscapeAnalysis, serde_json::json!({}));
        let second = Task::new(scan_config, "b.example", AnalyzerKind::LandscapeAnalysis, serde_json::json!({}));

        broker.publish(first.clone(), "http://localhost/reply/1".into()).await.unwrap();
        broker.publish(second.clone(), "http://localhost/reply/2".into()).await.unwrap();

        let published = broker.published();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].0.domain, "a.example");
        assert_eq!(published[1].0.domain, "b.example");
        assert_eq!(published[0].1, "http://localhost/reply/1");
    }
}
