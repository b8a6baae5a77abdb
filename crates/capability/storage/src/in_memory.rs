//! 内存写入实现（用于测试和演示）

use crate::error::SinkError;
use crate::line_protocol::encode_batch;
use crate::traits::MetricSink;
use async_trait::async_trait;
use domain::MetricPoint;
use tokio::sync::Mutex;

/// 记录每次写入的批次，可配置为固定失败。
#[derive(Debug, Default)]
pub struct InMemoryMetricSink {
    batches: Mutex<Vec<Vec<MetricPoint>>>,
    fail_with_status: Option<u16>,
}

impl InMemoryMetricSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 每次写入都返回指定状态码的 `SinkError::Write`（批次仍会被记录）。
    pub fn failing(status: u16) -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
            fail_with_status: Some(status),
        }
    }

    pub async fn batches(&self) -> Vec<Vec<MetricPoint>> {
        self.batches.lock().await.clone()
    }

    /// 已写入批次的 line protocol 报文体
    pub async fn bodies(&self) -> Vec<String> {
        self.batches
            .lock()
            .await
            .iter()
            .map(|batch| encode_batch(batch))
            .collect()
    }
}

#[async_trait]
impl MetricSink for InMemoryMetricSink {
    async fn write(&self, points: &[MetricPoint]) -> Result<(), SinkError> {
        self.batches.lock().await.push(points.to_vec());
        match self.fail_with_status {
            Some(status) => Err(SinkError::Write {
                status,
                body: "in-memory failure".to_string(),
            }),
            None => Ok(()),
        }
    }
}
