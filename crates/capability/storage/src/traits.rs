//! 写入接口 Trait 定义
//!
//! 设计原则：
//! - 一次调用对应一次外发写入，内部不重试
//! - 失败统一返回 SinkError
//! - 使用 async_trait 支持动态分发

use crate::error::SinkError;
use async_trait::async_trait;
use domain::MetricPoint;

/// 时序点位写入接口
#[async_trait]
pub trait MetricSink: Send + Sync {
    /// 写入一个批次
    async fn write(&self, points: &[MetricPoint]) -> Result<(), SinkError>;
}
