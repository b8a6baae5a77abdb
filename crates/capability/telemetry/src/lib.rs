//! 追踪初始化、轮询计数器与周期 ID 生成。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 基础指标快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub cycles: u64,
    pub device_success: u64,
    pub device_failure: u64,
    pub write_success: u64,
    pub write_failure: u64,
    pub points_written: u64,
    pub write_latency_ms_total: u64,
    pub write_latency_ms_count: u64,
}

/// 进程级轮询指标。
pub struct TelemetryMetrics {
    cycles: AtomicU64,
    device_success: AtomicU64,
    device_failure: AtomicU64,
    write_success: AtomicU64,
    write_failure: AtomicU64,
    points_written: AtomicU64,
    write_latency_ms_total: AtomicU64,
    write_latency_ms_count: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            cycles: AtomicU64::new(0),
            device_success: AtomicU64::new(0),
            device_failure: AtomicU64::new(0),
            write_success: AtomicU64::new(0),
            write_failure: AtomicU64::new(0),
            points_written: AtomicU64::new(0),
            write_latency_ms_total: AtomicU64::new(0),
            write_latency_ms_count: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            device_success: self.device_success.load(Ordering::Relaxed),
            device_failure: self.device_failure.load(Ordering::Relaxed),
            write_success: self.write_success.load(Ordering::Relaxed),
            write_failure: self.write_failure.load(Ordering::Relaxed),
            points_written: self.points_written.load(Ordering::Relaxed),
            write_latency_ms_total: self.write_latency_ms_total.load(Ordering::Relaxed),
            write_latency_ms_count: self.write_latency_ms_count.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的轮询周期 ID。
pub fn new_cycle_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 记录轮询周期次数。
pub fn record_cycle() {
    metrics().cycles.fetch_add(1, Ordering::Relaxed);
}

/// 记录设备查询成功次数。
pub fn record_device_success() {
    metrics().device_success.fetch_add(1, Ordering::Relaxed);
}

/// 记录设备查询失败次数。
pub fn record_device_failure() {
    metrics().device_failure.fetch_add(1, Ordering::Relaxed);
}

/// 记录批次写入成功，并累计写入点位数。
pub fn record_write_success(points: usize) {
    let metrics = metrics();
    metrics.write_success.fetch_add(1, Ordering::Relaxed);
    metrics
        .points_written
        .fetch_add(points as u64, Ordering::Relaxed);
}

/// 记录批次写入失败次数。
pub fn record_write_failure() {
    metrics().write_failure.fetch_add(1, Ordering::Relaxed);
}

/// 记录写入延迟（毫秒）。
pub fn record_write_latency_ms(latency_ms: u64) {
    let metrics = metrics();
    metrics
        .write_latency_ms_total
        .fetch_add(latency_ms, Ordering::Relaxed);
    metrics
        .write_latency_ms_count
        .fetch_add(1, Ordering::Relaxed);
}
