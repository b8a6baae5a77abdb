//! 轮询编排
//!
//! 一个周期：捕获时间戳 → 按配置顺序逐台查询设备 → 成功读数组成批次 → 批次非空时写入一次。
//! 单台设备失败只记录日志，不影响其他设备与写入；写入失败同样只记录日志，
//! 下一个周期独立重试当时的数据，不补发之前失败的批次。

use domain::{Device, EnergyFields, PollCycle, now_epoch_seconds};
use ems_protocol::{ProtocolError, ReadingSource};
use ems_storage::{MetricSink, SinkError};
use ems_telemetry::{
    new_cycle_id, record_cycle, record_device_failure, record_device_success,
    record_write_failure, record_write_latency_ms, record_write_success,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{Instrument, debug, error, info, warn};

/// 轮询参数。
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
        }
    }
}

/// 单台设备在本周期的失败记录。
#[derive(Debug)]
pub struct DeviceFailure {
    pub label: String,
    pub error: ProtocolError,
}

/// 本周期批次的写入结果。
#[derive(Debug)]
pub enum Delivery {
    /// 没有任何点位，未调用写入
    Skipped,
    Written,
    Failed(SinkError),
}

/// 一个周期的执行结果。
#[derive(Debug)]
pub struct CycleReport {
    pub cycle: PollCycle,
    pub failures: Vec<DeviceFailure>,
    pub delivery: Delivery,
}

/// 轮询器：顺序查询设备并写入批次。
pub struct Poller {
    devices: Vec<Device>,
    source: Arc<dyn ReadingSource>,
    sink: Arc<dyn MetricSink>,
    config: PollerConfig,
}

impl Poller {
    pub fn new(
        devices: Vec<Device>,
        source: Arc<dyn ReadingSource>,
        sink: Arc<dyn MetricSink>,
        config: PollerConfig,
    ) -> Self {
        Self {
            devices,
            source,
            sink,
            config,
        }
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    /// 以当前时间执行一个周期。
    pub async fn poll_once(&self) -> CycleReport {
        self.poll_at(now_epoch_seconds()).await
    }

    /// 以给定时间戳执行一个周期，本周期所有点位共享该时间戳。
    pub async fn poll_at(&self, timestamp_seconds: i64) -> CycleReport {
        let cycle_id = new_cycle_id();
        let span = tracing::info_span!(
            "poll_cycle",
            cycle_id = %cycle_id,
            timestamp = timestamp_seconds
        );
        self.run_cycle(timestamp_seconds).instrument(span).await
    }

    /// 循环执行周期，每个周期之间等待固定间隔；`max_cycles` 为 `None` 时不终止。
    /// 返回已完成的周期数。
    pub async fn run(&self, max_cycles: Option<u64>) -> u64 {
        let mut completed = 0;
        loop {
            self.poll_once().await;
            completed += 1;
            if max_cycles.is_some_and(|max| completed >= max) {
                return completed;
            }
            tokio::time::sleep(self.config.interval).await;
        }
    }

    async fn run_cycle(&self, timestamp_seconds: i64) -> CycleReport {
        record_cycle();
        let mut cycle = PollCycle::new(timestamp_seconds);
        let mut failures = Vec::new();

        for device in &self.devices {
            let result = match self.source.read(device).await {
                Ok(reading) if reading.error_code != 0 => Err(ProtocolError::Device {
                    err_code: reading.error_code,
                }),
                other => other,
            };

            match result {
                Ok(reading) => {
                    record_device_success();
                    let fields = EnergyFields::from(&reading);
                    info!(
                        target: "ems.poller",
                        plug = %device.label,
                        voltage_v = fields.voltage,
                        current_a = fields.current,
                        power_w = fields.power,
                        total_wh = fields.total_wh,
                        "device_reading"
                    );
                    cycle.push_reading(&device.label, &reading);
                }
                Err(error) => {
                    record_device_failure();
                    warn!(
                        target: "ems.poller",
                        plug = %device.label,
                        host = %device.host,
                        kind = error.kind(),
                        error = %error,
                        "device_query_failed"
                    );
                    failures.push(DeviceFailure {
                        label: device.label.clone(),
                        error,
                    });
                }
            }
        }

        let delivery = self.deliver(&cycle).await;
        CycleReport {
            cycle,
            failures,
            delivery,
        }
    }

    async fn deliver(&self, cycle: &PollCycle) -> Delivery {
        if cycle.is_empty() {
            debug!(target: "ems.poller", "no_points_to_write");
            return Delivery::Skipped;
        }

        let points = cycle.points();
        let timestamp = cycle.timestamp_seconds();
        let started = Instant::now();
        match self.sink.write(points).await {
            Ok(()) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                record_write_latency_ms(latency_ms);
                record_write_success(points.len());
                info!(target: "ems.poller", points = points.len(), timestamp, latency_ms, "batch_written");
                Delivery::Written
            }
            Err(err) => {
                record_write_failure();
                error!(
                    target: "ems.poller",
                    points = points.len(),
                    timestamp,
                    error = %err,
                    "batch_write_failed"
                );
                Delivery::Failed(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use domain::Reading;
    use ems_storage::InMemoryMetricSink;
    use std::collections::HashMap;

    /// 按标签返回固定结果；未登记的标签视为连接被拒绝。
    #[derive(Default)]
    struct ScriptedSource {
        readings: HashMap<String, Reading>,
    }

    impl ScriptedSource {
        fn with(self, label: &str, voltage_mv: i64) -> Self {
            self.with_error_code(label, voltage_mv, 0)
        }

        fn with_error_code(mut self, label: &str, voltage_mv: i64, error_code: i64) -> Self {
            self.readings.insert(
                label.to_string(),
                Reading {
                    voltage_millivolts: voltage_mv,
                    current_milliamps: 1_000,
                    power_milliwatts: 2_000,
                    total_watt_hours: 3.0,
                    error_code,
                },
            );
            self
        }
    }

    #[async_trait]
    impl ReadingSource for ScriptedSource {
        async fn read(&self, device: &Device) -> Result<Reading, ProtocolError> {
            self.readings
                .get(&device.label)
                .cloned()
                .ok_or_else(|| ProtocolError::ConnectionRefused(device.host.clone()))
        }
    }

    fn devices(labels: &[&str]) -> Vec<Device> {
        labels
            .iter()
            .enumerate()
            .map(|(i, label)| Device::new(*label, format!("10.0.0.{}", i + 1), 9999))
            .collect()
    }

    #[tokio::test]
    async fn failed_device_is_isolated() {
        let source = Arc::new(ScriptedSource::default().with("a", 230_000).with("c", 231_000));
        let sink = Arc::new(InMemoryMetricSink::new());
        let poller = Poller::new(
            devices(&["a", "b", "c"]),
            source,
            sink.clone(),
            PollerConfig::default(),
        );

        let report = poller.poll_at(1_700_000_000).await;

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].label, "b");
        assert!(matches!(report.delivery, Delivery::Written));
        let batches = sink.batches().await;
        assert_eq!(batches.len(), 1);
        let labels: Vec<&str> = batches[0].iter().map(|p| p.tags["plug"].as_str()).collect();
        assert_eq!(labels, vec!["a", "c"]);
        assert!(batches[0].iter().all(|p| p.timestamp_seconds == 1_700_000_000));
        assert_eq!(report.cycle.timestamp_seconds(), 1_700_000_000);
    }

    #[tokio::test]
    async fn reading_with_error_code_is_discarded() {
        let sink = Arc::new(InMemoryMetricSink::new());
        let poller = Poller::new(
            devices(&["a"]),
            Arc::new(ScriptedSource::default().with_error_code("a", 230_000, -3)),
            sink.clone(),
            PollerConfig::default(),
        );

        let report = poller.poll_at(1).await;

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].label, "a");
        assert_eq!(report.failures[0].error.kind(), "device_error");
        assert!(matches!(
            report.failures[0].error,
            ProtocolError::Device { err_code: -3 }
        ));
        assert!(report.cycle.is_empty());
        assert!(matches!(report.delivery, Delivery::Skipped));
        assert!(sink.batches().await.is_empty());
    }

    #[tokio::test]
    async fn empty_cycle_skips_sink() {
        let sink = Arc::new(InMemoryMetricSink::new());
        let poller = Poller::new(
            devices(&["a", "b"]),
            Arc::new(ScriptedSource::default()),
            sink.clone(),
            PollerConfig::default(),
        );

        let report = poller.poll_at(1).await;

        assert_eq!(report.failures.len(), 2);
        assert!(matches!(report.delivery, Delivery::Skipped));
        assert!(sink.batches().await.is_empty());
    }

    #[tokio::test]
    async fn sink_failure_does_not_escape_cycle() {
        let sink = Arc::new(InMemoryMetricSink::failing(500));
        let poller = Poller::new(
            devices(&["a"]),
            Arc::new(ScriptedSource::default().with("a", 230_000)),
            sink.clone(),
            PollerConfig::default(),
        );

        let report = poller.poll_at(1).await;

        match report.delivery {
            Delivery::Failed(SinkError::Write { status, .. }) => assert_eq!(status, 500),
            other => panic!("unexpected delivery: {:?}", other),
        }
        assert_eq!(report.cycle.points().len(), 1);
    }

    #[tokio::test]
    async fn run_stops_after_max_cycles() {
        let sink = Arc::new(InMemoryMetricSink::new());
        let poller = Poller::new(
            devices(&["a"]),
            Arc::new(ScriptedSource::default().with("a", 230_000)),
            sink.clone(),
            PollerConfig {
                interval: Duration::from_millis(10),
            },
        );

        assert_eq!(poller.run(Some(3)).await, 3);
        assert_eq!(sink.batches().await.len(), 3);
    }
}
