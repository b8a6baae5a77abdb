//! 智能插座能耗采集进程：周期性轮询插座并写入 InfluxDB。

use ems_config::AppConfig;
use ems_pipeline::{Poller, PollerConfig};
use ems_protocol::DeviceClient;
use ems_storage::{InfluxConfig, InfluxSink};
use ems_telemetry::{init_tracing, metrics};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 初始化结构化日志
    init_tracing();
    // 从环境变量加载运行配置，缺失或非法时直接退出
    let config = AppConfig::from_env()?;

    let poller = build_poller(&config)?;
    info!(
        target: "ems.poller",
        devices = poller.devices().len(),
        interval_s = config.poll_interval_seconds,
        "starting energy poller"
    );

    // 周期循环不会自行结束，Ctrl-C 时退出
    tokio::select! {
        _ = poller.run(None) => {}
        _ = tokio::signal::ctrl_c() => {
            info!(target: "ems.poller", "shutdown signal received");
        }
    }

    let snapshot = metrics().snapshot();
    info!(
        target: "ems.poller",
        cycles = snapshot.cycles,
        device_success = snapshot.device_success,
        device_failure = snapshot.device_failure,
        write_success = snapshot.write_success,
        write_failure = snapshot.write_failure,
        "energy poller stopped"
    );
    Ok(())
}

fn build_poller(config: &AppConfig) -> Result<Poller, Box<dyn std::error::Error>> {
    let client = DeviceClient::new(Duration::from_secs(config.device_timeout_seconds));
    let sink = InfluxSink::new(InfluxConfig {
        url: config.influx_url.clone(),
        token: config.influx_token.clone(),
        org: config.influx_org.clone(),
        bucket: config.influx_bucket.clone(),
        timeout: Duration::from_secs(config.influx_timeout_seconds),
    })?;

    Ok(Poller::new(
        config.devices.clone(),
        Arc::new(client),
        Arc::new(sink),
        PollerConfig {
            interval: Duration::from_secs(config.poll_interval_seconds),
        },
    ))
}
