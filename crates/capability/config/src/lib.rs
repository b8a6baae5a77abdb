//! 采集进程运行配置加载。

use domain::{DEFAULT_DEVICE_PORT, Device};
use std::collections::HashSet;
use std::env;

/// 默认轮询间隔（秒）。
pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 10;

/// 默认设备查询超时（秒）。
pub const DEFAULT_DEVICE_TIMEOUT_SECONDS: u64 = 5;

/// 默认 InfluxDB 写入超时（秒）。
pub const DEFAULT_INFLUX_TIMEOUT_SECONDS: u64 = 5;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 采集进程运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub devices: Vec<Device>,
    pub device_timeout_seconds: u64,
    pub influx_url: String,
    pub influx_token: String,
    pub influx_org: String,
    pub influx_bucket: String,
    pub influx_timeout_seconds: u64,
    pub poll_interval_seconds: u64,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let hosts_raw = read_required("HS110_HOSTS")?;
        let device_port = read_u16_with_default("HS110_PORT", DEFAULT_DEVICE_PORT)?;
        let devices = parse_devices(&hosts_raw, device_port)?;
        let device_timeout_seconds =
            read_positive_u64_with_default("HS110_TIMEOUT_SECONDS", DEFAULT_DEVICE_TIMEOUT_SECONDS)?;
        let influx_url = read_required("INFLUXDB_URL")?;
        let influx_token = read_required("INFLUXDB_TOKEN")?;
        let influx_org = read_required("INFLUXDB_ORG")?;
        let influx_bucket = read_required("INFLUXDB_BUCKET")?;
        let influx_timeout_seconds = read_positive_u64_with_default(
            "INFLUXDB_TIMEOUT_SECONDS",
            DEFAULT_INFLUX_TIMEOUT_SECONDS,
        )?;
        let poll_interval_seconds =
            read_positive_u64_with_default("POLL_INTERVAL", DEFAULT_POLL_INTERVAL_SECONDS)?;

        Ok(Self {
            devices,
            device_timeout_seconds,
            influx_url,
            influx_token,
            influx_org,
            influx_bucket,
            influx_timeout_seconds,
            poll_interval_seconds,
        })
    }
}

/// 解析 `label:host[,label:host...]` 设备列表。
///
/// 每项在第一个 `:` 处切分，因此 `rack:::1` 得到主机 `::1`。
/// 标签与主机去除首尾空白后不能为空，也不能含控制字符（换行会拆断写入行），标签不能重复。
pub fn parse_devices(raw: &str, port: u16) -> Result<Vec<Device>, ConfigError> {
    let mut devices = Vec::new();
    let mut labels = HashSet::new();

    for entry in raw.split(',') {
        let invalid = || ConfigError::Invalid("HS110_HOSTS".to_string(), entry.to_string());
        let (label, host) = entry.trim().split_once(':').ok_or_else(invalid)?;
        let (label, host) = (label.trim(), host.trim());
        if label.is_empty() || host.is_empty() {
            return Err(invalid());
        }
        if label.chars().chain(host.chars()).any(char::is_control) {
            return Err(invalid());
        }
        if !labels.insert(label.to_string()) {
            return Err(ConfigError::Invalid(
                "HS110_HOSTS".to_string(),
                format!("duplicate label {}", label),
            ));
        }
        devices.push(Device::new(label, host, port));
    }

    Ok(devices)
}

fn read_required(key: &str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(key.to_string())),
    }
}

fn read_u16_with_default(key: &str, default: u16) -> Result<u16, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .trim()
        .parse::<u16>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_positive_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    match value.trim().parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ConfigError::Invalid(key.to_string(), value)),
    }
}
