pub mod data;

pub use data::{
    ENERGY_MEASUREMENT, EnergyFields, MetricPoint, PLUG_TAG, PollCycle, Reading,
    now_epoch_seconds,
};

/// 设备协议默认端口。
pub const DEFAULT_DEVICE_PORT: u16 = 9999;

/// 被轮询的计量插座：启动时由配置构造，之后不可变。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub label: String,
    pub host: String,
    pub port: u16,
}

impl Device {
    /// 构造显式标签、主机与端口的设备。
    pub fn new(label: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            label: label.into(),
            host: host.into(),
            port,
        }
    }
}
