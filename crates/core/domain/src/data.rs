use std::collections::BTreeMap;

/// 时序点位的 measurement 名称。
pub const ENERGY_MEASUREMENT: &str = "energy";

/// 设备标签在点位中的 tag 键。
pub const PLUG_TAG: &str = "plug";

/// 单次成功查询得到的插座遥测读数（设备原始单位）。
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub voltage_millivolts: i64,
    pub current_milliamps: i64,
    pub power_milliwatts: i64,
    pub total_watt_hours: f64,
    pub error_code: i64,
}

/// 点位字段（已换算为 V / A / W，累计电量保持 Wh 原值）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyFields {
    pub voltage: f64,
    pub current: f64,
    pub power: f64,
    pub total_wh: f64,
}

impl From<&Reading> for EnergyFields {
    fn from(reading: &Reading) -> Self {
        Self {
            voltage: reading.voltage_millivolts as f64 / 1000.0,
            current: reading.current_milliamps as f64 / 1000.0,
            power: reading.power_milliwatts as f64 / 1000.0,
            total_wh: reading.total_watt_hours,
        }
    }
}

/// 待写入时序库的单个点位。
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub fields: EnergyFields,
    pub timestamp_seconds: i64,
}

impl MetricPoint {
    /// 由设备标签、读数与周期时间戳构造 `energy` 点位。
    pub fn from_reading(label: &str, reading: &Reading, timestamp_seconds: i64) -> Self {
        let mut tags = BTreeMap::new();
        tags.insert(PLUG_TAG.to_string(), label.to_string());
        Self {
            measurement: ENERGY_MEASUREMENT.to_string(),
            tags,
            fields: EnergyFields::from(reading),
            timestamp_seconds,
        }
    }
}

/// 单个轮询周期：所有点位共享周期开始时捕获的时间戳。
#[derive(Debug, Clone, PartialEq)]
pub struct PollCycle {
    timestamp_seconds: i64,
    points: Vec<MetricPoint>,
}

impl PollCycle {
    pub fn new(timestamp_seconds: i64) -> Self {
        Self {
            timestamp_seconds,
            points: Vec::new(),
        }
    }

    pub fn timestamp_seconds(&self) -> i64 {
        self.timestamp_seconds
    }

    /// 追加一个设备读数，时间戳统一取周期时间戳。
    pub fn push_reading(&mut self, label: &str, reading: &Reading) {
        self.points
            .push(MetricPoint::from_reading(label, reading, self.timestamp_seconds));
    }

    pub fn points(&self) -> &[MetricPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn into_points(self) -> Vec<MetricPoint> {
        self.points
    }
}

/// 获取当前时间戳（秒）。
pub fn now_epoch_seconds() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
