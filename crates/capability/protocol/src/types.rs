//! 协议相关类型定义

use domain::Reading;
use serde::Deserialize;

/// 实时电量查询命令
pub const REALTIME_REQUEST: &str = r#"{"emeter":{"get_realtime":{}}}"#;

/// 响应中遥测对象的路径：`emeter.get_realtime`
pub const REALTIME_PATH: [&str; 2] = ["emeter", "get_realtime"];

/// 插座实时电量数据（`emeter.get_realtime`）
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeData {
    /// 电压（毫伏）
    pub voltage_mv: i64,
    /// 电流（毫安）
    pub current_ma: i64,
    /// 功率（毫瓦）
    pub power_mw: i64,
    /// 累计电量（瓦时）
    pub total_wh: f64,
    /// 错误码，缺省视为 0
    #[serde(default)]
    pub err_code: i64,
}

impl From<RealtimeData> for Reading {
    fn from(data: RealtimeData) -> Self {
        Reading {
            voltage_millivolts: data.voltage_mv,
            current_milliamps: data.current_ma,
            power_milliwatts: data.power_mw,
            total_watt_hours: data.total_wh,
            error_code: data.err_code,
        }
    }
}
