//! 插座遥测查询客户端
//!
//! 通过 [`FramedTransport`] 发送固定的实时电量查询，解析 `emeter.get_realtime`。

use crate::error::ProtocolError;
use crate::transport::FramedTransport;
use crate::types::{REALTIME_PATH, REALTIME_REQUEST, RealtimeData};
use async_trait::async_trait;
use domain::{Device, Reading};
use serde_json::Value;
use std::time::Duration;

/// 读数来源
///
/// 轮询层只依赖此接口，便于替换为测试实现。
#[async_trait]
pub trait ReadingSource: Send + Sync {
    async fn read(&self, device: &Device) -> Result<Reading, ProtocolError>;
}

/// 插座查询客户端
#[derive(Debug, Clone, Copy)]
pub struct DeviceClient {
    transport: FramedTransport,
}

impl DeviceClient {
    /// 创建新的客户端，`timeout` 用于连接与读取
    pub fn new(timeout: Duration) -> Self {
        Self::with_transport(FramedTransport::new(timeout))
    }

    pub fn with_transport(transport: FramedTransport) -> Self {
        Self { transport }
    }

    /// 查询指定地址的实时电量
    pub async fn query(&self, host: &str, port: u16) -> Result<Reading, ProtocolError> {
        let response = self
            .transport
            .send(host, port, REALTIME_REQUEST.as_bytes())
            .await?;
        parse_realtime(&response)
    }
}

#[async_trait]
impl ReadingSource for DeviceClient {
    async fn read(&self, device: &Device) -> Result<Reading, ProtocolError> {
        self.query(&device.host, device.port).await
    }
}

/// 解析解密后的响应报文
///
/// 先检查错误码：设备出错时其余字段通常缺失，应报告为设备错误而非报文错误。
pub fn parse_realtime(payload: &[u8]) -> Result<Reading, ProtocolError> {
    let root: Value = serde_json::from_slice(payload)
        .map_err(|e| ProtocolError::InvalidPayload(e.to_string()))?;

    let realtime = REALTIME_PATH
        .iter()
        .try_fold(&root, |node, key| node.get(key))
        .filter(|node| node.is_object())
        .ok_or_else(|| {
            ProtocolError::InvalidPayload(format!("missing {}", REALTIME_PATH.join(".")))
        })?;

    let err_code = match realtime.get("err_code") {
        None | Some(Value::Null) => 0,
        Some(code) => code.as_i64().ok_or_else(|| {
            ProtocolError::InvalidPayload(format!("non-integer err_code: {}", code))
        })?,
    };
    if err_code != 0 {
        return Err(ProtocolError::Device { err_code });
    }

    let data: RealtimeData = serde_json::from_value(realtime.clone())
        .map_err(|e| ProtocolError::InvalidPayload(e.to_string()))?;
    Ok(data.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_realtime() {
        let payload = br#"{"emeter":{"get_realtime":{"voltage_mv":120100,"current_ma":500,"power_mw":60050,"total_wh":10,"err_code":0}}}"#;
        let reading = parse_realtime(payload).unwrap();
        assert_eq!(reading.voltage_millivolts, 120_100);
        assert_eq!(reading.current_milliamps, 500);
        assert_eq!(reading.power_milliwatts, 60_050);
        assert_eq!(reading.total_watt_hours, 10.0);
        assert_eq!(reading.error_code, 0);
    }

    #[test]
    fn test_missing_err_code_is_success() {
        let payload = br#"{"emeter":{"get_realtime":{"voltage_mv":1,"current_ma":2,"power_mw":3,"total_wh":4.5}}}"#;
        let reading = parse_realtime(payload).unwrap();
        assert_eq!(reading.total_watt_hours, 4.5);
    }

    #[test]
    fn test_device_error_code() {
        let payload = br#"{"emeter":{"get_realtime":{"err_code":-1,"err_msg":"module not support"}}}"#;
        match parse_realtime(payload) {
            Err(ProtocolError::Device { err_code }) => assert_eq!(err_code, -1),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_payloads() {
        let cases: [&[u8]; 5] = [
            b"not json",
            br#"{"system":{}}"#,
            br#"{"emeter":{"get_realtime":[]}}"#,
            br#"{"emeter":{"get_realtime":{"err_code":0}}}"#,
            br#"{"emeter":{"get_realtime":{"err_code":"x"}}}"#,
        ];
        for payload in cases {
            let err = parse_realtime(payload).unwrap_err();
            assert_eq!(err.kind(), "protocol_error", "payload {:?}", payload);
        }
    }
}
