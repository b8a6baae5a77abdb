//! 写入层错误类型
//!
//! 统一封装时序库写入失败：
//! - 非 2xx 响应（携带状态码与响应体便于排查）
//! - HTTP 请求本身失败（连接、超时）
//! - 写入地址配置错误

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("influxdb write failed ({status}): {body}")]
    Write { status: u16, body: String },
    #[error("influxdb request failed: {0}")]
    Request(String),
    #[error("invalid influxdb url: {0}")]
    InvalidUrl(String),
}
