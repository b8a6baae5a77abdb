//! 协议错误类型定义

/// 设备查询错误
///
/// 每个变体对应一次设备查询的一种终止方式，轮询层据此记录日志后继续下一台设备。
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// 连接超时
    #[error("connect to {0} timed out")]
    ConnectTimeout(String),

    /// 连接被拒绝
    #[error("connection to {0} refused")]
    ConnectionRefused(String),

    /// 写入请求帧超时
    #[error("write to {0} timed out")]
    WriteTimeout(String),

    /// 等待首个响应分片超时
    #[error("read timeout from {0}")]
    ReadTimeout(String),

    /// 对端未发送任何数据即关闭
    #[error("empty response from {0}")]
    EmptyResponse(String),

    /// 响应报文无法解析或缺少预期字段
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// 设备上报非零错误码
    #[error("emeter error (code {err_code})")]
    Device { err_code: i64 },

    /// 其他 IO 错误
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// 日志中使用的稳定错误类别
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConnectTimeout(_) => "connect_timeout",
            Self::ConnectionRefused(_) => "connection_refused",
            Self::WriteTimeout(_) => "write_timeout",
            Self::ReadTimeout(_) => "read_timeout",
            Self::EmptyResponse(_) => "empty_response",
            Self::InvalidPayload(_) => "protocol_error",
            Self::Device { .. } => "device_error",
            Self::Io(_) => "io_error",
        }
    }
}
