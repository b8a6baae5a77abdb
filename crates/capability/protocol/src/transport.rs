//! 长度帧 TCP 交换
//!
//! 每次请求新建一条连接：连接 → 写入完整帧 → 读取长度前缀 → 累积报文体 → 解密。
//! 连接、写入、首次读取与后续每次读取各自受同一超时约束。
//! 报文体在对端关闭或后续读取超时时可能短于声明长度，此时按已收到的部分返回。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let transport = FramedTransport::new(Duration::from_secs(5));
//! let response = transport.send("192.168.1.20", 9999, br#"{"emeter":{"get_realtime":{}}}"#).await?;
//! ```

use crate::cipher::decrypt;
use crate::error::ProtocolError;
use crate::framing::{LENGTH_PREFIX_LEN, declared_length, frame};
use std::io::ErrorKind;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// 单次读取的缓冲区大小
const READ_CHUNK_SIZE: usize = 4096;

/// 按声明长度预分配的上限（声明长度来自对端，仅作参考）
const MAX_PREALLOC: usize = 64 * 1024;

/// 单请求单连接的帧传输
#[derive(Debug, Clone, Copy)]
pub struct FramedTransport {
    timeout: Duration,
}

impl FramedTransport {
    /// 创建新的帧传输，`timeout` 同时用于连接、写入与每次读取等待
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// 发送明文请求并返回解密后的明文响应
    pub async fn send(
        &self,
        host: &str,
        port: u16,
        request: &[u8],
    ) -> Result<Vec<u8>, ProtocolError> {
        let peer = format!("{}:{}", host, port);
        let mut stream = self.connect(host, port, &peer).await?;

        // 对端不读取时发送缓冲区会写满，写入同样需要超时
        match timeout(self.timeout, stream.write_all(&frame(request))).await {
            Err(_) => return Err(ProtocolError::WriteTimeout(peer)),
            Ok(result) => result?,
        }
        debug!(target: "ems.protocol", peer = %peer, bytes = request.len(), "request_sent");

        // stream 在所有返回路径上随作用域结束关闭
        let body = self.read_body(&mut stream, &peer).await?;
        Ok(decrypt(&body))
    }

    async fn connect(&self, host: &str, port: u16, peer: &str) -> Result<TcpStream, ProtocolError> {
        match timeout(self.timeout, TcpStream::connect((host, port))).await {
            Err(_) => Err(ProtocolError::ConnectTimeout(peer.to_string())),
            Ok(Err(err)) if err.kind() == ErrorKind::ConnectionRefused => {
                Err(ProtocolError::ConnectionRefused(peer.to_string()))
            }
            Ok(Err(err)) => Err(ProtocolError::Io(err)),
            Ok(Ok(stream)) => Ok(stream),
        }
    }

    async fn read_body(
        &self,
        stream: &mut TcpStream,
        peer: &str,
    ) -> Result<Vec<u8>, ProtocolError> {
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];

        let n = match timeout(self.timeout, stream.read(&mut chunk)).await {
            Err(_) => return Err(ProtocolError::ReadTimeout(peer.to_string())),
            Ok(result) => result?,
        };
        if n == 0 {
            return Err(ProtocolError::EmptyResponse(peer.to_string()));
        }
        let mut received = chunk[..n].to_vec();

        // 长度前缀可能被拆到多个分片
        while received.len() < LENGTH_PREFIX_LEN {
            match self.read_more(stream, &mut chunk).await? {
                Some(n) => received.extend_from_slice(&chunk[..n]),
                None => {
                    return Err(ProtocolError::InvalidPayload(format!(
                        "incomplete length prefix from {} ({} bytes)",
                        peer,
                        received.len()
                    )));
                }
            }
        }

        let declared = declared_length(&received);
        let mut body = Vec::with_capacity(declared.min(MAX_PREALLOC));
        body.extend_from_slice(&received[LENGTH_PREFIX_LEN..]);

        while body.len() < declared {
            match self.read_more(stream, &mut chunk).await? {
                Some(n) => body.extend_from_slice(&chunk[..n]),
                None => {
                    debug!(
                        target: "ems.protocol",
                        peer = %peer,
                        declared,
                        received = body.len(),
                        "response_truncated"
                    );
                    break;
                }
            }
        }

        debug!(target: "ems.protocol", peer = %peer, declared, received = body.len(), "response_received");
        Ok(body)
    }

    /// 读取下一分片；对端关闭或等待超时返回 `None`
    async fn read_more(
        &self,
        stream: &mut TcpStream,
        chunk: &mut [u8],
    ) -> Result<Option<usize>, ProtocolError> {
        match timeout(self.timeout, stream.read(chunk)).await {
            Err(_) => Ok(None),
            Ok(Ok(0)) => Ok(None),
            Ok(Ok(n)) => Ok(Some(n)),
            Ok(Err(err)) => Err(ProtocolError::Io(err)),
        }
    }
}
