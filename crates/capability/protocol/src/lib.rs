//! # 设备协议能力模块
//!
//! 与局域网计量插座通信，提供：
//! - **流加密**：自动密钥异或流（初始密钥 171，每条报文重置）
//! - **长度帧传输**：单请求单连接，`[4 字节大端长度][密文]`
//! - **遥测查询**：发送实时电量查询并解析为 [`domain::Reading`]
//!
//! ## 架构设计
//!
//! ```text
//! Poller
//!   │
//!   ▼
//! ReadingSource (DeviceClient)
//!   │  {"emeter":{"get_realtime":{}}}
//!   ▼
//! FramedTransport ── connect / write / read（各自超时）
//!   │
//!   ▼
//! cipher::encrypt / cipher::decrypt
//! ```
//!
//! ## 响应格式
//!
//! ```json
//! { "emeter": { "get_realtime": {
//!     "voltage_mv": 121300, "current_ma": 1250, "power_mw": 151625,
//!     "total_wh": 42, "err_code": 0 } } }
//! ```

pub mod cipher;
mod device_client;
mod error;
pub mod framing;
mod transport;
mod types;

pub use cipher::{decrypt, encrypt};
pub use device_client::{DeviceClient, ReadingSource, parse_realtime};
pub use error::ProtocolError;
pub use framing::frame;
pub use transport::FramedTransport;
pub use types::*;
