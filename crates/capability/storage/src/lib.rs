//! # EMS Storage 模块
//!
//! 时序点位写入层：将一个轮询周期的点位批次编码为 InfluxDB line protocol，
//! 并通过一次 HTTP 调用写入。
//!
//! ## 模块说明
//!
//! - [`traits`]：写入接口 `MetricSink`
//! - [`line_protocol`]：点位 → line protocol 编码
//! - [`influx`]：InfluxDB 2.x HTTP 写入实现
//! - [`in_memory`]：内存写入实现（用于测试）
//! - [`error`]：写入错误类型
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use ems_storage::{InfluxConfig, InfluxSink, MetricSink};
//!
//! let sink = InfluxSink::new(InfluxConfig {
//!     url: "http://localhost:8086".to_string(),
//!     token: "token".to_string(),
//!     org: "home".to_string(),
//!     bucket: "energy".to_string(),
//!     timeout: Duration::from_secs(5),
//! })?;
//! sink.write(&points).await?;
//! ```

pub mod error;
pub mod in_memory;
pub mod influx;
pub mod line_protocol;
pub mod traits;

pub use error::SinkError;
pub use in_memory::InMemoryMetricSink;
pub use influx::{InfluxConfig, InfluxSink};
pub use line_protocol::{encode_batch, encode_point};
pub use traits::MetricSink;
