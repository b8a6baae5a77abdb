//! InfluxDB 2.x HTTP 写入
//!
//! `POST <url>/api/v2/write?org=<org>&bucket=<bucket>&precision=s`，
//! 报文体为换行分隔的 line protocol，任意 2xx 视为成功。

use crate::error::SinkError;
use crate::line_protocol::encode_batch;
use crate::traits::MetricSink;
use async_trait::async_trait;
use domain::MetricPoint;
use reqwest::Url;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;
use tracing::debug;

/// InfluxDB 写入配置
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
    pub timeout: Duration,
}

/// InfluxDB line protocol 写入器
#[derive(Debug, Clone)]
pub struct InfluxSink {
    client: reqwest::Client,
    write_url: Url,
    token: String,
}

impl InfluxSink {
    /// 构造写入器；写入地址在此处一次性解析与编码
    pub fn new(config: InfluxConfig) -> Result<Self, SinkError> {
        let write_url = write_url(&config.url, &config.org, &config.bucket)?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| SinkError::Request(err.to_string()))?;
        Ok(Self {
            client,
            write_url,
            token: config.token,
        })
    }
}

#[async_trait]
impl MetricSink for InfluxSink {
    async fn write(&self, points: &[MetricPoint]) -> Result<(), SinkError> {
        let body = encode_batch(points);
        let response = self
            .client
            .post(self.write_url.clone())
            .header(AUTHORIZATION, format!("Token {}", self.token))
            .header(CONTENT_TYPE, "text/plain")
            .body(body)
            .send()
            .await
            .map_err(|err| SinkError::Request(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(target: "ems.storage", status = status.as_u16(), lines = points.len(), "influx_write_ok");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(SinkError::Write {
            status: status.as_u16(),
            body,
        })
    }
}

fn write_url(base: &str, org: &str, bucket: &str) -> Result<Url, SinkError> {
    let mut url = Url::parse(&format!("{}/api/v2/write", base.trim_end_matches('/')))
        .map_err(|err| SinkError::InvalidUrl(format!("{}: {}", base, err)))?;
    url.query_pairs_mut()
        .append_pair("org", org)
        .append_pair("bucket", bucket)
        .append_pair("precision", "s");
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_url_encodes_query() {
        let url = write_url("http://influx:8086/", "my org", "my bucket").unwrap();
        assert_eq!(url.path(), "/api/v2/write");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("org".to_string(), "my org".to_string()),
                ("bucket".to_string(), "my bucket".to_string()),
                ("precision".to_string(), "s".to_string()),
            ]
        );
    }

    #[test]
    fn test_write_url_rejects_garbage() {
        assert!(matches!(
            write_url("not a url", "o", "b"),
            Err(SinkError::InvalidUrl(_))
        ));
    }
}
