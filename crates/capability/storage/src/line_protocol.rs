//! InfluxDB line protocol 编码
//!
//! `measurement,tag=value voltage=..,current=..,power=..,total_wh=.. timestamp`
//!
//! 换算后的电压/电流/功率总是带小数部分（`0.0`、`121.3`），
//! 累计电量按最短形式输出（`42`、`42.5`）。

use domain::MetricPoint;

const MEASUREMENT_SPECIAL: &[char] = &[',', ' ', '\\'];
const TAG_SPECIAL: &[char] = &[',', '=', ' ', '\\'];

/// 编码单个点位为一行
pub fn encode_point(point: &MetricPoint) -> String {
    let mut line = escape(&point.measurement, MEASUREMENT_SPECIAL);
    for (key, value) in &point.tags {
        line.push(',');
        line.push_str(&escape(key, TAG_SPECIAL));
        line.push('=');
        line.push_str(&escape(value, TAG_SPECIAL));
    }
    let fields = &point.fields;
    line.push_str(&format!(
        " voltage={:?},current={:?},power={:?},total_wh={} {}",
        fields.voltage, fields.current, fields.power, fields.total_wh, point.timestamp_seconds
    ));
    line
}

/// 编码一批点位，行之间以单个换行分隔
pub fn encode_batch(points: &[MetricPoint]) -> String {
    points
        .iter()
        .map(encode_point)
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape(raw: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if special.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
