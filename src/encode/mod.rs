use crate::record::Record;
use std::collections::BTreeMap;

/// Measurement name for every shipped point.
pub const MEASUREMENT: &str = "logger";

/// Substituted for absent or empty labels so a malformed record still
/// produces a valid point instead of failing the batch.
pub const SENTINEL: &str = "none";

/// One backend write point: sorted tags, a single string field `value`,
/// and the record's original millisecond timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Point {
    pub tags: BTreeMap<String, String>,
    pub value: String,
    pub timestamp_ms: i64,
}

impl Point {
    /// Render as one InfluxDB line-protocol line (millisecond precision).
    pub fn to_line_protocol(&self) -> String {
        let mut line = escape_measurement(MEASUREMENT);
        for (key, value) in &self.tags {
            line.push(',');
            line.push_str(&escape_tag(key));
            line.push('=');
            line.push_str(&escape_tag(value));
        }
        line.push_str(" value=");
        line.push_str(&escape_field_string(&self.value));
        line.push(' ');
        line.push_str(&self.timestamp_ms.to_string());
        line
    }
}

/// Transform a drained batch into write points. Deterministic, no I/O;
/// timestamps come from the records, never from encode time. An empty
/// input yields an empty batch.
pub fn encode_batch(records: &[Record], hostname: &str) -> Vec<Point> {
    records
        .iter()
        .map(|record| encode_record(record, hostname))
        .collect()
}

fn encode_record(record: &Record, hostname: &str) -> Point {
    let bindings = &record.bindings;
    let mut tags = BTreeMap::new();
    tags.insert("level".to_string(), record.level.to_string());
    tags.insert("hostname".to_string(), tag_or_sentinel(hostname));
    tags.insert("nodeID".to_string(), tag_or_sentinel(&bindings.node_id));
    tags.insert("namespace".to_string(), tag_or_sentinel(&bindings.namespace));
    tags.insert(
        "service".to_string(),
        bindings
            .service
            .as_deref()
            .map(tag_or_sentinel)
            .unwrap_or_else(|| SENTINEL.to_string()),
    );
    tags.insert(
        "version".to_string(),
        bindings
            .version
            .as_deref()
            .map(tag_or_sentinel)
            .unwrap_or_else(|| SENTINEL.to_string()),
    );

    Point {
        tags,
        value: record.message.clone(),
        timestamp_ms: record.timestamp.timestamp_millis(),
    }
}

fn tag_or_sentinel(value: &str) -> String {
    if value.is_empty() {
        SENTINEL.to_string()
    } else {
        value.to_string()
    }
}

fn escape_measurement(value: &str) -> String {
    value.replace(',', "\\,").replace(' ', "\\ ")
}

fn escape_tag(value: &str) -> String {
    value
        .replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

fn escape_field_string(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Bindings, Severity};
    use chrono::TimeZone;
    use chrono::Utc;

    fn make_record(level: Severity, message: &str) -> Record {
        Record {
            timestamp: Utc.with_ymd_and_hms(2026, 8, 27, 12, 0, 0).unwrap(),
            level,
            message: message.to_string(),
            bindings: Bindings {
                node_id: "n1".to_string(),
                namespace: "v1".to_string(),
                service: Some("greeter".to_string()),
                version: Some("2".to_string()),
                module: "greeter".to_string(),
            },
        }
    }

    #[test]
    fn test_encode_empty_batch() {
        assert!(encode_batch(&[], "host-a").is_empty());
    }

    #[test]
    fn test_encode_record_tags_and_field() {
        let mut record = make_record(Severity::Error, "boom");
        record.bindings.service = None;
        record.bindings.version = None;

        let points = encode_batch(&[record], "host-a");
        assert_eq!(points.len(), 1);

        let point = &points[0];
        assert_eq!(point.tags["level"], "error");
        assert_eq!(point.tags["hostname"], "host-a");
        assert_eq!(point.tags["nodeID"], "n1");
        assert_eq!(point.tags["namespace"], "v1");
        assert_eq!(point.tags["service"], "none");
        assert_eq!(point.tags["version"], "none");
        assert_eq!(point.value, "boom");
    }

    #[test]
    fn test_timestamp_comes_from_record() {
        let record = make_record(Severity::Info, "x");
        let expected_ms = record.timestamp.timestamp_millis();

        let points = encode_batch(&[record], "host-a");
        assert_eq!(points[0].timestamp_ms, expected_ms);
    }

    #[test]
    fn test_empty_required_label_substitutes_sentinel() {
        let mut record = make_record(Severity::Warn, "x");
        record.bindings.node_id = String::new();

        let points = encode_batch(&[record], "");
        assert_eq!(points[0].tags["nodeID"], "none");
        assert_eq!(points[0].tags["hostname"], "none");
    }

    #[test]
    fn test_line_protocol_shape() {
        let record = make_record(Severity::Info, "hello world");
        let ts = record.timestamp.timestamp_millis();

        let line = encode_batch(&[record], "host-a")[0].to_line_protocol();
        assert_eq!(
            line,
            format!(
                "logger,hostname=host-a,level=info,namespace=v1,nodeID=n1,service=greeter,version=2 value=\"hello world\" {}",
                ts
            )
        );
    }

    #[test]
    fn test_line_protocol_escaping() {
        let mut record = make_record(Severity::Info, "say \"hi\" \\ bye");
        record.bindings.namespace = "a b,c=d".to_string();

        let line = encode_batch(&[record], "host-a")[0].to_line_protocol();
        assert!(line.contains("namespace=a\\ b\\,c\\=d"));
        assert!(line.contains("value=\"say \\\"hi\\\" \\\\ bye\""));
    }
}
