use crate::encode::Point;
use crate::sink::{PointSink, WriteError};
use async_trait::async_trait;
use tracing::debug;

/// Write client for the InfluxDB v2 HTTP API. Batches are rendered to
/// line protocol and POSTed with millisecond precision.
pub struct InfluxSink {
    client: reqwest::Client,
    write_url: String,
    token: String,
}

impl InfluxSink {
    pub fn new(url: &str, token: &str, org: &str, bucket: &str) -> Result<Self, WriteError> {
        let client = reqwest::Client::builder().build()?;
        let write_url = format!(
            "{}/api/v2/write?org={}&bucket={}&precision=ms",
            url.trim_end_matches('/'),
            org,
            bucket
        );

        Ok(Self {
            client,
            write_url,
            token: token.to_string(),
        })
    }
}

#[async_trait]
impl PointSink for InfluxSink {
    async fn write_points(&self, points: &[Point]) -> Result<(), WriteError> {
        let body = points
            .iter()
            .map(Point::to_line_protocol)
            .collect::<Vec<_>>()
            .join("\n");

        debug!(points = points.len(), "Submitting batch");

        let response = self
            .client
            .post(&self.write_url)
            .header("Authorization", format!("Token {}", self.token))
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WriteError::Backend {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(())
    }
}
