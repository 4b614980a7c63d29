//! HTTP transport for the hosted key-value sync endpoint.
//!
//! `GET {base}/{code}` returns the last pushed snapshot, `POST {base}/{code}`
//! replaces it. There is no auth, versioning or server-side conflict check.

use async_trait::async_trait;
use reqwest::StatusCode;

use super::transport::{normalize_code, RemoteTransport, TransportError, TransportResult};
use crate::models::{AppState, Snapshot};
use crate::util::{compact_text, is_http_url, normalize_text_option};

#[derive(Clone)]
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> TransportResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        Ok(Self {
            base_url,
            client: reqwest::Client::builder().build()?,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn snapshot_url(&self, code: &str) -> TransportResult<String> {
        let code = normalize_code(code)?;
        Ok(format!("{}/{}", self.base_url, urlencoding::encode(code)))
    }
}

#[async_trait]
impl RemoteTransport for HttpTransport {
    async fn pull(&self, code: &str) -> TransportResult<Option<Snapshot>> {
        let url = self.snapshot_url(code)?;
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let body = response.text().await?;
        decode_snapshot(&body)
    }

    async fn push(&self, code: &str, state: &AppState) -> TransportResult<()> {
        let url = self.snapshot_url(code)?;
        let response = self.client.post(&url).json(state).send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(status_error(status, &body))
        }
    }
}

/// An empty or `null` body means nothing has been stored yet.
pub(crate) fn decode_snapshot(body: &str) -> TransportResult<Option<Snapshot>> {
    let body = body.trim();
    if body.is_empty() {
        return Ok(None);
    }
    Ok(serde_json::from_str::<Option<Snapshot>>(body)?)
}

fn status_error(status: StatusCode, body: &str) -> TransportError {
    TransportError::Status {
        status: status.as_u16(),
        body: compact_text(body),
    }
}

fn normalize_base_url(raw: String) -> TransportResult<String> {
    let base_url = normalize_text_option(Some(raw)).ok_or_else(|| {
        TransportError::InvalidConfiguration("sync base URL must not be empty".to_string())
    })?;
    if is_http_url(&base_url) {
        Ok(base_url.trim_end_matches('/').to_string())
    } else {
        Err(TransportError::InvalidConfiguration(
            "sync base URL must include http:// or https://".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_requires_http_scheme() {
        assert!(HttpTransport::new("  ").is_err());
        let error = HttpTransport::new("api.npoint.io").unwrap_err();
        assert!(error.to_string().contains("http:// or https://"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let transport = HttpTransport::new("https://api.npoint.io/").unwrap();
        assert_eq!(transport.base_url(), "https://api.npoint.io");
    }

    #[test]
    fn snapshot_url_encodes_the_code() {
        let transport = HttpTransport::new("https://api.npoint.io").unwrap();
        assert_eq!(
            transport.snapshot_url(" SFJH-2025 ").unwrap(),
            "https://api.npoint.io/SFJH-2025"
        );
        assert_eq!(
            transport.snapshot_url("a b/c").unwrap(),
            "https://api.npoint.io/a%20b%2Fc"
        );
        assert!(matches!(
            transport.snapshot_url("   "),
            Err(TransportError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn decode_snapshot_treats_empty_and_null_as_missing() {
        assert!(decode_snapshot("").unwrap().is_none());
        assert!(decode_snapshot(" null ").unwrap().is_none());
    }

    #[test]
    fn decode_snapshot_reports_malformed_body() {
        assert!(matches!(
            decode_snapshot("<html>oops</html>"),
            Err(TransportError::InvalidPayload(_))
        ));
    }

    #[test]
    fn decode_snapshot_reads_partial_blob() {
        let snapshot = decode_snapshot(
            r#"{"attendanceRecords":[{"id":"a","clubId":"1","date":"2024-05-01","records":{"m1":"LATE"},"updatedAt":5}]}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(snapshot.clubs, None);
        assert_eq!(snapshot.attendance_records.unwrap()[0].updated_at, Some(5));
    }

    #[test]
    fn status_error_compacts_body() {
        let error = status_error(StatusCode::BAD_GATEWAY, &"x".repeat(400));
        match error {
            TransportError::Status { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body.len(), 180);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
