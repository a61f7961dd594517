//! HTTP client for the conversion backend.
//!
//! One method per endpoint, each mapping failures into a `Transport`
//! error tagged with its `RequestKind`. The backend reports failures as
//! a JSON envelope with the message under `error` or `message`; whichever
//! is present is surfaced verbatim, falling back to the HTTP status.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use crate::constants::UPLOAD_CHUNK_BYTES;
use crate::error::{ClientError, RequestKind};
use crate::state::ConvertRequest;

/// Upload progress callback, called with a 0-100 integer percent.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub filename: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeResponse {
    pub duration: f64,
    #[serde(default)]
    pub scenes: Vec<f64>,
    #[serde(default)]
    pub preview_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConvertResponse {
    pub url: String,
}

/// Thin client over the backend's REST surface.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Upload a local file as the multipart `video` part. The body is
    /// streamed in fixed-size chunks so `progress` can observe bytes as
    /// they leave, matching what the user sees in a progress bar.
    pub async fn upload(
        &self,
        path: &Path,
        progress: Option<ProgressFn>,
    ) -> Result<UploadResponse, ClientError> {
        let bytes = tokio::fs::read(path).await.map_err(|err| {
            ClientError::transport(RequestKind::Upload, format!("failed to read file: {}", err))
        })?;
        let total = bytes.len() as u64;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("video")
            .to_string();
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        let sent = Arc::new(AtomicU64::new(0));
        let observer = progress.clone();
        let counter = Arc::clone(&sent);
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> = bytes
            .chunks(UPLOAD_CHUNK_BYTES)
            .map(|chunk| Ok(chunk.to_vec()))
            .collect();
        let stream = futures_util::stream::iter(chunks).map(move |chunk| {
            if let Ok(ref data) = chunk {
                let done = counter.fetch_add(data.len() as u64, Ordering::Relaxed)
                    + data.len() as u64;
                if let Some(ref callback) = observer {
                    callback(percent_of(done, total));
                }
            }
            chunk
        });

        let part = reqwest::multipart::Part::stream_with_length(
            reqwest::Body::wrap_stream(stream),
            total,
        )
        .file_name(file_name)
        .mime_str(mime.essence_str())
        .map_err(|err| ClientError::transport(RequestKind::Upload, err.to_string()))?;
        let form = reqwest::multipart::Form::new().part("video", part);

        let response = self
            .client
            .post(self.endpoint("/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|err| ClientError::transport(RequestKind::Upload, err.to_string()))?;
        let upload: UploadResponse = parse_json(response, RequestKind::Upload).await?;
        if let Some(callback) = progress {
            callback(100);
        }
        Ok(upload)
    }

    /// Ask the backend to fetch a remote video by URL.
    pub async fn process_url(&self, url: &str) -> Result<UploadResponse, ClientError> {
        let response = self
            .client
            .post(self.endpoint("/process-url"))
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await
            .map_err(|err| ClientError::transport(RequestKind::FetchUrl, err.to_string()))?;
        parse_json(response, RequestKind::FetchUrl).await
    }

    /// Analyze an uploaded file: duration, scene-change marks, and an
    /// optional backend-hosted preview reference.
    pub async fn analyze(&self, filename: &str) -> Result<AnalyzeResponse, ClientError> {
        let response = self
            .client
            .post(self.endpoint("/analyze"))
            .json(&serde_json::json!({ "filename": filename }))
            .send()
            .await
            .map_err(|err| ClientError::transport(RequestKind::Analyze, err.to_string()))?;
        parse_json(response, RequestKind::Analyze).await
    }

    /// Run a conversion with a fully-derived request payload.
    pub async fn convert(&self, request: &ConvertRequest) -> Result<ConvertResponse, ClientError> {
        let response = self
            .client
            .post(self.endpoint("/convert"))
            .json(request)
            .send()
            .await
            .map_err(|err| ClientError::transport(RequestKind::Convert, err.to_string()))?;
        parse_json(response, RequestKind::Convert).await
    }

    /// Stream a result artifact to a local file. `url` may be absolute
    /// (a presigned URL) or a path relative to the backend.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<u64, ClientError> {
        let target = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            self.endpoint(url)
        };
        let response = self
            .client
            .get(&target)
            .send()
            .await
            .map_err(|err| ClientError::transport(RequestKind::Download, err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::transport(
                RequestKind::Download,
                format!("server returned {}", status),
            ));
        }

        let mut file = tokio::fs::File::create(dest).await.map_err(|err| {
            ClientError::transport(
                RequestKind::Download,
                format!("failed to create {}: {}", dest.display(), err),
            )
        })?;
        let mut written = 0u64;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk
                .map_err(|err| ClientError::transport(RequestKind::Download, err.to_string()))?;
            file.write_all(&chunk).await.map_err(|err| {
                ClientError::transport(RequestKind::Download, err.to_string())
            })?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|err| ClientError::transport(RequestKind::Download, err.to_string()))?;
        Ok(written)
    }
}

/// Suggest a local filename for an artifact URL: its last path segment
/// with any query string stripped, or a fallback.
pub fn artifact_filename(url: &str, fallback: &str) -> PathBuf {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let segment = without_query.rsplit('/').next().unwrap_or("");
    if segment.is_empty() {
        PathBuf::from(fallback)
    } else {
        PathBuf::from(segment)
    }
}

fn percent_of(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u8
}

async fn parse_json<T: DeserializeOwned>(
    response: reqwest::Response,
    kind: RequestKind,
) -> Result<T, ClientError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|err| ClientError::transport(kind, err.to_string()))?;
    if !status.is_success() {
        let message = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|payload| envelope_message(&payload))
            .unwrap_or_else(|| format!("server returned {}", status));
        return Err(ClientError::transport(kind, message));
    }
    serde_json::from_str(&text)
        .map_err(|err| ClientError::transport(kind, format!("unexpected response: {}", err)))
}

fn envelope_message(payload: &Value) -> Option<String> {
    payload
        .get("error")
        .or_else(|| payload.get("message"))
        .and_then(|value| value.as_str())
        .map(|value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let client = BackendClient::new("http://localhost:5000/");
        assert_eq!(client.endpoint("/upload"), "http://localhost:5000/upload");
        assert_eq!(client.endpoint("convert"), "http://localhost:5000/convert");
    }

    #[test]
    fn test_envelope_prefers_error_then_message() {
        let both = serde_json::json!({ "error": "bad file", "message": "other" });
        assert_eq!(envelope_message(&both).as_deref(), Some("bad file"));
        let message_only = serde_json::json!({ "status": "error", "message": "Server error" });
        assert_eq!(envelope_message(&message_only).as_deref(), Some("Server error"));
        let neither = serde_json::json!({ "status": "error" });
        assert_eq!(envelope_message(&neither), None);
    }

    #[test]
    fn test_percent_of_rounds_down_and_saturates() {
        assert_eq!(percent_of(0, 200), 0);
        assert_eq!(percent_of(1, 200), 0);
        assert_eq!(percent_of(100, 200), 50);
        assert_eq!(percent_of(200, 200), 100);
        assert_eq!(percent_of(500, 200), 100);
        // Zero-length uploads complete immediately.
        assert_eq!(percent_of(0, 0), 100);
    }

    #[test]
    fn test_artifact_filename_strips_query() {
        assert_eq!(
            artifact_filename("https://s3/bucket/clip.gif?X-Amz-Expires=3600", "out.gif"),
            PathBuf::from("clip.gif")
        );
        assert_eq!(
            artifact_filename("/download/clip.mp4", "out.gif"),
            PathBuf::from("clip.mp4")
        );
        assert_eq!(artifact_filename("", "out.gif"), PathBuf::from("out.gif"));
    }

    #[test]
    fn test_analyze_response_defaults() {
        let parsed: AnalyzeResponse = serde_json::from_str(r#"{"duration": 30.0}"#).unwrap();
        assert!(parsed.scenes.is_empty());
        assert_eq!(parsed.preview_url, None);
    }
}
