use std::time::Duration;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};

use crate::types::{BatchResult, PersistedResume, ResumeList};
use crate::ApiError;

/// One file ready for submission: the queue hands these to the client as a
/// snapshot, so payloads are cheaply-cloneable [`Bytes`].
#[derive(Debug, Clone)]
pub struct UploadPart {
    pub filename: String,
    pub payload: Bytes,
    pub mime: &'static str,
}

/// HTTP client for the resume-parsing service.
///
/// Construction is explicit (base URL and optional API key injected by the
/// caller); nothing is read from ambient global state.
pub struct ParserClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ParserClient {
    /// Build a client for the given service base URL.
    ///
    /// Only a connect timeout is set. Parsing a large batch legitimately
    /// takes a long time, so there is no total request deadline; callers
    /// cancel via their own affordance instead.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    /// Submit up to one batch of files as a single multipart request.
    ///
    /// The form carries one `files` field per file. The response is the
    /// server's per-file verdict set; a non-2xx status is a whole-batch
    /// transport failure, never a partial result.
    pub async fn parse_batch(&self, files: &[UploadPart]) -> Result<BatchResult, ApiError> {
        let mut form = Form::new();
        for file in files {
            let part = Part::stream(file.payload.clone())
                .file_name(file.filename.clone())
                .mime_str(file.mime)?;
            form = form.part("files", part);
        }

        log::info!("submitting batch of {} file(s)", files.len());
        let resp = self
            .authorize(self.http.post(self.url("/parse-resume")))
            .multipart(form)
            .send()
            .await?;

        let resp = check_status(resp).await?;
        resp.json::<BatchResult>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Fetch all previously parsed and persisted records.
    pub async fn list_resumes(&self) -> Result<Vec<PersistedResume>, ApiError> {
        let resp = self
            .authorize(self.http.get(self.url("/resumes")))
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let list = resp
            .json::<ResumeList>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(list.resumes)
    }

    /// Delete one persisted record by id.
    pub async fn delete_resume(&self, id: i64) -> Result<(), ApiError> {
        let resp = self
            .authorize(self.http.delete(self.url(&format!("/resumes/{id}"))))
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }
}

/// Map a non-2xx response to [`ApiError::Status`], extracting the
/// server-provided message when the body carries one.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    log::warn!("request failed with status {status}");
    Err(ApiError::Status {
        status: status.as_u16(),
        message: extract_error_message(&body),
    })
}

/// Pull a human-readable message out of a JSON error body
/// (`{"error": ...}` or `{"message": ...}`), falling back to the raw text.
fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "message", "detail"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no response body".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_trims_trailing_slash() {
        let client = ParserClient::new("http://localhost:8000/", None).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/resumes"), "http://localhost:8000/resumes");
    }

    #[test]
    fn error_message_from_json_error_field() {
        assert_eq!(
            extract_error_message(r#"{"error": "too many files"}"#),
            "too many files"
        );
    }

    #[test]
    fn error_message_from_json_message_field() {
        assert_eq!(
            extract_error_message(r#"{"message": "unsupported type"}"#),
            "unsupported type"
        );
    }

    #[test]
    fn error_message_falls_back_to_raw_body() {
        assert_eq!(extract_error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn error_message_empty_body() {
        assert_eq!(extract_error_message("   "), "no response body");
    }
}
