use serde::{Deserialize, Deserializer, Serialize};

/// Per-file verdict inside a [`BatchResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Success,
    Failed,
}

/// The server's verdict for one file within a batch.
///
/// Every field beyond `filename` and `status` is optional on the wire;
/// consumers substitute display fallbacks rather than assume presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    pub filename: String,
    pub status: FileStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    /// Seconds the server spent parsing this file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
}

impl FileResult {
    pub fn is_success(&self) -> bool {
        self.status == FileStatus::Success
    }
}

/// Response of `POST /parse-resume`: one result per submitted file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub total_files: usize,
    pub successful_files: usize,
    pub failed_files: usize,
    /// Seconds of server-side processing for the whole batch.
    #[serde(default)]
    pub total_processing_time: f64,
    pub results: Vec<FileResult>,
}

/// A durably persisted record of a successfully parsed file.
///
/// The client treats it as opaque except for display fields and the id
/// used for delete. Absent fields get a display fallback, never a panic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedResume {
    pub id: i64,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub candidate_name: Option<String>,
    #[serde(default)]
    pub candidate_email: Option<String>,
    /// The backend emits this as either a number or a string.
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub total_experience: Option<String>,
    /// JSON-encoded string, not inline JSON. Use [`parsed_json`](Self::parsed_json).
    #[serde(default)]
    pub parsed_data: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl PersistedResume {
    /// Decode the JSON-encoded `parsed_data` blob, if present and valid.
    pub fn parsed_json(&self) -> Option<serde_json::Value> {
        self.parsed_data
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }
}

/// Envelope of `GET /resumes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeList {
    #[serde(default)]
    pub resumes: Vec<PersistedResume>,
}

/// Accept a JSON string, number, or null where a display string is expected.
fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_result_minimal_fields() {
        let json = r#"{"filename": "a.pdf", "status": "success"}"#;
        let fr: FileResult = serde_json::from_str(json).unwrap();
        assert_eq!(fr.filename, "a.pdf");
        assert!(fr.is_success());
        assert!(fr.error.is_none());
        assert!(fr.parsed_data.is_none());
        assert!(fr.processing_time.is_none());
    }

    #[test]
    fn file_result_failed_with_error() {
        let json = r#"{"filename": "b.docx", "status": "failed", "error": "unreadable"}"#;
        let fr: FileResult = serde_json::from_str(json).unwrap();
        assert!(!fr.is_success());
        assert_eq!(fr.error.as_deref(), Some("unreadable"));
    }

    #[test]
    fn batch_result_decodes() {
        let json = r#"{
            "total_files": 2,
            "successful_files": 1,
            "failed_files": 1,
            "total_processing_time": 3.25,
            "results": [
                {"filename": "a.pdf", "status": "success", "parsed_data": {"name": "Ada"}, "processing_time": 2.0},
                {"filename": "b.docx", "status": "failed", "error": "corrupt header"}
            ]
        }"#;
        let batch: BatchResult = serde_json::from_str(json).unwrap();
        assert_eq!(batch.total_files, 2);
        assert_eq!(batch.results.len(), 2);
        assert!(batch.results[0].is_success());
        assert!(!batch.results[1].is_success());
    }

    #[test]
    fn batch_result_missing_processing_time() {
        let json = r#"{"total_files": 0, "successful_files": 0, "failed_files": 0, "results": []}"#;
        let batch: BatchResult = serde_json::from_str(json).unwrap();
        assert_eq!(batch.total_processing_time, 0.0);
    }

    #[test]
    fn persisted_resume_sparse_fields() {
        let json = r#"{"id": 7}"#;
        let rec: PersistedResume = serde_json::from_str(json).unwrap();
        assert_eq!(rec.id, 7);
        assert!(rec.candidate_name.is_none());
        assert!(rec.parsed_json().is_none());
    }

    #[test]
    fn persisted_resume_numeric_experience() {
        let json = r#"{"id": 1, "total_experience": 4.5}"#;
        let rec: PersistedResume = serde_json::from_str(json).unwrap();
        assert_eq!(rec.total_experience.as_deref(), Some("4.5"));

        let json = r#"{"id": 2, "total_experience": "3 years"}"#;
        let rec: PersistedResume = serde_json::from_str(json).unwrap();
        assert_eq!(rec.total_experience.as_deref(), Some("3 years"));
    }

    #[test]
    fn persisted_resume_parsed_data_is_encoded_string() {
        let json = r#"{"id": 3, "parsed_data": "{\"skills\": [\"rust\"]}"}"#;
        let rec: PersistedResume = serde_json::from_str(json).unwrap();
        let parsed = rec.parsed_json().unwrap();
        assert_eq!(parsed["skills"][0], "rust");
    }

    #[test]
    fn persisted_resume_invalid_parsed_data_yields_none() {
        let json = r#"{"id": 4, "parsed_data": "not json"}"#;
        let rec: PersistedResume = serde_json::from_str(json).unwrap();
        assert!(rec.parsed_json().is_none());
    }

    #[test]
    fn resume_list_tolerates_missing_array() {
        let list: ResumeList = serde_json::from_str("{}").unwrap();
        assert!(list.resumes.is_empty());
    }
}
