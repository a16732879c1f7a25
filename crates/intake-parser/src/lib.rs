//! Client for the external resume-parsing service.
//!
//! The service owns all parsing intelligence; this crate only speaks its
//! wire contract: one multipart `POST /parse-resume` per batch (field
//! `files` repeated per file), `GET /resumes` for previously persisted
//! records, and `DELETE /resumes/{id}`.

use thiserror::Error;

mod client;
mod types;

pub use client::{ParserClient, UploadPart};
pub use types::{BatchResult, FileResult, FileStatus, PersistedResume, ResumeList};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
}
