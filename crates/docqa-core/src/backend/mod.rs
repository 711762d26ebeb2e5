//! Backend abstraction for the Document Q&A service
//!
//! The session core never talks to a network directly; it goes through
//! this trait. The shipped implementation is [`MockBackend`], which
//! simulates latency and canned answers. A real transport would slot
//! in behind the same seam.

mod mock;

pub use mock::{MockBackend, MOCK_ANSWERS};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::session::Attachment;

/// Receipt returned by a successful upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Display names of the files accepted by the service
    pub files_uploaded: Vec<String>,
}

/// Full payload of a resolved query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// The complete answer text, revealed incrementally by the session
    pub answer: String,
}

/// One completed query/answer exchange, as recorded by the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    pub id: Uuid,
    pub query: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

/// Names describing the configured use case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UseCaseDetails {
    pub use_case: String,
    pub pipeline: String,
    pub version: String,
}

impl Default for UseCaseDetails {
    fn default() -> Self {
        Self {
            use_case: "Document Q&A".to_string(),
            pipeline: "Demo-Document Q&A".to_string(),
            version: "Version01-Document Q&A".to_string(),
        }
    }
}

/// Partial update to the use case details; `None` fields are left as-is
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UseCaseUpdate {
    pub use_case: Option<String>,
    pub pipeline: Option<String>,
    pub version: Option<String>,
}

/// Collaborator operations consumed by the session core.
///
/// Attachment content is opaque at this seam: uploads carry names and
/// handles only.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Upload the given attachments. Debits one credit.
    async fn upload_files(&self, files: &[Attachment]) -> Result<UploadReceipt>;

    /// Run a query against the uploaded documents. Debits one credit.
    async fn run_query(&self, query: &str) -> Result<QueryResponse>;

    /// Fetch the current credit balance.
    async fn refresh_credits(&self) -> Result<i64>;

    /// Fetch every exchange recorded so far.
    async fn chat_history(&self) -> Result<Vec<Exchange>>;

    /// Fetch the configured use case details.
    async fn use_case_details(&self) -> Result<UseCaseDetails>;

    /// Apply a partial update to the use case details and return the
    /// resulting state.
    async fn update_use_case_details(&self, update: UseCaseUpdate) -> Result<UseCaseDetails>;
}
