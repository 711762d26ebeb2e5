//! Session types for the Document Q&A chat core
//!
//! These types define the message log entries and the change
//! notifications emitted to frontends (CLI, UI) observing a session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a message in the chat log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// A file attached to a submission.
///
/// The handle is opaque to the core: generated on construction, never
/// inspected, only carried alongside the name. Attachment content is
/// never read here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub handle: Uuid,
}

impl Attachment {
    /// Create an attachment with a fresh opaque handle
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handle: Uuid::new_v4(),
        }
    }
}

/// A message in the session log.
///
/// Messages carry no id: identity is positional and the log itself is
/// authoritative. Assistant content is mutable only while the reply is
/// being streamed in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a user message with its attachments
    pub fn user(content: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            attachments,
            created_at: Utc::now(),
        }
    }

    /// Create an empty assistant placeholder, to be filled in by the
    /// streaming reveal
    pub fn assistant_placeholder() -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            attachments: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

/// Phase of the submission state machine.
///
/// A submission moves Idle → Uploading → Querying → Streaming → Idle;
/// regeneration skips Uploading. Any failure drops straight back to
/// Idle. The session is busy whenever the phase is not Idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Uploading,
    Querying,
    Streaming,
}

impl Phase {
    pub fn is_busy(&self) -> bool {
        *self != Phase::Idle
    }
}

/// Change notifications broadcast from a session store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The submission phase changed
    PhaseChanged(Phase),
    /// Log entries were appended or replaced
    LogChanged,
    /// The pending attachment list changed
    PendingChanged,
    /// One streaming step completed; carries the full content snapshot
    /// of the tail assistant entry
    StreamUpdate { content: String },
    /// The session was reset to its initial state
    Reset,
}
