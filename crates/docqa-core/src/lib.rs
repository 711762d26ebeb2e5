//! Document Q&A Core - chat session state machine and collaborators
//!
//! This crate provides the core functionality for the Document Q&A
//! assistant:
//! - Session store: message log, pending attachments, submission phases
//! - Streaming reveal of assistant answers with cancellation
//! - Backend seam with a latency-simulating mock implementation
//! - Credit ledger and use case store shared with frontends

pub mod backend;
pub mod config;
pub mod credits;
pub mod error;
pub mod session;
pub mod usecase;

pub use backend::{
    Backend, Exchange, MockBackend, QueryResponse, UploadReceipt, UseCaseDetails, UseCaseUpdate,
};
pub use config::{BackendConfig, Config, FileMatch, SessionConfig};
pub use credits::CreditLedger;
pub use error::{Error, Result};
pub use session::{Attachment, Message, Phase, Role, SessionEvent, SessionStore};
pub use usecase::UseCaseStore;
