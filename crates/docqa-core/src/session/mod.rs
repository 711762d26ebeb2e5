//! Session module - the chat session state machine
//!
//! Key components:
//!
//! - `SessionStore`: owns the message log, pending attachments, and
//!   the submission phase machine
//! - `Message`/`Attachment`: log entries and the opaque files they carry
//! - `SessionEvent`: change notifications broadcast to frontends
//!
//! # Example Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use docqa_core::backend::MockBackend;
//! use docqa_core::config::SessionConfig;
//! use docqa_core::credits::CreditLedger;
//! use docqa_core::session::{Attachment, SessionStore};
//!
//! let backend = Arc::new(MockBackend::new(&Default::default()));
//! let ledger = Arc::new(CreditLedger::new(backend.clone()));
//! let store = SessionStore::new(backend, ledger, SessionConfig::default());
//!
//! store.select_files(vec![Attachment::new("report.pdf")]);
//! let response = store.submit("Summarize the report", store.pending()).await?;
//! println!("{}", response.answer);
//! ```

mod store;
mod types;

pub use store::SessionStore;
pub use types::{Attachment, Message, Phase, Role, SessionEvent};
