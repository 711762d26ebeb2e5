//! Session store - the chat session state machine
//!
//! Owns the ordered message log, the pending attachment list, and the
//! submission phase. A submission moves through
//! Idle → Uploading → Querying → Streaming → Idle; regeneration skips
//! the upload. The phase gate is the sole mutual exclusion: at most
//! one submission is in flight, and new ones are rejected with
//! [`Error::Busy`] rather than queued.
//!
//! Log mutations for a single submission are applied in a fixed order
//! and never reordered: append the (user, placeholder) pair, then
//! mutate the placeholder in place as the answer streams in. A
//! cancellation gate is checked before every streaming mutation so a
//! `reset()` mid-stream stops the reveal instead of letting orphaned
//! timer steps write into the replaced log.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::types::{Attachment, Message, Phase, Role, SessionEvent};
use crate::backend::{Backend, QueryResponse};
use crate::config::{FileMatch, SessionConfig};
use crate::credits::CreditLedger;
use crate::error::{Error, Result};

/// Broadcast buffer for session events. Must comfortably exceed the
/// token count of an answer so a lagging observer does not drop
/// stream updates.
const EVENT_CAPACITY: usize = 1024;

struct Inner {
    log: Vec<Message>,
    pending: Vec<Attachment>,
    phase: Phase,
    /// Cancelled and replaced by `reset()`; cloned into each submission
    stream_gate: CancellationToken,
}

/// The chat session state machine
pub struct SessionStore {
    inner: Mutex<Inner>,
    backend: Arc<dyn Backend>,
    ledger: Arc<CreditLedger>,
    config: SessionConfig,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    /// Create an empty session over the given collaborators
    pub fn new(
        backend: Arc<dyn Backend>,
        ledger: Arc<CreditLedger>,
        config: SessionConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Mutex::new(Inner {
                log: Vec::new(),
                pending: Vec::new(),
                phase: Phase::Idle,
                stream_gate: CancellationToken::new(),
            }),
            backend,
            ledger,
            config,
            events,
        }
    }

    /// Submit a query with its attachments.
    ///
    /// Appends a (user, assistant) pair to the log, streams the answer
    /// into the assistant entry, clears the pending attachments, and
    /// kicks off a credit refresh. Returns the full response payload.
    ///
    /// Fails with [`Error::Validation`] on an empty query, or on empty
    /// `files` when the config requires attachments; in both cases the
    /// log is untouched. Fails with [`Error::Busy`] while another
    /// submission is in flight (nothing is queued).
    pub async fn submit(&self, query: &str, files: Vec<Attachment>) -> Result<QueryResponse> {
        let query = query.trim().to_string();
        if query.is_empty() {
            return Err(Error::Validation("query must not be empty".to_string()));
        }
        if self.config.require_attachments && files.is_empty() {
            return Err(Error::Validation(
                "at least one attachment is required".to_string(),
            ));
        }

        let gate = self.begin(Phase::Uploading)?;
        let result = self.run_exchange(&query, files, false, gate.clone()).await;
        self.release(&gate);
        result
    }

    /// Re-run the previous exchange.
    ///
    /// Requires the log to end with a (user, assistant) pair; both are
    /// replaced, reusing the prior user entry's query and attachments.
    /// The upload step is skipped. Dropping the stale pair and
    /// appending the new one is the only form of log truncation.
    pub async fn regenerate(&self) -> Result<QueryResponse> {
        let (query, files) = {
            let inner = self.inner.lock();
            let n = inner.log.len();
            if n < 2 || !inner.log[n - 2].is_user() || !inner.log[n - 1].is_assistant() {
                return Err(Error::Validation(
                    "nothing to regenerate: log does not end with a user/assistant pair"
                        .to_string(),
                ));
            }
            let prior = &inner.log[n - 2];
            (prior.content.clone(), prior.attachments.clone())
        };

        let gate = self.begin(Phase::Querying)?;
        let result = self.run_exchange(&query, files, true, gate.clone()).await;
        self.release(&gate);
        result
    }

    /// Add attachments to the pending list
    pub fn select_files(&self, files: impl IntoIterator<Item = Attachment>) {
        self.inner.lock().pending.extend(files);
        self.notify(SessionEvent::PendingChanged);
    }

    /// Remove one pending attachment per the configured match policy.
    ///
    /// With [`FileMatch::ByName`] two distinct attachments sharing a
    /// name are indistinguishable and the first match is removed.
    /// Returns whether anything was removed.
    pub fn remove_file(&self, target: &Attachment) -> bool {
        let removed = {
            let mut inner = self.inner.lock();
            let position = match self.config.file_match {
                FileMatch::ByName => inner.pending.iter().position(|a| a.name == target.name),
                FileMatch::ByHandle => {
                    inner.pending.iter().position(|a| a.handle == target.handle)
                }
            };
            match position {
                Some(idx) => {
                    inner.pending.remove(idx);
                    true
                }
                None => false,
            }
        };
        if removed {
            self.notify(SessionEvent::PendingChanged);
        }
        removed
    }

    /// Reset to a fresh session: empty log, no pending attachments,
    /// idle phase. An in-flight streaming reveal is cancelled through
    /// the gate and stops before its next mutation.
    pub fn reset(&self) {
        {
            let mut inner = self.inner.lock();
            inner.stream_gate.cancel();
            inner.stream_gate = CancellationToken::new();
            inner.log.clear();
            inner.pending.clear();
            inner.phase = Phase::Idle;
        }
        self.notify(SessionEvent::Reset);
    }

    /// Snapshot of the message log
    pub fn log(&self) -> Vec<Message> {
        self.inner.lock().log.clone()
    }

    /// Snapshot of the pending attachments
    pub fn pending(&self) -> Vec<Attachment> {
        self.inner.lock().pending.clone()
    }

    /// Current submission phase
    pub fn phase(&self) -> Phase {
        self.inner.lock().phase
    }

    /// Whether a submission is in flight
    pub fn busy(&self) -> bool {
        self.phase().is_busy()
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Acquire the phase gate, or fail with `Busy`
    fn begin(&self, phase: Phase) -> Result<CancellationToken> {
        let gate = {
            let mut inner = self.inner.lock();
            if inner.phase.is_busy() {
                return Err(Error::Busy);
            }
            inner.phase = phase;
            inner.stream_gate.clone()
        };
        self.notify(SessionEvent::PhaseChanged(phase));
        Ok(gate)
    }

    /// Advance to the next phase, but only while this submission still
    /// owns the phase gate. A `reset()` cancels the gate and hands the
    /// phase to the next submission; a stale submission must not touch
    /// it. The check and the write share one lock so a reset cannot
    /// slip between them.
    fn advance(&self, phase: Phase, gate: &CancellationToken) -> Result<()> {
        {
            let mut inner = self.inner.lock();
            if gate.is_cancelled() {
                return Err(Error::Cancelled);
            }
            inner.phase = phase;
        }
        self.notify(SessionEvent::PhaseChanged(phase));
        Ok(())
    }

    /// Return the phase to Idle, unless a reset mid-flight already
    /// handed it to a newer submission.
    fn release(&self, gate: &CancellationToken) {
        let released = {
            let mut inner = self.inner.lock();
            if gate.is_cancelled() {
                false
            } else {
                inner.phase = Phase::Idle;
                true
            }
        };
        if released {
            self.notify(SessionEvent::PhaseChanged(Phase::Idle));
        }
    }

    fn notify(&self, event: SessionEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    async fn run_exchange(
        &self,
        query: &str,
        files: Vec<Attachment>,
        regenerate: bool,
        gate: CancellationToken,
    ) -> Result<QueryResponse> {
        if !regenerate {
            let receipt = self.backend.upload_files(&files).await?;
            debug!(files = receipt.files_uploaded.len(), "attachments uploaded");
            self.advance(Phase::Querying, &gate)?;
        }

        {
            let mut inner = self.inner.lock();
            if gate.is_cancelled() {
                return Err(Error::Cancelled);
            }
            if regenerate {
                let keep = inner.log.len().saturating_sub(2);
                inner.log.truncate(keep);
            }
            inner.log.push(Message::user(query, files));
            inner.log.push(Message::assistant_placeholder());
        }
        self.notify(SessionEvent::LogChanged);

        // On failure the placeholder stays empty; the caller decides
        // how to render that. No rollback.
        let response = self.backend.run_query(query).await?;

        self.advance(Phase::Streaming, &gate)?;
        self.reveal(&response.answer, &gate).await?;

        {
            let mut inner = self.inner.lock();
            if gate.is_cancelled() {
                return Err(Error::Cancelled);
            }
            inner.pending.clear();
        }
        self.notify(SessionEvent::PendingChanged);

        // Fire-and-forget: a failed refresh never fails the exchange
        let ledger = self.ledger.clone();
        tokio::spawn(async move {
            if let Err(e) = ledger.refresh().await {
                warn!("credit refresh failed: {e}");
            }
        });

        Ok(response)
    }

    /// Reveal the answer word by word into the tail assistant entry.
    ///
    /// Strictly sequential: one timed step per whitespace-delimited
    /// token, each setting the content to the single-space join of the
    /// tokens revealed so far.
    async fn reveal(&self, answer: &str, gate: &CancellationToken) -> Result<()> {
        let tokens: Vec<&str> = answer.split_whitespace().collect();
        for i in 0..tokens.len() {
            tokio::time::sleep(self.config.stream_delay()).await;
            let snapshot = tokens[..=i].join(" ");
            {
                let mut inner = self.inner.lock();
                if gate.is_cancelled() {
                    return Err(Error::Cancelled);
                }
                if let Some(tail) = inner.log.last_mut() {
                    if tail.role == Role::Assistant {
                        tail.content = snapshot.clone();
                    }
                }
            }
            self.notify(SessionEvent::StreamUpdate { content: snapshot });
        }
        Ok(())
    }
}
