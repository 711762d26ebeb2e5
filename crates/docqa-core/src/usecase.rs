//! Use case store
//!
//! Caches the use case naming details and the recorded exchange
//! history shown in the sidebar. Independent of the session store;
//! both are constructed explicitly and shared by reference.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::backend::{Backend, Exchange, UseCaseDetails, UseCaseUpdate};
use crate::error::Result;

/// Cached view of the use case details and exchange history
pub struct UseCaseStore {
    backend: Arc<dyn Backend>,
    details: Mutex<UseCaseDetails>,
    history: Mutex<Vec<Exchange>>,
}

impl UseCaseStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            details: Mutex::new(UseCaseDetails::default()),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Fetch the details from the backend and update the cache.
    ///
    /// On failure the previous cache is kept.
    pub async fn fetch_details(&self) -> Result<UseCaseDetails> {
        let details = self.backend.use_case_details().await?;
        *self.details.lock() = details.clone();
        Ok(details)
    }

    /// Apply a partial update and cache the resulting details
    pub async fn update_details(&self, update: UseCaseUpdate) -> Result<UseCaseDetails> {
        let details = self.backend.update_use_case_details(update).await?;
        *self.details.lock() = details.clone();
        Ok(details)
    }

    /// Fetch the recorded exchanges and update the cache
    pub async fn fetch_history(&self) -> Result<Vec<Exchange>> {
        let history = self.backend.chat_history().await?;
        *self.history.lock() = history.clone();
        Ok(history)
    }

    /// Last fetched details
    pub fn details(&self) -> UseCaseDetails {
        self.details.lock().clone()
    }

    /// Last fetched history
    pub fn history(&self) -> Vec<Exchange> {
        self.history.lock().clone()
    }
}
