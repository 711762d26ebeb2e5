//! Credit ledger
//!
//! Tracks the numeric quota the service debits on uploads and queries.
//! The ledger is a cache over the backend balance: the session store
//! asks it to refresh after each exchange, and frontends read the
//! cached value.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::backend::Backend;
use crate::error::Result;

/// Cached view of the remaining credit balance
pub struct CreditLedger {
    backend: Arc<dyn Backend>,
    balance: Mutex<Option<i64>>,
}

impl CreditLedger {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            balance: Mutex::new(None),
        }
    }

    /// Fetch the balance from the backend and update the cache.
    ///
    /// On failure the previous cached value is kept.
    pub async fn refresh(&self) -> Result<i64> {
        let balance = self.backend.refresh_credits().await?;
        *self.balance.lock() = Some(balance);
        debug!(balance, "credit balance refreshed");
        Ok(balance)
    }

    /// Last known balance, if any refresh has succeeded yet
    pub fn balance(&self) -> Option<i64> {
        *self.balance.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::error::Error;
    use crate::session::Attachment;

    #[tokio::test]
    async fn test_refresh_updates_cache() {
        let backend = Arc::new(MockBackend::immediate());
        let ledger = CreditLedger::new(backend.clone());
        assert_eq!(ledger.balance(), None);

        assert_eq!(ledger.refresh().await.unwrap(), 20);
        assert_eq!(ledger.balance(), Some(20));

        backend
            .upload_files(&[Attachment::new("a.pdf")])
            .await
            .unwrap();
        assert_eq!(ledger.refresh().await.unwrap(), 19);
        assert_eq!(ledger.balance(), Some(19));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_balance() {
        let backend = Arc::new(MockBackend::immediate());
        let ledger = CreditLedger::new(backend.clone());
        ledger.refresh().await.unwrap();

        backend.set_fail_credits(true);
        let err = ledger.refresh().await.unwrap_err();
        assert!(matches!(err, Error::Credits(_)));
        assert_eq!(ledger.balance(), Some(20));
    }
}
