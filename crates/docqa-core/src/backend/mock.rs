//! Mock backend simulating the Document Q&A service
//!
//! Reproduces the latency profile of the real service: one base unit
//! for reads, 1.5 units for uploads, 2 units for queries. Answers are
//! picked at random from a small canned set unless a fixed answer is
//! installed (tests rely on that).

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rand::prelude::IndexedRandom;
use tracing::debug;
use uuid::Uuid;

use super::{Backend, Exchange, QueryResponse, UploadReceipt, UseCaseDetails, UseCaseUpdate};
use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::session::Attachment;

/// Canned answers returned by [`MockBackend::run_query`]
pub const MOCK_ANSWERS: [&str; 3] = [
    "Based on the uploaded document, here are the key findings:\n\n1. Revenue Growth:\n- Overall growth of 15% YoY\n- Digital services increased by 22%\n- New customer acquisition up by 18%\n\n2. Market Performance:\n- Market share expanded to 34%\n- Customer satisfaction score: 4.8/5\n- Retention rate: 92%\n\nWould you like me to elaborate on any specific aspect?",
    "The document analysis reveals:\n\n1. Project Timeline:\n- Phase 1 completion: Q3 2024\n- Key milestones achieved: 7/10\n- Resource utilization: 85%\n\n2. Risk Assessment:\n- Low risk factors: 3\n- Medium risk factors: 2\n- High risk factors: None\n\nLet me know if you need more specific details.",
    "After analyzing the document, here's the summary:\n\n1. Financial Metrics:\n- ROI: 127%\n- Operating costs reduced by 18%\n- Profit margin increased to 31%\n\n2. Operational Efficiency:\n- Process automation: 65%\n- Time savings: 240 hours/month\n- Error reduction: 92%\n\nWould you like to explore any particular area?",
];

#[derive(Debug, Default)]
struct MockState {
    credits: i64,
    history: Vec<Exchange>,
    details: UseCaseDetails,
    /// When set, every query returns this answer instead of a random pick
    fixed_answer: Option<String>,
    /// One-shot failure triggers
    fail_next_upload: bool,
    fail_next_query: bool,
    /// Persistent failure trigger for credit reads
    fail_credits: bool,
}

/// In-process stand-in for the Document Q&A service
pub struct MockBackend {
    latency: Duration,
    state: Mutex<MockState>,
}

impl MockBackend {
    /// Create a mock backend from configuration
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            latency: config.latency(),
            state: Mutex::new(MockState {
                credits: config.starting_credits,
                ..MockState::default()
            }),
        }
    }

    /// Create a mock backend with no simulated latency (for tests)
    pub fn immediate() -> Self {
        Self::new(&BackendConfig {
            latency_ms: 0,
            ..BackendConfig::default()
        })
    }

    /// Make every query return the given answer
    pub fn with_fixed_answer(self, answer: impl Into<String>) -> Self {
        self.state.lock().fixed_answer = Some(answer.into());
        self
    }

    /// Install or replace the fixed answer on an existing backend
    pub fn set_fixed_answer(&self, answer: impl Into<String>) {
        self.state.lock().fixed_answer = Some(answer.into());
    }

    /// Make the next upload fail
    pub fn fail_next_upload(&self) {
        self.state.lock().fail_next_upload = true;
    }

    /// Make the next query fail
    pub fn fail_next_query(&self) {
        self.state.lock().fail_next_query = true;
    }

    /// Make every credit read fail until cleared
    pub fn set_fail_credits(&self, fail: bool) {
        self.state.lock().fail_credits = fail;
    }

    /// Current credit balance without simulated latency (for tests)
    pub fn credits_now(&self) -> i64 {
        self.state.lock().credits
    }

    async fn simulate(&self, units: f64) {
        let delay = self.latency.mul_f64(units);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn pick_answer(state: &MockState) -> String {
        if let Some(fixed) = &state.fixed_answer {
            return fixed.clone();
        }
        let mut rng = rand::rng();
        MOCK_ANSWERS
            .choose(&mut rng)
            .copied()
            .unwrap_or(MOCK_ANSWERS[0])
            .to_string()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn upload_files(&self, files: &[Attachment]) -> Result<UploadReceipt> {
        self.simulate(1.5).await;

        let mut state = self.state.lock();
        if state.fail_next_upload {
            state.fail_next_upload = false;
            return Err(Error::Upload("simulated upload failure".to_string()));
        }
        state.credits -= 1;
        debug!(count = files.len(), "mock upload accepted");
        Ok(UploadReceipt {
            files_uploaded: files.iter().map(|f| f.name.clone()).collect(),
        })
    }

    async fn run_query(&self, query: &str) -> Result<QueryResponse> {
        self.simulate(2.0).await;

        let mut state = self.state.lock();
        if state.fail_next_query {
            state.fail_next_query = false;
            return Err(Error::Query("simulated query failure".to_string()));
        }
        state.credits -= 1;
        let answer = Self::pick_answer(&state);
        state.history.push(Exchange {
            id: Uuid::new_v4(),
            query: query.to_string(),
            answer: answer.clone(),
            created_at: Utc::now(),
        });
        debug!(query, "mock query resolved");
        Ok(QueryResponse { answer })
    }

    async fn refresh_credits(&self) -> Result<i64> {
        self.simulate(1.0).await;

        let state = self.state.lock();
        if state.fail_credits {
            return Err(Error::Credits("simulated credit failure".to_string()));
        }
        Ok(state.credits)
    }

    async fn chat_history(&self) -> Result<Vec<Exchange>> {
        self.simulate(1.0).await;
        Ok(self.state.lock().history.clone())
    }

    async fn use_case_details(&self) -> Result<UseCaseDetails> {
        self.simulate(1.0).await;
        Ok(self.state.lock().details.clone())
    }

    async fn update_use_case_details(&self, update: UseCaseUpdate) -> Result<UseCaseDetails> {
        self.simulate(1.0).await;

        let mut state = self.state.lock();
        if let Some(use_case) = update.use_case {
            state.details.use_case = use_case;
        }
        if let Some(pipeline) = update.pipeline {
            state.details.pipeline = pipeline;
        }
        if let Some(version) = update.version {
            state.details.version = version;
        }
        Ok(state.details.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_and_query_debit_credits() {
        let backend = MockBackend::immediate();
        assert_eq!(backend.credits_now(), 20);

        backend
            .upload_files(&[Attachment::new("report.pdf")])
            .await
            .unwrap();
        assert_eq!(backend.credits_now(), 19);

        backend.run_query("summarize").await.unwrap();
        assert_eq!(backend.credits_now(), 18);

        assert_eq!(backend.refresh_credits().await.unwrap(), 18);
    }

    #[tokio::test]
    async fn test_upload_receipt_lists_names() {
        let backend = MockBackend::immediate();
        let receipt = backend
            .upload_files(&[Attachment::new("a.pdf"), Attachment::new("b.pdf")])
            .await
            .unwrap();
        assert_eq!(receipt.files_uploaded, vec!["a.pdf", "b.pdf"]);
    }

    #[tokio::test]
    async fn test_query_records_history() {
        let backend = MockBackend::immediate().with_fixed_answer("The answer.");

        backend.run_query("first").await.unwrap();
        backend.run_query("second").await.unwrap();

        let history = backend.chat_history().await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].query, "first");
        assert_eq!(history[1].query, "second");
        assert_eq!(history[0].answer, "The answer.");
        assert_ne!(history[0].id, history[1].id);
    }

    #[tokio::test]
    async fn test_random_answer_comes_from_canned_set() {
        let backend = MockBackend::immediate();
        let response = backend.run_query("anything").await.unwrap();
        assert!(MOCK_ANSWERS.contains(&response.answer.as_str()));
    }

    #[tokio::test]
    async fn test_failure_injection_is_one_shot() {
        let backend = MockBackend::immediate();

        backend.fail_next_upload();
        let err = backend
            .upload_files(&[Attachment::new("a.pdf")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upload(_)));
        // Failed upload does not debit
        assert_eq!(backend.credits_now(), 20);

        // Next attempt succeeds
        backend
            .upload_files(&[Attachment::new("a.pdf")])
            .await
            .unwrap();

        backend.fail_next_query();
        let err = backend.run_query("q").await.unwrap_err();
        assert!(matches!(err, Error::Query(_)));
        backend.run_query("q").await.unwrap();
    }

    #[tokio::test]
    async fn test_use_case_partial_update() {
        let backend = MockBackend::immediate();

        let details = backend.use_case_details().await.unwrap();
        assert_eq!(details, UseCaseDetails::default());

        let updated = backend
            .update_use_case_details(UseCaseUpdate {
                pipeline: Some("Prod-Document Q&A".to_string()),
                ..UseCaseUpdate::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.use_case, "Document Q&A");
        assert_eq!(updated.pipeline, "Prod-Document Q&A");
        assert_eq!(updated.version, "Version01-Document Q&A");
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_scales_per_operation() {
        let backend = MockBackend::new(&BackendConfig {
            latency_ms: 1000,
            starting_credits: 20,
        });

        let start = tokio::time::Instant::now();
        backend.refresh_credits().await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(1000));

        let start = tokio::time::Instant::now();
        backend
            .upload_files(&[Attachment::new("a.pdf")])
            .await
            .unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(1500));

        let start = tokio::time::Instant::now();
        backend.run_query("q").await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(2000));
    }
}
