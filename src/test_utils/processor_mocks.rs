//! Stub payment processor for invoice-driven reconciliation tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_processor::PaymentProcessorPort,
};

/// Returns canned subscription objects keyed by subscription id.
/// Unknown ids fail with a provider error.
#[derive(Default)]
pub struct StubPaymentProcessor {
    pub subscriptions: Mutex<HashMap<String, Value>>,
    pub fetch_calls: AtomicUsize,
}

impl StubPaymentProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscription(self, subscription: Value) -> Self {
        let id = subscription["id"].as_str().unwrap_or_default().to_string();
        self.subscriptions.lock().unwrap().insert(id, subscription);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentProcessorPort for StubPaymentProcessor {
    async fn fetch_subscription(&self, subscription_id: &str) -> AppResult<Value> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.subscriptions
            .lock()
            .unwrap()
            .get(subscription_id)
            .cloned()
            .ok_or_else(|| AppError::Provider(format!("No such subscription: {}", subscription_id)))
    }
}
