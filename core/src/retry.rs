// src/retry.rs

//! Reruns a whole unit of work when the datastore reports a transient conflict
//! (serialization failure, deadlock victim).

use crate::error::CommerceResult;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct TxRetryPolicy {
  /// Total attempts, including the first one. Values below 1 behave as 1.
  pub max_attempts: u32,
  pub initial_backoff: Duration,
  pub max_backoff: Duration,
}

impl Default for TxRetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: 3,
      initial_backoff: Duration::from_millis(20),
      max_backoff: Duration::from_millis(500),
    }
  }
}

impl TxRetryPolicy {
  pub fn no_retry() -> Self {
    Self {
      max_attempts: 1,
      ..Self::default()
    }
  }

  /// Backoff doubles per retry, capped at `max_backoff`.
  pub fn backoff_for(&self, retry: u32) -> Duration {
    let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
    self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
  }

  pub(crate) async fn run<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> CommerceResult<T>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = CommerceResult<T>>,
  {
    let max_attempts = self.max_attempts.max(1);
    let mut tries = 0;
    loop {
      tries += 1;
      match attempt().await {
        Err(err) if err.is_retryable() && tries < max_attempts => {
          let delay = self.backoff_for(tries - 1);
          warn!(operation, attempt = tries, ?delay, error = %err, "Transaction conflict, retrying.");
          tokio::time::sleep(delay).await;
        }
        outcome => return outcome,
      }
    }
  }
}
