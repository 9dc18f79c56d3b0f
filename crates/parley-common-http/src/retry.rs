// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Retry with exponential backoff for model API calls.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct RetryConfig {
	pub max_attempts: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
	pub backoff_factor: f64,
	pub jitter: bool,
}

impl Default for RetryConfig {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			base_delay: Duration::from_millis(250),
			max_delay: Duration::from_secs(8),
			backoff_factor: 2.0,
			jitter: true,
		}
	}
}

impl RetryConfig {
	/// A single attempt, no retries.
	pub fn none() -> Self {
		Self {
			max_attempts: 1,
			..Self::default()
		}
	}
}

pub trait RetryableError {
	fn is_retryable(&self) -> bool;
}

/// Statuses worth another attempt: rate limiting, timeouts and 5xx gateways.
pub fn is_retryable_status(status: StatusCode) -> bool {
	matches!(
		status,
		StatusCode::TOO_MANY_REQUESTS
			| StatusCode::REQUEST_TIMEOUT
			| StatusCode::INTERNAL_SERVER_ERROR
			| StatusCode::BAD_GATEWAY
			| StatusCode::SERVICE_UNAVAILABLE
			| StatusCode::GATEWAY_TIMEOUT
	)
}

impl RetryableError for reqwest::Error {
	fn is_retryable(&self) -> bool {
		self.is_timeout() || self.is_connect() || self.status().is_some_and(is_retryable_status)
	}
}

fn delay_for(cfg: &RetryConfig, attempt: u32) -> Duration {
	let raw = cfg.base_delay.as_secs_f64() * cfg.backoff_factor.powi(attempt as i32);
	let capped = raw.min(cfg.max_delay.as_secs_f64());
	let secs = if cfg.jitter {
		capped * (0.5 + fastrand::f64())
	} else {
		capped
	};
	Duration::from_secs_f64(secs)
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or
/// `max_attempts` is used up. The last error is returned.
pub async fn retry<F, Fut, T, E>(cfg: &RetryConfig, mut op: F) -> Result<T, E>
where
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<T, E>>,
	E: RetryableError + std::fmt::Debug,
{
	let mut attempt = 0;
	loop {
		let err = match op().await {
			Ok(value) => return Ok(value),
			Err(err) => err,
		};
		attempt += 1;

		if !err.is_retryable() || attempt >= cfg.max_attempts {
			warn!(
				error = ?err,
				attempt,
				max_attempts = cfg.max_attempts,
				retryable = err.is_retryable(),
				"giving up on request"
			);
			return Err(err);
		}

		let delay = delay_for(cfg, attempt - 1);
		warn!(
			error = ?err,
			attempt,
			delay_ms = delay.as_millis() as u64,
			"retrying after transient error"
		);
		tokio::time::sleep(delay).await;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicU32, Ordering};
	use std::sync::Arc;

	#[derive(Debug)]
	struct Flaky {
		retryable: bool,
	}

	impl RetryableError for Flaky {
		fn is_retryable(&self) -> bool {
			self.retryable
		}
	}

	fn fast(max_attempts: u32) -> RetryConfig {
		RetryConfig {
			max_attempts,
			base_delay: Duration::from_millis(1),
			max_delay: Duration::from_millis(4),
			backoff_factor: 2.0,
			jitter: false,
		}
	}

	/// **Test: permanent failures are not retried**
	///
	/// A rejected API key must surface on the first attempt instead of
	/// burning the request deadline on backoff.
	#[tokio::test]
	async fn permanent_error_stops_after_one_attempt() {
		let calls = Arc::new(AtomicU32::new(0));
		let counter = Arc::clone(&calls);

		let result: Result<(), Flaky> = retry(&fast(5), || {
			let counter = Arc::clone(&counter);
			async move {
				counter.fetch_add(1, Ordering::SeqCst);
				Err(Flaky { retryable: false })
			}
		})
		.await;

		assert!(result.is_err());
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn transient_error_uses_every_attempt() {
		let calls = Arc::new(AtomicU32::new(0));
		let counter = Arc::clone(&calls);

		let result: Result<(), Flaky> = retry(&fast(3), || {
			let counter = Arc::clone(&counter);
			async move {
				counter.fetch_add(1, Ordering::SeqCst);
				Err(Flaky { retryable: true })
			}
		})
		.await;

		assert!(result.is_err());
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}

	#[tokio::test]
	async fn recovers_after_transient_errors() {
		let calls = Arc::new(AtomicU32::new(0));
		let counter = Arc::clone(&calls);

		let result: Result<u32, Flaky> = retry(&fast(4), || {
			let counter = Arc::clone(&counter);
			async move {
				let n = counter.fetch_add(1, Ordering::SeqCst);
				if n < 2 {
					Err(Flaky { retryable: true })
				} else {
					Ok(n)
				}
			}
		})
		.await;

		assert_eq!(result.unwrap(), 2);
		assert_eq!(calls.load(Ordering::SeqCst), 3);
	}

	#[test]
	fn none_config_makes_a_single_attempt() {
		let calls = Arc::new(AtomicU32::new(0));
		let counter = Arc::clone(&calls);

		let _: Result<(), Flaky> = tokio_test::block_on(retry(&RetryConfig::none(), || {
			let counter = Arc::clone(&counter);
			async move {
				counter.fetch_add(1, Ordering::SeqCst);
				Err(Flaky { retryable: true })
			}
		}));

		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn delay_is_capped() {
		let cfg = RetryConfig {
			max_attempts: 10,
			base_delay: Duration::from_secs(1),
			max_delay: Duration::from_secs(3),
			backoff_factor: 10.0,
			jitter: false,
		};
		for attempt in 0..8 {
			assert!(delay_for(&cfg, attempt) <= Duration::from_secs(3));
		}
	}

	#[test]
	fn jitter_scales_delay_between_half_and_one_and_a_half() {
		let cfg = RetryConfig {
			jitter: true,
			..fast(3)
		};
		let base = delay_for(&RetryConfig { jitter: false, ..cfg.clone() }, 1);
		for _ in 0..50 {
			let d = delay_for(&cfg, 1);
			assert!(d >= base.mul_f64(0.49) && d <= base.mul_f64(1.51));
		}
	}

	#[test]
	fn retryable_statuses() {
		assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
		assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
		assert!(!is_retryable_status(StatusCode::UNAUTHORIZED));
		assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
	}
}
