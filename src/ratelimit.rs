use std::{sync::Arc, time::Duration};

use axum::{
	body::Body,
	http::StatusCode,
	response::{IntoResponse, Response},
};
use governor::middleware::StateInformationMiddleware;
use tower_governor::{
	governor::{GovernorConfig, GovernorConfigBuilder},
	key_extractor::PeerIpKeyExtractor,
	GovernorError,
};

use crate::{config::Config, error::ErrorResponse, extract::Json};

pub type Limits = Arc<GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>>;

/// Per-peer limits from the configuration. `None` if either limit is zero.
pub fn from_config(config: &Config) -> Option<Limits> {
	GovernorConfigBuilder::default()
		.per_second(config.rate_limit_per_second)
		.burst_size(config.rate_limit_burst)
		.use_headers()
		.error_handler(error_handler)
		.finish()
		.map(Arc::new)
}

fn error_handler(error: GovernorError) -> Response<Body> {
	match error {
		GovernorError::TooManyRequests { wait_time, headers } => {
			tracing::debug!(wait_time, "rate limited");

			let mut response = (
				StatusCode::TOO_MANY_REQUESTS,
				Json(ErrorResponse::new(format!(
					"Too many requests, try again in {wait_time} seconds"
				))),
			)
				.into_response();

			if let Some(headers) = headers {
				response.headers_mut().extend(headers);
			}

			response
		}
		GovernorError::UnableToExtractKey => {
			tracing::error!("rate limiter could not find the peer address");

			(
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(ErrorResponse::new("Internal server error")),
			)
				.into_response()
		}
		GovernorError::Other { code, msg, headers } => {
			let mut response = (
				code,
				Json(ErrorResponse::new(
					msg.unwrap_or_else(|| "Request refused".into()),
				)),
			)
				.into_response();

			if let Some(headers) = headers {
				response.headers_mut().extend(headers);
			}

			response
		}
	}
}

/// Prunes limiter entries of peers that have gone quiet, every minute.
pub fn cleanup_old_limits(limits: &Limits) {
	let limiter = limits.limiter().clone();
	let interval = Duration::from_secs(60);

	std::thread::spawn(move || loop {
		std::thread::sleep(interval);

		tracing::debug!("rate limiting storage size: {}", limiter.len());

		limiter.retain_recent();
	});
}

#[cfg(test)]
mod test {
	use axum::http::header::HeaderMap;

	use super::*;

	#[test]
	fn test_throttled_requests_get_the_envelope() {
		let response = error_handler(GovernorError::TooManyRequests {
			wait_time: 3,
			headers: Some(HeaderMap::new()),
		});

		assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
	}
}
