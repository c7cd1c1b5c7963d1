use std::{convert::Infallible, error, fmt};

use aide::OperationOutput;
use axum::{
	body::Body,
	extract::rejection,
	http::{Response, StatusCode},
	response::IntoResponse,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::{extract::Json, store};

/// Shape of a failed request. Every failure uses this envelope.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ErrorResponse {
	/// Always `false`.
	pub success: bool,
	/// A human-readable explanation, safe to show to the user.
	pub message: String,
	/// Per-field problems, for malformed input.
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub errors: Vec<String>,
}

impl ErrorResponse {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			success: false,
			message: message.into(),
			errors: Vec::new(),
		}
	}
}

/// How a route-specific error is presented to the client.
///
/// Failures the client can recover from are reported in-band with a 200
/// status, so only faults of the service itself should override [`status`].
///
/// [`status`]: ErrorShape::status
pub trait ErrorShape: error::Error {
	fn status(&self) -> StatusCode {
		StatusCode::OK
	}

	/// The message sent to the client. The [`Display`](fmt::Display)
	/// output is only logged, so it can contain internal details.
	fn message(&self) -> String {
		self.to_string()
	}
}

/// Rejection of the body, query and path extractors, which know nothing
/// about the route they run in.
pub type Rejection = RouteError<Infallible>;

impl ErrorShape for Infallible {}

/// Error returned by a route with route-specific errors `E`.
#[derive(Debug)]
pub enum RouteError<E> {
	Route(E),
	Validation(validator::ValidationErrors),
	Json(rejection::JsonRejection),
	Path(rejection::PathRejection),
	Store(store::Error),
}

impl<E: fmt::Display> fmt::Display for RouteError<E> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Route(error) => error.fmt(f),
			Self::Validation(error) => write!(f, "validation error: {error}"),
			Self::Json(error) => write!(f, "json error: {error}"),
			Self::Path(error) => write!(f, "path error: {error}"),
			Self::Store(error) => write!(f, "store error: {error}"),
		}
	}
}

impl<E: error::Error + 'static> error::Error for RouteError<E> {
	fn source(&self) -> Option<&(dyn error::Error + 'static)> {
		match self {
			Self::Route(error) => Some(error),
			Self::Validation(error) => Some(error),
			Self::Json(error) => Some(error),
			Self::Path(error) => Some(error),
			Self::Store(error) => Some(error),
		}
	}
}

impl<E> From<validator::ValidationErrors> for RouteError<E> {
	fn from(error: validator::ValidationErrors) -> Self {
		Self::Validation(error)
	}
}

impl<E> From<rejection::JsonRejection> for RouteError<E> {
	fn from(error: rejection::JsonRejection) -> Self {
		Self::Json(error)
	}
}

impl<E> From<rejection::PathRejection> for RouteError<E> {
	fn from(error: rejection::PathRejection) -> Self {
		Self::Path(error)
	}
}

impl<E> From<store::Error> for RouteError<E> {
	fn from(error: store::Error) -> Self {
		Self::Store(error)
	}
}

/// Flattens validator errors into `field: problem` lines.
fn field_errors(errors: &validator::ValidationErrors) -> Vec<String> {
	let mut lines = errors
		.field_errors()
		.into_iter()
		.flat_map(|(field, errors)| {
			errors.iter().map(move |error| match &error.message {
				Some(message) => format!("{field}: {message}"),
				None => format!("{field}: {}", error.code),
			})
		})
		.collect::<Vec<_>>();

	lines.sort();
	lines
}

impl<E: ErrorShape> IntoResponse for RouteError<E> {
	fn into_response(self) -> Response<Body> {
		let (status, body) = match &self {
			Self::Route(error) => {
				let status = error.status();

				if status.is_server_error() {
					tracing::error!(%error, "request failed");
				}

				(status, ErrorResponse::new(error.message()))
			}
			Self::Validation(errors) => (
				StatusCode::OK,
				ErrorResponse {
					errors: field_errors(errors),
					..ErrorResponse::new("Invalid input")
				},
			),
			Self::Json(error) => (StatusCode::OK, ErrorResponse::new(error.body_text())),
			Self::Path(error) => (StatusCode::OK, ErrorResponse::new(error.body_text())),
			Self::Store(error) => {
				tracing::error!(%error, "storage failure");

				(
					StatusCode::INTERNAL_SERVER_ERROR,
					ErrorResponse::new("Internal server error"),
				)
			}
		};

		(status, Json(body)).into_response()
	}
}

impl<E> OperationOutput for RouteError<E> {
	type Inner = ErrorResponse;
}

#[cfg(test)]
mod test {
	use validator::Validate;

	use super::*;

	#[derive(Debug, thiserror::Error)]
	#[error("boom")]
	struct Boom;

	impl ErrorShape for Boom {}

	#[derive(Validate)]
	struct Input {
		#[validate(length(min = 3))]
		name: String,
	}

	#[test]
	fn test_route_errors_default_to_ok() {
		let response = RouteError::Route(Boom).into_response();

		assert_eq!(response.status(), StatusCode::OK);
	}

	#[test]
	fn test_store_errors_are_server_errors() {
		let response =
			RouteError::<Boom>::Store(store::Error::Database(sqlx::Error::PoolTimedOut))
				.into_response();

		assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
	}

	#[test]
	fn test_field_errors_name_the_field() {
		let errors = Input { name: "ab".into() }.validate().unwrap_err();

		assert_eq!(field_errors(&errors), ["name: length"]);
	}
}
