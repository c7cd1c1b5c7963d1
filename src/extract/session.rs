use aide::OperationInput;
use axum::{
	extract::{FromRef, FromRequestParts},
	http::{header, request},
};
use uuid::Uuid;

use crate::{
	error::{Rejection, RouteError},
	identity::{Identity, Principal},
	openapi::SECURITY_SCHEME_SESSION,
	route::auth,
	session,
};

fn cookie_headers(parts: &request::Parts) -> impl Iterator<Item = &str> {
	parts
		.headers
		.get_all(header::COOKIE)
		.into_iter()
		.filter_map(|value| value.to_str().ok())
}

/// Extracts the session and its principal from the request.
///
/// If there is no session cookie, a [`auth::Error::NoSession`] is returned.
/// If the session is malformed or unknown, a [`auth::Error::InvalidSession`] is returned.
///
/// ```rust,ignore
/// async fn route(session: Session) {
///   println!("{:?}", session.principal);
/// }
/// ```
#[derive(Debug)]
pub struct Session {
	pub id: Uuid,
	pub principal: Principal,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Session
where
	Identity: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = RouteError<auth::Error>;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let id = session::find_session_id(cookie_headers(parts))
			.map_err(|_| auth::Error::InvalidSession)?
			.ok_or(auth::Error::NoSession)?;

		let principal = Identity::from_ref(state)
			.resolve(id)
			.await?
			.ok_or(auth::Error::InvalidSession)?;

		Ok(Self { id, principal })
	}
}

impl OperationInput for Session {
	/// Adds a session cookie requirement to the `OpenAPI` operation.
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		operation.security.push(
			[(SECURITY_SCHEME_SESSION.to_string(), Vec::new())]
				.into_iter()
				.collect(),
		);
	}
}

/// The caller, if they are logged in.
///
/// Unlike [`Session`] this never rejects an anonymous or stale session; the
/// caller is simply treated as unauthenticated.
#[derive(Debug)]
pub struct Viewer(pub Option<Principal>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Viewer
where
	Identity: FromRef<S>,
	S: Sync + Send,
{
	type Rejection = Rejection;

	async fn from_request_parts(
		parts: &mut request::Parts,
		state: &S,
	) -> Result<Self, Self::Rejection> {
		let Ok(Some(id)) = session::find_session_id(cookie_headers(parts)) else {
			return Ok(Self(None));
		};

		Ok(Self(Identity::from_ref(state).resolve(id).await?))
	}
}

impl OperationInput for Viewer {
	fn operation_input(_ctx: &mut aide::gen::GenContext, operation: &mut aide::openapi::Operation) {
		// an empty requirement marks the session as optional
		operation.security.extend([
			[(SECURITY_SCHEME_SESSION.to_string(), Vec::new())]
				.into_iter()
				.collect(),
			Default::default(),
		]);
	}
}
