use argon2::Argon2;
use axum::{extract::State, http::header};
use macros::route;

use crate::{
	extract::{Json, Session, Viewer},
	identity::Identity,
	openapi::tag,
	route::model::Acknowledgement,
	session,
};

use super::{hash_password, model, normalize_email, Error, RouteError};

/// Log in
/// Logs in to an admin or student account, setting the session cookie.
#[route(tag = tag::AUTH, response(status = 200, description = "Logged in, or why not.", shape = "Json<model::LoginResponse>"))]
pub async fn login(
	State(identity): State<Identity>,
	State(hasher): State<Argon2<'static>>,
	Json(input): Json<model::LoginInput>,
) -> Result<([(header::HeaderName, String); 1], Json<model::LoginResponse>), RouteError> {
	let account = identity
		.store()
		.account(input.kind, &normalize_email(&input.email))
		.await?
		.ok_or(Error::InvalidCredentials)?;

	let hashed = hash_password(&hasher, &input.password, &account.salt).map_err(Error::Argon)?;

	if account.password != hashed {
		tracing::info!(account.id = account.id, "rejected login");

		return Err(Error::InvalidCredentials.into());
	}

	let session_id = identity.store().create_session(account.id).await?;
	let cookie = session::create_cookie(session_id);

	tracing::info!(account.id = account.id, kind = %account.kind, "logged in");

	Ok((
		[(header::SET_COOKIE, cookie.to_string())],
		Json(model::LoginResponse {
			success: true,
			message: "Login successful".into(),
			principal: account.principal(),
		}),
	))
}

/// Log out
/// Ends the current session and clears its cookie.
#[route(tag = tag::AUTH)]
pub async fn logout(
	State(identity): State<Identity>,
	session: Session,
) -> Result<([(header::HeaderName, String); 1], Json<Acknowledgement>), RouteError> {
	identity.store().delete_session(session.id).await?;

	Ok((
		[(header::SET_COOKIE, session::clear_cookie().to_string())],
		Json(Acknowledgement::new("Logged out successfully")),
	))
}

/// Get principal
/// Returns who the session belongs to.
#[route(tag = tag::AUTH)]
pub async fn get_me(session: Session) -> Json<model::Me> {
	Json(model::Me {
		success: true,
		principal: session.principal,
	})
}

/// Check session
/// Reports whether the caller is logged in. Unlike the other routes, this
/// never fails for anonymous callers.
#[route(tag = tag::AUTH)]
pub async fn get_session(Viewer(principal): Viewer) -> Json<model::SessionStatus> {
	Json(model::SessionStatus {
		success: true,
		logged_in: principal.is_some(),
		principal,
	})
}
